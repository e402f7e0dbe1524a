//! Portal login sequence.
//!
//! The portal has no public OAuth flow for third parties. The mobile app
//! logs in through the web form and picks the authorization code out of the
//! redirect chain:
//!
//! 1. GET the login page, read the CSRF token from `Set-Cookie`
//! 2. POST the login form with a `next` pointing at the authorize endpoint
//! 3. GET the `Location` of step 2, read the code from its `Location`
//! 4. POST the code to the token endpoint, read `access_token`
//!
//! Redirects are never followed automatically.

use regex::Regex;
use reqwest::Response;
use serde::Deserialize;
use std::sync::LazyLock;
use stromer_core::Credentials;
use tracing::{debug, instrument, warn};
use url::Url;

use crate::endpoints::Endpoints;
use crate::error::{ApiError, AuthStep};
use crate::http::{HttpSession, ResponseExt};

/// Name of the CSRF cookie set by the login page.
const CSRF_COOKIE: &str = "csrftoken";

static CSRF_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new("=(.*?);").expect("Invalid regex"));

// ============================================================================
// Auth State
// ============================================================================

/// Progress of the login sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum AuthState {
    /// No session, or the session was torn down.
    #[default]
    Unauthenticated,
    /// The authorize redirect yielded a code.
    CodeObtained,
    /// The token endpoint returned an access token.
    TokenObtained,
    /// The token is installed in a live session.
    Authenticated,
    /// A login step failed.
    AuthFailed,
}

impl AuthState {
    /// Returns true if authenticated calls can be made.
    pub fn is_authenticated(&self) -> bool {
        *self == Self::Authenticated
    }
}

// ============================================================================
// Header parsing
// ============================================================================

/// Extracts the CSRF token from `Set-Cookie` header values.
///
/// Prefers the `csrftoken` cookie and falls back to the first header. The
/// token is whatever sits between the first `=` and the next `;`.
pub fn extract_csrf_token<'a>(set_cookies: &[&'a str]) -> Option<&'a str> {
    let header = set_cookies
        .iter()
        .copied()
        .find(|c| c.trim_start().starts_with(CSRF_COOKIE))
        .or_else(|| set_cookies.first().copied())?;

    CSRF_PATTERN
        .captures(header)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str())
        .filter(|token| !token.is_empty())
}

/// Extracts the authorization code from the final redirect location.
///
/// Reads the `code` query parameter when the location parses as a URL,
/// otherwise takes the value after the first `=`.
pub fn extract_code(location: &str) -> Option<String> {
    if let Ok(url) = Url::parse(location) {
        if let Some((_, code)) = url.query_pairs().find(|(k, _)| k == "code") {
            return Some(code.into_owned()).filter(|c| !c.is_empty());
        }
    }

    location
        .split_once('=')
        .map(|(_, rest)| rest.split('&').next().unwrap_or_default().to_string())
        .filter(|c| !c.is_empty())
}

#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: Option<String>,
}

// ============================================================================
// Login
// ============================================================================

/// Runs the full login sequence on `session`.
///
/// `on_state` is called on every state transition. Returns the bearer token.
///
/// # Errors
///
/// Returns [`ApiError::Authentication`] naming the failed step when the
/// portal does not play along. Timeouts and connection failures keep their
/// transient error type.
#[instrument(skip_all, fields(dialect = %endpoints.dialect()))]
pub async fn login(
    session: &HttpSession,
    endpoints: &Endpoints,
    credentials: &Credentials,
    mut on_state: impl FnMut(AuthState),
) -> Result<String, ApiError> {
    let result = run_login(session, endpoints, credentials, &mut on_state).await;
    match &result {
        Ok(_) => on_state(AuthState::TokenObtained),
        Err(e) => {
            warn!(error = %e, "Login failed");
            on_state(AuthState::AuthFailed);
        }
    }
    result
}

async fn run_login(
    session: &HttpSession,
    endpoints: &Endpoints,
    credentials: &Credentials,
    on_state: &mut impl FnMut(AuthState),
) -> Result<String, ApiError> {
    let code = obtain_code(session, endpoints, credentials).await?;
    on_state(AuthState::CodeObtained);
    exchange_code(session, endpoints, credentials, &code).await
}

async fn obtain_code(
    session: &HttpSession,
    endpoints: &Endpoints,
    credentials: &Credentials,
) -> Result<String, ApiError> {
    let login_url = endpoints.login_url();

    // Step 1: CSRF token
    let res = session.get(&login_url).await?;
    let cookies = res.set_cookies();
    if cookies.is_empty() {
        return Err(ApiError::auth(AuthStep::LoginPage, "no Set-Cookie header"));
    }
    let csrf = extract_csrf_token(&cookies)
        .ok_or_else(|| ApiError::auth(AuthStep::LoginPage, "no CSRF token in Set-Cookie"))?
        .to_string();
    debug!("CSRF token obtained");

    // Step 2: credentials
    let next = endpoints.authorize_next(credentials.client_id());
    let form = [
        ("password", credentials.password()),
        ("username", credentials.username()),
        ("csrfmiddlewaretoken", csrf.as_str()),
        ("next", next.as_str()),
    ];
    let res = session.post_form(&login_url, &form, Some(login_url.as_str())).await?;
    let next_hop = redirect_target(&res, endpoints, AuthStep::SubmitCredentials)?;
    debug!(path = %next_hop.path(), "Credentials accepted");

    // Step 3: authorize redirect
    let res = session.get(&next_hop).await?;
    let location = res
        .location()
        .ok_or_else(|| ApiError::auth(AuthStep::Authorize, "no Location header"))?;
    let code = extract_code(location)
        .ok_or_else(|| ApiError::auth(AuthStep::Authorize, "no code in redirect"))?;
    debug!("Authorization code obtained");

    Ok(code)
}

fn redirect_target(res: &Response, endpoints: &Endpoints, step: AuthStep) -> Result<Url, ApiError> {
    let location = res.location().ok_or_else(|| {
        ApiError::auth(step, format!("no Location header (HTTP {})", res.status().as_u16()))
    })?;
    endpoints
        .resolve(location)
        .map_err(|e| ApiError::auth(step, format!("malformed redirect: {e}")))
}

async fn exchange_code(
    session: &HttpSession,
    endpoints: &Endpoints,
    credentials: &Credentials,
    code: &str,
) -> Result<String, ApiError> {
    let mut form = vec![
        ("grant_type", "authorization_code"),
        ("client_id", credentials.client_id()),
        ("code", code),
        ("redirect_uri", endpoints.token_redirect_uri()),
    ];
    if let Some(secret) = credentials.client_secret() {
        form.push(("client_secret", secret));
    }

    let res = session.post_form(&endpoints.token_url(), &form, None).await?;
    let status = res.status();
    if !status.is_success() {
        return Err(ApiError::auth(
            AuthStep::TokenExchange,
            format!("HTTP {}", status.as_u16()),
        ));
    }

    let body = res
        .text()
        .await
        .map_err(|_| ApiError::auth(AuthStep::TokenExchange, "could not read body"))?;
    let token: TokenResponse = serde_json::from_str(&body)
        .map_err(|e| ApiError::auth(AuthStep::TokenExchange, format!("malformed JSON: {e}")))?;

    token
        .access_token
        .filter(|t| !t.is_empty())
        .ok_or_else(|| ApiError::auth(AuthStep::TokenExchange, "missing access_token"))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_csrf_from_single_cookie() {
        let cookies = ["csrftoken=abc123; expires=Thu, 01 Jan 2099 00:00:00 GMT; Path=/"];
        assert_eq!(extract_csrf_token(&cookies), Some("abc123"));
    }

    #[test]
    fn test_csrf_prefers_named_cookie() {
        let cookies = ["sessionid=zzz; Path=/", "csrftoken=tok; Path=/"];
        assert_eq!(extract_csrf_token(&cookies), Some("tok"));
    }

    #[test]
    fn test_csrf_requires_terminator() {
        assert_eq!(extract_csrf_token(&["csrftoken=abc"]), None);
        assert_eq!(extract_csrf_token(&[]), None);
        assert_eq!(extract_csrf_token(&["csrftoken=; Path=/"]), None);
    }

    #[test]
    fn test_code_from_custom_scheme_redirect() {
        assert_eq!(
            extract_code("stromerauth://auth?code=XyZ987").as_deref(),
            Some("XyZ987")
        );
        assert_eq!(
            extract_code("stromerauth://auth?code=XyZ&state=1").as_deref(),
            Some("XyZ")
        );
    }

    #[test]
    fn test_code_from_relative_location() {
        assert_eq!(extract_code("/callback?code=abc").as_deref(), Some("abc"));
        assert_eq!(extract_code("/callback"), None);
        assert_eq!(extract_code("stromerauth://auth?code="), None);
    }

    #[test]
    fn test_auth_state_default() {
        assert_eq!(AuthState::default(), AuthState::Unauthenticated);
        assert!(!AuthState::TokenObtained.is_authenticated());
        assert!(AuthState::Authenticated.is_authenticated());
    }
}
