//! HTTP session with tracing and a cookie jar.
//!
//! This module wraps a `reqwest` client configured the way the portal login
//! needs it:
//! - Cookie jar, so the CSRF cookie travels with the login form
//! - No automatic redirects, so `Location` headers can be read
//! - A bounded total timeout on every request
//! - Request/response tracing

use reqwest::{header, redirect, Client, Response};
use serde::Serialize;
use std::time::Duration;
use tracing::{debug, instrument};
use url::Url;

use crate::error::ApiError;

/// Default request timeout.
pub const DEFAULT_TIMEOUT_SECS: u64 = 60;

/// User agent string.
const USER_AGENT: &str = concat!("stromer-rs/", env!("CARGO_PKG_VERSION"));

// ============================================================================
// HTTP Session
// ============================================================================

/// One network session: connection pool plus cookie jar.
///
/// A session is never shared between logins; reconnecting builds a new one.
#[derive(Debug, Clone)]
pub struct HttpSession {
    inner: Client,
}

impl HttpSession {
    /// Creates a session with a custom timeout.
    ///
    /// # Errors
    ///
    /// Fails if the TLS backend cannot be initialised.
    pub fn with_timeout(timeout: Duration) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .cookie_store(true)
            .redirect(redirect::Policy::none())
            .build()
            .map_err(|e| ApiError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { inner: client })
    }

    /// Performs a GET request.
    #[instrument(skip_all, fields(path = %url.path()))]
    pub async fn get(&self, url: &Url) -> Result<Response, ApiError> {
        debug!("GET request");
        let response = self
            .inner
            .get(url.clone())
            .send()
            .await
            .map_err(|e| ApiError::request(url.path(), &e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with form data and an optional referer.
    #[instrument(skip_all, fields(path = %url.path()))]
    pub async fn post_form<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        form: &T,
        referer: Option<&str>,
    ) -> Result<Response, ApiError> {
        debug!("POST request with form data");
        let mut request = self.inner.post(url.clone()).form(form);
        if let Some(referer) = referer {
            request = request.header(header::REFERER, referer);
        }
        let response = request
            .send()
            .await
            .map_err(|e| ApiError::request(url.path(), &e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a GET request with a bearer token and query parameters.
    #[instrument(skip_all, fields(path = %url.path()))]
    pub async fn get_with_auth(
        &self,
        url: &Url,
        token: &str,
        query: &[(&str, &str)],
    ) -> Result<Response, ApiError> {
        debug!("GET request with auth");
        let response = self
            .inner
            .get(url.clone())
            .bearer_auth(token)
            .query(query)
            .send()
            .await
            .map_err(|e| ApiError::request(url.path(), &e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a POST request with a bearer token and JSON body.
    #[instrument(skip_all, fields(path = %url.path()))]
    pub async fn post_json_with_auth<T: Serialize + ?Sized>(
        &self,
        url: &Url,
        token: &str,
        body: &T,
    ) -> Result<Response, ApiError> {
        debug!("POST request with JSON");
        let response = self
            .inner
            .post(url.clone())
            .bearer_auth(token)
            .json(body)
            .send()
            .await
            .map_err(|e| ApiError::request(url.path(), &e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }

    /// Performs a DELETE request with a bearer token.
    #[instrument(skip_all, fields(path = %url.path()))]
    pub async fn delete_with_auth(&self, url: &Url, token: &str) -> Result<Response, ApiError> {
        debug!("DELETE request");
        let response = self
            .inner
            .delete(url.clone())
            .bearer_auth(token)
            .send()
            .await
            .map_err(|e| ApiError::request(url.path(), &e))?;
        debug!(status = %response.status(), "Response received");
        Ok(response)
    }
}

// ============================================================================
// Response Extensions
// ============================================================================

/// Extension trait for the headers the login flow reads.
pub trait ResponseExt {
    /// The `Location` header, if present and valid UTF-8.
    fn location(&self) -> Option<&str>;

    /// All `Set-Cookie` header values.
    fn set_cookies(&self) -> Vec<&str>;
}

impl ResponseExt for Response {
    fn location(&self) -> Option<&str> {
        self.headers()
            .get(header::LOCATION)
            .and_then(|v| v.to_str().ok())
    }

    fn set_cookies(&self) -> Vec<&str> {
        self.headers()
            .get_all(header::SET_COOKIE)
            .iter()
            .filter_map(|v| v.to_str().ok())
            .collect()
    }
}
