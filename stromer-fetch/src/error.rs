//! Client error types.
//!
//! Error messages carry the endpoint path and HTTP status but never the
//! credentials, the CSRF token, the authorization code or the bearer token.

use std::fmt;
use thiserror::Error;

// ============================================================================
// Error Kind
// ============================================================================

/// Coarse classification used by the polling coordinator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A step of the login sequence failed. Not retried internally.
    Authentication,
    /// HTTP error, timeout or malformed payload. Retried by the coordinator.
    Transient,
    /// A write action was not acknowledged. Never retried.
    Action,
}

// ============================================================================
// Auth Step
// ============================================================================

/// Step of the login sequence, for error reporting.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AuthStep {
    /// GET of the login page (CSRF cookie).
    LoginPage,
    /// POST of the login form.
    SubmitCredentials,
    /// GET of the authorize redirect (authorization code).
    Authorize,
    /// POST to the token endpoint.
    TokenExchange,
}

impl fmt::Display for AuthStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::LoginPage => "login page",
            Self::SubmitCredentials => "credential submission",
            Self::Authorize => "authorize redirect",
            Self::TokenExchange => "token exchange",
        })
    }
}

// ============================================================================
// Api Error
// ============================================================================

/// Error type for Stromer portal operations.
#[derive(Debug, Error)]
pub enum ApiError {
    /// A step of the login sequence failed.
    #[error("Authentication failed during {step}: {reason}")]
    Authentication {
        /// Failed step.
        step: AuthStep,
        /// What went wrong.
        reason: String,
    },

    /// An authenticated call was made without a session.
    #[error("Not connected, call connect() first")]
    NotConnected,

    /// The portal answered with a non-success status.
    #[error("HTTP {status} from {endpoint}")]
    Status {
        /// Endpoint path.
        endpoint: String,
        /// HTTP status code.
        status: u16,
    },

    /// The request exceeded the configured timeout.
    #[error("Request to {endpoint} timed out")]
    Timeout {
        /// Endpoint path.
        endpoint: String,
    },

    /// Connection-level failure.
    #[error("Request to {endpoint} failed: {reason}")]
    Transport {
        /// Endpoint path.
        endpoint: String,
        /// Underlying error.
        reason: String,
    },

    /// The payload could not be interpreted.
    #[error("Invalid response from {endpoint}: {reason}")]
    InvalidResponse {
        /// Endpoint path.
        endpoint: String,
        /// What was wrong with it.
        reason: String,
    },

    /// A write action was not acknowledged.
    #[error("{action} was not acknowledged (HTTP {status})")]
    Action {
        /// Action name.
        action: &'static str,
        /// HTTP status code.
        status: u16,
    },

    /// The HTTP client could not be built.
    #[error("Client configuration error: {0}")]
    Config(String),
}

impl ApiError {
    /// Builds an authentication error.
    pub fn auth(step: AuthStep, reason: impl Into<String>) -> Self {
        Self::Authentication {
            step,
            reason: reason.into(),
        }
    }

    /// Converts a reqwest error, keeping only the endpoint path.
    pub fn request(endpoint: &str, err: &reqwest::Error) -> Self {
        if err.is_timeout() {
            return Self::Timeout {
                endpoint: endpoint.to_string(),
            };
        }
        // reqwest's own message embeds the full URL
        let reason = match err.status() {
            Some(status) => status.to_string(),
            None if err.is_connect() => "connection failed".to_string(),
            None if err.is_decode() || err.is_body() => "could not read body".to_string(),
            None => "request failed".to_string(),
        };
        Self::Transport {
            endpoint: endpoint.to_string(),
            reason,
        }
    }

    /// Builds an invalid-response error.
    pub fn invalid(endpoint: &str, reason: impl Into<String>) -> Self {
        Self::InvalidResponse {
            endpoint: endpoint.to_string(),
            reason: reason.into(),
        }
    }

    /// Returns the coordinator classification of this error.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::Authentication { .. } => ErrorKind::Authentication,
            Self::Action { .. } => ErrorKind::Action,
            Self::NotConnected
            | Self::Status { .. }
            | Self::Timeout { .. }
            | Self::Transport { .. }
            | Self::InvalidResponse { .. }
            | Self::Config(_) => ErrorKind::Transient,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_kind_classification() {
        assert_eq!(
            ApiError::auth(AuthStep::LoginPage, "no cookie").kind(),
            ErrorKind::Authentication
        );
        assert_eq!(
            ApiError::Action { action: "lock", status: 500 }.kind(),
            ErrorKind::Action
        );
        assert_eq!(
            ApiError::Timeout { endpoint: "bike/".into() }.kind(),
            ErrorKind::Transient
        );
        assert_eq!(ApiError::NotConnected.kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_rejected_token_is_transient() {
        // recovered by the mid-cycle reconnect, not treated as a login failure
        let err = ApiError::Status { endpoint: "bike/".into(), status: 401 };
        assert_eq!(err.kind(), ErrorKind::Transient);
        let err = ApiError::Status { endpoint: "bike/".into(), status: 403 };
        assert_eq!(err.kind(), ErrorKind::Transient);
    }

    #[test]
    fn test_display_mentions_step() {
        let err = ApiError::auth(AuthStep::TokenExchange, "missing access_token");
        assert_eq!(
            err.to_string(),
            "Authentication failed during token exchange: missing access_token"
        );
    }
}
