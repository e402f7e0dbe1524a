//! Store error types.

use stromer_fetch::{ApiError, ErrorKind};
use thiserror::Error;

/// Errors surfaced by the polling coordinator.
#[derive(Debug, Error)]
pub enum CoordinatorError {
    /// The first refresh failed; the host should retry setup later.
    #[error("Bike not ready: {reason}")]
    NotReady {
        /// Why the first refresh failed.
        reason: String,
    },

    /// Polling gave up; the host should ask for new credentials.
    #[error("Authentication failed after {attempts} attempts: {source}")]
    AuthenticationFailed {
        /// Poll attempts made in the failing cycle.
        attempts: u32,
        /// Last error seen.
        #[source]
        source: ApiError,
    },

    /// A client call outside the refresh cycle failed.
    #[error(transparent)]
    Api(#[from] ApiError),
}

impl CoordinatorError {
    /// Returns true if the host should start its re-authentication flow.
    pub fn is_auth_failure(&self) -> bool {
        match self {
            Self::AuthenticationFailed { .. } => true,
            Self::Api(e) => e.kind() == ErrorKind::Authentication,
            Self::NotReady { .. } => false,
        }
    }
}

/// Errors from loading, saving or validating the configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// IO error.
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Malformed config file.
    #[error("Invalid config file: {0}")]
    Parse(#[from] serde_json::Error),

    /// A required value is missing or out of range.
    #[error("Invalid configuration: {0}")]
    Invalid(String),
}
