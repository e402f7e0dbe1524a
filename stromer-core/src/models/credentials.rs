//! Account credentials and API dialect selection.

use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// API Dialect
// ============================================================================

/// Path/parameter convention of the Stromer portal API.
///
/// The portal serves two dialects of the same API. Accounts configured with
/// a client secret talk to the legacy (v3) family, everything else talks to
/// the current (v4) family.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ApiDialect {
    /// Legacy dialect (`/users/login/`, `/rapi/mobile/v2/`).
    Legacy,
    /// Current dialect (`/mobile/v4/login/`, `/rapi/mobile/v4.1/`).
    Current,
}

impl ApiDialect {
    /// Returns the version label used in logs.
    pub fn version_label(&self) -> &'static str {
        match self {
            Self::Legacy => "v3",
            Self::Current => "v4",
        }
    }
}

impl fmt::Display for ApiDialect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.version_label())
    }
}

// ============================================================================
// Credentials
// ============================================================================

/// Credentials for one Stromer portal account.
///
/// Immutable once built. The `Debug` output never contains the password or
/// the client secret.
#[derive(Clone, PartialEq, Eq)]
pub struct Credentials {
    username: String,
    password: String,
    client_id: String,
    client_secret: Option<String>,
}

impl Credentials {
    /// Creates credentials. An empty client secret counts as absent.
    pub fn new(
        username: impl Into<String>,
        password: impl Into<String>,
        client_id: impl Into<String>,
        client_secret: Option<String>,
    ) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
            client_id: client_id.into(),
            client_secret: client_secret.filter(|s| !s.is_empty()),
        }
    }

    /// Account username (e-mail address).
    pub fn username(&self) -> &str {
        &self.username
    }

    /// Account password.
    pub fn password(&self) -> &str {
        &self.password
    }

    /// OAuth client id.
    pub fn client_id(&self) -> &str {
        &self.client_id
    }

    /// OAuth client secret, only set for the legacy dialect.
    pub fn client_secret(&self) -> Option<&str> {
        self.client_secret.as_deref()
    }

    /// Returns the dialect selected by these credentials.
    pub fn dialect(&self) -> ApiDialect {
        if self.client_secret.is_some() {
            ApiDialect::Legacy
        } else {
            ApiDialect::Current
        }
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field(
                "client_secret",
                &self.client_secret.as_ref().map(|_| "<redacted>"),
            )
            .finish()
    }
}
