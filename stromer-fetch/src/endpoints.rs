//! Endpoint tables for the two portal dialects.
//!
//! Every URL the client requests is built here. The dialect is fixed when
//! [`Endpoints`] is constructed and never re-decided per request.

use stromer_core::ApiDialect;
use url::{form_urlencoded, Url};

use crate::error::ApiError;

// ============================================================================
// Constants
// ============================================================================

/// Portal base URL.
pub const DEFAULT_BASE_URL: &str = "https://api3.stromer-portal.ch";

/// Redirect URL sent with the authorize request.
pub const AUTHORIZE_REDIRECT_URL: &str = "stromerauth://auth";

/// Scopes requested during login.
pub const SCOPES: &str = "bikeposition bikestatus bikeconfiguration bikelock biketheft bikedata bikepin bikeblink userprofile";

// ============================================================================
// Endpoints
// ============================================================================

/// URL builder for one dialect.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    base: Url,
    dialect: ApiDialect,
}

impl Endpoints {
    /// Endpoints on the production portal.
    ///
    /// # Panics
    ///
    /// Never: [`DEFAULT_BASE_URL`] is a valid URL.
    pub fn new(dialect: ApiDialect) -> Self {
        let base = Url::parse(DEFAULT_BASE_URL).expect("default base URL is valid");
        Self { base, dialect }
    }

    /// Endpoints on a custom host (used against test servers).
    ///
    /// # Errors
    ///
    /// Fails if `base` is not an absolute URL.
    pub fn with_base_url(dialect: ApiDialect, base: &str) -> Result<Self, ApiError> {
        let base = Url::parse(base).map_err(|e| ApiError::Config(format!("invalid base URL: {e}")))?;
        if base.cannot_be_a_base() {
            return Err(ApiError::Config("base URL cannot be a base".to_string()));
        }
        Ok(Self { base, dialect })
    }

    /// The dialect these endpoints speak.
    pub fn dialect(&self) -> ApiDialect {
        self.dialect
    }

    fn join(&self, path: &str) -> Url {
        let mut url = self.base.clone();
        url.set_path(path);
        url.set_query(None);
        url
    }

    // ========================================================================
    // Login
    // ========================================================================

    /// Login form URL.
    pub fn login_url(&self) -> Url {
        self.join(match self.dialect {
            ApiDialect::Legacy => "/users/login/",
            ApiDialect::Current => "/mobile/v4/login/",
        })
    }

    /// Path of the authorize endpoint, used in the login form's `next` field.
    pub fn authorize_path(&self) -> &'static str {
        match self.dialect {
            ApiDialect::Legacy => "/o/authorize/",
            ApiDialect::Current => "/mobile/v4/o/authorize/",
        }
    }

    /// Value of the login form's `next` field: the authorize path with
    /// client id, response type, redirect URL and scopes.
    pub fn authorize_next(&self, client_id: &str) -> String {
        let query = form_urlencoded::Serializer::new(String::new())
            .append_pair("client_id", client_id)
            .append_pair("response_type", "code")
            .append_pair("redirect_url", AUTHORIZE_REDIRECT_URL)
            .append_pair("scope", SCOPES)
            .finish();
        format!("{}?{query}", self.authorize_path())
    }

    /// Token exchange URL.
    pub fn token_url(&self) -> Url {
        self.join(match self.dialect {
            ApiDialect::Legacy => "/o/token/",
            ApiDialect::Current => "/mobile/v4/o/token/",
        })
    }

    /// `redirect_uri` sent with the token exchange.
    pub fn token_redirect_uri(&self) -> &'static str {
        match self.dialect {
            ApiDialect::Legacy => AUTHORIZE_REDIRECT_URL,
            ApiDialect::Current => "stromer://auth",
        }
    }

    /// Resolves a `Location` header against the portal host.
    ///
    /// # Errors
    ///
    /// Fails if the location cannot be parsed.
    pub fn resolve(&self, location: &str) -> Result<Url, url::ParseError> {
        self.base.join(location)
    }

    // ========================================================================
    // Resources
    // ========================================================================

    /// Prefix of all resource paths.
    pub fn resource_prefix(&self) -> &'static str {
        match self.dialect {
            ApiDialect::Legacy => "/rapi/mobile/v2/",
            ApiDialect::Current => "/rapi/mobile/v4.1/",
        }
    }

    /// Absolute URL of a resource path such as `bike/`.
    pub fn resource(&self, path: &str) -> Url {
        self.join(&format!("{}{path}", self.resource_prefix()))
    }

    /// Bike listing.
    pub fn bikes(&self) -> Url {
        self.resource("bike/")
    }

    /// Live status of one bike.
    pub fn state(&self, bike_id: &str) -> Url {
        self.resource(&format!("bike/{bike_id}/state/"))
    }

    /// Position of one bike.
    pub fn position(&self, bike_id: &str) -> Url {
        self.resource(&format!("bike/{bike_id}/position/"))
    }

    /// Settings (lock) of one bike.
    pub fn settings(&self, bike_id: &str) -> Url {
        self.resource(&format!("bike/{bike_id}/settings/"))
    }

    /// Light of one bike.
    pub fn light(&self, bike_id: &str) -> Url {
        self.resource(&format!("bike/{bike_id}/light/"))
    }

    /// Trip data of one bike.
    pub fn trip_data(&self, bike_id: &str) -> Url {
        self.resource(&format!("bike/id/{bike_id}/trip_data/"))
    }
}
