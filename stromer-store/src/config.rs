//! Configuration management.
//!
//! The config file is JSON at `<config dir>/stromer/config.json`. Every field
//! has a default, so a partial file is fine. Account values can be
//! overridden from the environment:
//!
//! | Variable | Field |
//! |----------|-------|
//! | `STROMER_USERNAME` | `account.username` |
//! | `STROMER_PASSWORD` | `account.password` |
//! | `STROMER_CLIENT_ID` | `account.client_id` |
//! | `STROMER_CLIENT_SECRET` | `account.client_secret` |

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::{Path, PathBuf};
use std::time::Duration;
use stromer_core::Credentials;
use stromer_fetch::DEFAULT_TIMEOUT_SECS;
use tracing::{debug, info};

use crate::error::ConfigError;

/// Default refresh interval (10 minutes).
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 600;

// ============================================================================
// Config
// ============================================================================

/// Application configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Portal account.
    pub account: AccountConfig,
    /// Bike to follow. When absent the first bike on the account is used.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub bike: Option<BikeConfig>,
    /// Seconds between scheduled refreshes.
    pub refresh_interval_secs: u64,
    /// Total timeout of each request in seconds.
    pub timeout_secs: u64,
    /// Log level used when `RUST_LOG` is not set.
    pub log_level: String,
}

/// Portal account settings.
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountConfig {
    /// Login email.
    pub username: String,
    /// Login password.
    pub password: String,
    /// OAuth client id of the mobile app.
    pub client_id: String,
    /// OAuth client secret; only the v3 portal uses one.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub client_secret: Option<String>,
}

impl fmt::Debug for AccountConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AccountConfig")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .field("client_id", &self.client_id)
            .field("client_secret", &self.client_secret.as_ref().map(|_| "<redacted>"))
            .finish()
    }
}

/// The bike chosen during setup.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BikeConfig {
    /// Bike identifier.
    pub id: String,
    /// Nickname shown to the user.
    #[serde(default)]
    pub nickname: String,
    /// Model name.
    #[serde(default)]
    pub model: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            account: AccountConfig::default(),
            bike: None,
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            log_level: "info".to_string(),
        }
    }
}

impl Config {
    /// Returns the default configuration file path.
    pub fn default_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("stromer")
            .join("config.json")
    }

    /// Loads configuration from a specific path.
    ///
    /// A missing file yields the defaults.
    ///
    /// # Errors
    ///
    /// Fails if the file exists but cannot be read or parsed.
    pub fn load_from(path: &Path) -> Result<Self, ConfigError> {
        if !path.exists() {
            debug!(path = %path.display(), "Config file not found, using defaults");
            return Ok(Self::default());
        }

        let content = std::fs::read_to_string(path)?;
        let config: Config = serde_json::from_str(&content)?;

        info!(path = %path.display(), "Loaded configuration");
        Ok(config)
    }

    /// Saves configuration to a specific path.
    ///
    /// The file holds the account password, so on Unix it is made readable
    /// by the owner only.
    ///
    /// # Errors
    ///
    /// Fails on IO errors.
    pub fn save_to(&self, path: &Path) -> Result<(), ConfigError> {
        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let content = serde_json::to_string_pretty(self)?;
        std::fs::write(path, content)?;
        set_owner_only(path)?;

        info!(path = %path.display(), "Saved configuration");
        Ok(())
    }

    // ========================================================================
    // Environment
    // ========================================================================

    /// Applies `STROMER_*` environment overrides.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|key| std::env::var(key).ok());
    }

    /// Applies overrides from `lookup`, keyed by environment variable name.
    ///
    /// Empty values are ignored.
    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let get = |key: &str| lookup(key).filter(|v| !v.is_empty());

        if let Some(v) = get("STROMER_USERNAME") {
            self.account.username = v;
        }
        if let Some(v) = get("STROMER_PASSWORD") {
            self.account.password = v;
        }
        if let Some(v) = get("STROMER_CLIENT_ID") {
            self.account.client_id = v;
        }
        if let Some(v) = get("STROMER_CLIENT_SECRET") {
            self.account.client_secret = Some(v);
        }
    }

    // ========================================================================
    // Validation
    // ========================================================================

    /// Checks that the account is complete and the intervals are usable.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Invalid`] naming the first bad value.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("account.username", &self.account.username),
            ("account.password", &self.account.password),
            ("account.client_id", &self.account.client_id),
        ];
        if let Some((name, _)) = required.iter().find(|(_, v)| v.trim().is_empty()) {
            return Err(ConfigError::Invalid(format!("{name} is required")));
        }
        if self.refresh_interval_secs == 0 {
            return Err(ConfigError::Invalid(
                "refresh_interval_secs must be positive".to_string(),
            ));
        }
        if self.timeout_secs == 0 {
            return Err(ConfigError::Invalid("timeout_secs must be positive".to_string()));
        }
        Ok(())
    }

    /// Builds client credentials from a validated account.
    ///
    /// # Errors
    ///
    /// Fails if [`validate`](Self::validate) fails.
    pub fn credentials(&self) -> Result<Credentials, ConfigError> {
        self.validate()?;
        Ok(Credentials::new(
            self.account.username.clone(),
            self.account.password.clone(),
            self.account.client_id.clone(),
            self.account.client_secret.clone(),
        ))
    }

    /// Interval between scheduled refreshes.
    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    /// Request timeout.
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

#[cfg(unix)]
fn set_owner_only(path: &Path) -> Result<(), ConfigError> {
    use std::os::unix::fs::PermissionsExt;

    let mut perms = std::fs::metadata(path)?.permissions();
    perms.set_mode(0o600);
    std::fs::set_permissions(path, perms)?;
    debug!(path = %path.display(), mode = "0600", "Set restrictive permissions");
    Ok(())
}

#[cfg(not(unix))]
fn set_owner_only(_path: &Path) -> Result<(), ConfigError> {
    Ok(())
}
