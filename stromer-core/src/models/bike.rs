//! Bike summaries and action parameters.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fmt;
use std::str::FromStr;

use super::snapshot::FieldValue;
use crate::error::CoreError;

// ============================================================================
// Bike Summary
// ============================================================================

/// Listing keys that carry the model name, in order of preference.
const MODEL_KEYS: [&str; 2] = ["biketype", "bikemodel"];

/// Picks the model name from a listing entry, skipping empty values.
pub(crate) fn model_name<'a>(lookup: impl Fn(&str) -> Option<&'a str>) -> String {
    MODEL_KEYS
        .iter()
        .filter_map(|key| lookup(key))
        .find(|model| !model.is_empty())
        .unwrap_or_default()
        .to_string()
}

/// One bike associated with an account, as returned by bike detection.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BikeSummary {
    /// Vendor bike id (`bikeid`).
    pub id: String,
    /// User-assigned nickname (`nickname`).
    pub nickname: String,
    /// Bike model (`biketype`, else `bikemodel`).
    pub model: String,
}

impl BikeSummary {
    /// Creates a summary.
    pub fn new(id: impl Into<String>, nickname: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            nickname: nickname.into(),
            model: model.into(),
        }
    }

    /// Parses one entry of the bike listing.
    ///
    /// # Errors
    ///
    /// Fails if the entry is not an object or has no usable `bikeid`.
    pub fn from_listing_entry(entry: &Value) -> Result<Self, CoreError> {
        let object = entry
            .as_object()
            .ok_or_else(|| CoreError::InvalidData("bike entry is not a JSON object".to_string()))?;

        let id = object
            .get("bikeid")
            .map(FieldValue::from_json)
            .and_then(|v| v.as_identifier())
            .ok_or_else(|| CoreError::MissingField("bikeid".to_string()))?;

        let text = |key: &str| {
            object
                .get(key)
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string()
        };

        Ok(Self {
            id,
            nickname: text("nickname"),
            model: model_name(|key| object.get(key).and_then(Value::as_str)),
        })
    }

    /// Label shown when choosing between several bikes.
    pub fn display_label(&self) -> String {
        format!("{} ({}) #{}", self.nickname, self.model, self.id)
    }

    /// Stable identifier for host registries.
    pub fn unique_id(&self) -> String {
        format!("stromerbike-{}", self.id)
    }
}

// ============================================================================
// Light Mode
// ============================================================================

/// Light mode accepted by the light endpoint.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LightMode {
    /// Light on.
    On,
    /// Light off.
    Off,
}

impl LightMode {
    /// Wire value.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::On => "on",
            Self::Off => "off",
        }
    }
}

impl From<bool> for LightMode {
    fn from(on: bool) -> Self {
        if on { Self::On } else { Self::Off }
    }
}

impl fmt::Display for LightMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for LightMode {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "on" => Ok(Self::On),
            "off" => Ok(Self::Off),
            other => Err(CoreError::InvalidData(format!("unknown light mode: {other}"))),
        }
    }
}
