//! Bike snapshot types.
//!
//! A [`BikeSnapshot`] is the complete set of last-known field values for one
//! bike. It is built in one go from the three payloads of a poll and never
//! mutated afterwards; a newer poll produces a new snapshot.

use chrono::{DateTime, TimeZone, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::BTreeMap;
use tracing::warn;

use super::bike::model_name;
use super::fields::FieldCategory;
use crate::error::CoreError;

/// Key under which the position payload's receive timestamp is stored.
///
/// Status and position both report a `rcvts` field; the position one is
/// renamed so both stay inspectable.
pub const POSITION_RECEIVED_KEY: &str = "rcvts_pos";

/// Vendor name of the receive timestamp field.
const RECEIVED_KEY: &str = "rcvts";

// ============================================================================
// Field Value
// ============================================================================

/// A primitive vendor field value.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum FieldValue {
    /// JSON `null`.
    Null,
    /// Boolean.
    Bool(bool),
    /// Integer.
    Integer(i64),
    /// Floating point number.
    Float(f64),
    /// String. Nested arrays/objects are kept as their JSON text.
    Text(String),
}

impl FieldValue {
    /// Converts a JSON value, flattening nested structures to text.
    pub fn from_json(value: &Value) -> Self {
        match value {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(*b),
            Value::Number(n) => n
                .as_i64()
                .map(Self::Integer)
                .or_else(|| n.as_f64().map(Self::Float))
                .unwrap_or(Self::Null),
            Value::String(s) => Self::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => Self::Text(value.to_string()),
        }
    }

    /// Returns the value as a float, if numeric.
    #[allow(clippy::cast_precision_loss)]
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Integer(i) => Some(*i as f64),
            Self::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Returns the value as a boolean. Integers count as `!= 0`.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            Self::Integer(i) => Some(*i != 0),
            _ => None,
        }
    }

    /// Returns the value as text, if it is a string.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::Text(s) => Some(s),
            _ => None,
        }
    }

    /// Interprets the value as an epoch timestamp in seconds.
    ///
    /// Numeric text (`"1700000000"`) is parsed as well.
    #[allow(clippy::cast_possible_truncation)]
    pub fn as_timestamp(&self) -> Option<DateTime<Utc>> {
        let secs = match self {
            Self::Integer(i) => *i,
            Self::Float(f) if f.is_finite() => f.trunc() as i64,
            Self::Text(s) => {
                let s = s.trim();
                match s.parse::<i64>() {
                    Ok(secs) => secs,
                    Err(_) => {
                        let f = s.parse::<f64>().ok().filter(|f| f.is_finite())?;
                        f.trunc() as i64
                    }
                }
            }
            _ => return None,
        };
        Utc.timestamp_opt(secs, 0).single()
    }

    /// Returns the value as an identifier string (text or integer).
    pub fn as_identifier(&self) -> Option<String> {
        match self {
            Self::Text(s) if !s.is_empty() => Some(s.clone()),
            Self::Integer(i) => Some(i.to_string()),
            _ => None,
        }
    }

    /// Short description of the value's shape, for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Self::Null => "null",
            Self::Bool(_) => "bool",
            Self::Integer(_) => "integer",
            Self::Float(_) => "float",
            Self::Text(_) => "text",
        }
    }
}

/// Flat, ordered key→value mapping of one payload.
pub type FieldMap = BTreeMap<String, FieldValue>;

/// Converts one vendor object into a field map.
///
/// Recognized keys with an unexpected value shape are kept as they are and
/// logged; the typed accessors then return `None` for them.
fn build_map(category: FieldCategory, payload: &Value) -> Result<FieldMap, CoreError> {
    let object: &Map<String, Value> =
        payload.as_object().ok_or_else(|| CoreError::InvalidPayload {
            category,
            reason: "not a JSON object".to_string(),
        })?;

    let mut map = FieldMap::new();
    for (key, raw) in object {
        let key = if category == FieldCategory::Position && key == RECEIVED_KEY {
            POSITION_RECEIVED_KEY.to_string()
        } else {
            key.clone()
        };

        let value = FieldValue::from_json(raw);
        if let Some(spec) = category.lookup(&key) {
            if !spec.kind.accepts(&value) {
                warn!(
                    ?category,
                    key = %key,
                    expected = spec.kind.label(),
                    found = value.type_name(),
                    "Unexpected value type, keeping raw value"
                );
            }
        }
        map.insert(key, value);
    }
    Ok(map)
}

// ============================================================================
// Bike Snapshot
// ============================================================================

/// Last-known state of one bike.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BikeSnapshot {
    /// Bike identifier.
    pub bike_id: String,
    /// Bike nickname.
    pub name: String,
    /// Bike model.
    pub model: String,
    /// Base attributes (model, firmware versions).
    pub base: FieldMap,
    /// Live status (battery, speed, odometers, flags).
    pub status: FieldMap,
    /// Position (coordinates, timestamps).
    pub position: FieldMap,
    /// When the snapshot was assembled.
    pub fetched_at: DateTime<Utc>,
}

impl BikeSnapshot {
    /// Builds a snapshot from the three vendor payloads of one poll.
    ///
    /// # Errors
    ///
    /// Fails if a payload is not an object or if the base payload has no
    /// bike id.
    pub fn from_payloads(base: &Value, status: &Value, position: &Value) -> Result<Self, CoreError> {
        let base = build_map(FieldCategory::Base, base)?;
        let status = build_map(FieldCategory::Status, status)?;
        let position = build_map(FieldCategory::Position, position)?;

        let bike_id = base
            .get("bikeid")
            .and_then(FieldValue::as_identifier)
            .ok_or_else(|| CoreError::MissingField("bikeid".to_string()))?;
        let name = base
            .get("nickname")
            .and_then(FieldValue::as_str)
            .unwrap_or_default()
            .to_string();
        let model = model_name(|key| base.get(key).and_then(FieldValue::as_str));

        Ok(Self {
            bike_id,
            name,
            model,
            base,
            status,
            position,
            fetched_at: Utc::now(),
        })
    }

    /// Returns the field map of one category.
    pub fn category(&self, category: FieldCategory) -> &FieldMap {
        match category {
            FieldCategory::Base => &self.base,
            FieldCategory::Status => &self.status,
            FieldCategory::Position => &self.position,
        }
    }

    /// Looks a key up across all categories.
    ///
    /// Later categories win when a key appears in more than one payload
    /// (position over status over base).
    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.position
            .get(key)
            .or_else(|| self.status.get(key))
            .or_else(|| self.base.get(key))
    }

    /// Returns the union of all three maps as one flat mapping.
    pub fn fields(&self) -> FieldMap {
        FieldCategory::ALL
            .iter()
            .flat_map(|c| self.category(*c).iter())
            .map(|(k, v)| (k.clone(), v.clone()))
            .collect()
    }

    /// Returns the number of distinct keys across all categories.
    pub fn len(&self) -> usize {
        self.fields().len()
    }

    /// Returns true if the snapshot carries no fields at all.
    pub fn is_empty(&self) -> bool {
        self.base.is_empty() && self.status.is_empty() && self.position.is_empty()
    }

    // ========================================================================
    // Typed accessors
    // ========================================================================

    /// Latitude of the last reported position.
    pub fn latitude(&self) -> Option<f64> {
        self.position.get("latitude").and_then(FieldValue::as_f64)
    }

    /// Longitude of the last reported position.
    pub fn longitude(&self) -> Option<f64> {
        self.position.get("longitude").and_then(FieldValue::as_f64)
    }

    /// Battery state of charge in percent.
    pub fn battery_soc(&self) -> Option<f64> {
        self.status.get("battery_SOC").and_then(FieldValue::as_f64)
    }

    /// Whether the bike is locked.
    pub fn is_locked(&self) -> Option<bool> {
        self.status.get("lock_flag").and_then(FieldValue::as_bool)
    }

    /// Whether the light is on.
    pub fn is_light_on(&self) -> Option<bool> {
        self.status.get("light_on").and_then(FieldValue::as_bool)
    }

    /// Whether theft mode is active.
    pub fn is_theft_flagged(&self) -> Option<bool> {
        self.status.get("theft_flag").and_then(FieldValue::as_bool)
    }

    /// When the portal last received a status report.
    pub fn received_at(&self) -> Option<DateTime<Utc>> {
        self.status.get(RECEIVED_KEY).and_then(FieldValue::as_timestamp)
    }

    /// When the portal last received a position report.
    pub fn position_received_at(&self) -> Option<DateTime<Utc>> {
        self.position
            .get(POSITION_RECEIVED_KEY)
            .and_then(FieldValue::as_timestamp)
    }

    /// Diagnostics dump: bike identity plus every field.
    pub fn diagnostics(&self) -> Value {
        serde_json::json!({
            "bike_id": self.bike_id,
            "bike_name": self.name,
            "bike_model": self.model,
            "fetched_at": self.fetched_at.to_rfc3339(),
            "bikedata": self.fields(),
        })
    }
}
