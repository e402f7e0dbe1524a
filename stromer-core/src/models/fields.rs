//! Catalog of recognized vendor fields.
//!
//! The portal returns flat JSON objects whose keys are vendor-defined. The
//! keys listed here are the ones the client knows how to interpret; their
//! values are checked when a snapshot is built and mismatches are logged.
//! Any other key passes through untouched.

use serde::{Deserialize, Serialize};

use super::snapshot::FieldValue;

// ============================================================================
// Value Kind
// ============================================================================

/// Expected shape of a recognized field value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ValueKind {
    /// Boolean flag. Integers are read as `!= 0`.
    Flag,
    /// Integer or floating point measurement.
    Number,
    /// Free text.
    Text,
    /// Identifier sent either as text or as an integer.
    Identifier,
    /// Epoch timestamp in seconds, as a number or numeric text.
    Timestamp,
}

impl ValueKind {
    /// Returns a short label for error messages.
    pub fn label(&self) -> &'static str {
        match self {
            Self::Flag => "flag",
            Self::Number => "number",
            Self::Text => "text",
            Self::Identifier => "identifier",
            Self::Timestamp => "epoch timestamp",
        }
    }

    /// Returns true if `value` has an acceptable shape for this kind.
    ///
    /// `null` is accepted for every kind; the portal reports unknown
    /// measurements that way.
    pub fn accepts(&self, value: &FieldValue) -> bool {
        match (self, value) {
            (_, FieldValue::Null)
            | (Self::Flag, FieldValue::Bool(_) | FieldValue::Integer(_))
            | (Self::Number, FieldValue::Integer(_) | FieldValue::Float(_))
            | (Self::Text, FieldValue::Text(_))
            | (Self::Identifier, FieldValue::Text(_) | FieldValue::Integer(_))
            | (Self::Timestamp, FieldValue::Integer(_)) => true,
            (Self::Timestamp, FieldValue::Float(f)) => f.is_finite() && *f >= 0.0,
            (Self::Timestamp, FieldValue::Text(_)) => value.as_timestamp().is_some(),
            _ => false,
        }
    }
}

// ============================================================================
// Field Spec
// ============================================================================

/// A recognized vendor key and the kind of value it carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    /// Vendor key.
    pub key: &'static str,
    /// Expected value kind.
    pub kind: ValueKind,
}

const fn spec(key: &'static str, kind: ValueKind) -> FieldSpec {
    FieldSpec { key, kind }
}

/// Keys of the bike listing entry (`bike/`).
pub const BASE_FIELDS: &[FieldSpec] = &[
    spec("bikeid", ValueKind::Identifier),
    spec("bikenumber", ValueKind::Identifier),
    spec("nickname", ValueKind::Text),
    spec("biketype", ValueKind::Text),
    spec("bikemodel", ValueKind::Text),
    spec("color", ValueKind::Text),
    spec("size", ValueKind::Text),
    spec("hardware", ValueKind::Text),
    spec("suiversion", ValueKind::Text),
    spec("tntversion", ValueKind::Text),
];

/// Keys of the live status payload (`bike/{id}/state/`).
pub const STATUS_FIELDS: &[FieldSpec] = &[
    spec("assistance_level", ValueKind::Number),
    spec("atmospheric_pressure", ValueKind::Number),
    spec("average_energy_consumption", ValueKind::Number),
    spec("average_speed_total", ValueKind::Number),
    spec("average_speed_trip", ValueKind::Number),
    spec("battery_SOC", ValueKind::Number),
    spec("battery_health", ValueKind::Number),
    spec("battery_temp", ValueKind::Number),
    spec("bike_speed", ValueKind::Number),
    spec("motor_temp", ValueKind::Number),
    spec("power_on_cycles", ValueKind::Number),
    spec("total_distance", ValueKind::Number),
    spec("total_energy_consumption", ValueKind::Number),
    spec("total_time", ValueKind::Number),
    spec("trip_distance", ValueKind::Number),
    spec("trip_time", ValueKind::Number),
    spec("light_on", ValueKind::Flag),
    spec("lock_flag", ValueKind::Flag),
    spec("theft_flag", ValueKind::Flag),
    spec("rcvts", ValueKind::Timestamp),
];

/// Keys of the position payload (`bike/{id}/position/`), after the receive
/// timestamp rename.
pub const POSITION_FIELDS: &[FieldSpec] = &[
    spec("latitude", ValueKind::Number),
    spec("longitude", ValueKind::Number),
    spec("altitude", ValueKind::Number),
    spec("speed", ValueKind::Number),
    spec("timets", ValueKind::Timestamp),
    spec("rcvts_pos", ValueKind::Timestamp),
];

// ============================================================================
// Field Category
// ============================================================================

/// Which payload a field came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FieldCategory {
    /// Bike listing entry: model, firmware versions.
    Base,
    /// Live status: battery, speed, odometers, flags.
    Status,
    /// Position: coordinates and timestamps.
    Position,
}

impl FieldCategory {
    /// All categories in merge order.
    pub const ALL: [FieldCategory; 3] = [Self::Base, Self::Status, Self::Position];

    /// Returns the recognized keys of this category.
    pub fn recognized(&self) -> &'static [FieldSpec] {
        match self {
            Self::Base => BASE_FIELDS,
            Self::Status => STATUS_FIELDS,
            Self::Position => POSITION_FIELDS,
        }
    }

    /// Looks up a recognized key.
    pub fn lookup(&self, key: &str) -> Option<&'static FieldSpec> {
        self.recognized().iter().find(|spec| spec.key == key)
    }

    /// Returns true if `key` is part of this category's catalog.
    pub fn is_recognized(&self, key: &str) -> bool {
        self.lookup(key).is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flag_accepts_bool_and_any_integer() {
        assert!(ValueKind::Flag.accepts(&FieldValue::Bool(true)));
        assert!(ValueKind::Flag.accepts(&FieldValue::Integer(1)));
        assert!(ValueKind::Flag.accepts(&FieldValue::Integer(2)));
        assert!(!ValueKind::Flag.accepts(&FieldValue::Text("yes".into())));
    }

    #[test]
    fn test_timestamp_accepts_numeric_text() {
        assert!(ValueKind::Timestamp.accepts(&FieldValue::Text("1700000000".into())));
        assert!(ValueKind::Timestamp.accepts(&FieldValue::Text(" 1700000000.5 ".into())));
        assert!(!ValueKind::Timestamp.accepts(&FieldValue::Text("yesterday".into())));
    }

    #[test]
    fn test_null_is_accepted_everywhere() {
        for kind in [
            ValueKind::Flag,
            ValueKind::Number,
            ValueKind::Text,
            ValueKind::Identifier,
            ValueKind::Timestamp,
        ] {
            assert!(kind.accepts(&FieldValue::Null), "{kind:?}");
        }
    }

    #[test]
    fn test_catalogs_do_not_overlap_on_timestamps() {
        assert!(FieldCategory::Status.is_recognized("rcvts"));
        assert!(!FieldCategory::Position.is_recognized("rcvts"));
        assert!(FieldCategory::Position.is_recognized("rcvts_pos"));
    }

    #[test]
    fn test_lookup_returns_kind() {
        let spec = FieldCategory::Position.lookup("latitude").unwrap();
        assert_eq!(spec.kind, ValueKind::Number);
        assert!(FieldCategory::Base.lookup("latitude").is_none());
    }
}
