//! JSON output formatting.

use anyhow::Result;
use chrono::{DateTime, Utc};
use serde::Serialize;
use stromer_core::{BikeSnapshot, BikeSummary, FieldMap};

// ============================================================================
// Output Types
// ============================================================================

/// JSON output for one bike in the listing.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct BikeOutput<'a> {
    pub id: &'a str,
    pub nickname: &'a str,
    pub model: &'a str,
    pub unique_id: String,
}

/// JSON output for a snapshot.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SnapshotOutput<'a> {
    pub bike_id: &'a str,
    pub name: &'a str,
    pub model: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub battery_soc: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub locked: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub light_on: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub theft: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub position: Option<PositionOutput>,
    pub fetched_at: DateTime<Utc>,
    pub fields: FieldMap,
}

/// Coordinates.
#[derive(Debug, Serialize)]
pub struct PositionOutput {
    pub latitude: f64,
    pub longitude: f64,
}

impl<'a> From<&'a BikeSnapshot> for SnapshotOutput<'a> {
    fn from(snapshot: &'a BikeSnapshot) -> Self {
        let position = match (snapshot.latitude(), snapshot.longitude()) {
            (Some(latitude), Some(longitude)) => Some(PositionOutput {
                latitude,
                longitude,
            }),
            _ => None,
        };

        Self {
            bike_id: &snapshot.bike_id,
            name: &snapshot.name,
            model: &snapshot.model,
            battery_soc: snapshot.battery_soc(),
            locked: snapshot.is_locked(),
            light_on: snapshot.is_light_on(),
            theft: snapshot.is_theft_flagged(),
            position,
            fetched_at: snapshot.fetched_at,
            fields: snapshot.fields(),
        }
    }
}

// ============================================================================
// Formatter
// ============================================================================

/// JSON formatter.
pub struct JsonFormatter {
    pretty: bool,
}

impl JsonFormatter {
    /// Creates a new JSON formatter.
    pub fn new(pretty: bool) -> Self {
        Self { pretty }
    }

    /// Formats any serializable value.
    pub fn format<T: Serialize>(&self, data: &T) -> Result<String> {
        let json = if self.pretty {
            serde_json::to_string_pretty(data)?
        } else {
            serde_json::to_string(data)?
        };
        Ok(json)
    }

    /// Formats the bike listing.
    pub fn format_bikes(&self, bikes: &[BikeSummary]) -> Result<String> {
        let output: Vec<BikeOutput<'_>> = bikes
            .iter()
            .map(|b| BikeOutput {
                id: &b.id,
                nickname: &b.nickname,
                model: &b.model,
                unique_id: b.unique_id(),
            })
            .collect();
        self.format(&output)
    }

    /// Formats a snapshot.
    pub fn format_snapshot(&self, snapshot: &BikeSnapshot) -> Result<String> {
        self.format(&SnapshotOutput::from(snapshot))
    }

    /// Formats the raw diagnostics dump of a snapshot.
    pub fn format_diagnostics(&self, snapshot: &BikeSnapshot) -> Result<String> {
        self.format(&snapshot.diagnostics())
    }
}
