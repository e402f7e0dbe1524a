//! Domain models for the Stromer client.
//!
//! - [`credentials`] - Account credentials and API dialect
//! - [`bike`] - Bike summaries and light modes
//! - [`fields`] - Recognized vendor field catalog
//! - [`snapshot`] - Polled bike snapshots

pub mod bike;
pub mod credentials;
pub mod fields;
pub mod snapshot;

pub use bike::{BikeSummary, LightMode};
pub use credentials::{ApiDialect, Credentials};
pub use fields::{FieldCategory, FieldSpec, ValueKind};
pub use snapshot::{BikeSnapshot, FieldMap, FieldValue, POSITION_RECEIVED_KEY};
