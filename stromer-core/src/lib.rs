// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Stromer Core
//!
//! Core types and models shared by the Stromer portal client crates.
//!
//! This crate has no network code. It defines what the rest of the
//! workspace passes around:
//!
//! - Account credentials and the API dialect they select
//! - Bike summaries returned by bike detection
//! - Bike snapshots built from polled telemetry
//! - Error types for payload validation
//!
//! ## Key Types
//!
//! - [`Credentials`] - Username, password, client id, optional secret
//! - [`ApiDialect`] - Legacy (v3) or current (v4) path family
//! - [`BikeSummary`] - One bike on the account (id, nickname, model)
//! - [`BikeSnapshot`] - Base, status and position fields for one bike
//! - [`FieldValue`] - A primitive vendor field value
//! - [`FieldCategory`] - Recognized key catalog per payload category

pub mod error;
pub mod models;

// Re-export error types
pub use error::CoreError;

// Re-export all model types
pub use models::{
    // Account
    ApiDialect,
    Credentials,
    // Bikes
    BikeSummary,
    LightMode,
    // Snapshot
    BikeSnapshot,
    FieldCategory,
    FieldMap,
    FieldSpec,
    FieldValue,
    ValueKind,
    POSITION_RECEIVED_KEY,
};
