//! The operations a host drives on a bike account.
//!
//! [`BikeApi`] is the seam between the polling coordinator and the network
//! client. [`StromerClient`](crate::StromerClient) is the production
//! implementation; tests substitute scripted fakes.

use async_trait::async_trait;
use stromer_core::{BikeSnapshot, BikeSummary, LightMode};

use crate::error::ApiError;

/// Operations on one Stromer portal account.
///
/// ## Implementing
///
/// ```ignore
/// struct FakeApi { locked: bool }
///
/// #[async_trait]
/// impl BikeApi for FakeApi {
///     async fn connect(&mut self) -> Result<bool, ApiError> {
///         Ok(true)
///     }
///
///     async fn poll(&self, bike_id: &str) -> Result<BikeSnapshot, ApiError> {
///         // build a snapshot from canned payloads
///     }
///
///     // ...
/// }
/// ```
#[async_trait]
pub trait BikeApi: Send + Sync {
    /// Opens a new session and logs in, replacing any previous session.
    async fn connect(&mut self) -> Result<bool, ApiError>;

    /// Tears the session down.
    async fn disconnect(&mut self);

    /// Lists every bike on the account, in portal order.
    async fn detect_bikes(&self) -> Result<Vec<BikeSummary>, ApiError>;

    /// Fetches base, status and position of one bike.
    async fn poll(&self, bike_id: &str) -> Result<BikeSnapshot, ApiError>;

    /// Locks or unlocks the bike.
    async fn set_lock(&self, bike_id: &str, locked: bool) -> Result<(), ApiError>;

    /// Switches the light.
    async fn set_light(&self, bike_id: &str, mode: LightMode) -> Result<(), ApiError>;

    /// Clears the trip counters.
    async fn reset_trip_data(&self, bike_id: &str) -> Result<(), ApiError>;
}
