// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Stromer Fetch
//!
//! Network client for the Stromer e-bike portal.
//!
//! ## Client
//!
//! - [`StromerClient`] - login, bike detection, polling and actions
//! - [`api::BikeApi`] - the operations a host drives, implemented by the client
//! - [`auth`] - the form-scraping login sequence
//! - [`endpoints::Endpoints`] - URL tables for the v3 and v4 dialects
//!
//! ## Polling support
//!
//! - [`retry::RetryPolicy`] - bounded retry with a mid-cycle reconnect
//!
//! ## Example
//!
//! ```ignore
//! use stromer_core::Credentials;
//! use stromer_fetch::StromerClient;
//!
//! let creds = Credentials::new("rider@example.com", "secret", "client-id", None);
//! let mut client = StromerClient::new(creds);
//! client.connect().await?;
//!
//! let bikes = client.detect_bikes().await?;
//! let snapshot = client.poll(&bikes[0].id).await?;
//! ```

pub mod api;
pub mod auth;
pub mod client;
pub mod endpoints;
pub mod error;
pub mod http;
pub mod retry;

// Re-export key types at crate root

pub use api::BikeApi;
pub use auth::AuthState;
pub use client::StromerClient;
pub use endpoints::{Endpoints, DEFAULT_BASE_URL};
pub use error::{ApiError, AuthStep, ErrorKind};
pub use http::{HttpSession, DEFAULT_TIMEOUT_SECS};
pub use retry::{RetryPolicy, RetryState, MAX_ATTEMPTS, RECONNECT_AFTER_FAILURES};
