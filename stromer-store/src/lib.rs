// Lint configuration for this crate
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! # Stromer Store
//!
//! Keeps a bike's last-known state fresh.
//!
//! This crate provides:
//!
//! - **PollingCoordinator**: periodic refresh with bounded retry, snapshot
//!   publication through a watch channel, and actions followed by a refresh
//! - **Config**: account and polling settings with a JSON file and
//!   environment overrides
//!
//! ## Usage
//!
//! ```ignore
//! use std::sync::Arc;
//! use stromer_fetch::StromerClient;
//! use stromer_store::{Config, PollingCoordinator};
//!
//! let config = Config::load_from(&Config::default_path())?;
//! let mut client = StromerClient::new(config.credentials()?);
//! client.connect().await?;
//!
//! let coordinator = Arc::new(PollingCoordinator::new(client, "4711"));
//! coordinator.first_refresh().await?;
//! let handle = coordinator.spawn(config.refresh_interval());
//!
//! let mut rx = coordinator.subscribe();
//! while rx.changed().await.is_ok() {
//!     println!("Bike updated!");
//! }
//! ```

pub mod config;
pub mod coordinator;
pub mod error;

pub use config::{AccountConfig, BikeConfig, Config, DEFAULT_REFRESH_INTERVAL_SECS};
pub use coordinator::{Health, PollingCoordinator, RefreshHandle, SnapshotReceiver};
pub use error::{ConfigError, CoordinatorError};
