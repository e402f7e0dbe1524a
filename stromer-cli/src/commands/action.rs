//! Action commands - lock, unlock, light and trip reset.
//!
//! Each action is followed by a refresh, so the printed state already shows
//! its effect.

use anyhow::Result;
use clap::{Args, ValueEnum};
use stromer_core::LightMode;
use tracing::info;

use super::open;
use crate::output::render_snapshot;
use crate::Cli;

/// Light switch position.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum LightArg {
    /// Light on.
    On,
    /// Light off.
    Off,
}

impl From<LightArg> for LightMode {
    fn from(arg: LightArg) -> Self {
        match arg {
            LightArg::On => LightMode::On,
            LightArg::Off => LightMode::Off,
        }
    }
}

/// Arguments for the light command.
#[derive(Args)]
pub struct LightArgs {
    /// Switch position.
    pub mode: LightArg,
}

/// A write action on the bike.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Lock (`true`) or unlock (`false`).
    Lock(bool),
    /// Switch the light.
    Light(LightMode),
    /// Reset the trip counters.
    ResetTrip,
}

/// Runs an action command.
pub async fn run(action: Action, cli: &Cli) -> Result<()> {
    let (_, bike, coordinator) = open(cli).await?;

    match action {
        Action::Lock(locked) => coordinator.set_lock(locked).await?,
        Action::Light(mode) => coordinator.set_light(mode).await?,
        Action::ResetTrip => coordinator.reset_trip_data().await?,
    }
    info!(?action, bike = %bike.display_label(), "Action acknowledged");

    // The follow-up refresh may have failed; fall back to a message.
    match coordinator.snapshot() {
        Some(snapshot) => println!("{}", render_snapshot(&snapshot, cli)?),
        None if !cli.quiet => println!("Done. Bike state could not be refreshed."),
        None => {}
    }

    coordinator.disconnect().await;
    Ok(())
}
