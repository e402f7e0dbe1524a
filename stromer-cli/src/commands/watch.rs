//! Watch command - follow the bike on an interval.

use anyhow::{bail, Result};
use clap::Args;
use std::io::{stdout, Write};
use std::sync::Arc;
use std::time::Duration;
use stromer_store::Health;
use tracing::info;

use super::open;
use crate::output::{render_snapshot, TextFormatter};
use crate::{Cli, OutputFormat};

/// Arguments for watch command.
#[derive(Args)]
pub struct WatchArgs {
    /// Refresh interval in seconds (defaults to the configured interval).
    #[arg(long, short)]
    pub interval: Option<u64>,

    /// Minimum interval to use.
    #[arg(long, default_value = "60")]
    pub min_interval: u64,
}

/// Runs the watch command.
pub async fn run(args: &WatchArgs, cli: &Cli) -> Result<()> {
    let (config, bike, coordinator) = open(cli).await?;
    let refresh_interval = args
        .interval
        .unwrap_or(config.refresh_interval_secs)
        .max(args.min_interval)
        .max(1);

    info!(interval = refresh_interval, bike = %bike.display_label(), "Starting watch mode");

    let coordinator = Arc::new(coordinator);
    let mut snapshots = coordinator.subscribe();
    let mut health = coordinator.subscribe_health();

    coordinator.first_refresh().await?;
    let handle = coordinator.spawn(Duration::from_secs(refresh_interval));
    let formatter = TextFormatter::new(!cli.no_color);

    let mut redraw = true;
    loop {
        let current = snapshots.borrow_and_update().clone();
        if let (true, Some(snapshot)) = (redraw, current) {
            if cli.format == OutputFormat::Text {
                // Clear screen
                print!("\x1b[2J\x1b[H");
                let now = chrono::Local::now();
                println!(
                    "Stromer Watch Mode - {} (refresh: {}s, {})",
                    now.format("%H:%M:%S"),
                    refresh_interval,
                    formatter.format_health(coordinator.health())
                );
                println!("{}", "─".repeat(50));
            }
            println!("{}", render_snapshot(&snapshot, cli)?);
            stdout().flush()?;
        }

        redraw = tokio::select! {
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                true
            }
            _ = health.changed() => {
                if *health.borrow_and_update() == Health::AuthFailed {
                    handle.shutdown().await;
                    bail!("authentication failed, check the account credentials");
                }
                false
            }
            _ = tokio::signal::ctrl_c() => {
                info!("Stopping watch mode");
                break;
            }
        };
    }

    handle.shutdown().await;
    coordinator.disconnect().await;
    Ok(())
}
