//! Status command - one refresh, then print the snapshot.

use anyhow::Result;

use super::open;
use crate::output::render_snapshot;
use crate::Cli;

/// Runs the status command.
pub async fn run(cli: &Cli) -> Result<()> {
    let (_, _, coordinator) = open(cli).await?;
    let snapshot = coordinator.first_refresh().await?;
    coordinator.disconnect().await;

    println!("{}", render_snapshot(&snapshot, cli)?);
    Ok(())
}
