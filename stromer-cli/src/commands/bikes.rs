//! Bikes command - list the bikes on the account.

use anyhow::Result;
use tracing::info;

use super::{connect, load_config};
use crate::output::{JsonFormatter, TextFormatter};
use crate::{Cli, OutputFormat};

/// Runs the bikes command.
pub async fn run(cli: &Cli) -> Result<()> {
    let config = load_config(cli)?;
    let mut client = connect(&config).await?;
    let bikes = client.detect_bikes().await?;
    client.disconnect().await;

    info!(count = bikes.len(), "Listing bikes");

    let output = match cli.format {
        OutputFormat::Text => TextFormatter::new(!cli.no_color).format_bikes(&bikes),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_bikes(&bikes)?,
    };
    println!("{output}");
    Ok(())
}
