//! Output formatting for CLI.

mod json;
mod text;

pub use json::JsonFormatter;
pub use text::TextFormatter;

use anyhow::Result;
use stromer_core::BikeSnapshot;

use crate::{Cli, OutputFormat};

/// Renders a snapshot in the format chosen on the command line.
///
/// `--verbose` with JSON output prints the diagnostics dump instead.
pub fn render_snapshot(snapshot: &BikeSnapshot, cli: &Cli) -> Result<String> {
    match cli.format {
        OutputFormat::Text => Ok(TextFormatter::new(!cli.no_color).format_snapshot(snapshot, cli.verbose)),
        OutputFormat::Json if cli.verbose => JsonFormatter::new(cli.pretty).format_diagnostics(snapshot),
        OutputFormat::Json => JsonFormatter::new(cli.pretty).format_snapshot(snapshot),
    }
}

#[cfg(test)]
mod tests;
