// Lint configuration for this crate
#![warn(clippy::all)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]
#![allow(clippy::must_use_candidate)]

//! Stromer CLI - e-bike status and control from the command line.
//!
//! # Examples
//!
//! ```bash
//! # List bikes on the account
//! stromer bikes
//!
//! # Current status of the configured bike
//! stromer status
//!
//! # JSON output
//! stromer status --format json --pretty
//!
//! # Lock, then show the refreshed state
//! stromer lock
//!
//! # Follow the bike on the configured interval
//! stromer watch
//! ```

mod commands;
mod output;

use anyhow::Result;
use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use stromer_fetch::{ApiError, ErrorKind};
use stromer_store::CoordinatorError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use commands::{action, bikes, config, status, watch};

// ============================================================================
// CLI Definition
// ============================================================================

/// Stromer CLI - e-bike status and control.
#[derive(Parser)]
#[command(name = "stromer")]
#[command(about = "Stromer e-bike status and control")]
#[command(long_about = r#"
Talks to the Stromer portal with the credentials of the mobile app.

Credentials come from the config file (see `stromer config path`) or from
STROMER_USERNAME, STROMER_PASSWORD, STROMER_CLIENT_ID and
STROMER_CLIENT_SECRET. Accounts with a client secret use the v3 portal
API, all others use v4.

Examples:
  stromer bikes                  # Bikes on the account
  stromer status                 # Current status
  stromer status --format json   # JSON output
  stromer light on               # Switch the light on
  stromer watch                  # Follow the bike
"#)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Output format (text or json).
    #[arg(long, short = 'f', default_value = "text", global = true)]
    pub format: OutputFormat,

    /// Pretty-print JSON output.
    #[arg(long, global = true)]
    pub pretty: bool,

    /// Bike id to use instead of the configured one.
    #[arg(long, short, global = true)]
    pub bike: Option<String>,

    /// Config file to use instead of the default.
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    /// Verbose output (show debug info and every field).
    #[arg(long, short, global = true)]
    pub verbose: bool,

    /// Disable colored output.
    #[arg(long, global = true)]
    pub no_color: bool,

    /// Quiet mode (minimal output).
    #[arg(long, short, global = true)]
    pub quiet: bool,
}

/// CLI commands.
#[derive(Subcommand)]
pub enum Commands {
    /// List the bikes on the account.
    #[command(visible_alias = "b")]
    Bikes,

    /// Show the current status of the bike.
    #[command(visible_alias = "s")]
    Status,

    /// Refresh on an interval and print every update.
    #[command(visible_alias = "w")]
    Watch(watch::WatchArgs),

    /// Lock the bike.
    Lock,

    /// Unlock the bike.
    Unlock,

    /// Switch the light on or off.
    Light(action::LightArgs),

    /// Reset the trip counters.
    ResetTrip,

    /// Manage configuration.
    Config(config::ConfigArgs),
}

/// Output format options.
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum, Default)]
pub enum OutputFormat {
    /// Human-readable text with colors.
    #[default]
    Text,
    /// JSON output for scripting.
    Json,
}

/// CLI exit codes.
#[repr(i32)]
pub enum ExitCode {
    /// Success.
    Success = 0,
    /// General error.
    Error = 1,
    /// Credentials were rejected.
    AuthFailed = 2,
    /// The portal could not be reached or gave unusable answers.
    Unavailable = 3,
}

impl ExitCode {
    fn for_error(err: &anyhow::Error) -> Self {
        if let Some(e) = err.downcast_ref::<CoordinatorError>() {
            return if e.is_auth_failure() {
                Self::AuthFailed
            } else {
                Self::Unavailable
            };
        }
        match err.downcast_ref::<ApiError>().map(ApiError::kind) {
            Some(ErrorKind::Authentication) => Self::AuthFailed,
            Some(ErrorKind::Transient) => Self::Unavailable,
            Some(ErrorKind::Action) | None => Self::Error,
        }
    }
}

// ============================================================================
// Logging Setup
// ============================================================================

fn setup_logging(verbose: bool, quiet: bool, level: &str) {
    if quiet {
        return; // No logging in quiet mode
    }

    let filter = if verbose {
        EnvFilter::new("stromer=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(format!("stromer={level}")))
    };

    tracing_subscriber::registry()
        .with(
            fmt::layer()
                .with_target(false)
                .without_time()
                .with_writer(std::io::stderr),
        )
        .with(filter)
        .init();
}

// ============================================================================
// Main Entry Point
// ============================================================================

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Loaded before logging so the configured level applies; a broken file
    // is reported by the command that needs it.
    let level = commands::load_config(&cli).map_or_else(|_| "warn".to_string(), |c| c.log_level);
    setup_logging(cli.verbose, cli.quiet, &level);

    let result = match &cli.command {
        Commands::Bikes => bikes::run(&cli).await,
        Commands::Status => status::run(&cli).await,
        Commands::Watch(args) => watch::run(args, &cli).await,
        Commands::Lock => action::run(action::Action::Lock(true), &cli).await,
        Commands::Unlock => action::run(action::Action::Lock(false), &cli).await,
        Commands::Light(args) => action::run(action::Action::Light(args.mode.into()), &cli).await,
        Commands::ResetTrip => action::run(action::Action::ResetTrip, &cli).await,
        Commands::Config(args) => config::run(args, &cli),
    };

    if let Err(e) = result {
        if !cli.quiet {
            eprintln!("Error: {e:#}");
        }
        std::process::exit(ExitCode::for_error(&e) as i32);
    }

    Ok(())
}
