//! Config command - manage configuration.

use anyhow::{bail, Result};
use clap::{Args, Subcommand};
use serde_json::json;
use stromer_store::Config;
use tracing::info;

use crate::output::JsonFormatter;
use crate::{Cli, OutputFormat};

/// Arguments for the config command.
#[derive(Args)]
pub struct ConfigArgs {
    #[command(subcommand)]
    pub action: ConfigAction,
}

/// Config subcommands.
#[derive(Subcommand)]
pub enum ConfigAction {
    /// Show current configuration (secrets hidden).
    Show,

    /// Show the configuration file path.
    Path,

    /// Write a config file with default values.
    Init {
        /// Overwrite an existing file.
        #[arg(long)]
        force: bool,
    },
}

/// Runs the config command.
pub fn run(args: &ConfigArgs, cli: &Cli) -> Result<()> {
    match &args.action {
        ConfigAction::Show => show_config(cli),
        ConfigAction::Path => show_path(cli),
        ConfigAction::Init { force } => init_config(cli, *force),
    }
}

fn config_path(cli: &Cli) -> std::path::PathBuf {
    cli.config.clone().unwrap_or_else(Config::default_path)
}

fn show_config(cli: &Cli) -> Result<()> {
    let config = super::load_config(cli)?;
    let account = &config.account;
    let secret_state = if account.client_secret.is_some() { "set" } else { "not set" };

    match cli.format {
        OutputFormat::Text => {
            println!("Stromer Configuration");
            println!("{}", "─".repeat(40));
            println!();
            println!("Username:         {}", account.username);
            println!("Password:         {}", if account.password.is_empty() { "not set" } else { "set" });
            println!("Client id:        {}", account.client_id);
            println!("Client secret:    {secret_state}");
            match &config.bike {
                Some(bike) => println!("Bike:             {} ({})", bike.id, bike.nickname),
                None => println!("Bike:             first on account"),
            }
            println!("Refresh interval: {}s", config.refresh_interval_secs);
            println!("Request timeout:  {}s", config.timeout_secs);
            println!("Log level:        {}", config.log_level);
            if let Err(e) = config.validate() {
                println!();
                println!("Warning: {e}");
            }
        }
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            let output = json!({
                "username": account.username,
                "passwordSet": !account.password.is_empty(),
                "clientId": account.client_id,
                "clientSecretSet": account.client_secret.is_some(),
                "bike": config.bike,
                "refreshIntervalSecs": config.refresh_interval_secs,
                "timeoutSecs": config.timeout_secs,
                "logLevel": config.log_level,
                "valid": config.validate().is_ok(),
            });
            println!("{}", formatter.format(&output)?);
        }
    }

    Ok(())
}

fn show_path(cli: &Cli) -> Result<()> {
    let path = config_path(cli);
    match cli.format {
        OutputFormat::Text => println!("{}", path.display()),
        OutputFormat::Json => {
            let formatter = JsonFormatter::new(cli.pretty);
            println!("{}", formatter.format(&json!({ "config": path }))?);
        }
    }
    Ok(())
}

fn init_config(cli: &Cli, force: bool) -> Result<()> {
    let path = config_path(cli);
    if path.exists() && !force {
        bail!("{} already exists (use --force to overwrite)", path.display());
    }

    Config::default().save_to(&path)?;
    info!(path = %path.display(), "Config initialized");

    if !cli.quiet {
        println!("Wrote {}", path.display());
        println!("Fill in account.username, account.password and account.client_id.");
    }
    Ok(())
}
