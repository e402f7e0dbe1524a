//! CLI command implementations.

pub mod action;
pub mod bikes;
pub mod config;
pub mod status;
pub mod watch;

use anyhow::{Context, Result};
use stromer_core::BikeSummary;
use stromer_fetch::StromerClient;
use stromer_store::{Config, PollingCoordinator};
use tracing::{debug, info_span};

use crate::Cli;

/// Loads the config file named on the command line (or the default one) and
/// applies environment overrides.
pub fn load_config(cli: &Cli) -> Result<Config> {
    let path = cli.config.clone().unwrap_or_else(Config::default_path);
    let mut config = Config::load_from(&path)
        .with_context(|| format!("failed to load config from {}", path.display()))?;
    config.apply_env();
    Ok(config)
}

/// Builds a client from the config and logs in.
pub async fn connect(config: &Config) -> Result<StromerClient> {
    let credentials = config.credentials()?;
    let mut client = StromerClient::new(credentials)
        .with_timeout(config.timeout())
        .with_span(info_span!("stromer", user = %config.account.username));
    client.connect().await?;
    Ok(client)
}

/// Picks the bike to act on: `--bike`, then the configured bike, then the
/// first bike on the account.
pub fn select_bike(bikes: &[BikeSummary], requested: Option<&str>) -> Result<BikeSummary> {
    let bike = match requested {
        Some(id) => bikes
            .iter()
            .find(|b| b.id == id)
            .with_context(|| format!("bike {id} is not on this account"))?,
        None => bikes.first().context("no bikes on this account")?,
    };
    Ok(bike.clone())
}

/// Connects, selects the bike and wraps the client in a coordinator.
pub async fn open(cli: &Cli) -> Result<(Config, BikeSummary, PollingCoordinator<StromerClient>)> {
    let config = load_config(cli)?;
    let client = connect(&config).await?;
    let bikes = client.detect_bikes().await?;

    let requested = cli
        .bike
        .as_deref()
        .or_else(|| config.bike.as_ref().map(|b| b.id.as_str()));
    let bike = select_bike(&bikes, requested)?;
    debug!(bike = %bike.display_label(), "Selected bike");

    let span = info_span!("coordinator", bike = %bike.unique_id());
    let coordinator = PollingCoordinator::new(client, bike.id.clone()).with_span(span);
    Ok((config, bike, coordinator))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bikes() -> Vec<BikeSummary> {
        vec![
            BikeSummary::new("1", "Commuter", "ST3"),
            BikeSummary::new("2", "Spare", "ST1"),
        ]
    }

    #[test]
    fn test_select_first_by_default() {
        assert_eq!(select_bike(&bikes(), None).unwrap().id, "1");
    }

    #[test]
    fn test_select_requested() {
        assert_eq!(select_bike(&bikes(), Some("2")).unwrap().nickname, "Spare");
    }

    #[test]
    fn test_select_errors() {
        let err = select_bike(&bikes(), Some("9")).unwrap_err();
        assert!(err.to_string().contains("bike 9"));
        assert!(select_bike(&[], None).is_err());
    }
}
