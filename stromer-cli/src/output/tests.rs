//! CLI output formatting tests.

use serde_json::{json, Value};
use stromer_core::{BikeSnapshot, BikeSummary};

fn snapshot() -> BikeSnapshot {
    BikeSnapshot::from_payloads(
        &json!({"bikeid": 4711, "nickname": "Commuter", "biketype": "ST3"}),
        &json!({"battery_SOC": 15, "lock_flag": true, "light_on": 0, "theft_flag": false}),
        &json!({"latitude": 47.37, "longitude": 8.54, "rcvts": 1_700_000_000}),
    )
    .unwrap()
}

mod text_formatter_tests {
    use super::super::text::TextFormatter;
    use super::*;
    use stromer_store::Health;

    #[test]
    fn test_progress_bar_boundary_values() {
        let formatter = TextFormatter::new(false);

        let test_cases = vec![
            (0.0, "░░░░░░░░░░"),
            (10.0, "█░░░░░░░░░"),
            (25.0, "███░░░░░░░"), // 2.5 rounds to 3 blocks
            (50.0, "█████░░░░░"),
            (100.0, "██████████"),
            (140.0, "██████████"),
        ];

        for (percent, expected) in test_cases {
            let bar = formatter.progress_bar(percent);
            assert_eq!(bar, expected, "Failed for {percent}%");
        }
    }

    #[test]
    fn test_low_battery_is_red() {
        let formatter = TextFormatter::new(true);
        assert!(formatter.progress_bar(10.0).contains("\x1b[31m"));
        assert!(formatter.progress_bar(80.0).contains("\x1b[32m"));
    }

    #[test]
    fn test_snapshot_text() {
        let formatter = TextFormatter::new(false);
        let text = formatter.format_snapshot(&snapshot(), false);

        assert!(text.starts_with("Commuter (ST3) #4711"));
        assert!(text.contains("Battery:  ██░░░░░░░░ 15%"));
        assert!(text.contains("Lock:     locked"));
        assert!(text.contains("Light:    off"));
        assert!(text.contains("Position: 47.37000, 8.54000"));
        assert!(!text.contains("Theft"));
        assert!(!text.contains("fields:"));
    }

    #[test]
    fn test_snapshot_text_with_all_fields() {
        let formatter = TextFormatter::new(false);
        let text = formatter.format_snapshot(&snapshot(), true);

        assert!(text.contains("Status fields:"));
        assert!(text.contains("rcvts_pos"));
    }

    #[test]
    fn test_bike_listing() {
        let formatter = TextFormatter::new(false);
        let bikes = vec![BikeSummary::new("4711", "Commuter", "ST3")];
        let text = formatter.format_bikes(&bikes);
        assert!(text.lines().nth(1).unwrap().starts_with("4711"));

        assert_eq!(formatter.format_bikes(&[]), "No bikes on this account");
    }

    #[test]
    fn test_health_labels() {
        let formatter = TextFormatter::new(false);
        assert_eq!(formatter.format_health(Health::AuthFailed), "authentication failed");
        assert_eq!(formatter.format_health(Health::Ready), "ready");
    }
}

mod json_formatter_tests {
    use super::super::json::JsonFormatter;
    use super::*;

    #[test]
    fn test_snapshot_json() {
        let formatter = JsonFormatter::new(false);
        let out: Value = serde_json::from_str(&formatter.format_snapshot(&snapshot()).unwrap()).unwrap();

        assert_eq!(out["bikeId"], "4711");
        assert_eq!(out["name"], "Commuter");
        assert_eq!(out["batterySoc"], 15.0);
        assert_eq!(out["locked"], true);
        assert_eq!(out["lightOn"], false);
        assert_eq!(out["position"]["latitude"], 47.37);
        assert_eq!(out["fields"]["rcvts_pos"], 1_700_000_000);
    }

    #[test]
    fn test_bikes_json() {
        let formatter = JsonFormatter::new(true);
        let bikes = vec![BikeSummary::new("4711", "Commuter", "ST3")];
        let out: Value = serde_json::from_str(&formatter.format_bikes(&bikes).unwrap()).unwrap();

        assert_eq!(out[0]["id"], "4711");
        assert_eq!(out[0]["uniqueId"], "stromerbike-4711");
    }

    #[test]
    fn test_diagnostics_json() {
        let formatter = JsonFormatter::new(false);
        let out: Value =
            serde_json::from_str(&formatter.format_diagnostics(&snapshot()).unwrap()).unwrap();

        assert_eq!(out["bike_id"], "4711");
        assert_eq!(out["bike_model"], "ST3");
        assert_eq!(out["bikedata"]["battery_SOC"], 15);
        assert_eq!(out["bikedata"]["rcvts_pos"], 1_700_000_000);
    }
}

mod render_tests {
    use super::super::render_snapshot;
    use super::*;
    use crate::Cli;
    use clap::Parser;

    #[test]
    fn test_verbose_json_status_prints_diagnostics() {
        let cli = Cli::try_parse_from(["stromer", "status", "--format", "json", "--verbose"]).unwrap();
        let out: Value = serde_json::from_str(&render_snapshot(&snapshot(), &cli).unwrap()).unwrap();

        assert_eq!(out["bike_name"], "Commuter");
        assert_eq!(out["bikedata"]["lock_flag"], true);
        assert!(out.get("bikeId").is_none());
    }

    #[test]
    fn test_plain_json_status_prints_summary() {
        let cli = Cli::try_parse_from(["stromer", "status", "--format", "json"]).unwrap();
        let out: Value = serde_json::from_str(&render_snapshot(&snapshot(), &cli).unwrap()).unwrap();

        assert_eq!(out["bikeId"], "4711");
        assert!(out.get("bikedata").is_none());
    }
}
