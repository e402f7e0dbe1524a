//! Text output formatting with a battery bar and colors.

use chrono::{DateTime, Local, Utc};
use stromer_core::{BikeSnapshot, BikeSummary, FieldCategory};
use stromer_store::Health;

// ============================================================================
// ANSI Colors
// ============================================================================

const RESET: &str = "\x1b[0m";
const BOLD: &str = "\x1b[1m";
const DIM: &str = "\x1b[2m";
const GREEN: &str = "\x1b[32m";
const YELLOW: &str = "\x1b[33m";
const RED: &str = "\x1b[31m";
const CYAN: &str = "\x1b[36m";

// Progress bar characters
const BAR_FULL: char = '█';
const BAR_EMPTY: char = '░';

/// Text formatter with optional colors.
pub struct TextFormatter {
    use_colors: bool,
    bar_width: usize,
}

impl TextFormatter {
    /// Creates a new text formatter.
    pub fn new(use_colors: bool) -> Self {
        Self {
            use_colors,
            bar_width: 10,
        }
    }

    /// Formats the bike listing.
    pub fn format_bikes(&self, bikes: &[BikeSummary]) -> String {
        if bikes.is_empty() {
            return self.dim("No bikes on this account");
        }

        let mut lines = vec![format!(
            "{:<10} {:<20} {}",
            self.bold("ID"),
            self.bold("Nickname"),
            self.bold("Model")
        )];
        for bike in bikes {
            lines.push(format!("{:<10} {:<20} {}", bike.id, bike.nickname, bike.model));
        }
        lines.join("\n")
    }

    /// Formats a snapshot; `all_fields` appends every raw field.
    pub fn format_snapshot(&self, snapshot: &BikeSnapshot, all_fields: bool) -> String {
        let mut lines = Vec::new();

        let label = BikeSummary::new(&snapshot.bike_id, &snapshot.name, &snapshot.model).display_label();
        lines.push(self.bold(&label));

        match snapshot.battery_soc() {
            Some(soc) => lines.push(format!(
                "Battery:  {} {}",
                self.progress_bar(soc),
                self.color_for_percent(soc, &format!("{soc:.0}%"))
            )),
            None => lines.push(format!("Battery:  {}", self.dim("unknown"))),
        }

        lines.push(format!(
            "Lock:     {}",
            self.flag(snapshot.is_locked(), "locked", "unlocked")
        ));
        lines.push(format!(
            "Light:    {}",
            self.flag(snapshot.is_light_on(), "on", "off")
        ));
        if snapshot.is_theft_flagged() == Some(true) {
            lines.push(format!("Theft:    {}", self.red("flagged")));
        }

        if let (Some(lat), Some(lon)) = (snapshot.latitude(), snapshot.longitude()) {
            lines.push(format!("Position: {}", self.cyan(&format!("{lat:.5}, {lon:.5}"))));
        }
        if let Some(at) = snapshot.position_received_at().or_else(|| snapshot.received_at()) {
            lines.push(format!("Reported: {}", self.dim(&format_time(at))));
        }

        if all_fields {
            for category in FieldCategory::ALL {
                let fields = snapshot.category(category);
                if fields.is_empty() {
                    continue;
                }
                lines.push(String::new());
                lines.push(self.dim(&format!("{category:?} fields:")));
                for (key, value) in fields {
                    lines.push(format!("  {key:<28} {}", serde_json::to_string(value).unwrap_or_default()));
                }
            }
        }

        lines.join("\n")
    }

    /// Formats a health line for watch mode.
    pub fn format_health(&self, health: Health) -> String {
        match health {
            Health::Ready => self.green("ready"),
            Health::NotReady => self.yellow("not ready"),
            Health::Unavailable => self.dim("unavailable"),
            Health::AuthFailed => self.red("authentication failed"),
        }
    }

    /// Formats a progress bar.
    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss, clippy::cast_precision_loss)]
    pub fn progress_bar(&self, percent: f64) -> String {
        let percent = percent.clamp(0.0, 100.0);
        let filled = ((percent / 100.0) * self.bar_width as f64).round() as usize;
        let empty = self.bar_width.saturating_sub(filled);

        let bar = format!(
            "{}{}",
            BAR_FULL.to_string().repeat(filled),
            BAR_EMPTY.to_string().repeat(empty)
        );

        self.color_for_percent(percent, &bar)
    }

    fn flag(&self, value: Option<bool>, on: &str, off: &str) -> String {
        match value {
            Some(true) => self.green(on),
            Some(false) => self.yellow(off),
            None => self.dim("unknown"),
        }
    }

    // ========================================================================
    // Color/style helpers
    // ========================================================================

    fn color_for_percent(&self, percent: f64, text: &str) -> String {
        if percent < 20.0 {
            self.red(text)
        } else if percent < 50.0 {
            self.yellow(text)
        } else {
            self.green(text)
        }
    }

    fn paint(&self, color: &str, text: &str) -> String {
        if self.use_colors {
            format!("{color}{text}{RESET}")
        } else {
            text.to_string()
        }
    }

    fn bold(&self, text: &str) -> String {
        self.paint(BOLD, text)
    }

    fn dim(&self, text: &str) -> String {
        self.paint(DIM, text)
    }

    fn green(&self, text: &str) -> String {
        self.paint(GREEN, text)
    }

    fn yellow(&self, text: &str) -> String {
        self.paint(YELLOW, text)
    }

    fn red(&self, text: &str) -> String {
        self.paint(RED, text)
    }

    fn cyan(&self, text: &str) -> String {
        self.paint(CYAN, text)
    }
}

fn format_time(at: DateTime<Utc>) -> String {
    at.with_timezone(&Local).format("%Y-%m-%d %H:%M:%S").to_string()
}
