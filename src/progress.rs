//! Progress display for registry and advisory lookups
//!
//! Draws a bar on stderr while a batch resolves, using indicatif.

use indicatif::{ProgressBar, ProgressStyle};
use std::time::Duration;

/// Progress reporter for one batch
pub struct Progress {
    /// Whether progress display is enabled (off for quiet and JSON runs)
    enabled: bool,
    bar: Option<ProgressBar>,
}

impl Progress {
    pub fn new(enabled: bool) -> Self {
        Self { enabled, bar: None }
    }

    pub fn disabled() -> Self {
        Self::new(false)
    }

    /// Start a bar for `total` lookups
    pub fn start(&mut self, total: u64, message: &str) {
        if !self.enabled || total == 0 {
            return;
        }

        let bar = ProgressBar::new(total);
        bar.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.cyan} {msg} [{bar:30.cyan/blue}] {pos}/{len}")
                .expect("Invalid template")
                .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏ ")
                .progress_chars("█▓▒░"),
        );
        bar.set_message(message.to_string());
        bar.enable_steady_tick(Duration::from_millis(80));
        self.bar = Some(bar);
    }

    /// One lookup finished, successfully or not
    pub fn inc(&self) {
        if let Some(ref bar) = self.bar {
            bar.inc(1);
        }
    }

    pub fn is_active(&self) -> bool {
        self.bar.is_some()
    }

    /// Remove the bar so it does not mix with report output
    pub fn finish_and_clear(&mut self) {
        if let Some(ref bar) = self.bar {
            bar.finish_and_clear();
        }
        self.bar = None;
    }
}

impl Default for Progress {
    fn default() -> Self {
        Self::new(true)
    }
}
