//! Progress display for multi-realization runs

use crate::io::configuration::PROGRESS_TEMPLATE;
use indicatif::{ProgressBar, ProgressStyle};
use std::sync::LazyLock;

static REALIZATION_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(PROGRESS_TEMPLATE)
        .unwrap_or_else(|_| ProgressStyle::default_bar())
});

/// Tracks completed realizations on a single shared bar
///
/// Disabled instances carry no bar at all, so the engine can tick
/// unconditionally from worker threads without any display cost.
#[derive(Debug)]
pub struct RealizationProgress {
    bar: Option<ProgressBar>,
}

impl RealizationProgress {
    /// Create a progress tracker for `total` realizations
    pub fn new(enabled: bool, total: usize) -> Self {
        let bar = if enabled {
            Some(ProgressBar::new(total as u64).with_style(REALIZATION_STYLE.clone()))
        } else {
            None
        };

        Self { bar }
    }

    /// Record one completed realization
    pub fn tick(&self) {
        if let Some(bar) = &self.bar {
            bar.inc(1);
        }
    }

    /// Finish and remove the bar from the terminal
    pub fn finish(&self) {
        if let Some(bar) = &self.bar {
            bar.finish_and_clear();
        }
    }
}
