//! Terminal progress display driven by grid update notifications

use std::sync::LazyLock;

use indicatif::{ProgressBar, ProgressStyle};

use crate::io::configuration::PROGRESS_BAR_WIDTH;
use crate::spatial::grid::HeightGrid;
use crate::spatial::observer::SubscriptionId;

static PROBE_STYLE: LazyLock<ProgressStyle> = LazyLock::new(|| {
    ProgressStyle::default_bar()
        .template(&format!(
            "[{{elapsed_precise}}] Probed: [{{bar:{PROGRESS_BAR_WIDTH}.cyan/blue}}] {{pos}}/{{len}} {{msg}}"
        ))
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("█▉▊▋▌▍▎▏ ")
});

/// Progress bar that follows a grid's probed point count
///
/// The bar subscribes to the grid while attached and advances on every
/// recorded height, including updates made by code that never sees the bar.
pub struct ProbeProgress {
    bar: ProgressBar,
    subscription: Option<SubscriptionId>,
}

impl ProbeProgress {
    /// Create a visible bar sized to the grid and positioned at its progress
    pub fn new(grid: &HeightGrid) -> Self {
        let bar = ProgressBar::new(grid.total_points() as u64);
        bar.set_style(PROBE_STYLE.clone());
        Self::with_bar(bar, grid)
    }

    /// Create a bar that tracks progress without drawing anything
    pub fn hidden(grid: &HeightGrid) -> Self {
        let bar = ProgressBar::hidden();
        bar.set_length(grid.total_points() as u64);
        Self::with_bar(bar, grid)
    }

    fn with_bar(bar: ProgressBar, grid: &HeightGrid) -> Self {
        bar.set_position(grid.progress() as u64);
        Self {
            bar,
            subscription: None,
        }
    }

    /// Start following updates of `grid`
    ///
    /// Attaching again replaces the previous subscription on the same grid.
    pub fn attach(&mut self, grid: &mut HeightGrid) {
        self.detach(grid);

        let bar = self.bar.clone();
        let id = grid.subscribe(move |update| {
            bar.set_position(update.progress as u64);
            bar.set_message(format!("last ({}, {})", update.x, update.y));
        });
        self.subscription = Some(id);
    }

    /// Stop following `grid`, returning whether a subscription was removed
    pub fn detach(&mut self, grid: &mut HeightGrid) -> bool {
        self.subscription
            .take()
            .is_some_and(|id| grid.unsubscribe(id))
    }

    /// Current bar position
    pub fn position(&self) -> u64 {
        self.bar.position()
    }

    /// Current bar length
    pub fn length(&self) -> Option<u64> {
        self.bar.length()
    }

    /// Leave the final state on screen
    pub fn finish(&self) {
        self.bar.finish_with_message("done");
    }
}
