//! Progress bar utilities.

use indicatif::{ProgressBar, ProgressStyle};

use crate::config::ProgressFn;

/// Create a progress bar for a download of unknown item size.
///
/// The engine reports fractions, so the bar runs over a fixed scale.
pub fn download_bar() -> ProgressBar {
    let bar = ProgressBar::new(1000);
    bar.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{bar:40.cyan/blue}] {percent}% ({eta})")
            .unwrap()
            .progress_chars("#>-"),
    );
    bar
}

/// Adapt a progress bar into the engine's fraction callback.
pub fn progress_updater_for(bar: &ProgressBar) -> ProgressFn {
    let bar = bar.clone();
    std::sync::Arc::new(move |fraction: f64| {
        bar.set_position((fraction.clamp(0.0, 1.0) * 1000.0) as u64);
    })
}
