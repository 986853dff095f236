//! Console output and progress display for the CLI.

pub mod console;
pub mod progress;

pub use console::{print_banner, print_error, print_info, print_warning};
pub use progress::{download_bar, progress_updater_for};
