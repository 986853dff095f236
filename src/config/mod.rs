//! Configuration module.
//!
//! This module handles:
//! - Per-download options (chunking, concurrency, retries, remux)
//! - Loading persistent settings from TOML files
//! - Merging CLI arguments into settings

pub mod download;
pub mod settings;

pub use download::{DownloadConfig, ProgressFn};
pub use settings::{DownloadSettings, HttpSettings, Settings};
