//! mediagrab - media extraction and retrieval engine.
//!
//! Takes a content URL from a supported social/video platform, resolves it
//! through the extractor registry, and downloads the resulting media with
//! chunked parallel range requests or segmented-stream reassembly.
//!
//! # Features
//!
//! - URL to extractor dispatch with redirect chaining
//! - Concurrent chunked downloads with retries and progress reporting
//! - Segmented-stream (HLS) download and merge
//! - Per-extractor HTTP sessions with proxy and cookie support
//! - Optional in-place container remuxing
//!
//! # Example
//!
//! ```no_run
//! use mediagrab::config::DownloadConfig;
//! use mediagrab::extractor::{extract, DEFAULT_REGISTRY};
//! use tokio_util::sync::CancellationToken;
//!
//! #[tokio::main]
//! async fn main() -> mediagrab::Result<()> {
//!     let cancel = CancellationToken::new();
//!     let media = extract(
//!         &DEFAULT_REGISTRY,
//!         "https://www.reddit.com/r/pics/comments/abc123",
//!         &cancel,
//!     )
//!     .await?;
//!
//!     let config = DownloadConfig::default();
//!     let paths = mediagrab::download::download_media_list(&media, &config, &cancel).await?;
//!     println!("{paths:?}");
//!     Ok(())
//! }
//! ```

pub mod cli;
pub mod config;
pub mod download;
pub mod error;
pub mod extractor;
pub mod fs;
pub mod http;
pub mod media;
pub mod output;
pub mod remux;

// Re-exports for convenience
pub use config::{DownloadConfig, Settings};
pub use download::{download_file, download_file_with_segments, download_in_memory, download_media_list};
pub use error::{Error, Result};
pub use extractor::{extract, Extractor, Registry, DEFAULT_REGISTRY};
pub use media::{Media, MediaFormat, MediaType};
