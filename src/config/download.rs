//! Per-download configuration.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Progress callback, invoked with a completed fraction in `[0, 1]`.
pub type ProgressFn = Arc<dyn Fn(f64) + Send + Sync>;

/// Options recognized by the download subsystem.
#[derive(Clone)]
pub struct DownloadConfig {
    /// Byte-range size per parallel request.
    pub chunk_size: u64,

    /// Maximum in-flight chunks or segments.
    pub concurrency: usize,

    /// Per-request deadline. Retries get a fresh deadline.
    pub timeout: Duration,

    /// Root directory for outputs.
    pub download_dir: PathBuf,

    /// Additional tries after the first failure.
    pub retry_attempts: u32,

    /// Fixed delay between attempts.
    pub retry_delay: Duration,

    /// Remux the container in place after completion.
    pub remux: bool,

    /// Optional progress callback.
    pub progress_updater: Option<ProgressFn>,
}

impl Default for DownloadConfig {
    fn default() -> Self {
        Self {
            chunk_size: 10 * 1024 * 1024,
            concurrency: 4,
            timeout: Duration::from_secs(30),
            download_dir: PathBuf::from("downloads"),
            retry_attempts: 3,
            retry_delay: Duration::from_secs(2),
            remux: true,
            progress_updater: None,
        }
    }
}

impl std::fmt::Debug for DownloadConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DownloadConfig")
            .field("chunk_size", &self.chunk_size)
            .field("concurrency", &self.concurrency)
            .field("timeout", &self.timeout)
            .field("download_dir", &self.download_dir)
            .field("retry_attempts", &self.retry_attempts)
            .field("retry_delay", &self.retry_delay)
            .field("remux", &self.remux)
            .field(
                "progress_updater",
                &self.progress_updater.as_ref().map(|_| "<fn>"),
            )
            .finish()
    }
}
