//! Command-line argument definitions using clap.

use clap::Parser;
use std::path::PathBuf;

use crate::config::Settings;

/// Media extraction and download CLI.
#[derive(Parser, Debug)]
#[command(
    name = "mediagrab",
    version,
    about = "Download media from social/video platform URLs",
    long_about = "Resolves a content URL through the extractor registry and downloads the\n\
                  resulting media with chunked parallel range requests or segmented-stream\n\
                  reassembly."
)]
pub struct Args {
    /// Content URL(s) to extract and download.
    #[arg(required = true)]
    pub urls: Vec<String>,

    /// Base directory for downloads.
    #[arg(short = 'd', long = "directory")]
    pub download_directory: Option<PathBuf>,

    /// Byte-range size per parallel request, in MiB.
    #[arg(long = "chunk-size")]
    pub chunk_size_mib: Option<u64>,

    /// Maximum in-flight chunks per download.
    #[arg(short = 'j', long)]
    pub concurrency: Option<usize>,

    /// Per-request timeout in seconds.
    #[arg(long)]
    pub timeout: Option<u64>,

    /// Additional tries after the first failure.
    #[arg(long)]
    pub retries: Option<u32>,

    /// Delay between retry attempts, in seconds.
    #[arg(long = "retry-delay")]
    pub retry_delay: Option<u64>,

    /// Skip the remux step after download.
    #[arg(long)]
    pub no_remux: bool,

    /// Proxy URL applied to every extractor session.
    #[arg(long, env = "MEDIAGRAB_PROXY")]
    pub proxy: Option<String>,

    /// Directory holding Netscape-format cookie files.
    #[arg(long = "cookies-dir", env = "MEDIAGRAB_COOKIES_DIR")]
    pub cookies_dir: Option<PathBuf>,

    /// Path to the settings file.
    #[arg(short, long, default_value = "mediagrab.toml")]
    pub config: PathBuf,

    /// Hide progress output.
    #[arg(long, short)]
    pub quiet: bool,

    /// Enable debug logging.
    #[arg(long)]
    pub debug: bool,
}

impl Args {
    /// Merge CLI arguments into settings, overriding where specified.
    pub fn merge_into_settings(&self, settings: &mut Settings) {
        if let Some(dir) = &self.download_directory {
            settings.download.directory = dir.clone();
        }

        if let Some(chunk_size) = self.chunk_size_mib {
            settings.download.chunk_size_mib = chunk_size;
        }

        if let Some(concurrency) = self.concurrency {
            settings.download.concurrency = concurrency;
        }

        if let Some(timeout) = self.timeout {
            settings.download.timeout_secs = timeout;
        }

        if let Some(retries) = self.retries {
            settings.download.retry_attempts = retries;
        }

        if let Some(delay) = self.retry_delay {
            settings.download.retry_delay_secs = delay;
        }

        if self.no_remux {
            settings.download.remux = false;
        }

        if let Some(proxy) = &self.proxy {
            settings.http.proxy = Some(proxy.clone());
        }

        if let Some(dir) = &self.cookies_dir {
            settings.http.cookies_dir = dir.clone();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_merge_overrides_settings() {
        let args = Args::parse_from([
            "mediagrab",
            "--directory",
            "/tmp/out",
            "--concurrency",
            "8",
            "--no-remux",
            "https://www.reddit.com/r/pics/comments/abc",
        ]);

        let mut settings = Settings::default();
        args.merge_into_settings(&mut settings);

        assert_eq!(settings.download.directory, PathBuf::from("/tmp/out"));
        assert_eq!(settings.download.concurrency, 8);
        assert!(!settings.download.remux);
        // Untouched fields keep their defaults.
        assert_eq!(settings.download.retry_attempts, 3);
    }

    #[test]
    fn test_urls_required() {
        assert!(Args::try_parse_from(["mediagrab"]).is_err());
    }
}
