//! Persistent settings, loaded from a TOML file.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::config::download::{DownloadConfig, ProgressFn};
use crate::error::{Error, Result};

/// Main settings structure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Settings {
    #[serde(default)]
    pub download: DownloadSettings,

    #[serde(default)]
    pub http: HttpSettings,
}

/// Download knobs persisted in the settings file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DownloadSettings {
    /// Root directory for downloaded files.
    #[serde(default = "default_directory")]
    pub directory: PathBuf,

    /// Byte-range size per parallel request, in MiB.
    #[serde(default = "default_chunk_size_mib")]
    pub chunk_size_mib: u64,

    /// Maximum in-flight chunks.
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Per-request deadline in seconds.
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,

    /// Additional tries after the first failure.
    #[serde(default = "default_retry_attempts")]
    pub retry_attempts: u32,

    /// Fixed delay between attempts, in seconds.
    #[serde(default = "default_retry_delay_secs")]
    pub retry_delay_secs: u64,

    /// Remux containers after download.
    #[serde(default = "default_true")]
    pub remux: bool,
}

/// HTTP session settings.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HttpSettings {
    /// Directory holding Netscape-format cookie files, one per extractor.
    #[serde(default = "default_cookies_dir")]
    pub cookies_dir: PathBuf,

    /// Default proxy URL applied to every extractor session.
    #[serde(default)]
    pub proxy: Option<String>,

    /// Per-extractor proxy overrides, keyed by extractor code name.
    #[serde(default)]
    pub proxies: HashMap<String, String>,
}

fn default_directory() -> PathBuf {
    PathBuf::from("downloads")
}

fn default_chunk_size_mib() -> u64 {
    10
}

fn default_concurrency() -> usize {
    4
}

fn default_timeout_secs() -> u64 {
    30
}

fn default_retry_attempts() -> u32 {
    3
}

fn default_retry_delay_secs() -> u64 {
    2
}

fn default_true() -> bool {
    true
}

fn default_cookies_dir() -> PathBuf {
    PathBuf::from("cookies")
}

impl Default for DownloadSettings {
    fn default() -> Self {
        Self {
            directory: default_directory(),
            chunk_size_mib: default_chunk_size_mib(),
            concurrency: default_concurrency(),
            timeout_secs: default_timeout_secs(),
            retry_attempts: default_retry_attempts(),
            retry_delay_secs: default_retry_delay_secs(),
            remux: default_true(),
        }
    }
}

impl Default for HttpSettings {
    fn default() -> Self {
        Self {
            cookies_dir: default_cookies_dir(),
            proxy: None,
            proxies: HashMap::new(),
        }
    }
}

impl Settings {
    /// Load settings from a TOML file.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| Error::Config(format!("Failed to read {}: {}", path.display(), e)))?;
        let settings: Settings = toml::from_str(&content)?;
        Ok(settings)
    }

    /// Build a download config from these settings.
    pub fn download_config(&self, progress_updater: Option<ProgressFn>) -> DownloadConfig {
        DownloadConfig {
            chunk_size: self.download.chunk_size_mib * 1024 * 1024,
            concurrency: self.download.concurrency,
            timeout: Duration::from_secs(self.download.timeout_secs),
            download_dir: self.download.directory.clone(),
            retry_attempts: self.download.retry_attempts,
            retry_delay: Duration::from_secs(self.download.retry_delay_secs),
            remux: self.download.remux,
            progress_updater,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_uses_defaults() {
        let settings: Settings = toml::from_str("").unwrap();
        assert_eq!(settings.download.directory, PathBuf::from("downloads"));
        assert_eq!(settings.download.chunk_size_mib, 10);
        assert_eq!(settings.download.concurrency, 4);
        assert!(settings.download.remux);
        assert_eq!(settings.http.cookies_dir, PathBuf::from("cookies"));
        assert!(settings.http.proxy.is_none());
    }

    #[test]
    fn test_partial_override() {
        let settings: Settings = toml::from_str(
            r#"
            [download]
            concurrency = 8
            remux = false

            [http]
            proxy = "socks5://127.0.0.1:9050"

            [http.proxies]
            reddit = "http://proxy.local:8080"
            "#,
        )
        .unwrap();

        assert_eq!(settings.download.concurrency, 8);
        assert!(!settings.download.remux);
        assert_eq!(settings.download.chunk_size_mib, 10);
        assert_eq!(
            settings.http.proxy.as_deref(),
            Some("socks5://127.0.0.1:9050")
        );
        assert_eq!(
            settings.http.proxies.get("reddit").map(String::as_str),
            Some("http://proxy.local:8080")
        );
    }

    #[test]
    fn test_download_config_conversion() {
        let settings: Settings = toml::from_str("[download]\nchunk_size_mib = 2").unwrap();
        let config = settings.download_config(None);
        assert_eq!(config.chunk_size, 2 * 1024 * 1024);
        assert_eq!(config.timeout, Duration::from_secs(30));
    }
}
