//! Error types for the mediagrab engine.

use thiserror::Error;

/// Main error type for the engine.
#[derive(Error, Debug)]
pub enum Error {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    // Dispatch errors
    #[error("No matching extractor for URL: {0}")]
    NoMatchingExtractor(String),

    #[error("Too many redirects (limit: {0})")]
    TooManyRedirects(usize),

    #[error("Redirect cycle detected at: {0}")]
    RedirectCycle(String),

    // Extraction errors
    #[error("Extractor failed: {0}")]
    Extractor(String),

    #[error("No media found")]
    NoMediaFound,

    // Download errors
    #[error("Download failed: {0}")]
    DownloadFailed(String),

    #[error("Segment {index} download failed: {source}")]
    SegmentDownloadFailed {
        index: usize,
        #[source]
        source: Box<Error>,
    },

    #[error("Remux failed: {0}")]
    RemuxFailed(String),

    #[error("ffmpeg not found. Install ffmpeg and ensure it's in your PATH.")]
    FFmpegNotFound,

    #[error("Operation cancelled")]
    Cancelled,

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    // HTTP errors
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    // Serialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML parse error: {0}")]
    TomlParse(#[from] toml::de::Error),

    // URL parsing errors
    #[error("Invalid URL: {0}")]
    UrlParse(#[from] url::ParseError),
}

/// Result type alias using our Error type.
pub type Result<T> = std::result::Result<T, Error>;

/// Process exit codes for the CLI front-end.
pub mod exit_codes {
    pub const SUCCESS: i32 = 0;
    pub const ABORT: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
    pub const EXTRACT_ERROR: i32 = 3;
    pub const DOWNLOAD_ERROR: i32 = 4;
    pub const UNEXPECTED_ERROR: i32 = 5;
}
