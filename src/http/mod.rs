//! HTTP session management.
//!
//! This module provides:
//! - Per-extractor HTTP clients with proxy support
//! - Netscape cookie file loading
//! - Small URL helpers shared by extractors

pub mod cookies;
pub mod session;

pub use cookies::{load_cookies, Cookie};
pub use session::{client_for, configure, default_client};

/// User agent sent by extractors and downloaders.
pub const CHROME_UA: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) \
     AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0.0.0 Safari/537.36";

/// Undo the HTML escaping some platforms apply to URLs in JSON payloads.
pub fn fix_url(url: &str) -> String {
    url.replace("&amp;", "&")
}
