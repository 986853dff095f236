//! Netscape cookie file loading.
//!
//! Extractors attach cookies from a named file in the configured cookie
//! directory. A missing file yields an empty list, not an error.

use std::path::Path;

use crate::error::Result;

/// One cookie parsed from a Netscape-format file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cookie {
    pub name: String,
    pub value: String,
    pub domain: String,
    pub path: String,
    pub expires: i64,
}

/// Load cookies from a Netscape-format file under `cookies_dir`.
pub async fn load_cookies(cookies_dir: &Path, file_name: &str) -> Result<Vec<Cookie>> {
    let path = cookies_dir.join(file_name);
    if !path.exists() {
        return Ok(Vec::new());
    }

    let content = tokio::fs::read_to_string(&path).await?;
    Ok(parse_cookie_file(&content))
}

/// Render a `Cookie` request header value.
pub fn header_value(cookies: &[Cookie]) -> Option<String> {
    if cookies.is_empty() {
        return None;
    }
    Some(
        cookies
            .iter()
            .map(|c| format!("{}={}", c.name, c.value))
            .collect::<Vec<_>>()
            .join("; "),
    )
}

/// Parse Netscape cookie file content.
///
/// Format: domain, include-subdomains flag, path, secure flag, expiry,
/// name, value. Tab separated, one cookie per line.
fn parse_cookie_file(content: &str) -> Vec<Cookie> {
    content
        .lines()
        .filter_map(|line| {
            let line = line.trim();
            if line.is_empty() || line.starts_with('#') {
                return None;
            }

            let fields: Vec<&str> = line.split('\t').collect();
            if fields.len() < 7 {
                return None;
            }

            Some(Cookie {
                domain: fields[0].to_string(),
                path: fields[2].to_string(),
                expires: fields[4].parse().unwrap_or(0),
                name: fields[5].to_string(),
                value: fields[6].to_string(),
            })
        })
        .collect()
}
