//! In-memory downloads for small payloads such as thumbnails.

use std::io::Cursor;

use reqwest::header::USER_AGENT;
use reqwest::Client;
use tokio_util::sync::CancellationToken;

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::http::{self, CHROME_UA};

/// Download the first working candidate URL into a seekable buffer.
///
/// Applies the same retry policy as the chunked downloader.
pub async fn download_in_memory(
    urls: &[String],
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Cursor<Vec<u8>>> {
    if urls.is_empty() {
        return Err(Error::DownloadFailed("no candidate URLs".to_string()));
    }

    let client = http::default_client();
    let mut errors: Vec<String> = Vec::new();

    for url in urls {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        match fetch_with_retry(&client, url, config, cancel).await {
            Ok(data) => return Ok(Cursor::new(data)),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => errors.push(format!("{url}: {e}")),
        }
    }

    Err(Error::DownloadFailed(errors.join("; ")))
}

async fn fetch_with_retry(
    client: &Client,
    url: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let mut last_error = None;

    for attempt in 0..=config.retry_attempts {
        if attempt > 0 {
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(config.retry_delay) => {}
            }
        }

        match fetch(client, url, config, cancel).await {
            Ok(data) => return Ok(data),
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => last_error = Some(e),
        }
    }

    Err(Error::DownloadFailed(format!(
        "all {} attempts failed: {}",
        config.retry_attempts + 1,
        last_error.map(|e| e.to_string()).unwrap_or_default()
    )))
}

async fn fetch(
    client: &Client,
    url: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Vec<u8>> {
    let request = client
        .get(url)
        .timeout(config.timeout)
        .header(USER_AGENT, CHROME_UA);

    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        response = request.send() => response?,
    };

    if !response.status().is_success() {
        return Err(Error::DownloadFailed(format!(
            "unexpected status code: {}",
            response.status()
        )));
    }

    let data = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        data = response.bytes() => data?,
    };
    Ok(data.to_vec())
}
