//! Chunked parallel downloads.
//!
//! A single known URL is fetched with parallel byte-range requests into a
//! pre-sized file. Chunks are disjoint, so positional writes need no lock;
//! the first chunk to fail cancels its siblings through a child token.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use bytes::Bytes;
use reqwest::header::{RANGE, USER_AGENT};
use reqwest::{Client, StatusCode};
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::DownloadConfig;
use crate::error::{Error, Result};
use crate::fs::{ensure_download_dir, sanitize_filename};
use crate::http::{self, CHROME_UA};
use crate::remux;

/// Inclusive byte range fetched by one request.
type Chunk = (u64, u64);

/// Download the first working candidate URL to `file_name` under the
/// configured download directory.
///
/// Candidates are tried in order; the first success wins. When every
/// candidate fails the per-URL errors are aggregated into
/// [`Error::DownloadFailed`].
pub async fn download_file(
    urls: &[String],
    file_name: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    if urls.is_empty() {
        return Err(Error::DownloadFailed("no candidate URLs".to_string()));
    }

    let mut errors: Vec<String> = Vec::new();

    for url in urls {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        ensure_download_dir(&config.download_dir).await?;
        let path = config.download_dir.join(sanitize_filename(file_name));

        match run_chunked_download(url, &path, config, cancel).await {
            Ok(()) => {
                if config.remux {
                    if let Err(e) = remux::remux_file(&path).await {
                        tokio::fs::remove_file(&path).await.ok();
                        return Err(e);
                    }
                }
                return Ok(path);
            }
            Err(Error::Cancelled) => return Err(Error::Cancelled),
            Err(e) => {
                tracing::debug!("Candidate {} failed: {}", url, e);
                errors.push(format!("{url}: {e}"));
            }
        }
    }

    Err(Error::DownloadFailed(errors.join("; ")))
}

async fn run_chunked_download(
    url: &str,
    path: &Path,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let client = http::default_client();
    let file_size = probe_file_size(&client, url, config).await?;

    let file = tokio::fs::File::create(path).await?;
    // Pre-size the file so parallel writes at arbitrary offsets are safe.
    if file_size > 0 {
        file.set_len(file_size).await?;
    }
    let file = Arc::new(file.into_std().await);

    let chunks = create_chunks(file_size, config.chunk_size);
    let single_chunk = chunks.len() == 1;
    let ranged = file_size > 0;

    let child = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let first_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
    let completed_bytes = Arc::new(Mutex::new(0u64));

    let mut tasks = JoinSet::new();
    for (idx, chunk) in chunks.into_iter().enumerate() {
        let client = client.clone();
        let config = config.clone();
        let url = url.to_string();
        let child = child.clone();
        let semaphore = Arc::clone(&semaphore);
        let first_error = Arc::clone(&first_error);
        let completed_bytes = Arc::clone(&completed_bytes);
        let file = Arc::clone(&file);

        tasks.spawn(async move {
            // Respect the concurrency limit.
            let _permit = tokio::select! {
                _ = child.cancelled() => return,
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    let Ok(permit) = permit else { return };
                    permit
                }
            };

            let data = match download_chunk_with_retry(
                &client,
                &url,
                chunk,
                ranged,
                single_chunk,
                &config,
                &child,
            )
            .await
            {
                Ok(data) => data,
                Err(Error::Cancelled) => return,
                Err(e) => {
                    record_error(
                        &first_error,
                        &child,
                        Error::DownloadFailed(format!("chunk {idx}: {e}")),
                    );
                    return;
                }
            };

            let len = data.len() as u64;
            let write = {
                let file = Arc::clone(&file);
                tokio::task::spawn_blocking(move || write_chunk(&file, &data, chunk.0))
            };
            match write.await {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    record_error(
                        &first_error,
                        &child,
                        Error::DownloadFailed(format!("failed to write chunk {idx}: {e}")),
                    );
                    return;
                }
                Err(e) => {
                    record_error(
                        &first_error,
                        &child,
                        Error::DownloadFailed(format!("failed to write chunk {idx}: {e}")),
                    );
                    return;
                }
            }

            // Progress is serialized by the mutex, so observed fractions
            // are monotonically non-decreasing.
            if file_size > 0 {
                let mut completed = completed_bytes.lock().unwrap();
                *completed += len;
                if let Some(updater) = &config.progress_updater {
                    updater(*completed as f64 / file_size as f64);
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {}

    if cancel.is_cancelled() {
        tokio::fs::remove_file(path).await.ok();
        return Err(Error::Cancelled);
    }

    let error = first_error.lock().unwrap().take();
    if let Some(error) = error {
        tokio::fs::remove_file(path).await.ok();
        return Err(error);
    }

    Ok(())
}

/// HEAD probe for the remote size. Absent or zero `Content-Length` means
/// single-chunk mode.
async fn probe_file_size(client: &Client, url: &str, config: &DownloadConfig) -> Result<u64> {
    let response = client
        .head(url)
        .timeout(config.timeout)
        .header(USER_AGENT, CHROME_UA)
        .send()
        .await?;

    if !response.status().is_success() {
        return Err(Error::DownloadFailed(format!(
            "failed to get file info: status code {}",
            response.status()
        )));
    }

    // Read the header directly; `Response::content_length` reflects the
    // body size hint, which is zero for HEAD responses.
    Ok(response
        .headers()
        .get(reqwest::header::CONTENT_LENGTH)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.parse::<u64>().ok())
        .unwrap_or(0))
}

async fn download_chunk_with_retry(
    client: &Client,
    url: &str,
    chunk: Chunk,
    ranged: bool,
    single_chunk: bool,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let mut last_error = None;

    for attempt in 0..=config.retry_attempts {
        if attempt > 0 {
            // Wait before retry, honoring cancellation.
            tokio::select! {
                _ = cancel.cancelled() => return Err(Error::Cancelled),
                _ = tokio::time::sleep(config.retry_delay) => {}
            }
        }

        match download_chunk(client, url, chunk, ranged, single_chunk, config, cancel).await {
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

async fn download_chunk(
    client: &Client,
    url: &str,
    chunk: Chunk,
    ranged: bool,
    single_chunk: bool,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Bytes> {
    let mut request = client
        .get(url)
        .timeout(config.timeout)
        .header(USER_AGENT, CHROME_UA);
    if ranged {
        request = request.header(RANGE, format!("bytes={}-{}", chunk.0, chunk.1));
    }

    let response = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        response = request.send() => response?,
    };

    let status = response.status();
    // 200 on a ranged request means the server ignored Range; that is only
    // acceptable when this chunk is the whole file.
    let acceptable = status == StatusCode::PARTIAL_CONTENT
        || (status == StatusCode::OK && (!ranged || single_chunk));
    if !acceptable {
        return Err(Error::DownloadFailed(format!(
            "unexpected status code: {status}"
        )));
    }

    let data = tokio::select! {
        _ = cancel.cancelled() => return Err(Error::Cancelled),
        data = response.bytes() => data?,
    };
    Ok(data)
}

/// Positional write at the chunk's absolute offset.
fn write_chunk(file: &std::fs::File, data: &[u8], offset: u64) -> std::io::Result<()> {
    #[cfg(unix)]
    {
        use std::os::unix::fs::FileExt;
        file.write_all_at(data, offset)
    }
    #[cfg(windows)]
    {
        use std::os::windows::fs::FileExt;
        let mut data = data;
        let mut offset = offset;
        while !data.is_empty() {
            let written = file.seek_write(data, offset)?;
            data = &data[written..];
            offset += written as u64;
        }
        Ok(())
    }
}

/// Single-shot error latch: the first failing chunk records its error and
/// cancels the sibling chunks.
fn record_error(slot: &Mutex<Option<Error>>, child: &CancellationToken, error: Error) {
    let mut slot = slot.lock().unwrap();
    if slot.is_none() {
        *slot = Some(error);
        child.cancel();
    }
}

/// Split `[0, file_size)` into inclusive ranges of at most `chunk_size`
/// bytes. A zero size yields the single pseudo-chunk `(0, 0)`, which is
/// downloaded with an unranged GET.
fn create_chunks(file_size: u64, chunk_size: u64) -> Vec<Chunk> {
    if file_size == 0 {
        return vec![(0, 0)];
    }

    let chunk_size = chunk_size.max(1);
    let mut chunks = Vec::with_capacity(file_size.div_ceil(chunk_size) as usize);
    let mut start = 0;
    while start < file_size {
        let end = (start + chunk_size - 1).min(file_size - 1);
        chunks.push((start, end));
        start = end + 1;
    }
    chunks
}
