//! Segmented-stream downloading and merging.
//!
//! Adaptive streams arrive as an ordered list of segment URLs. Segments are
//! fetched concurrently into a temp directory, then concatenated in index
//! order into one output file.

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use tokio::io::AsyncWriteExt;
use tokio::sync::Semaphore;
use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use crate::config::DownloadConfig;
use crate::download::chunked;
use crate::error::{Error, Result};
use crate::fs::{ensure_download_dir, sanitize_filename};
use crate::remux;

/// Per-segment chunk concurrency; segments are typically small.
const SEGMENT_CONCURRENCY: usize = 3;

/// Download an ordered list of segment URLs and merge them into
/// `file_name` under the configured download directory.
///
/// This function owns the temp directory: it is created once here and
/// removed on every exit path.
pub async fn download_file_with_segments(
    segment_urls: &[String],
    file_name: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    if segment_urls.is_empty() {
        return Err(Error::DownloadFailed("no segment URLs".to_string()));
    }

    ensure_download_dir(&config.download_dir).await?;

    let temp_dir = config.download_dir.join(format!(
        "segments_{}",
        chrono::Local::now().format("%Y%m%d_%H%M%S")
    ));
    tokio::fs::create_dir_all(&temp_dir).await?;

    let result = download_and_merge(segment_urls, file_name, &temp_dir, config, cancel).await;

    tokio::fs::remove_dir_all(&temp_dir).await.ok();

    result
}

async fn download_and_merge(
    segment_urls: &[String],
    file_name: &str,
    temp_dir: &Path,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    let segment_paths = download_segments(segment_urls, temp_dir, config, cancel).await?;
    merge_segments(&segment_paths, file_name, config, cancel).await
}

/// Fetch all segments concurrently into `temp_dir`.
///
/// Results are recorded in an index-addressed vector, so order is preserved
/// regardless of completion order. The first failing segment cancels its
/// siblings.
async fn download_segments(
    segment_urls: &[String],
    temp_dir: &Path,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    let segment_config = DownloadConfig {
        chunk_size: config.chunk_size,
        concurrency: SEGMENT_CONCURRENCY,
        timeout: config.timeout,
        download_dir: temp_dir.to_path_buf(),
        retry_attempts: config.retry_attempts,
        retry_delay: config.retry_delay,
        // Individual segments are never remuxed and report no progress.
        remux: false,
        progress_updater: None,
    };

    let child = cancel.child_token();
    let semaphore = Arc::new(Semaphore::new(config.concurrency.max(1)));
    let first_error: Arc<Mutex<Option<Error>>> = Arc::new(Mutex::new(None));
    let downloaded: Arc<Mutex<Vec<Option<PathBuf>>>> =
        Arc::new(Mutex::new(vec![None; segment_urls.len()]));

    let mut tasks = JoinSet::new();
    for (idx, url) in segment_urls.iter().enumerate() {
        let url = url.clone();
        let segment_config = segment_config.clone();
        let child = child.clone();
        let semaphore = Arc::clone(&semaphore);
        let first_error = Arc::clone(&first_error);
        let downloaded = Arc::clone(&downloaded);

        tasks.spawn(async move {
            let _permit = tokio::select! {
                _ = child.cancelled() => return,
                permit = Arc::clone(&semaphore).acquire_owned() => {
                    let Ok(permit) = permit else { return };
                    permit
                }
            };

            let segment_name = format!("segment_{idx:05}");
            match chunked::download_file(&[url], &segment_name, &segment_config, &child).await {
                Ok(path) => {
                    downloaded.lock().unwrap()[idx] = Some(path);
                }
                Err(Error::Cancelled) => {}
                Err(e) => {
                    let mut slot = first_error.lock().unwrap();
                    if slot.is_none() {
                        *slot = Some(Error::SegmentDownloadFailed {
                            index: idx,
                            source: Box::new(e),
                        });
                        child.cancel();
                    }
                }
            }
        });
    }

    while tasks.join_next().await.is_some() {}

    if cancel.is_cancelled() {
        return Err(Error::Cancelled);
    }

    let error = first_error.lock().unwrap().take();
    if let Some(error) = error {
        return Err(error);
    }

    let downloaded = Arc::try_unwrap(downloaded)
        .map_err(|_| Error::DownloadFailed("segment tasks still running".to_string()))?
        .into_inner()
        .unwrap();

    downloaded
        .into_iter()
        .enumerate()
        .map(|(idx, path)| {
            path.ok_or_else(|| Error::SegmentDownloadFailed {
                index: idx,
                source: Box::new(Error::DownloadFailed("segment missing".to_string())),
            })
        })
        .collect()
}

/// Concatenate segments in index order into one output file.
async fn merge_segments(
    segment_paths: &[PathBuf],
    file_name: &str,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<PathBuf> {
    ensure_download_dir(&config.download_dir).await?;
    let output_path = config.download_dir.join(sanitize_filename(file_name));

    match copy_segments(segment_paths, &output_path, config, cancel).await {
        Ok(()) => {}
        Err(e) => {
            tokio::fs::remove_file(&output_path).await.ok();
            return Err(e);
        }
    }

    if config.remux {
        if let Err(e) = remux::remux_file(&output_path).await {
            tokio::fs::remove_file(&output_path).await.ok();
            return Err(e);
        }
    }

    Ok(output_path)
}

async fn copy_segments(
    segment_paths: &[PathBuf],
    output_path: &Path,
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<()> {
    let mut output = tokio::fs::File::create(output_path).await?;

    // Pre-scan sizes so progress can report a fraction of the total.
    let mut total_bytes = 0u64;
    if config.progress_updater.is_some() {
        for path in segment_paths {
            if let Ok(metadata) = tokio::fs::metadata(path).await {
                total_bytes += metadata.len();
            }
        }
    }

    let mut processed_bytes = 0u64;
    for (idx, path) in segment_paths.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let mut segment = tokio::fs::File::open(path).await.map_err(|e| {
            Error::DownloadFailed(format!("failed to open segment {idx}: {e}"))
        })?;
        let written = tokio::io::copy(&mut segment, &mut output)
            .await
            .map_err(|e| Error::DownloadFailed(format!("failed to copy segment {idx}: {e}")))?;

        if total_bytes > 0 {
            processed_bytes += written;
            if let Some(updater) = &config.progress_updater {
                updater(processed_bytes as f64 / total_bytes as f64);
            }
        }
    }

    output.flush().await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn test_config(dir: &Path) -> DownloadConfig {
        DownloadConfig {
            download_dir: dir.to_path_buf(),
            remux: false,
            retry_attempts: 0,
            retry_delay: Duration::from_millis(10),
            ..Default::default()
        }
    }

    async fn mock_segment(server: &MockServer, idx: usize, body: &[u8]) {
        Mock::given(method("HEAD"))
            .and(path(format!("/seg{idx}.ts")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/seg{idx}.ts")))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    fn segment_bodies() -> Vec<Vec<u8>> {
        (0..5u8).map(|i| vec![i; 16]).collect()
    }

    #[tokio::test]
    async fn test_merge_matches_issuance_order() {
        let server = MockServer::start().await;
        let bodies = segment_bodies();
        for (idx, body) in bodies.iter().enumerate() {
            mock_segment(&server, idx, body).await;
        }
        let urls: Vec<String> = (0..bodies.len())
            .map(|idx| format!("{}/seg{idx}.ts", server.uri()))
            .collect();

        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path());
        let cancel = CancellationToken::new();

        let output = download_file_with_segments(&urls, "merged.ts", &config, &cancel)
            .await
            .unwrap();

        let expected: Vec<u8> = bodies.concat();
        assert_eq!(tokio::fs::read(&output).await.unwrap(), expected);

        // The temp directory is gone after success.
        assert!(no_segment_dirs(temp.path()).await);
    }

    #[tokio::test]
    async fn test_failing_segment_reports_index_and_cleans_up() {
        let server = MockServer::start().await;
        let bodies = segment_bodies();
        for (idx, body) in bodies.iter().enumerate() {
            if idx != 3 {
                mock_segment(&server, idx, body).await;
            }
        }
        // Segment 3 404s on every attempt (no mock mounted, catch-all 404).
        let urls: Vec<String> = (0..bodies.len())
            .map(|idx| format!("{}/seg{idx}.ts", server.uri()))
            .collect();

        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path());
        let cancel = CancellationToken::new();

        let err = download_file_with_segments(&urls, "merged.ts", &config, &cancel)
            .await
            .unwrap_err();

        match err {
            Error::SegmentDownloadFailed { index, .. } => assert_eq!(index, 3),
            other => panic!("expected SegmentDownloadFailed, got {other:?}"),
        }

        assert!(!temp.path().join("merged.ts").exists());
        assert!(no_segment_dirs(temp.path()).await);
    }

    #[tokio::test]
    async fn test_empty_segment_list() {
        let temp = tempfile::tempdir().unwrap();
        let config = test_config(temp.path());
        let cancel = CancellationToken::new();

        let err = download_file_with_segments(&[], "merged.ts", &config, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::DownloadFailed(_)));
    }

    #[tokio::test]
    async fn test_merge_progress_is_monotonic() {
        let temp = tempfile::tempdir().unwrap();

        // Merge local files directly; no HTTP involved.
        let mut paths = Vec::new();
        for idx in 0..4u8 {
            let path = temp.path().join(format!("segment_{idx:05}"));
            tokio::fs::write(&path, vec![idx; 32]).await.unwrap();
            paths.push(path);
        }

        let mut config = test_config(temp.path());
        let seen: Arc<Mutex<Vec<f64>>> = Arc::new(Mutex::new(Vec::new()));
        let capture = Arc::clone(&seen);
        config.progress_updater = Some(Arc::new(move |fraction| {
            capture.lock().unwrap().push(fraction);
        }));

        let cancel = CancellationToken::new();
        let output = merge_segments(&paths, "merged.bin", &config, &cancel)
            .await
            .unwrap();

        assert_eq!(
            tokio::fs::metadata(&output).await.unwrap().len(),
            4 * 32
        );

        let seen = seen.lock().unwrap();
        assert_eq!(seen.len(), 4);
        assert!(seen.windows(2).all(|w| w[0] <= w[1]));
        assert!((seen.last().unwrap() - 1.0).abs() < f64::EPSILON);
    }

    #[tokio::test]
    async fn test_cancelled_merge_removes_output() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("segment_00000");
        tokio::fs::write(&path, vec![1u8; 8]).await.unwrap();

        let config = test_config(temp.path());
        let cancel = CancellationToken::new();
        cancel.cancel();

        let err = merge_segments(&[path], "merged.bin", &config, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::Cancelled));
        assert!(!temp.path().join("merged.bin").exists());
    }

    async fn no_segment_dirs(dir: &Path) -> bool {
        let mut entries = tokio::fs::read_dir(dir).await.unwrap();
        while let Some(entry) = entries.next_entry().await.unwrap() {
            if entry
                .file_name()
                .to_string_lossy()
                .starts_with("segments_")
            {
                return false;
            }
        }
        true
    }
}
