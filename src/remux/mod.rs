//! In-place container remuxing via ffmpeg.

use std::path::Path;
use std::process::Stdio;

use tokio::process::Command;

use crate::error::{Error, Result};

/// Containers worth rewriting. Everything else is a no-op.
const REMUXABLE: &[&str] = &["mp4", "m4a", "mov", "webm", "ts", "mkv"];

/// Rewrite the container in place without re-encoding.
///
/// The output lands in a sibling temp file first and replaces the original
/// only on success.
pub async fn remux_file(path: &Path) -> Result<()> {
    let Some(extension) = path.extension().and_then(|e| e.to_str()) else {
        return Ok(());
    };
    if !REMUXABLE.contains(&extension.to_ascii_lowercase().as_str()) {
        return Ok(());
    }

    // TS streams become MP4; everything else keeps its container.
    let target_ext = if extension.eq_ignore_ascii_case("ts") {
        "mp4"
    } else {
        extension
    };
    let temp_path = path.with_extension(format!("remux.{target_ext}"));

    let input = path
        .to_str()
        .ok_or_else(|| Error::RemuxFailed("invalid path encoding".to_string()))?;
    let output = temp_path
        .to_str()
        .ok_or_else(|| Error::RemuxFailed("invalid path encoding".to_string()))?;

    let result = Command::new("ffmpeg")
        .args(["-y", "-i", input, "-c", "copy", "-movflags", "+faststart", output])
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .status()
        .await;

    let status = match result {
        Ok(status) => status,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            return Err(Error::FFmpegNotFound);
        }
        Err(e) => {
            return Err(Error::RemuxFailed(format!("failed to run ffmpeg: {e}")));
        }
    };

    if !status.success() {
        tokio::fs::remove_file(&temp_path).await.ok();
        return Err(Error::RemuxFailed(format!(
            "ffmpeg exited with status: {status}"
        )));
    }

    tokio::fs::rename(&temp_path, path).await?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_non_container_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("image.jpg");
        tokio::fs::write(&path, b"jpeg").await.unwrap();

        remux_file(&path).await.unwrap();
        assert_eq!(tokio::fs::read(&path).await.unwrap(), b"jpeg");
    }

    #[tokio::test]
    async fn test_missing_extension_is_noop() {
        let temp = tempfile::tempdir().unwrap();
        let path = temp.path().join("segment_00001");
        tokio::fs::write(&path, b"data").await.unwrap();

        remux_file(&path).await.unwrap();
    }
}
