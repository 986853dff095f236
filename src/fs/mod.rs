//! Filesystem helpers for download outputs.

use std::path::Path;

use crate::error::Result;

/// Create the download directory if it doesn't exist.
pub async fn ensure_download_dir(dir: &Path) -> Result<()> {
    if !dir.exists() {
        tokio::fs::create_dir_all(dir).await?;
    }
    Ok(())
}

/// Sanitize a filename by removing or replacing invalid characters.
pub fn sanitize_filename(name: &str) -> String {
    name.chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_filename() {
        assert_eq!(sanitize_filename("normal.mp4"), "normal.mp4");
        assert_eq!(sanitize_filename("clip:1.mp4"), "clip_1.mp4");
        assert_eq!(sanitize_filename("a/b/c.jpg"), "a_b_c.jpg");
    }

    #[tokio::test]
    async fn test_ensure_download_dir_creates_nested() {
        let temp = tempfile::tempdir().unwrap();
        let dir = temp.path().join("a").join("b");
        ensure_download_dir(&dir).await.unwrap();
        assert!(dir.is_dir());

        // Second call is a no-op
        ensure_download_dir(&dir).await.unwrap();
    }
}
