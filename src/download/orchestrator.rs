//! Media list orchestration.
//!
//! Walks the extracted media list, selects the distribution format for each
//! item, and dispatches to the chunked or segmented downloader.

use std::path::PathBuf;

use tokio_util::sync::CancellationToken;

use crate::config::DownloadConfig;
use crate::download::{chunked, segmented};
use crate::error::{Error, Result};
use crate::fs::sanitize_filename;
use crate::media::{Media, MediaType};

/// Download every media item and return the local paths, in input order.
pub async fn download_media_list(
    media_list: &[Media],
    config: &DownloadConfig,
    cancel: &CancellationToken,
) -> Result<Vec<PathBuf>> {
    let mut paths = Vec::with_capacity(media_list.len());

    for (index, media) in media_list.iter().enumerate() {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let format = media
            .best_format()
            .filter(|f| f.has_source())
            .ok_or(Error::NoMediaFound)?;

        let file_name = format!(
            "{}_{}.{}",
            sanitize_filename(&media.content_id),
            index,
            format.extension()
        );

        // Remuxing only makes sense for video containers.
        let mut item_config = config.clone();
        item_config.remux = config.remux && format.media_type == MediaType::Video;

        tracing::info!(
            "Downloading {} ({}) as {}",
            media.content_id,
            format.format_id,
            file_name
        );

        let path = if format.is_segmented() {
            segmented::download_file_with_segments(
                &format.segments,
                &file_name,
                &item_config,
                cancel,
            )
            .await?
        } else {
            chunked::download_file(&format.urls, &file_name, &item_config, cancel).await?
        };

        paths.push(path);
    }

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::media::MediaFormat;
    use std::time::Duration;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn photo_media(id: &str, url: String) -> Media {
        let mut media = Media {
            content_id: id.to_string(),
            content_url: url.clone(),
            ..Default::default()
        };
        media.add_format(MediaFormat {
            format_id: "photo".to_string(),
            media_type: MediaType::Photo,
            urls: vec![url],
            ..Default::default()
        });
        media
    }

    async fn mock_photo(server: &MockServer, name: &str, body: &[u8]) {
        Mock::given(method("HEAD"))
            .and(path(format!("/{name}")))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
        Mock::given(method("GET"))
            .and(path(format!("/{name}")))
            .respond_with(ResponseTemplate::new(206).set_body_bytes(body.to_vec()))
            .mount(server)
            .await;
    }

    #[tokio::test]
    async fn test_gallery_downloads_in_input_order() {
        let server = MockServer::start().await;
        for name in ["a.jpg", "b.jpg", "c.jpg"] {
            mock_photo(&server, name, name.as_bytes()).await;
        }

        let media_list = vec![
            photo_media("gal", format!("{}/a.jpg", server.uri())),
            photo_media("gal", format!("{}/b.jpg", server.uri())),
            photo_media("gal", format!("{}/c.jpg", server.uri())),
        ];

        let temp = tempfile::tempdir().unwrap();
        let config = DownloadConfig {
            download_dir: temp.path().to_path_buf(),
            remux: false,
            retry_delay: Duration::from_millis(10),
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        let paths = download_media_list(&media_list, &config, &cancel)
            .await
            .unwrap();

        assert_eq!(paths.len(), 3);
        let names: Vec<String> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_string_lossy().into_owned())
            .collect();
        assert_eq!(names, vec!["gal_0.jpg", "gal_1.jpg", "gal_2.jpg"]);

        assert_eq!(tokio::fs::read(&paths[0]).await.unwrap(), b"a.jpg");
        assert_eq!(tokio::fs::read(&paths[2]).await.unwrap(), b"c.jpg");
    }

    #[tokio::test]
    async fn test_sourceless_format_is_rejected() {
        let media = Media {
            content_id: "empty".to_string(),
            formats: vec![MediaFormat::default()],
            ..Default::default()
        };

        let temp = tempfile::tempdir().unwrap();
        let config = DownloadConfig {
            download_dir: temp.path().to_path_buf(),
            remux: false,
            ..Default::default()
        };

        let cancel = CancellationToken::new();
        let err = download_media_list(&[media], &config, &cancel)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::NoMediaFound));
    }
}
