//! Reddit extractor.
//!
//! Two registry entries: a redirect extractor that unwraps `/s/` share
//! links, and the full extractor that reads the post listing from the
//! `.json` endpoint and turns it into media items.

pub mod types;

use std::sync::Arc;

use m3u8_rs::Playlist;
use regex::Regex;
use reqwest::header::{COOKIE, USER_AGENT};
use reqwest::Client;

use crate::error::{Error, Result};
use crate::extractor::{
    DownloadContext, Extractor, ExtractorCategory, ExtractorKind, ExtractorResponse,
};
use crate::http::{self, cookies, fix_url, session, CHROME_UA};
use crate::media::{AudioCodec, Media, MediaFormat, MediaType, VideoCodec};

const HOSTS: &[&str] = &["reddit.com", "redditmedia.com"];

const COOKIE_FILE: &str = "reddit.txt";

/// Share-link resolver. Registered before the full extractor.
pub fn short_extractor() -> Arc<Extractor> {
    Arc::new(Extractor {
        name: "Reddit (Short)",
        code_name: "reddit_short",
        kind: ExtractorKind::Redirect,
        category: ExtractorCategory::Social,
        url_pattern: Regex::new(
            r"https?://(?P<host>(?:\w+\.)?reddit(?:media)?\.com)/(?P<slug>(?:(?:r|user)/[^/]+/)?s/(?P<id>[^/?#&]+))",
        )
        .expect("valid reddit short pattern"),
        hosts: HOSTS,
        run: Box::new(|ctx| Box::pin(run_short(ctx))),
    })
}

pub fn extractor() -> Arc<Extractor> {
    Arc::new(Extractor {
        name: "Reddit",
        code_name: "reddit",
        kind: ExtractorKind::Single,
        category: ExtractorCategory::Social,
        url_pattern: Regex::new(
            r"https?://(?P<host>(?:\w+\.)?reddit(?:media)?\.com)/(?P<slug>(?:(?:r|user)/[^/]+/)?comments/(?P<id>[^/?#&]+))",
        )
        .expect("valid reddit pattern"),
        hosts: HOSTS,
        run: Box::new(|ctx| {
            Box::pin(async move {
                let media_list = media_list_from_api(ctx).await?;
                Ok(ExtractorResponse::Media(media_list))
            })
        }),
    })
}

/// Follow the share link and report the effective URL for re-dispatch.
async fn run_short(ctx: &DownloadContext) -> Result<ExtractorResponse> {
    let client = http::client_for(ctx.extractor.code_name);
    let cookies = cookies::load_cookies(&session::cookies_dir(), COOKIE_FILE).await?;

    let mut request = client
        .get(&ctx.matched_content_url)
        .header(USER_AGENT, CHROME_UA);
    if let Some(header) = cookies::header_value(&cookies) {
        request = request.header(COOKIE, header);
    }

    let response = request.send().await?;
    Ok(ExtractorResponse::Redirect(response.url().to_string()))
}

async fn media_list_from_api(ctx: &DownloadContext) -> Result<Vec<Media>> {
    let client = http::client_for(ctx.extractor.code_name);

    let host = ctx
        .matched_groups
        .get("host")
        .cloned()
        .unwrap_or_else(|| "www.reddit.com".to_string());
    let slug = ctx
        .matched_groups
        .get("slug")
        .cloned()
        .ok_or_else(|| Error::Extractor("missing slug capture".to_string()))?;

    let listing = fetch_listing(&client, &host, &slug).await?;

    let post = listing
        .first()
        .and_then(|page| page.data.children.first())
        .map(|child| &child.data)
        .ok_or_else(|| Error::Extractor("no data found in response".to_string()))?;

    if post.is_video {
        return video_media(ctx, post, &client).await;
    }

    // Single photo, possibly with an animated preview.
    if let Some(preview) = &post.preview {
        if let Some(image) = preview.images.first() {
            let mut media = ctx
                .extractor
                .new_media(&ctx.matched_content_id, &ctx.matched_content_url);
            media.set_caption(&post.title);
            media.nsfw = post.over_18;

            // Video preview means the "photo" is really a GIF.
            if let Some(video_preview) = &preview.video_preview {
                for format in
                    hls_formats(&client, video_preview, Some(image.source.url.clone())).await?
                {
                    media.add_format(format);
                }
                return Ok(vec![media]);
            }

            // MP4 variant of an animated GIF.
            if let Some(mp4) = &image.variants.mp4 {
                media.add_format(MediaFormat {
                    format_id: "gif".to_string(),
                    media_type: MediaType::Video,
                    video_codec: Some(VideoCodec::Avc),
                    audio_codec: Some(AudioCodec::Aac),
                    urls: vec![fix_url(&mp4.source.url)],
                    thumbnails: vec![fix_url(&image.source.url)],
                    width: nonzero(mp4.source.width),
                    height: nonzero(mp4.source.height),
                    ..Default::default()
                });
                return Ok(vec![media]);
            }

            media.add_format(MediaFormat {
                format_id: "photo".to_string(),
                media_type: MediaType::Photo,
                urls: vec![fix_url(&image.source.url)],
                width: nonzero(image.source.width),
                height: nonzero(image.source.height),
                ..Default::default()
            });
            return Ok(vec![media]);
        }
    }

    if !post.media_metadata.is_empty() {
        return Ok(gallery_media(ctx, post));
    }

    // Extraction succeeded but the post carries nothing downloadable.
    Ok(Vec::new())
}

/// Media list for a video post: direct MP4 fallback plus HLS variants.
async fn video_media(
    ctx: &DownloadContext,
    post: &types::Post,
    client: &Client,
) -> Result<Vec<Media>> {
    let video = post
        .media
        .as_ref()
        .and_then(|m| m.video.as_ref())
        .or_else(|| post.secure_media.as_ref().and_then(|m| m.video.as_ref()));

    let Some(video) = video else {
        return Ok(Vec::new());
    };

    let mut media = ctx
        .extractor
        .new_media(&ctx.matched_content_id, &ctx.matched_content_url);
    media.set_caption(&post.title);
    media.nsfw = post.over_18;

    // Placeholder thumbnails are replaced by the preview image.
    let mut thumbnail = post.thumbnail.clone();
    if thumbnail == "nsfw" || thumbnail == "spoiler" {
        if let Some(image) = post.preview.as_ref().and_then(|p| p.images.first()) {
            thumbnail = image.source.url.clone();
        }
    }
    let thumbnail = (!thumbnail.is_empty() && thumbnail.starts_with("http")).then_some(thumbnail);

    for format in hls_formats(client, video, thumbnail).await? {
        media.add_format(format);
    }

    Ok(vec![media])
}

/// One Media per gallery item. Display order comes from `gallery_data` when
/// the post carries it; without it the map iteration order is unspecified.
fn gallery_media(ctx: &DownloadContext, post: &types::Post) -> Vec<Media> {
    let items: Vec<&types::MediaMetadataItem> = match &post.gallery_data {
        Some(gallery) => gallery
            .items
            .iter()
            .filter_map(|item| post.media_metadata.get(&item.media_id))
            .collect(),
        None => post.media_metadata.values().collect(),
    };

    let mut media_list = Vec::with_capacity(items.len());
    for item in items {
        let Some(source) = &item.source else {
            continue;
        };

        let mut media = ctx
            .extractor
            .new_media(&ctx.matched_content_id, &ctx.matched_content_url);
        media.set_caption(&post.title);
        media.nsfw = post.over_18;

        match item.kind.as_str() {
            "Image" => {
                let Some(url) = &source.url else { continue };
                media.add_format(MediaFormat {
                    format_id: "photo".to_string(),
                    media_type: MediaType::Photo,
                    urls: vec![fix_url(url)],
                    width: nonzero(source.width),
                    height: nonzero(source.height),
                    ..Default::default()
                });
            }
            "AnimatedImage" => {
                let Some(mp4) = &source.mp4 else { continue };
                media.add_format(MediaFormat {
                    format_id: "video".to_string(),
                    media_type: MediaType::Video,
                    video_codec: Some(VideoCodec::Avc),
                    audio_codec: Some(AudioCodec::Aac),
                    urls: vec![fix_url(mp4)],
                    width: nonzero(source.width),
                    height: nonzero(source.height),
                    ..Default::default()
                });
            }
            _ => continue,
        }

        media_list.push(media);
    }

    media_list
}

/// Fetch the listing, retrying once against the alternative host on non-200.
async fn fetch_listing(client: &Client, host: &str, slug: &str) -> Result<types::Listing> {
    let cookies = cookies::load_cookies(&session::cookies_dir(), COOKIE_FILE).await?;
    let cookie_header = cookies::header_value(&cookies);

    let mut host = host.to_string();
    let mut retried = false;

    loop {
        let url = format!("https://{host}/{slug}/.json");

        let mut request = client.get(&url).header(USER_AGENT, CHROME_UA);
        if let Some(header) = &cookie_header {
            request = request.header(COOKIE, header.clone());
        }

        let response = request.send().await?;
        let status = response.status();

        if status.is_success() {
            return Ok(response.json::<types::Listing>().await?);
        }

        if retried {
            return Err(Error::Extractor(format!(
                "failed to get reddit data: {status}"
            )));
        }

        host = alternative_host(&host);
        retried = true;
        tracing::debug!("Retrying reddit listing via {}", host);
    }
}

fn alternative_host(host: &str) -> String {
    if host == "old.reddit.com" {
        "www.reddit.com".to_string()
    } else {
        "old.reddit.com".to_string()
    }
}

/// Formats for an adaptive video: the MP4 fallback first, then one format
/// per HLS variant with its resolved segment list.
async fn hls_formats(
    client: &Client,
    video: &types::RedditVideo,
    thumbnail: Option<String>,
) -> Result<Vec<MediaFormat>> {
    let thumbnails: Vec<String> = thumbnail.iter().map(|t| fix_url(t)).collect();
    let duration = nonzero(video.duration);

    let mut formats = vec![MediaFormat {
        format_id: "fallback".to_string(),
        media_type: MediaType::Video,
        video_codec: Some(VideoCodec::Avc),
        audio_codec: Some(AudioCodec::Aac),
        urls: vec![fix_url(&video.fallback_url)],
        thumbnails: thumbnails.clone(),
        width: nonzero(video.width),
        height: nonzero(video.height),
        bitrate: nonzero(video.bitrate_kbps).map(|b| b * 1000),
        duration,
        ..Default::default()
    }];

    if let Some(hls_url) = &video.hls_url {
        match variant_formats(client, hls_url, &thumbnails, duration).await {
            Ok(mut variants) => formats.append(&mut variants),
            // The fallback format keeps the extraction usable.
            Err(e) => tracing::warn!("Failed to enumerate HLS variants: {}", e),
        }
    }

    Ok(formats)
}

async fn variant_formats(
    client: &Client,
    playlist_url: &str,
    thumbnails: &[String],
    duration: Option<u64>,
) -> Result<Vec<MediaFormat>> {
    let content = fetch_playlist(client, playlist_url).await?;
    let playlist = m3u8_rs::parse_playlist_res(content.as_bytes())
        .map_err(|e| Error::Extractor(format!("failed to parse HLS playlist: {e:?}")))?;

    match playlist {
        Playlist::MasterPlaylist(master) => {
            let mut formats = Vec::with_capacity(master.variants.len());
            for variant in &master.variants {
                let variant_url = resolve_url(playlist_url, &variant.uri)?;
                let segments = media_segments(client, &variant_url).await?;
                if segments.is_empty() {
                    continue;
                }

                let (video_codec, audio_codec) = codecs_from_attr(variant.codecs.as_deref());
                formats.push(MediaFormat {
                    format_id: format!("hls-{}k", variant.bandwidth / 1000),
                    media_type: MediaType::Video,
                    video_codec,
                    audio_codec,
                    urls: vec![variant_url],
                    thumbnails: thumbnails.to_vec(),
                    segments,
                    width: variant.resolution.as_ref().map(|r| r.width),
                    height: variant.resolution.as_ref().map(|r| r.height),
                    bitrate: Some(variant.bandwidth),
                    duration,
                });
            }
            Ok(formats)
        }
        Playlist::MediaPlaylist(media) => {
            let segments = resolve_segments(playlist_url, &media)?;
            Ok(vec![MediaFormat {
                format_id: "hls".to_string(),
                media_type: MediaType::Video,
                video_codec: Some(VideoCodec::Avc),
                audio_codec: Some(AudioCodec::Aac),
                urls: vec![playlist_url.to_string()],
                thumbnails: thumbnails.to_vec(),
                segments,
                duration,
                ..Default::default()
            }])
        }
    }
}

/// Segment URLs of a variant's media playlist, in playlist order.
async fn media_segments(client: &Client, variant_url: &str) -> Result<Vec<String>> {
    let content = fetch_playlist(client, variant_url).await?;
    let playlist = m3u8_rs::parse_playlist_res(content.as_bytes())
        .map_err(|e| Error::Extractor(format!("failed to parse media playlist: {e:?}")))?;

    match playlist {
        Playlist::MediaPlaylist(media) => resolve_segments(variant_url, &media),
        Playlist::MasterPlaylist(_) => Err(Error::Extractor(
            "expected media playlist, got master".to_string(),
        )),
    }
}

fn resolve_segments(base_url: &str, playlist: &m3u8_rs::MediaPlaylist) -> Result<Vec<String>> {
    playlist
        .segments
        .iter()
        .map(|segment| resolve_url(base_url, &segment.uri))
        .collect()
}

async fn fetch_playlist(client: &Client, url: &str) -> Result<String> {
    let response = client.get(url).header(USER_AGENT, CHROME_UA).send().await?;
    if !response.status().is_success() {
        return Err(Error::Extractor(format!(
            "failed to fetch playlist: {}",
            response.status()
        )));
    }
    Ok(response.text().await?)
}

/// Resolve a potentially relative URL against a base URL.
fn resolve_url(base: &str, path: &str) -> Result<String> {
    if path.starts_with("http://") || path.starts_with("https://") {
        return Ok(path.to_string());
    }

    let base_url = url::Url::parse(base)?;
    Ok(base_url.join(path)?.to_string())
}

/// Map an HLS `CODECS` attribute to codec tags.
fn codecs_from_attr(codecs: Option<&str>) -> (Option<VideoCodec>, Option<AudioCodec>) {
    let Some(codecs) = codecs else {
        return (None, None);
    };

    let mut video = None;
    let mut audio = None;
    for codec in codecs.split(',') {
        let codec = codec.trim();
        if codec.starts_with("avc1") {
            video = Some(VideoCodec::Avc);
        } else if codec.starts_with("hvc1") || codec.starts_with("hev1") {
            video = Some(VideoCodec::Hevc);
        } else if codec.starts_with("vp09") {
            video = Some(VideoCodec::Vp9);
        } else if codec.starts_with("av01") {
            video = Some(VideoCodec::Av1);
        } else if codec.starts_with("mp4a") {
            audio = Some(AudioCodec::Aac);
        } else if codec.starts_with("opus") {
            audio = Some(AudioCodec::Opus);
        }
    }
    (video, audio)
}

fn nonzero(value: u64) -> Option<u64> {
    (value > 0).then_some(value)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::Registry;

    fn gallery_ctx() -> DownloadContext {
        let mut registry = Registry::new();
        registry.register(extractor());
        registry
            .resolve("https://www.reddit.com/r/pics/comments/1abcd2")
            .unwrap()
    }

    #[test]
    fn test_codecs_from_attr() {
        let (v, a) = codecs_from_attr(Some("avc1.4d401e,mp4a.40.2"));
        assert_eq!(v, Some(VideoCodec::Avc));
        assert_eq!(a, Some(AudioCodec::Aac));

        let (v, a) = codecs_from_attr(Some("hvc1.1.6.L93.B0"));
        assert_eq!(v, Some(VideoCodec::Hevc));
        assert_eq!(a, None);

        assert_eq!(codecs_from_attr(None), (None, None));
    }

    #[test]
    fn test_resolve_url() {
        assert_eq!(
            resolve_url("https://v.redd.it/abc/HLSPlaylist.m3u8", "HLS_720.m3u8").unwrap(),
            "https://v.redd.it/abc/HLS_720.m3u8"
        );
        assert_eq!(
            resolve_url("https://v.redd.it/abc/p.m3u8", "https://cdn.test/seg0.ts").unwrap(),
            "https://cdn.test/seg0.ts"
        );
    }

    #[test]
    fn test_alternative_host() {
        assert_eq!(alternative_host("old.reddit.com"), "www.reddit.com");
        assert_eq!(alternative_host("www.reddit.com"), "old.reddit.com");
        assert_eq!(alternative_host("reddit.com"), "old.reddit.com");
    }

    #[test]
    fn test_gallery_media_follows_gallery_data_order() {
        let json = r#"[{"data": {"children": [{"data": {
            "title": "gallery",
            "over_18": false,
            "media_metadata": {
                "zzz": {"e": "Image", "s": {"u": "https://i.redd.it/zzz.jpg?a=1&amp;b=2", "x": 100, "y": 50}},
                "mmm": {"e": "AnimatedImage", "s": {"mp4": "https://i.redd.it/mmm.mp4"}},
                "aaa": {"e": "Image", "s": {"u": "https://i.redd.it/aaa.jpg"}}
            },
            "gallery_data": {"items": [
                {"media_id": "mmm"}, {"media_id": "zzz"}, {"media_id": "aaa"}
            ]}
        }}]}}]"#;
        let listing: types::Listing = serde_json::from_str(json).unwrap();
        let post = &listing[0].data.children[0].data;

        let ctx = gallery_ctx();
        let media_list = gallery_media(&ctx, post);

        assert_eq!(media_list.len(), 3);
        assert_eq!(media_list[0].formats[0].format_id, "video");
        assert_eq!(
            media_list[1].formats[0].urls[0],
            "https://i.redd.it/zzz.jpg?a=1&b=2"
        );
        assert_eq!(media_list[1].formats[0].width, Some(100));
        assert_eq!(
            media_list[2].formats[0].urls[0],
            "https://i.redd.it/aaa.jpg"
        );
        assert!(media_list.iter().all(|m| m.content_id == "1abcd2"));
    }

    #[test]
    fn test_gallery_media_skips_unknown_kinds() {
        let json = r#"[{"data": {"children": [{"data": {
            "media_metadata": {
                "aaa": {"e": "RedditVideo", "s": {"u": "https://i.redd.it/aaa"}},
                "bbb": {"e": "Image", "s": {"u": "https://i.redd.it/bbb.jpg"}}
            },
            "gallery_data": {"items": [{"media_id": "aaa"}, {"media_id": "bbb"}]}
        }}]}}]"#;
        let listing: types::Listing = serde_json::from_str(json).unwrap();
        let post = &listing[0].data.children[0].data;

        let media_list = gallery_media(&gallery_ctx(), post);
        assert_eq!(media_list.len(), 1);
        assert_eq!(media_list[0].formats[0].format_id, "photo");
    }
}
