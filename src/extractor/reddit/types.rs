//! Reddit listing response types.

use std::collections::HashMap;

use serde::Deserialize;

/// The `.json` endpoint returns an array of listing pages.
pub type Listing = Vec<ListingPage>;

#[derive(Debug, Deserialize)]
pub struct ListingPage {
    pub data: ListingData,
}

#[derive(Debug, Deserialize)]
pub struct ListingData {
    #[serde(default)]
    pub children: Vec<Child>,
}

#[derive(Debug, Deserialize)]
pub struct Child {
    pub data: Post,
}

#[derive(Debug, Deserialize)]
pub struct Post {
    #[serde(default)]
    pub title: String,

    #[serde(default)]
    pub over_18: bool,

    #[serde(default)]
    pub is_video: bool,

    /// Thumbnail URL, or a placeholder keyword ("nsfw", "spoiler", ...).
    #[serde(default)]
    pub thumbnail: String,

    pub preview: Option<Preview>,

    pub media: Option<PostMedia>,
    pub secure_media: Option<PostMedia>,

    /// Gallery items keyed by media ID. Object order is not meaningful;
    /// `gallery_data` carries the display order.
    #[serde(default)]
    pub media_metadata: HashMap<String, MediaMetadataItem>,

    pub gallery_data: Option<GalleryData>,
}

#[derive(Debug, Deserialize)]
pub struct Preview {
    #[serde(default)]
    pub images: Vec<PreviewImage>,

    #[serde(rename = "reddit_video_preview")]
    pub video_preview: Option<RedditVideo>,
}

#[derive(Debug, Deserialize)]
pub struct PreviewImage {
    pub source: ImageSource,

    #[serde(default)]
    pub variants: Variants,
}

#[derive(Debug, Deserialize)]
pub struct ImageSource {
    pub url: String,

    #[serde(default)]
    pub width: u64,

    #[serde(default)]
    pub height: u64,
}

#[derive(Debug, Default, Deserialize)]
pub struct Variants {
    pub mp4: Option<Variant>,
}

#[derive(Debug, Deserialize)]
pub struct Variant {
    pub source: ImageSource,
}

#[derive(Debug, Deserialize)]
pub struct PostMedia {
    #[serde(rename = "reddit_video")]
    pub video: Option<RedditVideo>,
}

#[derive(Debug, Deserialize)]
pub struct RedditVideo {
    pub fallback_url: String,

    pub hls_url: Option<String>,

    #[serde(default)]
    pub duration: u64,

    #[serde(default)]
    pub width: u64,

    #[serde(default)]
    pub height: u64,

    #[serde(default)]
    pub bitrate_kbps: u64,
}

#[derive(Debug, Deserialize)]
pub struct MediaMetadataItem {
    /// Item kind: "Image" or "AnimatedImage".
    #[serde(rename = "e", default)]
    pub kind: String,

    #[serde(rename = "s")]
    pub source: Option<MetadataSource>,
}

#[derive(Debug, Deserialize)]
pub struct MetadataSource {
    /// Direct image URL (HTML-escaped).
    #[serde(rename = "u")]
    pub url: Option<String>,

    /// MP4 URL for animated items (HTML-escaped).
    pub mp4: Option<String>,

    #[serde(rename = "x", default)]
    pub width: u64,

    #[serde(rename = "y", default)]
    pub height: u64,
}

#[derive(Debug, Deserialize)]
pub struct GalleryData {
    #[serde(default)]
    pub items: Vec<GalleryItem>,
}

#[derive(Debug, Deserialize)]
pub struct GalleryItem {
    pub media_id: String,
}
