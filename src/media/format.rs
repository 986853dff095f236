//! Concrete downloadable representations of a media item.

/// Type of media content.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MediaType {
    #[default]
    Photo,
    Video,
    Audio,
}

/// Video codecs reported by platform manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoCodec {
    Avc,
    Hevc,
    Vp9,
    Av1,
}

/// Audio codecs reported by platform manifests.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioCodec {
    Aac,
    Opus,
    Mp3,
}

/// One concrete downloadable representation of a media item.
///
/// Addressed either by candidate URLs (tried in order) or by an ordered
/// segment list for adaptive streams.
#[derive(Debug, Clone, Default)]
pub struct MediaFormat {
    /// Free-form format identifier ("photo", "gif", "hls-1200k", ...).
    pub format_id: String,

    pub media_type: MediaType,
    pub video_codec: Option<VideoCodec>,
    pub audio_codec: Option<AudioCodec>,

    /// Candidate source URLs, tried in order.
    pub urls: Vec<String>,

    /// Thumbnail URLs, best first.
    pub thumbnails: Vec<String>,

    /// Ordered segment URLs for streamed formats.
    pub segments: Vec<String>,

    pub width: Option<u64>,
    pub height: Option<u64>,
    pub bitrate: Option<u64>,

    /// Duration in seconds, when the platform reports it.
    pub duration: Option<u64>,
}

impl MediaFormat {
    /// A format must be addressable by at least one URL or one segment.
    pub fn has_source(&self) -> bool {
        !self.urls.is_empty() || !self.segments.is_empty()
    }

    /// Whether this format downloads via the segmented path.
    pub fn is_segmented(&self) -> bool {
        !self.segments.is_empty()
    }

    /// File extension for this format: taken from the first URL when it has
    /// a recognizable one, else a default per media type.
    pub fn extension(&self) -> &'static str {
        if let Some(first) = self.urls.first() {
            if let Some(ext) = extension_from_url(first) {
                return ext;
            }
        }
        match self.media_type {
            MediaType::Photo => "jpg",
            MediaType::Video => "mp4",
            MediaType::Audio => "m4a",
        }
    }
}

/// Extract a known extension from a URL path, ignoring query strings.
fn extension_from_url(url: &str) -> Option<&'static str> {
    let path = url::Url::parse(url).ok()?.path().to_ascii_lowercase();
    let ext = path.rsplit('.').next()?;
    match ext {
        "jpg" | "jpeg" => Some("jpg"),
        "png" => Some("png"),
        "gif" => Some("gif"),
        "webp" => Some("webp"),
        "mp4" => Some("mp4"),
        "webm" => Some("webm"),
        "mov" => Some("mov"),
        "m4a" => Some("m4a"),
        "mp3" => Some("mp3"),
        "ts" => Some("ts"),
        _ => None,
    }
}
