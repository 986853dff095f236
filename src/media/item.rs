//! Media item representation.

use crate::media::format::{MediaFormat, MediaType};

/// One distributable item: an image, a gallery entry, or a video, with one
/// or more alternative formats.
#[derive(Debug, Clone, Default)]
pub struct Media {
    /// Stable content ID from the source platform.
    pub content_id: String,

    /// Origin URL the item was extracted from.
    pub content_url: String,

    /// Caption or title, if the platform provides one.
    pub caption: Option<String>,

    /// Whether the platform marks this item as NSFW.
    pub nsfw: bool,

    /// Alternative formats, in extractor order.
    pub formats: Vec<MediaFormat>,
}

impl Media {
    /// Set the caption, ignoring empty strings.
    pub fn set_caption(&mut self, caption: &str) {
        if !caption.is_empty() {
            self.caption = Some(caption.to_string());
        }
    }

    /// Append a format.
    pub fn add_format(&mut self, format: MediaFormat) {
        self.formats.push(format);
    }

    /// Pick the format to distribute: the highest-bitrate video if any,
    /// otherwise the first format.
    pub fn best_format(&self) -> Option<&MediaFormat> {
        self.formats
            .iter()
            .filter(|f| f.media_type == MediaType::Video)
            .max_by_key(|f| f.bitrate.unwrap_or(0))
            .or_else(|| self.formats.first())
    }
}
