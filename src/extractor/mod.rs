//! Extractor definitions and dispatch.
//!
//! This module provides:
//! - The `Extractor` value type and its run contract
//! - The URL resolution registry
//! - The dispatch engine with redirect handling
//! - Built-in platform extractors

pub mod engine;
pub mod reddit;
pub mod registry;

use std::collections::HashMap;
use std::sync::Arc;

use futures::future::BoxFuture;
use regex::Regex;

use crate::error::Result;
use crate::media::Media;

pub use engine::extract;
pub use registry::{Registry, DEFAULT_REGISTRY};

/// How the engine treats an extractor's result.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorKind {
    /// Resolves the URL to a media list.
    Single,
    /// Resolves a short/opaque URL to a canonical URL for re-dispatch.
    Redirect,
}

/// Rough grouping of the source platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExtractorCategory {
    Social,
    Video,
    Generic,
}

/// The extractor's run operation.
///
/// Extractors are values carrying a function, not a trait hierarchy; the
/// `Single`/`Redirect` distinction is a discriminant field.
pub type RunFn = Box<
    dyn for<'a> Fn(&'a DownloadContext) -> BoxFuture<'a, Result<ExtractorResponse>> + Send + Sync,
>;

/// A registry entry: URL pattern, accepted hosts, and the run operation.
/// Immutable once registered.
pub struct Extractor {
    /// Display name.
    pub name: &'static str,

    /// Stable key used for HTTP-client selection and cookie files.
    pub code_name: &'static str,

    pub kind: ExtractorKind,
    pub category: ExtractorCategory,

    /// Compiled pattern with named capture groups; the group named `id`
    /// becomes the content ID.
    pub url_pattern: Regex,

    /// Accepted hostnames. A bare domain also accepts its subdomains.
    pub hosts: &'static [&'static str],

    pub run: RunFn,
}

impl Extractor {
    pub fn is_redirect(&self) -> bool {
        self.kind == ExtractorKind::Redirect
    }

    /// Create a media item attributed to this extractor's match.
    pub fn new_media(&self, content_id: &str, content_url: &str) -> Media {
        Media {
            content_id: content_id.to_string(),
            content_url: content_url.to_string(),
            ..Default::default()
        }
    }
}

impl std::fmt::Debug for Extractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Extractor")
            .field("name", &self.name)
            .field("code_name", &self.code_name)
            .field("kind", &self.kind)
            .field("category", &self.category)
            .field("hosts", &self.hosts)
            .finish()
    }
}

/// Per-request state passed to an extractor. Read-only for the extractor.
#[derive(Debug, Clone)]
pub struct DownloadContext {
    /// The matched extractor.
    pub extractor: Arc<Extractor>,

    /// The full pattern match.
    pub matched_content_url: String,

    /// The `id` capture group, falling back to the full match.
    pub matched_content_id: String,

    /// All named capture groups.
    pub matched_groups: HashMap<String, String>,
}

/// The return value of an extractor run.
#[derive(Debug)]
pub enum ExtractorResponse {
    /// Re-dispatch on this URL.
    Redirect(String),

    /// Final content resolved.
    Media(Vec<Media>),
}
