//! Extractor registry and URL resolution.

use std::collections::HashMap;
use std::sync::Arc;

use once_cell::sync::Lazy;
use url::Url;

use crate::error::{Error, Result};
use crate::extractor::{reddit, DownloadContext, Extractor};

/// Process-wide registry populated at startup. Tests build local instances.
pub static DEFAULT_REGISTRY: Lazy<Registry> = Lazy::new(Registry::with_defaults);

/// An ordered set of extractors. Resolution is first-match-wins on
/// registration order, so more-specific patterns must be registered first.
#[derive(Default)]
pub struct Registry {
    entries: Vec<Arc<Extractor>>,
}

impl Registry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with the built-in platform extractors.
    pub fn with_defaults() -> Self {
        let mut registry = Self::new();
        // Short-link extractors come before full ones for the same host.
        registry.register(reddit::short_extractor());
        registry.register(reddit::extractor());
        registry
    }

    /// Register an extractor. A second registration with the same code name
    /// is skipped, so double registration is deterministic.
    pub fn register(&mut self, extractor: Arc<Extractor>) {
        if self
            .entries
            .iter()
            .any(|e| e.code_name == extractor.code_name)
        {
            tracing::debug!("Skipping duplicate extractor: {}", extractor.code_name);
            return;
        }
        self.entries.push(extractor);
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Resolve a URL to an extractor and its capture groups.
    pub fn resolve(&self, input_url: &str) -> Result<DownloadContext> {
        let parsed = Url::parse(input_url)?;
        let host = parsed
            .host_str()
            .ok_or_else(|| Error::NoMatchingExtractor(input_url.to_string()))?
            .to_ascii_lowercase();

        for extractor in &self.entries {
            if !host_matches(&host, extractor.hosts) {
                continue;
            }

            let Some(captures) = extractor.url_pattern.captures(input_url) else {
                continue;
            };

            // Group 0 always exists for a match.
            let matched_content_url = captures
                .get(0)
                .map(|m| m.as_str().to_string())
                .unwrap_or_default();

            let mut matched_groups = HashMap::new();
            for name in extractor.url_pattern.capture_names().flatten() {
                if let Some(value) = captures.name(name) {
                    matched_groups.insert(name.to_string(), value.as_str().to_string());
                }
            }

            let matched_content_id = matched_groups
                .get("id")
                .cloned()
                .unwrap_or_else(|| matched_content_url.clone());

            return Ok(DownloadContext {
                extractor: Arc::clone(extractor),
                matched_content_url,
                matched_content_id,
                matched_groups,
            });
        }

        Err(Error::NoMatchingExtractor(input_url.to_string()))
    }
}

/// Host filter: exact match, or a subdomain of a registered bare domain.
fn host_matches(input_host: &str, hosts: &[&str]) -> bool {
    hosts.iter().any(|h| {
        let h = h.to_ascii_lowercase();
        input_host == h || input_host.ends_with(&format!(".{h}"))
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::extractor::{ExtractorCategory, ExtractorKind, ExtractorResponse};
    use regex::Regex;

    fn stub(
        name: &'static str,
        code_name: &'static str,
        pattern: &str,
        hosts: &'static [&'static str],
    ) -> Arc<Extractor> {
        Arc::new(Extractor {
            name,
            code_name,
            kind: ExtractorKind::Single,
            category: ExtractorCategory::Generic,
            url_pattern: Regex::new(pattern).unwrap(),
            hosts,
            run: Box::new(|_ctx| Box::pin(async { Ok(ExtractorResponse::Media(vec![])) })),
        })
    }

    #[test]
    fn test_resolve_matches_host_and_pattern() {
        let mut registry = Registry::new();
        registry.register(stub(
            "Example",
            "example",
            r"https?://(?:\w+\.)?example\.com/watch/(?P<id>\w+)",
            &["example.com"],
        ));

        let ctx = registry
            .resolve("https://www.example.com/watch/abc123?t=1")
            .unwrap();
        assert_eq!(ctx.extractor.code_name, "example");
        assert_eq!(ctx.matched_content_id, "abc123");
        assert_eq!(
            ctx.matched_content_url,
            "https://www.example.com/watch/abc123"
        );
    }

    #[test]
    fn test_resolve_rejects_unknown_host() {
        let mut registry = Registry::new();
        registry.register(stub(
            "Example",
            "example",
            r"https?://.*",
            &["example.com"],
        ));

        // Pattern would match, but the host is not registered.
        let err = registry.resolve("https://other.com/watch/abc").unwrap_err();
        assert!(matches!(err, Error::NoMatchingExtractor(_)));

        // Suffix collisions are not subdomains.
        let err = registry
            .resolve("https://notexample.com/watch/abc")
            .unwrap_err();
        assert!(matches!(err, Error::NoMatchingExtractor(_)));
    }

    #[test]
    fn test_subdomains_accepted_for_bare_domain() {
        let mut registry = Registry::new();
        registry.register(stub(
            "Example",
            "example",
            r"https?://(?:[\w.]+\.)?example\.com/(?P<id>\w+)",
            &["example.com"],
        ));

        assert!(registry.resolve("https://old.example.com/abc").is_ok());
        assert!(registry.resolve("https://a.b.example.com/abc").is_ok());
    }

    #[test]
    fn test_first_match_wins() {
        let mut registry = Registry::new();
        registry.register(stub(
            "Example Short",
            "example_short",
            r"https?://example\.com/s/(?P<id>\w+)",
            &["example.com"],
        ));
        registry.register(stub(
            "Example",
            "example",
            r"https?://example\.com/(?P<slug>[\w/]+)",
            &["example.com"],
        ));

        let ctx = registry.resolve("https://example.com/s/abc").unwrap();
        assert_eq!(ctx.extractor.code_name, "example_short");

        let ctx = registry.resolve("https://example.com/comments/xyz").unwrap();
        assert_eq!(ctx.extractor.code_name, "example");
    }

    #[test]
    fn test_id_falls_back_to_full_match() {
        let mut registry = Registry::new();
        registry.register(stub(
            "Example",
            "example",
            r"https?://example\.com/\w+",
            &["example.com"],
        ));

        let ctx = registry.resolve("https://example.com/abc").unwrap();
        assert_eq!(ctx.matched_content_id, "https://example.com/abc");
    }

    #[test]
    fn test_duplicate_registration_skipped() {
        let mut registry = Registry::new();
        registry.register(stub("A", "dup", r"https?://a\.com/", &["a.com"]));
        registry.register(stub("B", "dup", r"https?://b\.com/", &["b.com"]));
        assert_eq!(registry.len(), 1);
        assert!(registry.resolve("https://b.com/").is_err());
    }

    #[test]
    fn test_default_registry_order() {
        let registry = Registry::with_defaults();
        assert!(!registry.is_empty());

        // The short-link extractor must shadow the full one for /s/ URLs.
        let ctx = registry
            .resolve("https://www.reddit.com/r/pics/s/AbCdEf")
            .unwrap();
        assert_eq!(ctx.extractor.code_name, "reddit_short");

        let ctx = registry
            .resolve("https://www.reddit.com/r/pics/comments/1abcd2/title/")
            .unwrap();
        assert_eq!(ctx.extractor.code_name, "reddit");
        assert_eq!(ctx.matched_content_id, "1abcd2");
    }
}
