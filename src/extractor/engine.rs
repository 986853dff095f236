//! Extractor dispatch loop.

use std::collections::HashSet;

use tokio_util::sync::CancellationToken;

use crate::error::{Error, Result};
use crate::extractor::{ExtractorResponse, Registry};
use crate::media::Media;

/// Maximum redirect hops before the dispatch loop gives up.
const MAX_REDIRECTS: usize = 5;

/// Resolve a URL to its media list, following redirect extractors.
///
/// Redirect responses re-enter resolution with the returned URL, bounded by
/// a budget of [`MAX_REDIRECTS`] hops and a visited set for cycle detection.
pub async fn extract(
    registry: &Registry,
    input_url: &str,
    cancel: &CancellationToken,
) -> Result<Vec<Media>> {
    let mut url = input_url.to_string();
    let mut visited: HashSet<String> = HashSet::from([url.clone()]);
    let mut redirects = 0usize;

    loop {
        if cancel.is_cancelled() {
            return Err(Error::Cancelled);
        }

        let ctx = registry.resolve(&url)?;
        tracing::debug!(
            "Dispatching {} to {}",
            ctx.matched_content_url,
            ctx.extractor.name
        );

        let response = (ctx.extractor.run)(&ctx).await.map_err(|e| match e {
            Error::Cancelled => Error::Cancelled,
            other => Error::Extractor(format!("{}: {}", ctx.extractor.name, other)),
        })?;

        match response {
            ExtractorResponse::Redirect(next) => {
                redirects += 1;
                if redirects > MAX_REDIRECTS {
                    return Err(Error::TooManyRedirects(MAX_REDIRECTS));
                }
                if !visited.insert(next.clone()) {
                    return Err(Error::RedirectCycle(next));
                }
                tracing::debug!("Redirected to {}", next);
                url = next;
            }
            ExtractorResponse::Media(media_list) => {
                if media_list.is_empty() {
                    return Err(Error::NoMediaFound);
                }
                return Ok(media_list);
            }
        }
    }
}
