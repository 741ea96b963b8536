//! HTML link extraction
//!
//! Responses that look like reasonably sized HTML documents are parsed as a
//! tree and every `<a href>` is resolved against the document's URL.

use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Bodies this size or larger are never parsed
pub const MAX_HTML_LENGTH: u64 = 1024 * 1024;

/// Decides whether a response body should be parsed for links
///
/// The content type must be exactly `text/html` (case-insensitive) and the
/// declared length must satisfy `0 < length < 1 MiB`. A missing length is
/// not eligible.
pub fn is_eligible(content_type: Option<&str>, content_length: Option<u64>) -> bool {
    let Some(content_type) = content_type else {
        return false;
    };
    if !content_type.trim().eq_ignore_ascii_case("text/html") {
        return false;
    }

    matches!(content_length, Some(len) if len > 0 && len < MAX_HTML_LENGTH)
}

/// Extracts the distinct link targets of an HTML document
///
/// # Arguments
///
/// * `base_url` - The document's own URL, used to resolve relative links
/// * `body` - The raw document bytes (decoded lossily as UTF-8)
///
/// # Returns
///
/// The set of absolute http(s) URLs referenced by `<a href>` elements, with
/// fragments removed. Hrefs that cannot be resolved are skipped.
///
/// # Example
///
/// ```
/// use borer::crawler::extract_links;
/// use url::Url;
///
/// let base = Url::parse("http://example.test/dir/page").unwrap();
/// let links = extract_links(&base, br#"<a href="/about">About</a>"#);
/// assert!(links.contains(&Url::parse("http://example.test/about").unwrap()));
/// ```
pub fn extract_links(base_url: &Url, body: &[u8]) -> HashSet<Url> {
    let html = String::from_utf8_lossy(body);
    let document = Html::parse_document(&html);

    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(e) => {
            tracing::info!("Unable to build link selector: {:?}", e);
            return HashSet::new();
        }
    };

    document
        .select(&selector)
        .filter_map(|element| element.value().attr("href"))
        .filter_map(|href| resolve_link(href, base_url))
        .collect()
}

/// Resolves a link href to an absolute URL
///
/// Returns None for empty hrefs, references that fail to resolve, and
/// non-HTTP(S) targets such as `mailto:` or `javascript:`.
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    match base_url.join(href) {
        Ok(mut absolute_url) => {
            if absolute_url.scheme() != "http" && absolute_url.scheme() != "https" {
                return None;
            }
            absolute_url.set_fragment(None);
            Some(absolute_url)
        }
        Err(e) => {
            tracing::info!("Error parsing URL ({}): {}", href, e);
            None
        }
    }
}
