use crate::UrlError;
use url::Url;

/// Parses and normalizes a URL string for probing
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Require an http or https scheme and a host
/// 3. Collapse repeated slashes in the path (dot segments are already
///    resolved by the parser, host is already lowercased)
/// 4. Remove the fragment (everything after #)
/// 5. Remove an empty query string (trailing ?)
///
/// Trailing slashes and query parameters are kept: for content discovery
/// `/admin` and `/admin/` are distinct resources.
///
/// # Examples
///
/// ```
/// use borer::url::normalize_url;
///
/// let url = normalize_url("http://EXAMPLE.test//a/./b/#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.test/a/b/");
/// ```
pub fn normalize_url(url_str: &str) -> Result<Url, UrlError> {
    let url = Url::parse(url_str).map_err(|e| UrlError::Parse(e.to_string()))?;
    normalize(url)
}

/// Normalizes an already parsed URL
pub fn normalize(mut url: Url) -> Result<Url, UrlError> {
    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(format!(
            "Only HTTP and HTTPS schemes are supported, got: {}",
            url.scheme()
        )));
    }

    if url.host_str().is_none() {
        return Err(UrlError::MissingHost);
    }

    if url.path().contains("//") {
        let collapsed = collapse_slashes(url.path());
        url.set_path(&collapsed);
    }

    url.set_fragment(None);

    if url.query() == Some("") {
        url.set_query(None);
    }

    Ok(url)
}

/// The dedup key of a URL: its string form without fragment or empty query
///
/// Two candidates with the same key are the same probe target.
pub fn normalize_key(url: &Url) -> String {
    match normalize(url.clone()) {
        Ok(normalized) => normalized.into(),
        // Non-http URLs never reach the queue through the policy gates, but
        // still get a stable key.
        Err(_) => {
            let mut copy = url.clone();
            copy.set_fragment(None);
            copy.into()
        }
    }
}

fn collapse_slashes(path: &str) -> String {
    let mut out = String::with_capacity(path.len());
    let mut previous_slash = false;
    for c in path.chars() {
        if c == '/' {
            if previous_slash {
                continue;
            }
            previous_slash = true;
        } else {
            previous_slash = false;
        }
        out.push(c);
    }
    out
}
