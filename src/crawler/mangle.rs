//! Extension mangling of wordlist candidates

use std::collections::BTreeSet;
use url::Url;

/// Generates the variants of a name with each extension appended
///
/// A bare name (non-empty last segment, no `.`) yields itself plus one
/// `name.ext` per distinct extension. Anything else, including names that
/// already carry an extension and directory paths ending in `/`, yields only
/// itself.
///
/// # Example
///
/// ```
/// use borer::crawler::mangle;
///
/// let variants = mangle("index", &["html".to_string(), "php".to_string()]);
/// assert_eq!(variants.len(), 3);
/// assert!(variants.contains("index.php"));
/// ```
pub fn mangle(name: &str, extensions: &[String]) -> BTreeSet<String> {
    let mut variants = BTreeSet::from([name.to_string()]);
    if !is_bare_name(name) {
        return variants;
    }

    for ext in extensions {
        let ext = ext.trim().trim_start_matches('.');
        if !ext.is_empty() {
            variants.insert(format!("{}.{}", name, ext));
        }
    }

    variants
}

/// Applies [`mangle`] to the last path segment of a URL
///
/// The original URL is always the first element; the query string is kept
/// on every variant.
pub fn mangle_url(url: &Url, extensions: &[String]) -> Vec<Url> {
    let path = url.path();
    let mut variants = vec![url.clone()];

    for variant in mangle(path, extensions) {
        if variant == path {
            continue;
        }
        let mut mangled = url.clone();
        mangled.set_path(&variant);
        variants.push(mangled);
    }

    variants
}

fn is_bare_name(name: &str) -> bool {
    let last = name.rsplit('/').next().unwrap_or_default();
    !last.is_empty() && !last.contains('.')
}
