//! Media URL rewriting.
//!
//! Upstream payloads embed absolute thumbnail, avatar and stream URLs that
//! point at Google hosts.  The viewer fetches media through a local reverse
//! proxy instead, so recognised media URLs are cut down to `path[?query]`.

use url::Url;

/// Path prefixes served by the local media proxy.
const PROXIED_PREFIXES: &[&str] = &["/vi/", "/ggpht/", "/videoplayback"];

/// Path fragment used by HLS/DASH manifests.
const MANIFEST_SEGMENT: &str = "/manifest/";

/// Rewrite an absolute upstream media URL into host-relative form.
///
/// * Empty and already-relative URLs are returned unchanged.
/// * Absolute URLs whose path is a known media path become `path[?query]`.
/// * Anything else (unknown paths, unparseable input) passes through.
///
/// The output of a rewrite always starts with `/`, so applying the function
/// twice gives the same result as applying it once.
pub fn normalize_url(url: &str) -> String {
    if url.is_empty() || url.starts_with('/') {
        return url.to_string();
    }

    let Ok(parsed) = Url::parse(url) else {
        return url.to_string();
    };

    let path = parsed.path();
    let proxied = PROXIED_PREFIXES.iter().any(|p| path.starts_with(p))
        || path.contains(MANIFEST_SEGMENT);
    if !proxied {
        return url.to_string();
    }

    match parsed.query() {
        Some(q) => format!("{path}?{q}"),
        None => path.to_string(),
    }
}
