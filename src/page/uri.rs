//! URI helpers for links found in pages

use url::{ParseError, Url};

/// Resolves `raw` against the page URL
///
/// Absolute URIs are returned as they are; everything else is resolved the
/// RFC 3986 way, so `../b`, `?page=2`, `//cdn.example.com/x` and `#top` all
/// work.
pub fn resolve(base: &Url, raw: &str) -> Result<Url, ParseError> {
    base.join(raw.trim())
}

/// Decoded query parameters of a URL, in order of appearance
pub fn query_pairs(url: &Url) -> Vec<(String, String)> {
    url.query_pairs()
        .map(|(k, v)| (k.into_owned(), v.into_owned()))
        .collect()
}

/// Resolves a link to something worth fetching
///
/// Returns None if the link should not be followed:
/// - empty hrefs and fragment-only links
/// - javascript:, mailto:, tel: and data: schemes
/// - hrefs that do not resolve
/// - non-HTTP(S) URLs after resolution
///
/// The fragment is stripped from the result.
pub fn followable(base: &Url, href: &str) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() || href.starts_with('#') {
        return None;
    }

    let lower = href.to_ascii_lowercase();
    if lower.starts_with("javascript:")
        || lower.starts_with("mailto:")
        || lower.starts_with("tel:")
        || lower.starts_with("data:")
    {
        return None;
    }

    let mut url = resolve(base, href).ok()?;
    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.set_fragment(None);
    Some(url)
}

/// The form a URL takes in seen-sets: parsed, without fragment
///
/// Unparseable input is kept as it is.
pub fn normalize(raw: &str) -> String {
    match Url::parse(raw.trim()) {
        Ok(mut url) => {
            url.set_fragment(None);
            url.to_string()
        }
        Err(_) => raw.to_string(),
    }
}
