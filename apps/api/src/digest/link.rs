//! Link normalization — maps a `"display text — url"` link onto the URL used as its dedup key.

/// Separator between anchor text and URL in a link string.
pub const LINK_SEPARATOR: &str = " — ";

/// Formats an anchor as a link string: `"{text} — {url}"`.
pub fn format_link(display_text: &str, url: &str) -> String {
    format!("{display_text}{LINK_SEPARATOR}{url}")
}

/// Returns the canonical URL of a link.
///
/// Splits on the LAST separator so anchor text containing the separator still resolves to the
/// rightmost segment. A link without a separator is returned trimmed.
pub fn canonical_url(link: &str) -> &str {
    match link.rsplit_once(LINK_SEPARATOR) {
        Some((_, url)) => url.trim(),
        None => link.trim(),
    }
}
