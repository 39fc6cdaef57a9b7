//! Anchor extraction from alert email HTML.

use scraper::{Html, Selector};

use crate::digest::link::format_link;

/// Returns one `"text — href"` link per `<a>` whose `href` contains `http`, in document order.
///
/// Anchor text is whitespace-normalized; an anchor without text still yields a link.
pub fn extract_links(html: &str) -> Vec<String> {
    let document = Html::parse_document(html);
    let Ok(selector) = Selector::parse("a") else {
        return Vec::new();
    };

    document
        .select(&selector)
        .filter_map(|anchor| {
            let href = anchor.value().attr("href")?;
            if !href.contains("http") {
                return None;
            }
            let text = anchor
                .text()
                .map(str::trim)
                .filter(|piece| !piece.is_empty())
                .collect::<Vec<_>>()
                .join(" ");
            Some(format_link(&text, href))
        })
        .collect()
}
