//! Outbound link discovery
//!
//! # Link Extraction Rules
//!
//! **Include:**
//! - `<a href="...">` tags anywhere in the document
//!
//! **Exclude:**
//! - `<a href="..." download>`
//! - `javascript:`, `mailto:`, `tel:` links
//! - Data URIs
//! - Fragment-only links (same page anchors)
//!
//! Every kept link is normalized (query and fragment stripped) and
//! duplicates within the page are dropped before the per-page cap applies.

use crate::url::normalize_link;
use scraper::{Html, Selector};
use std::collections::HashSet;
use url::Url;

/// Extracts up to `cap` normalized outbound links from the document
///
/// # Arguments
///
/// * `document` - The parsed page
/// * `base_url` - The page URL for resolving relative links
/// * `cap` - Maximum number of links returned
///
/// # Example
///
/// ```
/// use focus_crawl::content::extract_links;
/// use scraper::Html;
/// use url::Url;
///
/// let html = Html::parse_document(r#"<a href="/page?x=1#top">Link</a>"#);
/// let base = Url::parse("https://example.com/").unwrap();
/// let links = extract_links(&html, &base, 50);
/// assert_eq!(links[0].as_str(), "https://example.com/page");
/// ```
pub fn extract_links(document: &Html, base_url: &Url, cap: usize) -> Vec<Url> {
    let mut links = Vec::new();
    let mut seen = HashSet::new();

    let Ok(a_selector) = Selector::parse("a[href]") else {
        return links;
    };

    for element in document.select(&a_selector) {
        if links.len() >= cap {
            break;
        }

        // Skip if it has the download attribute
        if element.value().attr("download").is_some() {
            continue;
        }

        let Some(href) = element.value().attr("href") else {
            continue;
        };

        let Some(absolute) = resolve_link(href, base_url) else {
            continue;
        };

        match normalize_link(absolute.as_str()) {
            Ok(normalized) => {
                if seen.insert(normalized.as_str().to_string()) {
                    links.push(normalized);
                }
            }
            Err(e) => {
                tracing::trace!("Dropping link {}: {}", absolute, e);
            }
        }
    }

    links
}

/// Resolves a link href to an absolute URL
///
/// Returns None if the link should be excluded:
/// - javascript:, mailto:, tel: schemes
/// - data: URIs
/// - fragment-only anchors
/// - Invalid URLs
fn resolve_link(href: &str, base_url: &Url) -> Option<Url> {
    let href = href.trim();

    if href.is_empty() {
        return None;
    }

    let lowered = href.to_ascii_lowercase();
    if lowered.starts_with("javascript:")
        || lowered.starts_with("mailto:")
        || lowered.starts_with("tel:")
        || lowered.starts_with("data:")
    {
        return None;
    }

    if href.starts_with('#') {
        return None;
    }

    base_url.join(href).ok()
}
