//! Page metadata extraction
//!
//! Each field is resolved by walking a fixed list of sources in priority
//! order; the first non-empty value wins. Do not reorder the lists.

use scraper::{Html, Selector};

pub const UNKNOWN_DATE: &str = "Unknown Date";
pub const UNKNOWN_AUTHOR: &str = "Unknown Author";
pub const NO_TITLE: &str = "No Title";

/// `<meta>` names/properties carrying a publication date
const DATE_META_TAGS: &[&str] = &[
    "article:published_time",
    "pubdate",
    "publication_date",
    "date",
    "article.published",
];

/// Elements whose text holds a publication date
const DATE_SELECTORS: &[&str] = &[
    "[itemprop='datePublished']",
    ".published",
    ".pubdate",
    ".post-date",
    ".entry-date",
    ".article-date",
    ".date",
    ".timestamp",
];

/// `<meta>` names/properties carrying an author
const AUTHOR_META_TAGS: &[&str] = &["author", "article:author", "dc.creator", "byl"];

/// Elements whose text holds an author name
const AUTHOR_SELECTORS: &[&str] = &[
    "[itemprop='author']",
    "[rel='author']",
    ".author-name",
    ".author",
    ".byline",
];

/// Extracts the page title from the `<title>` tag
pub fn extract_title(document: &Html) -> Option<String> {
    let title_selector = Selector::parse("title").ok()?;

    document
        .select(&title_selector)
        .next()
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|s| !s.is_empty())
}

/// Resolves the publication date
///
/// Order: `<time datetime>` → date `<meta>` tags → date-bearing elements.
/// Falls back to `"Unknown Date"`.
pub fn extract_publication_date(document: &Html) -> String {
    first_time_datetime(document)
        .or_else(|| first_meta_content(document, DATE_META_TAGS))
        .or_else(|| first_selector_text(document, DATE_SELECTORS))
        .unwrap_or_else(|| UNKNOWN_DATE.to_string())
}

/// Resolves the author
///
/// Order: author `<meta>` tags → author-bearing elements.
/// Falls back to `"Unknown Author"`.
pub fn extract_author(document: &Html) -> String {
    first_meta_content(document, AUTHOR_META_TAGS)
        .or_else(|| first_selector_text(document, AUTHOR_SELECTORS))
        .unwrap_or_else(|| UNKNOWN_AUTHOR.to_string())
}

fn first_time_datetime(document: &Html) -> Option<String> {
    let selector = Selector::parse("time[datetime]").ok()?;
    document
        .select(&selector)
        .filter_map(|element| element.value().attr("datetime"))
        .map(str::trim)
        .find(|value| !value.is_empty())
        .map(str::to_string)
}

fn first_meta_content(document: &Html, names: &[&str]) -> Option<String> {
    for name in names {
        let query = format!("meta[property=\"{0}\"], meta[name=\"{0}\"]", name);
        let Ok(selector) = Selector::parse(&query) else {
            continue;
        };

        let found = document
            .select(&selector)
            .filter_map(|element| element.value().attr("content"))
            .map(str::trim)
            .find(|value| !value.is_empty());

        if let Some(value) = found {
            return Some(value.to_string());
        }
    }
    None
}

fn first_selector_text(document: &Html, selectors: &[&str]) -> Option<String> {
    for query in selectors {
        let Ok(selector) = Selector::parse(query) else {
            continue;
        };

        let found = document
            .select(&selector)
            .map(|element| collapse_whitespace(&element.text().collect::<String>()))
            .find(|text| !text.is_empty());

        if found.is_some() {
            return found;
        }
    }
    None
}

/// Collapses runs of whitespace into single spaces and trims the ends
pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
