//! Text extraction and content-block deduplication

use crate::content::metadata::collapse_whitespace;
use crate::content::scoring::contains_keyword;
use scraper::{Html, Selector};
use sha2::{Digest, Sha256};
use std::collections::HashSet;

/// Block-level elements whose text becomes candidate results
const BLOCK_SELECTOR: &str = "p, article, section";

/// Heading levels consulted by the relevance score
const HEADING_SELECTOR: &str = "h1, h2, h3";

/// Elements whose text is never visible page content
const HIDDEN_ELEMENTS: &[&str] = &["script", "style", "noscript", "template"];

/// Fingerprint of a block's normalized text
///
/// SHA-256 over the lowercased, whitespace-collapsed text, hex encoded.
pub fn fingerprint(text: &str) -> String {
    let normalized = collapse_whitespace(text).to_lowercase();
    let mut hasher = Sha256::new();
    hasher.update(normalized.as_bytes());
    hex::encode(hasher.finalize())
}

/// Set of content fingerprints already emitted
///
/// Each worker owns one; fingerprints are not shared across workers.
#[derive(Debug, Default)]
pub struct ContentFingerprints {
    seen: HashSet<String>,
}

impl ContentFingerprints {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the fingerprint of `text`
    ///
    /// Returns true if this content had not been seen before.
    pub fn insert(&mut self, text: &str) -> bool {
        self.seen.insert(fingerprint(text))
    }

    pub fn contains(&self, text: &str) -> bool {
        self.seen.contains(&fingerprint(text))
    }

    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }
}

/// Collects the visible text of the whole document
///
/// Script, style and template contents are skipped; whitespace is collapsed.
pub fn page_text(document: &Html) -> String {
    let mut raw = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };

        let hidden = node
            .parent()
            .and_then(|parent| parent.value().as_element().map(|el| el.name().to_string()))
            .map_or(false, |name| HIDDEN_ELEMENTS.contains(&name.as_str()));

        if !hidden {
            raw.push_str(text);
            raw.push(' ');
        }
    }

    collapse_whitespace(&raw)
}

/// Text of every h1-h3 heading, in document order
pub fn headings(document: &Html) -> Vec<String> {
    let Ok(selector) = Selector::parse(HEADING_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty())
        .collect()
}

/// Returns the text of every block that mentions the keyword
///
/// Blocks are `<p>`, `<article>` and `<section>` elements in document order.
/// Empty blocks and blocks without a case-insensitive keyword match are
/// dropped. Deduplication is left to the caller.
pub fn keyword_blocks(document: &Html, keyword: &str) -> Vec<String> {
    let Ok(selector) = Selector::parse(BLOCK_SELECTOR) else {
        return Vec::new();
    };

    document
        .select(&selector)
        .map(|element| collapse_whitespace(&element.text().collect::<String>()))
        .filter(|text| !text.is_empty() && contains_keyword(text, keyword))
        .collect()
}
