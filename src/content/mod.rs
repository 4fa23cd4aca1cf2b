//! Content processing for fetched pages
//!
//! This module turns a fetched HTML page into crawl output:
//! - Relevance scoring of the whole page against the keyword
//! - Publication date and author extraction
//! - Keyword-bearing text blocks, deduplicated by content fingerprint
//! - Outbound link discovery for the next crawl depth
//!
//! `scraper::Html` is not `Send`, so every function here is synchronous and
//! callers drop the document before their next `.await`.

mod blocks;
mod links;
mod metadata;
mod scoring;

pub use blocks::{fingerprint, headings, keyword_blocks, page_text, ContentFingerprints};
pub use links::extract_links;
pub use metadata::{
    collapse_whitespace, extract_author, extract_publication_date, extract_title, NO_TITLE,
    UNKNOWN_AUTHOR, UNKNOWN_DATE,
};
pub use scoring::{count_occurrences, contains_keyword, relevance_score, PageSignals};

use crate::config::CrawlerConfig;
use chrono::Utc;
use scraper::Html;
use serde::{Deserialize, Serialize};
use url::Url;

/// One keyword-bearing content block from a crawled page
///
/// Serialized field names form the on-disk result format.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredContentItem {
    pub url: String,
    pub title: String,
    #[serde(rename = "content")]
    pub text_snippet: String,
    #[serde(rename = "date")]
    pub publication_date: String,
    pub author: String,
    pub relevance_score: f64,
    pub crawl_depth: u32,
    /// Milliseconds since the Unix epoch
    #[serde(rename = "crawl_time")]
    pub crawl_timestamp: i64,
}

/// Page-level scoring result
#[derive(Debug, Clone, PartialEq)]
pub struct ScoredPage {
    pub title: Option<String>,
    pub relevance_score: f64,
}

/// Everything the processor derives from one page
#[derive(Debug, Clone)]
pub struct PageAnalysis {
    pub page: ScoredPage,
    pub items: Vec<ScoredContentItem>,
    pub links: Vec<Url>,
}

/// Scores, extracts and discovers links for a single keyword
#[derive(Debug, Clone)]
pub struct ContentProcessor {
    keyword: String,
    min_relevance_score: f64,
    max_depth: u32,
    max_links_per_page: usize,
}

impl ContentProcessor {
    pub fn new(keyword: &str, config: &CrawlerConfig) -> Self {
        Self {
            keyword: keyword.trim().to_lowercase(),
            min_relevance_score: config.min_relevance_score,
            max_depth: config.max_depth,
            max_links_per_page: config.max_links_per_page,
        }
    }

    pub fn keyword(&self) -> &str {
        &self.keyword
    }

    /// Computes the page relevance score
    pub fn score(&self, document: &Html, page_url: &Url) -> ScoredPage {
        let title = extract_title(document);
        let text = page_text(document);
        let headings = headings(document);

        let signals = PageSignals {
            text: &text,
            title: title.as_deref(),
            url: page_url.as_str(),
            headings: &headings,
        };

        ScoredPage {
            relevance_score: relevance_score(&signals, &self.keyword),
            title,
        }
    }

    /// Whether a page scores high enough to contribute results
    pub fn is_relevant(&self, page: &ScoredPage) -> bool {
        page.relevance_score >= self.min_relevance_score
    }

    /// Builds one result item per new keyword-bearing block
    ///
    /// Blocks whose fingerprint is already in `fingerprints` are skipped;
    /// kept blocks are recorded there.
    pub fn extract_items(
        &self,
        document: &Html,
        page: &ScoredPage,
        page_url: &Url,
        depth: u32,
        fingerprints: &mut ContentFingerprints,
    ) -> Vec<ScoredContentItem> {
        let publication_date = extract_publication_date(document);
        let author = extract_author(document);
        let title = page.title.clone().unwrap_or_else(|| NO_TITLE.to_string());

        let mut items = Vec::new();
        for block in keyword_blocks(document, &self.keyword) {
            if !fingerprints.insert(&block) {
                tracing::trace!("Skipping duplicate block on {}", page_url);
                continue;
            }

            items.push(ScoredContentItem {
                url: page_url.to_string(),
                title: title.clone(),
                text_snippet: block,
                publication_date: publication_date.clone(),
                author: author.clone(),
                relevance_score: page.relevance_score,
                crawl_depth: depth,
                crawl_timestamp: Utc::now().timestamp_millis(),
            });
        }

        items
    }

    /// Collects outbound links when the page is above the depth bound
    pub fn discover_links(&self, document: &Html, page_url: &Url, depth: u32) -> Vec<Url> {
        if depth >= self.max_depth {
            return Vec::new();
        }
        extract_links(document, page_url, self.max_links_per_page)
    }

    /// Runs scoring, extraction and link discovery over raw HTML
    pub fn analyze(
        &self,
        body: &str,
        page_url: &Url,
        depth: u32,
        fingerprints: &mut ContentFingerprints,
    ) -> PageAnalysis {
        self.analyze_with(body, page_url, depth, fingerprints, || {})
    }

    /// Like [`analyze`](Self::analyze), calling `on_relevant` once the page
    /// has scored above the threshold and before its blocks are extracted
    pub fn analyze_with(
        &self,
        body: &str,
        page_url: &Url,
        depth: u32,
        fingerprints: &mut ContentFingerprints,
        on_relevant: impl FnOnce(),
    ) -> PageAnalysis {
        let document = Html::parse_document(body);
        let page = self.score(&document, page_url);
        tracing::debug!(
            "Scored {} at depth {}: {:.2}",
            page_url,
            depth,
            page.relevance_score
        );

        let items = if self.is_relevant(&page) {
            on_relevant();
            self.extract_items(&document, &page, page_url, depth, fingerprints)
        } else {
            Vec::new()
        };

        let links = self.discover_links(&document, page_url, depth);

        PageAnalysis { page, items, links }
    }
}
