//! Relevance scoring heuristic
//!
//! The weights below are part of the output contract: result files written
//! by different builds must stay comparable.

/// Weight of each keyword occurrence in the page text
pub const OCCURRENCE_WEIGHT: f64 = 0.5;
/// Bonus when the title contains the keyword
pub const TITLE_BONUS: f64 = 5.0;
/// Bonus when the URL contains the keyword
pub const URL_BONUS: f64 = 3.0;
/// Bonus when any h1-h3 heading contains the keyword
pub const HEADING_BONUS: f64 = 2.0;
/// Multiplier for long pages
pub const LONG_PAGE_MULTIPLIER: f64 = 1.2;
/// Plain-text length (in characters) above which a page counts as long
pub const LONG_PAGE_THRESHOLD: usize = 2000;

/// Inputs to the relevance heuristic for one page
#[derive(Debug, Clone, Copy)]
pub struct PageSignals<'a> {
    pub text: &'a str,
    pub title: Option<&'a str>,
    pub url: &'a str,
    pub headings: &'a [String],
}

/// Counts case-insensitive occurrences of `keyword` in `text`
///
/// Overlapping matches are counted, so "aaa" contains "aa" twice.
pub fn count_occurrences(text: &str, keyword: &str) -> usize {
    let keyword = keyword.to_lowercase();
    if keyword.is_empty() {
        return 0;
    }

    let haystack = text.to_lowercase();
    let mut count = 0;
    let mut start = 0;
    while let Some(pos) = haystack[start..].find(&keyword) {
        count += 1;
        // Advance by one character so overlapping matches are found
        let match_start = start + pos;
        start = match_start
            + haystack[match_start..]
                .chars()
                .next()
                .map_or(1, char::len_utf8);
    }
    count
}

/// Case-insensitive substring test
pub fn contains_keyword(text: &str, keyword: &str) -> bool {
    !keyword.is_empty() && text.to_lowercase().contains(&keyword.to_lowercase())
}

/// Computes the relevance score of a page
///
/// `score = (0.5 × occurrences + 5.0·[title] + 3.0·[url] + 2.0·[heading])`,
/// multiplied by 1.2 when the text is longer than 2000 characters.
///
/// # Example
///
/// ```
/// use focus_crawl::content::{relevance_score, PageSignals};
///
/// let text = "election ".repeat(4);
/// let signals = PageSignals {
///     text: &text,
///     title: Some("Election night"),
///     url: "https://example.com/politics",
///     headings: &[],
/// };
/// assert_eq!(relevance_score(&signals, "election"), 7.0);
/// ```
pub fn relevance_score(signals: &PageSignals<'_>, keyword: &str) -> f64 {
    let mut score = count_occurrences(signals.text, keyword) as f64 * OCCURRENCE_WEIGHT;

    if signals
        .title
        .map_or(false, |title| contains_keyword(title, keyword))
    {
        score += TITLE_BONUS;
    }

    if contains_keyword(signals.url, keyword) {
        score += URL_BONUS;
    }

    if signals
        .headings
        .iter()
        .any(|heading| contains_keyword(heading, keyword))
    {
        score += HEADING_BONUS;
    }

    if signals.text.chars().count() > LONG_PAGE_THRESHOLD {
        score *= LONG_PAGE_MULTIPLIER;
    }

    score
}
