//! URL handling module for Focus-Crawl
//!
//! This module provides link normalization, binary-resource detection, and
//! host extraction used to key per-domain state.

mod filter;
mod normalize;

use url::Url;

// Re-export main functions
pub use filter::{is_binary_resource, syntactic_check};
pub use normalize::{normalize_link, strip_fragment};

/// Extracts the lowercase host used as the per-domain state key
///
/// Ports are ignored so every port of a host shares one politeness clock.
///
/// ```
/// use url::Url;
/// use focus_crawl::url::host_key;
///
/// let url = Url::parse("https://News.Example.com:8443/story").unwrap();
/// assert_eq!(host_key(&url), Some("news.example.com".to_string()));
/// ```
pub fn host_key(url: &Url) -> Option<String> {
    url.host_str().map(|h| h.to_lowercase())
}

/// Builds the robots.txt URL for the origin of `url`
pub fn robots_url(url: &Url) -> Option<Url> {
    let mut robots = url.clone();
    robots.host_str()?;
    robots.set_path("/robots.txt");
    robots.set_query(None);
    robots.set_fragment(None);
    Some(robots)
}
