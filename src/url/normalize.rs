use crate::UrlError;
use url::Url;

/// Normalizes a discovered link into its canonical crawl form
///
/// # Normalization Steps
///
/// 1. Parse the URL; reject if malformed
/// 2. Accept only `http` and `https`
/// 3. Require a host
/// 4. Remove the query string
/// 5. Remove the fragment
///
/// Host lowercasing, default-port elision and dot-segment removal are done by
/// the `url` parser itself, so the serialized form is
/// `scheme://host[:port]/path`.
///
/// # Examples
///
/// ```
/// use focus_crawl::url::normalize_link;
///
/// let url = normalize_link("HTTP://Example.COM:80/a/../news?id=3#top").unwrap();
/// assert_eq!(url.as_str(), "http://example.com/news");
/// ```
pub fn normalize_link(url_str: &str) -> Result<Url, UrlError> {
    let mut url = Url::parse(url_str.trim()).map_err(|e| UrlError::Parse(e.to_string()))?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return Err(UrlError::InvalidScheme(url.scheme().to_string()));
    }

    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlError::MissingHost);
    }

    url.set_query(None);
    url.set_fragment(None);

    Ok(url)
}

/// Returns the URL text before the first `#`, if it has a fragment
pub fn strip_fragment(url_str: &str) -> Option<&str> {
    url_str.split_once('#').map(|(base, _)| base)
}
