use url::Url;

/// File extensions that never hold crawlable HTML
const BINARY_EXTENSIONS: &[&str] = &[
    // images
    "jpg", "jpeg", "png", "gif", "bmp", "webp",
    // audio
    "mp3", "wav",
    // video
    "mp4", "avi", "mov", "wmv", "flv",
    // documents
    "pdf", "doc", "docx", "xls", "xlsx", "ppt", "pptx",
    // archives
    "zip", "rar", "tar", "gz",
    // executables and images of disks
    "exe", "dmg", "iso", "bin",
];

/// Checks whether a URL string points at a binary file
///
/// The check is case-insensitive and looks at the final extension of the
/// URL text, the same way a suffix pattern over the whole URL would.
pub fn is_binary_resource(url_str: &str) -> bool {
    let lowered = url_str.to_ascii_lowercase();
    match lowered.rsplit_once('.') {
        Some((_, ext)) => BINARY_EXTENSIONS.contains(&ext),
        None => false,
    }
}

/// Applies the stateless part of the eligibility filter
///
/// Returns the parsed URL when the string is non-empty, parses, uses
/// `http`/`https`, has a host and is not a binary resource. Visited-state
/// and robots checks need shared crawl state and live in the crawler.
pub fn syntactic_check(url_str: &str) -> Option<Url> {
    if url_str.is_empty() {
        return None;
    }

    let url = Url::parse(url_str).ok()?;

    if url.scheme() != "http" && url.scheme() != "https" {
        return None;
    }

    url.host_str()?;

    if is_binary_resource(url_str) {
        return None;
    }

    Some(url)
}
