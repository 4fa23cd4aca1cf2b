use dashmap::DashSet;

/// Set of URLs already claimed for processing
///
/// `try_claim` is the only URL-level dedup gate: exactly one caller wins
/// for a given URL, no matter how many workers race on it.
#[derive(Debug, Default)]
pub struct VisitedRegistry {
    urls: DashSet<String>,
}

impl VisitedRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records the URL, returning `true` only for the first caller
    pub fn try_claim(&self, url: &str) -> bool {
        self.urls.insert(url.to_string())
    }

    pub fn contains(&self, url: &str) -> bool {
        self.urls.contains(url)
    }

    pub fn len(&self) -> usize {
        self.urls.len()
    }

    pub fn is_empty(&self) -> bool {
        self.urls.is_empty()
    }
}
