use crate::crawler::{DomainPolicyGate, VisitedRegistry};
use crate::url::{strip_fragment, syntactic_check};
use std::sync::Arc;
use url::Url;

/// Frontier admission predicate, applied to seeds and discovered links alike
///
/// A URL passes when it is syntactically crawlable, its fragment-stripped
/// base (if it had a fragment) has not been visited, and robots.txt allows
/// it. The robots check can be switched off by configuration.
#[derive(Clone)]
pub struct EligibilityFilter {
    visited: Arc<VisitedRegistry>,
    gate: Arc<DomainPolicyGate>,
    respect_robots: bool,
}

impl EligibilityFilter {
    pub fn new(
        visited: Arc<VisitedRegistry>,
        gate: Arc<DomainPolicyGate>,
        respect_robots: bool,
    ) -> Self {
        Self {
            visited,
            gate,
            respect_robots,
        }
    }

    /// Returns the parsed URL when it may enter the frontier
    ///
    /// Rejections are routine and only logged at trace level.
    pub async fn check(&self, url_str: &str) -> Option<Url> {
        let Some(url) = syntactic_check(url_str) else {
            tracing::trace!("Rejected {}: not a crawlable URL", url_str);
            return None;
        };

        if let Some(base) = strip_fragment(url_str) {
            if self.visited.contains(base) {
                tracing::trace!("Rejected {}: base already visited", url_str);
                return None;
            }
        }

        if self.respect_robots && !self.gate.is_allowed(&url).await {
            tracing::debug!("Rejected {}: disallowed by robots.txt", url_str);
            return None;
        }

        Some(url)
    }
}
