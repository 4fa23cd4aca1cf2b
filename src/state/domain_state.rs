use crate::robots::RobotsRules;
use std::future::Future;
use std::time::{Duration, Instant};
use tokio::sync::{Mutex, OnceCell};

/// Tracks the shared state of one host during crawling
///
/// Created lazily on first encounter of a host and kept for the rest of the
/// run. The politeness clock sits behind its own async mutex so the
/// read-compute-sleep-update sequence is exclusive per host, while robots
/// rules are loaded at most once through a `OnceCell`.
#[derive(Debug, Default)]
pub struct DomainState {
    /// Time of the last admission through the politeness gate
    last_access: Mutex<Option<Instant>>,

    /// Robots rules for this host, set once
    robots: OnceCell<RobotsRules>,
}

impl DomainState {
    /// Creates a new DomainState with no recorded access and no rules
    pub fn new() -> Self {
        Self::default()
    }

    /// Waits out the politeness interval, then records a fresh access time
    ///
    /// Holding the host lock across the sleep means two callers racing on
    /// the same host never both compute from the same stale timestamp; the
    /// second one waits for the first to record its admission.
    ///
    /// # Returns
    ///
    /// The instant at which this caller was admitted
    pub async fn admit(&self, interval: Duration) -> Instant {
        let mut last_access = self.last_access.lock().await;

        if let Some(wait) = remaining_delay(*last_access, interval, Instant::now()) {
            tokio::time::sleep(wait).await;
        }

        let now = Instant::now();
        *last_access = Some(now);
        now
    }

    /// Returns the cached robots rules, loading them with `load` on first use
    ///
    /// Concurrent first callers share a single load.
    pub async fn robots_rules<F, Fut>(&self, load: F) -> &RobotsRules
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = RobotsRules>,
    {
        self.robots.get_or_init(load).await
    }

    /// Returns the robots rules if they have been loaded
    pub fn robots(&self) -> Option<&RobotsRules> {
        self.robots.get()
    }

    /// Whether robots.txt has been fetched (or failed open) for this host
    pub fn rules_loaded(&self) -> bool {
        self.robots.initialized()
    }
}

/// Calculates the time still to wait before the next admission
///
/// Returns None if a request can be made at `now`.
pub fn remaining_delay(
    last_access: Option<Instant>,
    interval: Duration,
    now: Instant,
) -> Option<Duration> {
    let last = last_access?;
    let elapsed = now.saturating_duration_since(last);
    if elapsed < interval {
        Some(interval - elapsed)
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const INTERVAL: Duration = Duration::from_millis(1000);

    #[test]
    fn test_no_previous_access() {
        assert!(remaining_delay(None, INTERVAL, Instant::now()).is_none());
    }

    #[test]
    fn test_remaining_delay() {
        let now = Instant::now();

        let wait = remaining_delay(Some(now), INTERVAL, now);
        assert_eq!(wait, Some(Duration::from_millis(1000)));

        let soon = now + Duration::from_millis(500);
        let wait = remaining_delay(Some(now), INTERVAL, soon);
        assert_eq!(wait, Some(Duration::from_millis(500)));

        let later = now + Duration::from_millis(1100);
        assert!(remaining_delay(Some(now), INTERVAL, later).is_none());
    }

    #[tokio::test]
    async fn test_first_admission_is_immediate() {
        let state = DomainState::new();
        let start = Instant::now();
        state.admit(Duration::from_millis(200)).await;
        assert!(start.elapsed() < Duration::from_millis(150));
    }

    #[tokio::test]
    async fn test_consecutive_admissions_spaced() {
        let state = DomainState::new();
        let interval = Duration::from_millis(100);

        let first = state.admit(interval).await;
        let second = state.admit(interval).await;

        assert!(second.duration_since(first) >= interval);
    }

    #[tokio::test]
    async fn test_robots_loaded_once() {
        let state = DomainState::new();
        assert!(!state.rules_loaded());
        assert!(state.robots().is_none());

        let rules = state
            .robots_rules(|| async { RobotsRules::parse("User-agent: *\nDisallow: /a", "Bot") })
            .await;
        assert!(!rules.is_allowed("/a/b"));

        // Second loader is never run
        let rules = state
            .robots_rules(|| async { RobotsRules::allow_all() })
            .await;
        assert!(!rules.is_allowed("/a/b"));
        assert!(state.rules_loaded());
    }
}
