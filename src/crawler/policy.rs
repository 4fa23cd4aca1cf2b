//! Per-host politeness and robots.txt gate
//!
//! Every host gets one [`DomainState`], created on first sight and kept for
//! the rest of the run. The map itself is a `DashMap`, so workers targeting
//! different hosts never wait on each other; only the politeness sequence
//! for a single host is serialized.

use crate::robots::fetch_robots;
use crate::state::DomainState;
use crate::url::host_key;
use dashmap::DashMap;
use reqwest::Client;
use std::sync::Arc;
use std::time::{Duration, Instant};
use url::Url;

pub struct DomainPolicyGate {
    domains: DashMap<String, Arc<DomainState>>,
    client: Client,
    robots_agent: String,
    interval: Duration,
    robots_timeout: Duration,
}

impl DomainPolicyGate {
    /// Creates a gate
    ///
    /// `robots_agent` is the token matched against `User-agent` lines;
    /// `interval` is the minimum spacing between fetches to one host.
    pub fn new(
        client: Client,
        robots_agent: impl Into<String>,
        interval: Duration,
        robots_timeout: Duration,
    ) -> Self {
        Self {
            domains: DashMap::new(),
            client,
            robots_agent: robots_agent.into(),
            interval,
            robots_timeout,
        }
    }

    fn domain(&self, host: &str) -> Arc<DomainState> {
        // Clone the Arc so the shard lock is released before any await
        self.domains
            .entry(host.to_string())
            .or_default()
            .value()
            .clone()
    }

    /// Waits until the URL's host may be fetched again, then records the access
    ///
    /// Returns the admission instant, or `None` for URLs without a host.
    pub async fn throttle(&self, url: &Url) -> Option<Instant> {
        let host = host_key(url)?;
        let state = self.domain(&host);
        let admitted = state.admit(self.interval).await;
        tracing::trace!("Admitted request to {}", host);
        Some(admitted)
    }

    /// Checks the URL against its host's robots.txt rules
    ///
    /// The first call for a host fetches and caches the rules; failures
    /// leave an empty rule set, so the answer defaults to allowed.
    pub async fn is_allowed(&self, url: &Url) -> bool {
        let Some(host) = host_key(url) else {
            return true;
        };

        let state = self.domain(&host);
        let rules = state
            .robots_rules(|| {
                tracing::debug!("Fetching robots.txt for {}", host);
                fetch_robots(&self.client, url, &self.robots_agent, self.robots_timeout)
            })
            .await;

        rules.is_allowed(url.path())
    }

    pub fn interval(&self) -> Duration {
        self.interval
    }

    /// Number of hosts seen so far
    pub fn host_count(&self) -> usize {
        self.domains.len()
    }
}
