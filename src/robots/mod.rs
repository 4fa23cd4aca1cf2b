//! Robots.txt handling module
//!
//! This module fetches and parses robots.txt files. Every failure path is
//! fail-open: an unreachable or unreadable robots.txt yields an empty rule set.

mod parser;

pub use parser::RobotsRules;

use crate::url::robots_url;
use reqwest::Client;
use std::time::Duration;
use url::Url;

/// Fetches and parses robots.txt for the origin of `url`
///
/// # Arguments
///
/// * `client` - The HTTP client to use
/// * `url` - Any URL on the host
/// * `agent` - The crawler identity matched against `User-agent` groups
/// * `timeout` - Request timeout for the robots.txt fetch
///
/// # Returns
///
/// The parsed rules, or [`RobotsRules::allow_all`] when the request fails or
/// returns a non-success status.
pub async fn fetch_robots(
    client: &Client,
    url: &Url,
    agent: &str,
    timeout: Duration,
) -> RobotsRules {
    let Some(robots) = robots_url(url) else {
        return RobotsRules::allow_all();
    };

    let response = match client.get(robots.as_str()).timeout(timeout).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::warn!("Failed to fetch {}: {}; allowing all paths", robots, e);
            return RobotsRules::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!(
            "robots.txt at {} returned HTTP {}; allowing all paths",
            robots,
            response.status().as_u16()
        );
        return RobotsRules::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            let rules = RobotsRules::parse(&body, agent);
            tracing::debug!("Loaded {} disallow rules from {}", rules.len(), robots);
            rules
        }
        Err(e) => {
            tracing::warn!("Failed to read {}: {}; allowing all paths", robots, e);
            RobotsRules::allow_all()
        }
    }
}
