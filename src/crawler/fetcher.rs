//! HTTP fetcher implementation
//!
//! This module handles all page requests for the crawler, including:
//! - Building the HTTP client with the crawler's user agent
//! - Waiting on the politeness gate before every attempt
//! - Retrying transient failures with growing timeouts and linear backoff
//! - Rejecting client errors and non-HTML responses without retrying
//!
//! No fetch failure is fatal: every outcome is a [`FetchResult`] and the
//! worker skips the URL when it is not a success.

use crate::config::UserAgentConfig;
use crate::crawler::retry::{classify_error, classify_status, FailureKind, RetryPolicy};
use crate::crawler::DomainPolicyGate;
use reqwest::header::CONTENT_TYPE;
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use url::Url;

/// Result of a fetch operation
#[derive(Debug)]
pub enum FetchResult {
    /// Successfully fetched an HTML page
    Success {
        /// Final URL after redirects
        final_url: Url,
        /// HTTP status code
        status_code: u16,
        /// Page body
        body: String,
        /// Attempts used, including the successful one
        attempts: u32,
    },

    /// HTTP 4xx or an unfollowed 3xx, never retried
    ClientError {
        /// The HTTP status code
        status_code: u16,
    },

    /// Response is not HTML, never retried
    ContentMismatch {
        /// The Content-Type received
        content_type: String,
    },

    /// Retries exhausted, or a transport error that cannot succeed on retry
    Failed {
        /// Description of the last error
        error: String,
        /// Attempts made
        attempts: u32,
    },
}

impl FetchResult {
    pub fn is_success(&self) -> bool {
        matches!(self, FetchResult::Success { .. })
    }

    /// Number of requests this fetch sent
    pub fn attempts(&self) -> u32 {
        match self {
            FetchResult::Success { attempts, .. } | FetchResult::Failed { attempts, .. } => {
                *attempts
            }
            FetchResult::ClientError { .. } | FetchResult::ContentMismatch { .. } => 1,
        }
    }
}

/// Outcome of a single attempt
enum Attempt {
    Done(FetchResult),
    Retry(String),
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use focus_crawl::config::UserAgentConfig;
/// use focus_crawl::crawler::build_http_client;
///
/// let config = UserAgentConfig {
///     crawler_name: "FocusCrawl".to_string(),
///     crawler_version: "1.0".to_string(),
///     contact_url: Some("https://example.com/about".to_string()),
/// };
///
/// let client = build_http_client(&config).unwrap();
/// ```
pub fn build_http_client(config: &UserAgentConfig) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.header_value())
        .connect_timeout(Duration::from_secs(10))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Retrying page fetcher
pub struct Fetcher {
    client: Client,
    gate: Arc<DomainPolicyGate>,
    policy: RetryPolicy,
}

impl Fetcher {
    pub fn new(client: Client, gate: Arc<DomainPolicyGate>, policy: RetryPolicy) -> Self {
        Self {
            client,
            gate,
            policy,
        }
    }

    pub fn policy(&self) -> &RetryPolicy {
        &self.policy
    }

    /// Fetches a URL with full error handling and retry logic
    ///
    /// # Retry Logic
    ///
    /// | Condition | Action |
    /// |-----------|--------|
    /// | HTTP 4xx | Immediate → ClientError |
    /// | Non-HTML Content-Type | Immediate → ContentMismatch |
    /// | HTTP 5xx | Retry up to `max_retries` times |
    /// | Timeout / connection error | Retry up to `max_retries` times |
    /// | Redirect loop | Immediate → Failed |
    ///
    /// Attempt `n` (zero-based) waits `n × backoff`, then on the politeness
    /// gate, and runs with a timeout of `base + n × step`.
    pub async fn fetch(&self, url: &Url) -> FetchResult {
        let max_attempts = self.policy.max_attempts();
        let mut last_error = String::new();

        for attempt in 0..max_attempts {
            let backoff = self.policy.backoff_before(attempt);
            if !backoff.is_zero() {
                tokio::time::sleep(backoff).await;
            }

            self.gate.throttle(url).await;

            match self.attempt(url, attempt).await {
                Attempt::Done(result) => return result,
                Attempt::Retry(error) => {
                    tracing::warn!(
                        "Attempt {}/{} for {} failed: {}",
                        attempt + 1,
                        max_attempts,
                        url,
                        error
                    );
                    last_error = error;
                }
            }
        }

        FetchResult::Failed {
            error: last_error,
            attempts: max_attempts,
        }
    }

    async fn attempt(&self, url: &Url, attempt: u32) -> Attempt {
        let timeout = self.policy.timeout_for(attempt);

        let response = match self.client.get(url.as_str()).timeout(timeout).send().await {
            Ok(response) => response,
            Err(e) => {
                return match classify_error(&e) {
                    FailureKind::Retryable => Attempt::Retry(describe_error(&e)),
                    FailureKind::Terminal => Attempt::Done(FetchResult::Failed {
                        error: describe_error(&e),
                        attempts: attempt + 1,
                    }),
                };
            }
        };

        let status = response.status();
        match classify_status(status) {
            None => {}
            Some(FailureKind::Terminal) => {
                tracing::debug!("{} returned HTTP {}", url, status.as_u16());
                return Attempt::Done(FetchResult::ClientError {
                    status_code: status.as_u16(),
                });
            }
            Some(FailureKind::Retryable) => {
                return Attempt::Retry(format!("HTTP {}", status.as_u16()));
            }
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(content_type) = content_type {
            if !is_html(&content_type) {
                tracing::debug!("{} is not HTML ({})", url, content_type);
                return Attempt::Done(FetchResult::ContentMismatch { content_type });
            }
        }

        let final_url = response.url().clone();
        match response.text().await {
            Ok(body) => Attempt::Done(FetchResult::Success {
                final_url,
                status_code: status.as_u16(),
                body,
                attempts: attempt + 1,
            }),
            Err(e) => Attempt::Retry(describe_error(&e)),
        }
    }
}

/// Checks a Content-Type header value for an HTML media type
pub fn is_html(content_type: &str) -> bool {
    let media_type = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    media_type == "text/html" || media_type == "application/xhtml+xml"
}

fn describe_error(error: &reqwest::Error) -> String {
    if error.is_timeout() {
        "Request timeout".to_string()
    } else if error.is_connect() {
        format!("Connection failed: {}", error)
    } else {
        error.to_string()
    }
}
