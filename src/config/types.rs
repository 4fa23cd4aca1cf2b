use serde::Deserialize;
use std::time::Duration;

/// Main configuration structure for Focus-Crawl
///
/// Every section is optional; a missing section takes its defaults.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub crawler: CrawlerConfig,
    pub fetch: FetchConfig,
    #[serde(rename = "user-agent")]
    pub user_agent: UserAgentConfig,
    pub output: OutputConfig,
    pub seeds: SeedConfig,
    pub search: SearchConfig,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Number of parallel crawl workers
    #[serde(rename = "max-workers")]
    pub max_workers: u32,

    /// Wall-clock budget for the whole crawl (seconds)
    #[serde(rename = "timeout-secs")]
    pub timeout_secs: u64,

    /// Maximum depth to crawl from seed URLs
    #[serde(rename = "max-depth")]
    pub max_depth: u32,

    /// Minimum time between requests to the same host (milliseconds)
    #[serde(rename = "politeness-delay-ms")]
    pub politeness_delay_ms: u64,

    /// Retries after the first attempt for transient failures
    #[serde(rename = "max-retries")]
    pub max_retries: u32,

    /// Pages scoring below this contribute no results
    #[serde(rename = "min-relevance-score")]
    pub min_relevance_score: f64,

    /// Cap on outbound links collected from one page
    #[serde(rename = "max-links-per-page")]
    pub max_links_per_page: usize,

    /// Whether robots.txt rules gate frontier admission
    #[serde(rename = "respect-robots-txt")]
    pub respect_robots_txt: bool,

    /// How long shutdown waits for workers after the deadline (seconds)
    #[serde(rename = "shutdown-grace-secs")]
    pub shutdown_grace_secs: u64,

    /// Interval of the periodic status log (seconds, 0 disables it)
    #[serde(rename = "status-interval-secs")]
    pub status_interval_secs: u64,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_workers: 5,
            timeout_secs: 600,
            max_depth: 3,
            politeness_delay_ms: 1000,
            max_retries: 2,
            min_relevance_score: 1.0,
            max_links_per_page: 50,
            respect_robots_txt: true,
            shutdown_grace_secs: 5,
            status_interval_secs: 30,
        }
    }
}

impl CrawlerConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn politeness_delay(&self) -> Duration {
        Duration::from_millis(self.politeness_delay_ms)
    }

    pub fn shutdown_grace(&self) -> Duration {
        Duration::from_secs(self.shutdown_grace_secs)
    }
}

/// HTTP fetch timing configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct FetchConfig {
    /// Timeout of the first attempt (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Added to the timeout for every further attempt (milliseconds)
    #[serde(rename = "timeout-step-ms")]
    pub timeout_step_ms: u64,

    /// Sleep between attempts, multiplied by the attempt number (milliseconds)
    #[serde(rename = "retry-backoff-ms")]
    pub retry_backoff_ms: u64,

    /// Timeout for robots.txt requests (milliseconds)
    #[serde(rename = "robots-timeout-ms")]
    pub robots_timeout_ms: u64,
}

impl Default for FetchConfig {
    fn default() -> Self {
        Self {
            request_timeout_ms: 10_000,
            timeout_step_ms: 5_000,
            retry_backoff_ms: 1_000,
            robots_timeout_ms: 3_000,
        }
    }
}

/// User agent identification configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct UserAgentConfig {
    /// Name of the crawler, also the token matched against robots.txt groups
    #[serde(rename = "crawler-name")]
    pub crawler_name: String,

    /// Version of the crawler
    #[serde(rename = "crawler-version")]
    pub crawler_version: String,

    /// URL with information about the crawler
    #[serde(rename = "contact-url")]
    pub contact_url: Option<String>,
}

impl Default for UserAgentConfig {
    fn default() -> Self {
        Self {
            crawler_name: "FocusCrawl".to_string(),
            crawler_version: "1.0".to_string(),
            contact_url: None,
        }
    }
}

impl UserAgentConfig {
    /// Formats the User-Agent header sent with every request
    ///
    /// Format: `Mozilla/5.0 (compatible; Name/Version[; +ContactURL])`
    pub fn header_value(&self) -> String {
        match &self.contact_url {
            Some(contact) => format!(
                "Mozilla/5.0 (compatible; {}/{}; +{})",
                self.crawler_name, self.crawler_version, contact
            ),
            None => format!(
                "Mozilla/5.0 (compatible; {}/{})",
                self.crawler_name, self.crawler_version
            ),
        }
    }
}

/// Output configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct OutputConfig {
    /// Path to the JSON results file
    #[serde(rename = "results-path")]
    pub results_path: String,
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            results_path: "output/results.json".to_string(),
        }
    }
}

/// Directly configured seed URLs
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeedConfig {
    pub urls: Vec<String>,
}

/// Seed-discovery search API configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SearchConfig {
    /// Search endpoint accepting `q`, `key` and `cx` query parameters
    pub endpoint: String,

    /// Environment variable holding the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// Environment variable holding the search engine id
    #[serde(rename = "engine-id-env")]
    pub engine_id_env: String,
}

impl Default for SearchConfig {
    fn default() -> Self {
        Self {
            endpoint: "https://www.googleapis.com/customsearch/v1".to_string(),
            api_key_env: "GOOGLE_API_KEY".to_string(),
            engine_id_env: "GOOGLE_SEARCH_ENGINE_ID".to_string(),
        }
    }
}
