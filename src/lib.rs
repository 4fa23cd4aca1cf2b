//! Focus-Crawl: a keyword-focused, polite web crawler
//!
//! This crate implements a concurrent crawler that expands breadth-first from
//! seed URLs, scores every fetched page against a keyword, and persists the
//! matching content blocks to a JSON file, while respecting robots.txt and a
//! per-host politeness interval.

pub mod config;
pub mod content;
pub mod crawler;
pub mod output;
pub mod robots;
pub mod search;
pub mod state;
pub mod url;

use thiserror::Error;

/// Main error type for Focus-Crawl operations
#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing host in URL")]
    MissingHost,
}

/// Result type alias for Focus-Crawl operations
pub type Result<T> = std::result::Result<T, CrawlError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use config::Config;
pub use content::ScoredContentItem;
pub use crawler::{run_crawl, Coordinator, CrawlReport, StopReason};
pub use state::{DomainState, WorkerState};
pub use url::normalize_link;
