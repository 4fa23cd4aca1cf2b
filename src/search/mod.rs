//! Seed discovery through a web search API
//!
//! Used only when no seed URLs are configured. The client speaks the Google
//! Custom Search JSON API (`q`, `key` and `cx` query parameters, results in
//! `items[].link`). Every failure is logged and yields no seeds; the crawl
//! then reports that it had nothing to do.

use crate::config::SearchConfig;
use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;

/// Search errors
#[derive(Debug, Error)]
pub enum SearchError {
    #[error("Missing search credential: environment variable {0} is not set")]
    MissingCredential(String),

    #[error("Search request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Search service returned HTTP {0}")]
    Status(u16),
}

/// One search result
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct SearchHit {
    #[serde(rename = "link")]
    pub url: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub snippet: String,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    #[serde(default)]
    items: Vec<SearchHit>,
}

pub struct SearchClient {
    client: Client,
    endpoint: String,
    api_key: Result<String, String>,
    engine_id: Result<String, String>,
}

impl SearchClient {
    /// Creates a client with explicit credentials
    pub fn new(
        client: Client,
        endpoint: impl Into<String>,
        api_key: impl Into<String>,
        engine_id: impl Into<String>,
    ) -> Self {
        Self {
            client,
            endpoint: endpoint.into(),
            api_key: Ok(api_key.into()),
            engine_id: Ok(engine_id.into()),
        }
    }

    /// Creates a client reading credentials from the configured environment variables
    pub fn from_config(client: Client, config: &SearchConfig) -> Self {
        Self {
            client,
            endpoint: config.endpoint.clone(),
            api_key: read_env(&config.api_key_env),
            engine_id: read_env(&config.engine_id_env),
        }
    }

    /// Searches for `keyword`, returning an empty list on any failure
    pub async fn search(&self, keyword: &str) -> Vec<SearchHit> {
        match self.try_search(keyword).await {
            Ok(hits) => {
                tracing::info!("Search for '{}' returned {} results", keyword, hits.len());
                hits
            }
            Err(e) => {
                tracing::warn!("Seed search for '{}' failed: {}", keyword, e);
                Vec::new()
            }
        }
    }

    pub async fn try_search(&self, keyword: &str) -> Result<Vec<SearchHit>, SearchError> {
        let api_key = self
            .api_key
            .as_ref()
            .map_err(|var| SearchError::MissingCredential(var.clone()))?;
        let engine_id = self
            .engine_id
            .as_ref()
            .map_err(|var| SearchError::MissingCredential(var.clone()))?;

        let response = self
            .client
            .get(&self.endpoint)
            .query(&[
                ("q", keyword),
                ("key", api_key.as_str()),
                ("cx", engine_id.as_str()),
            ])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(SearchError::Status(response.status().as_u16()));
        }

        let body: SearchResponse = response.json().await?;
        Ok(body.items)
    }
}

/// Reads a non-empty environment variable, keeping its name as the error
fn read_env(name: &str) -> Result<String, String> {
    match std::env::var(name) {
        Ok(value) if !value.trim().is_empty() => Ok(value),
        _ => Err(name.to_string()),
    }
}
