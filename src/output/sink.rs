//! JSON result sink
//!
//! All matches live in one pretty-printed JSON array. Each append reads the
//! whole array, extends it and writes it back under a single lock, so
//! concurrent appends are serialized and the file always holds the union of
//! every successful batch. The rewrite goes through a sibling temporary file
//! and a rename, so a reader never sees a half-written array.

use crate::content::ScoredContentItem;
use serde::Serialize;
use serde_json::ser::PrettyFormatter;
use serde_json::Value;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tokio::sync::Mutex;

/// Result sink errors
#[derive(Debug, Error)]
pub enum SinkError {
    #[error("Failed to access results file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Results file is not a JSON array: {0}")]
    Json(#[from] serde_json::Error),
}

pub struct JsonResultSink {
    path: PathBuf,
    lock: Mutex<()>,
}

impl JsonResultSink {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            lock: Mutex::new(()),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Appends a batch of items, returning how many were written
    ///
    /// On error nothing is written and the batch is lost; the existing file
    /// is left as it was.
    pub async fn append(&self, items: &[ScoredContentItem]) -> Result<usize, SinkError> {
        if items.is_empty() {
            return Ok(0);
        }

        let _guard = self.lock.lock().await;

        let mut collection = self.read_collection().await?;
        for item in items {
            collection.push(serde_json::to_value(item)?);
        }

        self.write_collection(&collection).await?;
        tracing::debug!(
            "Wrote {} results ({} total) to {}",
            items.len(),
            collection.len(),
            self.path.display()
        );

        Ok(items.len())
    }

    /// Reads every stored item
    pub async fn read_all(&self) -> Result<Vec<ScoredContentItem>, SinkError> {
        let _guard = self.lock.lock().await;
        let collection = self.read_collection().await?;
        collection
            .into_iter()
            .map(|value| serde_json::from_value(value).map_err(SinkError::from))
            .collect()
    }

    async fn read_collection(&self) -> Result<Vec<Value>, SinkError> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(e.into()),
        };

        if bytes.iter().all(u8::is_ascii_whitespace) {
            return Ok(Vec::new());
        }

        Ok(serde_json::from_slice(&bytes)?)
    }

    async fn write_collection(&self, collection: &[Value]) -> Result<(), SinkError> {
        let mut buffer = Vec::new();
        let formatter = PrettyFormatter::with_indent(b"    ");
        let mut serializer = serde_json::Serializer::with_formatter(&mut buffer, formatter);
        collection.serialize(&mut serializer)?;

        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                tokio::fs::create_dir_all(parent).await?;
            }
        }

        let temp_path = self.temp_path();
        tokio::fs::write(&temp_path, &buffer).await?;
        tokio::fs::rename(&temp_path, &self.path).await?;

        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(|n| n.to_os_string())
            .unwrap_or_else(|| "results.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn item(url: &str, content: &str) -> ScoredContentItem {
        ScoredContentItem {
            url: url.to_string(),
            title: "Title".to_string(),
            text_snippet: content.to_string(),
            publication_date: "Unknown Date".to_string(),
            author: "Unknown Author".to_string(),
            relevance_score: 6.5,
            crawl_depth: 1,
            crawl_timestamp: 1_700_000_000_000,
        }
    }

    #[tokio::test]
    async fn test_append_creates_file_and_dirs() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("results.json");
        let sink = JsonResultSink::new(&path);

        let written = sink.append(&[item("https://a.example/", "one")]).await.unwrap();
        assert_eq!(written, 1);
        assert!(path.exists());

        let stored = sink.read_all().await.unwrap();
        assert_eq!(stored, vec![item("https://a.example/", "one")]);
    }

    #[tokio::test]
    async fn test_appends_accumulate_in_order() {
        let dir = TempDir::new().unwrap();
        let sink = JsonResultSink::new(dir.path().join("results.json"));

        sink.append(&[item("https://a.example/", "one")]).await.unwrap();
        sink.append(&[
            item("https://b.example/", "two"),
            item("https://b.example/", "three"),
        ])
        .await
        .unwrap();

        let stored = sink.read_all().await.unwrap();
        let contents: Vec<&str> = stored.iter().map(|i| i.text_snippet.as_str()).collect();
        assert_eq!(contents, vec!["one", "two", "three"]);
    }

    #[tokio::test]
    async fn test_empty_batch_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let sink = JsonResultSink::new(&path);

        assert_eq!(sink.append(&[]).await.unwrap(), 0);
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_four_space_layout() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        let sink = JsonResultSink::new(&path);

        sink.append(&[item("https://a.example/", "one")]).await.unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.starts_with("[\n    {\n        \""));
        assert!(text.contains("\"crawl_time\": 1700000000000"));
        assert!(!dir.path().join("results.json.tmp").exists());
    }

    #[tokio::test]
    async fn test_blank_existing_file_treated_as_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "  \n").unwrap();
        let sink = JsonResultSink::new(&path);

        sink.append(&[item("https://a.example/", "one")]).await.unwrap();
        assert_eq!(sink.read_all().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_corrupt_file_left_untouched() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("results.json");
        std::fs::write(&path, "{ not json").unwrap();
        let sink = JsonResultSink::new(&path);

        let result = sink.append(&[item("https://a.example/", "one")]).await;
        assert!(matches!(result, Err(SinkError::Json(_))));
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "{ not json");
    }
}
