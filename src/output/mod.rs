//! Output module for crawl results and reports
//!
//! This module handles:
//! - Persisting matched content blocks to the JSON results file
//! - Counting crawl progress across workers
//! - Printing the completion report

mod sink;
pub mod stats;

pub use sink::{JsonResultSink, SinkError};
pub use stats::{print_report, CrawlStats};
