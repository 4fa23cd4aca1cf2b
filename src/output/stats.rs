//! Crawl statistics
//!
//! This module provides the shared counters workers update during a crawl
//! and the formatted report printed when it finishes.

use crate::crawler::CrawlReport;
use std::sync::atomic::{AtomicU64, Ordering};

/// Process-wide crawl counters
///
/// Owned by the coordinator and shared with every worker.
#[derive(Debug, Default)]
pub struct CrawlStats {
    /// URLs claimed and fetched
    processed: AtomicU64,

    /// Result items persisted
    matches: AtomicU64,

    /// Fetches that ended in a terminal failure
    fetch_failures: AtomicU64,

    /// Dequeued entries discarded before fetching
    skipped: AtomicU64,

    /// Discovered links admitted to the frontier
    links_enqueued: AtomicU64,
}

impl CrawlStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Counts a processed URL and returns the new total
    pub fn record_processed(&self) -> u64 {
        self.processed.fetch_add(1, Ordering::Relaxed) + 1
    }

    pub fn record_matches(&self, count: u64) {
        self.matches.fetch_add(count, Ordering::Relaxed);
    }

    pub fn record_fetch_failure(&self) {
        self.fetch_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_skipped(&self) {
        self.skipped.fetch_add(1, Ordering::Relaxed);
    }

    pub fn record_link_enqueued(&self) {
        self.links_enqueued.fetch_add(1, Ordering::Relaxed);
    }

    pub fn processed(&self) -> u64 {
        self.processed.load(Ordering::Relaxed)
    }

    pub fn matches(&self) -> u64 {
        self.matches.load(Ordering::Relaxed)
    }

    pub fn fetch_failures(&self) -> u64 {
        self.fetch_failures.load(Ordering::Relaxed)
    }

    pub fn skipped(&self) -> u64 {
        self.skipped.load(Ordering::Relaxed)
    }

    pub fn links_enqueued(&self) -> u64 {
        self.links_enqueued.load(Ordering::Relaxed)
    }
}

/// Prints the completion report to stdout in a formatted manner
///
/// # Arguments
///
/// * `report` - The report returned by the coordinator
pub fn print_report(report: &CrawlReport) {
    println!("=== Crawl Report ===\n");

    println!("Overview:");
    println!("  URLs processed: {}", report.urls_processed);
    println!("  Matches found: {}", report.matches_found);
    println!("  Failed fetches: {}", report.fetch_failures);
    println!("  Skipped entries: {}", report.skipped);
    println!("  Links enqueued: {}", report.links_enqueued);
    println!();

    let elapsed = report.elapsed.as_secs_f64();
    let rate = if elapsed > 0.0 {
        report.urls_processed as f64 / elapsed
    } else {
        0.0
    };

    println!("Timing:");
    println!("  Elapsed: {:.1}s", elapsed);
    println!("  Rate: {:.2} URLs/sec", rate);
    println!();

    println!("Stop reason: {}", report.stop_reason);
    if report.drained {
        println!("All workers drained in time");
    } else {
        println!("Some workers were still running after the grace period");
    }
}
