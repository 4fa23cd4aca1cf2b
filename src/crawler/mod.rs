//! Crawler module for concurrent keyword-focused crawling
//!
//! This module contains the core crawling logic, including:
//! - The shared frontier and visited registry
//! - Per-host politeness and robots.txt enforcement
//! - HTTP fetching with retry logic
//! - The worker loop and overall crawl coordination

mod coordinator;
mod eligibility;
mod fetcher;
mod frontier;
mod policy;
mod retry;
mod visited;
mod worker;

pub use coordinator::{run_crawl, Coordinator, CrawlReport, StopReason};
pub use eligibility::EligibilityFilter;
pub use fetcher::{build_http_client, is_html, FetchResult, Fetcher};
pub use frontier::{Dequeued, Frontier, FrontierEntry};
pub use policy::DomainPolicyGate;
pub use retry::{classify_error, classify_status, FailureKind, RetryPolicy};
pub use visited::VisitedRegistry;
pub use worker::{CrawlContext, CrawlWorker, POLL_TIMEOUT};
