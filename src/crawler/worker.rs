//! Crawl worker loop
//!
//! Each worker repeatedly takes the shallowest entry from the shared
//! frontier, claims it, fetches it, scores and extracts it, persists any
//! matches and feeds the discovered links back into the frontier. Workers
//! share everything in [`CrawlContext`] except their content fingerprints.

use crate::content::{ContentFingerprints, ContentProcessor, PageAnalysis};
use crate::crawler::coordinator::StopReason;
use crate::crawler::eligibility::EligibilityFilter;
use crate::crawler::fetcher::{FetchResult, Fetcher};
use crate::crawler::frontier::{Dequeued, Frontier, FrontierEntry};
use crate::crawler::VisitedRegistry;
use crate::output::{CrawlStats, JsonResultSink};
use crate::state::WorkerState;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// How long a worker waits on an empty frontier before re-checking stop conditions
pub const POLL_TIMEOUT: Duration = Duration::from_millis(500);

/// Log a progress line every this many processed URLs
const PROGRESS_INTERVAL: u64 = 100;

/// State shared by every worker of one crawl
pub struct CrawlContext {
    pub frontier: Arc<Frontier>,
    pub visited: Arc<VisitedRegistry>,
    pub filter: EligibilityFilter,
    pub fetcher: Fetcher,
    pub processor: ContentProcessor,
    pub sink: Arc<JsonResultSink>,
    pub stats: Arc<CrawlStats>,
    pub cancel: CancellationToken,
    pub max_depth: u32,
}

pub struct CrawlWorker {
    id: usize,
    ctx: Arc<CrawlContext>,
    deadline: Instant,
    started: Instant,
    state: WorkerState,
    fingerprints: ContentFingerprints,
}

impl CrawlWorker {
    pub fn new(id: usize, ctx: Arc<CrawlContext>, started: Instant, deadline: Instant) -> Self {
        Self {
            id,
            ctx,
            deadline,
            started,
            state: WorkerState::Idle,
            fingerprints: ContentFingerprints::new(),
        }
    }

    pub fn state(&self) -> WorkerState {
        self.state
    }

    /// Runs until the deadline, cancellation or frontier exhaustion
    pub async fn run(mut self) -> StopReason {
        tracing::debug!("Worker {} started", self.id);

        let reason = loop {
            if self.ctx.cancel.is_cancelled() {
                break StopReason::Cancelled;
            }
            if Instant::now() >= self.deadline {
                break StopReason::Deadline;
            }

            let dequeued = tokio::select! {
                _ = self.ctx.cancel.cancelled() => break StopReason::Cancelled,
                dequeued = self.ctx.frontier.dequeue(POLL_TIMEOUT) => dequeued,
            };

            match dequeued {
                Dequeued::Entry(entry) => {
                    self.process(entry).await;
                    self.ctx.frontier.complete();
                }
                Dequeued::Empty => continue,
                Dequeued::Exhausted => break StopReason::Exhausted,
            }
        };

        self.transition(WorkerState::Stopped);
        tracing::debug!("Worker {} stopped: {}", self.id, reason);
        reason
    }

    /// Handles one dequeued entry, returning to `Idle` afterwards
    pub async fn process(&mut self, entry: FrontierEntry) {
        let ctx = Arc::clone(&self.ctx);

        if entry.depth > ctx.max_depth {
            tracing::trace!("Discarding {} at depth {}", entry.url, entry.depth);
            ctx.stats.record_skipped();
            return;
        }

        let Some(url) = ctx.filter.check(entry.url.as_str()).await else {
            ctx.stats.record_skipped();
            return;
        };

        if !ctx.visited.try_claim(url.as_str()) {
            tracing::trace!("Already claimed: {}", url);
            ctx.stats.record_skipped();
            return;
        }

        self.transition(WorkerState::Fetching);
        let result = ctx.fetcher.fetch(&url).await;
        self.record_processed();

        let (final_url, body) = match result {
            FetchResult::Success {
                final_url, body, ..
            } => (final_url, body),
            FetchResult::ClientError { status_code } => {
                tracing::info!("Skipping {}: HTTP {}", url, status_code);
                return self.fail();
            }
            FetchResult::ContentMismatch { content_type } => {
                tracing::debug!("Skipping {}: content type {}", url, content_type);
                return self.fail();
            }
            FetchResult::Failed { error, attempts } => {
                tracing::warn!(
                    "Giving up on {} after {} attempts: {}",
                    url,
                    attempts,
                    error
                );
                return self.fail();
            }
        };

        // The redirect target is the page actually scored; claim it too so a
        // later link to it is not fetched again
        if final_url != url && !ctx.visited.try_claim(final_url.as_str()) {
            tracing::debug!("{} redirected to already claimed {}", url, final_url);
            ctx.stats.record_skipped();
            self.transition(WorkerState::Idle);
            return;
        }

        self.transition(WorkerState::Scoring);

        let (id, state) = (self.id, &mut self.state);
        let PageAnalysis { items, links, .. } = ctx.processor.analyze_with(
            &body,
            &final_url,
            entry.depth,
            &mut self.fingerprints,
            || advance(id, state, WorkerState::Extracting),
        );

        if !items.is_empty() {
            match ctx.sink.append(&items).await {
                Ok(written) => {
                    ctx.stats.record_matches(written as u64);
                    tracing::info!("Saved {} matching blocks from {}", written, final_url);
                }
                Err(e) => {
                    tracing::error!(
                        "Failed to save {} results from {}: {}",
                        items.len(),
                        final_url,
                        e
                    );
                }
            }
        }

        self.transition(WorkerState::Enqueuing);
        let child_depth = entry.depth + 1;
        for link in links {
            if ctx.visited.contains(link.as_str()) {
                continue;
            }
            if let Some(url) = ctx.filter.check(link.as_str()).await {
                ctx.frontier.enqueue(FrontierEntry::new(url, child_depth));
                ctx.stats.record_link_enqueued();
            }
        }

        self.transition(WorkerState::Idle);
    }

    fn fail(&mut self) {
        self.ctx.stats.record_fetch_failure();
        self.transition(WorkerState::Idle);
    }

    fn record_processed(&self) {
        let processed = self.ctx.stats.record_processed();
        if processed % PROGRESS_INTERVAL == 0 {
            let elapsed = self.started.elapsed().as_secs_f64();
            tracing::info!(
                "Progress: {} URLs processed, {} matches, {} in frontier, {:.2} URLs/sec",
                processed,
                self.ctx.stats.matches(),
                self.ctx.frontier.len(),
                processed as f64 / elapsed.max(f64::EPSILON)
            );
        }
    }

    fn transition(&mut self, next: WorkerState) {
        advance(self.id, &mut self.state, next);
    }
}

/// Moves a worker's state, logging the step
fn advance(id: usize, state: &mut WorkerState, next: WorkerState) {
    if !state.can_transition_to(next) {
        tracing::warn!("Worker {}: unexpected transition {} -> {}", id, state, next);
    }
    tracing::trace!("Worker {}: {} -> {}", id, state, next);
    *state = next;
}
