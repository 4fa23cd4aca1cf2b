//! Crawler coordinator - main crawl orchestration logic
//!
//! This module wires the shared crawl state together and drives a run:
//! - Building the HTTP client, politeness gate, fetcher and result sink
//! - Seeding the frontier through the eligibility filter
//! - Spawning the worker pool and a periodic status monitor
//! - Enforcing the deadline and the shutdown grace period
//! - Producing the completion report

use crate::config::{validate, Config};
use crate::content::ContentProcessor;
use crate::crawler::eligibility::EligibilityFilter;
use crate::crawler::fetcher::{build_http_client, Fetcher};
use crate::crawler::frontier::{Frontier, FrontierEntry};
use crate::crawler::retry::RetryPolicy;
use crate::crawler::worker::{CrawlContext, CrawlWorker};
use crate::crawler::{DomainPolicyGate, VisitedRegistry};
use crate::output::{CrawlStats, JsonResultSink};
use crate::search::SearchClient;
use crate::CrawlError;
use reqwest::Client;
use std::fmt;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinSet;
use tokio::time::Instant;
use tokio_util::sync::CancellationToken;

/// Why a crawl ended
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StopReason {
    /// The configured wall-clock budget ran out
    Deadline,
    /// An external stop signal was received
    Cancelled,
    /// The frontier ran dry with no entry in flight
    Exhausted,
    /// No seed URL survived the eligibility filter
    NoSeeds,
}

impl StopReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Deadline => "deadline reached",
            Self::Cancelled => "cancelled",
            Self::Exhausted => "frontier exhausted",
            Self::NoSeeds => "no seed URLs",
        }
    }
}

impl fmt::Display for StopReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Summary of a finished crawl
#[derive(Debug, Clone, PartialEq)]
pub struct CrawlReport {
    pub urls_processed: u64,
    pub matches_found: u64,
    pub fetch_failures: u64,
    pub skipped: u64,
    pub links_enqueued: u64,
    pub stop_reason: StopReason,
    /// Whether every worker exited before the grace period ran out
    pub drained: bool,
    pub elapsed: Duration,
}

/// Main crawler coordinator structure
pub struct Coordinator {
    config: Arc<Config>,
    client: Client,
    ctx: Arc<CrawlContext>,
}

impl Coordinator {
    /// Creates a coordinator with its own HTTP client
    ///
    /// # Arguments
    ///
    /// * `config` - The crawler configuration
    /// * `keyword` - The keyword pages are scored against
    ///
    /// # Returns
    ///
    /// * `Ok(Coordinator)` - Successfully created coordinator
    /// * `Err(CrawlError)` - The HTTP client could not be built
    pub fn new(config: Config, keyword: &str) -> Result<Self, CrawlError> {
        let client = build_http_client(&config.user_agent)?;
        Ok(Self::with_client(config, keyword, client))
    }

    /// Creates a coordinator around an existing HTTP client
    pub fn with_client(config: Config, keyword: &str, client: Client) -> Self {
        let crawler = &config.crawler;

        let gate = Arc::new(DomainPolicyGate::new(
            client.clone(),
            config.user_agent.crawler_name.clone(),
            crawler.politeness_delay(),
            Duration::from_millis(config.fetch.robots_timeout_ms),
        ));
        let visited = Arc::new(VisitedRegistry::new());
        let filter = EligibilityFilter::new(
            Arc::clone(&visited),
            Arc::clone(&gate),
            crawler.respect_robots_txt,
        );
        let fetcher = Fetcher::new(
            client.clone(),
            gate,
            RetryPolicy::from_config(crawler, &config.fetch),
        );

        let ctx = CrawlContext {
            frontier: Arc::new(Frontier::new()),
            visited,
            filter,
            fetcher,
            processor: ContentProcessor::new(keyword, crawler),
            sink: Arc::new(JsonResultSink::new(&config.output.results_path)),
            stats: Arc::new(CrawlStats::new()),
            cancel: CancellationToken::new(),
            max_depth: crawler.max_depth,
        };

        Self {
            config: Arc::new(config),
            client,
            ctx: Arc::new(ctx),
        }
    }

    /// Replaces the stop signal, e.g. with one wired to Ctrl-C
    ///
    /// Must be called before [`Coordinator::run`].
    pub fn with_cancellation(mut self, cancel: CancellationToken) -> Self {
        if let Some(ctx) = Arc::get_mut(&mut self.ctx) {
            ctx.cancel = cancel;
        }
        self
    }

    pub fn cancellation_token(&self) -> CancellationToken {
        self.ctx.cancel.clone()
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    pub fn client(&self) -> &Client {
        &self.client
    }

    pub fn frontier(&self) -> &Frontier {
        &self.ctx.frontier
    }

    pub fn visited(&self) -> &VisitedRegistry {
        &self.ctx.visited
    }

    pub fn stats(&self) -> &CrawlStats {
        &self.ctx.stats
    }

    /// Enqueues every eligible seed at `depth`, returning how many were accepted
    pub async fn add_seeds(&self, seeds: &[String], depth: u32) -> usize {
        let mut accepted = 0;

        for seed in seeds {
            match self.ctx.filter.check(seed.trim()).await {
                Some(url) => {
                    tracing::debug!("Seeding {} at depth {}", url, depth);
                    self.ctx.frontier.enqueue(FrontierEntry::new(url, depth));
                    accepted += 1;
                }
                None => tracing::debug!("Ignoring ineligible seed {}", seed),
            }
        }

        accepted
    }

    /// Runs the crawl to completion
    ///
    /// Workers stop at the deadline, on cancellation, or when the frontier
    /// is exhausted. Workers still running after the grace period are
    /// aborted and the report records that they did not drain.
    pub async fn run(self) -> CrawlReport {
        let crawler = &self.config.crawler;
        let started = Instant::now();

        if self.ctx.frontier.is_empty() {
            tracing::warn!("No eligible seed URLs; nothing to crawl");
            return self.report(StopReason::NoSeeds, true, started.elapsed());
        }

        let deadline = instant_after(started, crawler.timeout());
        tracing::info!(
            "Starting crawl for '{}': {} workers, max depth {}, {} seeds, timeout {}s",
            self.ctx.processor.keyword(),
            crawler.max_workers,
            crawler.max_depth,
            self.ctx.frontier.len(),
            crawler.timeout_secs
        );

        let monitor = (crawler.status_interval_secs > 0).then(|| {
            tokio::spawn(status_monitor(
                Arc::clone(&self.ctx),
                started,
                Duration::from_secs(crawler.status_interval_secs),
            ))
        });

        let mut workers = JoinSet::new();
        for id in 0..crawler.max_workers as usize {
            let worker = CrawlWorker::new(id, Arc::clone(&self.ctx), started, deadline);
            workers.spawn(worker.run());
        }

        let grace = crawler.shutdown_grace();
        let shutdown = tokio::time::sleep_until(instant_after(deadline, grace));
        tokio::pin!(shutdown);

        let cancel = self.ctx.cancel.clone();
        let cancelled_grace = async move {
            cancel.cancelled().await;
            tokio::time::sleep(grace).await;
        };
        tokio::pin!(cancelled_grace);

        let mut exhausted = false;
        loop {
            tokio::select! {
                joined = workers.join_next() => match joined {
                    Some(Ok(reason)) => exhausted |= reason == StopReason::Exhausted,
                    Some(Err(e)) => tracing::error!("Worker task failed: {}", e),
                    None => break,
                },
                _ = &mut shutdown => break,
                _ = &mut cancelled_grace => break,
            }
        }

        let drained = workers.is_empty();
        if !drained {
            tracing::warn!(
                "{} workers still running after the {}s grace period; aborting them",
                workers.len(),
                grace.as_secs()
            );
            workers.shutdown().await;
        }

        if let Some(monitor) = monitor {
            monitor.abort();
        }

        let stop_reason = if self.ctx.cancel.is_cancelled() {
            StopReason::Cancelled
        } else if exhausted {
            StopReason::Exhausted
        } else {
            StopReason::Deadline
        };

        let report = self.report(stop_reason, drained, started.elapsed());
        tracing::info!(
            "Crawl finished ({}): {} URLs processed, {} matches in {:.1}s",
            report.stop_reason,
            report.urls_processed,
            report.matches_found,
            report.elapsed.as_secs_f64()
        );
        report
    }

    fn report(&self, stop_reason: StopReason, drained: bool, elapsed: Duration) -> CrawlReport {
        let stats = &self.ctx.stats;
        CrawlReport {
            urls_processed: stats.processed(),
            matches_found: stats.matches(),
            fetch_failures: stats.fetch_failures(),
            skipped: stats.skipped(),
            links_enqueued: stats.links_enqueued(),
            stop_reason,
            drained,
            elapsed,
        }
    }
}

/// Logs a status line every `period` until aborted
async fn status_monitor(ctx: Arc<CrawlContext>, started: Instant, period: Duration) {
    let mut ticker = tokio::time::interval_at(started + period, period);

    loop {
        ticker.tick().await;
        let elapsed = started.elapsed().as_secs_f64();
        let processed = ctx.stats.processed();
        tracing::info!(
            "Status: {} URLs processed in {:.0}s ({:.2} URLs/sec), {} matches, {} in frontier",
            processed,
            elapsed,
            processed as f64 / elapsed.max(f64::EPSILON),
            ctx.stats.matches(),
            ctx.frontier.len()
        );
    }
}

fn instant_after(start: Instant, duration: Duration) -> Instant {
    // Saturate absurdly large budgets instead of overflowing
    start
        .checked_add(duration)
        .unwrap_or_else(|| start + Duration::from_secs(60 * 60 * 24 * 365))
}

/// Runs a complete crawl for `keyword`
///
/// Configured seed URLs enter the frontier at depth 0. When none are
/// configured, the search service is asked for seeds, which enter at
/// depth 1. An invalid configuration is rejected before anything is fetched.
///
/// # Arguments
///
/// * `config` - The crawler configuration
/// * `keyword` - The keyword pages are scored against
/// * `cancel` - External stop signal
///
/// # Example
///
/// ```no_run
/// use focus_crawl::config::load_config;
/// use focus_crawl::crawler::run_crawl;
/// use std::path::Path;
/// use tokio_util::sync::CancellationToken;
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = load_config(Path::new("crawl.toml"))?;
/// let report = run_crawl(config, "election", CancellationToken::new()).await?;
/// println!("{} matches", report.matches_found);
/// # Ok(())
/// # }
/// ```
pub async fn run_crawl(
    config: Config,
    keyword: &str,
    cancel: CancellationToken,
) -> Result<CrawlReport, CrawlError> {
    validate(&config)?;
    let coordinator = Coordinator::new(config, keyword)?.with_cancellation(cancel);

    let configured = coordinator.config().seeds.urls.clone();
    let seeded = if configured.is_empty() {
        tracing::info!("No seed URLs configured; querying the search service");
        let search = SearchClient::from_config(
            coordinator.client().clone(),
            &coordinator.config().search,
        );
        let hits: Vec<String> = search
            .search(keyword)
            .await
            .into_iter()
            .map(|hit| hit.url)
            .collect();
        coordinator.add_seeds(&hits, 1).await
    } else {
        coordinator.add_seeds(&configured, 0).await
    };
    tracing::info!("Seeded frontier with {} URLs", seeded);

    Ok(coordinator.run().await)
}
