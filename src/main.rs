//! Focus-Crawl main entry point
//!
//! This is the command-line interface for the Focus-Crawl keyword crawler.

use anyhow::Context;
use clap::Parser;
use focus_crawl::config::{load_config_with_hash, validate, Config};
use focus_crawl::crawler::run_crawl;
use focus_crawl::output::print_report;
use std::path::PathBuf;
use tokio_util::sync::CancellationToken;
use tracing_subscriber::EnvFilter;

/// Focus-Crawl: a polite keyword-focused web crawler
///
/// Focus-Crawl expands breadth-first from seed URLs, scores every page
/// against a keyword, and saves matching content blocks to a JSON file,
/// while respecting robots.txt and per-host politeness delays.
#[derive(Parser, Debug)]
#[command(name = "focus-crawl")]
#[command(version = "1.0.0")]
#[command(about = "A polite keyword-focused web crawler", long_about = None)]
struct Cli {
    /// Keyword to score pages against
    #[arg(value_name = "KEYWORD")]
    keyword: String,

    /// Path to TOML configuration file (defaults are used when omitted)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Seed URL to start from (repeatable); added to configured seeds
    #[arg(long = "seed", value_name = "URL")]
    seeds: Vec<String>,

    /// Override the maximum crawl depth
    #[arg(long)]
    max_depth: Option<u32>,

    /// Override the crawl time budget in seconds
    #[arg(long)]
    timeout_secs: Option<u64>,

    /// Override the number of workers
    #[arg(long)]
    workers: Option<u32>,

    /// Override the results file path
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Increase logging verbosity (-v, -vv, -vvv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,

    /// Suppress non-error output
    #[arg(short, long, conflicts_with = "verbose")]
    quiet: bool,

    /// Validate config and show what would be crawled without actually crawling
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // Setup logging based on verbosity
    setup_logging(cli.verbose, cli.quiet);

    let keyword = cli.keyword.trim().to_string();
    if keyword.is_empty() {
        anyhow::bail!("Keyword cannot be empty");
    }

    let config = load_effective_config(&cli)?;

    if cli.dry_run {
        handle_dry_run(&config, &keyword);
        return Ok(());
    }

    handle_crawl(config, &keyword).await
}

/// Sets up the logging/tracing subscriber based on verbosity level
fn setup_logging(verbose: u8, quiet: bool) {
    let filter = if quiet {
        // Only show errors
        EnvFilter::new("error")
    } else {
        match verbose {
            0 => EnvFilter::new("focus_crawl=info,warn"),
            1 => EnvFilter::new("focus_crawl=debug,info"),
            2 => EnvFilter::new("focus_crawl=trace,debug"),
            _ => EnvFilter::new("trace"),
        }
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_thread_ids(false)
        .with_file(false)
        .init();
}

/// Loads the config file (if any) and applies command-line overrides
fn load_effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = match &cli.config {
        Some(path) => {
            tracing::info!("Loading configuration from: {}", path.display());
            let (config, hash) = load_config_with_hash(path)
                .with_context(|| format!("Failed to load configuration from {}", path.display()))?;
            tracing::info!("Configuration loaded successfully (hash: {})", hash);
            config
        }
        None => {
            tracing::info!("No configuration file given; using defaults");
            Config::default()
        }
    };

    config.seeds.urls.extend(cli.seeds.iter().cloned());
    if let Some(max_depth) = cli.max_depth {
        config.crawler.max_depth = max_depth;
    }
    if let Some(timeout_secs) = cli.timeout_secs {
        config.crawler.timeout_secs = timeout_secs;
    }
    if let Some(workers) = cli.workers {
        config.crawler.max_workers = workers;
    }
    if let Some(output) = &cli.output {
        config.output.results_path = output.display().to_string();
    }

    // Overrides go through the same checks as the file
    validate(&config).context("Invalid configuration")?;
    Ok(config)
}

/// Handles the --dry-run mode: shows the effective configuration
fn handle_dry_run(config: &Config, keyword: &str) {
    println!("=== Focus-Crawl Dry Run ===\n");

    println!("Keyword: {}\n", keyword);

    println!("Crawler Configuration:");
    println!("  Workers: {}", config.crawler.max_workers);
    println!("  Timeout: {}s", config.crawler.timeout_secs);
    println!("  Max depth: {}", config.crawler.max_depth);
    println!("  Politeness delay: {}ms", config.crawler.politeness_delay_ms);
    println!("  Max retries: {}", config.crawler.max_retries);
    println!(
        "  Min relevance score: {}",
        config.crawler.min_relevance_score
    );
    println!("  Max links per page: {}", config.crawler.max_links_per_page);
    println!("  Respect robots.txt: {}", config.crawler.respect_robots_txt);

    println!("\nFetch:");
    println!("  Request timeout: {}ms", config.fetch.request_timeout_ms);
    println!("  Timeout step: {}ms", config.fetch.timeout_step_ms);
    println!("  Retry backoff: {}ms", config.fetch.retry_backoff_ms);

    println!("\nUser Agent: {}", config.user_agent.header_value());

    println!("\nOutput: {}", config.output.results_path);

    if config.seeds.urls.is_empty() {
        println!(
            "\nNo seed URLs; would query {} for seeds",
            config.search.endpoint
        );
    } else {
        println!("\nSeed URLs ({}):", config.seeds.urls.len());
        for seed in &config.seeds.urls {
            println!("  - {}", seed);
        }
    }

    println!("\n✓ Configuration is valid");
}

/// Handles the main crawl operation
async fn handle_crawl(config: Config, keyword: &str) -> anyhow::Result<()> {
    let cancel = CancellationToken::new();

    let ctrl_c = cancel.clone();
    tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            tracing::warn!("Interrupt received; stopping workers");
            ctrl_c.cancel();
        }
    });

    tracing::info!(
        "Results will be written to {}",
        config.output.results_path
    );

    let report = run_crawl(config, keyword, cancel)
        .await
        .context("Crawl failed to start")?;

    print_report(&report);
    Ok(())
}
