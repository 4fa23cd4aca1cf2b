//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! robots handling, retries, politeness and the full crawl cycle end-to-end.

use focus_crawl::config::{Config, CrawlerConfig, FetchConfig};
use focus_crawl::crawler::{
    Coordinator, DomainPolicyGate, EligibilityFilter, FetchResult, Fetcher, FrontierEntry,
    RetryPolicy, StopReason, VisitedRegistry,
};
use focus_crawl::output::JsonResultSink;
use focus_crawl::ScoredContentItem;
use reqwest::Client;
use std::collections::HashSet;
use std::path::Path;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tempfile::TempDir;
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration writing results to `results_path`
fn create_test_config(results_path: &Path, seeds: Vec<String>) -> Config {
    let mut config = Config::default();
    config.crawler = CrawlerConfig {
        max_workers: 1,
        timeout_secs: 20,
        max_depth: 1,
        politeness_delay_ms: 10, // Very short for testing
        max_retries: 2,
        min_relevance_score: 1.0,
        max_links_per_page: 50,
        respect_robots_txt: true,
        shutdown_grace_secs: 5,
        status_interval_secs: 0,
    };
    config.fetch = FetchConfig {
        request_timeout_ms: 5_000,
        timeout_step_ms: 500,
        retry_backoff_ms: 10,
        robots_timeout_ms: 1_000,
    };
    config.user_agent.crawler_name = "TestBot".to_string();
    config.output.results_path = results_path.display().to_string();
    config.seeds.urls = seeds;
    config
}

fn html(body: impl Into<String>) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(body.into(), "text/html")
}

fn test_gate(interval: Duration) -> Arc<DomainPolicyGate> {
    Arc::new(DomainPolicyGate::new(
        Client::new(),
        "TestBot",
        interval,
        Duration::from_secs(1),
    ))
}

fn test_fetcher(max_retries: u32) -> Fetcher {
    let policy = RetryPolicy {
        max_retries,
        base_timeout: Duration::from_secs(2),
        timeout_step: Duration::from_millis(100),
        backoff: Duration::from_millis(10),
    };
    Fetcher::new(Client::new(), test_gate(Duration::ZERO), policy)
}

async fn mount_robots(server: &MockServer, body: &str) {
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string(body))
        .mount(server)
        .await;
}

#[tokio::test]
async fn test_robots_disallow_enforced() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(
            ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private\n"),
        )
        .expect(1) // Cached for the rest of the run
        .mount(&server)
        .await;

    let filter = EligibilityFilter::new(
        Arc::new(VisitedRegistry::new()),
        test_gate(Duration::ZERO),
        true,
    );

    let base = server.uri();
    assert!(filter
        .check(&format!("{}/private/x", base))
        .await
        .is_none());
    assert!(filter.check(&format!("{}/public", base)).await.is_some());
    assert!(filter.check(&format!("{}/private", base)).await.is_none());
}

#[tokio::test]
async fn test_robots_group_for_other_agent_ignored() {
    let server = MockServer::start().await;
    mount_robots(
        &server,
        "User-agent: OtherBot\nDisallow: /\n\nUser-agent: TestBot\nDisallow: /drafts\n",
    )
    .await;

    let filter = EligibilityFilter::new(
        Arc::new(VisitedRegistry::new()),
        test_gate(Duration::ZERO),
        true,
    );

    let base = server.uri();
    assert!(filter.check(&format!("{}/news", base)).await.is_some());
    assert!(filter.check(&format!("{}/drafts/1", base)).await.is_none());
}

#[tokio::test]
async fn test_robots_failure_fails_open() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(500))
        .expect(1)
        .mount(&server)
        .await;

    let filter = EligibilityFilter::new(
        Arc::new(VisitedRegistry::new()),
        test_gate(Duration::ZERO),
        true,
    );

    assert!(filter
        .check(&format!("{}/private/x", server.uri()))
        .await
        .is_some());
    assert!(filter
        .check(&format!("{}/anything", server.uri()))
        .await
        .is_some());
}

#[tokio::test]
async fn test_server_error_retried_until_exhausted() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/flaky"))
        .respond_with(ResponseTemplate::new(503))
        .expect(3) // max_retries + 1
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/flaky", server.uri())).unwrap();
    let result = test_fetcher(2).fetch(&url).await;

    match result {
        FetchResult::Failed { attempts, error } => {
            assert_eq!(attempts, 3);
            assert!(error.contains("503"));
        }
        other => panic!("expected a terminal failure, got {:?}", other),
    }
}

#[tokio::test]
async fn test_not_found_attempted_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/missing"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/missing", server.uri())).unwrap();
    let result = test_fetcher(2).fetch(&url).await;

    assert!(matches!(result, FetchResult::ClientError { status_code: 404 }));
}

#[tokio::test]
async fn test_unfollowed_redirect_attempted_once() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/cached"))
        .respond_with(ResponseTemplate::new(304))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/cached", server.uri())).unwrap();
    let result = test_fetcher(2).fetch(&url).await;

    assert!(matches!(result, FetchResult::ClientError { status_code: 304 }));
    assert_eq!(result.attempts(), 1);
}

#[tokio::test]
async fn test_non_html_not_retried() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/data"))
        .respond_with(ResponseTemplate::new(200).set_body_raw("{}", "application/json"))
        .expect(1)
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/data", server.uri())).unwrap();
    let result = test_fetcher(2).fetch(&url).await;

    assert!(matches!(result, FetchResult::ContentMismatch { .. }));
}

#[tokio::test]
async fn test_recovers_after_transient_failure() {
    let server = MockServer::start().await;

    // First matching mock wins until it is used up
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(ResponseTemplate::new(503))
        .up_to_n_times(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/page"))
        .respond_with(html("<html><body><p>ok</p></body></html>"))
        .mount(&server)
        .await;

    let url = Url::parse(&format!("{}/page", server.uri())).unwrap();
    match test_fetcher(2).fetch(&url).await {
        FetchResult::Success {
            attempts,
            status_code,
            body,
            ..
        } => {
            assert_eq!(attempts, 2);
            assert_eq!(status_code, 200);
            assert!(body.contains("ok"));
        }
        other => panic!("expected success, got {:?}", other),
    }
}

#[tokio::test]
async fn test_politeness_spacing_across_workers() {
    let interval = Duration::from_millis(150);
    let gate = test_gate(interval);
    let url = Url::parse("http://polite.example.test/page").unwrap();

    let mut tasks = tokio::task::JoinSet::new();
    for _ in 0..4 {
        let gate = Arc::clone(&gate);
        let url = url.clone();
        tasks.spawn(async move { gate.throttle(&url).await.unwrap() });
    }

    let mut admissions: Vec<Instant> = Vec::new();
    while let Some(admitted) = tasks.join_next().await {
        admissions.push(admitted.unwrap());
    }
    admissions.sort();

    for pair in admissions.windows(2) {
        assert!(
            pair[1].duration_since(pair[0]) >= interval,
            "admissions only {:?} apart",
            pair[1].duration_since(pair[0])
        );
    }
}

#[tokio::test]
async fn test_concurrent_claims_single_winner() {
    let visited = Arc::new(VisitedRegistry::new());
    let mut tasks = tokio::task::JoinSet::new();

    for _ in 0..8 {
        let visited = Arc::clone(&visited);
        tasks.spawn(async move {
            (0..50)
                .filter(|i| visited.try_claim(&format!("https://example.com/{}", i)))
                .count()
        });
    }

    let mut total = 0;
    while let Some(won) = tasks.join_next().await {
        total += won.unwrap();
    }

    // Exactly one winner per URL
    assert_eq!(total, 50);
    assert_eq!(visited.len(), 50);
}

#[tokio::test]
async fn test_concurrent_appends_keep_union() {
    let dir = TempDir::new().unwrap();
    let sink = Arc::new(JsonResultSink::new(dir.path().join("results.json")));

    let mut tasks = tokio::task::JoinSet::new();
    for worker in 0..8 {
        let sink = Arc::clone(&sink);
        tasks.spawn(async move {
            let items: Vec<ScoredContentItem> = (0..5)
                .map(|i| ScoredContentItem {
                    url: format!("https://example.com/{}", worker),
                    title: "Title".to_string(),
                    text_snippet: format!("election block {}-{}", worker, i),
                    publication_date: "Unknown Date".to_string(),
                    author: "Unknown Author".to_string(),
                    relevance_score: 1.0,
                    crawl_depth: 0,
                    crawl_timestamp: 0,
                })
                .collect();
            sink.append(&items).await.unwrap()
        });
    }
    while let Some(written) = tasks.join_next().await {
        assert_eq!(written.unwrap(), 5);
    }

    let stored = sink.read_all().await.unwrap();
    assert_eq!(stored.len(), 40);

    let contents: HashSet<String> = stored.into_iter().map(|i| i.text_snippet).collect();
    assert_eq!(contents.len(), 40);
    assert!(contents.contains("election block 7-4"));
}

#[tokio::test]
async fn test_full_crawl_single_domain() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();
    let results_path = dir.path().join("out").join("results.json");

    mount_robots(&server, "User-agent: *\nDisallow: /private\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><head><title>Election coverage</title></head><body>
            <p>The election is near.</p>
            <p>Nothing to see here.</p>
            <a href="/a">A</a>
            <a href="/b?ref=home">B</a>
            <a href="/private/secret">Private</a>
            <a href="/report.pdf">Report</a>
            <a href="mailto:desk@example.com">Mail</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(
            r#"<html><head><title>Update</title>
            <meta name="author" content="Pat Doe">
            </head><body>
            <h1>Election update</h1>
            <p>The election is near.</p>
            <p>Turnout for the election was high.</p>
            <a href="/deep">Deeper</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/b"))
        .respond_with(html("<html><body><p>Weather today.</p></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    // Beyond the depth bound, disallowed, or binary: never fetched
    for never in ["/deep", "/private/secret", "/report.pdf"] {
        Mock::given(method("GET"))
            .and(path(never))
            .respond_with(html("<p>election</p>"))
            .expect(0)
            .mount(&server)
            .await;
    }

    let config = create_test_config(&results_path, vec![format!("{}/", base_url)]);
    let coordinator = Coordinator::new(config.clone(), "Election").unwrap();
    assert_eq!(coordinator.add_seeds(&config.seeds.urls, 0).await, 1);

    let report = coordinator.run().await;

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert!(report.drained);
    assert_eq!(report.urls_processed, 3);
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.fetch_failures, 0);
    // The shared paragraph on /a is a duplicate for the single worker
    assert_eq!(report.matches_found, 2);

    let text = std::fs::read_to_string(&results_path).unwrap();
    assert!(text.starts_with("[\n    {"));

    let items: Vec<ScoredContentItem> = serde_json::from_str(&text).unwrap();
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].url, format!("{}/", base_url));
    assert_eq!(items[0].title, "Election coverage");
    assert_eq!(items[0].text_snippet, "The election is near.");
    assert_eq!(items[0].crawl_depth, 0);
    assert_eq!(items[0].relevance_score, 6.0);
    assert_eq!(items[0].author, "Unknown Author");

    assert_eq!(items[1].url, format!("{}/a", base_url));
    assert_eq!(items[1].title, "Update");
    assert_eq!(items[1].text_snippet, "Turnout for the election was high.");
    assert_eq!(items[1].crawl_depth, 1);
    assert_eq!(items[1].relevance_score, 3.5);
    assert_eq!(items[1].author, "Pat Doe");
}

#[tokio::test]
async fn test_many_workers_fetch_each_page_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow:\n").await;

    // Every child links to every other child to provoke claim races
    let child_links: String = (0..12)
        .map(|i| format!(r#"<a href="/p{}">p{}</a>"#, i, i))
        .collect();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(format!(
            "<html><body><p>election hub</p>{}</body></html>",
            child_links
        )))
        .expect(1)
        .mount(&server)
        .await;

    for i in 0..12 {
        Mock::given(method("GET"))
            .and(path(format!("/p{}", i)))
            .respond_with(html(format!(
                "<html><body><p>page {}</p>{}</body></html>",
                i, child_links
            )))
            .expect(1)
            .mount(&server)
            .await;
    }

    let mut config = create_test_config(
        &dir.path().join("results.json"),
        vec![format!("{}/", base_url)],
    );
    config.crawler.max_workers = 4;
    config.crawler.max_depth = 2;
    config.crawler.politeness_delay_ms = 0;

    let coordinator = Coordinator::new(config.clone(), "election").unwrap();
    coordinator.add_seeds(&config.seeds.urls, 0).await;
    let report = coordinator.run().await;

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.urls_processed, 13);
    assert_eq!(report.fetch_failures, 0);
}

#[tokio::test]
async fn test_redirect_target_fetched_once() {
    let server = MockServer::start().await;
    let base_url = server.uri();
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\nDisallow:\n").await;

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<html><body><p>election desk</p>
            <a href="/old">Old</a>
            <a href="/new">New</a>
            </body></html>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;

    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(ResponseTemplate::new(302).insert_header("Location", "/new"))
        .expect(1)
        .mount(&server)
        .await;

    // Reached once through the redirect, never again through the direct link
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html("<html><body><p>Moved here.</p></body></html>"))
        .expect(1)
        .mount(&server)
        .await;

    let config = create_test_config(
        &dir.path().join("results.json"),
        vec![format!("{}/", base_url)],
    );
    let coordinator = Coordinator::new(config.clone(), "election").unwrap();
    coordinator.add_seeds(&config.seeds.urls, 0).await;
    let report = coordinator.run().await;

    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.urls_processed, 2);
    assert_eq!(report.links_enqueued, 2);
    assert_eq!(report.fetch_failures, 0);
    assert!(report.skipped >= 1);
}

#[tokio::test]
async fn test_entries_beyond_max_depth_never_fetched() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/too-deep"))
        .respond_with(html("<p>election</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let config = create_test_config(&dir.path().join("results.json"), vec![]);
    let coordinator = Coordinator::new(config, "election").unwrap();

    let url = Url::parse(&format!("{}/too-deep", server.uri())).unwrap();
    coordinator.frontier().enqueue(FrontierEntry::new(url, 5));

    let report = coordinator.run().await;
    assert_eq!(report.stop_reason, StopReason::Exhausted);
    assert_eq!(report.urls_processed, 0);
    assert_eq!(report.skipped, 1);
}

#[tokio::test]
async fn test_deadline_stops_crawl() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    mount_robots(&server, "User-agent: *\n").await;
    Mock::given(method("GET"))
        .and(path("/slow"))
        .respond_with(
            html(r#"<html><body><a href="/next">next</a></body></html>"#)
                .set_delay(Duration::from_millis(1500)),
        )
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/next"))
        .respond_with(html("<p>never reached</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(
        &dir.path().join("results.json"),
        vec![format!("{}/slow", server.uri())],
    );
    config.crawler.timeout_secs = 1;

    let coordinator = Coordinator::new(config.clone(), "election").unwrap();
    coordinator.add_seeds(&config.seeds.urls, 0).await;
    let report = coordinator.run().await;

    assert_eq!(report.stop_reason, StopReason::Deadline);
    assert!(report.drained);
    assert_eq!(report.urls_processed, 1);
}

#[tokio::test]
async fn test_cancelled_before_start() {
    let server = MockServer::start().await;
    let dir = TempDir::new().unwrap();

    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html("<p>election</p>"))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(
        &dir.path().join("results.json"),
        vec![format!("{}/", server.uri())],
    );
    config.crawler.respect_robots_txt = false;

    let coordinator = Coordinator::new(config.clone(), "election").unwrap();
    coordinator.add_seeds(&config.seeds.urls, 0).await;
    coordinator.cancellation_token().cancel();

    let report = coordinator.run().await;
    assert_eq!(report.stop_reason, StopReason::Cancelled);
    assert_eq!(report.urls_processed, 0);
    assert!(report.drained);
}
