//! Integration tests for the crawler
//!
//! The scripted tests drive the engine through `StaticFetcher` and a
//! comma-separated link format; the web tests use wiremock to serve HTML
//! and run the full HTTP crawl cycle end-to-end.

use std::collections::HashSet;
use std::time::{Duration, Instant};
use tidepool::config::parse_config;
use tidepool::crawler::{crawl, web_coordinator, Coordinator, StaticFetcher};
use tidepool::{Content, Location, TerminationMode};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Hard ceiling for any single crawl in these tests
const CRAWL_DEADLINE: Duration = Duration::from_secs(10);

fn loc(raw: &str) -> Location {
    Location::new(raw).unwrap()
}

/// Content bodies list outgoing locations separated by commas
fn comma_links(content: &Content) -> Vec<Location> {
    content
        .body()
        .split(',')
        .filter_map(|part| Location::new(part).ok())
        .collect()
}

type LinkFn = fn(&Content) -> Vec<Location>;

fn scripted(fetcher: StaticFetcher) -> Coordinator<StaticFetcher, LinkFn> {
    Coordinator::new(fetcher, comma_links as LinkFn)
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_small_graph_is_fully_crawled() {
    let fetcher = StaticFetcher::new()
        .page(loc("A"), "B,C")
        .page(loc("B"), "C")
        .page(loc("C"), "");
    let coordinator = scripted(fetcher);
    coordinator.seed(["A"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(2, Duration::from_millis(100)),
    )
    .await
    .expect("crawl did not terminate")
    .expect("crawl failed");

    let snapshot = results.snapshot();
    assert_eq!(snapshot.len(), 3);
    assert_eq!(snapshot[&loc("A")].body(), "B,C");
    assert_eq!(snapshot[&loc("B")].body(), "C");
    assert_eq!(snapshot[&loc("C")].body(), "");

    let fetcher = coordinator.fetcher();
    assert_eq!(fetcher.calls(&loc("A")), 1);
    assert_eq!(fetcher.calls(&loc("B")), 1);
    assert_eq!(fetcher.calls(&loc("C")), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failed_fetch_leaves_empty_result() {
    let fetcher = StaticFetcher::new().failure(loc("X"));
    let coordinator = scripted(fetcher);
    coordinator.seed(["X"]).unwrap();

    let started = Instant::now();
    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(1, Duration::from_millis(100)),
    )
    .await
    .expect("crawl did not terminate")
    .expect("a failed fetch must not abort the crawl");

    assert!(results.is_empty());
    assert!(started.elapsed() < Duration::from_millis(200));
    assert_eq!(coordinator.fetcher().calls(&loc("X")), 1);

    let stats = coordinator.statistics();
    assert_eq!(stats.failed, 1);
    assert_eq!(stats.fetched, 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_failure_does_not_stop_siblings() {
    let fetcher = StaticFetcher::new()
        .page(loc("root"), "ok-1,broken,ok-2")
        .page(loc("ok-1"), "")
        .page(loc("ok-2"), "")
        .failure(loc("broken"));
    let coordinator = scripted(fetcher);
    coordinator.seed(["root"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(3, Duration::from_millis(100)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(
        results.sorted_locations(),
        vec![loc("ok-1"), loc("ok-2"), loc("root")]
    );
    assert!(results.get(&loc("broken")).is_none());
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_cycles_terminate() {
    let fetcher = StaticFetcher::new()
        .page(loc("A"), "B")
        .page(loc("B"), "C")
        .page(loc("C"), "A,B");
    let coordinator = scripted(fetcher);
    coordinator.seed(["A"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(4, Duration::from_millis(100)),
    )
    .await
    .expect("cyclic graph must still terminate")
    .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(coordinator.fetcher().max_calls_per_location(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_reseeding_is_idempotent() {
    let fetcher = StaticFetcher::new().page(loc("A"), "");
    let coordinator = scripted(fetcher);

    assert_eq!(coordinator.seed(["A"]).unwrap(), 1);
    assert_eq!(coordinator.seed(["A"]).unwrap(), 0);
    assert_eq!(coordinator.frontier_size(), 1);

    let results = coordinator.run(2, Duration::from_millis(100)).await.unwrap();

    assert_eq!(results.len(), 1);
    assert_eq!(coordinator.fetcher().calls(&loc("A")), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_many_seeds_each_fetched_once() {
    let mut fetcher = StaticFetcher::new().delay(Duration::from_millis(1));
    let seeds: Vec<String> = (0..100).map(|i| format!("seed-{}", i)).collect();
    for (i, seed) in seeds.iter().enumerate() {
        // Every seed also links to its neighbour, so admission races happen
        let neighbour = format!("seed-{}", (i + 1) % seeds.len());
        fetcher = fetcher.page(loc(seed), neighbour);
    }
    let coordinator = scripted(fetcher);
    assert_eq!(coordinator.seed(&seeds).unwrap(), 100);

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(5, Duration::from_millis(200)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(results.len(), 100);
    let fetcher = coordinator.fetcher();
    assert_eq!(fetcher.total_calls(), 100);
    assert_eq!(fetcher.max_calls_per_location(), 1);

    let stored: HashSet<_> = results.snapshot().into_keys().collect();
    let expected: HashSet<_> = seeds.iter().map(|s| loc(s)).collect();
    assert_eq!(stored, expected);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_discovery_while_others_idle() {
    // One slow page discovers more work after the other workers have gone idle
    let fetcher = StaticFetcher::new()
        .delay(Duration::from_millis(150))
        .page(loc("slow"), "late-1,late-2")
        .page(loc("late-1"), "")
        .page(loc("late-2"), "");
    let coordinator = scripted(fetcher);
    coordinator.seed(["slow"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(4, Duration::from_millis(20)),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(results.len(), 3);
    assert_eq!(coordinator.frontier_size(), 0);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idle_timeout_mode_crawls_graph() {
    let fetcher = StaticFetcher::new()
        .page(loc("A"), "B,C")
        .page(loc("B"), "D")
        .page(loc("C"), "D")
        .page(loc("D"), "");
    let coordinator = scripted(fetcher).with_termination(TerminationMode::IdleTimeout);
    coordinator.seed(["A"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(3, Duration::from_millis(300)),
    )
    .await
    .expect("idle-timeout crawl did not terminate")
    .unwrap();

    assert_eq!(results.len(), 4);
    assert_eq!(coordinator.fetcher().max_calls_per_location(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idle_timeout_mode_failures_finish_within_timeout() {
    let idle_timeout = Duration::from_millis(250);
    let fetcher = StaticFetcher::new()
        .failure(loc("X"))
        .failure(loc("Y"));
    let coordinator = scripted(fetcher).with_termination(TerminationMode::IdleTimeout);
    coordinator.seed(["X", "Y"]).unwrap();

    let started = Instant::now();
    let results = tokio::time::timeout(CRAWL_DEADLINE, coordinator.run(2, idle_timeout))
        .await
        .expect("crawl did not terminate")
        .unwrap();
    let elapsed = started.elapsed();

    assert!(results.is_empty());
    assert!(
        elapsed < idle_timeout * 2,
        "took {:?} with an idle timeout of {:?}",
        elapsed,
        idle_timeout
    );
    assert_eq!(coordinator.statistics().failed, 2);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_idle_timeout_mode_survives_fetches_slower_than_timeout() {
    // Idle workers are marked long before the slow pages finish; popping the
    // pages they discover must clear those marks again.
    let fetcher = StaticFetcher::new()
        .delay_for(loc("A"), Duration::from_millis(120))
        .delay_for(loc("S"), Duration::from_millis(300))
        .page(loc("A"), "S")
        .page(loc("S"), "T1,T2")
        .page(loc("T1"), "")
        .page(loc("T2"), "");
    let coordinator = scripted(fetcher).with_termination(TerminationMode::IdleTimeout);
    coordinator.seed(["A"]).unwrap();

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(3, Duration::from_millis(50)),
    )
    .await
    .expect("crawl did not terminate")
    .unwrap();

    assert_eq!(
        results.sorted_locations(),
        vec![loc("A"), loc("S"), loc("T1"), loc("T2")]
    );
    assert_eq!(coordinator.frontier_size(), 0);
    assert_eq!(coordinator.fetcher().max_calls_per_location(), 1);
}

#[tokio::test]
async fn test_empty_seed_set_finishes_with_empty_result() {
    let coordinator = scripted(StaticFetcher::new()).with_termination(TerminationMode::IdleTimeout);

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(3, Duration::from_millis(50)),
    )
    .await
    .unwrap()
    .unwrap();

    assert!(results.is_empty());
}

/// Mounts an HTML page at `route`
async fn mount_page(server: &MockServer, route: &str, body: String) {
    Mock::given(method("GET"))
        .and(path(route))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_string(body)
                .insert_header("content-type", "text/html"),
        )
        .mount(server)
        .await;
}

fn web_config(seed: &str, termination: &str) -> tidepool::Config {
    parse_config(&format!(
        r#"
[crawler]
workers = 3
idle-timeout-ms = 200
termination = "{}"

[fetch]
user-agent = "TestBot/1.0"
request-timeout-ms = 2000

[seeds]
urls = ["{}"]
"#,
        termination, seed
    ))
    .expect("test config should be valid")
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_full_web_crawl() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        format!(
            r#"<html><head><title>Home</title></head><body>
            <a href="{}/page1">Page 1</a>
            <a href="/page2#section">Page 2</a>
            <a href="mailto:someone@example.com">Mail</a>
            </body></html>"#,
            base_url
        ),
    )
    .await;
    mount_page(
        &mock_server,
        "/page1",
        r#"<html><body>Content 1 <a href="/">Home</a> <a href="/missing">Gone</a></body></html>"#
            .to_string(),
    )
    .await;
    mount_page(
        &mock_server,
        "/page2",
        r#"<html><body>Content 2 <a href="page1">Again</a></body></html>"#.to_string(),
    )
    .await;
    // Anything else is a 404 from wiremock

    let config = web_config(&format!("{}/", base_url), "in-flight");
    let results = tokio::time::timeout(CRAWL_DEADLINE, crawl(&config))
        .await
        .expect("web crawl did not terminate")
        .expect("web crawl failed");

    let locations: Vec<String> = results
        .sorted_locations()
        .iter()
        .map(|l| l.to_string())
        .collect();
    assert_eq!(
        locations,
        vec![
            format!("{}/", base_url),
            format!("{}/page1", base_url),
            format!("{}/page2", base_url),
        ]
    );

    let page1 = results
        .get(&Location::parse_url(&format!("{}/page1", base_url)).unwrap())
        .unwrap();
    assert!(page1.body().contains("Content 1"));
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_web_crawl_records_failures() {
    let mock_server = MockServer::start().await;
    let base_url = mock_server.uri();

    mount_page(
        &mock_server,
        "/",
        r#"<html><body><a href="/broken">Broken</a></body></html>"#.to_string(),
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/broken"))
        .respond_with(ResponseTemplate::new(500))
        .mount(&mock_server)
        .await;

    let config = web_config(&format!("{}/", base_url), "idle-timeout");
    let coordinator = web_coordinator(&config).unwrap();
    assert_eq!(coordinator.termination(), TerminationMode::IdleTimeout);

    let results = tokio::time::timeout(
        CRAWL_DEADLINE,
        coordinator.run(config.crawler.workers, config.crawler.idle_timeout()),
    )
    .await
    .unwrap()
    .unwrap();

    assert_eq!(results.len(), 1);
    let stats = coordinator.statistics();
    assert_eq!(stats.fetched, 1);
    assert_eq!(stats.failed, 1);
}
