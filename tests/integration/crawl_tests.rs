//! Integration tests for the crawler
//!
//! These tests use wiremock to create mock HTTP servers and test
//! the full crawl cycle end-to-end.

use sumi_audit::config::{Config, CrawlerConfig};
use sumi_audit::crawler::{build_http_client, crawl, CrawlResult, LinkStatus};
use sumi_audit::state::{CrawlState, VisitStatus};
use sumi_audit::url::page_key;
use sumi_audit::{AuditError, CrawlTarget};
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// Creates a test configuration crawling `seed` without delay
fn create_test_config(seed: &str, max_pages: u32) -> Config {
    let mut config = Config::default();
    config.target.website_url = Some(seed.to_string());
    config.crawler = CrawlerConfig {
        max_pages,
        request_timeout_ms: 2_000,
        crawl_delay_ms: 0,
        ..CrawlerConfig::default()
    };
    config
}

fn html(body: &str) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_raw(
        format!("<html><body>{}</body></html>", body),
        "text/html; charset=utf-8",
    )
}

async fn mount_page(server: &MockServer, page: &str, body: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(html(body))
        .mount(server)
        .await;
}

async fn run_crawl(seed: &str, max_pages: u32) -> Result<CrawlResult, AuditError> {
    let config = create_test_config(seed, max_pages);
    let client = build_http_client(&config.crawler).expect("client");
    let target = CrawlTarget::new(seed).expect("seed");
    crawl(&client, &target, &config).await
}

fn paths(result: &CrawlResult) -> Vec<String> {
    result.pages.iter().map(|p| p.url.path().to_string()).collect()
}

#[tokio::test]
async fn test_crawl_is_breadth_first() {
    let server = MockServer::start().await;
    mount_page(&server, "/", r#"<a href="/a">A</a><a href="/b">B</a>"#).await;
    mount_page(&server, "/a", r#"<a href="/c">C</a>"#).await;
    mount_page(&server, "/b", "").await;
    mount_page(&server, "/c", "").await;

    let result = run_crawl(&server.uri(), 100).await.unwrap();

    assert_eq!(paths(&result), vec!["/", "/a", "/b", "/c"]);
    let depths: Vec<u32> = result.pages.iter().map(|p| p.depth).collect();
    assert_eq!(depths, vec![0, 1, 1, 2]);
    assert_eq!(result.state, CrawlState::Done);
    assert!(!result.is_capped());
}

#[tokio::test]
async fn test_crawl_respects_page_cap() {
    let server = MockServer::start().await;
    let links: String = (1..=5)
        .map(|i| format!(r#"<a href="/p{}">P{}</a>"#, i, i))
        .collect();
    mount_page(&server, "/", &links).await;
    for i in 1..=5 {
        mount_page(&server, &format!("/p{}", i), "").await;
    }

    let result = run_crawl(&server.uri(), 3).await.unwrap();

    assert_eq!(result.pages.len(), 3);
    assert_eq!(result.visited.completed(), 3);
    assert_eq!(paths(&result), vec!["/", "/p1", "/p2"]);
    assert!(result.is_capped());
}

#[tokio::test]
async fn test_crawl_fetches_each_page_once() {
    let server = MockServer::start().await;

    // Cycle between / and /a, with fragment and query variants of /a
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(html(
            r#"<a href="/a">A</a><a href="/a#top">A again</a><a href="/a?ref=home">A with query</a>"#,
        ))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/a"))
        .respond_with(html(r#"<a href="/">Home</a><a href="/a">Self</a>"#))
        .expect(1)
        .mount(&server)
        .await;

    let result = run_crawl(&server.uri(), 100).await.unwrap();

    assert_eq!(paths(&result), vec!["/", "/a"]);
    assert_eq!(result.visited.len(), 2);
    assert_eq!(result.state, CrawlState::Done);
}

#[tokio::test]
async fn test_out_of_scope_links_not_crawled() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="https://external.example/page">Elsewhere</a><a href="mailto:hi@example.com">Mail</a>"#,
    )
    .await;

    let result = run_crawl(&server.uri(), 100).await.unwrap();

    assert_eq!(result.pages.len(), 1);
    assert_eq!(result.visited.len(), 1);
    assert_eq!(result.link_count(), 2);
}

#[tokio::test]
async fn test_non_html_page_marked_failed() {
    let server = MockServer::start().await;
    mount_page(
        &server,
        "/",
        r#"<a href="/report.pdf">Report</a><a href="/missing">Missing</a>"#,
    )
    .await;
    Mock::given(method("GET"))
        .and(path("/report.pdf"))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(b"%PDF-1.4".to_vec(), "application/pdf"),
        )
        .mount(&server)
        .await;

    let result = run_crawl(&server.uri(), 100).await.unwrap();
    let pdf = url::Url::parse(&format!("{}/report.pdf", server.uri())).unwrap();
    let missing = url::Url::parse(&format!("{}/missing", server.uri())).unwrap();

    assert_eq!(result.pages.len(), 1);
    assert_eq!(
        result.visited.status(&page_key(&pdf)),
        Some(VisitStatus::Failed)
    );
    assert_eq!(result.fetch_status(&pdf), Some(&LinkStatus::Ok(200)));
    assert_eq!(result.fetch_status(&missing), Some(&LinkStatus::Broken(404)));
    assert_eq!(result.visited.failed_count(), 2);
}

#[tokio::test]
async fn test_seed_unreachable_is_fatal() {
    let result = run_crawl("http://127.0.0.1:1", 10).await;

    assert!(matches!(
        result,
        Err(AuditError::SeedUnreachable { .. })
    ));
}

#[tokio::test]
async fn test_robots_disallow_when_enabled() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/robots.txt"))
        .respond_with(ResponseTemplate::new(200).set_body_string("User-agent: *\nDisallow: /private"))
        .mount(&server)
        .await;
    mount_page(
        &server,
        "/",
        r#"<a href="/private/data">Private</a><a href="/public">Public</a>"#,
    )
    .await;
    mount_page(&server, "/public", "").await;
    Mock::given(method("GET"))
        .and(path("/private/data"))
        .respond_with(html(""))
        .expect(0)
        .mount(&server)
        .await;

    let mut config = create_test_config(&server.uri(), 100);
    config.crawler.respect_robots = true;
    let client = build_http_client(&config.crawler).unwrap();
    let target = CrawlTarget::new(&server.uri()).unwrap();
    let result = crawl(&client, &target, &config).await.unwrap();

    let private = url::Url::parse(&format!("{}/private/data", server.uri())).unwrap();
    assert_eq!(paths(&result), vec!["/", "/public"]);
    assert!(result.is_blocked(&private));
}

fn redirect_to(location: String) -> ResponseTemplate {
    ResponseTemplate::new(301).insert_header("location", location.as_str())
}

#[tokio::test]
async fn test_redirected_seed_fetched_once() {
    let server = MockServer::start().await;
    let base = server.uri();
    Mock::given(method("GET"))
        .and(path("/"))
        .respond_with(redirect_to(format!("{}/home", base)))
        .expect(1)
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/home"))
        .respond_with(html(r#"<a href="/home">Home</a><a href="/about">About</a>"#))
        .expect(1)
        .mount(&server)
        .await;
    mount_page(&server, "/about", r#"<a href="/home">Home</a><a href="/">Root</a>"#).await;

    let result = run_crawl(&base, 100).await.unwrap();

    let home = url::Url::parse(&format!("{}/home", base)).unwrap();
    let seed = url::Url::parse(&format!("{}/", base)).unwrap();
    assert_eq!(paths(&result), vec!["/", "/about"]);
    assert_eq!(result.pages[0].final_url, home);
    assert_eq!(result.visited.len(), 2);
    assert_eq!(result.visited.fetched_count(), 2);
    assert_eq!(
        result.visited.status(&page_key(&home)),
        Some(VisitStatus::Fetched)
    );
    assert_eq!(result.visited.canonical(&page_key(&home)), page_key(&seed));
    assert_eq!(result.fetch_status(&home), Some(&LinkStatus::Ok(200)));
}

#[tokio::test]
async fn test_internal_redirect_folds_queued_target() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/old">Old</a><a href="/new">New</a>"#).await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect_to(format!("{}/new", base)))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/new"))
        .respond_with(html(""))
        .expect(1)
        .mount(&server)
        .await;

    let result = run_crawl(&base, 100).await.unwrap();

    let new = url::Url::parse(&format!("{}/new", base)).unwrap();
    assert_eq!(paths(&result), vec!["/", "/old"]);
    assert!(result.visited.is_alias(&page_key(&new)));
    assert_eq!(result.visited.pending_count(), 0);
    assert_eq!(result.state, CrawlState::Done);
}

#[tokio::test]
async fn test_redirect_onto_visited_page_is_dropped() {
    let server = MockServer::start().await;
    let base = server.uri();
    mount_page(&server, "/", r#"<a href="/about">About</a><a href="/old">Old</a>"#).await;
    mount_page(&server, "/about", "").await;
    Mock::given(method("GET"))
        .and(path("/old"))
        .respond_with(redirect_to(format!("{}/about", base)))
        .mount(&server)
        .await;

    let result = run_crawl(&base, 100).await.unwrap();

    let old = url::Url::parse(&format!("{}/old", base)).unwrap();
    let about = url::Url::parse(&format!("{}/about", base)).unwrap();
    assert_eq!(paths(&result), vec!["/", "/about"]);
    assert_eq!(result.visited.fetched_count(), 2);
    assert_eq!(result.visited.canonical(&page_key(&old)), page_key(&about));
    assert_eq!(result.fetch_status(&old), Some(&LinkStatus::Ok(200)));
}
