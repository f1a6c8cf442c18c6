//! End-to-end tests for the audit orchestrator
//!
//! A wiremock server plays the website, a second one plays the GitHub API,
//! and a scripted engine stands in for the browser.

use async_trait::async_trait;
use std::io::Write;
use std::time::Duration;
use sumi_audit::audit::{EXIT_FAILED, EXIT_PASSED};
use sumi_audit::checks::performance::{
    BrowserEngine, NavigationTiming, NetworkEntry, ObservedEntry, ObserverKind, PaintTiming,
};
use sumi_audit::checks::CheckKind;
use sumi_audit::config::{apply_env_overrides, load_config_file, validate, Config};
use sumi_audit::{AuditError, Auditor, BrowserError};
use tempfile::NamedTempFile;
use url::Url;
use wiremock::matchers::{body_partial_json, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

const GOOD_PAGE: &str = r#"<html lang="en"><head>
<title>Example Studio | Handmade Ceramics Online</title>
<meta name="description" content="Hand-made ceramics, shipped worldwide from our studio in Lisbon.">
<meta property="og:image" content="/og.png">
<link rel="canonical" href="/">
</head><body><p>Welcome</p></body></html>"#;

fn test_config(seed: &str) -> Config {
    let mut config = Config::default();
    config.target.website_url = Some(seed.to_string());
    config.crawler.crawl_delay_ms = 0;
    config.crawler.request_timeout_ms = 2_000;
    config.profiler.network_idle_delay_ms = 0;
    config.profiler.observer_window_ms = 0;
    config
}

fn with_github(mut config: Config, api: &MockServer) -> Config {
    config.publish.github_token = Some("t0ken".to_string());
    config.publish.github_repository = Some("acme/site".to_string());
    config.publish.api_url = api.uri();
    config
}

async fn mount_html(server: &MockServer, page: &str, html: &str) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(
            ResponseTemplate::new(200)
                .set_body_raw(html.to_string(), "text/html"),
        )
        .mount(server)
        .await;
}

async fn mount_sitemap(server: &MockServer, urls: &[String]) {
    let entries: String = urls
        .iter()
        .map(|u| format!("<url><loc>{}</loc></url>", u))
        .collect();
    Mock::given(method("GET"))
        .and(path("/sitemap.xml"))
        .respond_with(ResponseTemplate::new(200).set_body_raw(
            format!(
                r#"<?xml version="1.0" encoding="UTF-8"?><urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">{}</urlset>"#,
                entries
            ),
            "application/xml",
        ))
        .mount(server)
        .await;
}

fn created_issue() -> ResponseTemplate {
    ResponseTemplate::new(201).set_body_json(serde_json::json!({
        "number": 7,
        "html_url": "https://github.com/acme/site/issues/7",
    }))
}

/// Browser engine for a fast, light page
struct FastPage;

#[async_trait]
impl BrowserEngine for FastPage {
    async fn navigate(&mut self, _url: &Url, _timeout: Duration) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn wait_for_network_idle(
        &mut self,
        _settle: Duration,
        _timeout: Duration,
    ) -> Result<(), BrowserError> {
        Ok(())
    }

    async fn navigation_timing(&mut self) -> Result<Option<NavigationTiming>, BrowserError> {
        Ok(Some(NavigationTiming {
            ttfb: 120.0,
            dom_content_loaded: 600.0,
            load_event_end: 900.0,
            ..NavigationTiming::default()
        }))
    }

    async fn paint_timing(&mut self) -> Result<PaintTiming, BrowserError> {
        Ok(PaintTiming {
            first_paint: Some(250.0),
            first_contentful_paint: Some(300.0),
        })
    }

    async fn observe(
        &mut self,
        kind: ObserverKind,
        _window: Duration,
    ) -> Result<Vec<ObservedEntry>, BrowserError> {
        Ok(match kind {
            ObserverKind::LargestContentfulPaint => vec![ObservedEntry {
                start_time: 700.0,
                ..ObservedEntry::default()
            }],
            _ => Vec::new(),
        })
    }

    async fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError> {
        Ok(Vec::new())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

#[tokio::test]
async fn test_clean_site_exits_zero() {
    let site = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", GOOD_PAGE).await;
    mount_sitemap(&site, &[format!("{}/", base)]).await;

    let report = Auditor::new(test_config(&base))
        .with_checks(vec![CheckKind::Links, CheckKind::Seo, CheckKind::Sitemap])
        .run()
        .await
        .unwrap();

    assert!(report.passed());
    assert_eq!(report.exit_code(), EXIT_PASSED);
    assert_eq!(report.reports.len(), 3);
    assert!(report.published.is_empty());

    let seo = report.report(CheckKind::Seo).unwrap();
    assert!(seo
        .metrics
        .contains(&("Pages audited".to_string(), "1".to_string())));
    let links = report.report(CheckKind::Links).unwrap();
    assert!(links
        .metrics
        .contains(&("Pages crawled".to_string(), "1".to_string())));

    let markdown = report.render();
    assert!(markdown.starts_with(&format!("# ✅ PASSED Website Audit: {}", base)));
    assert!(markdown.contains("## SEO Audit - ✅ PASSED"));
}

#[tokio::test]
async fn test_every_check_reports_in_order() {
    let site = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", GOOD_PAGE).await;
    mount_sitemap(&site, &[format!("{}/", base)]).await;

    let report = Auditor::new(test_config(&base))
        .with_checks(vec![
            CheckKind::Performance,
            CheckKind::Sitemap,
            CheckKind::Seo,
            CheckKind::Links,
        ])
        .with_browser(Box::new(FastPage))
        .run()
        .await
        .unwrap();

    let kinds: Vec<CheckKind> = report.reports.iter().map(|r| r.kind).collect();
    assert_eq!(kinds, CheckKind::ALL.to_vec());
    assert!(report.reports.iter().all(|r| r.passed));
    let performance = report.report(CheckKind::Performance).unwrap();
    assert_eq!(performance.badge, "🟢 Grade A");
    assert_eq!(report.exit_code(), EXIT_PASSED);
}

#[tokio::test]
async fn test_broken_link_publishes_issue() {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", r#"<html><body><a href="/gone">Gone</a></body></html>"#).await;

    Mock::given(method("POST"))
        .and(path("/repos/acme/site/issues"))
        .and(body_partial_json(serde_json::json!({
            "title": format!("Broken links found on {}", base),
            "labels": ["broken-link"],
        })))
        .respond_with(created_issue())
        .expect(1)
        .mount(&github)
        .await;

    let report = Auditor::new(with_github(test_config(&base), &github))
        .with_checks(vec![CheckKind::Links])
        .run()
        .await
        .unwrap();

    assert_eq!(report.exit_code(), EXIT_FAILED);
    assert_eq!(report.published.len(), 1);
    assert_eq!(report.published[0].number, 7);
}

#[tokio::test]
async fn test_publish_failure_does_not_change_exit_code() {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", GOOD_PAGE).await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(500).set_body_string("boom"))
        .expect(1)
        .mount(&github)
        .await;

    let report = Auditor::new(with_github(test_config(&base), &github))
        .with_checks(vec![CheckKind::Performance])
        .with_browser(Box::new(FastPage))
        .run()
        .await
        .unwrap();

    assert_eq!(report.exit_code(), EXIT_PASSED);
    assert!(report.published.is_empty());
}

#[tokio::test]
async fn test_performance_report_always_published() {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let base = site.uri();

    Mock::given(method("POST"))
        .and(body_partial_json(serde_json::json!({
            "title": format!("Performance Report: 🟢 Grade A - {}", base),
            "labels": ["performance", "web-vitals"],
        })))
        .respond_with(created_issue())
        .expect(1)
        .mount(&github)
        .await;

    let report = Auditor::new(with_github(test_config(&base), &github))
        .with_checks(vec![CheckKind::Performance])
        .with_browser(Box::new(FastPage))
        .run()
        .await
        .unwrap();

    let performance = report.report(CheckKind::Performance).unwrap();
    assert!(performance.passed);
    assert_eq!(performance.badge, "🟢 Grade A");
    assert_eq!(report.published.len(), 1);
}

#[tokio::test]
async fn test_no_publish_when_disabled() {
    let site = MockServer::start().await;
    let github = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", r#"<html><body><a href="/gone">Gone</a></body></html>"#).await;

    Mock::given(method("POST"))
        .respond_with(created_issue())
        .expect(0)
        .mount(&github)
        .await;

    let mut config = with_github(test_config(&base), &github);
    config.publish.enabled = false;
    let report = Auditor::new(config)
        .with_checks(vec![CheckKind::Links])
        .run()
        .await
        .unwrap();

    assert_eq!(report.exit_code(), EXIT_FAILED);
}

#[tokio::test]
async fn test_invalid_url_is_config_error() {
    let mut config = Config::default();
    config.target.website_url = Some("ftp://example.com".to_string());

    let result = Auditor::new(config).run().await;
    assert!(matches!(result, Err(AuditError::Config(_))));
}

#[tokio::test]
async fn test_unreachable_seed_is_fatal() {
    let result = Auditor::new(test_config("http://127.0.0.1:1"))
        .with_checks(vec![CheckKind::Links])
        .run()
        .await;

    assert!(matches!(result, Err(AuditError::SeedUnreachable { .. })));
}

#[tokio::test]
async fn test_layered_config_file_and_environment() {
    let site = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", GOOD_PAGE).await;

    let mut file = NamedTempFile::new().unwrap();
    write!(
        file,
        r#"
[target]
website-url = "https://placeholder.invalid"

[crawler]
crawl-delay-ms = 0
max-pages = 5

[seo]
strict = true
"#
    )
    .unwrap();

    let mut config = load_config_file(file.path()).unwrap();
    let website = base.clone();
    apply_env_overrides(&mut config, |key| match key {
        "WEBSITE_URL" => Some(website.clone()),
        "REQUEST_TIMEOUT" => Some("2s".to_string()),
        _ => None,
    })
    .unwrap();
    validate(&config).unwrap();

    assert_eq!(config.crawler.max_pages, 5);
    assert_eq!(config.crawler.request_timeout_ms, 2_000);
    assert!(config.seo.strict);

    let report = Auditor::new(config)
        .with_checks(vec![CheckKind::Seo])
        .run()
        .await
        .unwrap();
    assert_eq!(report.url, base);
    assert_eq!(report.exit_code(), EXIT_PASSED);
}
