//! Integration tests for the rule engines
//!
//! Each test crawls a wiremock site and runs one check over the result.

use async_trait::async_trait;
use std::time::Duration;
use sumi_audit::checks::performance::{
    BrowserEngine, Grade, NavigationTiming, NetworkEntry, ObservedEntry, ObserverKind,
    PaintTiming, Profiler, ResourceType,
};
use sumi_audit::checks::{LinkValidator, SeoAuditor, SitemapReconciler};
use sumi_audit::config::{Config, CrawlerConfig, ProfilerConfig};
use sumi_audit::crawler::{build_http_client, crawl, CrawlResult};
use sumi_audit::{BrowserError, Category, CrawlTarget, Severity};
use url::Url;
use wiremock::matchers::{method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

fn create_test_config(seed: &str) -> Config {
    let mut config = Config::default();
    config.target.website_url = Some(seed.to_string());
    config.crawler = CrawlerConfig {
        request_timeout_ms: 2_000,
        crawl_delay_ms: 0,
        ..CrawlerConfig::default()
    };
    config
}

async fn mount_html(server: &MockServer, page: &str, html: String) {
    Mock::given(method("GET"))
        .and(path(page))
        .respond_with(ResponseTemplate::new(200).set_body_raw(html, "text/html"))
        .mount(server)
        .await;
}

async fn mount_xml(server: &MockServer, file: &str, xml: String) {
    Mock::given(method("GET"))
        .and(path(file))
        .respond_with(ResponseTemplate::new(200).set_body_raw(xml, "application/xml"))
        .mount(server)
        .await;
}

async fn crawl_site(config: &Config) -> CrawlResult {
    let seed = config.target.website_url.as_deref().unwrap();
    let client = build_http_client(&config.crawler).unwrap();
    let target = CrawlTarget::new(seed).unwrap();
    crawl(&client, &target, config).await.unwrap()
}

fn page(body: &str) -> String {
    format!("<html><head><title>Page</title></head><body>{}</body></html>", body)
}

#[tokio::test]
async fn test_broken_internal_link_grouped_under_referrer() {
    let site = MockServer::start().await;
    let external = MockServer::start().await;
    let base = site.uri();

    mount_html(
        &site,
        "/",
        page(&format!(
            r#"<a href="/about">About</a><a href="/contact">Contact</a><a href="{}/partner">Partner</a>"#,
            external.uri()
        )),
    )
    .await;
    mount_html(&site, "/about", page(r#"<a href="/gone">Old page</a>"#)).await;
    mount_html(&site, "/contact", page(r#"<a href="mailto:hello@example.com">Mail</a>"#)).await;
    Mock::given(method("HEAD"))
        .and(path("/partner"))
        .respond_with(ResponseTemplate::new(200))
        .expect(1)
        .mount(&external)
        .await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    assert_eq!(result.pages.len(), 3);

    let client = build_http_client(&config.crawler).unwrap();
    let report = LinkValidator::new(client, &config.crawler).run(&result).await;

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);

    let gone = format!("{}/gone", base);
    let finding = report.findings.get(Category::BrokenLink, &gone).unwrap();
    assert_eq!(finding.severity, Severity::High);
    assert_eq!(finding.referrers, vec![format!("{}/about", base)]);

    let grouped = report
        .sections
        .iter()
        .find(|s| s.heading == "Broken Links by Page")
        .unwrap();
    assert!(grouped.body.contains(&format!("#### Page: {}/about", base)));
    assert!(report
        .sections
        .iter()
        .any(|s| s.heading == "mailto: Links on Website"));
}

#[tokio::test]
async fn test_shared_broken_target_is_one_finding() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_html(
        &site,
        "/",
        page(r#"<a href="/a">A</a><a href="/b">B</a><a href="/missing">Missing</a>"#),
    )
    .await;
    mount_html(&site, "/a", page(r#"<a href="/missing">Missing</a>"#)).await;
    mount_html(&site, "/b", page("")).await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    let client = build_http_client(&config.crawler).unwrap();
    let report = LinkValidator::new(client, &config.crawler).run(&result).await;

    assert_eq!(report.findings.len(), 1);
    let finding = report
        .findings
        .get(Category::BrokenLink, &format!("{}/missing", base))
        .unwrap();
    assert_eq!(finding.referrers.len(), 2);
}

#[tokio::test]
async fn test_seo_short_title_and_missing_og_image() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_html(
        &site,
        "/",
        format!(
            r#"<html lang="en"><head>
            <title>Welcome to Example Shops!</title>
            <meta name="description" content="Hand-made ceramics, shipped worldwide from our studio in Lisbon.">
            <link rel="canonical" href="{}/">
            </head><body><p>Hello</p></body></html>"#,
            base
        ),
    )
    .await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    let report = SeoAuditor::new(&config.seo).run(&result);

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 2);

    let seed = format!("{}/", base);
    let og = report.findings.get(Category::MissingOgImage, &seed).unwrap();
    assert_eq!(og.severity, Severity::Medium);
    let title = report.findings.get(Category::TitleLength, &seed).unwrap();
    assert_eq!(title.severity, Severity::Low);
    assert!(report
        .sections
        .iter()
        .any(|s| s.heading == "SEO Best Practices"));
}

#[tokio::test]
async fn test_self_referencing_sitemap_index_terminates() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_html(&site, "/", page(r#"<a href="/about">About</a>"#)).await;
    mount_html(&site, "/about", page("")).await;
    mount_xml(
        &site,
        "/sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<sitemapindex xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <sitemap><loc>{base}/sitemap.xml</loc></sitemap>
  <sitemap><loc>{base}/sitemap-pages.xml</loc></sitemap>
</sitemapindex>"#,
            base = base
        ),
    )
    .await;
    mount_xml(
        &site,
        "/sitemap-pages.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/</loc><priority>1.0</priority></url>
  <url><loc>{base}/about</loc><lastmod>2024-01-15T08:00:00+00:00</lastmod></url>
</urlset>"#,
            base = base
        ),
    )
    .await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    let client = build_http_client(&config.crawler).unwrap();
    let mut reconciler = SitemapReconciler::new(client, &config.crawler, &config.sitemap);

    let collection = reconciler.collect(&result.target).await;
    assert_eq!(collection.processed.len(), 2);
    assert_eq!(collection.entries.len(), 2);
    assert!(collection.entries[1]
        .lastmod
        .as_deref()
        .is_some_and(|d| d.starts_with("2024-01-15")));
    assert!(collection.unavailable.is_empty());

    let report = reconciler.run(&result).await;
    assert!(report.passed);
    assert_eq!(report.findings.count(Severity::High), 0);
}

#[tokio::test]
async fn test_sitemap_broken_url_fails_check() {
    let site = MockServer::start().await;
    let base = site.uri();

    mount_html(&site, "/", page("")).await;
    mount_xml(
        &site,
        "/sitemap.xml",
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<urlset xmlns="http://www.sitemaps.org/schemas/sitemap/0.9">
  <url><loc>{base}/</loc></url>
  <url><loc>{base}/retired</loc></url>
</urlset>"#,
            base = base
        ),
    )
    .await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    let client = build_http_client(&config.crawler).unwrap();
    let report = SitemapReconciler::new(client, &config.crawler, &config.sitemap)
        .run(&result)
        .await;

    assert!(!report.passed);
    let broken = report
        .findings
        .get(Category::BrokenSitemapUrl, &format!("{}/retired", base))
        .unwrap();
    assert_eq!(broken.referrers, vec![format!("{}/sitemap.xml", base)]);

    // Listed but never linked from the site
    assert!(report
        .findings
        .iter()
        .any(|f| f.category == Category::SitemapMismatch));
}

#[tokio::test]
async fn test_missing_sitemap_is_unavailable() {
    let site = MockServer::start().await;
    let base = site.uri();
    mount_html(&site, "/", page("")).await;

    let config = create_test_config(&base);
    let result = crawl_site(&config).await;
    let client = build_http_client(&config.crawler).unwrap();
    let report = SitemapReconciler::new(client, &config.crawler, &config.sitemap)
        .run(&result)
        .await;

    assert!(!report.passed);
    assert_eq!(report.findings.len(), 1);
    let finding = report.findings.iter().next().unwrap();
    assert_eq!(finding.category, Category::SitemapUnavailable);
    assert_eq!(finding.severity, Severity::High);
}

/// Browser engine returning canned measurements
struct ScriptedEngine {
    navigation: NavigationTiming,
    lcp_ms: f64,
    resources: Vec<NetworkEntry>,
}

#[async_trait]
impl BrowserEngine for ScriptedEngine {
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
        Ok(Some(self.navigation.clone()))
    }

    async fn paint_timing(&mut self) -> Result<PaintTiming, BrowserError> {
        Ok(PaintTiming {
            first_paint: Some(300.0),
            first_contentful_paint: Some(400.0),
        })
    }

    async fn observe(
        &mut self,
        kind: ObserverKind,
        _window: Duration,
    ) -> Result<Vec<ObservedEntry>, BrowserError> {
        Ok(match kind {
            ObserverKind::LargestContentfulPaint => vec![ObservedEntry {
                start_time: self.lcp_ms,
                ..ObservedEntry::default()
            }],
            ObserverKind::LayoutShift => vec![ObservedEntry {
                value: 0.05,
                ..ObservedEntry::default()
            }],
            ObserverKind::LongTask => vec![ObservedEntry {
                start_time: 500.0,
                duration: 150.0,
                ..ObservedEntry::default()
            }],
        })
    }

    async fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError> {
        Ok(self.resources.clone())
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        Ok(())
    }
}

fn resources(count: usize, total_bytes: u64) -> Vec<NetworkEntry> {
    (0..count)
        .map(|i| NetworkEntry {
            url: format!("https://example.com/asset{}.js", i),
            resource_type: if i == 0 {
                ResourceType::Document
            } else {
                ResourceType::Script
            },
            status: Some(200),
            start_ms: i as f64 * 10.0,
            end_ms: i as f64 * 10.0 + 40.0,
            size: total_bytes / count as u64,
            content_type: "application/javascript".to_string(),
            cache_control: "max-age=3600".to_string(),
            content_encoding: "gzip".to_string(),
        })
        .collect()
}

fn profiler() -> Profiler {
    Profiler::new(&ProfilerConfig {
        network_idle_delay_ms: 0,
        observer_window_ms: 0,
        ..ProfilerConfig::default()
    })
}

#[tokio::test]
async fn test_good_vitals_grade_a() {
    let mut engine = ScriptedEngine {
        navigation: NavigationTiming {
            ttfb: 200.0,
            dom_content_loaded: 900.0,
            load_event_end: 1500.0,
            ..NavigationTiming::default()
        },
        lcp_ms: 1800.0,
        resources: resources(20, 1_000_000),
    };
    let url = Url::parse("https://example.com/").unwrap();

    let sample = profiler().profile(&mut engine, &url).await.unwrap();
    assert_eq!(sample.metrics.tbt, 100.0);
    assert_eq!(sample.score, 100);
    assert_eq!(sample.grade, Grade::A);

    let report = profiler().run(&mut engine, &url).await;
    assert!(report.passed);
    assert!(report.findings.is_empty());
    assert_eq!(report.badge, "🟢 Grade A");
}

#[tokio::test]
async fn test_poor_lcp_grade_c_still_passes() {
    let mut engine = ScriptedEngine {
        navigation: NavigationTiming {
            ttfb: 200.0,
            ..NavigationTiming::default()
        },
        lcp_ms: 5000.0,
        resources: resources(10, 500_000),
    };
    let url = Url::parse("https://example.com/").unwrap();

    let report = profiler().run(&mut engine, &url).await;

    assert!(report.passed);
    assert_eq!(report.badge, "🟡 Grade C");
    assert_eq!(report.findings.count(Severity::High), 1);
    let waterfall = report
        .sections
        .iter()
        .find(|s| s.heading == "Waterfall Chart")
        .unwrap();
    assert!(waterfall.body.contains("WATERFALL CHART"));
}
