//! Link validation
//!
//! Every anchor recorded by the crawler ends in exactly one classification:
//! ok, broken, unreachable or skipped. Targets the crawler already fetched
//! reuse the crawler's classification; everything else is checked once with
//! HEAD (GET on 405) and cached for the rest of the run.

use crate::checks::CheckKind;
use crate::config::CrawlerConfig;
use crate::crawler::{check_url, CrawlResult, Link, LinkStatus, SkipReason};
use crate::report::{table, Category, CheckReport, Finding, Severity};
use reqwest::Client;
use std::collections::{BTreeMap, HashMap};
use std::time::Duration;
use url::Url;

const EMAIL_PROTECTION_PATH: &str = "/cdn-cgi/l/email-protection";

const BROKEN_LINK_RECOMMENDATION: &str =
    "Fix or remove the link, or redirect the target to a page that exists.";

/// A link together with its final classification
#[derive(Debug, Clone)]
pub struct ClassifiedLink {
    pub link: Link,
    pub status: LinkStatus,
}

/// Checks the targets of crawled links
pub struct LinkValidator {
    client: Client,
    delay: Duration,
    check_external: bool,
    cache: HashMap<String, LinkStatus>,
    requests: usize,
}

impl LinkValidator {
    /// Creates a validator sharing the crawler's client and politeness delay
    pub fn new(client: Client, config: &CrawlerConfig) -> Self {
        Self {
            client,
            delay: config.crawl_delay(),
            check_external: config.check_external_links,
            cache: HashMap::new(),
            requests: 0,
        }
    }

    /// Number of HTTP checks issued so far
    pub fn requests(&self) -> usize {
        self.requests
    }

    /// Classifies one link
    ///
    /// # Arguments
    ///
    /// * `link` - The anchor to classify
    /// * `crawl` - The crawl the link came from; its fetch results are reused
    pub async fn classify(&mut self, link: &Link, crawl: &CrawlResult) -> LinkStatus {
        let Some(target) = &link.target else {
            return match link.raw_scheme() {
                Some(scheme) if scheme != "http" && scheme != "https" => {
                    LinkStatus::Skipped(SkipReason::NonHttpScheme)
                }
                _ => LinkStatus::Skipped(SkipReason::InvalidUrl),
            };
        };

        if target.path().starts_with(EMAIL_PROTECTION_PATH) {
            return LinkStatus::Skipped(SkipReason::EmailProtection);
        }

        if !self.check_external && !crawl.target.contains(target) {
            return LinkStatus::Skipped(SkipReason::ThirdParty);
        }

        if crawl.is_blocked(target) {
            return LinkStatus::Skipped(SkipReason::RobotsTxt);
        }

        if let Some(status) = crawl.fetch_status(target) {
            return status.clone();
        }

        self.check(target).await
    }

    /// Checks a URL over HTTP, at most once per run
    pub async fn check(&mut self, target: &Url) -> LinkStatus {
        if let Some(status) = self.cache.get(target.as_str()) {
            return status.clone();
        }

        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        tracing::debug!("Checking {}", target);
        let status = check_url(&self.client, target).await;
        self.requests += 1;
        self.cache.insert(target.to_string(), status.clone());
        status
    }

    /// Classifies every link found on every crawled page
    pub async fn validate(&mut self, crawl: &CrawlResult) -> Vec<ClassifiedLink> {
        let mut classified = Vec::with_capacity(crawl.link_count());

        for page in &crawl.pages {
            for link in &page.links {
                let status = self.classify(link, crawl).await;
                if status.is_failure() {
                    tracing::debug!("{} on {}: {}", link.raw, link.source, status.describe());
                }
                classified.push(ClassifiedLink {
                    link: link.clone(),
                    status,
                });
            }
        }

        classified
    }

    /// Validates all links and builds the link report
    pub async fn run(&mut self, crawl: &CrawlResult) -> CheckReport {
        let classified = self.validate(crawl).await;
        let report = build_report(crawl, &classified, self.requests);

        tracing::info!(
            "Link check: {} links on {} pages, {} broken",
            classified.len(),
            crawl.pages.len(),
            report.findings.len()
        );

        report
    }
}

/// Builds the link report from classified links
///
/// # Arguments
///
/// * `crawl` - The crawl the links came from
/// * `classified` - Every link with its classification
/// * `requests` - Number of HTTP checks the validator issued
pub fn build_report(
    crawl: &CrawlResult,
    classified: &[ClassifiedLink],
    requests: usize,
) -> CheckReport {
    let failures: Vec<&ClassifiedLink> = classified
        .iter()
        .filter(|c| c.status.is_failure())
        .collect();

    let mut report = CheckReport::new(CheckKind::Links, failures.is_empty());

    let skipped = classified
        .iter()
        .filter(|c| matches!(c.status, LinkStatus::Skipped(_)))
        .count();
    let mut broken_by_page: BTreeMap<&str, Vec<&ClassifiedLink>> = BTreeMap::new();
    for failure in &failures {
        broken_by_page
            .entry(failure.link.source.as_str())
            .or_default()
            .push(failure);
    }

    report.metric("Pages crawled", crawl.visited.fetched_count());
    report.metric("Pages failed", crawl.visited.failed_count());
    report.metric("Links found", classified.len());
    report.metric("Link checks issued", requests);
    report.metric("Links skipped", skipped);
    report.metric("Broken links", failures.len());
    report.metric("Pages with broken links", broken_by_page.len());

    if crawl.is_capped() {
        report.note(format!(
            "Crawl stopped at the page limit; {} discovered URLs were not visited.",
            crawl.visited.pending_count()
        ));
    }

    for failure in &failures {
        let Some(target) = &failure.link.target else {
            continue;
        };
        let severity = match failure.status {
            LinkStatus::Broken(_) => Severity::High,
            _ => Severity::Medium,
        };
        report.findings.push(
            Finding::new(
                Category::BrokenLink,
                severity,
                target.as_str(),
                failure.status.describe(),
            )
            .with_referrer(failure.link.source.as_str())
            .with_recommendation(BROKEN_LINK_RECOMMENDATION),
        );
    }

    if !broken_by_page.is_empty() {
        let mut md = String::new();
        for (page, links) in &broken_by_page {
            md.push_str(&format!("#### Page: {}\n\n", page));
            md.push_str(&format!("Found {} broken link(s):\n\n", links.len()));
            for c in links {
                md.push_str(&format!("- `{}` - {}\n", c.link.raw, c.status.describe()));
            }
            md.push('\n');
        }
        report.section("Broken Links by Page", md);
    }

    for scheme in ["mailto", "tel"] {
        if let Some(body) = scheme_section(classified, scheme) {
            report.section(format!("{}: Links on Website", scheme), body);
        }
    }

    report
}

/// Lists links of a non-HTTP scheme per page, or `None` if there are none
fn scheme_section(classified: &[ClassifiedLink], scheme: &str) -> Option<String> {
    let mut by_page: BTreeMap<&str, Vec<&str>> = BTreeMap::new();
    for c in classified {
        if c.link.raw_scheme().as_deref() == Some(scheme) {
            let links = by_page.entry(c.link.source.as_str()).or_default();
            if !links.contains(&c.link.raw.as_str()) {
                links.push(c.link.raw.as_str());
            }
        }
    }

    if by_page.is_empty() {
        return None;
    }

    let kind = if scheme == "mailto" { "email" } else { "phone" };
    let mut md = format!(
        "These {} links cannot be validated via HTTP requests, but are listed here for reference.\n\n",
        kind
    );
    let rows: Vec<Vec<String>> = by_page
        .iter()
        .flat_map(|(page, links)| {
            links
                .iter()
                .map(move |link| vec![page.to_string(), format!("`{}`", link)])
        })
        .collect();
    md.push_str(&table(&["Page", "Link"], &rows));
    Some(md)
}
