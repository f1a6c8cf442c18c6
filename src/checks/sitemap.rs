//! Sitemap reconciliation
//!
//! Reads `{seed}/sitemap.xml` (falling back to `Sitemap:` lines in
//! robots.txt), follows sitemap indexes breadth-first up to a depth limit,
//! checks every listed URL, and compares the listed pages with the crawl.
//! Each sitemap file is fetched at most once per run.

use crate::checks::links::LinkValidator;
use crate::checks::CheckKind;
use crate::config::{CrawlerConfig, SitemapConfig};
use crate::crawler::CrawlResult;
use crate::report::{Category, CheckReport, Finding, Severity};
use crate::robots::fetch_robots;
use crate::url::{normalize, page_key, CrawlTarget};
use crate::ParseError;
use reqwest::Client;
use sitemap::reader::{SiteMapEntity, SiteMapReader};
use std::collections::{HashSet, VecDeque};
use std::io::Cursor;
use std::time::Duration;

/// A page URL listed in a sitemap
#[derive(Debug, Clone, PartialEq)]
pub struct SitemapEntry {
    pub url: String,
    pub lastmod: Option<String>,
    pub priority: Option<f32>,

    /// The sitemap file the entry was read from
    pub source: String,

    /// Index nesting level of that file (the root sitemap is 0)
    pub depth: u32,
}

/// Contents of one sitemap document
#[derive(Debug, Default)]
pub struct ParsedSitemap {
    pub entries: Vec<SitemapEntry>,

    /// `<sitemap><loc>` children of a sitemap index
    pub nested: Vec<String>,

    pub errors: Vec<ParseError>,
}

/// Parses a `<urlset>` or `<sitemapindex>` document
///
/// # Arguments
///
/// * `xml` - The raw document
/// * `source` - URL the document was fetched from, recorded on each entry
/// * `depth` - Index nesting level of the document
pub fn parse_sitemap(xml: &[u8], source: &str, depth: u32) -> ParsedSitemap {
    let mut parsed = ParsedSitemap::default();

    for entity in SiteMapReader::new(Cursor::new(xml)) {
        match entity {
            SiteMapEntity::Url(entry) => {
                let Some(url) = entry.loc.get_url() else {
                    continue;
                };
                parsed.entries.push(SitemapEntry {
                    url: url.to_string(),
                    lastmod: entry.lastmod.get_time().map(|t| t.to_rfc3339()),
                    priority: entry.priority.get_priority(),
                    source: source.to_string(),
                    depth,
                });
            }
            SiteMapEntity::SiteMap(entry) => {
                if let Some(url) = entry.loc.get_url() {
                    parsed.nested.push(url.to_string());
                }
            }
            SiteMapEntity::Err(error) => {
                parsed.errors.push(ParseError::Sitemap {
                    url: source.to_string(),
                    message: format!("{:?}", error),
                });
            }
        }
    }

    parsed
}

/// Everything gathered from the sitemap files of one site
#[derive(Debug, Clone, Default)]
pub struct SitemapCollection {
    pub entries: Vec<SitemapEntry>,

    /// Sitemap files read successfully, in processing order
    pub processed: Vec<String>,

    /// Sitemap files that could not be fetched: `(url, parent, reason)`
    pub unavailable: Vec<(String, Option<String>, String)>,

    /// Nested sitemaps beyond the depth limit
    pub too_deep: Vec<String>,
}

struct QueuedSitemap {
    url: String,
    depth: u32,
    parent: Option<String>,
}

/// Fetches sitemaps and reconciles them with a crawl
pub struct SitemapReconciler {
    client: Client,
    delay: Duration,
    max_depth: u32,
    validator: LinkValidator,
}

impl SitemapReconciler {
    pub fn new(client: Client, crawler: &CrawlerConfig, sitemap: &SitemapConfig) -> Self {
        Self {
            validator: LinkValidator::new(client.clone(), crawler),
            client,
            delay: crawler.crawl_delay(),
            max_depth: sitemap.max_depth,
        }
    }

    /// Reads the site's sitemaps, following indexes
    pub async fn collect(&self, target: &CrawlTarget) -> SitemapCollection {
        let mut collection = SitemapCollection::default();
        let mut seen: HashSet<String> = HashSet::new();

        let root = format!("{}/sitemap.xml", target.seed_str());
        let mut queue = VecDeque::from([QueuedSitemap {
            url: root.clone(),
            depth: 0,
            parent: None,
        }]);
        self.drain(&mut queue, &mut seen, &mut collection).await;

        if !collection.processed.contains(&root) {
            let robots = fetch_robots(&self.client, target).await;
            for url in robots.sitemaps() {
                tracing::debug!("Trying sitemap from robots.txt: {}", url);
                queue.push_back(QueuedSitemap {
                    url,
                    depth: 0,
                    parent: None,
                });
            }
            self.drain(&mut queue, &mut seen, &mut collection).await;
        }

        collection
    }

    async fn drain(
        &self,
        queue: &mut VecDeque<QueuedSitemap>,
        seen: &mut HashSet<String>,
        collection: &mut SitemapCollection,
    ) {
        while let Some(current) = queue.pop_front() {
            if !seen.insert(current.url.clone()) {
                tracing::debug!("Sitemap already processed: {}", current.url);
                continue;
            }

            let body = match self.fetch(&current.url).await {
                Ok(body) => body,
                Err(reason) => {
                    tracing::debug!("Sitemap {} unavailable: {}", current.url, reason);
                    collection
                        .unavailable
                        .push((current.url, current.parent, reason));
                    continue;
                }
            };

            let parsed = parse_sitemap(&body, &current.url, current.depth);
            for error in &parsed.errors {
                tracing::warn!("{}", error);
            }
            tracing::debug!(
                "Sitemap {}: {} URLs, {} nested sitemaps",
                current.url,
                parsed.entries.len(),
                parsed.nested.len()
            );

            collection.entries.extend(parsed.entries);
            for nested in parsed.nested {
                if seen.contains(&nested) {
                    continue;
                }
                if current.depth + 1 > self.max_depth {
                    collection.too_deep.push(nested);
                } else {
                    queue.push_back(QueuedSitemap {
                        url: nested,
                        depth: current.depth + 1,
                        parent: Some(current.url.clone()),
                    });
                }
            }
            collection.processed.push(current.url);
        }
    }

    async fn fetch(&self, url: &str) -> Result<Vec<u8>, String> {
        if !self.delay.is_zero() {
            tokio::time::sleep(self.delay).await;
        }

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| e.to_string())?;
        if !response.status().is_success() {
            return Err(format!("HTTP {}", response.status().as_u16()));
        }
        let body = response.bytes().await.map_err(|e| e.to_string())?;
        Ok(body.to_vec())
    }

    /// Reads the sitemaps, checks their URLs and builds the sitemap report
    pub async fn run(&mut self, crawl: &CrawlResult) -> CheckReport {
        let collection = self.collect(&crawl.target).await;
        let mut report = CheckReport::new(CheckKind::Sitemap, true);
        let mut broken = 0;

        for (url, parent, reason) in &collection.unavailable {
            match parent {
                Some(parent) => {
                    broken += 1;
                    report.findings.push(
                        Finding::new(
                            Category::BrokenSitemapUrl,
                            Severity::High,
                            url.as_str(),
                            format!("Nested sitemap could not be fetched: {}", reason),
                        )
                        .with_referrer(parent.as_str())
                        .with_recommendation(
                            "Remove the entry from the sitemap index or restore the file.",
                        ),
                    );
                }
                None => report.note(format!("Could not fetch {}: {}", url, reason)),
            }
        }

        if collection.entries.is_empty() {
            let subject = format!("{}/sitemap.xml", crawl.target.seed_str());
            let message = if collection.processed.is_empty() {
                "No sitemap could be fetched."
            } else {
                "The sitemap lists no URLs."
            };
            report.findings.push(
                Finding::new(Category::SitemapUnavailable, Severity::High, subject, message)
                    .with_recommendation(
                        "Publish a sitemap.xml listing every page, and reference it from robots.txt.",
                    ),
            );
        } else {
            broken += self.validate_entries(crawl, &collection, &mut report).await;
            reconcile(crawl, &collection.entries, &mut report);
        }

        for nested in &collection.too_deep {
            report.note(format!(
                "Skipped nested sitemap {}: recursion depth limit of {} reached.",
                nested, self.max_depth
            ));
        }

        let failed = report.findings.count(Severity::High) > 0;
        report.passed = !failed;
        report.badge = crate::report::pass_badge(!failed).to_string();

        let mismatches = report
            .findings
            .iter()
            .filter(|f| f.category == Category::SitemapMismatch)
            .count();
        report.metric("Total URLs in sitemap", collection.entries.len());
        report.metric("Broken URLs", broken);
        report.metric("Sitemaps processed", collection.processed.len());
        report.metric("Crawl/sitemap mismatches", mismatches);

        if !collection.processed.is_empty() {
            let list: String = collection
                .processed
                .iter()
                .map(|url| format!("- {}\n", url))
                .collect();
            report.section("Processed Sitemaps", list);
        }

        tracing::info!(
            "Sitemap check: {} URLs from {} sitemaps, {} broken",
            collection.entries.len(),
            collection.processed.len(),
            broken
        );

        report
    }

    /// Checks every distinct entry URL; returns the number of broken ones
    async fn validate_entries(
        &mut self,
        crawl: &CrawlResult,
        collection: &SitemapCollection,
        report: &mut CheckReport,
    ) -> usize {
        let mut checked: HashSet<String> = HashSet::new();
        let mut broken = 0;

        for entry in &collection.entries {
            let url = match normalize(&entry.url, None) {
                Ok(url) => url,
                Err(e) => {
                    tracing::debug!("Skipping sitemap entry {}: {}", entry.url, e);
                    continue;
                }
            };
            if !checked.insert(url.to_string()) {
                continue;
            }

            let status = match crawl.fetch_status(&url) {
                Some(status) => status.clone(),
                None => self.validator.check(&url).await,
            };

            if status.is_failure() {
                broken += 1;
                report.findings.push(
                    Finding::new(
                        Category::BrokenSitemapUrl,
                        Severity::High,
                        url.as_str(),
                        status.describe(),
                    )
                    .with_referrer(entry.source.as_str())
                    .with_recommendation("Remove the URL from the sitemap or restore the page."),
                );
            }
        }

        broken
    }
}

/// Adds mismatch findings between sitemap entries and the crawl
///
/// Crawled pages missing from the sitemap and in-scope sitemap pages the
/// crawl never discovered are both reported at low severity.
pub fn reconcile(crawl: &CrawlResult, entries: &[SitemapEntry], report: &mut CheckReport) {
    let mut listed: Vec<String> = Vec::new();
    let mut listed_set: HashSet<String> = HashSet::new();
    for entry in entries {
        let Ok(url) = normalize(&entry.url, None) else {
            continue;
        };
        if !crawl.target.contains(&url) {
            continue;
        }
        let key = page_key(&url);
        if listed_set.insert(key.clone()) {
            listed.push(key);
        }
    }

    for key in crawl.fetched_keys() {
        if !crawl.visited.identities(key).any(|k| listed_set.contains(k)) {
            report.findings.push(
                Finding::new(
                    Category::SitemapMismatch,
                    Severity::Low,
                    key,
                    "Crawled page is missing from the sitemap.",
                )
                .with_title("Page Not In Sitemap")
                .with_recommendation("Add the page to the sitemap if it should be indexed."),
            );
        }
    }

    for key in &listed {
        if !crawl.visited.contains(key) {
            report.findings.push(
                Finding::new(
                    Category::SitemapMismatch,
                    Severity::Low,
                    key.as_str(),
                    "Listed in the sitemap but not reached by the crawl.",
                )
                .with_title("Sitemap URL Not Crawled")
                .with_recommendation("Link to the page from the site, or drop it from the sitemap."),
            );
        }
    }

    if crawl.is_capped() {
        report.note(
            "Crawl stopped at the page limit; some sitemap URLs may not have been reached.",
        );
    }
}
