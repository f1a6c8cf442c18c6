//! Crawler coordinator - main crawl loop
//!
//! The loop is strictly sequential: one URL is dequeued, the politeness
//! delay is slept, the URL is fetched once, and newly discovered in-scope
//! URLs are appended to the frontier. The page cap bounds `fetched + failed`
//! plus requests that redirected onto an already visited page.

use crate::config::CrawlerConfig;
use crate::crawler::fetcher::{fetch_page, FetchOutcome, LinkStatus};
use crate::crawler::frontier::{Frontier, QueuedUrl};
use crate::crawler::page::{Link, Page};
use crate::crawler::parser::{parse_html, RawLink};
use crate::robots::ParsedRobots;
use crate::state::{CrawlState, VisitStatus, VisitedSet};
use crate::url::{normalize, page_key, CrawlTarget};
use crate::AuditError;
use reqwest::Client;
use std::collections::{HashMap, HashSet};
use std::time::{Duration, Instant};
use url::Url;

/// Everything a crawl produced, handed to the rule engines
#[derive(Debug)]
pub struct CrawlResult {
    pub target: CrawlTarget,
    pub state: CrawlState,

    /// Successfully fetched HTML pages, in breadth-first order
    pub pages: Vec<Page>,

    pub visited: VisitedSet,

    /// Classification of every URL the crawler requested, keyed by the
    /// normalized URL string
    pub fetch_statuses: HashMap<String, LinkStatus>,

    /// Page keys of in-scope URLs that robots.txt kept the crawler away from
    pub blocked_by_robots: HashSet<String>,

    pub elapsed: Duration,
}

impl CrawlResult {
    /// The crawler's own classification of `url`, if it requested it
    pub fn fetch_status(&self, url: &Url) -> Option<&LinkStatus> {
        self.fetch_statuses.get(url.as_str())
    }

    /// Returns true if robots.txt kept the crawler away from `url`
    pub fn is_blocked(&self, url: &Url) -> bool {
        self.blocked_by_robots.contains(&page_key(url))
    }

    /// Page keys that were fetched as HTML
    pub fn fetched_keys(&self) -> impl Iterator<Item = &str> {
        self.visited.keys_with(VisitStatus::Fetched)
    }

    pub fn is_capped(&self) -> bool {
        self.state == CrawlState::Capped
    }

    /// Total number of anchors recorded across all pages
    pub fn link_count(&self) -> usize {
        self.pages.iter().map(|p| p.links.len()).sum()
    }
}

/// Main crawler structure
pub struct Crawler {
    client: Client,
    target: CrawlTarget,
    config: CrawlerConfig,
    robots: Option<ParsedRobots>,
}

impl Crawler {
    /// Creates a crawler for `target`
    ///
    /// # Arguments
    ///
    /// * `client` - HTTP client from [`crate::crawler::build_http_client`]
    /// * `target` - The seed and its scope
    /// * `config` - Page cap, delay and robots settings
    pub fn new(client: Client, target: CrawlTarget, config: CrawlerConfig) -> Self {
        Self {
            client,
            target,
            config,
            robots: None,
        }
    }

    /// Enables robots.txt compliance with the given rules
    pub fn with_robots(mut self, robots: ParsedRobots) -> Self {
        self.robots = Some(robots);
        self
    }

    /// Delay slept before every request
    ///
    /// A robots.txt `Crawl-delay` longer than the configured delay wins when
    /// robots compliance is on.
    fn politeness_delay(&self) -> Duration {
        let configured = self.config.crawl_delay();
        let robots_delay = self
            .robots
            .as_ref()
            .and_then(|r| r.crawl_delay(&self.config.user_agent))
            .filter(|secs| *secs > 0.0)
            .and_then(|secs| Duration::try_from_secs_f64(secs).ok());

        match robots_delay {
            Some(delay) if delay > configured => delay,
            _ => configured,
        }
    }

    fn is_allowed(&self, url: &Url) -> bool {
        self.robots
            .as_ref()
            .map_or(true, |r| r.is_allowed(url.as_str(), &self.config.user_agent))
    }

    /// Runs the crawl to completion
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlResult)` - State `DONE` or `CAPPED`, with every page gathered
    /// * `Err(AuditError::SeedUnreachable)` - The seed produced no response at all
    pub async fn run(&self) -> Result<CrawlResult, AuditError> {
        let start_time = Instant::now();
        let max_pages = self.config.max_pages as usize;
        let delay = self.politeness_delay();

        let mut state = CrawlState::Init;
        let mut visited = VisitedSet::new();
        let mut frontier = Frontier::new();
        let mut pages: Vec<Page> = Vec::new();
        let mut fetch_statuses: HashMap<String, LinkStatus> = HashMap::new();
        let mut blocked_by_robots: HashSet<String> = HashSet::new();
        let mut redirect_duplicates = 0usize;

        let seed = self.target.seed().clone();
        let seed_key = page_key(&seed);
        visited.mark_pending(&seed_key);
        frontier.push(QueuedUrl {
            url: seed,
            key: seed_key,
            depth: 0,
        });
        state = state.transition(CrawlState::Running).unwrap_or(state);

        tracing::info!(
            "Crawling {} (max {} pages, {:?} delay)",
            self.target.seed(),
            max_pages,
            delay
        );

        while visited.completed() + redirect_duplicates < max_pages {
            let Some(current) = frontier.pop() else {
                break;
            };

            // Folded into an earlier redirect
            if visited.is_alias(&current.key) {
                continue;
            }

            if !delay.is_zero() {
                tokio::time::sleep(delay).await;
            }

            tracing::debug!("Fetching {} (depth {})", current.url, current.depth);
            let outcome = fetch_page(&self.client, &current.url).await;
            let link_status = outcome.link_status(&current.url);
            fetch_statuses.insert(current.url.to_string(), link_status.clone());

            match outcome {
                FetchOutcome::Html {
                    final_url,
                    status,
                    content_type,
                    body,
                } => {
                    if final_url != current.url {
                        fetch_statuses
                            .entry(final_url.to_string())
                            .or_insert(link_status);
                    }

                    let final_key = page_key(&final_url);
                    if final_key != current.key && !visited.add_alias(&final_key, &current.key) {
                        tracing::debug!(
                            "{} redirected to already visited {}",
                            current.url,
                            final_url
                        );
                        let canonical = visited.canonical(&final_key).to_string();
                        visited.add_alias(&current.key, &canonical);
                        redirect_duplicates += 1;
                        continue;
                    }

                    visited.mark_fetched(&current.key);
                    let page = self.build_page(&current, final_url, status, content_type, body);

                    for target in page.links.iter().filter_map(|l| l.target.as_ref()) {
                        if !self.target.contains(target) {
                            continue;
                        }
                        let key = page_key(target);
                        if visited.contains(&key) || blocked_by_robots.contains(&key) {
                            continue;
                        }
                        if !self.is_allowed(target) {
                            tracing::debug!("Disallowed by robots.txt: {}", target);
                            blocked_by_robots.insert(key);
                            continue;
                        }
                        if visited.mark_pending(&key) {
                            frontier.push(QueuedUrl {
                                url: target.clone(),
                                key,
                                depth: current.depth + 1,
                            });
                        }
                    }

                    pages.push(page);
                }
                FetchOutcome::NonHtml {
                    status,
                    content_type,
                    ..
                } => {
                    visited.mark_failed(&current.key);
                    tracing::debug!(
                        "Not parsing {} (HTTP {}, {})",
                        current.url,
                        status,
                        content_type
                    );
                }
                FetchOutcome::HttpError { status, .. } => {
                    visited.mark_failed(&current.key);
                    tracing::debug!("{} returned HTTP {}", current.url, status);
                }
                FetchOutcome::Unreachable(error) => {
                    visited.mark_failed(&current.key);
                    if current.depth == 0 {
                        let failed = state.transition(CrawlState::Failed).unwrap_or(state);
                        tracing::error!("Crawl {}: seed unreachable: {}", failed, error);
                        return Err(AuditError::SeedUnreachable {
                            url: current.url.to_string(),
                            reason: error.to_string(),
                        });
                    }
                    tracing::debug!("Unreachable: {}", error);
                }
            }

            let completed = visited.completed();
            if completed % 10 == 0 {
                let elapsed = start_time.elapsed();
                tracing::info!(
                    "Progress: {} pages crawled, {} in frontier, {:.2} pages/sec",
                    completed,
                    frontier.len(),
                    completed as f64 / elapsed.as_secs_f64().max(f64::EPSILON)
                );
            }
        }

        let finished = CrawlState::finished(frontier.is_empty());
        state = state.transition(finished).unwrap_or(finished);

        if state == CrawlState::Capped {
            tracing::info!(
                "Page limit of {} reached with {} URLs left in the frontier",
                max_pages,
                frontier.len()
            );
        }

        tracing::info!(
            "Crawl {}: {} fetched, {} failed in {:.1}s",
            state,
            visited.fetched_count(),
            visited.failed_count(),
            start_time.elapsed().as_secs_f64()
        );

        Ok(CrawlResult {
            target: self.target.clone(),
            state,
            pages,
            visited,
            fetch_statuses,
            blocked_by_robots,
            elapsed: start_time.elapsed(),
        })
    }

    fn build_page(
        &self,
        current: &QueuedUrl,
        final_url: Url,
        status: u16,
        content_type: String,
        body: String,
    ) -> Page {
        let parsed = parse_html(&body, &final_url);
        let source = current.url.to_string();

        let links = parsed
            .links
            .into_iter()
            .map(|raw: RawLink| Link {
                source: source.clone(),
                target: normalize(&raw.href, Some(&final_url)).ok(),
                raw: raw.href,
                anchor_text: raw.text,
                position: raw.position,
            })
            .collect::<Vec<_>>();

        tracing::debug!(
            "Parsed {} ({:?}): {} links, {} resources",
            current.url,
            parsed.title.as_deref().unwrap_or(""),
            links.len(),
            parsed.resources.len()
        );

        Page {
            url: current.url.clone(),
            key: current.key.clone(),
            final_url,
            status,
            content_type,
            html: body,
            depth: current.depth,
            links,
            resources: parsed.resources,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn crawler_with_robots(robots: &str) -> Crawler {
        let target = CrawlTarget::new("https://example.com/").unwrap();
        Crawler::new(Client::new(), target, CrawlerConfig::default())
            .with_robots(ParsedRobots::from_content(robots))
    }

    #[test]
    fn test_robots_crawl_delay_wins_when_longer() {
        let crawler = crawler_with_robots("User-agent: *\nCrawl-delay: 2");
        assert_eq!(crawler.politeness_delay(), Duration::from_secs(2));
    }

    #[test]
    fn test_shorter_robots_delay_keeps_configured() {
        let crawler = crawler_with_robots("User-agent: *\nCrawl-delay: 0.01");
        assert_eq!(crawler.politeness_delay(), Duration::from_millis(100));
    }

    #[test]
    fn test_out_of_range_crawl_delay_ignored() {
        for delay in ["1e20", "inf", "NaN", "-5"] {
            let crawler = crawler_with_robots(&format!("User-agent: *\nCrawl-delay: {}", delay));
            assert_eq!(
                crawler.politeness_delay(),
                Duration::from_millis(100),
                "{}",
                delay
            );
        }
    }
}
