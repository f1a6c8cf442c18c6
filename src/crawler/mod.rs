//! Crawler module for web page fetching and processing
//!
//! This module contains the core crawling logic, including:
//! - HTTP fetching and status classification
//! - HTML parsing and link/resource extraction
//! - The breadth-first frontier
//! - Overall crawl coordination

mod coordinator;
mod fetcher;
mod frontier;
mod page;
mod parser;

pub use coordinator::{CrawlResult, Crawler};
pub use fetcher::{
    build_http_client, check_url, classify_status, fetch_page, FetchOutcome, LinkStatus,
    SkipReason,
};
pub use frontier::{Frontier, QueuedUrl};
pub use page::{Link, Page, Resource, ResourceKind};
pub use parser::{parse_html, ParsedPage, RawLink};

use crate::config::Config;
use crate::robots::fetch_robots;
use crate::url::CrawlTarget;
use crate::AuditError;
use reqwest::Client;

/// Runs a complete crawl operation
///
/// This is the main entry point for starting a crawl. It will:
/// 1. Fetch robots.txt when robots compliance is enabled
/// 2. Crawl breadth-first from the seed up to the page cap
/// 3. Return every page and classification gathered
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `target` - The seed and its scope
/// * `config` - The audit configuration
pub async fn crawl(
    client: &Client,
    target: &CrawlTarget,
    config: &Config,
) -> Result<CrawlResult, AuditError> {
    let mut crawler = Crawler::new(client.clone(), target.clone(), config.crawler.clone());

    if config.crawler.respect_robots {
        let robots = fetch_robots(client, target).await;
        crawler = crawler.with_robots(robots);
    }

    crawler.run().await
}
