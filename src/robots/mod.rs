//! Robots.txt handling module
//!
//! robots.txt is used two ways: as an opt-in filter for the crawler, and as
//! a fallback source of sitemap locations.

mod parser;

pub use parser::ParsedRobots;

use crate::url::CrawlTarget;
use reqwest::Client;

/// Fetches and parses robots.txt for the crawl target's site
///
/// Any failure (network error, non-2xx status, unreadable body) yields
/// [`ParsedRobots::allow_all`]; a missing robots.txt never stops a run.
///
/// # Arguments
///
/// * `client` - The shared HTTP client
/// * `target` - The crawl target whose origin is queried
pub async fn fetch_robots(client: &Client, target: &CrawlTarget) -> ParsedRobots {
    let robots_url = match target.seed().join("/robots.txt") {
        Ok(url) => url,
        Err(e) => {
            tracing::debug!("Cannot build robots.txt URL: {}", e);
            return ParsedRobots::allow_all();
        }
    };

    let response = match client.get(robots_url.clone()).send().await {
        Ok(response) => response,
        Err(e) => {
            tracing::debug!("Failed to fetch {}: {}", robots_url, e);
            return ParsedRobots::allow_all();
        }
    };

    if !response.status().is_success() {
        tracing::debug!("{} returned HTTP {}", robots_url, response.status());
        return ParsedRobots::allow_all();
    }

    match response.text().await {
        Ok(body) => {
            tracing::debug!("Loaded {} ({} bytes)", robots_url, body.len());
            ParsedRobots::from_content(&body)
        }
        Err(e) => {
            tracing::debug!("Failed to read {}: {}", robots_url, e);
            ParsedRobots::allow_all()
        }
    }
}
