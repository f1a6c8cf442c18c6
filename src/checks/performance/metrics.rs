//! Page-level metrics and resource analysis
//!
//! LCP is the largest candidate start time seen in the observation window
//! and TTI is `max(domContentLoaded, FCP, last long task end)`. Both are
//! approximations; the grading thresholds assume exactly these formulas.

use crate::checks::performance::browser::{
    NavigationTiming, NetworkEntry, ObservedEntry, PaintTiming, ResourceType,
};
use crate::url::is_third_party;
use std::collections::BTreeMap;
use url::Url;

/// Portion of a long task that does not count as blocking
const LONG_TASK_BUDGET_MS: f64 = 50.0;

pub const LARGE_IMAGE_BYTES: u64 = 100_000;
pub const COMPRESSIBLE_MIN_BYTES: u64 = 1_000;
pub const UNCACHED_LIMIT: usize = 10;

/// Timing metrics of one page load, in milliseconds (CLS is unitless)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PageMetrics {
    pub ttfb: f64,
    pub first_paint: f64,
    pub fcp: f64,
    pub lcp: f64,
    pub cls: f64,
    pub tbt: f64,
    pub tti: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded: f64,
    pub load_event_end: f64,
    pub redirect: f64,
    pub dns_lookup: f64,
    pub tcp_connect: f64,
    pub ssl: f64,
    pub response: f64,
}

impl PageMetrics {
    /// Derives the page metrics from raw browser measurements
    pub fn compute(
        navigation: Option<&NavigationTiming>,
        paint: &PaintTiming,
        lcp_entries: &[ObservedEntry],
        layout_shifts: &[ObservedEntry],
        long_tasks: &[ObservedEntry],
    ) -> Self {
        let fcp = paint.first_contentful_paint.unwrap_or(0.0);
        let nav = navigation.cloned().unwrap_or_default();
        let tti = if navigation.is_some() {
            time_to_interactive(nav.dom_content_loaded, fcp, long_tasks)
        } else {
            0.0
        };

        Self {
            ttfb: nav.ttfb,
            first_paint: paint.first_paint.unwrap_or(0.0),
            fcp,
            lcp: largest_contentful_paint(lcp_entries),
            cls: cumulative_layout_shift(layout_shifts),
            tbt: total_blocking_time(long_tasks),
            tti,
            dom_interactive: nav.dom_interactive,
            dom_content_loaded: nav.dom_content_loaded,
            load_event_end: nav.load_event_end,
            redirect: nav.redirect_time,
            dns_lookup: nav.dns_lookup_time,
            tcp_connect: nav.tcp_connect_time,
            ssl: nav.ssl_time,
            response: nav.response_time,
        }
    }
}

/// Largest candidate start time, or 0 when nothing was observed
pub fn largest_contentful_paint(entries: &[ObservedEntry]) -> f64 {
    entries
        .iter()
        .map(|e| e.start_time)
        .fold(0.0, f64::max)
}

/// Sum of shifts not caused by recent input, rounded to three decimals
pub fn cumulative_layout_shift(entries: &[ObservedEntry]) -> f64 {
    let sum: f64 = entries
        .iter()
        .filter(|e| !e.had_recent_input)
        .map(|e| e.value)
        .sum();
    (sum * 1000.0).round() / 1000.0
}

/// Sum over long tasks of the time beyond 50ms
pub fn total_blocking_time(long_tasks: &[ObservedEntry]) -> f64 {
    long_tasks
        .iter()
        .map(|t| (t.duration - LONG_TASK_BUDGET_MS).max(0.0))
        .sum()
}

/// `max(domContentLoaded, FCP, end of the last long task)`
pub fn time_to_interactive(
    dom_content_loaded: f64,
    fcp: f64,
    long_tasks: &[ObservedEntry],
) -> f64 {
    let last_task_end = long_tasks
        .iter()
        .max_by(|a, b| a.start_time.total_cmp(&b.start_time))
        .map_or(0.0, |t| t.start_time + t.duration);
    dom_content_loaded.max(fcp).max(last_task_end)
}

/// Request count and bytes of one resource type
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TypeBreakdown {
    pub count: usize,
    pub size: u64,
}

/// Aggregates over every request the page made
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResourceAnalysis {
    pub total_size: u64,
    pub total_requests: usize,
    pub by_type: BTreeMap<ResourceType, TypeBreakdown>,
    pub third_party_count: usize,
    pub third_party_size: u64,

    /// Requests without Cache-Control, or marked no-cache/no-store
    pub uncached_count: usize,

    /// Text-like responses over 1KB served without compression
    pub uncompressed: Vec<String>,

    /// Images over 100KB
    pub large_images: Vec<String>,
}

/// Analyzes the network log of a page loaded from `page_url`
pub fn analyze_resources(entries: &[NetworkEntry], page_url: &Url) -> ResourceAnalysis {
    let mut analysis = ResourceAnalysis {
        total_requests: entries.len(),
        ..ResourceAnalysis::default()
    };

    for entry in entries {
        analysis.total_size += entry.size;

        let breakdown = analysis.by_type.entry(entry.resource_type).or_default();
        breakdown.count += 1;
        breakdown.size += entry.size;

        let third_party = Url::parse(&entry.url)
            .map(|url| is_third_party(&url, page_url))
            .unwrap_or(false);
        if third_party {
            analysis.third_party_count += 1;
            analysis.third_party_size += entry.size;
        }

        if is_uncached(&entry.cache_control) {
            analysis.uncached_count += 1;
        }

        if entry.size > COMPRESSIBLE_MIN_BYTES
            && is_uncompressed(&entry.content_encoding)
            && is_text_like(&entry.content_type)
        {
            analysis.uncompressed.push(entry.url.clone());
        }

        if entry.resource_type == ResourceType::Image && entry.size > LARGE_IMAGE_BYTES {
            analysis.large_images.push(entry.url.clone());
        }
    }

    analysis
}

fn is_uncached(cache_control: &str) -> bool {
    let value = cache_control.to_ascii_lowercase();
    value.trim().is_empty() || value.contains("no-cache") || value.contains("no-store")
}

fn is_uncompressed(content_encoding: &str) -> bool {
    let value = content_encoding.trim().to_ascii_lowercase();
    value.is_empty() || value == "none" || value == "identity"
}

fn is_text_like(content_type: &str) -> bool {
    let value = content_type.to_ascii_lowercase();
    ["text", "javascript", "json", "css"]
        .iter()
        .any(|kind| value.contains(kind))
}
