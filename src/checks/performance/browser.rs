//! The browser capability the profiler drives
//!
//! Everything the profiler needs from a real browser goes through
//! [`BrowserEngine`], so the measurements and grading can be exercised
//! against a scripted engine.

use crate::BrowserError;
use async_trait::async_trait;
use serde::Deserialize;
use std::fmt;
use std::time::Duration;
use url::Url;

/// Navigation Timing of the main document, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct NavigationTiming {
    pub start_time: f64,
    pub redirect_time: f64,
    pub dns_lookup_time: f64,
    pub tcp_connect_time: f64,
    pub ssl_time: f64,

    /// `responseStart - requestStart`
    pub ttfb: f64,

    pub response_time: f64,
    pub dom_interactive: f64,
    pub dom_content_loaded: f64,
    pub load_event_end: f64,
    pub transfer_size: f64,
}

/// Paint Timing entries, in milliseconds
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct PaintTiming {
    pub first_paint: Option<f64>,
    pub first_contentful_paint: Option<f64>,
}

/// Performance entry types observed over a time window
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ObserverKind {
    LargestContentfulPaint,
    LayoutShift,
    LongTask,
}

impl ObserverKind {
    /// The `PerformanceObserver` entry type name
    pub fn entry_type(&self) -> &'static str {
        match self {
            Self::LargestContentfulPaint => "largest-contentful-paint",
            Self::LayoutShift => "layout-shift",
            Self::LongTask => "longtask",
        }
    }
}

/// One observed performance entry
///
/// `value` is only meaningful for layout shifts.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct ObservedEntry {
    pub start_time: f64,
    pub duration: f64,
    pub value: f64,
    pub had_recent_input: bool,
}

/// Coarse type of a network request
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceType {
    Document,
    Script,
    Stylesheet,
    Image,
    Font,
    Fetch,
    Other,
}

impl ResourceType {
    /// Classifies a request from its Content-Type, falling back to the
    /// Resource Timing initiator type
    pub fn classify(content_type: &str, initiator: &str) -> Self {
        let mime = content_type.to_ascii_lowercase();
        if mime.contains("html") {
            Self::Document
        } else if mime.contains("javascript") || mime.contains("ecmascript") {
            Self::Script
        } else if mime.contains("css") {
            Self::Stylesheet
        } else if mime.starts_with("image/") {
            Self::Image
        } else if mime.starts_with("font/") || mime.contains("font") {
            Self::Font
        } else {
            match initiator {
                "navigation" => Self::Document,
                "script" => Self::Script,
                "link" | "css" => Self::Stylesheet,
                "img" | "image" => Self::Image,
                "fetch" | "xmlhttprequest" | "beacon" => Self::Fetch,
                _ => Self::Other,
            }
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Document => "document",
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
            Self::Image => "image",
            Self::Font => "font",
            Self::Fetch => "fetch",
            Self::Other => "other",
        }
    }
}

impl fmt::Display for ResourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// One request/response pair seen while loading the page
#[derive(Debug, Clone, PartialEq)]
pub struct NetworkEntry {
    pub url: String,
    pub resource_type: ResourceType,
    pub status: Option<u16>,

    /// Milliseconds since navigation start
    pub start_ms: f64,
    pub end_ms: f64,

    /// Body bytes, or the declared Content-Length when the body size is unknown
    pub size: u64,

    pub content_type: String,
    pub cache_control: String,

    /// `none` when the response was not compressed
    pub content_encoding: String,
}

impl NetworkEntry {
    pub fn duration_ms(&self) -> f64 {
        (self.end_ms - self.start_ms).max(0.0)
    }
}

/// A browser session able to load one page and report what happened
///
/// Implementations own the session; [`BrowserEngine::close`] must be safe to
/// call after any failure.
#[async_trait]
pub trait BrowserEngine: Send {
    /// Loads `url`, failing if the load takes longer than `timeout`
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), BrowserError>;

    /// Waits until no new requests start, then for `settle` longer
    async fn wait_for_network_idle(
        &mut self,
        settle: Duration,
        timeout: Duration,
    ) -> Result<(), BrowserError>;

    async fn navigation_timing(&mut self) -> Result<Option<NavigationTiming>, BrowserError>;

    async fn paint_timing(&mut self) -> Result<PaintTiming, BrowserError>;

    /// Collects buffered and new entries of `kind` for `window`, then
    /// disconnects the observer
    async fn observe(
        &mut self,
        kind: ObserverKind,
        window: Duration,
    ) -> Result<Vec<ObservedEntry>, BrowserError>;

    /// Every request made by the page, each exactly once
    async fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError>;

    async fn close(&mut self) -> Result<(), BrowserError>;
}
