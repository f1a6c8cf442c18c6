//! Sumi-Audit: a polite website auditor
//!
//! This crate crawls a single site breadth-first, runs a set of quality checks
//! (broken links, SEO tags, sitemap consistency, page-load performance) over
//! what it found, and renders the findings into one severity-ranked report
//! with a pass/fail verdict.

pub mod audit;
pub mod checks;
pub mod config;
pub mod crawler;
pub mod publish;
pub mod report;
pub mod robots;
pub mod state;
pub mod url;

use std::time::Duration;
use thiserror::Error;

/// Main error type for Sumi-Audit operations
#[derive(Debug, Error)]
pub enum AuditError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("URL error: {0}")]
    UrlError(#[from] UrlError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Parse error: {0}")]
    Parse(#[from] ParseError),

    #[error("Publish error: {0}")]
    Publish(#[from] PublishError),

    #[error("Browser error: {0}")]
    Browser(#[from] BrowserError),

    #[error("Seed URL {url} could not be reached: {reason}")]
    SeedUnreachable { url: String, reason: String },

    #[error("HTTP client error: {0}")]
    Reqwest(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Configuration-specific errors
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse TOML: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid URL in config: {0}")]
    InvalidUrl(String),

    #[error("Invalid value for {key}: '{value}'")]
    InvalidValue { key: String, value: String },
}

/// URL-specific errors
#[derive(Debug, Error)]
pub enum UrlError {
    #[error("Failed to parse URL: {0}")]
    Parse(String),

    #[error("Invalid URL scheme: {0}")]
    InvalidScheme(String),

    #[error("Missing domain in URL")]
    MissingDomain,

    #[error("Malformed URL: {0}")]
    Malformed(String),
}

/// Network-level failures while fetching a URL
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("Request timeout for {url}")]
    Timeout { url: String },

    #[error("Connection failed for {url}: {message}")]
    Connect { url: String, message: String },

    #[error("Too many redirects from {url}")]
    RedirectLimit { url: String },

    #[error("Request to {url} failed: {message}")]
    Request { url: String, message: String },
}

impl FetchError {
    /// Classifies a reqwest error for the given URL
    pub fn from_reqwest(url: &str, err: &reqwest::Error) -> Self {
        let url = url.to_string();
        if err.is_timeout() {
            FetchError::Timeout { url }
        } else if err.is_redirect() {
            FetchError::RedirectLimit { url }
        } else if err.is_connect() {
            FetchError::Connect {
                url,
                message: err.to_string(),
            }
        } else {
            FetchError::Request {
                url,
                message: err.to_string(),
            }
        }
    }
}

/// Malformed HTML or XML documents
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("HTML parse error for {url}: {message}")]
    Html { url: String, message: String },

    #[error("Sitemap parse error for {url}: {message}")]
    Sitemap { url: String, message: String },
}

/// Failures of the external issue tracker
#[derive(Debug, Error)]
pub enum PublishError {
    #[error("Issue publishing is not configured")]
    NotConfigured,

    #[error("Issue tracker request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("Issue tracker rejected the issue (HTTP {status}): {body}")]
    Rejected { status: u16, body: String },
}

/// Failures of the browser automation session
#[derive(Debug, Error)]
pub enum BrowserError {
    #[error("Failed to start browser session: {0}")]
    Launch(String),

    #[error("Navigation to {url} failed: {message}")]
    Navigation { url: String, message: String },

    #[error("Script evaluation failed: {0}")]
    Script(String),

    #[error("Browser did not answer within {0:?}")]
    Timeout(Duration),
}

/// Result type alias for Sumi-Audit operations
pub type Result<T> = std::result::Result<T, AuditError>;

/// Result type alias for configuration operations
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// Result type alias for URL operations
pub type UrlResult<T> = std::result::Result<T, UrlError>;

// Re-export commonly used types
pub use audit::{AuditReport, Auditor};
pub use config::Config;
pub use report::{Category, Finding, Severity};
pub use state::{CrawlState, VisitStatus, VisitedSet};
pub use crate::url::{in_scope, is_third_party, normalize, CrawlTarget};
