//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests made by the crawler and the
//! link-oriented checks:
//! - Building the shared HTTP client
//! - GET requests for pages, classified by status and Content-Type
//! - HEAD-then-GET validity checks for link targets
//! - Error classification into link statuses
//!
//! There is no retry: every URL gets a single attempt per run.

use crate::config::CrawlerConfig;
use crate::url::is_login_walled_host;
use crate::FetchError;
use reqwest::{redirect::Policy, Client, StatusCode};
use std::fmt;
use std::time::Duration;
use url::Url;

/// Maximum redirect hops followed before a request counts as failed
const MAX_REDIRECTS: usize = 10;

/// Why a link was not checked
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SkipReason {
    /// mailto:, tel:, javascript:, data: and other non-HTTP schemes
    NonHttpScheme,
    /// Cloudflare `/cdn-cgi/l/email-protection` rewrites
    EmailProtection,
    /// Target on another host while external checking is off
    ThirdParty,
    /// Disallowed by robots.txt while robots compliance is on
    RobotsTxt,
    /// href could not be parsed as a URL
    InvalidUrl,
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let reason = match self {
            Self::NonHttpScheme => "non-http scheme",
            Self::EmailProtection => "email-protection",
            Self::ThirdParty => "third-party",
            Self::RobotsTxt => "robots.txt",
            Self::InvalidUrl => "invalid url",
        };
        write!(f, "{}", reason)
    }
}

/// Final classification of a link target
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkStatus {
    /// 2xx/3xx after redirects (or a login-walled 403)
    Ok(u16),
    /// 4xx/5xx
    Broken(u16),
    /// Network error or timeout
    Unreachable(String),
    Skipped(SkipReason),
}

impl LinkStatus {
    /// Broken or unreachable
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::Broken(_) | Self::Unreachable(_))
    }

    /// Human-readable status for reports
    pub fn describe(&self) -> String {
        match self {
            Self::Ok(code) => format!("OK ({})", code),
            Self::Broken(code) => format!("Status Code: {}", code),
            Self::Unreachable(error) => format!("Unreachable: {}", error),
            Self::Skipped(reason) => format!("Skipped ({})", reason),
        }
    }
}

/// Classifies an HTTP status for `url`
///
/// Anything below 400 is fine. A 403 from a login-walled host (Twitter/X)
/// is treated as fine too.
pub fn classify_status(url: &Url, status: u16) -> LinkStatus {
    if status < 400 || (status == 403 && is_login_walled_host(url)) {
        LinkStatus::Ok(status)
    } else {
        LinkStatus::Broken(status)
    }
}

/// Result of fetching a page with GET
#[derive(Debug)]
pub enum FetchOutcome {
    /// 2xx/3xx with an HTML body
    Html {
        final_url: Url,
        status: u16,
        content_type: String,
        body: String,
    },

    /// 2xx/3xx with a non-HTML Content-Type; the body is not read
    NonHtml {
        final_url: Url,
        status: u16,
        content_type: String,
    },

    /// 4xx/5xx
    HttpError { final_url: Url, status: u16 },

    /// The request did not produce a response
    Unreachable(FetchError),
}

impl FetchOutcome {
    /// Link classification of the fetched URL
    pub fn link_status(&self, url: &Url) -> LinkStatus {
        match self {
            Self::Html { status, .. } | Self::NonHtml { status, .. } => {
                classify_status(url, *status)
            }
            Self::HttpError { status, .. } => classify_status(url, *status),
            Self::Unreachable(error) => LinkStatus::Unreachable(error.to_string()),
        }
    }

    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Html { status, .. }
            | Self::NonHtml { status, .. }
            | Self::HttpError { status, .. } => Some(*status),
            Self::Unreachable(_) => None,
        }
    }
}

/// Builds the HTTP client shared by the crawler and the checks
///
/// # Arguments
///
/// * `config` - The crawler configuration (user agent, timeout)
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sumi_audit::config::CrawlerConfig;
/// use sumi_audit::crawler::build_http_client;
///
/// let client = build_http_client(&CrawlerConfig::default()).unwrap();
/// ```
pub fn build_http_client(config: &CrawlerConfig) -> Result<Client, reqwest::Error> {
    let timeout = config.request_timeout();

    Client::builder()
        .user_agent(config.user_agent.as_str())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(MAX_REDIRECTS))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Fetches a page with GET, following redirects
///
/// | Response | Outcome |
/// |----------|---------|
/// | 4xx/5xx | `HttpError` |
/// | 2xx/3xx, `text/html` or `application/xhtml+xml` | `Html` |
/// | 2xx/3xx, any other type | `NonHtml` |
/// | Timeout, connect, redirect loop, unreadable body | `Unreachable` |
pub async fn fetch_page(client: &Client, url: &Url) -> FetchOutcome {
    let response = match client.get(url.clone()).send().await {
        Ok(response) => response,
        Err(e) => return FetchOutcome::Unreachable(FetchError::from_reqwest(url.as_str(), &e)),
    };

    let status = response.status();
    let final_url = response.url().clone();

    if status.is_client_error() || status.is_server_error() {
        return FetchOutcome::HttpError {
            final_url,
            status: status.as_u16(),
        };
    }

    let content_type = response
        .headers()
        .get(reqwest::header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !is_html(&content_type) {
        return FetchOutcome::NonHtml {
            final_url,
            status: status.as_u16(),
            content_type,
        };
    }

    match response.text().await {
        Ok(body) => FetchOutcome::Html {
            final_url,
            status: status.as_u16(),
            content_type,
            body,
        },
        Err(e) => FetchOutcome::Unreachable(FetchError::from_reqwest(url.as_str(), &e)),
    }
}

/// Checks whether a link target answers, without reading its body
///
/// Sends HEAD first; servers that reject HEAD with 405 get a GET instead.
pub async fn check_url(client: &Client, url: &Url) -> LinkStatus {
    let status = match client.head(url.clone()).send().await {
        Ok(response) if response.status() == StatusCode::METHOD_NOT_ALLOWED => {
            tracing::debug!("HEAD not allowed for {}, retrying with GET", url);
            match client.get(url.clone()).send().await {
                Ok(response) => response.status(),
                Err(e) => {
                    return LinkStatus::Unreachable(
                        FetchError::from_reqwest(url.as_str(), &e).to_string(),
                    )
                }
            }
        }
        Ok(response) => response.status(),
        Err(e) => {
            return LinkStatus::Unreachable(FetchError::from_reqwest(url.as_str(), &e).to_string())
        }
    };

    classify_status(url, status.as_u16())
}

/// Returns true for HTML Content-Type values
fn is_html(content_type: &str) -> bool {
    let mime = content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase();
    mime == "text/html" || mime == "application/xhtml+xml"
}
