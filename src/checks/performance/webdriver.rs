//! [`BrowserEngine`] over a WebDriver session (chromedriver, geckodriver)
//!
//! Timings come from the page's own Performance APIs. Response headers are
//! not exposed to scripts, so each request seen in Resource Timing is probed
//! once with HEAD for its Content-Type, Cache-Control and Content-Encoding.

use crate::checks::performance::browser::{
    BrowserEngine, NavigationTiming, NetworkEntry, ObservedEntry, ObserverKind, PaintTiming,
    ResourceType,
};
use crate::config::ProfilerConfig;
use crate::BrowserError;
use async_trait::async_trait;
use fantoccini::{Client, ClientBuilder};
use reqwest::header::{
    HeaderMap, HeaderName, ACCEPT_ENCODING, CACHE_CONTROL, CONTENT_ENCODING, CONTENT_LENGTH,
    CONTENT_TYPE,
};
use serde::Deserialize;
use serde_json::{json, Value};
use std::time::{Duration, Instant};
use url::Url;

const IDLE_POLL_INTERVAL: Duration = Duration::from_millis(500);
const PROBE_TIMEOUT: Duration = Duration::from_secs(10);

const NAVIGATION_TIMING_JS: &str = r#"
const t = performance.getEntriesByType('navigation')[0];
if (!t) return null;
return {
    startTime: t.startTime,
    redirectTime: t.redirectEnd - t.redirectStart,
    dnsLookupTime: t.domainLookupEnd - t.domainLookupStart,
    tcpConnectTime: t.connectEnd - t.connectStart,
    sslTime: t.secureConnectionStart > 0 ? t.connectEnd - t.secureConnectionStart : 0,
    ttfb: t.responseStart - t.requestStart,
    responseTime: t.responseEnd - t.responseStart,
    domInteractive: t.domInteractive,
    domContentLoaded: t.domContentLoadedEventEnd,
    loadEventEnd: t.loadEventEnd,
    transferSize: t.transferSize || 0
};
"#;

const PAINT_TIMING_JS: &str = r#"
const entries = performance.getEntriesByType('paint');
const fp = entries.find(e => e.name === 'first-paint');
const fcp = entries.find(e => e.name === 'first-contentful-paint');
return {
    firstPaint: fp ? fp.startTime : null,
    firstContentfulPaint: fcp ? fcp.startTime : null
};
"#;

const OBSERVE_JS: &str = r#"
const [type, windowMs, done] = arguments;
const entries = [];
let observer;
try {
    observer = new PerformanceObserver(list => {
        for (const e of list.getEntries()) {
            entries.push({
                startTime: e.startTime,
                duration: e.duration || 0,
                value: e.value || 0,
                hadRecentInput: !!e.hadRecentInput
            });
        }
    });
    observer.observe({ type, buffered: true });
} catch (err) {
    done([]);
    return;
}
setTimeout(() => {
    observer.disconnect();
    done(entries);
}, windowMs);
"#;

const RESOURCE_COUNT_JS: &str = r#"
return performance.getEntriesByType('resource').length;
"#;

const NETWORK_LOG_JS: &str = r#"
const pick = (e, initiator) => ({
    name: e.name,
    initiatorType: initiator || e.initiatorType,
    startTime: e.startTime,
    responseEnd: e.responseEnd,
    transferSize: e.transferSize || 0,
    encodedBodySize: e.encodedBodySize || 0,
    responseStatus: e.responseStatus || 0
});
const out = [];
const nav = performance.getEntriesByType('navigation')[0];
if (nav) out.push(pick(nav, 'navigation'));
for (const e of performance.getEntriesByType('resource')) out.push(pick(e));
return out;
"#;

/// A Resource Timing entry as returned by the page
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct TimedRequest {
    name: String,
    initiator_type: String,
    start_time: f64,
    response_end: f64,
    transfer_size: f64,
    encoded_body_size: f64,
    response_status: u16,
}

/// Response headers learned from a HEAD probe
#[derive(Debug, Default)]
struct ProbedHeaders {
    status: Option<u16>,
    content_type: String,
    cache_control: String,
    content_encoding: String,
    content_length: Option<u64>,
}

impl ProbedHeaders {
    fn from_headers(status: u16, headers: &HeaderMap) -> Self {
        let text = |name: HeaderName| {
            headers
                .get(name)
                .and_then(|v| v.to_str().ok())
                .unwrap_or("")
                .to_string()
        };
        Self {
            status: Some(status),
            content_type: text(CONTENT_TYPE),
            cache_control: text(CACHE_CONTROL),
            content_encoding: text(CONTENT_ENCODING),
            content_length: headers
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse().ok()),
        }
    }
}

/// Browser session driven over the WebDriver protocol
pub struct WebDriverEngine {
    client: Option<Client>,
    probe: reqwest::Client,
}

impl WebDriverEngine {
    /// Starts a headless session on the configured WebDriver server
    ///
    /// # Arguments
    ///
    /// * `config` - WebDriver URL and viewport
    /// * `user_agent` - Sent by the header probe, matching the crawler
    pub async fn connect(
        config: &ProfilerConfig,
        user_agent: &str,
    ) -> Result<Self, BrowserError> {
        let mut capabilities = serde_json::Map::new();
        capabilities.insert(
            "goog:chromeOptions".to_string(),
            json!({
                "args": [
                    "--headless=new",
                    "--no-sandbox",
                    "--disable-dev-shm-usage",
                    "--disable-gpu",
                    format!("--window-size={},{}", config.viewport_width, config.viewport_height)
                ]
            }),
        );
        capabilities.insert(
            "moz:firefoxOptions".to_string(),
            json!({ "args": ["-headless"] }),
        );

        let client = ClientBuilder::native()
            .capabilities(capabilities)
            .connect(&config.webdriver_url)
            .await
            .map_err(|e| BrowserError::Launch(format!("{}: {}", config.webdriver_url, e)))?;
        tracing::debug!("Connected to WebDriver at {}", config.webdriver_url);

        if let Err(e) = client
            .set_window_size(config.viewport_width, config.viewport_height)
            .await
        {
            tracing::debug!("Could not set window size: {}", e);
        }

        let probe = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(PROBE_TIMEOUT)
            .no_gzip()
            .no_brotli()
            .build()
            .map_err(|e| BrowserError::Launch(e.to_string()))?;

        Ok(Self {
            client: Some(client),
            probe,
        })
    }

    fn client(&self) -> Result<&Client, BrowserError> {
        self.client
            .as_ref()
            .ok_or_else(|| BrowserError::Launch("session already closed".to_string()))
    }

    async fn execute(&self, script: &str, args: Vec<Value>) -> Result<Value, BrowserError> {
        self.client()?
            .execute(script, args)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn probe_headers(&self, url: &str) -> ProbedHeaders {
        if !(url.starts_with("http://") || url.starts_with("https://")) {
            return ProbedHeaders::default();
        }

        let request = self
            .probe
            .head(url)
            .header(ACCEPT_ENCODING, "gzip, deflate, br");
        match request.send().await {
            Ok(response) => {
                ProbedHeaders::from_headers(response.status().as_u16(), response.headers())
            }
            Err(e) => {
                tracing::debug!("Header probe failed for {}: {}", url, e);
                ProbedHeaders::default()
            }
        }
    }
}

#[async_trait]
impl BrowserEngine for WebDriverEngine {
    async fn navigate(&mut self, url: &Url, timeout: Duration) -> Result<(), BrowserError> {
        let client = self.client()?;
        match tokio::time::timeout(timeout, client.goto(url.as_str())).await {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(BrowserError::Navigation {
                url: url.to_string(),
                message: e.to_string(),
            }),
            Err(_) => Err(BrowserError::Timeout(timeout)),
        }
    }

    async fn wait_for_network_idle(
        &mut self,
        settle: Duration,
        timeout: Duration,
    ) -> Result<(), BrowserError> {
        let deadline = Instant::now() + timeout;
        let mut last_count: Option<u64> = None;

        while Instant::now() < deadline {
            let count = self.execute(RESOURCE_COUNT_JS, Vec::new()).await?.as_u64();
            if count.is_some() && count == last_count {
                break;
            }
            last_count = count;
            tokio::time::sleep(IDLE_POLL_INTERVAL).await;
        }

        tokio::time::sleep(settle).await;
        Ok(())
    }

    async fn navigation_timing(&mut self) -> Result<Option<NavigationTiming>, BrowserError> {
        let value = self.execute(NAVIGATION_TIMING_JS, Vec::new()).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn paint_timing(&mut self) -> Result<PaintTiming, BrowserError> {
        let value = self.execute(PAINT_TIMING_JS, Vec::new()).await?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn observe(
        &mut self,
        kind: ObserverKind,
        window: Duration,
    ) -> Result<Vec<ObservedEntry>, BrowserError> {
        let args = vec![json!(kind.entry_type()), json!(window.as_millis() as u64)];
        let value = self
            .client()?
            .execute_async(OBSERVE_JS, args)
            .await
            .map_err(|e| BrowserError::Script(e.to_string()))?;
        serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))
    }

    async fn network_log(&mut self) -> Result<Vec<NetworkEntry>, BrowserError> {
        let value = self.execute(NETWORK_LOG_JS, Vec::new()).await?;
        let requests: Vec<TimedRequest> =
            serde_json::from_value(value).map_err(|e| BrowserError::Script(e.to_string()))?;

        let mut entries = Vec::with_capacity(requests.len());
        for request in requests {
            let headers = self.probe_headers(&request.name).await;

            let size = if request.encoded_body_size > 0.0 {
                request.encoded_body_size as u64
            } else {
                headers
                    .content_length
                    .unwrap_or(request.transfer_size as u64)
            };
            let status = match request.response_status {
                0 => headers.status,
                status => Some(status),
            };
            let content_encoding = if headers.content_encoding.is_empty() {
                "none".to_string()
            } else {
                headers.content_encoding
            };

            entries.push(NetworkEntry {
                resource_type: ResourceType::classify(
                    &headers.content_type,
                    &request.initiator_type,
                ),
                url: request.name,
                status,
                start_ms: request.start_time,
                end_ms: request.response_end.max(request.start_time),
                size,
                content_type: headers.content_type,
                cache_control: headers.cache_control,
                content_encoding,
            });
        }

        tracing::debug!("Captured {} requests", entries.len());
        Ok(entries)
    }

    async fn close(&mut self) -> Result<(), BrowserError> {
        match self.client.take() {
            Some(client) => client
                .close()
                .await
                .map_err(|e| BrowserError::Script(e.to_string())),
            None => Ok(()),
        }
    }
}
