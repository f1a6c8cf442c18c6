use serde::Deserialize;
use std::time::Duration;

/// Default browser-like user agent; many sites answer bot agents with 403
pub const DEFAULT_USER_AGENT: &str = "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/131.0.0.0 Safari/537.36";

/// Main configuration structure for Sumi-Audit
///
/// Every section and key is optional in the TOML file; missing values fall
/// back to [`Config::default`].
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct Config {
    pub target: TargetConfig,
    pub crawler: CrawlerConfig,
    pub seo: SeoConfig,
    pub sitemap: SitemapConfig,
    pub profiler: ProfilerConfig,
    pub publish: PublishConfig,
}

/// The site under audit
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct TargetConfig {
    /// Seed URL; must start with http:// or https://
    #[serde(rename = "website-url")]
    pub website_url: Option<String>,
}

/// Crawler behavior configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct CrawlerConfig {
    /// Maximum number of pages fetched (successfully or not) in one run
    #[serde(rename = "max-pages")]
    pub max_pages: u32,

    /// Per-request timeout (milliseconds)
    #[serde(rename = "request-timeout-ms")]
    pub request_timeout_ms: u64,

    /// Politeness delay slept before every request (milliseconds)
    #[serde(rename = "crawl-delay-ms")]
    pub crawl_delay_ms: u64,

    /// User-Agent header sent with every request
    #[serde(rename = "user-agent")]
    pub user_agent: String,

    /// Skip URLs disallowed by the site's robots.txt
    #[serde(rename = "respect-robots")]
    pub respect_robots: bool,

    /// Check links pointing at other hosts (otherwise they are skipped)
    #[serde(rename = "check-external-links")]
    pub check_external_links: bool,
}

impl Default for CrawlerConfig {
    fn default() -> Self {
        Self {
            max_pages: 100,
            request_timeout_ms: 10_000,
            crawl_delay_ms: 100,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            respect_robots: false,
            check_external_links: true,
        }
    }
}

impl CrawlerConfig {
    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn crawl_delay(&self) -> Duration {
        Duration::from_millis(self.crawl_delay_ms)
    }
}

/// SEO auditor configuration
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct SeoConfig {
    /// Treat title/description length findings as failures
    pub strict: bool,
}

/// Sitemap reconciler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct SitemapConfig {
    /// How many sitemap-index levels are followed below the root sitemap
    #[serde(rename = "max-depth")]
    pub max_depth: u32,
}

impl Default for SitemapConfig {
    fn default() -> Self {
        Self { max_depth: 3 }
    }
}

/// Performance profiler configuration
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct ProfilerConfig {
    /// Navigation timeout (milliseconds)
    #[serde(rename = "page-load-timeout-ms")]
    pub page_load_timeout_ms: u64,

    /// Extra wait after network idle for late resources (milliseconds)
    #[serde(rename = "network-idle-delay-ms")]
    pub network_idle_delay_ms: u64,

    /// Length of each performance observation window (milliseconds)
    #[serde(rename = "observer-window-ms")]
    pub observer_window_ms: u64,

    #[serde(rename = "viewport-width")]
    pub viewport_width: u32,

    #[serde(rename = "viewport-height")]
    pub viewport_height: u32,

    /// WebDriver endpoint driving the browser
    #[serde(rename = "webdriver-url")]
    pub webdriver_url: String,
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        Self {
            page_load_timeout_ms: 60_000,
            network_idle_delay_ms: 2_000,
            observer_window_ms: 500,
            viewport_width: 1920,
            viewport_height: 1080,
            webdriver_url: "http://localhost:4444".to_string(),
        }
    }
}

impl ProfilerConfig {
    pub fn page_load_timeout(&self) -> Duration {
        Duration::from_millis(self.page_load_timeout_ms)
    }

    pub fn network_idle_delay(&self) -> Duration {
        Duration::from_millis(self.network_idle_delay_ms)
    }

    pub fn observer_window(&self) -> Duration {
        Duration::from_millis(self.observer_window_ms)
    }
}

/// Issue tracker configuration; publishing is disabled unless both token
/// and repository are set
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct PublishConfig {
    #[serde(rename = "github-token")]
    pub github_token: Option<String>,

    /// Repository in `owner/name` form
    #[serde(rename = "github-repository")]
    pub github_repository: Option<String>,

    /// Base URL of the GitHub REST API
    #[serde(rename = "api-url")]
    pub api_url: String,

    /// Master switch, set to false by `--no-publish`
    pub enabled: bool,
}

impl Default for PublishConfig {
    fn default() -> Self {
        Self {
            github_token: None,
            github_repository: None,
            api_url: "https://api.github.com".to_string(),
            enabled: true,
        }
    }
}

impl PublishConfig {
    /// Returns true when an issue tracker can actually be reached
    pub fn is_configured(&self) -> bool {
        self.enabled
            && self.github_token.as_deref().is_some_and(|t| !t.is_empty())
            && self
                .github_repository
                .as_deref()
                .is_some_and(|r| !r.is_empty())
    }
}
