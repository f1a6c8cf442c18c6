//! Page-load performance profiling
//!
//! The profiler loads one page in a real browser, measures Core Web Vitals
//! and the network activity of the load, grades the result and renders it
//! with a request waterfall.

mod browser;
mod metrics;
mod scoring;
mod waterfall;
mod webdriver;

pub use browser::{
    BrowserEngine, NavigationTiming, NetworkEntry, ObservedEntry, ObserverKind, PaintTiming,
    ResourceType,
};
pub use metrics::{analyze_resources, PageMetrics, ResourceAnalysis, TypeBreakdown};
pub use scoring::{identify_issues, score, Grade, ScoreInputs, VitalStatus};
pub use waterfall::render_waterfall;
pub use webdriver::WebDriverEngine;

use crate::checks::CheckKind;
use crate::config::ProfilerConfig;
use crate::report::{format_bytes, format_time, pass_badge, table, CheckReport};
use crate::BrowserError;
use url::Url;

/// Everything measured during one page load
#[derive(Debug, Clone)]
pub struct PerformanceSample {
    pub url: Url,
    pub metrics: PageMetrics,
    pub resources: Vec<NetworkEntry>,
    pub analysis: ResourceAnalysis,
    pub score: u32,
    pub grade: Grade,
}

impl PerformanceSample {
    /// Grades raw measurements
    pub fn new(url: Url, metrics: PageMetrics, resources: Vec<NetworkEntry>) -> Self {
        let analysis = analyze_resources(&resources, &url);
        let score = score(&ScoreInputs::from_sample(&metrics, &analysis));
        Self {
            url,
            metrics,
            resources,
            analysis,
            score,
            grade: Grade::from_score(score),
        }
    }

    /// Headline shown next to the report title, e.g. `🟡 Grade C`
    pub fn badge(&self) -> String {
        format!("{} Grade {}", self.grade.glyph(), self.grade)
    }
}

/// Drives a [`BrowserEngine`] through one measured page load
pub struct Profiler {
    config: ProfilerConfig,
}

impl Profiler {
    pub fn new(config: &ProfilerConfig) -> Self {
        Self {
            config: config.clone(),
        }
    }

    /// Loads `url` and collects every measurement
    ///
    /// The engine is left open; see [`Profiler::profile`].
    pub async fn sample(
        &self,
        engine: &mut dyn BrowserEngine,
        url: &Url,
    ) -> Result<PerformanceSample, BrowserError> {
        tracing::info!("Profiling {}", url);

        engine.navigate(url, self.config.page_load_timeout()).await?;
        engine
            .wait_for_network_idle(
                self.config.network_idle_delay(),
                self.config.page_load_timeout(),
            )
            .await?;

        let window = self.config.observer_window();
        let navigation = engine.navigation_timing().await?;
        let paint = engine.paint_timing().await?;
        let lcp = engine
            .observe(ObserverKind::LargestContentfulPaint, window)
            .await?;
        let shifts = engine.observe(ObserverKind::LayoutShift, window).await?;
        let long_tasks = engine.observe(ObserverKind::LongTask, window).await?;
        let resources = engine.network_log().await?;

        if navigation.is_none() {
            tracing::warn!("No navigation timing available for {}", url);
        }

        let metrics =
            PageMetrics::compute(navigation.as_ref(), &paint, &lcp, &shifts, &long_tasks);
        Ok(PerformanceSample::new(url.clone(), metrics, resources))
    }

    /// Samples `url`, then closes the engine whatever the outcome
    pub async fn profile(
        &self,
        engine: &mut dyn BrowserEngine,
        url: &Url,
    ) -> Result<PerformanceSample, BrowserError> {
        let result = self.sample(engine, url).await;
        if let Err(e) = engine.close().await {
            tracing::warn!("Failed to close browser session: {}", e);
        }
        result
    }

    /// Profiles `url` and builds the performance report
    ///
    /// A browser failure yields a failed report carrying the error.
    pub async fn run(&self, engine: &mut dyn BrowserEngine, url: &Url) -> CheckReport {
        match self.profile(engine, url).await {
            Ok(sample) => {
                tracing::info!(
                    "Performance: score {}/100, grade {}",
                    sample.score,
                    sample.grade
                );
                build_report(&sample)
            }
            Err(e) => failed_report(url, &e),
        }
    }
}

/// Report for a page that could not be profiled
pub fn failed_report(url: &Url, error: &BrowserError) -> CheckReport {
    tracing::error!("Profiling {} failed: {}", url, error);
    let mut report = CheckReport::new(CheckKind::Performance, false);
    report.badge = pass_badge(false).to_string();
    report.note(format!("Could not profile {}: {}", url, error));
    report
}

fn ms(value: f64) -> String {
    format_time(value.max(0.0).round() as u64)
}

/// Renders a graded sample as a check report
pub fn build_report(sample: &PerformanceSample) -> CheckReport {
    let metrics = &sample.metrics;
    let analysis = &sample.analysis;

    let mut report = CheckReport::new(CheckKind::Performance, sample.grade.passes());
    report.badge = sample.badge();

    report.metric("URL", sample.url.as_str());
    report.metric(
        "Performance Grade",
        format!(
            "{} **{}** (Score: {}/100)",
            sample.grade.glyph(),
            sample.grade,
            sample.score
        ),
    );
    report.metric("Total Page Size", format_bytes(analysis.total_size));
    report.metric("Total Requests", analysis.total_requests);
    report.metric(
        "Third-Party Requests",
        format!(
            "{} ({})",
            analysis.third_party_count,
            format_bytes(analysis.third_party_size)
        ),
    );

    report
        .findings
        .extend(identify_issues(sample.url.as_str(), metrics, analysis));

    report.section(
        "Core Web Vitals",
        table(
            &["Metric", "Value", "Status"],
            &[
                vec![
                    "Largest Contentful Paint (LCP)".to_string(),
                    ms(metrics.lcp),
                    VitalStatus::lcp(metrics.lcp).label().to_string(),
                ],
                vec![
                    "Total Blocking Time (TBT)".to_string(),
                    ms(metrics.tbt),
                    VitalStatus::tbt(metrics.tbt).label().to_string(),
                ],
                vec![
                    "Cumulative Layout Shift (CLS)".to_string(),
                    metrics.cls.to_string(),
                    VitalStatus::cls(metrics.cls).label().to_string(),
                ],
            ],
        ),
    );

    report.section(
        "Timing Metrics",
        table(
            &["Metric", "Value"],
            &[
                vec!["Time to First Byte (TTFB)".to_string(), ms(metrics.ttfb)],
                vec!["First Contentful Paint (FCP)".to_string(), ms(metrics.fcp)],
                vec!["Time to Interactive (TTI)".to_string(), ms(metrics.tti)],
                vec!["DOM Content Loaded".to_string(), ms(metrics.dom_content_loaded)],
                vec!["Fully Loaded".to_string(), ms(metrics.load_event_end)],
            ],
        ),
    );

    let breakdown: Vec<Vec<String>> = analysis
        .by_type
        .iter()
        .map(|(kind, totals)| {
            vec![
                kind.to_string(),
                totals.count.to_string(),
                format_bytes(totals.size),
            ]
        })
        .collect();
    report.section("Resource Breakdown", table(&["Type", "Count", "Size"], &breakdown));

    report.section(
        "Connection Timing",
        table(
            &["Phase", "Duration"],
            &[
                vec!["DNS Lookup".to_string(), ms(metrics.dns_lookup)],
                vec!["TCP Connect".to_string(), ms(metrics.tcp_connect)],
                vec!["SSL/TLS".to_string(), ms(metrics.ssl)],
                vec!["Redirect".to_string(), ms(metrics.redirect)],
                vec!["Response".to_string(), ms(metrics.response)],
            ],
        ),
    );

    report.section("Waterfall Chart", render_waterfall(&sample.resources));

    report
}
