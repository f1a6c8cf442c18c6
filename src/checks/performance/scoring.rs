//! Performance score, letter grade and findings
//!
//! The score is a pure function of six inputs. It starts at 100 and loses
//! points per threshold crossed:
//!
//! | Input | Poor | Needs improvement |
//! |-------|------|-------------------|
//! | LCP | > 4000ms: -25 | > 2500ms: -10 |
//! | TBT | > 600ms: -25 | > 200ms: -10 |
//! | CLS | > 0.25: -20 | > 0.1: -8 |
//! | Transferred bytes | > 5MB: -15 | > 3MB: -8 |
//! | Requests | > 100: -10 | > 50: -5 |
//! | TTFB | > 800ms: -10 | |

use crate::checks::performance::metrics::{PageMetrics, ResourceAnalysis, UNCACHED_LIMIT};
use crate::report::{format_bytes, Category, Finding, Metric, Severity};
use std::fmt;

pub const LCP_POOR_MS: f64 = 4000.0;
pub const LCP_GOOD_MS: f64 = 2500.0;
pub const TBT_POOR_MS: f64 = 600.0;
pub const TBT_GOOD_MS: f64 = 200.0;
pub const CLS_POOR: f64 = 0.25;
pub const CLS_GOOD: f64 = 0.1;
pub const SIZE_POOR_BYTES: u64 = 5_000_000;
pub const SIZE_GOOD_BYTES: u64 = 3_000_000;
pub const REQUESTS_POOR: usize = 100;
pub const REQUESTS_GOOD: usize = 50;
pub const TTFB_SLOW_MS: f64 = 800.0;
pub const FCP_SLOW_MS: f64 = 1800.0;
pub const THIRD_PARTY_HEAVY_BYTES: u64 = 500_000;

/// The inputs the score depends on
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    pub lcp_ms: f64,
    pub tbt_ms: f64,
    pub cls: f64,
    pub total_bytes: u64,
    pub requests: usize,
    pub ttfb_ms: f64,
}

impl ScoreInputs {
    pub fn from_sample(metrics: &PageMetrics, analysis: &ResourceAnalysis) -> Self {
        Self {
            lcp_ms: metrics.lcp,
            tbt_ms: metrics.tbt,
            cls: metrics.cls,
            total_bytes: analysis.total_size,
            requests: analysis.total_requests,
            ttfb_ms: metrics.ttfb,
        }
    }
}

/// Computes the 0-100 performance score
///
/// # Example
///
/// ```
/// use sumi_audit::checks::performance::{score, Grade, ScoreInputs};
///
/// let inputs = ScoreInputs { lcp_ms: 5000.0, ..ScoreInputs::default() };
/// assert_eq!(score(&inputs), 75);
/// assert_eq!(Grade::from_score(75), Grade::C);
/// ```
pub fn score(inputs: &ScoreInputs) -> u32 {
    let mut score: i32 = 100;

    score -= penalty(inputs.lcp_ms > LCP_POOR_MS, inputs.lcp_ms > LCP_GOOD_MS, 25, 10);
    score -= penalty(inputs.tbt_ms > TBT_POOR_MS, inputs.tbt_ms > TBT_GOOD_MS, 25, 10);
    score -= penalty(inputs.cls > CLS_POOR, inputs.cls > CLS_GOOD, 20, 8);
    score -= penalty(
        inputs.total_bytes > SIZE_POOR_BYTES,
        inputs.total_bytes > SIZE_GOOD_BYTES,
        15,
        8,
    );
    score -= penalty(
        inputs.requests > REQUESTS_POOR,
        inputs.requests > REQUESTS_GOOD,
        10,
        5,
    );
    if inputs.ttfb_ms > TTFB_SLOW_MS {
        score -= 10;
    }

    score.clamp(0, 100) as u32
}

fn penalty(poor: bool, needs_improvement: bool, poor_points: i32, improvement_points: i32) -> i32 {
    if poor {
        poor_points
    } else if needs_improvement {
        improvement_points
    } else {
        0
    }
}

/// Letter grade of a score
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Grade {
    A,
    B,
    C,
    D,
    F,
}

impl Grade {
    pub fn from_score(score: u32) -> Self {
        match score {
            90.. => Self::A,
            80..=89 => Self::B,
            70..=79 => Self::C,
            60..=69 => Self::D,
            _ => Self::F,
        }
    }

    pub fn glyph(&self) -> &'static str {
        match self {
            Self::A | Self::B => "🟢",
            Self::C => "🟡",
            Self::D => "🟠",
            Self::F => "🔴",
        }
    }

    /// C or better passes
    pub fn passes(&self) -> bool {
        *self <= Self::C
    }
}

impl fmt::Display for Grade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            Self::A => "A",
            Self::B => "B",
            Self::C => "C",
            Self::D => "D",
            Self::F => "F",
        };
        write!(f, "{}", letter)
    }
}

/// Core Web Vitals rating
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VitalStatus {
    Good,
    NeedsImprovement,
    Poor,
}

impl VitalStatus {
    fn rate(poor: bool, needs_improvement: bool) -> Self {
        if poor {
            Self::Poor
        } else if needs_improvement {
            Self::NeedsImprovement
        } else {
            Self::Good
        }
    }

    pub fn lcp(ms: f64) -> Self {
        Self::rate(ms > LCP_POOR_MS, ms > LCP_GOOD_MS)
    }

    pub fn tbt(ms: f64) -> Self {
        Self::rate(ms > TBT_POOR_MS, ms > TBT_GOOD_MS)
    }

    pub fn cls(value: f64) -> Self {
        Self::rate(value > CLS_POOR, value > CLS_GOOD)
    }

    pub fn label(&self) -> &'static str {
        match self {
            Self::Good => "🟢 Good",
            Self::NeedsImprovement => "🟡 Needs Improvement",
            Self::Poor => "🔴 Poor",
        }
    }
}

/// Findings for a profiled page, independent of the score
pub fn identify_issues(
    page_url: &str,
    metrics: &PageMetrics,
    analysis: &ResourceAnalysis,
) -> Vec<Finding> {
    let mut findings = Vec::new();
    let issue = |metric: Metric, severity: Severity, title: &str, message: String, fix: &str| {
        Finding::new(Category::PerformanceMetric(metric), severity, page_url, message)
            .with_title(title)
            .with_recommendation(fix)
    };

    let lcp = metrics.lcp.round();
    match VitalStatus::lcp(metrics.lcp) {
        VitalStatus::Poor => findings.push(issue(
            Metric::Lcp,
            Severity::High,
            "Poor Largest Contentful Paint (LCP)",
            format!("LCP is {}ms (should be < 2500ms)", lcp),
            "Optimize the largest content element, lazy load below-the-fold content, compress images and improve server response time.",
        )),
        VitalStatus::NeedsImprovement => findings.push(issue(
            Metric::Lcp,
            Severity::Medium,
            "Needs Improvement: Largest Contentful Paint (LCP)",
            format!("LCP is {}ms (should be < 2500ms)", lcp),
            "Optimize images, reduce render-blocking resources and improve server response time.",
        )),
        VitalStatus::Good => {}
    }

    let tbt = metrics.tbt.round();
    match VitalStatus::tbt(metrics.tbt) {
        VitalStatus::Poor => findings.push(issue(
            Metric::Tbt,
            Severity::High,
            "Poor Total Blocking Time (TBT)",
            format!("TBT is {}ms (should be < 200ms)", tbt),
            "Break up long JavaScript tasks, defer non-critical scripts and minimize main-thread work.",
        )),
        VitalStatus::NeedsImprovement => findings.push(issue(
            Metric::Tbt,
            Severity::Medium,
            "Needs Improvement: Total Blocking Time (TBT)",
            format!("TBT is {}ms (should be < 200ms)", tbt),
            "Break up long JavaScript tasks and defer non-critical scripts.",
        )),
        VitalStatus::Good => {}
    }

    match VitalStatus::cls(metrics.cls) {
        VitalStatus::Poor => findings.push(issue(
            Metric::Cls,
            Severity::High,
            "Poor Cumulative Layout Shift (CLS)",
            format!("CLS is {} (should be < 0.1)", metrics.cls),
            "Give images and videos explicit dimensions, avoid inserting content above existing content and animate with CSS transforms.",
        )),
        VitalStatus::NeedsImprovement => findings.push(issue(
            Metric::Cls,
            Severity::Medium,
            "Needs Improvement: Cumulative Layout Shift (CLS)",
            format!("CLS is {} (should be < 0.1)", metrics.cls),
            "Give images and videos explicit dimensions to prevent layout shifts.",
        )),
        VitalStatus::Good => {}
    }

    if metrics.ttfb > TTFB_SLOW_MS {
        findings.push(issue(
            Metric::Ttfb,
            Severity::Medium,
            "Slow Time to First Byte (TTFB)",
            format!("TTFB is {}ms (should be < 800ms)", metrics.ttfb.round()),
            "Tune the server, serve through a CDN, reduce server-side processing and cache responses.",
        ));
    }

    if metrics.fcp > FCP_SLOW_MS {
        findings.push(issue(
            Metric::Fcp,
            Severity::Medium,
            "Slow First Contentful Paint (FCP)",
            format!("FCP is {}ms (should be < 1800ms)", metrics.fcp.round()),
            "Eliminate render-blocking resources, minify CSS and defer non-critical CSS.",
        ));
    }

    let size = format!(
        "Total page size is {} (should be < 3MB ideally)",
        format_bytes(analysis.total_size)
    );
    if analysis.total_size > SIZE_POOR_BYTES {
        findings.push(issue(
            Metric::PageSize,
            Severity::High,
            "Very Large Page Size",
            size,
            "Compress and resize images, minify CSS and JavaScript, enable text compression and remove unused code.",
        ));
    } else if analysis.total_size > SIZE_GOOD_BYTES {
        findings.push(issue(
            Metric::PageSize,
            Severity::Medium,
            "Large Page Size",
            size,
            "Optimize images and minify resources.",
        ));
    }

    if analysis.total_requests > REQUESTS_POOR {
        findings.push(issue(
            Metric::RequestCount,
            Severity::Medium,
            "Too Many HTTP Requests",
            format!("{} requests (should be < 50 ideally)", analysis.total_requests),
            "Bundle CSS and JavaScript, use sprites and lazy load images.",
        ));
    }

    if !analysis.uncompressed.is_empty() {
        findings.push(issue(
            Metric::Compression,
            Severity::Medium,
            "Uncompressed Text Resources",
            format!(
                "{} text-based resources are not compressed",
                analysis.uncompressed.len()
            ),
            "Enable Gzip or Brotli compression for text-based resources.",
        ));
    }

    if !analysis.large_images.is_empty() {
        findings.push(issue(
            Metric::ImageSize,
            Severity::Medium,
            "Large Images Detected",
            format!(
                "{} images are larger than 100KB",
                analysis.large_images.len()
            ),
            "Compress images, use modern formats (WebP, AVIF) and serve responsive sizes.",
        ));
    }

    if analysis.third_party_size > THIRD_PARTY_HEAVY_BYTES {
        findings.push(issue(
            Metric::ThirdParty,
            Severity::Medium,
            "Heavy Third-Party Scripts",
            format!(
                "Third-party resources total {} ({} requests)",
                format_bytes(analysis.third_party_size),
                analysis.third_party_count
            ),
            "Audit third-party scripts, lazy load non-critical ones and self-host critical assets.",
        ));
    }

    if analysis.uncached_count > UNCACHED_LIMIT {
        findings.push(issue(
            Metric::Caching,
            Severity::Low,
            "Resources Without Proper Caching",
            format!(
                "{} resources lack proper cache headers",
                analysis.uncached_count
            ),
            "Set Cache-Control headers on static resources.",
        ));
    }

    findings
}
