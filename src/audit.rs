//! Audit orchestration
//!
//! An [`Auditor`] owns everything one run needs: the configuration, the
//! shared HTTP client, the optional issue publisher and browser engine. It
//! crawls once, hands the crawl to every enabled check in report order and
//! folds the check verdicts into one exit code.

use crate::checks::performance::{failed_report, Profiler};
use crate::checks::{
    BrowserEngine, CheckKind, LinkValidator, SeoAuditor, SitemapReconciler, WebDriverEngine,
};
use crate::config::{validate_website_url, Config};
use crate::crawler::{build_http_client, crawl};
use crate::publish::{GitHubPublisher, IssuePublisher, IssueRef};
use crate::report::{footer, render_audit, render_check, CheckReport};
use crate::url::CrawlTarget;
use crate::{AuditError, PublishError};
use chrono::{DateTime, Utc};

/// Exit code when every enabled check passed
pub const EXIT_PASSED: u8 = 0;

/// Exit code when at least one enabled check failed
pub const EXIT_FAILED: u8 = 1;

/// Exit code for invalid configuration or an unreachable seed
pub const EXIT_FATAL: u8 = 2;

/// The combined outcome of one audit run
#[derive(Debug, Clone)]
pub struct AuditReport {
    pub url: String,
    pub reports: Vec<CheckReport>,
    pub generated_at: DateTime<Utc>,

    /// Issues created on the tracker during the run
    pub published: Vec<IssueRef>,
}

impl AuditReport {
    /// Returns true if every check that ran passed
    pub fn passed(&self) -> bool {
        self.reports.iter().all(|r| r.passed)
    }

    pub fn exit_code(&self) -> u8 {
        if self.passed() {
            EXIT_PASSED
        } else {
            EXIT_FAILED
        }
    }

    /// Report for a single check, if it ran
    pub fn report(&self, kind: CheckKind) -> Option<&CheckReport> {
        self.reports.iter().find(|r| r.kind == kind)
    }

    /// Renders the combined markdown report
    pub fn render(&self) -> String {
        render_audit(&self.url, &self.reports, self.generated_at)
    }
}

/// Runs the enabled checks against one website
///
/// # Example
///
/// ```no_run
/// use sumi_audit::{Auditor, Config};
///
/// # async fn run() -> sumi_audit::Result<()> {
/// let mut config = Config::default();
/// config.target.website_url = Some("https://example.com".to_string());
///
/// let report = Auditor::new(config).run().await?;
/// println!("{}", report.render());
/// std::process::exit(report.exit_code() as i32);
/// # }
/// ```
pub struct Auditor {
    config: Config,
    checks: Vec<CheckKind>,
    publisher: Option<Box<dyn IssuePublisher>>,
    browser: Option<Box<dyn BrowserEngine>>,
}

impl Auditor {
    /// Creates an auditor running every check
    ///
    /// A GitHub publisher is attached when the publish section is complete.
    pub fn new(config: Config) -> Self {
        let publisher: Option<Box<dyn IssuePublisher>> =
            match GitHubPublisher::from_config(&config.publish) {
                Ok(publisher) => Some(Box::new(publisher)),
                Err(PublishError::NotConfigured) => {
                    tracing::debug!("Issue publishing disabled");
                    None
                }
                Err(e) => {
                    tracing::warn!("Issue publishing unavailable: {}", e);
                    None
                }
            };

        Self {
            config,
            checks: CheckKind::ALL.to_vec(),
            publisher,
            browser: None,
        }
    }

    /// Replaces the issue publisher
    pub fn with_publisher(mut self, publisher: Box<dyn IssuePublisher>) -> Self {
        self.publisher = Some(publisher);
        self
    }

    /// Disables issue publishing
    pub fn without_publisher(mut self) -> Self {
        self.publisher = None;
        self
    }

    /// Profiles with `engine` instead of connecting to a WebDriver server
    pub fn with_browser(mut self, engine: Box<dyn BrowserEngine>) -> Self {
        self.browser = Some(engine);
        self
    }

    /// Restricts the run to `checks`; they still run in report order
    pub fn with_checks(mut self, mut checks: Vec<CheckKind>) -> Self {
        checks.sort();
        checks.dedup();
        self.checks = checks;
        self
    }

    pub fn checks(&self) -> &[CheckKind] {
        &self.checks
    }

    /// Runs the audit
    ///
    /// # Returns
    ///
    /// * `Ok(AuditReport)` - Every enabled check ran, whatever its verdict
    /// * `Err(AuditError)` - Invalid seed URL or the seed could not be reached
    pub async fn run(mut self) -> Result<AuditReport, AuditError> {
        let seed = validate_website_url(self.config.target.website_url.as_deref())?;
        let client = build_http_client(&self.config.crawler)?;
        let target = CrawlTarget::new(seed.as_str())?;
        let generated_at = Utc::now();

        tracing::info!(
            "Auditing {} with checks: {}",
            target.seed_str(),
            self.checks
                .iter()
                .map(|c| c.name())
                .collect::<Vec<_>>()
                .join(", ")
        );

        let crawl_result = if self.checks.iter().any(CheckKind::needs_crawl) {
            Some(crawl(&client, &target, &self.config).await?)
        } else {
            None
        };

        let mut reports = Vec::new();
        let mut published = Vec::new();

        for kind in self.checks.clone() {
            let report = match (kind, crawl_result.as_ref()) {
                (CheckKind::Performance, _) => self.profile(&target).await,
                (CheckKind::Links, Some(crawl_result)) => {
                    LinkValidator::new(client.clone(), &self.config.crawler)
                        .run(crawl_result)
                        .await
                }
                (CheckKind::Seo, Some(crawl_result)) => {
                    SeoAuditor::new(&self.config.seo).run(crawl_result)
                }
                (CheckKind::Sitemap, Some(crawl_result)) => {
                    SitemapReconciler::new(
                        client.clone(),
                        &self.config.crawler,
                        &self.config.sitemap,
                    )
                    .run(crawl_result)
                    .await
                }
                // Crawl checks only run after a crawl
                (_, None) => continue,
            };

            tracing::info!(
                "{}: {} ({} findings)",
                kind.title(),
                report.badge,
                report.findings.len()
            );

            if let Some(issue) = self.publish(&report, &target, generated_at).await {
                published.push(issue);
            }
            reports.push(report);
        }

        Ok(AuditReport {
            url: target.seed_str().to_string(),
            reports,
            generated_at,
            published,
        })
    }

    async fn profile(&mut self, target: &CrawlTarget) -> CheckReport {
        let engine = match self.browser.take() {
            Some(engine) => Ok(engine),
            None => WebDriverEngine::connect(&self.config.profiler, &self.config.crawler.user_agent)
                .await
                .map(|engine| Box::new(engine) as Box<dyn BrowserEngine>),
        };

        match engine {
            Ok(mut engine) => {
                Profiler::new(&self.config.profiler)
                    .run(&mut *engine, target.seed())
                    .await
            }
            Err(e) => failed_report(target.seed(), &e),
        }
    }

    /// Publishes `report` when its check calls for an issue
    ///
    /// Failures are logged and swallowed.
    async fn publish(
        &self,
        report: &CheckReport,
        target: &CrawlTarget,
        generated_at: DateTime<Utc>,
    ) -> Option<IssueRef> {
        let publisher = self.publisher.as_ref()?;
        let title = issue_title(report, target.seed_str())?;
        let body = format!("{}{}", render_check(report), footer(generated_at));

        match publisher
            .publish(&title, &body, report.kind.issue_labels())
            .await
        {
            Ok(issue) => Some(issue),
            Err(e) => {
                tracing::warn!("Failed to publish '{}': {}", title, e);
                None
            }
        }
    }
}

/// Issue title for a report, or `None` when no issue should be opened
///
/// Links and sitemap publish only on failure, SEO whenever it has findings
/// and performance always.
pub fn issue_title(report: &CheckReport, url: &str) -> Option<String> {
    match report.kind {
        CheckKind::Links if !report.passed => Some(format!("Broken links found on {}", url)),
        CheckKind::Seo if !report.findings.is_empty() => {
            Some(format!("SEO Issues Found on {}", url))
        }
        CheckKind::Sitemap if !report.passed => {
            Some(format!("Broken URLs found in sitemap for {}", url))
        }
        CheckKind::Performance => Some(format!("Performance Report: {} - {}", report.badge, url)),
        _ => None,
    }
}
