//! Findings: the unit of reportable output
//!
//! Findings are appended to a [`FindingSet`] while checks run and never
//! mutated afterwards, except that a second finding with the same
//! `(category, subject)` folds its referrers into the first.

use std::collections::{BTreeMap, HashMap};
use std::fmt;

/// Severity of a finding; orders High first
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Severity {
    High,
    Medium,
    Low,
}

impl Severity {
    pub fn glyph(&self) -> &'static str {
        match self {
            Self::High => "🔴",
            Self::Medium => "🟡",
            Self::Low => "🟢",
        }
    }

    /// Section heading used in reports
    pub fn heading(&self) -> &'static str {
        match self {
            Self::High => "High Priority",
            Self::Medium => "Medium Priority",
            Self::Low => "Low Priority",
        }
    }
}

impl fmt::Display for Severity {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::High => "high",
            Self::Medium => "medium",
            Self::Low => "low",
        };
        write!(f, "{}", name)
    }
}

/// Individual measurements the performance profiler reports on
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Metric {
    Lcp,
    Tbt,
    Cls,
    Ttfb,
    Fcp,
    PageSize,
    RequestCount,
    Compression,
    ImageSize,
    ThirdParty,
    Caching,
}

impl Metric {
    /// Grouping label, matching common performance-audit vocabulary
    pub fn area(&self) -> &'static str {
        match self {
            Self::Lcp | Self::Tbt | Self::Cls => "Core Web Vitals",
            Self::Ttfb => "Server",
            Self::Fcp => "Rendering",
            Self::PageSize | Self::RequestCount => "Resources",
            Self::Compression => "Compression",
            Self::ImageSize => "Images",
            Self::ThirdParty => "Third-Party",
            Self::Caching => "Caching",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Lcp => "Largest Contentful Paint",
            Self::Tbt => "Total Blocking Time",
            Self::Cls => "Cumulative Layout Shift",
            Self::Ttfb => "Time to First Byte",
            Self::Fcp => "First Contentful Paint",
            Self::PageSize => "Page Size",
            Self::RequestCount => "Request Count",
            Self::Compression => "Text Compression",
            Self::ImageSize => "Image Size",
            Self::ThirdParty => "Third-Party Weight",
            Self::Caching => "Caching",
        }
    }
}

/// What kind of problem a finding describes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Category {
    BrokenLink,
    MissingTitle,
    TitleLength,
    MissingDescription,
    DescriptionLength,
    MissingOgImage,
    MissingCanonical,
    MissingLang,
    BrokenSitemapUrl,
    SitemapUnavailable,
    SitemapMismatch,
    PerformanceMetric(Metric),
}

impl Category {
    /// Default finding title for the category
    pub fn label(&self) -> String {
        match self {
            Self::BrokenLink => "Broken Link".to_string(),
            Self::MissingTitle => "Missing Title Tag".to_string(),
            Self::TitleLength => "Title Length".to_string(),
            Self::MissingDescription => "Missing Meta Description".to_string(),
            Self::DescriptionLength => "Meta Description Length".to_string(),
            Self::MissingOgImage => "Missing OG Image".to_string(),
            Self::MissingCanonical => "Missing Canonical Link".to_string(),
            Self::MissingLang => "Missing Language Attribute".to_string(),
            Self::BrokenSitemapUrl => "Broken Sitemap URL".to_string(),
            Self::SitemapUnavailable => "Sitemap Unavailable".to_string(),
            Self::SitemapMismatch => "Sitemap Mismatch".to_string(),
            Self::PerformanceMetric(metric) => format!("{}: {}", metric.area(), metric.name()),
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.label())
    }
}

/// One reportable issue
#[derive(Debug, Clone, PartialEq)]
pub struct Finding {
    pub category: Category,
    pub severity: Severity,

    /// Page URL or link target the finding is about
    pub subject: String,

    pub title: String,
    pub message: String,
    pub recommendation: Option<String>,

    /// Distinct pages that led to this finding, in discovery order
    pub referrers: Vec<String>,
}

impl Finding {
    /// Creates a finding titled after its category
    pub fn new(
        category: Category,
        severity: Severity,
        subject: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            title: category.label(),
            category,
            severity,
            subject: subject.into(),
            message: message.into(),
            recommendation: None,
            referrers: Vec::new(),
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = title.into();
        self
    }

    pub fn with_recommendation(mut self, recommendation: impl Into<String>) -> Self {
        self.recommendation = Some(recommendation.into());
        self
    }

    pub fn with_referrer(mut self, referrer: impl Into<String>) -> Self {
        self.add_referrer(referrer.into());
        self
    }

    fn add_referrer(&mut self, referrer: String) {
        if !self.referrers.contains(&referrer) {
            self.referrers.push(referrer);
        }
    }
}

/// Findings grouped for rendering: severity, then category
pub type GroupedFindings<'a> = BTreeMap<Severity, BTreeMap<Category, Vec<&'a Finding>>>;

/// Append-only collection of findings, deduplicated by `(category, subject)`
#[derive(Debug, Clone, Default)]
pub struct FindingSet {
    findings: Vec<Finding>,
    index: HashMap<(Category, String), usize>,
}

impl FindingSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a finding, or folds it into an existing one with the same
    /// category and subject
    ///
    /// When folding, referrers are unioned and the more severe of the two
    /// severities is kept.
    pub fn push(&mut self, finding: Finding) {
        let key = (finding.category, finding.subject.clone());
        match self.index.get(&key) {
            Some(&i) => {
                let existing = &mut self.findings[i];
                for referrer in finding.referrers {
                    existing.add_referrer(referrer);
                }
                existing.severity = existing.severity.min(finding.severity);
            }
            None => {
                self.index.insert(key, self.findings.len());
                self.findings.push(finding);
            }
        }
    }

    pub fn extend(&mut self, findings: impl IntoIterator<Item = Finding>) {
        for finding in findings {
            self.push(finding);
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Finding> {
        self.findings.iter()
    }

    pub fn len(&self) -> usize {
        self.findings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.findings.is_empty()
    }

    pub fn count(&self, severity: Severity) -> usize {
        self.findings
            .iter()
            .filter(|f| f.severity == severity)
            .count()
    }

    pub fn get(&self, category: Category, subject: &str) -> Option<&Finding> {
        self.index
            .get(&(category, subject.to_string()))
            .map(|&i| &self.findings[i])
    }

    /// Groups findings by severity (High first), then by category
    ///
    /// Within a group, findings keep insertion order.
    pub fn grouped(&self) -> GroupedFindings<'_> {
        let mut groups: GroupedFindings<'_> = BTreeMap::new();
        for finding in &self.findings {
            groups
                .entry(finding.severity)
                .or_default()
                .entry(finding.category)
                .or_default()
                .push(finding);
        }
        groups
    }
}

impl IntoIterator for FindingSet {
    type Item = Finding;
    type IntoIter = std::vec::IntoIter<Finding>;

    fn into_iter(self) -> Self::IntoIter {
        self.findings.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn broken(target: &str, referrer: &str) -> Finding {
        Finding::new(Category::BrokenLink, Severity::High, target, "Status Code: 404")
            .with_referrer(referrer)
    }

    #[test]
    fn test_same_target_two_referrers_is_one_finding() {
        let mut set = FindingSet::new();
        set.push(broken("https://example.com/gone", "https://example.com/a"));
        set.push(broken("https://example.com/gone", "https://example.com/b"));
        set.push(broken("https://example.com/gone", "https://example.com/a"));

        assert_eq!(set.len(), 1);
        let finding = set
            .get(Category::BrokenLink, "https://example.com/gone")
            .unwrap();
        assert_eq!(
            finding.referrers,
            vec![
                "https://example.com/a".to_string(),
                "https://example.com/b".to_string()
            ]
        );
    }

    #[test]
    fn test_different_category_same_subject_kept_apart() {
        let mut set = FindingSet::new();
        let page = "https://example.com/";
        set.push(Finding::new(Category::MissingOgImage, Severity::Medium, page, "x"));
        set.push(Finding::new(Category::MissingLang, Severity::Medium, page, "y"));
        set.push(Finding::new(
            Category::PerformanceMetric(Metric::Lcp),
            Severity::High,
            page,
            "z",
        ));
        set.push(Finding::new(
            Category::PerformanceMetric(Metric::Tbt),
            Severity::High,
            page,
            "w",
        ));
        assert_eq!(set.len(), 4);
    }

    #[test]
    fn test_fold_keeps_highest_severity() {
        let mut set = FindingSet::new();
        set.push(Finding::new(Category::BrokenLink, Severity::Medium, "u", "timeout"));
        set.push(Finding::new(Category::BrokenLink, Severity::High, "u", "404"));
        assert_eq!(set.iter().next().map(|f| f.severity), Some(Severity::High));
    }

    #[test]
    fn test_grouping_order() {
        let mut set = FindingSet::new();
        set.push(Finding::new(Category::TitleLength, Severity::Low, "p1", ""));
        set.push(Finding::new(Category::MissingLang, Severity::Medium, "p1", ""));
        set.push(Finding::new(Category::BrokenLink, Severity::High, "t1", ""));
        set.push(Finding::new(Category::MissingCanonical, Severity::Medium, "p2", ""));
        set.push(Finding::new(Category::MissingLang, Severity::Medium, "p2", ""));

        let grouped = set.grouped();
        let severities: Vec<Severity> = grouped.keys().copied().collect();
        assert_eq!(
            severities,
            vec![Severity::High, Severity::Medium, Severity::Low]
        );

        let medium = &grouped[&Severity::Medium];
        let categories: Vec<Category> = medium.keys().copied().collect();
        assert_eq!(
            categories,
            vec![Category::MissingCanonical, Category::MissingLang]
        );
        let lang_subjects: Vec<&str> = medium[&Category::MissingLang]
            .iter()
            .map(|f| f.subject.as_str())
            .collect();
        assert_eq!(lang_subjects, vec!["p1", "p2"]);
    }

    #[test]
    fn test_counts() {
        let mut set = FindingSet::new();
        set.push(Finding::new(Category::TitleLength, Severity::Low, "a", ""));
        set.push(Finding::new(Category::MissingLang, Severity::Medium, "a", ""));
        assert_eq!(set.count(Severity::Low), 1);
        assert_eq!(set.count(Severity::High), 0);
    }

    #[test]
    fn test_category_label() {
        assert_eq!(Category::MissingOgImage.to_string(), "Missing OG Image");
        assert_eq!(
            Category::PerformanceMetric(Metric::Lcp).label(),
            "Core Web Vitals: Largest Contentful Paint"
        );
    }
}
