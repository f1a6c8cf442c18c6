//! SEO tag audit
//!
//! Inspects the head of every fetched page for a title, a meta description,
//! an Open Graph image, a canonical link and a language attribute.

use crate::checks::{CheckKind, PageRule};
use crate::config::SeoConfig;
use crate::crawler::{CrawlResult, Page};
use crate::report::{Category, CheckReport, Finding, FindingSet, Severity};
use scraper::{Html, Selector};
use std::collections::HashSet;
use std::ops::RangeInclusive;

/// Recommended title length in characters
pub const TITLE_LENGTH: RangeInclusive<usize> = 30..=60;

/// Recommended meta description length in characters
pub const DESCRIPTION_LENGTH: RangeInclusive<usize> = 50..=160;

const BEST_PRACTICES: &str = "\
1. **Title Tags**: Keep titles between 30-60 characters and include primary keywords.
2. **Meta Descriptions**: Write compelling descriptions between 50-160 characters.
3. **Open Graph Images**: Add og:image tags so shared links show a preview image.
4. **Canonical Links**: Declare a canonical URL to avoid duplicate content.
5. **Language Attribute**: Set the lang attribute on the html element for accessibility and search engines.";

/// SEO-relevant tags of one document; empty values count as missing
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SeoTags {
    pub title: Option<String>,
    pub description: Option<String>,
    pub og_image: Option<String>,
    pub canonical: Option<String>,
    pub lang: Option<String>,
}

impl SeoTags {
    /// Extracts the tags from an HTML document
    ///
    /// # Example
    ///
    /// ```
    /// use sumi_audit::checks::SeoTags;
    ///
    /// let tags = SeoTags::extract(r#"<html lang="en"><head><title>Home</title></head></html>"#);
    /// assert_eq!(tags.title.as_deref(), Some("Home"));
    /// assert_eq!(tags.lang.as_deref(), Some("en"));
    /// assert!(tags.description.is_none());
    /// ```
    pub fn extract(html: &str) -> Self {
        let document = Html::parse_document(html);

        Self {
            title: select_text(&document, "title"),
            description: select_attr(&document, r#"meta[name="description"]"#, "content"),
            og_image: select_attr(&document, r#"meta[property="og:image"]"#, "content"),
            canonical: select_attr(&document, r#"link[rel="canonical"]"#, "href"),
            lang: select_attr(&document, "html", "lang"),
        }
    }
}

fn select_text(document: &Html, css: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el| el.text().collect::<String>().trim().to_string())
        .filter(|text| !text.is_empty())
}

fn select_attr(document: &Html, css: &str, attr: &str) -> Option<String> {
    let selector = Selector::parse(css).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr(attr))
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
}

/// Runs the SEO rules over pages
#[derive(Debug, Clone, Default)]
pub struct SeoAuditor {
    strict: bool,
}

impl SeoAuditor {
    pub fn new(config: &SeoConfig) -> Self {
        Self {
            strict: config.strict,
        }
    }

    /// Findings for one document
    pub fn audit_html(&self, url: &str, html: &str) -> Vec<Finding> {
        audit_tags(url, &SeoTags::extract(html))
    }

    /// Returns true if `findings` fail the audit
    ///
    /// Length findings only fail the audit in strict mode.
    pub fn fails(&self, findings: impl IntoIterator<Item = Severity>) -> bool {
        let mut severities = findings.into_iter();
        if self.strict {
            severities.next().is_some()
        } else {
            severities.any(|s| s != Severity::Low)
        }
    }

    /// Audits every crawled page and builds the SEO report
    pub fn run(&self, crawl: &CrawlResult) -> CheckReport {
        let mut findings = FindingSet::new();
        let mut pages_with_issues: HashSet<&str> = HashSet::new();

        for page in &crawl.pages {
            let page_findings = self.evaluate(page);
            if !page_findings.is_empty() {
                pages_with_issues.insert(page.url.as_str());
            }
            findings.extend(page_findings);
        }

        let failed = self.fails(findings.iter().map(|f| f.severity));
        let mut report = CheckReport::new(CheckKind::Seo, !failed);
        report.findings = findings;

        report.metric("Pages audited", crawl.pages.len());
        report.metric("Pages with issues", pages_with_issues.len());
        for severity in [Severity::High, Severity::Medium, Severity::Low] {
            report.metric(
                format!("{} {}", severity.glyph(), severity.heading()),
                report.findings.count(severity),
            );
        }
        if self.strict {
            report.note("Strict mode: length recommendations fail the audit.");
        }
        if crawl.is_capped() {
            report.note("Crawl stopped at the page limit; pages beyond it were not audited.");
        }
        report.section("SEO Best Practices", BEST_PRACTICES);

        tracing::info!(
            "SEO audit: {} pages, {} findings",
            crawl.pages.len(),
            report.findings.len()
        );

        report
    }
}

impl PageRule for SeoAuditor {
    fn evaluate(&self, page: &Page) -> Vec<Finding> {
        self.audit_html(page.url.as_str(), &page.html)
    }
}

/// Applies the SEO rules to extracted tags
pub fn audit_tags(url: &str, tags: &SeoTags) -> Vec<Finding> {
    let mut findings = Vec::new();

    match &tags.title {
        None => findings.push(
            Finding::new(
                Category::MissingTitle,
                Severity::Medium,
                url,
                "Page has no <title> tag.",
            )
            .with_recommendation("Add a unique, descriptive title of 30-60 characters."),
        ),
        Some(title) => {
            if let Some(finding) = length_finding(
                url,
                Category::TitleLength,
                "Title",
                title,
                TITLE_LENGTH,
            ) {
                findings.push(finding);
            }
        }
    }

    match &tags.description {
        None => findings.push(
            Finding::new(
                Category::MissingDescription,
                Severity::Medium,
                url,
                "Page has no meta description.",
            )
            .with_recommendation("Add a meta description of 50-160 characters summarizing the page."),
        ),
        Some(description) => {
            if let Some(finding) = length_finding(
                url,
                Category::DescriptionLength,
                "Meta Description",
                description,
                DESCRIPTION_LENGTH,
            ) {
                findings.push(finding);
            }
        }
    }

    if tags.og_image.is_none() {
        findings.push(
            Finding::new(
                Category::MissingOgImage,
                Severity::Medium,
                url,
                "No og:image meta tag found.",
            )
            .with_recommendation(
                r#"Add <meta property="og:image" content="..."> so shared links show a preview."#,
            ),
        );
    }

    if tags.canonical.is_none() {
        findings.push(
            Finding::new(
                Category::MissingCanonical,
                Severity::Medium,
                url,
                "No canonical link found.",
            )
            .with_recommendation(r#"Add <link rel="canonical" href="..."> pointing at the preferred URL."#),
        );
    }

    if tags.lang.is_none() {
        findings.push(
            Finding::new(
                Category::MissingLang,
                Severity::Medium,
                url,
                "The html element has no lang attribute.",
            )
            .with_recommendation(r#"Declare the page language, e.g. <html lang="en">."#),
        );
    }

    findings
}

fn length_finding(
    url: &str,
    category: Category,
    what: &str,
    text: &str,
    range: RangeInclusive<usize>,
) -> Option<Finding> {
    let length = text.chars().count();
    let title = if length < *range.start() {
        format!("{} Too Short", what)
    } else if length > *range.end() {
        format!("{} Too Long", what)
    } else {
        return None;
    };

    Some(
        Finding::new(
            category,
            Severity::Low,
            url,
            format!(
                "{} characters (recommended {}-{}): \"{}\"",
                length,
                range.start(),
                range.end(),
                text
            ),
        )
        .with_title(title)
        .with_recommendation(format!(
            "Keep the {} between {} and {} characters.",
            what.to_lowercase(),
            range.start(),
            range.end()
        )),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    const GOOD_TITLE: &str = "A Perfectly Reasonable Page Title Here";
    const GOOD_DESCRIPTION: &str =
        "This description is long enough to satisfy the recommended minimum length.";

    fn page_html(title: &str, extra_head: &str) -> String {
        format!(
            r#"<html lang="en"><head><title>{}</title>
            <meta name="description" content="{}">
            <link rel="canonical" href="https://example.com/">{}</head><body></body></html>"#,
            title, GOOD_DESCRIPTION, extra_head
        )
    }

    #[test]
    fn test_extract_tags() {
        let html = page_html(GOOD_TITLE, r#"<meta property="og:image" content="/img.png">"#);
        let tags = SeoTags::extract(&html);
        assert_eq!(tags.title.as_deref(), Some(GOOD_TITLE));
        assert_eq!(tags.description.as_deref(), Some(GOOD_DESCRIPTION));
        assert_eq!(tags.og_image.as_deref(), Some("/img.png"));
        assert_eq!(tags.canonical.as_deref(), Some("https://example.com/"));
        assert_eq!(tags.lang.as_deref(), Some("en"));
    }

    #[test]
    fn test_empty_values_count_as_missing() {
        let tags = SeoTags::extract(
            r#"<html lang=""><head><title>  </title><meta property="og:image" content=""></head></html>"#,
        );
        assert_eq!(tags, SeoTags::default());
    }

    #[test]
    fn test_clean_page_has_no_findings() {
        let html = page_html(GOOD_TITLE, r#"<meta property="og:image" content="/img.png">"#);
        let auditor = SeoAuditor::default();
        assert!(auditor.audit_html("https://example.com/", &html).is_empty());
    }

    #[test]
    fn test_short_title_and_missing_og_image() {
        let title = "Twenty-five chars exactly";
        assert_eq!(title.chars().count(), 25);

        let findings =
            SeoAuditor::default().audit_html("https://example.com/", &page_html(title, ""));
        assert_eq!(findings.len(), 2);

        let og = findings
            .iter()
            .find(|f| f.category == Category::MissingOgImage)
            .unwrap();
        assert_eq!(og.severity, Severity::Medium);

        let length = findings
            .iter()
            .find(|f| f.category == Category::TitleLength)
            .unwrap();
        assert_eq!(length.severity, Severity::Low);
        assert_eq!(length.title, "Title Too Short");
    }

    #[test]
    fn test_missing_title_has_no_length_finding() {
        let tags = SeoTags {
            description: Some(GOOD_DESCRIPTION.to_string()),
            og_image: Some("/a.png".to_string()),
            canonical: Some("/".to_string()),
            lang: Some("en".to_string()),
            ..SeoTags::default()
        };
        let findings = audit_tags("https://example.com/", &tags);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].category, Category::MissingTitle);
    }

    #[test]
    fn test_long_description() {
        let tags = SeoTags {
            title: Some(GOOD_TITLE.to_string()),
            description: Some("x".repeat(161)),
            og_image: Some("/a.png".to_string()),
            canonical: Some("/".to_string()),
            lang: Some("en".to_string()),
        };
        let findings = audit_tags("https://example.com/", &tags);
        assert_eq!(findings.len(), 1);
        assert_eq!(findings[0].title, "Meta Description Too Long");
    }

    #[test]
    fn test_length_boundaries_are_inclusive() {
        let check = |n: usize| {
            length_finding("u", Category::TitleLength, "Title", &"x".repeat(n), TITLE_LENGTH)
        };
        assert!(check(29).is_some());
        assert!(check(30).is_none());
        assert!(check(60).is_none());
        assert!(check(61).is_some());
    }

    #[test]
    fn test_strictness() {
        let lenient = SeoAuditor::default();
        let strict = SeoAuditor::new(&SeoConfig { strict: true });

        assert!(!lenient.fails([Severity::Low]));
        assert!(lenient.fails([Severity::Low, Severity::Medium]));
        assert!(strict.fails([Severity::Low]));
        assert!(!strict.fails(Vec::new()));
    }
}
