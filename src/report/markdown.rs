//! Markdown rendering of check reports
//!
//! The same markdown serves as console output and as issue body.

use crate::checks::CheckKind;
use crate::report::finding::{Finding, FindingSet};
use chrono::{DateTime, Utc};

/// Extra titled block appended after a report's findings
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub heading: String,
    pub body: String,
}

impl Section {
    pub fn new(heading: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            heading: heading.into(),
            body: body.into(),
        }
    }
}

/// The outcome of one check, ready to render
#[derive(Debug, Clone)]
pub struct CheckReport {
    pub kind: CheckKind,
    pub passed: bool,

    /// Status shown next to the headline, e.g. `✅ PASSED`
    pub badge: String,

    /// Key figures rendered as a two-column table
    pub metrics: Vec<(String, String)>,

    /// Informational lines that do not affect the verdict
    pub notes: Vec<String>,

    pub findings: FindingSet,
    pub sections: Vec<Section>,
}

impl CheckReport {
    /// Creates an empty report with a PASSED/FAILED badge
    pub fn new(kind: CheckKind, passed: bool) -> Self {
        Self {
            kind,
            passed,
            badge: pass_badge(passed).to_string(),
            metrics: Vec::new(),
            notes: Vec::new(),
            findings: FindingSet::new(),
            sections: Vec::new(),
        }
    }

    pub fn metric(&mut self, name: impl Into<String>, value: impl ToString) {
        self.metrics.push((name.into(), value.to_string()));
    }

    pub fn note(&mut self, note: impl Into<String>) {
        self.notes.push(note.into());
    }

    pub fn section(&mut self, heading: impl Into<String>, body: impl Into<String>) {
        self.sections.push(Section::new(heading, body));
    }
}

pub fn pass_badge(passed: bool) -> &'static str {
    if passed {
        "✅ PASSED"
    } else {
        "❌ FAILED"
    }
}

/// Renders a markdown table
pub fn table(headers: &[&str], rows: &[Vec<String>]) -> String {
    let mut md = String::new();
    md.push_str(&format!("| {} |\n", headers.join(" | ")));
    md.push_str(&format!(
        "|{}|\n",
        headers
            .iter()
            .map(|h| "-".repeat(h.chars().count() + 2))
            .collect::<Vec<_>>()
            .join("|")
    ));
    for row in rows {
        md.push_str(&format!("| {} |\n", row.join(" | ")));
    }
    md
}

/// Renders findings grouped by severity, then category
pub fn render_findings(findings: &FindingSet) -> String {
    let mut md = String::new();

    for (severity, categories) in findings.grouped() {
        md.push_str(&format!("### {} {}\n\n", severity.glyph(), severity.heading()));

        for (category, items) in categories {
            md.push_str(&format!("#### {} ({})\n\n", category, items.len()));
            for finding in items {
                md.push_str(&render_finding(finding));
            }
            md.push('\n');
        }
    }

    md
}

fn render_finding(finding: &Finding) -> String {
    let mut md = String::new();

    if finding.title == finding.category.label() {
        md.push_str(&format!("- `{}`: {}\n", finding.subject, finding.message));
    } else {
        md.push_str(&format!(
            "- **{}** `{}`: {}\n",
            finding.title, finding.subject, finding.message
        ));
    }

    if let Some(recommendation) = &finding.recommendation {
        md.push_str(&format!("  - **Recommendation:** {}\n", recommendation));
    }

    if !finding.referrers.is_empty() {
        md.push_str(&format!(
            "  - **Found on {} page(s):** {}\n",
            finding.referrers.len(),
            finding.referrers.join(", ")
        ));
    }

    md
}

/// Renders a single check report as a markdown document section
pub fn render_check(report: &CheckReport) -> String {
    let mut md = String::new();

    md.push_str(&format!("## {} - {}\n\n", report.kind.title(), report.badge));

    if !report.metrics.is_empty() {
        let rows: Vec<Vec<String>> = report
            .metrics
            .iter()
            .map(|(name, value)| vec![name.clone(), value.clone()])
            .collect();
        md.push_str(&table(&["Metric", "Value"], &rows));
        md.push('\n');
    }

    for note in &report.notes {
        md.push_str(&format!("> {}\n", note));
    }
    if !report.notes.is_empty() {
        md.push('\n');
    }

    if report.findings.is_empty() {
        md.push_str("No issues found.\n\n");
    } else {
        md.push_str(&render_findings(&report.findings));
    }

    for section in &report.sections {
        md.push_str(&format!("### {}\n\n", section.heading));
        md.push_str(section.body.trim_end());
        md.push_str("\n\n");
    }

    md
}

/// Closing line with the generation timestamp
pub fn footer(generated_at: DateTime<Utc>) -> String {
    format!(
        "---\n*Generated by Sumi-Audit on {} UTC*\n",
        generated_at.format("%Y-%m-%d %H:%M:%S")
    )
}

/// Renders the combined report for every check that ran
pub fn render_audit(url: &str, reports: &[CheckReport], generated_at: DateTime<Utc>) -> String {
    let passed = reports.iter().all(|r| r.passed);
    let mut md = String::new();

    md.push_str(&format!("# {} Website Audit: {}\n\n", pass_badge(passed), url));

    let rows: Vec<Vec<String>> = reports
        .iter()
        .map(|r| {
            vec![
                r.kind.title().to_string(),
                r.badge.clone(),
                r.findings.len().to_string(),
            ]
        })
        .collect();
    md.push_str(&table(&["Check", "Result", "Findings"], &rows));
    md.push('\n');

    for report in reports {
        md.push_str("---\n\n");
        md.push_str(&render_check(report));
    }

    md.push_str(&footer(generated_at));
    md
}
