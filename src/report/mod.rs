//! Report aggregation and rendering
//!
//! This module handles:
//! - The `Finding` model with its severity and category
//! - Deduplication and grouping (`FindingSet`)
//! - Markdown rendering of per-check and combined reports
//! - Size and duration formatting helpers

mod finding;
mod format;
mod markdown;

pub use finding::{Category, Finding, FindingSet, GroupedFindings, Metric, Severity};
pub use format::{format_bytes, format_time};
pub use markdown::{
    footer, pass_badge, render_audit, render_check, render_findings, table, CheckReport, Section,
};
