//! Rule engines run over the crawl result
//!
//! Each check is independent and reads the crawl output without mutating it:
//! - `links`: validates every anchor target found while crawling
//! - `seo`: inspects the head tags of every fetched page
//! - `sitemap`: reads sitemap.xml and reconciles it with the crawl
//! - `performance`: profiles the seed page in a real browser

pub mod links;
pub mod performance;
pub mod seo;
pub mod sitemap;

pub use links::{ClassifiedLink, LinkValidator};
pub use performance::{BrowserEngine, Profiler, WebDriverEngine};
pub use seo::{SeoAuditor, SeoTags};
pub use sitemap::{SitemapEntry, SitemapReconciler};

use crate::crawler::Page;
use crate::report::Finding;
use std::fmt;

/// The checks a run can enable
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum CheckKind {
    Links,
    Seo,
    Sitemap,
    Performance,
}

impl CheckKind {
    /// Every check, in report order
    pub const ALL: [CheckKind; 4] = [
        CheckKind::Links,
        CheckKind::Seo,
        CheckKind::Sitemap,
        CheckKind::Performance,
    ];

    /// Report heading
    pub fn title(&self) -> &'static str {
        match self {
            Self::Links => "Link Check",
            Self::Seo => "SEO Audit",
            Self::Sitemap => "Sitemap Check",
            Self::Performance => "Performance Report",
        }
    }

    /// Short name used on the command line and in logs
    pub fn name(&self) -> &'static str {
        match self {
            Self::Links => "links",
            Self::Seo => "seo",
            Self::Sitemap => "sitemap",
            Self::Performance => "performance",
        }
    }

    /// Labels attached to the issue published for this check
    pub fn issue_labels(&self) -> &'static [&'static str] {
        match self {
            Self::Links => &["broken-link"],
            Self::Seo => &["seo", "full-seo-audit"],
            Self::Sitemap => &["sitemap", "broken-link"],
            Self::Performance => &["performance", "web-vitals"],
        }
    }

    /// Returns true if the check consumes crawl output
    pub fn needs_crawl(&self) -> bool {
        !matches!(self, Self::Performance)
    }
}

impl fmt::Display for CheckKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// A stateless rule evaluated against one fetched page
pub trait PageRule {
    fn evaluate(&self, page: &Page) -> Vec<Finding>;
}
