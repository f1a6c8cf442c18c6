//! Data produced by the crawler for the rule engines
//!
//! Pages and links are created once while crawling and are read-only
//! afterwards; the rule engines only borrow them.

use std::fmt;
use url::Url;

/// A successfully fetched HTML page
#[derive(Debug, Clone)]
pub struct Page {
    /// Normalized URL the page was requested as
    pub url: Url,

    /// Identity key (see [`crate::url::page_key`])
    pub key: String,

    /// URL after redirects; relative references resolve against it
    pub final_url: Url,

    pub status: u16,
    pub content_type: String,

    /// Raw HTML body
    pub html: String,

    /// Number of hops from the seed (seed is 0)
    pub depth: u32,

    /// Anchors found on the page, in document order
    pub links: Vec<Link>,

    /// Images, scripts and stylesheets referenced by the page
    pub resources: Vec<Resource>,
}

/// A directed edge from a page to an anchor target
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    /// URL of the page the anchor was found on
    pub source: String,

    /// `href` exactly as written
    pub raw: String,

    /// Normalized absolute target; `None` when the href is not http(s)
    pub target: Option<Url>,

    /// Visible text of the anchor, whitespace collapsed
    pub anchor_text: String,

    /// Zero-based index among the page's anchors
    pub position: usize,
}

impl Link {
    /// The URL scheme of the raw href, if it names one
    pub fn raw_scheme(&self) -> Option<String> {
        let (scheme, _) = self.raw.trim().split_once(':')?;
        let valid = !scheme.is_empty()
            && scheme
                .chars()
                .all(|c| c.is_ascii_alphanumeric() || matches!(c, '+' | '-' | '.'));
        valid.then(|| scheme.to_ascii_lowercase())
    }
}

/// Kind of a sub-resource referenced from HTML
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ResourceKind {
    Image,
    Script,
    Stylesheet,
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Image => "image",
            Self::Script => "script",
            Self::Stylesheet => "stylesheet",
        };
        write!(f, "{}", name)
    }
}

/// A resource reference found on a page
#[derive(Debug, Clone, PartialEq)]
pub struct Resource {
    pub kind: ResourceKind,
    pub url: Url,
}
