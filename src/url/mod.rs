//! URL handling module for Sumi-Audit
//!
//! This module provides URL normalization, page identity keys, and the scope
//! rules that decide which URLs the crawler may follow.

mod domain;
mod normalize;

use crate::UrlError;
use url::Url;

// Re-export main functions
pub use domain::{authority, extract_host, is_login_walled_host};
pub use normalize::{normalize, page_key};

/// The seed of a crawl plus its scope rule
///
/// Scope is a same-site predicate: a URL is in scope when its host and
/// explicit port equal the seed's. The scheme is ignored and subdomains are
/// separate sites.
/// A target never changes once the crawl starts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CrawlTarget {
    seed: Url,
    authority: String,
}

impl CrawlTarget {
    /// Creates a target from a raw seed URL
    ///
    /// # Arguments
    ///
    /// * `seed` - The seed URL; must be absolute http:// or https://
    ///
    /// # Returns
    ///
    /// * `Ok(CrawlTarget)` - The normalized target
    /// * `Err(UrlError)` - The seed could not be normalized
    pub fn new(seed: &str) -> Result<Self, UrlError> {
        let seed = normalize(seed, None)?;
        let authority = authority(&seed).ok_or(UrlError::MissingDomain)?;
        Ok(Self { seed, authority })
    }

    /// The normalized seed URL
    pub fn seed(&self) -> &Url {
        &self.seed
    }

    /// The seed's host, lowercased
    pub fn host(&self) -> &str {
        self.seed.host_str().unwrap_or_default()
    }

    /// The seed as written for display and for derived URLs, without a
    /// trailing slash
    pub fn seed_str(&self) -> &str {
        self.seed.as_str().trim_end_matches('/')
    }

    /// Returns true if `url` belongs to this site
    pub fn contains(&self, url: &Url) -> bool {
        authority(url).is_some_and(|a| a == self.authority)
    }
}

/// Returns true iff `url` is on the same site as the crawl target
///
/// # Examples
///
/// ```
/// use sumi_audit::url::{in_scope, CrawlTarget};
/// use url::Url;
///
/// let target = CrawlTarget::new("https://example.com/").unwrap();
/// assert!(in_scope(&Url::parse("https://EXAMPLE.com/about").unwrap(), &target));
/// assert!(!in_scope(&Url::parse("https://blog.example.com/").unwrap(), &target));
/// ```
pub fn in_scope(url: &Url, target: &CrawlTarget) -> bool {
    target.contains(url)
}

/// Returns true iff `url` is served from a different host than `page_url`
///
/// Third-party resources (CDNs, analytics) may still be measured, but the
/// crawler never follows them.
pub fn is_third_party(url: &Url, page_url: &Url) -> bool {
    extract_host(url) != extract_host(page_url)
}
