/// Visit tracking for the crawl frontier
///
/// Every URL the crawler ever considers gets exactly one entry here, keyed
/// by its page identity key. An entry starts as `Pending` and moves at most
/// once to `Fetched` or `Failed`. A redirect target is recorded as an alias
/// of the key that was requested, so the same document is never fetched
/// under two keys.
use std::collections::HashMap;
use std::fmt;

/// Visit status of a single page key
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum VisitStatus {
    /// Enqueued in the frontier, not yet requested
    Pending,

    /// Fetched successfully as HTML and parsed
    Fetched,

    /// Request failed, returned an error status, or was not HTML
    Failed,
}

impl VisitStatus {
    /// Returns true once the page has been requested
    pub fn is_terminal(&self) -> bool {
        !matches!(self, Self::Pending)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Pending => "pending",
            Self::Fetched => "fetched",
            Self::Failed => "failed",
        }
    }
}

impl fmt::Display for VisitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Mapping from page key to visit status, in discovery order
#[derive(Debug, Default)]
pub struct VisitedSet {
    statuses: HashMap<String, VisitStatus>,
    order: Vec<String>,

    /// Alias key -> key the document was requested under
    aliases: HashMap<String, String>,
    fetched: usize,
    failed: usize,
}

impl VisitedSet {
    pub fn new() -> Self {
        Self::default()
    }

    /// Records `key` as pending
    ///
    /// Returns false (and changes nothing) if the key was already seen in any
    /// state; a key is never re-enqueued within one run.
    pub fn mark_pending(&mut self, key: &str) -> bool {
        if self.contains(key) {
            return false;
        }
        self.statuses.insert(key.to_string(), VisitStatus::Pending);
        self.order.push(key.to_string());
        true
    }

    /// Moves a pending key to `Fetched`
    pub fn mark_fetched(&mut self, key: &str) -> bool {
        self.complete(key, VisitStatus::Fetched)
    }

    /// Moves a pending key to `Failed`
    pub fn mark_failed(&mut self, key: &str) -> bool {
        self.complete(key, VisitStatus::Failed)
    }

    fn complete(&mut self, key: &str, status: VisitStatus) -> bool {
        match self.statuses.get_mut(key) {
            Some(current) if *current == VisitStatus::Pending => {
                *current = status;
                match status {
                    VisitStatus::Fetched => self.fetched += 1,
                    VisitStatus::Failed => self.failed += 1,
                    VisitStatus::Pending => {}
                }
                true
            }
            _ => false,
        }
    }

    /// Records `alias` as another key for the document held under `canonical`
    ///
    /// An alias that was only pending is folded into `canonical` and drops
    /// out of the counts. Returns false (and changes nothing) if `alias` is
    /// already an alias or was requested under its own key.
    pub fn add_alias(&mut self, alias: &str, canonical: &str) -> bool {
        if alias == canonical || self.aliases.contains_key(alias) {
            return false;
        }
        match self.statuses.get(alias) {
            Some(status) if status.is_terminal() => return false,
            Some(_) => {
                self.statuses.remove(alias);
                self.order.retain(|k| k != alias);
            }
            None => {}
        }
        self.aliases.insert(alias.to_string(), canonical.to_string());
        true
    }

    pub fn is_alias(&self, key: &str) -> bool {
        self.aliases.contains_key(key)
    }

    /// The key the document behind `key` is tracked under
    pub fn canonical<'a>(&'a self, key: &'a str) -> &'a str {
        self.aliases.get(key).map_or(key, String::as_str)
    }

    /// `key` followed by every alias recorded for it
    pub fn identities<'a>(&'a self, key: &'a str) -> impl Iterator<Item = &'a str> {
        std::iter::once(key).chain(
            self.aliases
                .iter()
                .filter(move |(_, canonical)| canonical.as_str() == key)
                .map(|(alias, _)| alias.as_str()),
        )
    }

    pub fn status(&self, key: &str) -> Option<VisitStatus> {
        self.statuses.get(self.canonical(key)).copied()
    }

    pub fn contains(&self, key: &str) -> bool {
        self.statuses.contains_key(key) || self.aliases.contains_key(key)
    }

    /// Number of keys that have been requested (`fetched + failed`)
    pub fn completed(&self) -> usize {
        self.fetched + self.failed
    }

    pub fn fetched_count(&self) -> usize {
        self.fetched
    }

    pub fn failed_count(&self) -> usize {
        self.failed
    }

    pub fn pending_count(&self) -> usize {
        self.statuses.len() - self.completed()
    }

    pub fn len(&self) -> usize {
        self.statuses.len()
    }

    pub fn is_empty(&self) -> bool {
        self.statuses.is_empty()
    }

    /// Keys in discovery order, paired with their status
    pub fn iter(&self) -> impl Iterator<Item = (&str, VisitStatus)> {
        self.order
            .iter()
            .filter_map(|k| self.statuses.get(k).map(|s| (k.as_str(), *s)))
    }

    /// Keys with the given status, in discovery order
    pub fn keys_with(&self, status: VisitStatus) -> impl Iterator<Item = &str> {
        self.iter().filter(move |(_, s)| *s == status).map(|(k, _)| k)
    }
}
