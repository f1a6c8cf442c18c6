use std::fmt;

/// Lifecycle of one crawl run
///
/// ```text
/// INIT -> RUNNING -> DONE     frontier emptied
///                 -> CAPPED   page limit reached with work left
///                 -> FAILED   seed could not be fetched at all
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CrawlState {
    Init,
    Running,
    Done,
    Capped,
    Failed,
}

impl CrawlState {
    /// Returns true if the run has ended
    pub fn is_terminal(&self) -> bool {
        matches!(self, Self::Done | Self::Capped | Self::Failed)
    }

    /// Returns true if `next` is a legal successor of this state
    pub fn can_transition_to(&self, next: CrawlState) -> bool {
        matches!(
            (self, next),
            (Self::Init, Self::Running)
                | (Self::Init, Self::Failed)
                | (Self::Running, Self::Done)
                | (Self::Running, Self::Capped)
                | (Self::Running, Self::Failed)
        )
    }

    /// Moves to `next`, returning the new state or `None` if illegal
    pub fn transition(self, next: CrawlState) -> Option<CrawlState> {
        if self.can_transition_to(next) {
            tracing::debug!("Crawl state {} -> {}", self, next);
            Some(next)
        } else {
            None
        }
    }

    /// Terminal state for a run that left the loop normally
    pub fn finished(frontier_empty: bool) -> CrawlState {
        if frontier_empty {
            Self::Done
        } else {
            Self::Capped
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Init => "INIT",
            Self::Running => "RUNNING",
            Self::Done => "DONE",
            Self::Capped => "CAPPED",
            Self::Failed => "FAILED",
        }
    }
}

impl Default for CrawlState {
    fn default() -> Self {
        Self::Init
    }
}

impl fmt::Display for CrawlState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
