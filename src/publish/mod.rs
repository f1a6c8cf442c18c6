//! Publishing check reports as issues on an external tracker
//!
//! Publishing is a side effect of an audit, never part of its verdict: a
//! rejected or unreachable tracker is logged and the audit carries on.

mod github;

pub use github::GitHubPublisher;

use crate::PublishError;
use async_trait::async_trait;

/// Reference to a created issue
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IssueRef {
    pub number: u64,
    pub url: String,
}

/// An issue tracker that accepts markdown reports
#[async_trait]
pub trait IssuePublisher: Send + Sync {
    /// Creates one issue and returns a reference to it
    async fn publish(
        &self,
        title: &str,
        body: &str,
        labels: &[&str],
    ) -> Result<IssueRef, PublishError>;
}
