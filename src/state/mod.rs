//! State module for tracking crawl progress
//!
//! # Components
//!
//! - `VisitStatus`: Tracks a single page key (pending, fetched, failed)
//! - `VisitedSet`: The crawl's dedup table; a key is enqueued at most once per run
//! - `CrawlState`: The run-level state machine (INIT, RUNNING, DONE/CAPPED/FAILED)

mod crawl_state;
mod visited;

// Re-export main types
pub use crawl_state::CrawlState;
pub use visited::{VisitStatus, VisitedSet};
