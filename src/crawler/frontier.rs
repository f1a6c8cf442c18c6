//! Breadth-first crawl frontier
//!
//! A plain FIFO queue. Deduplication is not done here: the crawler only
//! pushes URLs that were newly marked pending in the `VisitedSet`.

use std::collections::VecDeque;
use url::Url;

/// A URL waiting to be fetched
#[derive(Debug, Clone, PartialEq)]
pub struct QueuedUrl {
    pub url: Url,
    pub key: String,
    pub depth: u32,
}

#[derive(Debug, Default)]
pub struct Frontier {
    queue: VecDeque<QueuedUrl>,
}

impl Frontier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, entry: QueuedUrl) {
        self.queue.push_back(entry);
    }

    /// Removes the oldest entry
    pub fn pop(&mut self) -> Option<QueuedUrl> {
        self.queue.pop_front()
    }

    pub fn len(&self) -> usize {
        self.queue.len()
    }

    pub fn is_empty(&self) -> bool {
        self.queue.is_empty()
    }
}
