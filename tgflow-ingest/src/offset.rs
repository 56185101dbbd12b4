//! High-water mark of seen update ids.

use std::sync::atomic::{AtomicI64, Ordering};

/// Last seen `update_id`; starts at zero and never moves backward. Written by the single ingestion
/// path, readable from anywhere.
#[derive(Debug, Default)]
pub struct OffsetTracker {
    last_seen: AtomicI64,
}

impl OffsetTracker {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn last_seen(&self) -> i64 {
        self.last_seen.load(Ordering::Acquire)
    }

    /// Lower bound for the next retrieval request.
    pub fn next_offset(&self) -> i64 {
        self.last_seen() + 1
    }

    /// Raises the mark to `candidate` if it is higher. Returns true when the mark moved.
    pub fn advance(&self, candidate: i64) -> bool {
        self.last_seen.fetch_max(candidate, Ordering::AcqRel) < candidate
    }
}
