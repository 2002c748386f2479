//! Queue Metrics Module
//!
//! Live counters of the bounded queue.

use serde::Serialize;

// == Queue Metrics ==
/// Snapshot of queue activity. All counters accumulate except `current_size`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct QueueMetrics {
    /// Items accepted by `push`, including coalesced duplicates
    pub enqueued: u64,
    /// Items handed to consumers, from the buffer or directly
    pub dequeued: u64,
    /// Items lost to the drop strategy
    pub dropped: u64,
    /// Pushes answered from the deduplication map
    pub cache_hits: u64,
    /// Pushes that found no live deduplication entry
    pub cache_misses: u64,
    /// Items currently buffered
    pub current_size: usize,
}

impl QueueMetrics {
    pub fn new() -> Self {
        Self::default()
    }

    // == Hit Rate ==
    /// Returns cache_hits / (cache_hits + cache_misses), or 0.0 without lookups.
    pub fn hit_rate(&self) -> f64 {
        let total = self.cache_hits + self.cache_misses;
        if total == 0 {
            0.0
        } else {
            self.cache_hits as f64 / total as f64
        }
    }
}
