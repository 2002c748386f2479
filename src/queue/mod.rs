//! Queue Module
//!
//! Bounded FIFO queue with drop strategies, deduplication and async consumers.

mod bounded;
mod dedup;
mod metrics;
mod options;

pub use bounded::BoundedQueue;
pub use dedup::DedupCache;
pub use metrics::QueueMetrics;
pub use options::{DropStrategy, KeyFn, QueueOptions, DEFAULT_BLOCK_POLL, DEFAULT_CACHE_TTL};
