//! Cache Module
//!
//! Bounded in-memory cache with TTL expiry, LRU eviction and byte budgets.

mod entry;
mod options;
mod order;
mod stats;
mod store;


// Re-export public types
pub use entry::CacheEntry;
pub use options::{CacheOptions, EvictFn, SizeFn};
pub use order::InsertionOrder;
pub use stats::CacheStats;
pub use store::EvictionCache;
