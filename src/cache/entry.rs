//! Cache Entry Module
//!
//! Defines the structure for individual cache entries with age and recency tracking.

use std::time::{Duration, Instant};

// == Cache Entry ==
/// A single cache entry with value and access metadata.
///
/// `created_at` is fixed at insertion; `last_access` moves forward on every
/// successful read, so `last_access >= created_at` always holds.
#[derive(Debug, Clone)]
pub struct CacheEntry<V> {
    /// The stored value
    pub value: V,
    /// Byte size charged against the cache budget when inserted
    pub size: usize,
    /// Insertion time
    pub created_at: Instant,
    /// Last successful read (or insertion)
    pub last_access: Instant,
}

impl<V> CacheEntry<V> {
    // == Constructor ==
    /// Creates a new entry stamped with the current time.
    pub fn new(value: V, size: usize) -> Self {
        let now = Instant::now();
        Self {
            value,
            size,
            created_at: now,
            last_access: now,
        }
    }

    // == Age ==
    /// Time elapsed since insertion.
    pub fn age(&self) -> Duration {
        self.created_at.elapsed()
    }

    // == Is Expired ==
    /// Checks whether the entry outlived the given TTL.
    ///
    /// An entry expires once its age strictly exceeds the TTL. `None` means
    /// entries never expire.
    pub fn is_expired(&self, ttl: Option<Duration>) -> bool {
        match ttl {
            Some(ttl) => self.age() > ttl,
            None => false,
        }
    }

    // == Touch ==
    /// Refreshes recency.
    pub fn touch(&mut self) {
        self.last_access = Instant::now();
    }
}
