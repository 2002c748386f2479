//! Cache Options Module
//!
//! Construction-time limits and callbacks for the eviction cache.

use std::fmt;
use std::sync::Arc;
use std::time::Duration;

use crate::error::{EngineError, Result};

/// Computes the byte size charged for a value.
pub type SizeFn<V> = Arc<dyn Fn(&V) -> usize + Send + Sync>;

/// Observer fired on every removal (delete, expiry, LRU eviction, clear).
pub type EvictFn<K, V> = Arc<dyn Fn(&K, &V) + Send + Sync>;

// == Cache Options ==
/// Limits and callbacks for an [`EvictionCache`](super::EvictionCache).
///
/// Every limit defaults to unbounded and `size_of` defaults to zero bytes.
pub struct CacheOptions<K, V> {
    pub(crate) max_entries: Option<usize>,
    pub(crate) ttl: Option<Duration>,
    pub(crate) max_bytes: Option<usize>,
    pub(crate) size_of: Option<SizeFn<V>>,
    pub(crate) on_evict: Option<EvictFn<K, V>>,
}

impl<K, V> Default for CacheOptions<K, V> {
    fn default() -> Self {
        Self {
            max_entries: None,
            ttl: None,
            max_bytes: None,
            size_of: None,
            on_evict: None,
        }
    }
}

impl<K, V> fmt::Debug for CacheOptions<K, V> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CacheOptions")
            .field("max_entries", &self.max_entries)
            .field("ttl", &self.ttl)
            .field("max_bytes", &self.max_bytes)
            .field("size_of", &self.size_of.is_some())
            .field("on_evict", &self.on_evict.is_some())
            .finish()
    }
}

impl<K, V> CacheOptions<K, V> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of live entries.
    pub fn max_entries(mut self, max_entries: usize) -> Self {
        self.max_entries = Some(max_entries);
        self
    }

    /// Maximum entry age before transparent expiry.
    pub fn ttl(mut self, ttl: Duration) -> Self {
        self.ttl = Some(ttl);
        self
    }

    /// Caps the summed byte size of live entries.
    pub fn max_bytes(mut self, max_bytes: usize) -> Self {
        self.max_bytes = Some(max_bytes);
        self
    }

    pub fn size_of<F>(mut self, size_of: F) -> Self
    where
        F: Fn(&V) -> usize + Send + Sync + 'static,
    {
        self.size_of = Some(Arc::new(size_of));
        self
    }

    pub fn on_evict<F>(mut self, on_evict: F) -> Self
    where
        F: Fn(&K, &V) + Send + Sync + 'static,
    {
        self.on_evict = Some(Arc::new(on_evict));
        self
    }

    // == Validate ==
    /// Rejects limits that no cache state could satisfy.
    pub fn validate(&self) -> Result<()> {
        if self.max_entries == Some(0) {
            return Err(EngineError::InvalidConfig(
                "max_entries must be at least 1".to_string(),
            ));
        }
        if self.ttl == Some(Duration::ZERO) {
            return Err(EngineError::InvalidConfig(
                "ttl must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
