//! Queue Options Module
//!
//! Capacity, drop strategy and deduplication settings for the bounded queue.

use std::fmt;
use std::str::FromStr;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;

use crate::error::{EngineError, Result};

/// Default lifetime of a deduplication entry.
pub const DEFAULT_CACHE_TTL: Duration = Duration::from_millis(5000);

/// Default poll period of a push blocked on a full queue.
pub const DEFAULT_BLOCK_POLL: Duration = Duration::from_millis(10);

/// Derives the deduplication key of an item.
pub type KeyFn<T> = Arc<dyn Fn(&T) -> String + Send + Sync>;

// == Drop Strategy ==
/// Policy applied when the queue is full at push time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum DropStrategy {
    /// Evict the current head to make room
    #[default]
    Oldest,
    /// Refuse the incoming item
    Newest,
    /// Wait until space is available
    Block,
}

impl FromStr for DropStrategy {
    type Err = EngineError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "oldest" => Ok(DropStrategy::Oldest),
            "newest" => Ok(DropStrategy::Newest),
            "block" => Ok(DropStrategy::Block),
            other => Err(EngineError::InvalidConfig(format!(
                "unknown drop strategy '{}'",
                other
            ))),
        }
    }
}

// == Queue Options ==
/// Configuration for a [`BoundedQueue`](super::BoundedQueue).
pub struct QueueOptions<T> {
    pub(crate) max_size: Option<usize>,
    pub(crate) drop_strategy: DropStrategy,
    pub(crate) enable_cache: bool,
    pub(crate) cache_key_fn: Option<KeyFn<T>>,
    pub(crate) cache_ttl: Duration,
    pub(crate) block_poll: Duration,
    pub(crate) block_timeout: Option<Duration>,
}

impl<T> Default for QueueOptions<T> {
    fn default() -> Self {
        Self {
            max_size: None,
            drop_strategy: DropStrategy::default(),
            enable_cache: false,
            cache_key_fn: None,
            cache_ttl: DEFAULT_CACHE_TTL,
            block_poll: DEFAULT_BLOCK_POLL,
            block_timeout: None,
        }
    }
}

impl<T> fmt::Debug for QueueOptions<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("QueueOptions")
            .field("max_size", &self.max_size)
            .field("drop_strategy", &self.drop_strategy)
            .field("enable_cache", &self.enable_cache)
            .field("cache_key_fn", &self.cache_key_fn.is_some())
            .field("cache_ttl", &self.cache_ttl)
            .field("block_poll", &self.block_poll)
            .field("block_timeout", &self.block_timeout)
            .finish()
    }
}

impl<T> QueueOptions<T> {
    pub fn new() -> Self {
        Self::default()
    }

    /// Caps the number of buffered items.
    pub fn max_size(mut self, max_size: usize) -> Self {
        self.max_size = Some(max_size);
        self
    }

    pub fn drop_strategy(mut self, drop_strategy: DropStrategy) -> Self {
        self.drop_strategy = drop_strategy;
        self
    }

    /// Enables content-keyed deduplication.
    pub fn cache_key_fn<F>(mut self, key_fn: F) -> Self
    where
        F: Fn(&T) -> String + Send + Sync + 'static,
    {
        self.cache_key_fn = Some(Arc::new(key_fn));
        self.enable_cache = true;
        self
    }

    /// Toggles deduplication. Has no effect without a key function.
    pub fn enable_cache(mut self, enable: bool) -> Self {
        self.enable_cache = enable;
        self
    }

    pub fn cache_ttl(mut self, ttl: Duration) -> Self {
        self.cache_ttl = ttl;
        self
    }

    /// Poll period of a push blocked under [`DropStrategy::Block`].
    pub fn block_poll(mut self, poll: Duration) -> Self {
        self.block_poll = poll;
        self
    }

    /// Gives up a blocked push after `timeout`, counting it as dropped.
    /// Blocked pushes wait forever when unset.
    pub fn block_timeout(mut self, timeout: Duration) -> Self {
        self.block_timeout = Some(timeout);
        self
    }

    pub(crate) fn dedup_enabled(&self) -> bool {
        self.enable_cache && self.cache_key_fn.is_some()
    }

    // == Validate ==
    pub fn validate(&self) -> Result<()> {
        if self.max_size == Some(0) {
            return Err(EngineError::InvalidConfig(
                "max_size must be at least 1".to_string(),
            ));
        }
        if self.dedup_enabled() && self.cache_ttl.is_zero() {
            return Err(EngineError::InvalidConfig(
                "cache_ttl must be greater than zero".to_string(),
            ));
        }
        if self.block_poll.is_zero() {
            return Err(EngineError::InvalidConfig(
                "block_poll must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_drop_strategy_from_str() {
        assert_eq!("oldest".parse::<DropStrategy>().unwrap(), DropStrategy::Oldest);
        assert_eq!("NEWEST".parse::<DropStrategy>().unwrap(), DropStrategy::Newest);
        assert_eq!(" block ".parse::<DropStrategy>().unwrap(), DropStrategy::Block);
        assert!("random".parse::<DropStrategy>().is_err());
    }

    #[test]
    fn test_defaults() {
        let opts: QueueOptions<u32> = QueueOptions::default();
        assert!(opts.max_size.is_none());
        assert_eq!(opts.drop_strategy, DropStrategy::Oldest);
        assert_eq!(opts.cache_ttl, Duration::from_millis(5000));
        assert!(!opts.dedup_enabled());
        assert!(opts.validate().is_ok());
    }

    #[test]
    fn test_dedup_requires_key_fn() {
        let opts: QueueOptions<u32> = QueueOptions::new().enable_cache(true);
        assert!(!opts.dedup_enabled());

        let opts: QueueOptions<u32> = QueueOptions::new().cache_key_fn(|v: &u32| v.to_string());
        assert!(opts.dedup_enabled());

        let opts = opts.enable_cache(false);
        assert!(!opts.dedup_enabled());
    }

    #[test]
    fn test_zero_max_size_rejected() {
        let opts: QueueOptions<u32> = QueueOptions::new().max_size(0);
        assert!(matches!(opts.validate(), Err(EngineError::InvalidConfig(_))));
    }

    #[test]
    fn test_zero_cache_ttl_rejected_only_with_dedup() {
        let opts: QueueOptions<u32> = QueueOptions::new().cache_ttl(Duration::ZERO);
        assert!(opts.validate().is_ok());

        let opts = opts.cache_key_fn(|v| v.to_string());
        assert!(opts.validate().is_err());
    }
}
