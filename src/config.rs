//! Configuration Module
//!
//! Handles loading and managing service configuration from environment variables.

use std::env;
use std::str::FromStr;
use std::time::Duration;

use crate::error::{EngineError, Result};
use crate::pool::Concurrency;
use crate::queue::DropStrategy;

/// Service configuration parameters.
///
/// All values can be configured via environment variables with sensible defaults.
#[derive(Debug, Clone)]
pub struct Config {
    /// HTTP server port
    pub server_port: u16,
    /// Maximum number of buffered jobs
    pub queue_max_size: usize,
    /// Policy applied when the job queue is full
    pub drop_strategy: DropStrategy,
    /// Window in milliseconds during which equal payloads are coalesced
    pub dedup_ttl_ms: u64,
    /// Worker floor per dispatch run
    pub min_concurrency: usize,
    /// Worker ceiling per dispatch run
    pub max_concurrency: usize,
    /// Items a worker takes per turn
    pub batch_size: usize,
    /// Maximum jobs handed to one pool run
    pub dispatch_batch: usize,
    /// Maximum number of stored job results
    pub result_max_entries: usize,
    /// Lifetime of a stored job result in seconds
    pub result_ttl_secs: u64,
    /// Byte budget of stored job results
    pub result_max_bytes: usize,
}

impl Config {
    /// Creates a new Config by loading values from environment variables.
    ///
    /// # Environment Variables
    /// - `SERVER_PORT` - HTTP server port (default: 3000)
    /// - `QUEUE_MAX_SIZE` - Buffered job cap (default: 1024)
    /// - `QUEUE_DROP_STRATEGY` - `oldest`, `newest` or `block` (default: newest)
    /// - `DEDUP_TTL_MS` - Coalescing window (default: 5000)
    /// - `POOL_MIN_CONCURRENCY` / `POOL_MAX_CONCURRENCY` - Worker bounds (default: 1 / 4)
    /// - `POOL_BATCH_SIZE` - Items per worker turn (default: 1)
    /// - `DISPATCH_BATCH` - Jobs per pool run (default: 64)
    /// - `RESULT_CACHE_MAX_ENTRIES` - Stored results cap (default: 1000)
    /// - `RESULT_CACHE_TTL_SECS` - Stored result lifetime (default: 300)
    /// - `RESULT_CACHE_MAX_BYTES` - Stored results byte budget (default: 1 MiB)
    ///
    /// Missing or unparseable values fall back to their defaults.
    pub fn from_env() -> Self {
        let defaults = Self::default();
        Self {
            server_port: env_or("SERVER_PORT", defaults.server_port),
            queue_max_size: env_or("QUEUE_MAX_SIZE", defaults.queue_max_size),
            drop_strategy: env_or("QUEUE_DROP_STRATEGY", defaults.drop_strategy),
            dedup_ttl_ms: env_or("DEDUP_TTL_MS", defaults.dedup_ttl_ms),
            min_concurrency: env_or("POOL_MIN_CONCURRENCY", defaults.min_concurrency),
            max_concurrency: env_or("POOL_MAX_CONCURRENCY", defaults.max_concurrency),
            batch_size: env_or("POOL_BATCH_SIZE", defaults.batch_size),
            dispatch_batch: env_or("DISPATCH_BATCH", defaults.dispatch_batch),
            result_max_entries: env_or("RESULT_CACHE_MAX_ENTRIES", defaults.result_max_entries),
            result_ttl_secs: env_or("RESULT_CACHE_TTL_SECS", defaults.result_ttl_secs),
            result_max_bytes: env_or("RESULT_CACHE_MAX_BYTES", defaults.result_max_bytes),
        }
    }

    /// Worker bounds for each dispatch run.
    pub fn concurrency(&self) -> Concurrency {
        Concurrency::range(self.min_concurrency, self.max_concurrency)
    }

    /// Rejects settings the dispatcher could never run with.
    pub fn validate(&self) -> Result<()> {
        self.concurrency().validate()?;
        if self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "POOL_BATCH_SIZE must be at least 1".to_string(),
            ));
        }
        if self.dispatch_batch == 0 {
            return Err(EngineError::InvalidConfig(
                "DISPATCH_BATCH must be at least 1".to_string(),
            ));
        }
        Ok(())
    }

    pub fn dedup_ttl(&self) -> Duration {
        Duration::from_millis(self.dedup_ttl_ms)
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            server_port: 3000,
            queue_max_size: 1024,
            drop_strategy: DropStrategy::Newest,
            dedup_ttl_ms: 5000,
            min_concurrency: 1,
            max_concurrency: 4,
            batch_size: 1,
            dispatch_batch: 64,
            result_max_entries: 1000,
            result_ttl_secs: 300,
            result_max_bytes: 1024 * 1024,
        }
    }
}

fn env_or<T: FromStr>(name: &str, default: T) -> T {
    env::var(name)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
