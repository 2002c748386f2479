//! Mini WorkQ - An adaptive in-process work engine
//!
//! Provides a size- and TTL-bounded LRU cache, a backpressure-aware queue
//! with content deduplication, and an adaptively sized worker pool, served
//! over a small HTTP job API.

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod jobs;
pub mod models;
pub mod pool;
pub mod queue;
pub mod tasks;

pub use api::AppState;
pub use cache::{CacheOptions, EvictionCache};
pub use config::Config;
pub use error::{EngineError, Result};
pub use pool::{work, Concurrency, WorkMetrics, WorkOptions};
pub use queue::{BoundedQueue, DropStrategy, QueueOptions};
pub use tasks::spawn_dispatcher;
