//! Worker Pool Module
//!
//! Adaptive, backlog-driven concurrent processing of a finite item batch.

mod metrics;
mod options;
mod worker;

pub use metrics::{WorkEvent, WorkMetrics};
pub use options::{Concurrency, ErrorFn, ProgressFn, WorkOptions, DEFAULT_SCALE_INTERVAL};
pub use worker::work;
