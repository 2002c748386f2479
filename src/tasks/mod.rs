//! Background Tasks Module
//!
//! Contains background tasks that run during server operation.
//!
//! # Tasks
//! - Dispatcher: Feeds queued jobs to the worker pool and stores their results

mod dispatcher;

pub use dispatcher::{run_jobs, spawn_dispatcher};
