//! Pool Options Module
//!
//! Concurrency bounds and tuning knobs for a worker pool run.

use std::fmt;
use std::ops::RangeInclusive;
use std::sync::Arc;
use std::time::Duration;

use serde::Serialize;
use tokio_util::sync::CancellationToken;

use crate::error::{EngineError, Result};
use crate::pool::WorkEvent;
use crate::queue::BoundedQueue;

/// Period of the scale-up control loop.
pub const DEFAULT_SCALE_INTERVAL: Duration = Duration::from_millis(100);

/// Called with `(finished, total)` after every item.
pub type ProgressFn = Arc<dyn Fn(usize, usize) + Send + Sync>;

/// Called with the error and the item that produced it.
pub type ErrorFn<T, E> = Arc<dyn Fn(&E, &T) + Send + Sync>;

// == Concurrency ==
/// Bounds on the number of simultaneously active workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Concurrency {
    pub min: usize,
    pub max: usize,
}

impl Concurrency {
    /// Exactly `workers` workers.
    pub fn fixed(workers: usize) -> Self {
        Self {
            min: workers,
            max: workers,
        }
    }

    /// Between `min` and `max` workers, scaled with the backlog.
    pub fn range(min: usize, max: usize) -> Self {
        Self { min, max }
    }

    pub fn validate(&self) -> Result<()> {
        if self.min == 0 {
            return Err(EngineError::InvalidConfig(
                "minimum concurrency must be at least 1".to_string(),
            ));
        }
        if self.min > self.max {
            return Err(EngineError::InvalidConfig(format!(
                "minimum concurrency {} exceeds maximum {}",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

impl From<usize> for Concurrency {
    fn from(workers: usize) -> Self {
        Concurrency::fixed(workers)
    }
}

impl From<RangeInclusive<usize>> for Concurrency {
    fn from(range: RangeInclusive<usize>) -> Self {
        Concurrency::range(*range.start(), *range.end())
    }
}

impl From<(usize, usize)> for Concurrency {
    fn from((min, max): (usize, usize)) -> Self {
        Concurrency::range(min, max)
    }
}

// == Work Options ==
/// Callbacks and tuning for one call to [`work`](super::work).
pub struct WorkOptions<T, R, E> {
    pub(crate) on_progress: Option<ProgressFn>,
    pub(crate) on_error: Option<ErrorFn<T, E>>,
    pub(crate) enable_batching: bool,
    pub(crate) batch_size: usize,
    pub(crate) scale_interval: Duration,
    pub(crate) cancel_token: Option<CancellationToken>,
    pub(crate) results: Option<Arc<BoundedQueue<WorkEvent<R, E>>>>,
}

impl<T, R, E> Default for WorkOptions<T, R, E> {
    fn default() -> Self {
        Self {
            on_progress: None,
            on_error: None,
            enable_batching: false,
            batch_size: 1,
            scale_interval: DEFAULT_SCALE_INTERVAL,
            cancel_token: None,
            results: None,
        }
    }
}

impl<T, R, E> fmt::Debug for WorkOptions<T, R, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkOptions")
            .field("on_progress", &self.on_progress.is_some())
            .field("on_error", &self.on_error.is_some())
            .field("enable_batching", &self.enable_batching)
            .field("batch_size", &self.batch_size)
            .field("scale_interval", &self.scale_interval)
            .field("cancel_token", &self.cancel_token.is_some())
            .field("results", &self.results.is_some())
            .finish()
    }
}

impl<T, R, E> WorkOptions<T, R, E> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_progress<F>(mut self, on_progress: F) -> Self
    where
        F: Fn(usize, usize) + Send + Sync + 'static,
    {
        self.on_progress = Some(Arc::new(on_progress));
        self
    }

    pub fn on_error<F>(mut self, on_error: F) -> Self
    where
        F: Fn(&E, &T) + Send + Sync + 'static,
    {
        self.on_error = Some(Arc::new(on_error));
        self
    }

    pub fn enable_batching(mut self, enable: bool) -> Self {
        self.enable_batching = enable;
        self
    }

    /// Items taken per worker turn. Values above 1 turn batching on.
    pub fn batch_size(mut self, batch_size: usize) -> Self {
        self.batch_size = batch_size;
        if batch_size > 1 {
            self.enable_batching = true;
        }
        self
    }

    pub fn scale_interval(mut self, interval: Duration) -> Self {
        self.scale_interval = interval;
        self
    }

    /// Stops workers from taking new items once the token is cancelled.
    /// Items already in flight still finish.
    pub fn cancel_token(mut self, token: CancellationToken) -> Self {
        self.cancel_token = Some(token);
        self
    }

    /// Queue receiving one [`WorkEvent`] per finished item.
    pub fn results(mut self, queue: Arc<BoundedQueue<WorkEvent<R, E>>>) -> Self {
        self.results = Some(queue);
        self
    }

    /// Items a worker takes per turn.
    pub(crate) fn effective_batch_size(&self) -> usize {
        if self.enable_batching || self.batch_size > 1 {
            self.batch_size
        } else {
            1
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.batch_size == 0 {
            return Err(EngineError::InvalidConfig(
                "batch_size must be at least 1".to_string(),
            ));
        }
        if self.scale_interval.is_zero() {
            return Err(EngineError::InvalidConfig(
                "scale_interval must be greater than zero".to_string(),
            ));
        }
        Ok(())
    }
}
