//! Pool Metrics Module
//!
//! Per-item outcome records and the summary of a pool run.

use std::sync::Arc;

use serde::Serialize;

// == Work Event ==
/// Outcome of one item, published to the run's result queue.
///
/// `index` is the item's position in the input sequence.
#[derive(Debug)]
pub enum WorkEvent<R, E> {
    Completed { index: usize, output: Arc<R> },
    Failed { index: usize, error: Arc<E> },
}

impl<R, E> Clone for WorkEvent<R, E> {
    fn clone(&self) -> Self {
        match self {
            WorkEvent::Completed { index, output } => WorkEvent::Completed {
                index: *index,
                output: Arc::clone(output),
            },
            WorkEvent::Failed { index, error } => WorkEvent::Failed {
                index: *index,
                error: Arc::clone(error),
            },
        }
    }
}

impl<R, E> WorkEvent<R, E> {
    pub fn index(&self) -> usize {
        match self {
            WorkEvent::Completed { index, .. } | WorkEvent::Failed { index, .. } => *index,
        }
    }

    pub fn is_success(&self) -> bool {
        matches!(self, WorkEvent::Completed { .. })
    }
}

// == Work Metrics ==
/// Summary returned when a pool run finishes.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct WorkMetrics {
    /// Items whose operation succeeded
    pub completed: usize,
    /// Items whose operation returned an error
    pub failed: usize,
    /// Items handed to the run
    pub total: usize,
    /// Active workers at the last control-loop observation
    pub current_concurrency: usize,
    /// Highest number of simultaneously active workers
    pub peak_concurrency: usize,
    /// Whether the run stopped early on its cancellation token
    pub cancelled: bool,
}

impl WorkMetrics {
    /// Items that never ran because the run was cancelled.
    pub fn skipped(&self) -> usize {
        self.total - self.completed - self.failed
    }
}
