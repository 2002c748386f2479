//! Adaptive Worker Pool
//!
//! Runs an async operation over a finite batch of items with a worker count
//! that tracks the backlog between a minimum and a maximum.
//!
//! Workers take items from a shared pending list, newest first (the list is
//! popped from its end). A worker retires itself once there are more workers
//! than the backlog needs and the floor allows it; a control loop ticking on
//! a fixed period is the only path that adds workers. Both decisions are
//! taken inside the same lock as the pending-list mutation.

use std::future::Future;
use std::sync::Arc;

use futures::future::join_all;
use parking_lot::Mutex;
use tokio::task::JoinSet;
use tokio::time::MissedTickBehavior;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};

use crate::error::{EngineError, Result};
use crate::pool::options::{ErrorFn, ProgressFn};
use crate::pool::{Concurrency, WorkEvent, WorkMetrics, WorkOptions};
use crate::queue::BoundedQueue;

// == Run State ==
#[derive(Debug)]
struct RunState<T> {
    /// Items not yet taken, with their input position; popped from the end
    pending: Vec<(usize, T)>,
    completed: usize,
    failed: usize,
    active: usize,
    peak: usize,
    /// Active count seen by the last control-loop tick
    observed: usize,
}

// == Shared ==
/// State and configuration shared by the driver and every worker of a run.
struct Shared<T, R, E, F> {
    state: Mutex<RunState<T>>,
    operation: F,
    min: usize,
    max: usize,
    batch_size: usize,
    total: usize,
    on_progress: Option<ProgressFn>,
    on_error: Option<ErrorFn<T, E>>,
    results: Arc<BoundedQueue<WorkEvent<R, E>>>,
    cancel: Option<CancellationToken>,
}

impl<T, R, E, F, Fut> Shared<T, R, E, F>
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    fn is_cancelled(&self) -> bool {
        self.cancel
            .as_ref()
            .map_or(false, CancellationToken::is_cancelled)
    }

    // == Take Batch ==
    /// Hands the calling worker its next batch, or retires it.
    ///
    /// Returning `None` has already removed the worker from the active count.
    fn take_batch(&self) -> Option<Vec<(usize, T)>> {
        let mut state = self.state.lock();

        if state.pending.is_empty() || self.is_cancelled() {
            state.active -= 1;
            return None;
        }

        let needed = state.pending.len().div_ceil(self.batch_size);
        if state.active > needed && state.active > self.min {
            state.active -= 1;
            debug!(active = state.active, backlog = state.pending.len(), "worker retired");
            return None;
        }

        let take = self.batch_size.min(state.pending.len());
        let split = state.pending.len() - take;
        let mut batch = state.pending.split_off(split);
        batch.reverse();
        Some(batch)
    }

    // == Scale Up ==
    /// Number of workers to add now; they are counted active on return.
    fn scale_up(&self) -> usize {
        let mut state = self.state.lock();
        state.observed = state.active;

        if self.is_cancelled() || state.active >= self.max {
            return 0;
        }

        let backlog_workers = state.pending.len().div_ceil(self.batch_size);
        let needed = (self.max - state.active).min(backlog_workers.saturating_sub(state.active));
        if needed > 0 {
            state.active += needed;
            state.peak = state.peak.max(state.active);
        }
        needed
    }

    // == Process ==
    /// Runs the operation on one item and reports its outcome.
    async fn process(&self, index: usize, item: T) {
        let retained = self.on_error.as_ref().map(|_| item.clone());

        let outcome = (self.operation)(item).await;
        // Progress is read in the same critical section as the increment
        let finished = {
            let mut state = self.state.lock();
            match &outcome {
                Ok(_) => state.completed += 1,
                Err(_) => state.failed += 1,
            }
            state.completed + state.failed
        };

        let event = match outcome {
            Ok(output) => WorkEvent::Completed {
                index,
                output: Arc::new(output),
            },
            Err(error) => {
                warn!(index, "work item failed");
                WorkEvent::Failed {
                    index,
                    error: Arc::new(error),
                }
            }
        };

        let failure = match &event {
            WorkEvent::Failed { error, .. } => Some(Arc::clone(error)),
            WorkEvent::Completed { .. } => None,
        };

        if !self.results.push(event).await {
            debug!(index, "result queue refused work event");
        }

        if let (Some(on_error), Some(error), Some(item)) = (&self.on_error, failure, &retained) {
            on_error(&error, item);
        }

        if let Some(on_progress) = &self.on_progress {
            on_progress(finished, self.total);
        }
    }

    fn snapshot(&self) -> WorkMetrics {
        let state = self.state.lock();
        WorkMetrics {
            completed: state.completed,
            failed: state.failed,
            total: self.total,
            current_concurrency: state.observed,
            peak_concurrency: state.peak,
            cancelled: self.is_cancelled() && !state.pending.is_empty(),
        }
    }
}

// == Worker Loop ==
async fn run_worker<T, R, E, F, Fut>(shared: Arc<Shared<T, R, E, F>>)
where
    T: Clone,
    F: Fn(T) -> Fut,
    Fut: Future<Output = std::result::Result<R, E>>,
{
    while let Some(batch) = shared.take_batch() {
        if batch.len() == 1 {
            for (index, item) in batch {
                shared.process(index, item).await;
            }
        } else {
            join_all(
                batch
                    .into_iter()
                    .map(|(index, item)| shared.process(index, item)),
            )
            .await;
        }
    }
}

// == Work ==
/// Processes every item with `operation` on an adaptively sized worker pool.
///
/// Per-item errors are counted, published to the result queue and passed to
/// `on_error`; they never abort the run. The call only fails for invalid
/// configuration or when a worker task panics.
///
/// # Example
/// ```ignore
/// let metrics = work(1..=4, items, |item| async move { handle(item).await }, WorkOptions::new()).await?;
/// assert_eq!(metrics.completed + metrics.failed, metrics.total);
/// ```
pub async fn work<T, R, E, F, Fut>(
    concurrency: impl Into<Concurrency>,
    items: impl IntoIterator<Item = T>,
    operation: F,
    options: WorkOptions<T, R, E>,
) -> Result<WorkMetrics>
where
    T: Clone + Send + 'static,
    R: Send + Sync + 'static,
    E: Send + Sync + 'static,
    F: Fn(T) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = std::result::Result<R, E>> + Send + 'static,
{
    let concurrency = concurrency.into();
    concurrency.validate()?;
    options.validate()?;

    let pending: Vec<(usize, T)> = items.into_iter().enumerate().collect();
    let total = pending.len();
    let batch_size = options.effective_batch_size();
    let initial = concurrency.min.min(total.div_ceil(batch_size));

    let shared = Arc::new(Shared {
        state: Mutex::new(RunState {
            pending,
            completed: 0,
            failed: 0,
            active: initial,
            peak: initial,
            observed: initial,
        }),
        operation,
        min: concurrency.min,
        max: concurrency.max,
        batch_size,
        total,
        on_progress: options.on_progress,
        on_error: options.on_error,
        results: options
            .results
            .unwrap_or_else(|| Arc::new(BoundedQueue::unbounded())),
        cancel: options.cancel_token,
    });

    info!(
        total,
        min = concurrency.min,
        max = concurrency.max,
        batch_size,
        "starting worker pool"
    );

    let mut workers = JoinSet::new();
    for _ in 0..initial {
        workers.spawn(run_worker(Arc::clone(&shared)));
    }

    let mut control = tokio::time::interval(options.scale_interval);
    control.set_missed_tick_behavior(MissedTickBehavior::Delay);
    // The first tick completes immediately
    control.tick().await;

    loop {
        tokio::select! {
            joined = workers.join_next() => match joined {
                None => break,
                Some(Ok(())) => {}
                Some(Err(err)) => return Err(EngineError::Worker(err.to_string())),
            },
            _ = control.tick() => {
                let added = shared.scale_up();
                if added > 0 {
                    debug!(added, "scaling worker pool up");
                    for _ in 0..added {
                        workers.spawn(run_worker(Arc::clone(&shared)));
                    }
                }
            }
        }
    }

    let metrics = shared.snapshot();
    info!(
        completed = metrics.completed,
        failed = metrics.failed,
        peak = metrics.peak_concurrency,
        cancelled = metrics.cancelled,
        "worker pool finished"
    );
    Ok(metrics)
}
