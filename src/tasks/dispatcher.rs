//! Job Dispatcher Task
//!
//! Background task that drains the job queue into worker pool runs and
//! stores each job's outcome in the result cache.

use std::sync::Arc;

use tokio::task::JoinHandle;
use tracing::{error, info, warn};

use crate::api::AppState;
use crate::config::Config;
use crate::error::Result;
use crate::jobs::{self, Job, JobError, JobResult};
use crate::pool::{work, Concurrency, WorkMetrics, WorkOptions};

/// Spawns the dispatcher loop.
///
/// Each iteration waits for one job, then takes whatever else is already
/// buffered (up to `dispatch_batch` jobs in total) and runs them through a
/// single pool run. The summary of the run is kept in `AppState::last_run`.
///
/// # Returns
/// A JoinHandle for the spawned task, which can be used to abort the task
/// during graceful shutdown.
pub fn spawn_dispatcher(state: AppState, config: &Config) -> JoinHandle<()> {
    let concurrency = config.concurrency();
    let batch_size = config.batch_size;
    let dispatch_batch = config.dispatch_batch.max(1);

    tokio::spawn(async move {
        info!(
            min = concurrency.min,
            max = concurrency.max,
            dispatch_batch,
            "starting job dispatcher"
        );

        loop {
            let batch = next_batch(&state, dispatch_batch).await;
            let size = batch.len();

            match run_jobs(&state, concurrency, batch_size, batch).await {
                Ok(metrics) => {
                    info!(
                        jobs = size,
                        completed = metrics.completed,
                        failed = metrics.failed,
                        "dispatch run finished"
                    );
                    *state.last_run.lock() = Some(metrics);
                }
                Err(err) => error!(jobs = size, error = %err, "dispatch run failed"),
            }
        }
    })
}

/// Waits for the first job, then drains without waiting.
async fn next_batch(state: &AppState, limit: usize) -> Vec<Job> {
    let mut batch = vec![state.jobs.next().await];
    while batch.len() < limit {
        match state.jobs.try_next() {
            Some(job) => batch.push(job),
            None => break,
        }
    }
    batch
}

/// Runs one pool pass over `batch`, recording every outcome in the result cache.
pub async fn run_jobs(
    state: &AppState,
    concurrency: Concurrency,
    batch_size: usize,
    batch: Vec<Job>,
) -> Result<WorkMetrics> {
    let results = Arc::clone(&state.results);
    let operation = move |job: Job| {
        let results = Arc::clone(&results);
        async move {
            let outcome = jobs::process(&job.payload);
            results.set(job.id, JobResult::from(&outcome));
            outcome
        }
    };

    let options = WorkOptions::new()
        .batch_size(batch_size)
        .on_error(|err: &JobError, job: &Job| warn!(id = %job.id, error = %err, "job failed"));

    work(concurrency, batch, operation, options).await
}
