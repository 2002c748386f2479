//! API Handlers
//!
//! HTTP request handlers for each work service endpoint.

use std::sync::Arc;

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use parking_lot::Mutex;
use tracing::debug;

use crate::cache::{CacheOptions, EvictionCache};
use crate::config::Config;
use crate::error::{EngineError, Result};
use crate::jobs::{Job, JobResult};
use crate::models::{
    HealthResponse, JobResultResponse, StatsResponse, SubmitRequest, SubmitResponse,
};
use crate::pool::WorkMetrics;
use crate::queue::{BoundedQueue, QueueOptions};

/// Application state shared across all handlers and the dispatcher.
#[derive(Clone)]
pub struct AppState {
    /// Jobs waiting for a pool run
    pub jobs: Arc<BoundedQueue<Job>>,
    /// Outcomes keyed by job id
    pub results: Arc<EvictionCache<String, JobResult>>,
    /// Summary of the most recent pool run
    pub last_run: Arc<Mutex<Option<WorkMetrics>>>,
}

impl AppState {
    /// Creates a new AppState around an existing queue and result cache.
    pub fn new(jobs: BoundedQueue<Job>, results: EvictionCache<String, JobResult>) -> Self {
        Self {
            jobs: Arc::new(jobs),
            results: Arc::new(results),
            last_run: Arc::new(Mutex::new(None)),
        }
    }

    /// Creates a new AppState from configuration.
    ///
    /// The job queue deduplicates by job id, so equal payloads submitted
    /// within the dedup window are coalesced.
    pub fn from_config(config: &Config) -> Result<Self> {
        config.validate()?;

        let jobs = BoundedQueue::new(
            QueueOptions::new()
                .max_size(config.queue_max_size)
                .drop_strategy(config.drop_strategy)
                .cache_key_fn(|job: &Job| job.id.clone())
                .cache_ttl(config.dedup_ttl()),
        )?;

        let results = EvictionCache::new(
            CacheOptions::new()
                .max_entries(config.result_max_entries)
                .ttl(config.result_ttl())
                .max_bytes(config.result_max_bytes)
                .size_of(|result: &JobResult| result.size_bytes())
                .on_evict(|id: &String, _: &JobResult| debug!(id = %id, "job result evicted")),
        )?;

        Ok(Self::new(jobs, results))
    }
}

/// Handler for POST /jobs
///
/// Queues a job and returns its id. Responds 503 when the queue refuses it.
pub async fn submit_handler(
    State(state): State<AppState>,
    Json(req): Json<SubmitRequest>,
) -> Result<(StatusCode, Json<SubmitResponse>)> {
    if let Some(error_msg) = req.validate() {
        return Err(EngineError::InvalidRequest(error_msg));
    }

    let job = Job::new(req.payload);
    let id = job.id.clone();

    if !state.jobs.push(job).await {
        return Err(EngineError::QueueFull(format!("job '{}' dropped", id)));
    }

    Ok((StatusCode::ACCEPTED, Json(SubmitResponse::new(id))))
}

/// Handler for GET /results/:id
///
/// Returns the stored outcome of a job, or 404 while it is pending,
/// unknown or expired.
pub async fn result_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Json<JobResultResponse>> {
    let result = state
        .results
        .get(id.as_str())
        .ok_or_else(|| EngineError::NotFound(format!("no result for job '{}'", id)))?;

    Ok(Json(JobResultResponse::new(id, result)))
}

/// Handler for GET /stats
pub async fn stats_handler(State(state): State<AppState>) -> Json<StatsResponse> {
    let last_run = state.last_run.lock().clone();

    Json(StatsResponse::new(
        state.jobs.metrics(),
        state.results.stats().into(),
        last_run,
    ))
}

/// Handler for GET /health
pub async fn health_handler() -> Json<HealthResponse> {
    Json(HealthResponse::healthy())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jobs::process;

    fn test_state() -> AppState {
        AppState::from_config(&Config::default()).unwrap()
    }

    #[tokio::test]
    async fn test_submit_handler_queues_job() {
        let state = test_state();

        let req = SubmitRequest {
            payload: "1 2 3".to_string(),
        };
        let (status, response) = submit_handler(State(state.clone()), Json(req))
            .await
            .unwrap();

        assert_eq!(status, StatusCode::ACCEPTED);
        assert_eq!(response.id, Job::new("1 2 3").id);
        assert_eq!(state.jobs.len(), 1);
    }

    #[tokio::test]
    async fn test_submit_invalid_request() {
        let state = test_state();

        let req = SubmitRequest {
            payload: "".to_string(),
        };
        let result = submit_handler(State(state.clone()), Json(req)).await;
        assert!(matches!(result, Err(EngineError::InvalidRequest(_))));
        assert!(state.jobs.is_empty());
    }

    #[tokio::test]
    async fn test_submit_refused_when_full() {
        let config = Config {
            queue_max_size: 1,
            ..Config::default()
        };
        let state = AppState::from_config(&config).unwrap();

        let first = SubmitRequest {
            payload: "1".to_string(),
        };
        let second = SubmitRequest {
            payload: "2".to_string(),
        };
        assert!(submit_handler(State(state.clone()), Json(first)).await.is_ok());

        let result = submit_handler(State(state.clone()), Json(second)).await;
        assert!(matches!(result, Err(EngineError::QueueFull(_))));
        assert_eq!(state.jobs.metrics().dropped, 1);
    }

    #[tokio::test]
    async fn test_result_handler() {
        let state = test_state();
        let job = Job::new("4 5");
        state
            .results
            .set(job.id.clone(), JobResult::from(&process(&job.payload)));

        let response = result_handler(State(state), Path(job.id.clone()))
            .await
            .unwrap();
        assert_eq!(response.id, job.id);
        assert!(matches!(response.result, JobResult::Completed { .. }));
    }

    #[tokio::test]
    async fn test_result_not_found() {
        let state = test_state();

        let result = result_handler(State(state), Path("missing".to_string())).await;
        assert!(matches!(result, Err(EngineError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_stats_handler() {
        let state = test_state();

        let response = stats_handler(State(state)).await;
        assert_eq!(response.queue.enqueued, 0);
        assert_eq!(response.results.size, 0);
        assert!(response.last_run.is_none());
    }

    #[tokio::test]
    async fn test_health_handler() {
        let response = health_handler().await;
        assert_eq!(response.status, "healthy");
    }
}
