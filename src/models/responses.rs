//! Response DTOs for the work service API
//!
//! Defines the structure of outgoing HTTP response bodies.

use serde::Serialize;

use crate::cache::CacheStats;
use crate::jobs::JobResult;
use crate::pool::WorkMetrics;
use crate::queue::QueueMetrics;

/// Response body for job submission (POST /jobs)
#[derive(Debug, Clone, Serialize)]
pub struct SubmitResponse {
    /// Identifier to poll the result with
    pub id: String,
    /// Success message
    pub message: String,
}

impl SubmitResponse {
    /// Creates a new SubmitResponse
    pub fn new(id: impl Into<String>) -> Self {
        let id = id.into();
        Self {
            message: format!("Job '{}' accepted", id),
            id,
        }
    }
}

/// Response body for result lookup (GET /results/:id)
#[derive(Debug, Clone, Serialize)]
pub struct JobResultResponse {
    /// The job identifier
    pub id: String,
    /// Outcome of the job
    pub result: JobResult,
}

impl JobResultResponse {
    pub fn new(id: impl Into<String>, result: JobResult) -> Self {
        Self {
            id: id.into(),
            result,
        }
    }
}

/// Result cache occupancy, without the key listing
#[derive(Debug, Clone, Serialize)]
pub struct CacheSummary {
    pub size: usize,
    pub byte_size: usize,
    pub evictions: u64,
}

impl<K> From<CacheStats<K>> for CacheSummary {
    fn from(stats: CacheStats<K>) -> Self {
        Self {
            size: stats.size,
            byte_size: stats.byte_size,
            evictions: stats.evictions,
        }
    }
}

/// Response body for the stats endpoint (GET /stats)
#[derive(Debug, Clone, Serialize)]
pub struct StatsResponse {
    /// Job queue counters
    pub queue: QueueMetrics,
    /// Dedup hit rate (cache_hits / (cache_hits + cache_misses))
    pub dedup_hit_rate: f64,
    /// Result cache occupancy
    pub results: CacheSummary,
    /// Summary of the most recent pool run, if any
    pub last_run: Option<WorkMetrics>,
}

impl StatsResponse {
    /// Creates a new StatsResponse from component snapshots
    pub fn new(queue: QueueMetrics, results: CacheSummary, last_run: Option<WorkMetrics>) -> Self {
        Self {
            dedup_hit_rate: queue.hit_rate(),
            queue,
            results,
            last_run,
        }
    }
}

/// Response body for the health endpoint (GET /health)
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    /// Health status (e.g., "healthy")
    pub status: String,
    /// Current timestamp in ISO 8601 format
    pub timestamp: String,
}

impl HealthResponse {
    /// Creates a new HealthResponse with current timestamp
    pub fn healthy() -> Self {
        Self {
            status: "healthy".to_string(),
            timestamp: chrono::Utc::now().to_rfc3339(),
        }
    }
}

/// Error response body for all error conditions
#[derive(Debug, Clone, Serialize)]
pub struct ErrorResponse {
    /// Error message describing what went wrong
    pub error: String,
}

impl ErrorResponse {
    /// Creates a new ErrorResponse
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
        }
    }
}
