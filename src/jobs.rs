//! Jobs Module
//!
//! Job type accepted by the service and the operation the worker pool runs on it.
//!
//! A job payload is a whitespace-separated list of integers; processing
//! reports how many there are and their sum.

use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

use serde::Serialize;
use thiserror::Error;

/// Maximum accepted payload length in bytes
pub const MAX_PAYLOAD_LEN: usize = 64 * 1024;

// == Job ==
/// A unit of work submitted to the service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Job {
    /// Content-derived identifier; equal payloads share an id
    pub id: String,
    pub payload: String,
}

impl Job {
    pub fn new(payload: impl Into<String>) -> Self {
        let payload = payload.into();
        Self {
            id: job_id(&payload),
            payload,
        }
    }
}

/// Stable identifier for a payload.
pub fn job_id(payload: &str) -> String {
    let mut hasher = DefaultHasher::new();
    payload.hash(&mut hasher);
    format!("{:016x}", hasher.finish())
}

// == Job Output ==
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JobOutput {
    /// Number of integers in the payload
    pub count: usize,
    /// Their sum
    pub sum: i64,
}

// == Job Error ==
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum JobError {
    #[error("invalid integer '{0}'")]
    InvalidToken(String),

    #[error("sum overflowed")]
    Overflow,
}

// == Job Result ==
/// Stored outcome of a job, served by the results endpoint.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", rename_all = "lowercase")]
pub enum JobResult {
    Completed { output: JobOutput },
    Failed { error: String },
}

impl JobResult {
    /// Approximate heap footprint, charged against the result cache budget.
    pub fn size_bytes(&self) -> usize {
        match self {
            JobResult::Completed { .. } => std::mem::size_of::<JobOutput>(),
            JobResult::Failed { error } => error.len(),
        }
    }
}

impl From<&Result<JobOutput, JobError>> for JobResult {
    fn from(outcome: &Result<JobOutput, JobError>) -> Self {
        match outcome {
            Ok(output) => JobResult::Completed {
                output: output.clone(),
            },
            Err(err) => JobResult::Failed {
                error: err.to_string(),
            },
        }
    }
}

// == Process ==
/// Parses the payload and sums its integers.
pub fn process(payload: &str) -> Result<JobOutput, JobError> {
    let mut count = 0;
    let mut sum: i64 = 0;

    for token in payload.split_whitespace() {
        let value: i64 = token
            .parse()
            .map_err(|_| JobError::InvalidToken(token.to_string()))?;
        sum = sum.checked_add(value).ok_or(JobError::Overflow)?;
        count += 1;
    }

    Ok(JobOutput { count, sum })
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_job_id_is_content_derived() {
        let a = Job::new("1 2 3");
        let b = Job::new("1 2 3");
        let c = Job::new("4 5");

        assert_eq!(a.id, b.id);
        assert_ne!(a.id, c.id);
        assert_eq!(a.id.len(), 16);
    }

    #[test]
    fn test_process_sums_integers() {
        let output = process("1 2  3\n-4").unwrap();
        assert_eq!(output, JobOutput { count: 4, sum: 2 });
    }

    #[test]
    fn test_process_empty_payload() {
        assert_eq!(process("   ").unwrap(), JobOutput { count: 0, sum: 0 });
    }

    #[test]
    fn test_process_rejects_invalid_token() {
        assert_eq!(
            process("1 two 3"),
            Err(JobError::InvalidToken("two".to_string()))
        );
    }

    #[test]
    fn test_process_detects_overflow() {
        let payload = format!("{} 1", i64::MAX);
        assert_eq!(process(&payload), Err(JobError::Overflow));
    }

    #[test]
    fn test_job_result_serialize() {
        let done = JobResult::from(&process("2 2"));
        let json = serde_json::to_string(&done).unwrap();
        assert!(json.contains("\"status\":\"completed\""));
        assert!(json.contains("\"sum\":4"));

        let failed = JobResult::from(&process("x"));
        let json = serde_json::to_string(&failed).unwrap();
        assert!(json.contains("\"status\":\"failed\""));
        assert!(json.contains("invalid integer"));
    }
}
