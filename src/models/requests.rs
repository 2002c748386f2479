//! Request DTOs for the work service API
//!
//! Defines the structure of incoming HTTP request bodies.

use serde::Deserialize;

use crate::jobs::MAX_PAYLOAD_LEN;

/// Request body for job submission (POST /jobs)
///
/// # Fields
/// - `payload`: Whitespace-separated integers to sum
#[derive(Debug, Clone, Deserialize)]
pub struct SubmitRequest {
    /// The job payload
    pub payload: String,
}

impl SubmitRequest {
    /// Validates the request data
    ///
    /// Returns an error message if validation fails, None if valid.
    pub fn validate(&self) -> Option<String> {
        if self.payload.trim().is_empty() {
            return Some("Payload cannot be empty".to_string());
        }
        if self.payload.len() > MAX_PAYLOAD_LEN {
            return Some(format!(
                "Payload exceeds maximum length of {} bytes",
                MAX_PAYLOAD_LEN
            ));
        }
        None
    }
}
