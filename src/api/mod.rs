//! API Module
//!
//! HTTP handlers and routing for the work service REST API.
//!
//! # Endpoints
//! - `POST /jobs` - Queue a job
//! - `GET /results/:id` - Fetch a job's outcome
//! - `GET /stats` - Queue, result cache and pool statistics
//! - `GET /health` - Health check endpoint

pub mod handlers;
pub mod routes;

pub use handlers::*;
pub use routes::create_router;
