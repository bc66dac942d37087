//! # testpool-api
//!
//! HTTP API layer for the test data portal built on Axum.
//!
//! Exposes identifier reservation and a pool health check, with request
//! logging, tracing and CORS layers, DTOs, and error mapping.

pub mod dto;
pub mod error;
pub mod extractors;
pub mod handlers;
pub mod middleware;
pub mod router;
pub mod state;

pub use error::ApiError;
pub use router::build_router;
pub use state::AppState;
