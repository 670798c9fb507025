//! Axum HTTP API server.
//!
//! This crate provides:
//! - The clip job surface (submit, status, list, delete, test-webhook)
//! - Health checks probing the external tool binaries
//! - Prometheus metrics

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
