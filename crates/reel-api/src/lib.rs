//! Axum HTTP API server.
//!
//! Submits generation tasks, reports their progress, and accepts
//! cancellation requests. All task state lives in the in-process store
//! shared with the worker pipeline.

pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod routes;
pub mod state;

pub use config::ApiConfig;
pub use error::{ApiError, ApiResult};
pub use routes::create_router;
pub use state::AppState;
