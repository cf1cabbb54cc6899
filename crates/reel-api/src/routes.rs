//! API routes.

use axum::middleware;
use axum::routing::{get, post};
use axum::Router;
use metrics_exporter_prometheus::PrometheusHandle;

use crate::handlers::tasks::{cancel, generate, list_tasks, status};
use crate::handlers::{health, ready};
use crate::middleware::{cors_layer, request_id, request_logging};
use crate::state::AppState;
use crate::metrics;

/// Create the API router.
pub fn create_router(state: AppState, metrics_handle: Option<PrometheusHandle>) -> Router {
    let task_routes = Router::new()
        .route("/generate", post(generate))
        .route("/status/:task_id", get(status))
        .route("/tasks", get(list_tasks))
        .route("/tasks/:task_id/cancel", post(cancel));

    let health_routes = Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready));

    let mut router = Router::new().merge(task_routes).merge(health_routes);

    if let Some(handle) = metrics_handle {
        router = router.route("/metrics", get(move || async move { handle.render() }));
    }

    router
        .layer(middleware::from_fn(metrics::track_requests))
        .layer(middleware::from_fn(request_id))
        .layer(middleware::from_fn(request_logging))
        .layer(cors_layer(&state.config.cors_origins))
        .with_state(state)
}
