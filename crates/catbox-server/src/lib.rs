//! Catbox HTTP server
//!
//! | Method | Path | Handler |
//! |--------|------|---------|
//! | GET | `/` | [`handlers::index`] |
//! | POST | `/upload` | [`handlers::upload`] |
//! | GET | `/files/:name` | [`handlers::download`] |
//! | GET | `/metrics` | `catbox_metrics::metrics_handler` |
//! | GET | `/health` | [`handlers::health`] |
//!
//! Library exports allow integration tests to build the router directly.

pub mod config;
pub mod error;
pub mod handlers;
pub mod pages;
pub mod state;

pub use config::{ConfigError, ServerConfig};
pub use error::AppError;
pub use state::AppState;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post},
    Router,
};
use catbox_metrics::{metrics_router, track_metrics, HttpMetrics};
use std::sync::Arc;
use tower_http::trace::TraceLayer;

/// Create the axum router with all endpoints
///
/// Layers, outermost first: request tracing, metrics instrumentation (which
/// also enforces the request timeout over body read and handler), then the
/// upload body limit.
pub fn create_router(state: Arc<AppState>) -> Router {
    let metrics = HttpMetrics::new(state.metrics.clone(), state.max_request_bytes)
        .with_request_timeout(state.request_timeout);

    Router::new()
        .route("/", get(handlers::index))
        .route(
            "/upload",
            post(handlers::upload).fallback(handlers::method_not_allowed),
        )
        .route("/files/:name", get(handlers::download))
        .route("/health", get(handlers::health))
        .fallback(handlers::not_found)
        .with_state(Arc::clone(&state))
        .merge(metrics_router(state.metrics.clone()))
        .layer(DefaultBodyLimit::max(state.max_upload_bytes))
        .layer(middleware::from_fn_with_state(metrics, track_metrics))
        .layer(TraceLayer::new_for_http())
}
