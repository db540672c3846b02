//! Catbox Metrics Module
//!
//! Prometheus instrumentation for the catbox upload service.
//!
//! # Features
//!
//! - **Private registry**: each [`MetricsRegistry`] owns its instruments, so
//!   several servers (or tests) can live in one process
//! - **HTTP middleware**: [`track_metrics`] counts, times and sizes every
//!   request without touching its response
//! - **HTTP endpoint**: [`metrics_router`] exposes `GET /metrics` in the
//!   Prometheus text exposition format
//!
//! # Metrics
//!
//! | Name | Type | Labels |
//! |------|------|--------|
//! | `http_requests_total` | counter | method, path, status |
//! | `http_request_duration_seconds` | histogram | method, path |
//! | `storage_bytes` | gauge | |
//! | `network_bytes_sent_total` | counter | |
//! | `network_bytes_received_total` | counter | |
//!
//! # Example
//!
//! ```ignore
//! use axum::{middleware, routing::get, Router};
//! use catbox_metrics::{metrics_router, track_metrics, HttpMetrics, MetricsRegistry};
//!
//! let registry = MetricsRegistry::new()?;
//! let app = Router::new()
//!     .route("/", get(|| async { "hello" }))
//!     .merge(metrics_router(registry.clone()))
//!     .layer(middleware::from_fn_with_state(
//!         HttpMetrics::new(registry.clone(), 16 * 1024 * 1024),
//!         track_metrics,
//!     ));
//! ```

pub mod error;
pub mod exposition;
pub mod middleware;
pub mod registry;

pub use error::MetricsError;
pub use exposition::{metrics_handler, metrics_router, METRICS_PATH};
pub use middleware::{track_metrics, HttpMetrics, UNMATCHED_PATH};
pub use registry::MetricsRegistry;
