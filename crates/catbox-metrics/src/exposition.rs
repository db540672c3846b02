// Copyright (C) 2026  winnyboy5
//
// This program is free software: you can redistribute it and/or modify
// it under the terms of the GNU Affero General Public License as published by
// the Free Software Foundation, either version 3 of the License, or
// (at your option) any later version.
//
// This program is distributed in the hope that it will be useful,
// but WITHOUT ANY WARRANTY; without even the implied warranty of
// MERCHANTABILITY or FITNESS FOR A PARTICULAR PURPOSE.  See the
// GNU Affero General Public License for more details.
//
// You should have received a copy of the GNU Affero General Public License
// along with this program.  If not, see <https://www.gnu.org/licenses/>.
//! `/metrics` endpoint
//!
//! Serves the registry in Prometheus text exposition format. The router
//! returned by [`metrics_router`] carries its own state, so it merges into
//! any application router regardless of that router's state type.

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Router,
};
use tracing::{debug, error};

use crate::MetricsRegistry;

/// Path the exposition is served under
pub const METRICS_PATH: &str = "/metrics";

/// Build a router exposing `GET /metrics` for `registry`
pub fn metrics_router<S>(registry: MetricsRegistry) -> Router<S>
where
    S: Clone + Send + Sync + 'static,
{
    Router::new()
        .route(METRICS_PATH, get(metrics_handler))
        .with_state(registry)
}

/// Handler for `/metrics`
///
/// Returns all metrics in Prometheus text exposition format
pub async fn metrics_handler(State(registry): State<MetricsRegistry>) -> Response {
    match registry.encode_text() {
        Ok(body) => {
            debug!("Serving {} bytes of metrics", body.len());
            (
                StatusCode::OK,
                [(header::CONTENT_TYPE, prometheus::TEXT_FORMAT)],
                body,
            )
                .into_response()
        }
        Err(e) => {
            error!("Failed to encode metrics: {}", e);
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                format!("Failed to encode metrics: {}", e),
            )
                .into_response()
        }
    }
}
