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
//! Request instrumentation middleware
//!
//! Wraps every route of a router:
//!
//! 1. buffers the request body once, counts it into
//!    `network_bytes_received_total`, and hands the handler an identical body
//! 2. times the inner handler
//! 3. records `http_requests_total` and `http_request_duration_seconds`
//!    with the observed method, route and status
//! 4. counts every response body chunk into `network_bytes_sent_total` as it
//!    is streamed to the client
//!
//! With a request timeout set, a single deadline covers both the body read
//! and the handler. A request that misses it is answered with
//! `408 Request Timeout` and still counted.
//!
//! The `path` label is the matched route template (`/files/:name`), not the
//! raw URI, which keeps label cardinality bounded by the route table.
//! Requests that match no route share the [`UNMATCHED_PATH`] label.
//!
//! ```rust,ignore
//! let app = Router::new()
//!     .route("/", get(index))
//!     .layer(middleware::from_fn_with_state(
//!         HttpMetrics::new(registry, 16 * 1024 * 1024)
//!             .with_request_timeout(Some(Duration::from_secs(30))),
//!         track_metrics,
//!     ));
//! ```

use std::error::Error as StdError;
use std::future::Future;
use std::time::{Duration, Instant};

use axum::{
    body::{to_bytes, Body},
    extract::{MatchedPath, Request, State},
    http::{Method, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use http_body_util::{BodyExt, LengthLimitError};
use prometheus::IntCounter;
use tracing::warn;

use crate::MetricsRegistry;

/// `path` label for requests that matched no route
pub const UNMATCHED_PATH: &str = "<unmatched>";

/// State for [`track_metrics`]
#[derive(Clone)]
pub struct HttpMetrics {
    registry: MetricsRegistry,
    body_limit: usize,
    request_timeout: Option<Duration>,
}

impl HttpMetrics {
    /// Instrument requests into `registry`, buffering at most `body_limit`
    /// request body bytes.
    pub fn new(registry: MetricsRegistry, body_limit: usize) -> Self {
        Self {
            registry,
            body_limit,
            request_timeout: None,
        }
    }

    /// Answer `408` when reading the body and running the handler together
    /// take longer than `timeout`. `None` leaves requests unbounded.
    pub fn with_request_timeout(mut self, timeout: Option<Duration>) -> Self {
        self.request_timeout = timeout;
        self
    }
}

/// Metrics middleware, for use with `axum::middleware::from_fn_with_state`
///
/// A request body larger than the configured limit is answered with
/// `413 Payload Too Large`, a body that fails mid-read with
/// `400 Bad Request`, and a request past its deadline with
/// `408 Request Timeout`. None of these reach (or finish) the handler, and
/// all of them are counted.
pub async fn track_metrics(
    State(metrics): State<HttpMetrics>,
    matched_path: Option<MatchedPath>,
    request: Request,
    next: Next,
) -> Response {
    let received_at = Instant::now();
    let deadline = metrics
        .request_timeout
        .map(|timeout| tokio::time::Instant::now() + timeout);
    let method = request.method().clone();
    let path = matched_path
        .as_ref()
        .map(|p| p.as_str().to_owned())
        .unwrap_or_else(|| UNMATCHED_PATH.to_owned());
    let registry = &metrics.registry;

    let (parts, body) = request.into_parts();
    let bytes = match within(deadline, to_bytes(body, metrics.body_limit)).await {
        Some(Ok(bytes)) => bytes,
        Some(Err(e)) => {
            let response = if is_length_limit(&e) {
                warn!(
                    "{} {}: request body exceeds {} bytes",
                    method, path, metrics.body_limit
                );
                (StatusCode::PAYLOAD_TOO_LARGE, "Request body too large").into_response()
            } else {
                warn!("{} {}: failed to read request body: {}", method, path, e);
                (StatusCode::BAD_REQUEST, "Failed to read request body").into_response()
            };
            return finish(registry, &method, &path, received_at, response);
        }
        None => {
            warn!("{} {}: timed out reading request body", method, path);
            return finish(registry, &method, &path, received_at, timed_out());
        }
    };
    registry.record_bytes_received(bytes.len() as u64);

    let request = Request::from_parts(parts, Body::from(bytes));

    let start = Instant::now();
    let response = match within(deadline, next.run(request)).await {
        Some(response) => response,
        None => {
            warn!("{} {}: handler timed out", method, path);
            timed_out()
        }
    };
    finish(registry, &method, &path, start, response)
}

/// Run `fut` to completion, or until `deadline` passes
async fn within<F: Future>(deadline: Option<tokio::time::Instant>, fut: F) -> Option<F::Output> {
    match deadline {
        Some(deadline) => tokio::time::timeout_at(deadline, fut).await.ok(),
        None => Some(fut.await),
    }
}

fn timed_out() -> Response {
    (StatusCode::REQUEST_TIMEOUT, "Request timed out").into_response()
}

fn finish(
    registry: &MetricsRegistry,
    method: &Method,
    path: &str,
    start: Instant,
    response: Response,
) -> Response {
    registry.record_request(
        method.as_str(),
        path,
        response.status().as_u16(),
        start.elapsed().as_secs_f64(),
    );
    count_sent_bytes(response, registry.bytes_sent_counter())
}

/// Wrap the response body so each data frame is counted as it is polled
fn count_sent_bytes(response: Response, counter: IntCounter) -> Response {
    response.map(|body| {
        Body::new(body.map_frame(move |frame| {
            if let Some(data) = frame.data_ref() {
                counter.inc_by(data.len() as u64);
            }
            frame
        }))
    })
}

fn is_length_limit(err: &axum::Error) -> bool {
    let mut source: Option<&(dyn StdError + 'static)> = Some(err);
    while let Some(e) = source {
        if e.is::<LengthLimitError>() {
            return true;
        }
        source = e.source();
    }
    false
}
