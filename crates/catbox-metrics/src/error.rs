//! Metrics error types

use thiserror::Error;

/// Errors raised while building or rendering the metrics registry
#[derive(Error, Debug)]
pub enum MetricsError {
    /// Metric construction or registration failed (bad name, duplicate, ...)
    #[error("prometheus error: {0}")]
    Prometheus(#[from] prometheus::Error),

    /// Encoded exposition was not valid UTF-8
    #[error("metrics encoding error: {0}")]
    Encoding(#[from] std::string::FromUtf8Error),
}
