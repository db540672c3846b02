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
//! Metrics registry for the catbox HTTP service

use prometheus::{
    exponential_buckets, CounterVec, Encoder, HistogramOpts, HistogramVec, IntCounter, IntGauge,
    Opts, Registry, TextEncoder,
};
use std::sync::Arc;

use crate::error::MetricsError;

/// Smallest latency bucket upper bound, in seconds
const DURATION_BUCKET_START: f64 = 0.005;
/// Each bucket doubles the previous bound
const DURATION_BUCKET_FACTOR: f64 = 2.0;
/// 5ms .. ~10.2s
const DURATION_BUCKET_COUNT: usize = 12;

/// Central metrics registry for the service
///
/// Owns its own Prometheus [`Registry`] instead of the process-global one,
/// so every server instance (and every test) gets independent instruments.
/// Thread-safe; clone it freely and share it across request tasks.
#[derive(Clone)]
pub struct MetricsRegistry {
    inner: Arc<MetricsRegistryInner>,
}

struct MetricsRegistryInner {
    /// Prometheus registry
    registry: Registry,

    /// Completed requests by method, path and status code
    http_requests_total: CounterVec,
    /// Request wall-clock duration by method and path
    http_request_duration_seconds: HistogramVec,

    /// Bytes held in the upload directory at last scan
    storage_bytes: IntGauge,

    /// Response body bytes written
    network_bytes_sent_total: IntCounter,
    /// Request body bytes read
    network_bytes_received_total: IntCounter,
}

impl MetricsRegistry {
    /// Create and register all instruments
    pub fn new() -> Result<Self, MetricsError> {
        let registry = Registry::new();

        let http_requests_total = CounterVec::new(
            Opts::new("http_requests_total", "Total number of HTTP requests"),
            &["method", "path", "status"],
        )?;
        registry.register(Box::new(http_requests_total.clone()))?;

        let http_request_duration_seconds = HistogramVec::new(
            HistogramOpts::new(
                "http_request_duration_seconds",
                "Duration of HTTP requests in seconds",
            )
            .buckets(exponential_buckets(
                DURATION_BUCKET_START,
                DURATION_BUCKET_FACTOR,
                DURATION_BUCKET_COUNT,
            )?),
            &["method", "path"],
        )?;
        registry.register(Box::new(http_request_duration_seconds.clone()))?;

        let storage_bytes = IntGauge::with_opts(Opts::new(
            "storage_bytes",
            "Total bytes used in the uploads directory",
        ))?;
        registry.register(Box::new(storage_bytes.clone()))?;

        let network_bytes_sent_total = IntCounter::with_opts(Opts::new(
            "network_bytes_sent_total",
            "Total bytes sent in HTTP response bodies",
        ))?;
        registry.register(Box::new(network_bytes_sent_total.clone()))?;

        let network_bytes_received_total = IntCounter::with_opts(Opts::new(
            "network_bytes_received_total",
            "Total bytes received in HTTP request bodies",
        ))?;
        registry.register(Box::new(network_bytes_received_total.clone()))?;

        Ok(Self {
            inner: Arc::new(MetricsRegistryInner {
                registry,
                http_requests_total,
                http_request_duration_seconds,
                storage_bytes,
                network_bytes_sent_total,
                network_bytes_received_total,
            }),
        })
    }

    /// Get reference to Prometheus registry for gathering metrics
    pub fn registry(&self) -> &Registry {
        &self.inner.registry
    }

    /// Record one completed request
    ///
    /// Increments `http_requests_total{method,path,status}` by one and adds
    /// one observation to `http_request_duration_seconds{method,path}`.
    pub fn record_request(&self, method: &str, path: &str, status: u16, duration_secs: f64) {
        let status = status.to_string();
        self.inner
            .http_requests_total
            .with_label_values(&[method, path, status.as_str()])
            .inc();
        self.inner
            .http_request_duration_seconds
            .with_label_values(&[method, path])
            .observe(duration_secs);
    }

    /// Add inbound request body bytes
    pub fn record_bytes_received(&self, bytes: u64) {
        self.inner.network_bytes_received_total.inc_by(bytes);
    }

    /// Add outbound response body bytes
    pub fn record_bytes_sent(&self, bytes: u64) {
        self.inner.network_bytes_sent_total.inc_by(bytes);
    }

    /// Handle to the sent-bytes counter, for counting streamed bodies
    /// chunk by chunk after the handler has returned.
    pub fn bytes_sent_counter(&self) -> IntCounter {
        self.inner.network_bytes_sent_total.clone()
    }

    /// Set the storage gauge to the latest directory scan result
    pub fn set_storage_bytes(&self, bytes: u64) {
        self.inner
            .storage_bytes
            .set(i64::try_from(bytes).unwrap_or(i64::MAX));
    }

    /// Current storage gauge value
    pub fn storage_bytes(&self) -> u64 {
        u64::try_from(self.inner.storage_bytes.get()).unwrap_or(0)
    }

    /// Total response body bytes counted so far
    pub fn bytes_sent(&self) -> u64 {
        self.inner.network_bytes_sent_total.get()
    }

    /// Total request body bytes counted so far
    pub fn bytes_received(&self) -> u64 {
        self.inner.network_bytes_received_total.get()
    }

    /// Render every registered metric in the Prometheus text format
    pub fn encode_text(&self) -> Result<String, MetricsError> {
        let metric_families = self.inner.registry.gather();
        let mut buffer = Vec::new();
        TextEncoder::new().encode(&metric_families, &mut buffer)?;
        Ok(String::from_utf8(buffer)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_registry_creation() {
        let registry = MetricsRegistry::new();
        assert!(registry.is_ok());
    }

    #[test]
    fn test_registries_are_independent() {
        let a = MetricsRegistry::new().unwrap();
        let b = MetricsRegistry::new().unwrap();

        a.record_bytes_received(10);
        assert_eq!(a.bytes_received(), 10);
        assert_eq!(b.bytes_received(), 0);
    }

    #[test]
    fn test_request_metrics() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_request("GET", "/", 200, 0.01);
        registry.record_request("GET", "/", 200, 0.02);
        registry.record_request("POST", "/upload", 400, 0.5);

        let count = registry
            .inner
            .http_requests_total
            .with_label_values(&["GET", "/", "200"])
            .get();
        assert_eq!(count, 2.0);

        let observations = registry
            .inner
            .http_request_duration_seconds
            .with_label_values(&["GET", "/"])
            .get_sample_count();
        assert_eq!(observations, 2);

        let upload = registry
            .inner
            .http_requests_total
            .with_label_values(&["POST", "/upload", "400"])
            .get();
        assert_eq!(upload, 1.0);
    }

    #[test]
    fn test_byte_counters() {
        let registry = MetricsRegistry::new().unwrap();

        registry.record_bytes_received(100);
        registry.record_bytes_sent(40);
        registry.bytes_sent_counter().inc_by(2);

        assert_eq!(registry.bytes_received(), 100);
        assert_eq!(registry.bytes_sent(), 42);
    }

    #[test]
    fn test_storage_gauge() {
        let registry = MetricsRegistry::new().unwrap();
        assert_eq!(registry.storage_bytes(), 0);

        registry.set_storage_bytes(2048);
        assert_eq!(registry.storage_bytes(), 2048);

        // Gauge goes down as well as up
        registry.set_storage_bytes(10);
        assert_eq!(registry.storage_bytes(), 10);
    }

    #[test]
    fn test_duration_buckets_are_exponential() {
        let buckets = exponential_buckets(
            DURATION_BUCKET_START,
            DURATION_BUCKET_FACTOR,
            DURATION_BUCKET_COUNT,
        )
        .unwrap();
        assert_eq!(buckets.len(), DURATION_BUCKET_COUNT);
        assert_eq!(buckets[0], 0.005);
        assert_eq!(buckets[1], 0.01);
        assert!((buckets[DURATION_BUCKET_COUNT - 1] - 10.24).abs() < 1e-9);
    }

    #[test]
    fn test_encode_text() {
        let registry = MetricsRegistry::new().unwrap();
        registry.set_storage_bytes(123);
        registry.record_request("GET", "/metrics", 200, 0.001);

        let text = registry.encode_text().unwrap();
        assert!(text.contains("storage_bytes 123"));
        assert!(text.contains("# TYPE http_requests_total counter"));
        assert!(text.contains(
            "http_requests_total{method=\"GET\",path=\"/metrics\",status=\"200\"} 1"
        ));
        assert!(text.contains("network_bytes_sent_total 0"));
        assert!(text.contains("network_bytes_received_total 0"));
    }
}
