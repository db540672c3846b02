//! Shared state handed to every handler

use catbox_metrics::MetricsRegistry;
use catbox_storage::LocalStore;
use std::sync::Arc;
use std::time::Duration;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error};

use crate::config::ServerConfig;

/// Shared application state
pub struct AppState {
    /// Upload directory accessor
    pub store: LocalStore,

    /// Instruments updated by the middleware and the storage scans
    pub metrics: MetricsRegistry,

    /// Base for download links, without trailing slash
    pub public_url: String,

    /// Multipart body ceiling for `/upload`
    pub max_upload_bytes: usize,

    /// Body buffering ceiling for the metrics middleware
    pub max_request_bytes: usize,

    /// Per-request timeout, if any
    pub request_timeout: Option<Duration>,
}

impl AppState {
    /// Create state from a validated configuration
    pub fn new(config: &ServerConfig, store: LocalStore, metrics: MetricsRegistry) -> Self {
        Self {
            store,
            metrics,
            public_url: config.public_base_url().to_string(),
            max_upload_bytes: config.max_upload_bytes,
            max_request_bytes: config.max_request_bytes,
            request_timeout: config.request_timeout(),
        }
    }

    /// Absolute download link for a stored file
    pub fn download_url(&self, filename: &str) -> String {
        format!("{}/files/{}", self.public_url, urlencoding::encode(filename))
    }

    /// Recompute the `storage_bytes` gauge from the upload directory.
    ///
    /// On a walk failure the error is logged and the gauge keeps its
    /// previous value. Returns the new total when it was updated.
    pub async fn refresh_storage_bytes(&self) -> Option<u64> {
        match self.store.compute_total_bytes().await {
            Ok(total) => {
                self.metrics.set_storage_bytes(total);
                debug!("Storage usage: {} bytes", total);
                Some(total)
            }
            Err(e) => {
                error!(
                    "Failed to compute storage usage under {}: {}",
                    self.store.root().display(),
                    e
                );
                None
            }
        }
    }

    /// Refresh the storage gauge every `interval` in a background task.
    ///
    /// Picks up files added or removed outside the server. The first refresh
    /// happens one `interval` after the call; the task runs until aborted.
    pub fn spawn_storage_scan(self: &Arc<Self>, interval: Duration) -> JoinHandle<()> {
        let state = Arc::clone(self);
        tokio::spawn(async move {
            let mut ticker = tokio::time::interval(interval);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            // First tick fires immediately
            ticker.tick().await;

            loop {
                ticker.tick().await;
                state.refresh_storage_bytes().await;
            }
        })
    }
}
