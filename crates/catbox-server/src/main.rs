use anyhow::{Context, Result};
use clap::Parser;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;

use catbox_metrics::MetricsRegistry;
use catbox_observability::init_tracing;
use catbox_server::{create_router, AppState, ServerConfig};
use catbox_storage::LocalStore;

/// Catbox file hosting server
#[derive(Parser, Debug)]
#[command(name = "catbox-server", version, about)]
struct Args {
    /// TOML config file (default: ./catbox.toml if present)
    #[arg(short, long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Host to bind to
    #[arg(long)]
    host: Option<String>,

    /// Port to listen on
    #[arg(short, long)]
    port: Option<u16>,

    /// Directory uploads are stored in
    #[arg(long, value_name = "DIR")]
    upload_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    // Load configuration
    let mut config =
        ServerConfig::load(args.config.as_deref()).context("Failed to load configuration")?;
    if let Some(host) = args.host {
        config.host = host;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    if let Some(upload_dir) = args.upload_dir {
        config.upload_dir = upload_dir;
    }
    config.validate().context("Invalid configuration")?;

    init_tracing(config.log_config()).context("Failed to initialize logging")?;
    tracing::info!("Server configuration: {:?}", config);

    let store = LocalStore::new(&config.upload_dir).await.with_context(|| {
        format!(
            "Failed to open upload directory {}",
            config.upload_dir.display()
        )
    })?;
    tracing::info!("Upload directory: {}", store.root().display());

    let metrics = MetricsRegistry::new().context("Failed to create metrics registry")?;
    let state = Arc::new(AppState::new(&config, store, metrics));
    state.refresh_storage_bytes().await;

    if let Some(interval) = config.storage_scan_interval() {
        tracing::info!("Rescanning storage every {}s", interval.as_secs());
        let _scan = state.spawn_storage_scan(interval);
    }

    let app = create_router(Arc::clone(&state));

    let bind_addr = config.bind_addr();
    let listener = TcpListener::bind(&bind_addr)
        .await
        .with_context(|| format!("Failed to bind {}", bind_addr))?;
    tracing::info!("catbox listening on {}", bind_addr);
    tracing::info!("Press Ctrl+C to stop");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("Server error")?;

    tracing::info!("Server stopped");
    Ok(())
}

/// Resolve on Ctrl+C or SIGTERM
async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(e) => {
                tracing::error!("Failed to listen for SIGTERM: {}", e);
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("Shutdown signal received, draining connections");
}
