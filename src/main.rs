//! Trade API - Users and Trades REST service
//!
//! Serves user and trade CRUD plus paginated listings behind a cache-aside
//! layer, with Prometheus metrics and a bounded worker pool.

use std::net::SocketAddr;

use anyhow::Context;
use tokio::signal;
use tokio::task::JoinHandle;
use tracing::{error, info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use trade_api::tasks::ShutdownOutcome;
use trade_api::{create_router, spawn_cleanup_task, AppState, Config};

/// Main entry point for the Trade API server.
///
/// # Startup Sequence
/// 1. Initialize tracing subscriber for logging
/// 2. Load and validate configuration from environment variables
/// 3. Build metrics, cache, services and the worker pool
/// 4. Start the background cleanup task (cache enabled only)
/// 5. Serve HTTP until SIGINT/SIGTERM
/// 6. Drain the worker pool
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Defaults to "info" level, can be overridden with RUST_LOG env var
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "trade_api=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    info!("Starting Trade API server");

    let config = Config::from_env();
    config.validate().context("invalid configuration")?;
    info!(
        "Configuration loaded: cache_enabled={}, cache_max_size={}, expire_after_write={}m, port={}, workers={}",
        config.cache_enabled,
        config.cache_max_size,
        config.cache_expire_after_write_minutes,
        config.server_port,
        config.worker_threads
    );

    let state = AppState::from_config(&config);

    let cleanup_handle = if state.cache.is_enabled() {
        info!("Background cleanup task started");
        Some(spawn_cleanup_task(
            state.cache.clone(),
            config.cleanup_interval(),
        ))
    } else {
        None
    };

    let pool = state.pool.clone();
    let app = create_router(state, &config.metrics_endpoint);

    let addr: SocketAddr = format!("{}:{}", config.server_host, config.server_port)
        .parse()
        .with_context(|| format!("invalid bind address {}", config.server_host))?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {}", addr))?;
    info!("Server listening on http://{}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cleanup_handle))
        .await
        .context("server error")?;

    match pool.shutdown().await {
        ShutdownOutcome::Graceful => info!("Worker pool shut down gracefully"),
        ShutdownOutcome::Forced { abandoned } => {
            warn!(abandoned, "Worker pool shut down forcibly")
        }
    }

    info!("Server shutdown complete");
    Ok(())
}

/// Waits for shutdown signal (Ctrl+C or SIGTERM).
///
/// On shutdown signal, aborts the cleanup task and allows graceful shutdown.
async fn shutdown_signal(cleanup_handle: Option<JoinHandle<()>>) {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to install Ctrl+C handler");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {
            info!("Received Ctrl+C, initiating shutdown...");
        }
        _ = terminate => {
            info!("Received SIGTERM, initiating shutdown...");
        }
    }

    if let Some(handle) = cleanup_handle {
        handle.abort();
        warn!("Cleanup task aborted");
    }
}
