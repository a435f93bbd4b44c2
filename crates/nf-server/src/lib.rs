//! nf-server: Jellyfin-compatible HTTP API over a scanned catalog.
//!
//! This crate wires the catalog from `nf-library` into a running server:
//!
//! - Axum router with request ids, tracing, CORS and token authentication
//! - The mapping core that turns catalog entities into Jellyfin records
//! - In-memory sessions and playlists, and a cached poster transform
//! - A periodic rescan task and graceful shutdown via signal handling

pub mod context;
pub mod error;
pub mod images;
pub mod middleware;
pub mod playlists;
pub mod rescan;
pub mod router;
pub mod routes;
pub mod session;

use std::net::SocketAddr;
use std::time::Duration;

use nf_core::config::Config;
use nf_library::LibraryHandle;
use tokio_util::sync::CancellationToken;

use crate::context::AppContext;

/// Start the notflix server.
///
/// Scans the configured collections, builds the [`AppContext`], spawns the
/// rescan task and serves HTTP until a shutdown signal arrives.
pub async fn start(config: Config) -> nf_core::Result<()> {
    for warning in config.validate() {
        tracing::warn!("Config warning: {warning}");
    }

    let collections = config.collections.clone();
    let library = tokio::task::spawn_blocking(move || nf_library::scan(&collections))
        .await
        .map_err(|e| nf_core::Error::Internal(format!("initial scan failed: {e}")))?;
    let handle = LibraryHandle::new(library);

    let addr: SocketAddr = format!("{}:{}", config.server.host, config.server.port)
        .parse()
        .map_err(|e| nf_core::Error::Config(format!("Invalid server address: {e}")))?;
    let rescan_interval = Duration::from_secs(config.library.rescan_interval_secs);
    let collections = config.collections.clone();

    let ctx = AppContext::new(config, handle.clone());
    let cancel = CancellationToken::new();

    let rescan_handle = tokio::spawn(rescan::run_rescan(
        handle,
        collections,
        rescan_interval,
        cancel.clone(),
    ));

    let app = router::build_router(ctx);
    let listener = tokio::net::TcpListener::bind(addr).await.map_err(|e| {
        nf_core::Error::Internal(format!("Failed to bind to {addr}: {e}"))
    })?;
    tracing::info!("Starting server on {addr}");

    let serve_result = axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal(cancel.clone()))
        .await;

    cancel.cancel();
    let _ = rescan_handle.await;

    serve_result.map_err(|e| nf_core::Error::Internal(format!("Server error: {e}")))?;
    tracing::info!("Server shutdown complete");
    Ok(())
}

/// Wait for SIGINT, SIGTERM or cancellation.
async fn shutdown_signal(cancel: CancellationToken) {
    let ctrl_c = async {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::warn!("Failed to listen for Ctrl+C: {e}");
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
                tracing::warn!("Failed to install SIGTERM handler: {e}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => tracing::info!("Received Ctrl+C, shutting down"),
        _ = terminate => tracing::info!("Received SIGTERM, shutting down"),
        _ = cancel.cancelled() => tracing::info!("Shutdown requested"),
    }
}
