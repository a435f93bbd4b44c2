//! Periodic catalog rescan.
//!
//! Each pass scans every configured collection on the blocking pool and
//! publishes the result as a whole new snapshot. Requests already holding the
//! previous snapshot finish against it.

use std::time::Duration;

use nf_core::config::CollectionConfig;
use nf_library::LibraryHandle;
use tokio_util::sync::CancellationToken;

/// Scan once and publish the result.
pub async fn rescan_once(handle: &LibraryHandle, collections: Vec<CollectionConfig>) {
    let started = std::time::Instant::now();
    match tokio::task::spawn_blocking(move || nf_library::scan(&collections)).await {
        Ok(library) => {
            let items = library.item_count();
            let episodes = library.episode_count();
            handle.replace(library);
            tracing::info!(
                items,
                episodes,
                elapsed_ms = started.elapsed().as_millis() as u64,
                "Catalog rescanned"
            );
        }
        Err(e) => tracing::error!(error = %e, "Rescan task failed; keeping previous catalog"),
    }
}

/// Rescan every `interval` until cancelled. A zero interval disables
/// rescanning.
pub async fn run_rescan(
    handle: LibraryHandle,
    collections: Vec<CollectionConfig>,
    interval: Duration,
    cancel: CancellationToken,
) {
    if interval.is_zero() {
        tracing::info!("Periodic rescan disabled");
        return;
    }

    let mut ticker = tokio::time::interval(interval);
    ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Delay);
    // The first tick completes immediately; the initial scan already ran.
    ticker.tick().await;

    loop {
        tokio::select! {
            _ = ticker.tick() => rescan_once(&handle, collections.clone()).await,
            _ = cancel.cancelled() => {
                tracing::debug!("Rescan task stopping");
                break;
            }
        }
    }
}
