//! Application context shared by all request handlers (via Axum state).

use std::sync::Arc;

use nf_core::config::Config;
use nf_library::LibraryHandle;

use crate::images::{ImageService, JpegImageService};
use crate::playlists::PlaylistStore;
use crate::session::SessionStore;

/// Cheaply cloneable: every field is an `Arc` or an `Arc`-backed handle.
#[derive(Clone)]
pub struct AppContext {
    /// Immutable application configuration snapshot.
    pub config: Arc<Config>,
    /// Current catalog snapshot, replaced wholesale on rescan.
    pub library: LibraryHandle,
    /// Access token → session.
    pub sessions: Arc<SessionStore>,
    /// Per-user playlists.
    pub playlists: Arc<PlaylistStore>,
    /// Poster quality transform.
    pub images: Arc<dyn ImageService>,
}

impl AppContext {
    /// Context with in-memory stores and the JPEG image service configured
    /// from `config.server.cache_dir`.
    pub fn new(config: Config, library: LibraryHandle) -> Self {
        let images = JpegImageService::new(config.server.cache_dir.clone());
        Self {
            config: Arc::new(config),
            library,
            sessions: Arc::new(SessionStore::new()),
            playlists: Arc::new(PlaylistStore::new()),
            images: Arc::new(images),
        }
    }
}
