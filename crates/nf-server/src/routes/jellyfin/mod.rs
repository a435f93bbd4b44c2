//! Jellyfin-compatible API endpoints.
//!
//! These endpoints implement the subset of the Jellyfin API that lets
//! third-party clients (Infuse, Swiftfin, Jellyfin web) sign in, browse the
//! catalog, fetch artwork and play videos directly.

pub mod dto;
pub mod enrich;
pub mod images;
pub mod items;
pub mod mapper;
pub mod media_source;
pub mod playlists;
pub mod playstate;
pub mod query;
pub mod resolve;
pub mod streaming;
pub mod system;
pub mod users;

#[cfg(test)]
mod fixtures;

use axum::body::Body;
use axum::extract::Request;
use axum::http::StatusCode;
use axum::middleware::{self, Next};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::Router;

use crate::context::AppContext;
use crate::middleware::auth::auth_middleware;

/// Logs response bodies for Jellyfin endpoints (debug level).
async fn log_jellyfin_response(req: Request, next: Next) -> Response {
    if !tracing::enabled!(tracing::Level::DEBUG) {
        return next.run(req).await;
    }
    let method = req.method().clone();
    let uri = req.uri().clone();

    let response = next.run(req).await;
    let status = response.status();

    let content_type = response
        .headers()
        .get("content-type")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("")
        .to_string();

    if !content_type.contains("json") {
        tracing::debug!(%method, %uri, %status, content_type, "jellyfin response (non-json)");
        return response;
    }

    let (parts, body) = response.into_parts();
    // JSON bodies are already fully in memory.
    let bytes = match axum::body::to_bytes(body, usize::MAX).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(%method, %uri, error = %e, "Could not buffer response body");
            return StatusCode::INTERNAL_SERVER_ERROR.into_response();
        }
    };
    tracing::debug!(
        %method, %uri, %status,
        body = %String::from_utf8_lossy(&bytes),
        "jellyfin response"
    );
    Response::from_parts(parts, Body::from(bytes))
}

/// JSON 404 for unmatched paths, so clients never get an empty body.
pub async fn jellyfin_fallback(req: Request) -> impl IntoResponse {
    let uri = req.uri().clone();
    let method = req.method().clone();
    tracing::warn!(%method, %uri, "unhandled Jellyfin API path");
    (
        StatusCode::NOT_FOUND,
        axum::Json(serde_json::json!({ "error": "Not Found", "path": uri.path() })),
    )
}

/// Endpoints reachable without an access token.
fn public_routes() -> Router<AppContext> {
    Router::new()
        .route("/System/Info/Public", get(system::system_info_public))
        .route("/System/Ping", get(system::ping).post(system::ping))
        .route("/Users/Public", get(users::public_users))
        .route("/Users/AuthenticateByName", post(users::authenticate_by_name))
        // Artwork is fetched by image loaders that never send a token.
        .route("/Items/{id}/Images/{image_type}", get(images::get_image))
        .route("/Items/{id}/Images/{image_type}/{index}", get(images::get_image))
}

/// Endpoints that need a session.
fn protected_routes(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        // System
        .route("/System/Info", get(system::system_info))
        // Users
        .route("/Users/Me", get(users::get_me))
        .route("/Sessions/Logout", post(users::logout))
        .route("/Users/{user_id}", get(users::get_user))
        .route("/DisplayPreferences/{id}", get(users::display_preferences))
        // Browsing
        .route("/UserViews", get(items::user_views))
        .route("/Users/{user_id}/Views", get(items::user_views))
        .route("/Users/{user_id}/GroupingOptions", get(items::grouping_options))
        .route("/Library/VirtualFolders", get(items::virtual_folders))
        .route("/Items", get(items::list_items))
        .route("/Users/{user_id}/Items", get(items::list_items))
        .route("/Items/{id}", get(items::get_item).delete(items::delete_item))
        .route("/Users/{user_id}/Items/{id}", get(items::user_scoped_get_item))
        .route("/Items/Latest", get(items::latest))
        .route("/Users/{user_id}/Items/Latest", get(items::latest))
        .route("/Search/Hints", get(items::search_hints))
        .route("/Shows/{id}/Seasons", get(items::show_seasons))
        .route("/Shows/{id}/Episodes", get(items::show_episodes))
        .route("/Items/Filters", get(items::filters))
        .route("/Items/Filters2", get(items::filters2))
        // Always empty
        .route("/Users/{user_id}/Items/Resume", get(items::empty_result))
        .route("/UserItems/Resume", get(items::empty_result))
        .route("/Items/{id}/Similar", get(items::empty_result))
        .route("/Items/Suggestions", get(items::empty_result))
        .route("/Shows/NextUp", get(items::empty_result))
        .route("/Persons", get(items::empty_result))
        .route("/MediaSegments/{id}", get(items::empty_result))
        // Playlists
        .route("/Playlists", post(playlists::create_playlist))
        .route(
            "/Playlists/{id}/Items",
            get(playlists::playlist_items)
                .post(playlists::add_to_playlist)
                .delete(playlists::remove_from_playlist),
        )
        // Playback
        .route(
            "/Items/{id}/PlaybackInfo",
            get(streaming::playback_info).post(streaming::playback_info),
        )
        .route("/Videos/{id}/stream", get(streaming::video_stream))
        .route("/Items/{id}/Download", get(streaming::video_stream))
        .route("/Sessions/Capabilities", post(playstate::capabilities))
        .route("/Sessions/Capabilities/Full", post(playstate::capabilities))
        .route("/Sessions/Playing", post(playstate::playing))
        .route("/Sessions/Playing/Progress", post(playstate::progress))
        .route("/Sessions/Playing/Stopped", post(playstate::stopped))
        .route("/Sessions/Playing/Ping", post(playstate::playing_ping))
        .route_layer(middleware::from_fn_with_state(ctx, auth_middleware))
}

/// Build the Jellyfin-compatible router, mounted at the root level where
/// clients expect it.
pub fn jellyfin_router(ctx: AppContext) -> Router<AppContext> {
    Router::new()
        .merge(public_routes())
        .merge(protected_routes(ctx))
        .fallback(jellyfin_fallback)
        .layer(middleware::from_fn(log_jellyfin_response))
}
