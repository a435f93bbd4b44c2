//! Playlist endpoints. Playlists live in memory and belong to the caller.

use axum::body::Bytes;
use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};

use crate::context::AppContext;
use crate::error::AppError;
use crate::session::Session;

use super::dto::ItemsResult;
use super::mapper::Mapper;
use super::query::{paginate, QueryParams};

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase", default)]
pub struct CreatePlaylistRequest {
    pub name: Option<String>,
    pub ids: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaylistCreated {
    pub id: String,
}

fn owned(values: Vec<&str>) -> Vec<String> {
    values.into_iter().map(String::from).collect()
}

/// POST /Playlists
///
/// Name and item ids come from the JSON body or the query string; ids from
/// both are appended in that order.
pub async fn create_playlist(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Query(pairs): Query<Vec<(String, String)>>,
    body: Bytes,
) -> Result<Json<PlaylistCreated>, AppError> {
    let params = QueryParams::from(pairs);
    let request: CreatePlaylistRequest = if body.is_empty() {
        CreatePlaylistRequest::default()
    } else {
        serde_json::from_slice(&body)
            .map_err(|_| nf_core::Error::Validation("Invalid JSON payload".into()))?
    };

    let name = request
        .name
        .filter(|n| !n.is_empty())
        .or_else(|| params.get("name").map(String::from))
        .ok_or_else(|| nf_core::Error::Validation("playlist name is required".into()))?;
    let mut ids = request.ids;
    ids.extend(owned(params.list("ids")));

    let playlist = ctx.playlists.create(&session.user_id, &name, &ids);
    Ok(Json(PlaylistCreated {
        id: playlist.external_id(),
    }))
}

/// GET /Playlists/{id}/Items
pub async fn playlist_items(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<Json<ItemsResult>, AppError> {
    let params = QueryParams::from(pairs);
    let playlist = ctx.playlists.get(&session.user_id, &id)?;
    let library = ctx.library.snapshot();
    let mapper = Mapper::new(
        &library,
        &ctx.playlists,
        &ctx.config.jellyfin.server_id,
        &session.user_id,
    );
    let records = mapper.playlist_entries(&playlist);
    let total = records.len();
    let (items, start_index) = paginate(records, &params);
    Ok(Json(ItemsResult {
        items,
        total_record_count: total,
        start_index,
    }))
}

/// POST /Playlists/{id}/Items?ids=
pub async fn add_to_playlist(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<StatusCode, AppError> {
    let params = QueryParams::from(pairs);
    ctx.playlists
        .add_items(&session.user_id, &id, &owned(params.list("ids")))?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /Playlists/{id}/Items?entryIds=
pub async fn remove_from_playlist(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(pairs): Query<Vec<(String, String)>>,
) -> Result<StatusCode, AppError> {
    let params = QueryParams::from(pairs);
    ctx.playlists
        .remove_entries(&session.user_id, &id, &owned(params.list("entryIds")))?;
    Ok(StatusCode::NO_CONTENT)
}
