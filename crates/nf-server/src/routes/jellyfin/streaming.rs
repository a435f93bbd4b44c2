//! Playback info and direct video streaming.

use axum::extract::{Path, State};
use axum::http::{header, HeaderMap};
use axum::response::Response;
use axum::Json;
use serde::Serialize;
use uuid::Uuid;

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::streaming_helpers::serve_file_streaming;

use super::dto::MediaSourceDto;
use super::media_source::media_source;
use super::resolve::resolve_playable;

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaybackInfoResponse {
    pub media_sources: Vec<MediaSourceDto>,
    pub play_session_id: String,
}

/// GET|POST /Items/{id}/PlaybackInfo
pub async fn playback_info(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
) -> Result<Json<PlaybackInfoResponse>, AppError> {
    let library = ctx.library.snapshot();
    let playable = resolve_playable(&library, &id)?;
    let source = media_source(&playable.path, playable.descriptor.as_deref(), &id);
    Ok(Json(PlaybackInfoResponse {
        media_sources: vec![source],
        play_session_id: Uuid::new_v4().simple().to_string(),
    }))
}

/// GET|HEAD /Videos/{id}/stream and /Items/{id}/Download
pub async fn video_stream(
    State(ctx): State<AppContext>,
    Path(id): Path<String>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let library = ctx.library.snapshot();
    let playable = resolve_playable(&library, &id)?;
    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    tracing::debug!(%id, path = %playable.path.display(), range, "Streaming video");
    Ok(serve_file_streaming(&playable.path, range).await?)
}
