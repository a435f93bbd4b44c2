//! Item images: posters, backdrops, thumbnails and actor portraits.

use std::collections::HashMap;

use axum::extract::{Path, Query, State};
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::{IntoResponse, Redirect, Response};

use crate::context::AppContext;
use crate::error::AppError;
use crate::routes::streaming_helpers::serve_file_streaming;

use super::resolve::{resolve_image, ImageOutcome};

/// Clients may cache images for 30 days.
const CACHE_CONTROL: &str = "max-age=2592000";

/// Path parameters for both `/Images/{type}` and `/Images/{type}/{index}`.
/// The index is accepted and ignored: every entity has one image per type.
#[derive(Debug, serde::Deserialize)]
pub struct ImagePath {
    id: String,
    image_type: String,
}

/// GET|HEAD /Items/{id}/Images/{image_type}[/{index}]
pub async fn get_image(
    State(ctx): State<AppContext>,
    Path(path): Path<ImagePath>,
    Query(query): Query<HashMap<String, String>>,
    headers: HeaderMap,
) -> Result<Response, AppError> {
    let tag = query
        .iter()
        .find(|(k, _)| k.eq_ignore_ascii_case("tag"))
        .map(|(_, v)| v.as_str());
    let library = ctx.library.snapshot();

    let file = match resolve_image(&library, &path.id, &path.image_type, tag)? {
        ImageOutcome::Redirect(url) => {
            return Ok(with_cache_control(Redirect::to(&url).into_response()));
        }
        ImageOutcome::File(file) => file,
        ImageOutcome::Poster(poster) => {
            let quality = ctx.config.jellyfin.image_quality_poster;
            let images = ctx.images.clone();
            let source = poster;
            tokio::task::spawn_blocking(move || images.open_transformed(&source, quality))
                .await
                .map_err(|e| nf_core::Error::Internal(format!("image task failed: {e}")))??
        }
        ImageOutcome::NotFound => {
            tracing::debug!(id = %path.id, image_type = %path.image_type, "No image");
            // Misses carry no cache-control.
            return Ok(StatusCode::NOT_FOUND.into_response());
        }
    };

    let range = headers.get(header::RANGE).and_then(|v| v.to_str().ok());
    let response = serve_file_streaming(&file, range).await?;
    Ok(with_cache_control(response))
}

fn with_cache_control(mut response: Response) -> Response {
    response
        .headers_mut()
        .insert(header::CACHE_CONTROL, HeaderValue::from_static(CACHE_CONTROL));
    response
}
