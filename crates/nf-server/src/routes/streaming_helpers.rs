//! File serving shared by video streaming and images: range parsing,
//! content-type guessing and chunked reads via `ReaderStream`.

use std::path::Path;

use axum::body::Body;
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use tokio::io::{AsyncReadExt, AsyncSeekExt};
use tokio_util::io::ReaderStream;

const CHUNK_SIZE: usize = 64 * 1024;

/// Parse a `Range: bytes=START-END` header value.
///
/// Returns `(start, Option<end>)` where `end` is `None` for open-ended ranges
/// like `bytes=500-`. Suffix ranges (`bytes=-500`) and multi-range requests
/// are not supported and yield `None`.
pub fn parse_range_header(value: &str) -> Option<(u64, Option<u64>)> {
    let spec = value.strip_prefix("bytes=")?;
    let (start, end) = spec.split_once('-')?;
    let start: u64 = start.trim().parse().ok()?;
    let end = end.trim();
    let end = if end.is_empty() {
        None
    } else {
        Some(end.parse().ok()?)
    };
    Some((start, end))
}

/// Guess the MIME type from the file extension.
pub fn guess_content_type(path: &Path) -> &'static str {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_ascii_lowercase)
        .unwrap_or_default();

    match ext.as_str() {
        "mp4" | "m4v" => "video/mp4",
        "mkv" => "video/x-matroska",
        "avi" => "video/x-msvideo",
        "webm" => "video/webm",
        "ts" => "video/mp2t",
        "mov" => "video/quicktime",
        "jpg" | "jpeg" | "tbn" => "image/jpeg",
        "png" => "image/png",
        "webp" => "image/webp",
        "gif" => "image/gif",
        _ => "application/octet-stream",
    }
}

fn open_error(path: &Path) -> nf_core::Error {
    nf_core::Error::not_found("file", path.display())
}

/// Serve a file in 64KB chunks, honouring a single byte range.
///
/// A range that starts past the end of the file yields 416 with
/// `Content-Range: bytes */SIZE`.
pub async fn serve_file_streaming(
    path: &Path,
    range_header: Option<&str>,
) -> Result<Response, nf_core::Error> {
    let metadata = tokio::fs::metadata(path).await.map_err(|_| open_error(path))?;
    if !metadata.is_file() {
        return Err(open_error(path));
    }
    let file_size = metadata.len();
    let content_type = guess_content_type(path);

    let Some((start, end)) = range_header.and_then(parse_range_header) else {
        let file = tokio::fs::File::open(path).await.map_err(|_| open_error(path))?;
        let body = Body::from_stream(ReaderStream::with_capacity(file, CHUNK_SIZE));
        return Ok((
            StatusCode::OK,
            [
                (header::CONTENT_TYPE, content_type.to_string()),
                (header::CONTENT_LENGTH, file_size.to_string()),
                (header::ACCEPT_RANGES, "bytes".to_string()),
            ],
            body,
        )
            .into_response());
    };

    let last = file_size.saturating_sub(1);
    let end = end.unwrap_or(last).min(last);
    if file_size == 0 || start > end {
        tracing::debug!(path = %path.display(), start, file_size, "Unsatisfiable range");
        return Ok((
            StatusCode::RANGE_NOT_SATISFIABLE,
            [(header::CONTENT_RANGE, format!("bytes */{file_size}"))],
            Body::empty(),
        )
            .into_response());
    }

    let length = end - start + 1;
    let mut file = tokio::fs::File::open(path).await.map_err(|_| open_error(path))?;
    file.seek(std::io::SeekFrom::Start(start)).await?;
    let body = Body::from_stream(ReaderStream::with_capacity(file.take(length), CHUNK_SIZE));

    Ok((
        StatusCode::PARTIAL_CONTENT,
        [
            (header::CONTENT_TYPE, content_type.to_string()),
            (header::CONTENT_RANGE, format!("bytes {start}-{end}/{file_size}")),
            (header::CONTENT_LENGTH, length.to_string()),
            (header::ACCEPT_RANGES, "bytes".to_string()),
        ],
        body,
    )
        .into_response())
}
