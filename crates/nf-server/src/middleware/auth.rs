//! Token authentication for Jellyfin clients.
//!
//! Clients obtain an access token from `/Users/AuthenticateByName` and send it
//! back on every request in one of several places. The middleware resolves
//! the token against the [`SessionStore`](crate::session::SessionStore) and
//! injects the [`Session`] into request extensions for downstream handlers.

use axum::extract::{Query, State};
use axum::http::{HeaderMap, Request};
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::request_id::RequestId;
use crate::session::Session;

/// Extract an access token from request headers or query parameters.
///
/// Resolution order:
/// 1. `X-Emby-Token` / `X-MediaBrowser-Token`
/// 2. `Authorization` or `X-Emby-Authorization` with a `MediaBrowser`/`Emby`
///    scheme and a `Token="..."` field
/// 3. `api_key` / `ApiKey` query parameter
pub fn extract_token(headers: &HeaderMap, query: &[(String, String)]) -> Option<String> {
    for name in ["X-Emby-Token", "X-MediaBrowser-Token"] {
        if let Some(token) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if !token.is_empty() {
                return Some(token.to_string());
            }
        }
    }

    for name in ["Authorization", "X-Emby-Authorization"] {
        if let Some(value) = headers.get(name).and_then(|v| v.to_str().ok()) {
            if value.starts_with("MediaBrowser ") || value.starts_with("Emby ") {
                if let Some(token) = extract_mediabrowser_token(value) {
                    return Some(token);
                }
            }
        }
    }

    query
        .iter()
        .find(|(k, v)| {
            (k.eq_ignore_ascii_case("api_key") || k.eq_ignore_ascii_case("apikey")) && !v.is_empty()
        })
        .map(|(_, v)| v.clone())
}

/// Extract the Token value from a MediaBrowser/Emby authorization header.
/// Format: `MediaBrowser Client="...", Device="...", Token="<token>"`
pub fn extract_mediabrowser_token(header: &str) -> Option<String> {
    parse_fields(header)
        .find(|(key, _)| key.eq_ignore_ascii_case("Token"))
        .map(|(_, value)| value)
        .filter(|value| !value.is_empty())
}

/// Parse MediaBrowser device info from the authorization header.
pub fn parse_mediabrowser_header(header: &str) -> MediaBrowserInfo {
    let mut info = MediaBrowserInfo::default();
    for (key, value) in parse_fields(header) {
        match key.as_str() {
            "Client" => info.client = Some(value),
            "Device" => info.device_name = Some(value),
            "DeviceId" => info.device_id = Some(value),
            "Version" => info.version = Some(value),
            _ => {}
        }
    }
    info
}

/// Split `Scheme Key="v", Key2="v2"` into trimmed, unquoted pairs.
fn parse_fields(header: &str) -> impl Iterator<Item = (String, String)> + '_ {
    let body = header
        .strip_prefix("MediaBrowser ")
        .or_else(|| header.strip_prefix("Emby "))
        .unwrap_or(header);
    body.split(',').filter_map(|part| {
        let (key, value) = part.trim().split_once('=')?;
        Some((key.trim().to_string(), value.trim().trim_matches('"').to_string()))
    })
}

/// Client and device details from a MediaBrowser authorization header.
#[derive(Debug, Default, Clone)]
pub struct MediaBrowserInfo {
    pub client: Option<String>,
    pub device_name: Option<String>,
    pub device_id: Option<String>,
    pub version: Option<String>,
}

impl MediaBrowserInfo {
    /// Read device info from whichever authorization header is present.
    pub fn from_headers(headers: &HeaderMap) -> Self {
        ["Authorization", "X-Emby-Authorization"]
            .iter()
            .filter_map(|name| headers.get(*name).and_then(|v| v.to_str().ok()))
            .find(|v| v.starts_with("MediaBrowser ") || v.starts_with("Emby "))
            .map(parse_mediabrowser_header)
            .unwrap_or_default()
    }
}

/// Authentication middleware. Applied to protected routes only.
///
/// On success, inserts the caller's [`Session`] into request extensions.
pub async fn auth_middleware(
    State(ctx): State<AppContext>,
    mut request: Request<axum::body::Body>,
    next: Next,
) -> Response {
    let query: Vec<(String, String)> = Query::try_from_uri(request.uri())
        .map(|Query(q)| q)
        .unwrap_or_default();
    let token = extract_token(request.headers(), &query);

    let session: Option<Session> = token.as_deref().and_then(|t| ctx.sessions.get(t));
    match session {
        Some(session) => {
            request.extensions_mut().insert(session);
            next.run(request).await
        }
        None => {
            let reason = if token.is_some() {
                "unknown access token"
            } else {
                "missing access token"
            };
            tracing::debug!(path = %request.uri().path(), reason, "Rejecting request");
            let mut err = AppError::new(nf_core::Error::Unauthorized(reason.into()));
            if let Some(RequestId(id)) = request.extensions().get::<RequestId>() {
                err = err.with_request_id(id.clone());
            }
            err.into_response()
        }
    }
}
