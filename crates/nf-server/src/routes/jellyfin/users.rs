//! Jellyfin user endpoints (AuthenticateByName, user info).
//!
//! There is exactly one catalog user. Any password is accepted; when
//! `jellyfin.username` is configured only that name may sign in.

use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode};
use axum::{Extension, Json};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::context::AppContext;
use crate::error::AppError;
use crate::middleware::auth::MediaBrowserInfo;
use crate::session::{Session, DEFAULT_USER_NAME, USER_ID};

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct JellyfinUser {
    pub id: String,
    pub name: String,
    pub server_id: String,
    pub has_password: bool,
    pub has_configured_password: bool,
    pub has_configured_easy_password: bool,
    pub enable_auto_login: Option<bool>,
    pub policy: UserPolicy,
    pub configuration: UserConfiguration,
}

/// User permissions. Clients check these to decide what UI to show.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserPolicy {
    pub is_administrator: bool,
    pub is_disabled: bool,
    pub is_hidden: bool,
    pub enable_remote_access: bool,
    pub enable_media_playback: bool,
    pub enable_video_playback_transcoding: bool,
    pub enable_playback_remuxing: bool,
    pub enable_content_downloading: bool,
    pub enable_content_deletion: bool,
    pub enable_all_folders: bool,
    pub enable_all_devices: bool,
}

impl Default for UserPolicy {
    fn default() -> Self {
        Self {
            is_administrator: false,
            is_disabled: false,
            is_hidden: false,
            enable_remote_access: true,
            enable_media_playback: true,
            enable_video_playback_transcoding: false,
            enable_playback_remuxing: false,
            enable_content_downloading: true,
            enable_content_deletion: false,
            enable_all_folders: true,
            enable_all_devices: true,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct UserConfiguration {
    pub play_default_audio_track: bool,
    pub subtitle_mode: String,
    pub enable_next_episode_auto_play: bool,
    pub hide_played_in_latest: bool,
    pub remember_audio_selections: bool,
    pub remember_subtitle_selections: bool,
}

impl Default for UserConfiguration {
    fn default() -> Self {
        Self {
            play_default_audio_track: true,
            subtitle_mode: "Default".into(),
            enable_next_episode_auto_play: true,
            hide_played_in_latest: true,
            remember_audio_selections: true,
            remember_subtitle_selections: true,
        }
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthResult {
    pub user: JellyfinUser,
    pub access_token: String,
    pub server_id: String,
    pub session_info: SessionInfo,
}

/// Session details clients look for in the login response.
#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SessionInfo {
    pub id: String,
    pub user_id: String,
    pub user_name: String,
    pub client: String,
    pub device_id: String,
    pub device_name: String,
    pub application_version: String,
    pub is_active: bool,
    pub supports_media_control: bool,
    pub supports_remote_control: bool,
    pub playable_media_types: Vec<String>,
    pub server_id: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct AuthByNameRequest {
    pub username: String,
    #[serde(default)]
    pub pw: String,
}

fn make_user(ctx: &AppContext, name: String) -> JellyfinUser {
    JellyfinUser {
        id: USER_ID.into(),
        name,
        server_id: ctx.config.jellyfin.server_id.clone(),
        has_password: true,
        has_configured_password: true,
        has_configured_easy_password: false,
        enable_auto_login: Some(false),
        policy: UserPolicy::default(),
        configuration: UserConfiguration::default(),
    }
}

fn configured_name(ctx: &AppContext) -> String {
    ctx.config
        .jellyfin
        .username
        .clone()
        .unwrap_or_else(|| DEFAULT_USER_NAME.into())
}

/// GET /Users/Public: no users are listed on the login screen.
pub async fn public_users() -> Json<Vec<JellyfinUser>> {
    Json(Vec::new())
}

/// POST /Users/AuthenticateByName
pub async fn authenticate_by_name(
    State(ctx): State<AppContext>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<AuthResult>, AppError> {
    let payload: AuthByNameRequest = serde_json::from_slice(&body)
        .map_err(|_| nf_core::Error::Validation("Invalid JSON payload".into()))?;

    if let Some(required) = &ctx.config.jellyfin.username {
        if !payload.username.eq_ignore_ascii_case(required) {
            tracing::info!(username = %payload.username, "Rejected login for unknown user");
            return Err(nf_core::Error::Unauthorized("Invalid credentials".into()).into());
        }
    }
    let name = if payload.username.is_empty() {
        configured_name(&ctx)
    } else {
        payload.username
    };

    let info = MediaBrowserInfo::from_headers(&headers);
    let session = ctx.sessions.create(&name, &info);
    let server_id = ctx.config.jellyfin.server_id.clone();

    Ok(Json(AuthResult {
        user: make_user(&ctx, name),
        access_token: session.token.clone(),
        server_id: server_id.clone(),
        session_info: SessionInfo {
            id: session.id,
            user_id: session.user_id,
            user_name: session.user_name,
            client: session.client,
            device_id: session.device_id,
            device_name: session.device_name,
            application_version: session.app_version,
            is_active: true,
            supports_media_control: false,
            supports_remote_control: false,
            playable_media_types: vec!["Video".into()],
            server_id,
        },
    }))
}

/// POST /Sessions/Logout
///
/// Revokes the token the request was made with.
pub async fn logout(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
) -> StatusCode {
    if ctx.sessions.remove(&session.token) {
        tracing::info!(client = %session.client, device = %session.device_name, "Session ended");
    }
    StatusCode::NO_CONTENT
}

/// GET /Users/Me
pub async fn get_me(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
) -> Json<JellyfinUser> {
    Json(make_user(&ctx, session.user_name))
}

/// GET /Users/{user_id}
pub async fn get_user(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(user_id): Path<String>,
) -> Result<Json<JellyfinUser>, AppError> {
    if user_id != session.user_id {
        return Err(nf_core::Error::not_found("user", user_id).into());
    }
    Ok(Json(make_user(&ctx, session.user_name)))
}

/// GET /DisplayPreferences/{id}
pub async fn display_preferences(Path(id): Path<String>) -> Json<Value> {
    Json(json!({
        "Id": id,
        "SortBy": "SortName",
        "SortOrder": "Ascending",
        "RememberIndexing": false,
        "RememberSorting": false,
        "ScrollDirection": "Horizontal",
        "ShowBackdrop": true,
        "ShowSidebar": false,
        "Client": "emby",
        "CustomPrefs": {},
    }))
}
