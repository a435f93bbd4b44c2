//! Jellyfin system info endpoints.

use axum::extract::State;
use axum::Json;
use serde::Serialize;

use crate::context::AppContext;

/// Version reported to clients. Some clients refuse servers older than 10.9.
pub const JELLYFIN_COMPAT_VERSION: &str = "10.10.3";

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SystemInfo {
    pub server_name: String,
    pub version: String,
    pub id: String,
    pub operating_system: String,
    pub product_name: String,
    pub startup_wizard_completed: bool,
    pub local_address: String,
}

/// GET /System/Info/Public
pub async fn system_info_public(State(ctx): State<AppContext>) -> Json<SystemInfo> {
    let jellyfin = &ctx.config.jellyfin;
    Json(SystemInfo {
        server_name: jellyfin.server_name.clone(),
        version: JELLYFIN_COMPAT_VERSION.into(),
        id: jellyfin.server_id.clone(),
        operating_system: std::env::consts::OS.into(),
        product_name: "Jellyfin Server".into(),
        startup_wizard_completed: true,
        local_address: format!("http://{}:{}", ctx.config.server.host, ctx.config.server.port),
    })
}

/// GET /System/Info (authenticated)
pub async fn system_info(state: State<AppContext>) -> Json<SystemInfo> {
    system_info_public(state).await
}

/// GET|POST /System/Ping
pub async fn ping(State(ctx): State<AppContext>) -> Json<String> {
    Json(ctx.config.jellyfin.server_name.clone())
}
