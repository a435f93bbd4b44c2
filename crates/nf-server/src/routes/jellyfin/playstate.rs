//! Jellyfin playback state reporting endpoints.
//!
//! Play state is not persisted. Reports are validated and logged so client
//! behaviour can be followed in the server log.

use axum::body::Bytes;
use axum::http::StatusCode;
use axum::Extension;
use serde::Deserialize;

use crate::error::AppError;
use crate::session::Session;

use super::dto::TICKS_PER_SECOND;

/// Play report sent on start, progress and stop.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
pub struct PlaystateReport {
    pub item_id: Option<String>,
    pub media_source_id: Option<String>,
    /// Position in ticks (100ns units).
    pub position_ticks: Option<i64>,
    pub can_seek: Option<bool>,
    pub is_paused: Option<bool>,
    pub is_muted: Option<bool>,
    pub volume_level: Option<i32>,
    pub play_session_id: Option<String>,
}

impl PlaystateReport {
    pub fn parse(body: &[u8]) -> Result<Self, nf_core::Error> {
        serde_json::from_slice(body)
            .map_err(|_| nf_core::Error::Validation("Invalid JSON payload".into()))
    }

    /// Position in seconds; 0 when not reported.
    pub fn position_secs(&self) -> f64 {
        self.position_ticks
            .map_or(0.0, |t| t as f64 / TICKS_PER_SECOND as f64)
    }
}

fn report(event: &str, session: &Session, body: &[u8]) -> Result<StatusCode, AppError> {
    let report = PlaystateReport::parse(body)?;
    tracing::info!(
        event,
        client = %session.client,
        item = report.item_id.as_deref().unwrap_or(""),
        position_secs = report.position_secs(),
        paused = report.is_paused.unwrap_or(false),
        "Playback report"
    );
    Ok(StatusCode::NO_CONTENT)
}

/// POST /Sessions/Playing
pub async fn playing(
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    report("start", &session, &body)
}

/// POST /Sessions/Playing/Progress
pub async fn progress(
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    report("progress", &session, &body)
}

/// POST /Sessions/Playing/Stopped
pub async fn stopped(
    Extension(session): Extension<Session>,
    body: Bytes,
) -> Result<StatusCode, AppError> {
    report("stop", &session, &body)
}

/// POST /Sessions/Playing/Ping
pub async fn playing_ping() -> StatusCode {
    StatusCode::NO_CONTENT
}

/// POST /Sessions/Capabilities and /Sessions/Capabilities/Full
pub async fn capabilities(Extension(session): Extension<Session>) -> StatusCode {
    tracing::debug!(client = %session.client, device = %session.device_name, "Capabilities reported");
    StatusCode::NO_CONTENT
}
