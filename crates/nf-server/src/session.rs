//! In-memory session store.
//!
//! The catalog is single-user: every successful login maps to the same fixed
//! user id, but each login gets its own access token and device record so
//! several clients can be signed in at once. Sessions do not survive a
//! restart.

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use uuid::Uuid;

use crate::middleware::auth::MediaBrowserInfo;

/// Id of the single catalog user.
pub const USER_ID: &str = "2b1ec0a52b09456c9823a367d84ac9e5";

/// Display name used when no user name is configured.
pub const DEFAULT_USER_NAME: &str = "user";

/// A signed-in client.
#[derive(Debug, Clone)]
pub struct Session {
    pub id: String,
    pub token: String,
    pub user_id: String,
    pub user_name: String,
    pub client: String,
    pub device_name: String,
    pub device_id: String,
    pub app_version: String,
    pub created_at: DateTime<Utc>,
}

/// Token → session map shared by all request handlers.
#[derive(Debug, Default)]
pub struct SessionStore {
    sessions: DashMap<String, Session>,
}

impl SessionStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Issue a new access token for `user_name` on the described device.
    pub fn create(&self, user_name: &str, info: &MediaBrowserInfo) -> Session {
        let session = Session {
            id: Uuid::new_v4().simple().to_string(),
            token: Uuid::new_v4().simple().to_string(),
            user_id: USER_ID.to_string(),
            user_name: user_name.to_string(),
            client: info.client.clone().unwrap_or_else(|| "Unknown".into()),
            device_name: info.device_name.clone().unwrap_or_else(|| "Unknown".into()),
            device_id: info
                .device_id
                .clone()
                .unwrap_or_else(|| Uuid::new_v4().to_string()),
            app_version: info.version.clone().unwrap_or_default(),
            created_at: Utc::now(),
        };
        tracing::info!(
            client = %session.client,
            device = %session.device_name,
            "Session created"
        );
        self.sessions.insert(session.token.clone(), session.clone());
        session
    }

    pub fn get(&self, token: &str) -> Option<Session> {
        self.sessions.get(token).map(|s| s.value().clone())
    }

    /// Revoke a token. Returns false when it was not signed in.
    pub fn remove(&self, token: &str) -> bool {
        self.sessions.remove(token).is_some()
    }
}
