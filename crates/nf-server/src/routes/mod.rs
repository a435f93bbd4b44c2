//! Route handlers for the HTTP API.

pub mod jellyfin;
pub mod streaming_helpers;
