//! HTTP middleware: request ID and token authentication.

pub mod auth;
pub mod request_id;
