//! Unified error type for notflix.
//!
//! All crates funnel their failures into [`Error`], which carries enough context
//! for API handlers to derive an HTTP status code via [`Error::http_status`].

use std::fmt;
use std::path::Path;

/// Unified error type covering all failure modes in notflix.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The requested entity could not be found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// The kind of entity (e.g. "item", "season").
        entity: String,
        /// The identifier that was looked up.
        id: String,
    },

    /// Request data failed validation.
    #[error("Validation error: {0}")]
    Validation(String),

    /// An external id carried a type prefix we do not dispatch on.
    #[error("Unknown item id prefix: {prefix}")]
    UnknownIdPrefix {
        /// The prefix token in front of the separator.
        prefix: String,
    },

    /// The caller is not authenticated.
    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    /// The caller asked for an operation we do not support.
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// A sidecar descriptor could not be read or parsed.
    #[error("Descriptor error [{path}]: {message}")]
    Descriptor {
        /// Path of the descriptor file.
        path: String,
        /// Human-readable error description.
        message: String,
    },

    /// The configuration could not be loaded.
    #[error("Config error: {0}")]
    Config(String),

    /// An I/O operation failed.
    #[error("IO error: {source}")]
    Io {
        /// The underlying I/O error.
        #[from]
        source: std::io::Error,
    },

    /// Catch-all for unexpected internal errors.
    #[error("Internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Map this error to an appropriate HTTP status code.
    pub fn http_status(&self) -> u16 {
        match self {
            Error::NotFound { .. } => 404,
            Error::Validation(_) => 400,
            Error::UnknownIdPrefix { .. } => 400,
            Error::Unauthorized(_) => 401,
            Error::Forbidden(_) => 403,
            Error::Descriptor { .. } => 500,
            Error::Config(_) => 500,
            Error::Io { .. } => 500,
            Error::Internal(_) => 500,
        }
    }

    /// Convenience constructor for [`Error::NotFound`].
    pub fn not_found(entity: impl Into<String>, id: impl fmt::Display) -> Self {
        Error::NotFound {
            entity: entity.into(),
            id: id.to_string(),
        }
    }

    /// Convenience constructor for [`Error::Descriptor`].
    pub fn descriptor(path: &Path, message: impl Into<String>) -> Self {
        Error::Descriptor {
            path: path.display().to_string(),
            message: message.into(),
        }
    }
}

/// Result alias using the crate-level [`Error`].
pub type Result<T> = std::result::Result<T, Error>;
