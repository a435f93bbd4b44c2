//! nf-core: shared error type, identifier codec and configuration.
//!
//! This crate is the foundational dependency for the other nf-* crates. It
//! owns the wire-level id format used by Jellyfin clients so that prefix
//! parsing never leaks past the codec.

pub mod config;
pub mod error;
pub mod ids;

pub use error::{Error, Result};
pub use ids::{collection_id, id_hash, ExternalId, IdKind, ID_SEPARATOR};
