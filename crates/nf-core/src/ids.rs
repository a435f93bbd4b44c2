//! Opaque external identifiers and the stable id hash.
//!
//! Jellyfin clients treat ids as opaque strings. We encode the entity kind as
//! a `<prefix>_<internal-id>` pair so that a single `/Items/{id}` route can
//! dispatch to collections, seasons, episodes and playlists. Plain catalog
//! items (movies and shows) carry no prefix at all.
//!
//! The prefix only exists at this edge: everything past [`ExternalId::decode`]
//! works with [`IdKind`].

use std::fmt;
use std::str::FromStr;

use sha2::{Digest, Sha256};

use crate::error::{Error, Result};

/// Separator between the type prefix and the internal id.
pub const ID_SEPARATOR: char = '_';

/// Number of hash bytes kept by [`id_hash`] (rendered as twice as many hex chars).
const HASH_BYTES: usize = 16;

/// The kind of entity an external id refers to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdKind {
    /// A configured collection (library view).
    Collection,
    /// The per-user virtual folder holding playlists.
    CollectionPlaylist,
    /// A season of a show.
    Season,
    /// An episode of a show.
    Episode,
    /// A user playlist.
    Playlist,
    /// A plain catalog item (movie or show), encoded without a prefix.
    Item,
}

impl IdKind {
    /// All kinds that are written with a prefix.
    pub const PREFIXED: [IdKind; 5] = [
        IdKind::Collection,
        IdKind::CollectionPlaylist,
        IdKind::Season,
        IdKind::Episode,
        IdKind::Playlist,
    ];

    /// Wire prefix for this kind, `None` for plain items.
    pub fn prefix(self) -> Option<&'static str> {
        match self {
            IdKind::Collection => Some("collection"),
            IdKind::CollectionPlaylist => Some("collectionplaylist"),
            IdKind::Season => Some("season"),
            IdKind::Episode => Some("episode"),
            IdKind::Playlist => Some("playlist"),
            IdKind::Item => None,
        }
    }

    fn from_prefix(prefix: &str) -> Option<Self> {
        Self::PREFIXED
            .into_iter()
            .find(|kind| kind.prefix() == Some(prefix))
    }
}

/// A decoded external id: entity kind plus internal id.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ExternalId {
    pub kind: IdKind,
    pub id: String,
}

impl ExternalId {
    pub fn new(kind: IdKind, id: impl Into<String>) -> Self {
        Self {
            kind,
            id: id.into(),
        }
    }

    /// Render the wire form `<prefix>_<id>` (or the raw id for plain items).
    pub fn encode(&self) -> String {
        match self.kind.prefix() {
            Some(prefix) => format!("{prefix}{ID_SEPARATOR}{}", self.id),
            None => self.id.clone(),
        }
    }

    /// Parse the wire form. Splits on the first separator; an id without a
    /// separator is a plain item id.
    pub fn decode(input: &str) -> Result<Self> {
        let Some((prefix, rest)) = input.split_once(ID_SEPARATOR) else {
            if input.is_empty() {
                return Err(Error::Validation("empty item id".into()));
            }
            return Ok(Self::new(IdKind::Item, input));
        };

        let kind = IdKind::from_prefix(prefix).ok_or_else(|| Error::UnknownIdPrefix {
            prefix: prefix.to_string(),
        })?;
        if rest.is_empty() {
            return Err(Error::Validation(format!("item id {input:?} has no body")));
        }
        Ok(Self::new(kind, rest))
    }

    /// Entity tag for this id: the stable hash of its wire form.
    pub fn etag(&self) -> String {
        id_hash(&self.encode())
    }
}

impl fmt::Display for ExternalId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.encode())
    }
}

impl FromStr for ExternalId {
    type Err = Error;

    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Self::decode(s)
    }
}

/// External id of a collection, derived from its configured source id.
pub fn collection_id(source_id: u32) -> String {
    ExternalId::new(IdKind::Collection, source_id.to_string()).encode()
}

/// Deterministic one-way hash of an arbitrary string into a fixed-length
/// lowercase hex token.
///
/// Used for entity tags and as the id of "virtual" entities (genres, studios,
/// people) that have no identity of their own. Stable across restarts and
/// platforms.
pub fn id_hash(input: &str) -> String {
    let digest = Sha256::digest(input.as_bytes());
    hex::encode(&digest[..HASH_BYTES])
}
