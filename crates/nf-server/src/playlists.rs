//! In-memory, per-user playlists.

use std::collections::HashMap;

use nf_core::{Error, ExternalId, IdKind, Result};
use parking_lot::RwLock;
use uuid::Uuid;

/// A named, ordered list of catalog item ids.
#[derive(Debug, Clone, PartialEq)]
pub struct Playlist {
    pub id: String,
    pub user_id: String,
    pub name: String,
    pub entries: Vec<PlaylistEntry>,
}

impl Playlist {
    /// Wire id, `playlist_<id>`.
    pub fn external_id(&self) -> String {
        ExternalId::new(IdKind::Playlist, self.id.as_str()).encode()
    }
}

/// One position in a playlist. The same item may appear more than once, so
/// each entry has its own id for removal.
#[derive(Debug, Clone, PartialEq)]
pub struct PlaylistEntry {
    pub entry_id: String,
    /// External id of the referenced item or episode.
    pub item_id: String,
}

#[derive(Debug, Default)]
pub struct PlaylistStore {
    playlists: RwLock<HashMap<String, Playlist>>,
}

/// Accept either the wire form `playlist_<id>` or the bare id.
fn bare_id(id: &str) -> &str {
    id.strip_prefix("playlist_").unwrap_or(id)
}

fn new_entries(item_ids: &[String]) -> impl Iterator<Item = PlaylistEntry> + '_ {
    item_ids
        .iter()
        .filter(|id| !id.is_empty())
        .map(|id| PlaylistEntry {
            entry_id: Uuid::new_v4().simple().to_string(),
            item_id: id.clone(),
        })
}

impl PlaylistStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn create(&self, user_id: &str, name: &str, item_ids: &[String]) -> Playlist {
        let playlist = Playlist {
            id: Uuid::new_v4().simple().to_string(),
            user_id: user_id.to_string(),
            name: name.to_string(),
            entries: new_entries(item_ids).collect(),
        };
        tracing::info!(id = %playlist.id, name, entries = playlist.entries.len(), "Playlist created");
        self.playlists
            .write()
            .insert(playlist.id.clone(), playlist.clone());
        playlist
    }

    /// The user's playlists ordered by name.
    pub fn list(&self, user_id: &str) -> Vec<Playlist> {
        let mut lists: Vec<Playlist> = self
            .playlists
            .read()
            .values()
            .filter(|p| p.user_id == user_id)
            .cloned()
            .collect();
        lists.sort_by(|a, b| a.name.cmp(&b.name).then_with(|| a.id.cmp(&b.id)));
        lists
    }

    pub fn count(&self, user_id: &str) -> usize {
        self.playlists
            .read()
            .values()
            .filter(|p| p.user_id == user_id)
            .count()
    }

    /// Another user's playlist is reported as missing.
    pub fn get(&self, user_id: &str, id: &str) -> Result<Playlist> {
        self.playlists
            .read()
            .get(bare_id(id))
            .filter(|p| p.user_id == user_id)
            .cloned()
            .ok_or_else(|| Error::not_found("playlist", id))
    }

    pub fn add_items(&self, user_id: &str, id: &str, item_ids: &[String]) -> Result<Playlist> {
        self.update(user_id, id, |p| p.entries.extend(new_entries(item_ids)))
    }

    pub fn remove_entries(
        &self,
        user_id: &str,
        id: &str,
        entry_ids: &[String],
    ) -> Result<Playlist> {
        self.update(user_id, id, |p| {
            p.entries.retain(|e| !entry_ids.contains(&e.entry_id))
        })
    }

    fn update(&self, user_id: &str, id: &str, f: impl FnOnce(&mut Playlist)) -> Result<Playlist> {
        let mut guard = self.playlists.write();
        let playlist = guard
            .get_mut(bare_id(id))
            .filter(|p| p.user_id == user_id)
            .ok_or_else(|| Error::not_found("playlist", id))?;
        f(playlist);
        Ok(playlist.clone())
    }
}
