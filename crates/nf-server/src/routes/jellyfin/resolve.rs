//! Resolve external ids and image tags to catalog entities and files.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use nf_core::{Error, ExternalId, IdKind, Result};
use nf_library::{Collection, Descriptor, EpisodeEntry, ItemEntry, Library, SeasonEntry};

use crate::playlists::{Playlist, PlaylistStore};

/// Image tag prefix: redirect the client to the rest of the tag.
pub const TAG_REDIRECT: &str = "redirect_";
/// Image tag prefix: serve the rest of the tag as a local file.
pub const TAG_FILE: &str = "file_";

/// A catalog entity addressed by an external id.
#[derive(Debug)]
pub enum Entity<'a> {
    Collection(&'a Arc<Collection>),
    /// The caller's "Playlists" virtual folder.
    PlaylistFolder,
    Playlist(Playlist),
    Item(&'a ItemEntry),
    Season(&'a SeasonEntry),
    Episode(&'a EpisodeEntry),
}

/// Look up the entity behind `id` for `user_id`.
pub fn resolve_entity<'a>(
    library: &'a Library,
    playlists: &PlaylistStore,
    user_id: &str,
    id: &ExternalId,
) -> Result<Entity<'a>> {
    let missing = || Error::not_found("item", id);
    match id.kind {
        IdKind::Collection => id
            .id
            .parse::<u32>()
            .ok()
            .and_then(|source_id| library.collection(source_id))
            .map(Entity::Collection)
            .ok_or_else(missing),
        IdKind::CollectionPlaylist => Ok(Entity::PlaylistFolder),
        IdKind::Playlist => playlists.get(user_id, &id.id).map(Entity::Playlist),
        IdKind::Item => library.item(&id.id).map(Entity::Item).ok_or_else(missing),
        IdKind::Season => library.season(&id.id).map(Entity::Season).ok_or_else(missing),
        IdKind::Episode => library
            .episode(&id.id)
            .map(Entity::Episode)
            .ok_or_else(missing),
    }
}

/// A video that can be played, with its descriptor (if any) loaded.
#[derive(Debug, Clone)]
pub struct Playable {
    pub path: PathBuf,
    pub descriptor: Option<Arc<Descriptor>>,
}

/// Find the video file behind a movie or episode id.
pub fn resolve_playable(library: &Library, id: &str) -> Result<Playable> {
    let external = ExternalId::decode(id)?;
    match external.kind {
        IdKind::Item => {
            let entry = library
                .item(&external.id)
                .ok_or_else(|| Error::not_found("item", id))?;
            let path = entry
                .item
                .video
                .clone()
                .ok_or_else(|| Error::not_found("video", id))?;
            Ok(Playable {
                path,
                descriptor: entry.item.descriptor.load(),
            })
        }
        IdKind::Episode => {
            let entry = library
                .episode(&external.id)
                .ok_or_else(|| Error::not_found("episode", id))?;
            Ok(Playable {
                path: entry.episode.video.clone(),
                descriptor: entry.episode.descriptor.load(),
            })
        }
        _ => Err(Error::not_found("video", id)),
    }
}

/// Where an image request leads.
#[derive(Debug, Clone, PartialEq)]
pub enum ImageOutcome {
    /// HTTP redirect to this URL.
    Redirect(String),
    /// Serve this file as-is.
    File(PathBuf),
    /// Serve this poster through the quality transform.
    Poster(PathBuf),
    NotFound,
}

/// Resolve `/Items/{id}/Images/{image_type}?tag=...`.
///
/// Tags carrying a redirect or file marker are honoured regardless of `id`.
/// File tags are only served from inside a collection directory.
pub fn resolve_image(
    library: &Library,
    id: &str,
    image_type: &str,
    tag: Option<&str>,
) -> Result<ImageOutcome> {
    if let Some(tag) = tag {
        if let Some(url) = tag.strip_prefix(TAG_REDIRECT) {
            return Ok(ImageOutcome::Redirect(url.to_string()));
        }
        if let Some(file) = tag.strip_prefix(TAG_FILE) {
            let path = PathBuf::from(file);
            if within_collections(library, &path) {
                return Ok(ImageOutcome::File(path));
            }
            tracing::warn!(path = file, "Refusing file tag outside collection directories");
            return Ok(ImageOutcome::NotFound);
        }
    }

    let external = ExternalId::decode(id)?;
    let outcome = match external.kind {
        IdKind::Season => match library.season(&external.id) {
            Some(entry) if image_type == "Primary" => poster(entry.season.poster.as_ref()),
            Some(_) => {
                tracing::debug!(id, image_type, "Unsupported season image type");
                ImageOutcome::NotFound
            }
            None => ImageOutcome::NotFound,
        },
        IdKind::Episode => match library.episode(&external.id) {
            Some(entry) => file(entry.episode.thumb.as_ref()),
            None => ImageOutcome::NotFound,
        },
        IdKind::Item => match library.item(&external.id) {
            Some(entry) => match image_type {
                "Primary" => poster(entry.item.poster.as_ref()),
                "Backdrop" => file(entry.item.fanart.as_ref()),
                _ => {
                    tracing::debug!(id, image_type, "Unsupported item image type");
                    ImageOutcome::NotFound
                }
            },
            None => ImageOutcome::NotFound,
        },
        IdKind::Collection | IdKind::CollectionPlaylist | IdKind::Playlist => {
            ImageOutcome::NotFound
        }
    };
    Ok(outcome)
}

fn poster(path: Option<&PathBuf>) -> ImageOutcome {
    path.map_or(ImageOutcome::NotFound, |p| ImageOutcome::Poster(p.clone()))
}

fn file(path: Option<&PathBuf>) -> ImageOutcome {
    path.map_or(ImageOutcome::NotFound, |p| ImageOutcome::File(p.clone()))
}

fn within_collections(library: &Library, path: &Path) -> bool {
    let Ok(path) = path.canonicalize() else {
        return false;
    };
    library.collections().iter().any(|c| {
        c.directory
            .canonicalize()
            .map(|dir| path.starts_with(dir))
            .unwrap_or(false)
    })
}
