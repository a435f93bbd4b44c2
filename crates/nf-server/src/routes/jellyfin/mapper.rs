//! Presentation records for every entity kind.
//!
//! [`Mapper::record`] is the single dispatch point: it matches exhaustively
//! on [`Entity`], so adding an entity kind forces a decision here. Records
//! are derived from the catalog snapshot plus descriptors and are never
//! stored.

use std::collections::BTreeMap;
use std::path::Path;

use nf_core::{collection_id, id_hash, ExternalId, IdKind};
use nf_library::{Collection, EpisodeEntry, ItemEntry, ItemKind, Library, SeasonEntry};

use super::dto::{BaseItemDto, UserDataDto};
use super::enrich::{merge, MergeScope};
use super::media_source::media_source;
use super::resolve::Entity;
use crate::playlists::{Playlist, PlaylistStore};

/// Parent id reported for collections.
pub const COLLECTION_ROOT_ID: &str = "e9d5075a555c1cbc394eec4cef295274";
/// Display preferences id reported for collections.
pub const DISPLAY_PREFERENCES_ID: &str = "f137a2dd21bbc1b99aa5c0f6bf02a805";

const COLLECTION_ASPECT_RATIO: f64 = 1.777_777_777_777_777_7;
const POSTER_ASPECT_RATIO: f64 = 0.666_666_666_666_666_6;
const VIDEO_CONTAINER: &str = "mov,mp4,m4a";

/// Whether a record is part of a listing or a single-item lookup.
///
/// Movies carry their poster tag in listings only; clients fetching a
/// single movie then show the backdrop instead.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    List,
    Detail,
}

/// Builds records for one request.
pub struct Mapper<'a> {
    library: &'a Library,
    playlists: &'a PlaylistStore,
    server_id: &'a str,
    user_id: &'a str,
}

/// Image tag for a local file: a hash of its path.
fn image_tag(path: &Path) -> String {
    id_hash(&path.to_string_lossy())
}

fn file_name(path: &Path) -> Option<String> {
    path.file_name().map(|n| n.to_string_lossy().into_owned())
}

impl<'a> Mapper<'a> {
    pub fn new(
        library: &'a Library,
        playlists: &'a PlaylistStore,
        server_id: &'a str,
        user_id: &'a str,
    ) -> Self {
        Self {
            library,
            playlists,
            server_id,
            user_id,
        }
    }

    pub fn record(&self, entity: &Entity<'_>, view: View) -> BaseItemDto {
        match entity {
            Entity::Collection(collection) => self.collection(collection),
            Entity::PlaylistFolder => self.playlist_folder(),
            Entity::Playlist(playlist) => self.playlist(playlist),
            Entity::Item(entry) => self.item(entry, view),
            Entity::Season(entry) => self.season(entry),
            Entity::Episode(entry) => self.episode(entry),
        }
    }

    fn base(&self, id: &ExternalId, name: &str, item_type: &str) -> BaseItemDto {
        let encoded = id.encode();
        BaseItemDto {
            name: name.to_string(),
            server_id: self.server_id.to_string(),
            etag: id.etag(),
            item_type: item_type.to_string(),
            user_data: Some(UserDataDto::for_item(&encoded)),
            id: encoded,
            ..Default::default()
        }
    }

    pub fn collection(&self, collection: &Collection) -> BaseItemDto {
        let id = ExternalId::new(IdKind::Collection, collection.source_id.to_string());
        BaseItemDto {
            sort_name: Some(collection.name.clone()),
            date_created: Some(self.library.scanned_at()),
            is_folder: true,
            enable_media_source_display: Some(true),
            child_count: Some(collection.items.len()),
            display_preferences_id: Some(DISPLAY_PREFERENCES_ID.into()),
            play_access: Some("Full".into()),
            primary_image_aspect_ratio: Some(COLLECTION_ASPECT_RATIO),
            location_type: Some("FileSystem".into()),
            path: Some("/collection".into()),
            media_type: Some("Unknown".into()),
            parent_id: Some(COLLECTION_ROOT_ID.into()),
            collection_type: Some(collection.kind.collection_type().into()),
            can_delete: Some(false),
            can_download: Some(false),
            ..self.base(&id, &collection.name, "CollectionFolder")
        }
    }

    /// The caller's "Playlists" virtual folder.
    pub fn playlist_folder(&self) -> BaseItemDto {
        let id = ExternalId::new(IdKind::CollectionPlaylist, self.user_id);
        BaseItemDto {
            sort_name: Some("Playlists".into()),
            date_created: Some(self.library.scanned_at()),
            is_folder: true,
            child_count: Some(self.playlists.count(self.user_id)),
            display_preferences_id: Some(DISPLAY_PREFERENCES_ID.into()),
            play_access: Some("Full".into()),
            primary_image_aspect_ratio: Some(COLLECTION_ASPECT_RATIO),
            location_type: Some("Virtual".into()),
            media_type: Some("Unknown".into()),
            parent_id: Some(COLLECTION_ROOT_ID.into()),
            collection_type: Some("playlists".into()),
            can_delete: Some(false),
            can_download: Some(false),
            ..self.base(&id, "Playlists", "CollectionFolder")
        }
    }

    pub fn playlist(&self, playlist: &Playlist) -> BaseItemDto {
        let id = ExternalId::new(IdKind::Playlist, playlist.id.as_str());
        BaseItemDto {
            sort_name: Some(playlist.name.clone()),
            is_folder: true,
            child_count: Some(playlist.entries.len()),
            media_type: Some("Video".into()),
            location_type: Some("Virtual".into()),
            parent_id: Some(ExternalId::new(IdKind::CollectionPlaylist, self.user_id).encode()),
            can_delete: Some(true),
            ..self.base(&id, &playlist.name, "Playlist")
        }
    }

    /// Records for a playlist's entries, in playlist order. Entries whose
    /// item is no longer in the catalog are skipped.
    pub fn playlist_entries(&self, playlist: &Playlist) -> Vec<BaseItemDto> {
        playlist
            .entries
            .iter()
            .filter_map(|entry| {
                let record = match ExternalId::decode(&entry.item_id) {
                    Ok(ExternalId {
                        kind: IdKind::Item,
                        id,
                    }) => self.library.item(&id).map(|e| self.item(e, View::List)),
                    Ok(ExternalId {
                        kind: IdKind::Episode,
                        id,
                    }) => self.library.episode(&id).map(|e| self.episode(e)),
                    _ => None,
                };
                if record.is_none() {
                    tracing::debug!(item = %entry.item_id, "Skipping stale playlist entry");
                }
                record.map(|mut r| {
                    r.playlist_item_id = Some(entry.entry_id.clone());
                    r
                })
            })
            .collect()
    }

    /// Movie or series.
    pub fn item(&self, entry: &ItemEntry, view: View) -> BaseItemDto {
        let item = &entry.item;
        let id = ExternalId::new(IdKind::Item, item.id.as_str());
        let descriptor = item.descriptor.load();

        let mut record = BaseItemDto {
            original_title: Some(item.name.clone()),
            sort_name: Some(item.sort_key().to_string()),
            forced_sort_name: Some(item.sort_key().to_string()),
            date_created: Some(item.first_video),
            premiere_date: Some(item.first_video),
            parent_id: Some(collection_id(entry.collection.source_id)),
            production_year: (item.year != 0).then_some(item.year),
            critic_rating: item
                .rating
                .or_else(|| descriptor.as_ref().map(|d| d.rating).filter(|r| *r != 0.0)),
            primary_image_aspect_ratio: Some(POSTER_ASPECT_RATIO),
            backdrop_image_tags: item.fanart.as_deref().map(|p| vec![image_tag(p)]),
            location_type: Some("FileSystem".into()),
            can_delete: Some(false),
            can_download: Some(true),
            ..self.base(&id, &item.name, "")
        };

        let mut tags = BTreeMap::new();
        if let Some(poster) = &item.poster {
            tags.insert("Primary".to_string(), image_tag(poster));
        }

        match item.kind {
            ItemKind::Movie => {
                record.item_type = "Movie".into();
                record.media_type = Some("Video".into());
                record.video_type = Some("VideoFile".into());
                record.container = Some(VIDEO_CONTAINER.into());
                if let Some(video) = &item.video {
                    record.path = file_name(video);
                    let source = media_source(video, descriptor.as_deref(), &record.id);
                    record.run_time_ticks = source.run_time_ticks;
                    record.media_sources = Some(vec![source]);
                }
                if view == View::Detail {
                    tags.remove("Primary");
                }
            }
            ItemKind::Show => {
                record.item_type = "Series".into();
                record.is_folder = true;
                record.child_count = Some(item.seasons.len());
                record.recursive_item_count =
                    Some(item.seasons.iter().map(|s| s.episodes.len()).sum());
            }
        }
        record.image_tags = (!tags.is_empty()).then_some(tags);

        if let Some(descriptor) = &descriptor {
            merge(&mut record, descriptor, MergeScope::Full);
        }
        record
    }

    pub fn season(&self, entry: &SeasonEntry) -> BaseItemDto {
        let show = &entry.item;
        let season = &entry.season;
        let id = ExternalId::new(IdKind::Season, season.id.as_str());
        let name = format!("Season {}", season.season_no);

        BaseItemDto {
            sort_name: Some(format!("{:04}", season.season_no)),
            parent_id: Some(show.id.clone()),
            series_id: Some(show.id.clone()),
            series_name: Some(show.name.clone()),
            index_number: Some(season.season_no),
            is_folder: true,
            location_type: Some("FileSystem".into()),
            media_type: Some("Unknown".into()),
            child_count: Some(season.episodes.len()),
            recursive_item_count: Some(season.episodes.len()),
            date_created: Some(show.first_video),
            premiere_date: Some(show.first_video),
            image_tags: season
                .poster
                .as_deref()
                .map(|p| BTreeMap::from([("Primary".to_string(), image_tag(p))])),
            ..self.base(&id, &name, "Season")
        }
    }

    /// Episode record: show descriptor first (inheritable fields only), then
    /// the episode's own descriptor. Age and community ratings are always
    /// cleared afterwards.
    pub fn episode(&self, entry: &EpisodeEntry) -> BaseItemDto {
        let show = &entry.item;
        let season = &entry.season;
        let episode = &entry.episode;
        let id = ExternalId::new(IdKind::Episode, episode.id.as_str());
        let season_id = ExternalId::new(IdKind::Season, season.id.as_str()).encode();

        let mut record = BaseItemDto {
            sort_name: Some(episode.name.clone()),
            series_name: Some(show.name.clone()),
            series_id: Some(show.id.clone()),
            season_id: Some(season_id.clone()),
            season_name: Some(format!("Season {}", season.season_no)),
            parent_id: Some(season_id),
            index_number: (episode.episode_no != 0).then_some(episode.episode_no),
            parent_index_number: Some(episode.season_no),
            location_type: Some("FileSystem".into()),
            path: file_name(&episode.video),
            media_type: Some("Video".into()),
            video_type: Some("VideoFile".into()),
            container: Some(VIDEO_CONTAINER.into()),
            date_created: Some(episode.first_seen),
            premiere_date: Some(episode.first_seen),
            image_tags: episode
                .thumb
                .as_deref()
                .map(|p| BTreeMap::from([("Primary".to_string(), image_tag(p))])),
            can_delete: Some(false),
            can_download: Some(true),
            ..self.base(&id, &episode.name, "Episode")
        };

        if let Some(show_descriptor) = show.descriptor.load() {
            merge(&mut record, &show_descriptor, MergeScope::Inherited);
        }
        let own = episode.descriptor.load();
        if let Some(descriptor) = &own {
            merge(&mut record, descriptor, MergeScope::Full);
        }
        record.official_rating = None;
        record.community_rating = None;

        let source = media_source(&episode.video, own.as_deref(), &record.id);
        record.run_time_ticks = source.run_time_ticks;
        record.media_sources = Some(vec![source]);
        record
    }

    /// Season records of a show, in season order.
    pub fn seasons_of(&self, show: &ItemEntry) -> Vec<BaseItemDto> {
        show.item
            .seasons
            .iter()
            .filter_map(|s| self.library.season(&s.id))
            .map(|entry| self.season(entry))
            .collect()
    }

    /// Episode records of a show, optionally restricted to one season.
    pub fn episodes_of(&self, show: &ItemEntry, season_id: Option<&str>) -> Vec<BaseItemDto> {
        show.item
            .seasons
            .iter()
            .filter(|s| season_id.map_or(true, |wanted| wanted == s.id))
            .flat_map(|s| s.episodes.iter())
            .filter_map(|e| self.library.episode(&e.id))
            .map(|entry| self.episode(entry))
            .collect()
    }
}
