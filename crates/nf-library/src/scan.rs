//! Filesystem scanner that builds a [`Library`] from configured collections.
//!
//! Layout conventions:
//!
//! - Movies: one directory per movie, named `Title (Year)`, holding a video
//!   file, optional `poster.*`/`folder.*`, `fanart.*`/`backdrop.*` and a
//!   `movie.nfo` or `<video-stem>.nfo` descriptor.
//! - Shows: one directory per show with `tvshow.nfo` and artwork. Episodes
//!   live in the show directory or one level below (season directories) and
//!   carry `S01E02` or `1x02` in their file name. Season posters are
//!   `seasonNN-poster.*` in the show directory or `poster.*` in the season
//!   directory. Episode thumbnails are `<stem>-thumb.*`, descriptors
//!   `<stem>.nfo`.
//!
//! Internal ids hash the collection's source id with the path relative to the
//! collection root, so they stay the same across rescans and restarts.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::sync::{Arc, LazyLock};
use std::time::SystemTime;

use chrono::{DateTime, Utc};
use nf_core::config::{CollectionConfig, CollectionKind};
use nf_core::id_hash;
use regex::Regex;
use walkdir::WalkDir;

use crate::descriptor::DescriptorSlot;
use crate::index::Library;
use crate::model::{Collection, Episode, Item, ItemKind, Season};

/// File extensions treated as playable video.
const VIDEO_EXTENSIONS: &[&str] = &["mp4", "m4v", "mkv", "avi", "mov", "webm", "ts", "wmv"];

/// File extensions treated as artwork.
const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "webp", "tbn"];

static TITLE_YEAR: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.+?)\s*\((\d{4})\)\s*$").expect("valid regex"));

static EPISODE_SXXEYY: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)s(\d{1,3})[ ._-]?e(\d{1,4})").expect("valid regex"));

static EPISODE_NXMM: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\b(\d{1,2})x(\d{2,3})\b").expect("valid regex"));

/// Scan every configured collection into a fresh snapshot.
pub fn scan(collections: &[CollectionConfig]) -> Library {
    let started = std::time::Instant::now();
    let scanned: Vec<Collection> = collections.iter().map(scan_collection).collect();
    let library = Library::new(scanned);
    tracing::info!(
        collections = library.collections().len(),
        items = library.item_count(),
        episodes = library.episode_count(),
        elapsed_ms = started.elapsed().as_millis() as u64,
        "Library scan complete"
    );
    library
}

/// Scan one collection directory. An unreadable directory yields an empty
/// collection.
pub fn scan_collection(config: &CollectionConfig) -> Collection {
    let items: Vec<Arc<Item>> = list_entries(&config.directory)
        .into_iter()
        .filter(|path| path.is_dir())
        .filter_map(|dir| match config.kind {
            CollectionKind::Movies => scan_movie(config, &dir),
            CollectionKind::Shows => scan_show(config, &dir),
        })
        .map(Arc::new)
        .collect();

    tracing::debug!(
        collection = %config.name,
        directory = %config.directory.display(),
        items = items.len(),
        "Scanned collection"
    );

    Collection {
        name: config.name.clone(),
        kind: config.kind,
        source_id: config.id,
        directory: config.directory.clone(),
        items,
    }
}

fn scan_movie(config: &CollectionConfig, dir: &Path) -> Option<Item> {
    let files = list_files(dir, 1);
    let Some(video) = files.iter().find(|p| is_video(p)).cloned() else {
        tracing::debug!(path = %dir.display(), "No video file; skipping movie directory");
        return None;
    };

    let (name, year) = split_title_year(&file_name(dir));
    let descriptor = find_named(&files, &["movie.nfo"])
        .or_else(|| find_named(&files, &[&format!("{}.nfo", file_stem(&video))]));

    Some(Item {
        id: id_hash(&format!("{}/{}", config.id, relative(&config.directory, dir))),
        name,
        year,
        sort_name: String::new(),
        rating: None,
        kind: ItemKind::Movie,
        poster: find_image(&files, &["poster", "folder"]),
        fanart: find_image(&files, &["fanart", "backdrop"]),
        descriptor: DescriptorSlot::new(descriptor),
        first_video: file_time(&video),
        video: Some(video),
        seasons: Vec::new(),
    })
}

fn scan_show(config: &CollectionConfig, dir: &Path) -> Option<Item> {
    let top_files = list_files(dir, 1);
    let item_id = id_hash(&format!("{}/{}", config.id, relative(&config.directory, dir)));

    // season number -> (directory holding its episodes, episodes)
    let mut seasons: BTreeMap<u32, (PathBuf, Vec<Episode>)> = BTreeMap::new();
    let all_files = list_files(dir, 2);
    for video in all_files.iter().filter(|p| is_video(p)) {
        let stem = file_stem(video);
        let Some((season_no, episode_no, rest)) = parse_episode(&stem) else {
            tracing::debug!(path = %video.display(), "No episode number in file name; skipping");
            continue;
        };
        let parent = video.parent().unwrap_or(dir).to_path_buf();
        let siblings: Vec<PathBuf> = all_files
            .iter()
            .filter(|p| p.parent() == Some(parent.as_path()))
            .cloned()
            .collect();

        let episode = Episode {
            id: id_hash(&format!("{}/{}", config.id, relative(&config.directory, video))),
            season_no,
            episode_no,
            name: if rest.is_empty() { stem.clone() } else { rest },
            thumb: find_image(&siblings, &[&format!("{stem}-thumb")]),
            first_seen: file_time(video),
            descriptor: DescriptorSlot::new(find_named(&siblings, &[&format!("{stem}.nfo")])),
            video: video.clone(),
        };
        seasons
            .entry(season_no)
            .or_insert_with(|| (parent, Vec::new()))
            .1
            .push(episode);
    }

    if seasons.is_empty() {
        tracing::debug!(path = %dir.display(), "No episodes; skipping show directory");
        return None;
    }

    let mut first_video: Option<DateTime<Utc>> = None;
    let seasons: Vec<Arc<Season>> = seasons
        .into_iter()
        .map(|(season_no, (season_dir, mut episodes))| {
            episodes.sort_by_key(|e| e.episode_no);
            for e in &episodes {
                first_video = Some(first_video.map_or(e.first_seen, |t| t.min(e.first_seen)));
            }
            let poster = find_image(&top_files, &[&format!("season{season_no:02}-poster")])
                .or_else(|| {
                    (season_dir != dir)
                        .then(|| find_image(&list_files(&season_dir, 1), &["poster", "folder"]))
                        .flatten()
                });
            Arc::new(Season {
                id: id_hash(&format!("{item_id}/season/{season_no}")),
                season_no,
                poster,
                episodes: episodes.into_iter().map(Arc::new).collect(),
            })
        })
        .collect();

    let (name, year) = split_title_year(&file_name(dir));
    Some(Item {
        id: item_id,
        name,
        year,
        sort_name: String::new(),
        rating: None,
        kind: ItemKind::Show,
        video: None,
        poster: find_image(&top_files, &["poster", "folder"]),
        fanart: find_image(&top_files, &["fanart", "backdrop"]),
        descriptor: DescriptorSlot::new(find_named(&top_files, &["tvshow.nfo"])),
        first_video: first_video.unwrap_or_else(Utc::now),
        seasons,
    })
}

/// Direct children of `dir`, sorted by name, hidden entries skipped.
fn list_entries(dir: &Path) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(1)
        .sort_by_file_name()
        .into_iter()
        .filter_map(|entry| match entry {
            Ok(entry) => Some(entry),
            Err(e) => {
                tracing::warn!(path = %dir.display(), error = %e, "Cannot read directory");
                None
            }
        })
        .filter(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .map(|entry| entry.into_path())
        .collect()
}

/// Regular files up to `depth` levels below `dir`, sorted by name.
fn list_files(dir: &Path, depth: usize) -> Vec<PathBuf> {
    WalkDir::new(dir)
        .min_depth(1)
        .max_depth(depth)
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|entry| !entry.file_name().to_string_lossy().starts_with('.'))
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .map(|entry| entry.into_path())
        .collect()
}

fn extension(path: &Path) -> String {
    path.extension()
        .map(|e| e.to_string_lossy().to_lowercase())
        .unwrap_or_default()
}

fn is_video(path: &Path) -> bool {
    VIDEO_EXTENSIONS.contains(&extension(path).as_str())
}

fn file_name(path: &Path) -> String {
    path.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn file_stem(path: &Path) -> String {
    path.file_stem()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

fn relative(root: &Path, path: &Path) -> String {
    path.strip_prefix(root)
        .unwrap_or(path)
        .to_string_lossy()
        .replace('\\', "/")
}

/// First file whose full name matches one of `names` (case-insensitive).
fn find_named(files: &[PathBuf], names: &[&str]) -> Option<PathBuf> {
    names.iter().find_map(|name| {
        files
            .iter()
            .find(|f| file_name(f).eq_ignore_ascii_case(name))
            .cloned()
    })
}

/// First image whose stem matches one of `stems` (case-insensitive), in
/// `stems` order.
fn find_image(files: &[PathBuf], stems: &[&str]) -> Option<PathBuf> {
    stems.iter().find_map(|stem| {
        files
            .iter()
            .find(|f| {
                file_stem(f).eq_ignore_ascii_case(stem)
                    && IMAGE_EXTENSIONS.contains(&extension(f).as_str())
            })
            .cloned()
    })
}

fn split_title_year(dir_name: &str) -> (String, i32) {
    match TITLE_YEAR.captures(dir_name) {
        Some(caps) => (
            caps[1].trim().to_string(),
            caps[2].parse().unwrap_or(0),
        ),
        None => (dir_name.trim().to_string(), 0),
    }
}

/// Season number, episode number and the title text after the marker.
fn parse_episode(stem: &str) -> Option<(u32, u32, String)> {
    let caps = EPISODE_SXXEYY
        .captures(stem)
        .or_else(|| EPISODE_NXMM.captures(stem))?;
    let season = caps[1].parse().ok()?;
    let episode = caps[2].parse().ok()?;
    let end = caps.get(0).map_or(stem.len(), |m| m.end());
    let title = stem[end..]
        .trim_matches(|c: char| c == ' ' || c == '-' || c == '.' || c == '_')
        .replace(['.', '_'], " ");
    Some((season, episode, title))
}

fn file_time(path: &Path) -> DateTime<Utc> {
    std::fs::metadata(path)
        .and_then(|m| m.created().or_else(|_| m.modified()))
        .map(DateTime::<Utc>::from)
        .unwrap_or_else(|_| DateTime::<Utc>::from(SystemTime::now()))
}
