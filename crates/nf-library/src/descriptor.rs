//! Sidecar metadata (`.nfo`) parsing and the memoized per-entity slot.
//!
//! Descriptors are Kodi-style XML files with a `<movie>`, `<tvshow>` or
//! `<episodedetails>` root. Only the fields the Jellyfin mapping needs are
//! extracted; unknown elements are skipped.

use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use nf_core::{Error, Result};
use quick_xml::events::Event;
use quick_xml::Reader;

/// Root elements accepted as a descriptor.
const ROOT_ELEMENTS: &[&str] = &["movie", "tvshow", "episodedetails"];

/// Genre spellings folded onto one canonical name (keys are lowercase).
const GENRE_SYNONYMS: &[(&str, &str)] = &[
    ("sci-fi", "Science Fiction"),
    ("scifi", "Science Fiction"),
    ("science-fiction", "Science Fiction"),
    ("science fiction", "Science Fiction"),
    ("sci-fi & fantasy", "Sci-Fi & Fantasy"),
    ("action & adventure", "Action & Adventure"),
    ("war & politics", "War & Politics"),
    ("tv movie", "TV Movie"),
    ("kids", "Children"),
    ("animated", "Animation"),
    ("docu", "Documentary"),
];

/// Parsed sidecar metadata. Immutable once attached to an entity.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Descriptor {
    pub title: String,
    pub plot: String,
    pub tagline: String,
    /// Season number as written in the file; may be non-numeric.
    pub season: String,
    /// Episode number as written in the file; may be non-numeric.
    pub episode: String,
    /// Age rating, e.g. `TV-14`.
    pub mpaa: String,
    pub rating: f32,
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub studio: String,
    pub actors: Vec<Actor>,
    pub year: i32,
    pub premiered: String,
    pub aired: String,
    pub stream_details: Option<StreamDetails>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct Actor {
    pub name: String,
    pub role: String,
    /// URL or path of a portrait.
    pub thumb: String,
}

/// Technical details from `<fileinfo><streamdetails>`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StreamDetails {
    pub video: VideoDetails,
    pub audio: AudioDetails,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct VideoDetails {
    pub codec: String,
    pub bitrate: u64,
    pub width: u32,
    pub height: u32,
    pub frame_rate: f64,
    pub duration_secs: u64,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct AudioDetails {
    pub codec: String,
    pub bitrate: u64,
    pub channels: u32,
    pub language: String,
}

impl Descriptor {
    /// Read and parse a descriptor file.
    pub fn load(path: &Path) -> Result<Self> {
        let bytes = std::fs::read(path)?;
        let content = String::from_utf8_lossy(&bytes);
        Self::parse(&content).map_err(|message| Error::descriptor(path, message))
    }

    /// Parse descriptor XML.
    pub fn parse(xml: &str) -> std::result::Result<Self, String> {
        let mut reader = Reader::from_str(xml);

        let mut descriptor = Descriptor::default();
        let mut stack: Vec<String> = Vec::new();
        let mut text = String::new();
        let mut actor = Actor::default();
        let mut audio_streams = 0usize;
        let mut has_root = false;

        loop {
            match reader.read_event() {
                Ok(Event::Start(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if stack.is_empty() && ROOT_ELEMENTS.contains(&name.as_str()) {
                        has_root = true;
                    }
                    match name.as_str() {
                        "actor" => actor = Actor::default(),
                        "audio" => audio_streams += 1,
                        _ => {}
                    }
                    stack.push(name);
                    text.clear();
                }
                // `<movie/>` is a complete, empty descriptor.
                Ok(Event::Empty(e)) => {
                    let name = String::from_utf8_lossy(e.name().as_ref()).to_lowercase();
                    if stack.is_empty() && ROOT_ELEMENTS.contains(&name.as_str()) {
                        has_root = true;
                    }
                }
                // Text split by comments or CDATA sections is concatenated.
                Ok(Event::Text(e)) => {
                    text.push_str(&e.unescape().map_err(|e| e.to_string())?);
                }
                Ok(Event::CData(e)) => {
                    text.push_str(&String::from_utf8_lossy(&e.into_inner()));
                }
                Ok(Event::End(_)) => {
                    let Some(name) = stack.pop() else {
                        break;
                    };
                    let parent = stack.last().map(String::as_str).unwrap_or("");
                    let value = std::mem::take(&mut text).trim().to_string();
                    descriptor.apply(parent, &name, value, &mut actor, audio_streams);
                }
                // The reader does not report elements left open at end of input.
                Ok(Event::Eof) if !stack.is_empty() => {
                    return Err(format!("unexpected end of input inside <{}>", stack.join("><")));
                }
                Ok(Event::Eof) => break,
                Err(e) => return Err(e.to_string()),
                _ => {}
            }
        }

        if !has_root {
            return Err("no <movie>, <tvshow> or <episodedetails> root element".into());
        }
        Ok(descriptor)
    }

    fn apply(
        &mut self,
        parent: &str,
        name: &str,
        value: String,
        actor: &mut Actor,
        audio_streams: usize,
    ) {
        match (parent, name) {
            ("actor", "name") => actor.name = value,
            ("actor", "role") => actor.role = value,
            ("actor", "thumb") => actor.thumb = value,
            ("video", field) => {
                let video = &mut self.stream_details.get_or_insert_with(Default::default).video;
                match field {
                    "codec" => video.codec = value,
                    "bitrate" => video.bitrate = parse_num(&value).unwrap_or(0),
                    "width" => video.width = parse_num(&value).unwrap_or(0),
                    "height" => video.height = parse_num(&value).unwrap_or(0),
                    "framerate" => video.frame_rate = parse_num(&value).unwrap_or(0.0),
                    "durationinseconds" => {
                        video.duration_secs = parse_num::<f64>(&value).unwrap_or(0.0) as u64
                    }
                    _ => {}
                }
            }
            // Only the first audio stream is described.
            ("audio", field) if audio_streams == 1 => {
                let audio = &mut self.stream_details.get_or_insert_with(Default::default).audio;
                match field {
                    "codec" => audio.codec = value,
                    "bitrate" => audio.bitrate = parse_num(&value).unwrap_or(0),
                    "channels" => audio.channels = parse_num(&value).unwrap_or(0),
                    "language" => audio.language = value,
                    _ => {}
                }
            }
            // Newer Kodi files: <ratings><rating default="true"><value>7.8</value>.
            ("rating", "value") if self.rating == 0.0 => {
                self.rating = parse_num(&value).unwrap_or(0.0);
            }
            (parent, field) if ROOT_ELEMENTS.contains(&parent) => match field {
                "title" => self.title = value,
                "plot" => self.plot = value,
                "tagline" => self.tagline = value,
                "season" => self.season = value,
                "episode" => self.episode = value,
                "mpaa" => self.mpaa = value,
                "rating" => self.rating = parse_num(&value).unwrap_or(0.0),
                "genre" if !value.is_empty() => self.genres.push(value),
                "tag" if !value.is_empty() => self.tags.push(value),
                "studio" if self.studio.is_empty() => self.studio = value,
                "year" => self.year = parse_num(&value).unwrap_or(0),
                "premiered" => self.premiered = value,
                "aired" => self.aired = value,
                "actor" => {
                    let done = std::mem::take(actor);
                    if !done.name.is_empty() {
                        self.actors.push(done);
                    }
                }
                _ => {}
            },
            _ => {}
        }
    }

    /// Genres with whitespace trimmed, synonyms folded, words capitalized
    /// and duplicates removed (first occurrence kept).
    pub fn normalized_genres(&self) -> Vec<String> {
        let mut out: Vec<String> = Vec::new();
        for raw in &self.genres {
            for part in raw.split('/') {
                if let Some(genre) = normalize_genre(part) {
                    if !out.contains(&genre) {
                        out.push(genre);
                    }
                }
            }
        }
        out
    }
}

fn parse_num<T: FromStr>(value: &str) -> Option<T> {
    value.trim().parse().ok()
}

fn normalize_genre(raw: &str) -> Option<String> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    let lower = trimmed.to_lowercase();
    if let Some((_, canonical)) = GENRE_SYNONYMS.iter().find(|(k, _)| *k == lower) {
        return Some((*canonical).to_string());
    }
    let words: Vec<String> = lower
        .split_whitespace()
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect();
    Some(words.join(" "))
}

// ---------------------------------------------------------------------------
// DescriptorSlot
// ---------------------------------------------------------------------------

/// Lazily filled, write-once descriptor attached to a catalog entity.
///
/// A descriptor is parsed completely before it is published, so a reader
/// either sees nothing or a finished value. Concurrent first loads may parse
/// the same file twice; the first publish wins and the other copy is dropped.
/// A failed load leaves the slot empty so a later request can retry.
#[derive(Debug, Default)]
pub struct DescriptorSlot {
    path: Option<PathBuf>,
    cell: OnceLock<Arc<Descriptor>>,
}

impl DescriptorSlot {
    pub fn new(path: Option<PathBuf>) -> Self {
        Self {
            path,
            cell: OnceLock::new(),
        }
    }

    /// A slot that is already filled.
    pub fn with(descriptor: Descriptor) -> Self {
        let cell = OnceLock::new();
        let _ = cell.set(Arc::new(descriptor));
        Self { path: None, cell }
    }

    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// The attached descriptor, without trying to load it.
    pub fn peek(&self) -> Option<Arc<Descriptor>> {
        self.cell.get().cloned()
    }

    /// The attached descriptor, loading it from disk on first use.
    ///
    /// Never fails: a missing or malformed file yields `None`.
    pub fn load(&self) -> Option<Arc<Descriptor>> {
        if let Some(descriptor) = self.cell.get() {
            return Some(descriptor.clone());
        }
        let path = self.path.as_deref()?;
        match Descriptor::load(path) {
            Ok(parsed) => {
                let _ = self.cell.set(Arc::new(parsed));
                self.cell.get().cloned()
            }
            Err(Error::Io { source }) => {
                tracing::debug!(path = %path.display(), error = %source, "descriptor not readable");
                None
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping malformed descriptor");
                None
            }
        }
    }
}
