//! Catalog model: collections, items, seasons and episodes.
//!
//! Every entity is built once by the scanner and then only read. Children are
//! held behind `Arc` so the id index can hand out cheap references that stay
//! valid for as long as the snapshot they came from.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, Utc};
use nf_core::config::CollectionKind;

use crate::descriptor::DescriptorSlot;

/// A configured directory of media, published as one library view.
#[derive(Debug)]
pub struct Collection {
    pub name: String,
    pub kind: CollectionKind,
    /// Stable small integer from the configuration.
    pub source_id: u32,
    pub directory: PathBuf,
    pub items: Vec<Arc<Item>>,
}

/// Whether an item is a single movie or a show with seasons.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ItemKind {
    Movie,
    Show,
}

/// A movie or a show.
#[derive(Debug)]
pub struct Item {
    pub id: String,
    pub name: String,
    /// Release year, 0 when unknown.
    pub year: i32,
    /// Explicit sort name; empty means "sort by name".
    pub sort_name: String,
    /// Critic rating, if known.
    pub rating: Option<f32>,
    pub kind: ItemKind,
    /// Playable file (movies only).
    pub video: Option<PathBuf>,
    pub poster: Option<PathBuf>,
    pub fanart: Option<PathBuf>,
    pub descriptor: DescriptorSlot,
    /// When the item's video (or first episode) first appeared on disk.
    pub first_video: DateTime<Utc>,
    /// Seasons in ascending order (shows only).
    pub seasons: Vec<Arc<Season>>,
}

impl Item {
    /// The name used for sorting: the explicit sort name, or the plain name.
    pub fn sort_key(&self) -> &str {
        if self.sort_name.is_empty() {
            &self.name
        } else {
            &self.sort_name
        }
    }

    pub fn is_show(&self) -> bool {
        self.kind == ItemKind::Show
    }
}

#[derive(Debug)]
pub struct Season {
    pub id: String,
    pub season_no: u32,
    pub poster: Option<PathBuf>,
    /// Episodes in ascending order.
    pub episodes: Vec<Arc<Episode>>,
}

#[derive(Debug)]
pub struct Episode {
    pub id: String,
    pub season_no: u32,
    pub episode_no: u32,
    /// Title derived from the file name.
    pub name: String,
    pub video: PathBuf,
    pub thumb: Option<PathBuf>,
    pub first_seen: DateTime<Utc>,
    pub descriptor: DescriptorSlot,
}
