//! Immutable catalog snapshot with precomputed id lookups.

use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;

use chrono::{DateTime, Utc};

use crate::model::{Collection, Episode, Item, Season};

/// An item together with the collection that holds it.
#[derive(Debug, Clone)]
pub struct ItemEntry {
    pub collection: Arc<Collection>,
    pub item: Arc<Item>,
}

/// A season together with its show and collection.
#[derive(Debug, Clone)]
pub struct SeasonEntry {
    pub collection: Arc<Collection>,
    pub item: Arc<Item>,
    pub season: Arc<Season>,
}

/// An episode together with its season, show and collection.
#[derive(Debug, Clone)]
pub struct EpisodeEntry {
    pub collection: Arc<Collection>,
    pub item: Arc<Item>,
    pub season: Arc<Season>,
    pub episode: Arc<Episode>,
}

/// Aggregated filter values for the filter-discovery endpoints.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Details {
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub official_ratings: Vec<String>,
    pub years: Vec<i32>,
}

/// One scan's worth of catalog. Never mutated after construction.
#[derive(Debug)]
pub struct Library {
    collections: Vec<Arc<Collection>>,
    items: HashMap<String, ItemEntry>,
    seasons: HashMap<String, SeasonEntry>,
    episodes: HashMap<String, EpisodeEntry>,
    scanned_at: DateTime<Utc>,
}

impl Library {
    /// Build a snapshot and its id indexes. On duplicate ids the first
    /// occurrence wins.
    pub fn new(collections: Vec<Collection>) -> Self {
        let collections: Vec<Arc<Collection>> = collections.into_iter().map(Arc::new).collect();
        let mut items = HashMap::new();
        let mut seasons = HashMap::new();
        let mut episodes = HashMap::new();

        for collection in &collections {
            for item in &collection.items {
                if items.contains_key(&item.id) {
                    tracing::warn!(id = %item.id, name = %item.name, "duplicate item id; keeping first");
                    continue;
                }
                items.insert(
                    item.id.clone(),
                    ItemEntry {
                        collection: collection.clone(),
                        item: item.clone(),
                    },
                );

                for season in &item.seasons {
                    if seasons.contains_key(&season.id) {
                        tracing::warn!(id = %season.id, show = %item.name, "duplicate season id; keeping first");
                        continue;
                    }
                    seasons.insert(
                        season.id.clone(),
                        SeasonEntry {
                            collection: collection.clone(),
                            item: item.clone(),
                            season: season.clone(),
                        },
                    );

                    for episode in &season.episodes {
                        if episodes.contains_key(&episode.id) {
                            tracing::warn!(id = %episode.id, path = %episode.video.display(), "duplicate episode id; keeping first");
                            continue;
                        }
                        episodes.insert(
                            episode.id.clone(),
                            EpisodeEntry {
                                collection: collection.clone(),
                                item: item.clone(),
                                season: season.clone(),
                                episode: episode.clone(),
                            },
                        );
                    }
                }
            }
        }

        Self {
            collections,
            items,
            seasons,
            episodes,
            scanned_at: Utc::now(),
        }
    }

    pub fn empty() -> Self {
        Self::new(Vec::new())
    }

    pub fn collections(&self) -> &[Arc<Collection>] {
        &self.collections
    }

    pub fn collection(&self, source_id: u32) -> Option<&Arc<Collection>> {
        self.collections.iter().find(|c| c.source_id == source_id)
    }

    pub fn item(&self, id: &str) -> Option<&ItemEntry> {
        self.items.get(id)
    }

    pub fn season(&self, id: &str) -> Option<&SeasonEntry> {
        self.seasons.get(id)
    }

    pub fn episode(&self, id: &str) -> Option<&EpisodeEntry> {
        self.episodes.get(id)
    }

    /// Every item of every collection, in collection then scan order.
    pub fn all_items(&self) -> impl Iterator<Item = ItemEntry> + '_ {
        self.collections.iter().flat_map(|collection| {
            collection.items.iter().map(move |item| ItemEntry {
                collection: collection.clone(),
                item: item.clone(),
            })
        })
    }

    pub fn item_count(&self) -> usize {
        self.items.len()
    }

    pub fn episode_count(&self) -> usize {
        self.episodes.len()
    }

    /// When this snapshot was built.
    pub fn scanned_at(&self) -> DateTime<Utc> {
        self.scanned_at
    }

    /// Distinct genres, tags, age ratings and years over `scope` (or the
    /// whole library), each sorted ascending.
    ///
    /// Loads item descriptors that have not been read yet.
    pub fn details(&self, scope: Option<&Collection>) -> Details {
        let mut genres = BTreeSet::new();
        let mut tags = BTreeSet::new();
        let mut ratings = BTreeSet::new();
        let mut years = BTreeSet::new();

        let collections: Vec<&Collection> = match scope {
            Some(collection) => vec![collection],
            None => self.collections.iter().map(Arc::as_ref).collect(),
        };

        for item in collections.iter().flat_map(|c| c.items.iter()) {
            if item.year != 0 {
                years.insert(item.year);
            }
            let Some(descriptor) = item.descriptor.load() else {
                continue;
            };
            genres.extend(descriptor.normalized_genres());
            tags.extend(descriptor.tags.iter().filter(|t| !t.is_empty()).cloned());
            if !descriptor.mpaa.is_empty() {
                ratings.insert(descriptor.mpaa.clone());
            }
            if item.year == 0 && descriptor.year != 0 {
                years.insert(descriptor.year);
            }
        }

        Details {
            genres: genres.into_iter().collect(),
            tags: tags.into_iter().collect(),
            official_ratings: ratings.into_iter().collect(),
            years: years.into_iter().collect(),
        }
    }
}
