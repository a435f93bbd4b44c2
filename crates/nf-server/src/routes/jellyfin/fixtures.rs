//! In-memory catalog shared by the unit tests of this module.

use std::path::PathBuf;
use std::sync::Arc;

use chrono::{DateTime, TimeZone, Utc};
use nf_core::config::CollectionKind;
use nf_library::{
    Collection, Descriptor, DescriptorSlot, Episode, Item, ItemKind, Library, Season,
};

fn at(secs: i64) -> DateTime<Utc> {
    Utc.timestamp_opt(secs, 0).single().unwrap()
}

fn movie(id: &str, name: &str, year: i32, added: i64) -> Item {
    Item {
        id: id.into(),
        name: name.into(),
        year,
        sort_name: String::new(),
        rating: None,
        kind: ItemKind::Movie,
        video: Some(PathBuf::from(format!("/movies/{name}/{id}.mp4"))),
        poster: None,
        fanart: None,
        descriptor: DescriptorSlot::default(),
        first_video: at(added),
        seasons: Vec::new(),
    }
}

fn episode(id: &str, no: u32, name: &str, descriptor: DescriptorSlot) -> Arc<Episode> {
    Arc::new(Episode {
        id: id.into(),
        season_no: 1,
        episode_no: no,
        name: name.into(),
        video: PathBuf::from(format!("/shows/The Expanse/S01/{id}.mp4")),
        thumb: None,
        first_seen: at(1_700_000_000 + i64::from(no)),
        descriptor,
    })
}

/// Movies (source 1): Alien (1979), Aliens (year only in its descriptor),
/// Blade Runner (1982). Shows (source 2): The Expanse with one season of two
/// episodes; the second episode has its own descriptor.
pub fn library() -> Library {
    let alien = Item {
        rating: Some(8.5),
        poster: Some(PathBuf::from("/movies/Alien/poster.jpg")),
        fanart: Some(PathBuf::from("/movies/Alien/fanart.jpg")),
        ..movie("m1", "Alien", 1979, 1_600_000_000)
    };
    let aliens = Item {
        descriptor: DescriptorSlot::with(Descriptor {
            year: 1986,
            rating: 8.4,
            ..Default::default()
        }),
        ..movie("m2", "Aliens", 0, 1_650_000_000)
    };
    let blade_runner = movie("m3", "Blade Runner", 1982, 1_620_000_000);

    let show_descriptor = Descriptor {
        title: "The Expanse".into(),
        mpaa: "TV-14".into(),
        rating: 8.4,
        genres: vec!["Sci-Fi".into()],
        studio: "Syfy".into(),
        ..Default::default()
    };
    let episode_descriptor = Descriptor {
        title: "Remember the Cant".into(),
        season: "1".into(),
        episode: "2".into(),
        mpaa: "TV-MA".into(),
        rating: 9.1,
        genres: vec!["Thriller".into()],
        ..Default::default()
    };
    let season = Arc::new(Season {
        id: "s1".into(),
        season_no: 1,
        poster: None,
        episodes: vec![
            episode("e1", 1, "Dulcinea", DescriptorSlot::default()),
            episode("e2", 2, "The Big Empty", DescriptorSlot::with(episode_descriptor)),
        ],
    });
    let show = Item {
        kind: ItemKind::Show,
        video: None,
        poster: Some(PathBuf::from("/shows/The Expanse/poster.jpg")),
        descriptor: DescriptorSlot::with(show_descriptor),
        seasons: vec![season],
        ..movie("show1", "The Expanse", 2015, 1_700_000_001)
    };

    Library::new(vec![
        Collection {
            name: "Movies".into(),
            kind: CollectionKind::Movies,
            source_id: 1,
            directory: PathBuf::from("/movies"),
            items: vec![Arc::new(alien), Arc::new(aliens), Arc::new(blade_runner)],
        },
        Collection {
            name: "Shows".into(),
            kind: CollectionKind::Shows,
            source_id: 2,
            directory: PathBuf::from("/shows"),
            items: vec![Arc::new(show)],
        },
    ])
}
