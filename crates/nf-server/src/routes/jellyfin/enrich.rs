//! Merge sidecar descriptor fields into a presentation record.
//!
//! Each field is copied only when the descriptor actually has a value, so a
//! sparse descriptor never blanks out defaults taken from the scan. Episodes
//! are merged twice (show, then episode) and the later pass wins.

use chrono::{DateTime, NaiveDate, NaiveDateTime, Utc};
use nf_core::id_hash;
use nf_library::Descriptor;

use super::dto::{BaseItemDto, NameIdPair, PersonDto};
use super::resolve::{TAG_FILE, TAG_REDIRECT};

/// Which descriptor fields a merge pass may copy.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MergeScope {
    /// Everything the descriptor carries.
    Full,
    /// Series-level defaults an episode inherits from its show: genres,
    /// studio and cast.
    Inherited,
}

/// Date layouts tried in order; the first that parses wins.
const DATE_FORMATS: &[(&str, bool)] = &[
    ("%Y-%m-%d", false),
    ("%Y/%m/%d", false),
    ("%Y-%m-%d %H:%M:%S", true),
    ("%Y/%m/%d %H:%M:%S", true),
    ("%d %b %Y", false),
    ("%d %b %Y %H:%M:%S", true),
];

/// Parse a descriptor date string, interpreted as UTC.
pub fn parse_date(input: &str) -> Option<DateTime<Utc>> {
    let input = input.trim();
    DATE_FORMATS.iter().find_map(|(format, has_time)| {
        if *has_time {
            NaiveDateTime::parse_from_str(input, format).ok()
        } else {
            NaiveDate::parse_from_str(input, format)
                .ok()
                .and_then(|d| d.and_hms_opt(0, 0, 0))
        }
        .map(|naive| naive.and_utc())
    })
}

/// Image tag for an actor thumbnail: remote URLs are redirected, absolute
/// local paths are served from disk.
pub fn person_image_tag(thumb: &str) -> Option<String> {
    if thumb.starts_with("http://") || thumb.starts_with("https://") {
        Some(format!("{TAG_REDIRECT}{thumb}"))
    } else if thumb.starts_with('/') {
        Some(format!("{TAG_FILE}{thumb}"))
    } else {
        None
    }
}

fn parse_number(field: &str, value: &str) -> Option<u32> {
    match value.trim().parse() {
        Ok(n) => Some(n),
        Err(_) => {
            tracing::debug!(field, value, "Ignoring non-numeric descriptor value");
            None
        }
    }
}

/// Copy descriptor fields into `record` according to `scope`.
pub fn merge(record: &mut BaseItemDto, descriptor: &Descriptor, scope: MergeScope) {
    if scope == MergeScope::Full {
        merge_details(record, descriptor);
    }

    let genres = descriptor.normalized_genres();
    if !genres.is_empty() {
        record.genre_items = genres
            .iter()
            .map(|g| NameIdPair {
                name: g.clone(),
                id: id_hash(g),
            })
            .collect();
        record.genres = genres;
    }

    if !descriptor.studio.is_empty() {
        record.studios = vec![NameIdPair {
            name: descriptor.studio.clone(),
            id: id_hash(&descriptor.studio),
        }];
    }

    if !descriptor.actors.is_empty() {
        record.people = descriptor
            .actors
            .iter()
            .filter(|a| !a.name.is_empty())
            .map(|a| PersonDto {
                name: a.name.clone(),
                id: id_hash(&a.name),
                role: a.role.clone(),
                person_type: "Actor".into(),
                primary_image_tag: person_image_tag(&a.thumb),
            })
            .collect();
    }
}

fn merge_details(record: &mut BaseItemDto, d: &Descriptor) {
    if !d.title.is_empty() {
        record.name = d.title.clone();
    }
    if !d.plot.is_empty() {
        record.overview = Some(d.plot.clone());
    }
    if !d.tagline.is_empty() {
        record.taglines = vec![d.tagline.clone()];
    }

    if !d.season.is_empty() {
        if let Some(season) = parse_number("season", &d.season) {
            record.parent_index_number = Some(season);
            record.season_name = Some(format!("Season {season}"));
        }
    }
    if !d.episode.is_empty() {
        if let Some(episode) = parse_number("episode", &d.episode) {
            record.index_number = Some(episode);
        }
    }
    match (record.parent_index_number, record.index_number) {
        (Some(season), Some(episode)) if season != 0 && episode != 0 => {
            record.sort_name = Some(format!("{season:03} - {episode:04} - {}", record.name));
        }
        _ => {}
    }

    if !d.mpaa.is_empty() {
        record.official_rating = Some(d.mpaa.clone());
    }
    if d.rating != 0.0 {
        record.community_rating = Some((f64::from(d.rating) * 10.0).round() / 10.0);
    }
    if d.year != 0 {
        record.production_year = Some(d.year);
    }

    for (field, value) in [("premiered", &d.premiered), ("aired", &d.aired)] {
        if value.is_empty() {
            continue;
        }
        match parse_date(value) {
            Some(date) => record.premiere_date = Some(date),
            None => tracing::debug!(field, value = %value, "Unparseable descriptor date"),
        }
    }
}
