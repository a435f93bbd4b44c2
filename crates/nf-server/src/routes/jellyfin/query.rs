//! Query parameter handling for item listings: filtering, sorting and
//! pagination.
//!
//! Parameter names are matched case-insensitively since clients disagree on
//! `parentId` vs `ParentId`. Malformed values never fail a request; they are
//! logged and ignored.

use std::cmp::Ordering;
use std::collections::HashMap;

use nf_library::{ItemEntry, ItemKind};

use super::dto::{BaseItemDto, ItemsResult, SearchHintResult};
use super::mapper::{Mapper, View};

/// Request query parameters keyed by lowercase name. Repeated keys are
/// joined with commas.
#[derive(Debug, Clone, Default)]
pub struct QueryParams {
    values: HashMap<String, String>,
}

impl From<Vec<(String, String)>> for QueryParams {
    fn from(pairs: Vec<(String, String)>) -> Self {
        let mut values: HashMap<String, String> = HashMap::new();
        for (key, value) in pairs {
            values
                .entry(key.to_ascii_lowercase())
                .and_modify(|existing| {
                    existing.push(',');
                    existing.push_str(&value);
                })
                .or_insert(value);
        }
        Self { values }
    }
}

impl QueryParams {
    /// Non-empty value of `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.values
            .get(&key.to_ascii_lowercase())
            .map(String::as_str)
            .filter(|v| !v.is_empty())
    }

    pub fn int(&self, key: &str) -> Option<i64> {
        let raw = self.get(key)?;
        match raw.trim().parse() {
            Ok(n) => Some(n),
            Err(_) => {
                tracing::debug!(key, value = raw, "Ignoring non-numeric query parameter");
                None
            }
        }
    }

    /// Comma-separated values of `key`, trimmed, empties dropped.
    pub fn list(&self, key: &str) -> Vec<&str> {
        self.get(key)
            .map(|v| v.split(',').map(str::trim).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }
}

/// Year used for filtering: the scanned year, else the descriptor's.
fn effective_year(entry: &ItemEntry) -> i32 {
    if entry.item.year != 0 {
        return entry.item.year;
    }
    entry.item.descriptor.load().map_or(0, |d| d.year)
}

/// `includeItemTypes` and `years` filters. Unknown type names match nothing.
pub fn matches_filters(entry: &ItemEntry, params: &QueryParams) -> bool {
    let types = params.list("includeItemTypes");
    if !types.is_empty() {
        let kind = entry.item.kind;
        let wanted = types.iter().any(|t| {
            (t.eq_ignore_ascii_case("Movie") && kind == ItemKind::Movie)
                || (t.eq_ignore_ascii_case("Series") && kind == ItemKind::Show)
        });
        if !wanted {
            return false;
        }
    }

    let years = params.list("years");
    if !years.is_empty() {
        let year = effective_year(entry);
        let wanted = years
            .iter()
            .filter_map(|y| y.parse::<i32>().ok())
            .any(|y| y == year);
        if !wanted {
            return false;
        }
    }
    true
}

/// Case-insensitive substring match of `searchTerm` against the name.
pub fn matches_search(entry: &ItemEntry, params: &QueryParams) -> bool {
    params.get("searchTerm").map_or(true, |term| {
        entry
            .item
            .name
            .to_lowercase()
            .contains(&term.to_lowercase())
    })
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SortKey {
    SortName,
    ProductionYear,
    CriticRating,
}

fn sort_keys(params: &QueryParams) -> Vec<SortKey> {
    params
        .list("sortBy")
        .into_iter()
        .filter_map(|key| match key.to_ascii_lowercase().as_str() {
            "default" | "sortname" | "seriessortname" => Some(SortKey::SortName),
            "productionyear" => Some(SortKey::ProductionYear),
            "criticrating" => Some(SortKey::CriticRating),
            _ => {
                tracing::debug!(key, "Ignoring unsupported sort key");
                None
            }
        })
        .collect()
}

fn sort_name(record: &BaseItemDto) -> String {
    record
        .sort_name
        .as_deref()
        .unwrap_or(&record.name)
        .to_lowercase()
}

fn compare(key: SortKey, a: &BaseItemDto, b: &BaseItemDto) -> Ordering {
    match key {
        SortKey::SortName => sort_name(a).cmp(&sort_name(b)),
        SortKey::ProductionYear => a.production_year.cmp(&b.production_year),
        SortKey::CriticRating => a
            .critic_rating
            .unwrap_or(0.0)
            .total_cmp(&b.critic_rating.unwrap_or(0.0)),
    }
}

/// Sort by `sortBy` keys in order, all in one `sortOrder` direction.
/// Equal records keep their input order.
pub fn sort_records(records: &mut [BaseItemDto], params: &QueryParams) {
    let keys = sort_keys(params);
    if keys.is_empty() {
        return;
    }
    let descending = params
        .list("sortOrder")
        .first()
        .is_some_and(|o| o.eq_ignore_ascii_case("Descending"));

    records.sort_by(|a, b| {
        keys.iter()
            .map(|key| compare(*key, a, b))
            .find(|ord| ord.is_ne())
            .map_or(Ordering::Equal, |ord| if descending { ord.reverse() } else { ord })
    });
}

/// Apply `startIndex` and `limit`. Returns the page and the effective start.
/// Out-of-range or negative values are ignored.
pub fn paginate<T>(mut items: Vec<T>, params: &QueryParams) -> (Vec<T>, usize) {
    let mut start = 0;
    if let Some(s) = params.int("startIndex") {
        match usize::try_from(s) {
            Ok(s) if s < items.len() => {
                items.drain(..s);
                start = s;
            }
            _ => tracing::debug!(start_index = s, "Ignoring out-of-range startIndex"),
        }
    }
    if let Some(limit) = params.int("limit") {
        match usize::try_from(limit) {
            Ok(limit) if limit > 0 => items.truncate(limit),
            _ => tracing::debug!(limit, "Ignoring non-positive limit"),
        }
    }
    (items, start)
}

/// Newest first by premiere date; undated records last.
pub fn sort_latest(records: &mut [BaseItemDto]) {
    records.sort_by(|a, b| b.premiere_date.cmp(&a.premiere_date));
}

fn filtered_records<I>(mapper: &Mapper<'_>, candidates: I, params: &QueryParams) -> Vec<BaseItemDto>
where
    I: IntoIterator<Item = ItemEntry>,
{
    let mut records: Vec<BaseItemDto> = candidates
        .into_iter()
        .filter(|e| matches_filters(e, params) && matches_search(e, params))
        .map(|e| mapper.item(&e, View::List))
        .collect();
    sort_records(&mut records, params);
    records
}

/// Filter, sort and paginate a listing. The total counts matches before
/// pagination.
pub fn list_items<I>(mapper: &Mapper<'_>, candidates: I, params: &QueryParams) -> ItemsResult
where
    I: IntoIterator<Item = ItemEntry>,
{
    let records = filtered_records(mapper, candidates, params);
    let total = records.len();
    let (items, start) = paginate(records, params);
    ItemsResult {
        items,
        total_record_count: total,
        start_index: start,
    }
}

/// Same pipeline as [`list_items`], in the search hint envelope.
pub fn search_hints<I>(mapper: &Mapper<'_>, candidates: I, params: &QueryParams) -> SearchHintResult
where
    I: IntoIterator<Item = ItemEntry>,
{
    let records = filtered_records(mapper, candidates, params);
    let total = records.len();
    let (search_hints, _) = paginate(records, params);
    SearchHintResult {
        search_hints,
        total_record_count: total,
    }
}

/// Most recently added items, filtered but without search.
pub fn latest<I>(mapper: &Mapper<'_>, candidates: I, params: &QueryParams) -> Vec<BaseItemDto>
where
    I: IntoIterator<Item = ItemEntry>,
{
    let mut records: Vec<BaseItemDto> = candidates
        .into_iter()
        .filter(|e| matches_filters(e, params))
        .map(|e| mapper.item(&e, View::List))
        .collect();
    sort_latest(&mut records);
    paginate(records, params).0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::playlists::PlaylistStore;
    use crate::routes::jellyfin::fixtures;

    fn params(pairs: &[(&str, &str)]) -> QueryParams {
        QueryParams::from(
            pairs
                .iter()
                .map(|(k, v)| (k.to_string(), v.to_string()))
                .collect::<Vec<_>>(),
        )
    }

    fn record(id: &str, name: &str) -> BaseItemDto {
        BaseItemDto {
            id: id.into(),
            name: name.into(),
            ..Default::default()
        }
    }

    fn ids(records: &[BaseItemDto]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn keys_are_case_insensitive_and_repeats_join() {
        let p = params(&[("ParentId", "collection_1"), ("years", "1979"), ("Years", "1982")]);
        assert_eq!(p.get("parentId"), Some("collection_1"));
        assert_eq!(p.list("years"), ["1979", "1982"]);
        assert_eq!(params(&[("limit", "ten")]).int("limit"), None);
        assert_eq!(params(&[("limit", "")]).get("limit"), None);
    }

    #[test]
    fn sort_ties_keep_input_order() {
        let mut records = vec![record("b", "Alpha"), record("a", "Alpha")];
        sort_records(&mut records, &params(&[("sortBy", "SortName")]));
        assert_eq!(ids(&records), ["b", "a"]);

        sort_records(
            &mut records,
            &params(&[("sortBy", "SortName"), ("sortOrder", "Descending")]),
        );
        assert_eq!(ids(&records), ["b", "a"]);
    }

    #[test]
    fn multi_key_sort_with_shared_direction() {
        let mut records = vec![
            BaseItemDto { production_year: Some(1982), ..record("x", "Blade Runner") },
            BaseItemDto { production_year: Some(1979), ..record("y", "alien") },
            BaseItemDto { production_year: Some(1979), ..record("z", "Zulu") },
        ];
        sort_records(&mut records, &params(&[("sortBy", "ProductionYear,SortName")]));
        assert_eq!(ids(&records), ["y", "z", "x"]);

        sort_records(
            &mut records,
            &params(&[("sortBy", "ProductionYear,SortName"), ("sortOrder", "Descending")]),
        );
        assert_eq!(ids(&records), ["x", "z", "y"]);

        // Unknown keys are skipped, leaving the order untouched.
        sort_records(&mut records, &params(&[("sortBy", "Random")]));
        assert_eq!(ids(&records), ["x", "z", "y"]);
    }

    #[test]
    fn paginate_slices_and_reports_start() {
        let items: Vec<u32> = (0..10).collect();
        let (page, start) = paginate(items.clone(), &params(&[("startIndex", "5"), ("limit", "3")]));
        assert_eq!(page, [5, 6, 7]);
        assert_eq!(start, 5);

        let (page, start) = paginate(items.clone(), &params(&[("startIndex", "12")]));
        assert_eq!(page.len(), 10);
        assert_eq!(start, 0);

        let (page, _) = paginate(items, &params(&[("limit", "-1")]));
        assert_eq!(page.len(), 10);
    }

    #[test]
    fn listing_filters_by_type_year_and_search() {
        let library = fixtures::library();
        let playlists = PlaylistStore::new();
        let mapper = Mapper::new(&library, &playlists, "srv", "user");

        let result = list_items(&mapper, library.all_items(), &params(&[("includeItemTypes", "Series")]));
        assert_eq!(ids(&result.items), ["show1"]);

        let result = list_items(&mapper, library.all_items(), &params(&[("includeItemTypes", "BoxSet")]));
        assert_eq!(result.total_record_count, 0);

        // Aliens has its year only in the descriptor.
        let result = list_items(&mapper, library.all_items(), &params(&[("years", "1986,1979")]));
        assert_eq!(ids(&result.items), ["m1", "m2"]);

        let result = search_hints(&mapper, library.all_items(), &params(&[("searchTerm", "ALIEN")]));
        assert_eq!(result.total_record_count, 2);
    }

    #[test]
    fn total_counts_before_pagination() {
        let library = fixtures::library();
        let playlists = PlaylistStore::new();
        let mapper = Mapper::new(&library, &playlists, "srv", "user");
        let result = list_items(
            &mapper,
            library.all_items(),
            &params(&[("sortBy", "SortName"), ("startIndex", "1"), ("limit", "2")]),
        );
        assert_eq!(result.total_record_count, 4);
        assert_eq!(result.start_index, 1);
        assert_eq!(ids(&result.items), ["m2", "m3"]);
    }

    #[test]
    fn latest_is_newest_first() {
        let library = fixtures::library();
        let playlists = PlaylistStore::new();
        let mapper = Mapper::new(&library, &playlists, "srv", "user");
        let records = latest(&mapper, library.all_items(), &params(&[("limit", "3")]));
        assert_eq!(ids(&records), ["show1", "m2", "m3"]);
    }
}
