//! Library browsing: views, item listings, single items, shows, search and
//! filter discovery.

use std::sync::Arc;

use axum::extract::{Path, Query, State};
use axum::{Extension, Json};
use nf_core::{collection_id, id_hash, Error, ExternalId, IdKind};
use nf_library::{Collection, ItemEntry, Library};
use serde::Serialize;

use crate::context::AppContext;
use crate::error::AppError;
use crate::session::Session;

use super::dto::{BaseItemDto, ItemsResult, NameIdPair, SearchHintResult};
use super::mapper::{Mapper, View};
use super::query::{self, paginate, QueryParams};
use super::resolve::{resolve_entity, Entity};

type Pairs = Query<Vec<(String, String)>>;

fn mapper<'a>(ctx: &'a AppContext, library: &'a Library, session: &'a Session) -> Mapper<'a> {
    Mapper::new(
        library,
        &ctx.playlists,
        &ctx.config.jellyfin.server_id,
        &session.user_id,
    )
}

/// Items of one collection, in scan order.
fn items_in<'a>(library: &'a Library, collection: &Collection) -> impl Iterator<Item = ItemEntry> + 'a {
    let source_id = collection.source_id;
    library
        .all_items()
        .filter(move |e| e.collection.source_id == source_id)
}

/// The collection named by `parentId`, if any.
fn collection_scope<'a>(
    library: &'a Library,
    params: &QueryParams,
) -> Result<Option<&'a Arc<Collection>>, Error> {
    let Some(parent) = params.get("parentId") else {
        return Ok(None);
    };
    let parent_id = ExternalId::decode(parent)?;
    if parent_id.kind != IdKind::Collection {
        return Err(Error::not_found("collection", parent));
    }
    parent_id
        .id
        .parse::<u32>()
        .ok()
        .and_then(|source_id| library.collection(source_id))
        .map(Some)
        .ok_or_else(|| Error::not_found("collection", parent))
}

fn paged(records: Vec<BaseItemDto>, params: &QueryParams) -> ItemsResult {
    let total = records.len();
    let (items, start_index) = paginate(records, params);
    ItemsResult {
        items,
        total_record_count: total,
        start_index,
    }
}

/// GET /UserViews and /Users/{user_id}/Views
pub async fn user_views(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
) -> Json<ItemsResult> {
    let library = ctx.library.snapshot();
    let mapper = mapper(&ctx, &library, &session);
    let mut views: Vec<BaseItemDto> = library
        .collections()
        .iter()
        .map(|c| mapper.collection(c))
        .collect();
    views.push(mapper.playlist_folder());
    Json(ItemsResult::all(views))
}

/// GET /Users/{user_id}/GroupingOptions
pub async fn grouping_options(State(ctx): State<AppContext>) -> Json<Vec<NameIdPair>> {
    let library = ctx.library.snapshot();
    Json(
        library
            .collections()
            .iter()
            .map(|c| NameIdPair {
                name: c.name.clone(),
                id: collection_id(c.source_id),
            })
            .collect(),
    )
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct VirtualFolder {
    pub name: String,
    pub item_id: String,
    pub primary_image_item_id: String,
    pub locations: Vec<String>,
    pub collection_type: String,
}

/// GET /Library/VirtualFolders
pub async fn virtual_folders(State(ctx): State<AppContext>) -> Json<Vec<VirtualFolder>> {
    let library = ctx.library.snapshot();
    Json(
        library
            .collections()
            .iter()
            .map(|c| {
                let id = collection_id(c.source_id);
                VirtualFolder {
                    name: c.name.clone(),
                    item_id: id.clone(),
                    primary_image_item_id: id,
                    locations: vec!["/".into()],
                    collection_type: c.kind.collection_type().into(),
                }
            })
            .collect(),
    )
}

/// GET /Items and /Users/{user_id}/Items
///
/// Without `parentId` the whole library goes through the filter, sort and
/// pagination pipeline. With one, the parent decides what its children are.
pub async fn list_items(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Query(pairs): Pairs,
) -> Result<Json<ItemsResult>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let mapper = mapper(&ctx, &library, &session);

    let Some(parent) = params.get("parentId") else {
        return Ok(Json(query::list_items(&mapper, library.all_items(), &params)));
    };
    let parent = ExternalId::decode(parent)?;
    let result = match resolve_entity(&library, &ctx.playlists, &session.user_id, &parent)? {
        Entity::Collection(collection) => {
            query::list_items(&mapper, items_in(&library, collection), &params)
        }
        Entity::PlaylistFolder => ItemsResult::all(
            ctx.playlists
                .list(&session.user_id)
                .iter()
                .map(|p| mapper.playlist(p))
                .collect(),
        ),
        Entity::Playlist(playlist) => paged(mapper.playlist_entries(&playlist), &params),
        Entity::Item(show) if show.item.is_show() => ItemsResult::all(mapper.seasons_of(show)),
        Entity::Season(season) => {
            let episodes = library
                .item(&season.item.id)
                .map(|show| mapper.episodes_of(show, Some(&season.season.id)))
                .unwrap_or_default();
            ItemsResult::all(episodes)
        }
        Entity::Item(_) | Entity::Episode(_) => ItemsResult::empty(),
    };
    Ok(Json(result))
}

/// GET /Items/{id}
pub async fn get_item(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<BaseItemDto>, AppError> {
    let library = ctx.library.snapshot();
    let mapper = mapper(&ctx, &library, &session);
    let external = ExternalId::decode(&id)?;
    let entity = resolve_entity(&library, &ctx.playlists, &session.user_id, &external)?;
    Ok(Json(mapper.record(&entity, View::Detail)))
}

/// GET /Users/{user_id}/Items/{id}: user-scoped alias for [`get_item`].
pub async fn user_scoped_get_item(
    state: State<AppContext>,
    session: Extension<Session>,
    Path((_user_id, id)): Path<(String, String)>,
) -> Result<Json<BaseItemDto>, AppError> {
    get_item(state, session, Path(id)).await
}

/// DELETE /Items/{id}
pub async fn delete_item(Path(id): Path<String>) -> Result<(), AppError> {
    tracing::info!(%id, "Refusing item deletion");
    Err(Error::Forbidden("Not implemented".into()).into())
}

/// GET /Items/Latest and /Users/{user_id}/Items/Latest. Returns a bare
/// array, not an envelope.
pub async fn latest(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Query(pairs): Pairs,
) -> Result<Json<Vec<BaseItemDto>>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let mapper = mapper(&ctx, &library, &session);
    let records = match collection_scope(&library, &params)? {
        Some(collection) => query::latest(&mapper, items_in(&library, collection), &params),
        None => query::latest(&mapper, library.all_items(), &params),
    };
    Ok(Json(records))
}

/// GET /Search/Hints
pub async fn search_hints(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Query(pairs): Pairs,
) -> Result<Json<SearchHintResult>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let mapper = mapper(&ctx, &library, &session);
    let result = match collection_scope(&library, &params)? {
        Some(collection) => query::search_hints(&mapper, items_in(&library, collection), &params),
        None => query::search_hints(&mapper, library.all_items(), &params),
    };
    Ok(Json(result))
}

fn show<'a>(library: &'a Library, id: &str) -> Result<&'a ItemEntry, Error> {
    library
        .item(id)
        .filter(|entry| entry.item.is_show())
        .ok_or_else(|| Error::not_found("show", id))
}

/// GET /Shows/{id}/Seasons
pub async fn show_seasons(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
) -> Result<Json<ItemsResult>, AppError> {
    let library = ctx.library.snapshot();
    let show = show(&library, &id)?;
    let mapper = mapper(&ctx, &library, &session);
    Ok(Json(ItemsResult::all(mapper.seasons_of(show))))
}

/// GET /Shows/{id}/Episodes?seasonId=
pub async fn show_episodes(
    State(ctx): State<AppContext>,
    Extension(session): Extension<Session>,
    Path(id): Path<String>,
    Query(pairs): Pairs,
) -> Result<Json<ItemsResult>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let show = show(&library, &id)?;
    let season_id = params
        .get("seasonId")
        .map(ExternalId::decode)
        .transpose()?
        .map(|season| season.id);
    let mapper = mapper(&ctx, &library, &session);
    Ok(Json(ItemsResult::all(
        mapper.episodes_of(show, season_id.as_deref()),
    )))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryFilters {
    pub genres: Vec<String>,
    pub tags: Vec<String>,
    pub official_ratings: Vec<String>,
    pub years: Vec<i32>,
}

/// GET /Items/Filters
pub async fn filters(
    State(ctx): State<AppContext>,
    Query(pairs): Pairs,
) -> Result<Json<QueryFilters>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let scope = collection_scope(&library, &params)?;
    let details = library.details(scope.map(Arc::as_ref));
    Ok(Json(QueryFilters {
        genres: details.genres,
        tags: details.tags,
        official_ratings: details.official_ratings,
        years: details.years,
    }))
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryFiltersV2 {
    pub genres: Vec<NameIdPair>,
    pub tags: Vec<String>,
}

/// GET /Items/Filters2
pub async fn filters2(
    State(ctx): State<AppContext>,
    Query(pairs): Pairs,
) -> Result<Json<QueryFiltersV2>, AppError> {
    let params = QueryParams::from(pairs);
    let library = ctx.library.snapshot();
    let scope = collection_scope(&library, &params)?;
    let details = library.details(scope.map(Arc::as_ref));
    Ok(Json(QueryFiltersV2 {
        genres: details
            .genres
            .into_iter()
            .map(|name| NameIdPair {
                id: id_hash(&name),
                name,
            })
            .collect(),
        tags: Vec::new(),
    }))
}

/// Resume, NextUp, Similar, Suggestions, Persons and MediaSegments. Play
/// state and people are not tracked, so these are always empty.
pub async fn empty_result() -> Json<ItemsResult> {
    Json(ItemsResult::empty())
}
