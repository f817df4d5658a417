//! Content item API endpoints
//!
//! - GET /api/v1/feed - the live feed for clients
//! - POST /api/v1/items - create an item (with options for polls)
//! - GET|PUT|DELETE /api/v1/items/{id}
//! - POST /api/v1/items/{id}/review|publish|archive - lifecycle transitions
//! - POST /api/v1/items/{id}/resolve-region - re-run region resolution
//! - GET|POST /api/v1/items/{id}/options, PUT|DELETE /api/v1/items/options/{id}
//! - GET /api/v1/items/{id}/tags, POST|DELETE /api/v1/items/{id}/tags/{tag_id}

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::models::{
    AnswerOption, ContentItem, ContentKind, CreateAnswerOptionInput, CreateContentItemInput,
    ListParams, Locale, Tag, UpdateAnswerOptionInput, UpdateContentItemInput,
};
use crate::services::ItemDetail;

/// Query parameters for the live feed
#[derive(Debug, Deserialize)]
pub struct FeedQuery {
    /// Audience locale (required)
    pub locale: String,
    /// Audience region code (optional, absent means global-only)
    pub region: Option<String>,
    /// Kind filter (optional)
    pub kind: Option<String>,
    #[serde(default = "default_page")]
    pub page: u32,
    #[serde(default = "default_per_page")]
    pub per_page: u32,
}

fn default_page() -> u32 {
    1
}

fn default_per_page() -> u32 {
    20
}

/// Request body for creating an item
#[derive(Debug, Deserialize)]
pub struct CreateItemRequest {
    #[serde(flatten)]
    pub item: CreateContentItemInput,
    /// Answer options, required for Sunday polls
    #[serde(default)]
    pub options: Vec<CreateAnswerOptionInput>,
}

/// One page of the live feed, options embedded
#[derive(Debug, Serialize)]
pub struct FeedResponse {
    pub items: Vec<ItemDetail>,
    pub total: i64,
    pub page: u32,
    pub per_page: u32,
    pub total_pages: u32,
}

/// Build the items router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", post(create_item))
        .route("/{id}", get(get_item).put(update_item).delete(delete_item))
        .route("/{id}/review", post(review_item))
        .route("/{id}/publish", post(publish_item))
        .route("/{id}/archive", post(archive_item))
        .route("/{id}/resolve-region", post(resolve_region))
        .route("/{id}/options", get(list_options).post(add_option))
        .route("/options/{id}", axum::routing::put(update_option).delete(remove_option))
        .route("/{id}/tags", get(list_item_tags))
        .route("/{id}/tags/{tag_id}", post(attach_tag).delete(detach_tag))
}

fn parse_locale(value: &str) -> Result<Locale, ApiError> {
    Locale::from_str(value)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown locale: {}", value)))
}

fn parse_kind(value: &str) -> Result<ContentKind, ApiError> {
    ContentKind::from_str(value)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown content kind: {}", value)))
}

/// GET /api/v1/feed
pub async fn live_feed_handler(
    State(state): State<AppState>,
    Query(query): Query<FeedQuery>,
) -> Result<Json<FeedResponse>, ApiError> {
    let locale = parse_locale(&query.locale)?;
    let kind = match &query.kind {
        Some(value) => Some(parse_kind(value)?),
        None => None,
    };
    let region_id = match &query.region {
        Some(code) => {
            let region = state
                .region_service
                .get_by_code(code)
                .await?
                .ok_or_else(|| ApiError::not_found(format!("Region not found: {}", code)))?;
            Some(region.id)
        }
        None => None,
    };

    let params = ListParams::new(query.page, query.per_page);
    let page = state
        .item_service
        .live_feed(locale, region_id, kind, &params)
        .await?;

    let total = page.total;
    let total_pages = page.total_pages();
    let mut items = Vec::with_capacity(page.items.len());
    for item in page.items {
        let options = if item.kind == ContentKind::SundayPoll {
            state.item_service.list_options(item.id).await?
        } else {
            Vec::new()
        };
        items.push(ItemDetail { item, options });
    }

    Ok(Json(FeedResponse {
        items,
        total,
        page: params.page,
        per_page: params.per_page,
        total_pages,
    }))
}

/// POST /api/v1/items
async fn create_item(
    State(state): State<AppState>,
    Json(body): Json<CreateItemRequest>,
) -> Result<(StatusCode, Json<ItemDetail>), ApiError> {
    let detail = state.item_service.create(&body.item, &body.options).await?;
    Ok((StatusCode::CREATED, Json(detail)))
}

/// GET /api/v1/items/{id}
async fn get_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ItemDetail>, ApiError> {
    let detail = state.item_service.get(id).await?;
    Ok(Json(detail))
}

/// PUT /api/v1/items/{id}
async fn update_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateContentItemInput>,
) -> Result<Json<ContentItem>, ApiError> {
    let item = state.item_service.update(id, &body).await?;
    Ok(Json(item))
}

/// DELETE /api/v1/items/{id}
async fn delete_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.item_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// POST /api/v1/items/{id}/review
async fn review_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContentItem>, ApiError> {
    let item = state.item_service.submit_for_review(id).await?;
    Ok(Json(item))
}

/// POST /api/v1/items/{id}/publish
async fn publish_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContentItem>, ApiError> {
    let item = state.item_service.publish(id).await?;
    Ok(Json(item))
}

/// POST /api/v1/items/{id}/archive
async fn archive_item(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<ContentItem>, ApiError> {
    let item = state.item_service.archive(id).await?;
    Ok(Json(item))
}

/// POST /api/v1/items/{id}/resolve-region
async fn resolve_region(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<serde_json::Value>, ApiError> {
    let region_id = state.item_service.resolve_region(id).await?;
    Ok(Json(serde_json::json!({ "effective_region_id": region_id })))
}

/// GET /api/v1/items/{id}/options
async fn list_options(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<AnswerOption>>, ApiError> {
    let options = state.item_service.list_options(id).await?;
    Ok(Json(options))
}

/// POST /api/v1/items/{id}/options
async fn add_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<CreateAnswerOptionInput>,
) -> Result<(StatusCode, Json<AnswerOption>), ApiError> {
    let option = state.item_service.add_option(id, &body).await?;
    Ok((StatusCode::CREATED, Json(option)))
}

/// PUT /api/v1/items/options/{id}
async fn update_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateAnswerOptionInput>,
) -> Result<Json<AnswerOption>, ApiError> {
    let option = state.item_service.update_option(id, &body).await?;
    Ok(Json(option))
}

/// DELETE /api/v1/items/options/{id}
async fn remove_option(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.item_service.remove_option(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/items/{id}/tags
async fn list_item_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.tag_service.list_for_item(id).await?;
    Ok(Json(tags))
}

/// POST /api/v1/items/{id}/tags/{tag_id}
async fn attach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    // ensure the item exists so the join insert cannot dangle
    state.item_service.get(id).await?;
    state.tag_service.attach_to_item(tag_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/items/{id}/tags/{tag_id}
async fn detach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.detach_from_item(tag_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
