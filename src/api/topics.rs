//! Topic API endpoints
//!
//! - GET /api/v1/topics - paged topic list
//! - POST /api/v1/topics - create a topic
//! - GET /api/v1/topics/{slug} - get a topic by slug
//! - PUT /api/v1/topics/{id} - update a topic
//! - DELETE /api/v1/topics/{id} - delete a topic
//! - GET /api/v1/topics/{id}/items - list the topic's content items
//! - GET /api/v1/topics/{id}/tags - list attached tags
//! - POST|DELETE /api/v1/topics/{id}/tags/{tag_id} - attach or detach a tag

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::models::{
    ContentItem, CreateTopicInput, ListParams, Locale, PagedResult, Tag, Topic, UpdateTopicInput,
};

/// Query parameters for the topic list
#[derive(Debug, Deserialize)]
pub struct ListTopicsQuery {
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

/// Request body for creating a topic
#[derive(Debug, Deserialize)]
pub struct CreateTopicRequest {
    pub title: String,
    pub locale: String,
    pub slug: Option<String>,
    pub description: Option<String>,
}

/// Request body for updating a topic
#[derive(Debug, Deserialize)]
pub struct UpdateTopicRequest {
    pub title: Option<String>,
    pub description: Option<String>,
    pub locale: Option<String>,
}

/// Build the topics router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_topics).post(create_topic))
        // GET looks up by slug, PUT/DELETE address by numeric ID
        .route("/{key}", get(get_topic).put(update_topic).delete(delete_topic))
        .route("/{id}/items", get(list_topic_items))
        .route("/{id}/tags", get(list_topic_tags))
        .route("/{id}/tags/{tag_id}", post(attach_tag).delete(detach_tag))
}

fn parse_locale(value: &str) -> Result<Locale, ApiError> {
    Locale::from_str(value)
        .ok_or_else(|| ApiError::validation_error(format!("Unknown locale: {}", value)))
}

/// GET /api/v1/topics
async fn list_topics(
    State(state): State<AppState>,
    Query(query): Query<ListTopicsQuery>,
) -> Result<Json<PagedResult<Topic>>, ApiError> {
    let params = ListParams::new(query.page, query.per_page);
    let page = state.topic_service.list(&params).await?;
    Ok(Json(page))
}

/// POST /api/v1/topics
async fn create_topic(
    State(state): State<AppState>,
    Json(body): Json<CreateTopicRequest>,
) -> Result<(StatusCode, Json<Topic>), ApiError> {
    let locale = parse_locale(&body.locale)?;
    let input = CreateTopicInput {
        title: body.title,
        locale,
        slug: body.slug,
        description: body.description,
    };
    let topic = state.topic_service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(topic)))
}

/// GET /api/v1/topics/{slug}
async fn get_topic(
    State(state): State<AppState>,
    Path(slug): Path<String>,
) -> Result<Json<Topic>, ApiError> {
    let topic = state
        .topic_service
        .get_by_slug(&slug)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Topic not found: {}", slug)))?;
    Ok(Json(topic))
}

/// PUT /api/v1/topics/{id}
async fn update_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateTopicRequest>,
) -> Result<Json<Topic>, ApiError> {
    let locale = match &body.locale {
        Some(value) => Some(parse_locale(value)?),
        None => None,
    };
    let input = UpdateTopicInput {
        title: body.title,
        description: body.description,
        locale,
    };
    let topic = state.topic_service.update(id, &input).await?;
    Ok(Json(topic))
}

/// DELETE /api/v1/topics/{id}
async fn delete_topic(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.topic_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/v1/topics/{id}/items
async fn list_topic_items(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<ContentItem>>, ApiError> {
    // 404 for unknown topics instead of an empty list
    state
        .topic_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Topic not found: {}", id)))?;

    let items = state.item_service.list_by_topic(id).await?;
    Ok(Json(items))
}

/// GET /api/v1/topics/{id}/tags
async fn list_topic_tags(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<Vec<Tag>>, ApiError> {
    let tags = state.tag_service.list_for_topic(id).await?;
    Ok(Json(tags))
}

/// POST /api/v1/topics/{id}/tags/{tag_id}
async fn attach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state
        .topic_service
        .get_by_id(id)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Topic not found: {}", id)))?;

    state.tag_service.attach_to_topic(tag_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}

/// DELETE /api/v1/topics/{id}/tags/{tag_id}
async fn detach_tag(
    State(state): State<AppState>,
    Path((id, tag_id)): Path<(i64, i64)>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.detach_from_topic(tag_id, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
