//! Tag API endpoints
//!
//! - GET /api/v1/tags - tag list, optionally with usage counts
//! - POST /api/v1/tags - create or reuse a tag by label
//! - DELETE /api/v1/tags/{id} - delete a tag

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    routing::{delete, get},
    Json, Router,
};
use serde::{Deserialize, Serialize};

use crate::api::{ApiError, AppState};
use crate::models::Tag;

/// Query parameters for the tag list
#[derive(Debug, Deserialize)]
pub struct ListTagsQuery {
    /// If true, return usage counts sorted by frequency
    #[serde(default)]
    pub counts: bool,
    /// Limit when counts are requested
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_limit() -> usize {
    50
}

/// Request body for creating a tag
#[derive(Debug, Deserialize)]
pub struct CreateTagRequest {
    pub label: String,
}

/// Response for a single tag
#[derive(Debug, Serialize)]
pub struct TagResponse {
    pub id: i64,
    pub slug: String,
    pub label: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub item_count: Option<i64>,
}

impl From<Tag> for TagResponse {
    fn from(tag: Tag) -> Self {
        Self {
            id: tag.id,
            slug: tag.slug,
            label: tag.label,
            item_count: None,
        }
    }
}

/// Build the tags router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_tags).post(create_tag))
        .route("/{id}", delete(delete_tag))
}

/// GET /api/v1/tags
async fn list_tags(
    State(state): State<AppState>,
    Query(query): Query<ListTagsQuery>,
) -> Result<Json<Vec<TagResponse>>, ApiError> {
    let tags = if query.counts {
        state
            .tag_service
            .list_with_counts(query.limit)
            .await?
            .into_iter()
            .map(|twc| TagResponse {
                id: twc.tag.id,
                slug: twc.tag.slug,
                label: twc.tag.label,
                item_count: Some(twc.item_count),
            })
            .collect()
    } else {
        state
            .tag_service
            .list()
            .await?
            .into_iter()
            .map(TagResponse::from)
            .collect()
    };

    Ok(Json(tags))
}

/// POST /api/v1/tags
async fn create_tag(
    State(state): State<AppState>,
    Json(body): Json<CreateTagRequest>,
) -> Result<(StatusCode, Json<TagResponse>), ApiError> {
    let tag = state.tag_service.create_or_get(&body.label).await?;
    Ok((StatusCode::CREATED, Json(tag.into())))
}

/// DELETE /api/v1/tags/{id}
async fn delete_tag(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.tag_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
