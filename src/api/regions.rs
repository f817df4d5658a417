//! Region API endpoints
//!
//! - GET /api/v1/regions - list the region catalog
//! - POST /api/v1/regions - create a region
//! - GET /api/v1/regions/{code} - get a region by code
//! - PUT /api/v1/regions/{id} - update a region
//! - DELETE /api/v1/regions/{id} - delete a region

use axum::{
    extract::{Path, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use serde::Deserialize;

use crate::api::{ApiError, AppState};
use crate::models::{CreateRegionInput, Region, UpdateRegionInput};

/// Request body for creating a region
#[derive(Debug, Deserialize)]
pub struct CreateRegionRequest {
    pub code: String,
    pub name: String,
    #[serde(default)]
    pub level: i32,
}

/// Request body for updating a region
#[derive(Debug, Deserialize)]
pub struct UpdateRegionRequest {
    pub name: Option<String>,
    pub level: Option<i32>,
}

/// Build the regions router
pub fn router() -> Router<AppState> {
    Router::new()
        .route("/", get(list_regions).post(create_region))
        // GET looks up by code, PUT/DELETE address by numeric ID
        .route("/{key}", get(get_region).put(update_region).delete(delete_region))
}

/// GET /api/v1/regions
async fn list_regions(State(state): State<AppState>) -> Result<Json<Vec<Region>>, ApiError> {
    let regions = state.region_service.list().await?;
    Ok(Json(regions))
}

/// POST /api/v1/regions
async fn create_region(
    State(state): State<AppState>,
    Json(body): Json<CreateRegionRequest>,
) -> Result<(StatusCode, Json<Region>), ApiError> {
    let input = CreateRegionInput {
        code: body.code,
        name: body.name,
        level: body.level,
    };
    let region = state.region_service.create(&input).await?;
    Ok((StatusCode::CREATED, Json(region)))
}

/// GET /api/v1/regions/{code}
async fn get_region(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Json<Region>, ApiError> {
    let region = state
        .region_service
        .get_by_code(&code)
        .await?
        .ok_or_else(|| ApiError::not_found(format!("Region not found: {}", code)))?;
    Ok(Json(region))
}

/// PUT /api/v1/regions/{id}
async fn update_region(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(body): Json<UpdateRegionRequest>,
) -> Result<Json<Region>, ApiError> {
    let input = UpdateRegionInput {
        name: body.name,
        level: body.level,
    };
    let region = state.region_service.update(id, &input).await?;
    Ok(Json(region))
}

/// DELETE /api/v1/regions/{id}
async fn delete_region(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<StatusCode, ApiError> {
    state.region_service.delete(id).await?;
    Ok(StatusCode::NO_CONTENT)
}
