//! API layer - HTTP handlers and routing
//!
//! This module contains the HTTP endpoints:
//! - Live feed endpoint for clients
//! - Region catalog endpoints
//! - Topic, tag and content item management endpoints
//! - Health check

pub mod items;
pub mod regions;
pub mod tags;
pub mod topics;

use axum::{
    extract::State,
    http::{header, HeaderValue, Method, StatusCode},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde::{Deserialize, Serialize};
use serde_json::json;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use tracing::error;

use crate::cache::MemoryCache;
use crate::db::repositories::{
    SqlxAnswerOptionRepository, SqlxContentItemRepository, SqlxRegionRepository, SqlxTagRepository,
    SqlxTopicRepository,
};
use crate::db::DynDatabasePool;
use crate::services::{
    ContentItemService, ContentItemServiceError, RegionService, RegionServiceError, TagService,
    TagServiceError, TopicService, TopicServiceError,
};

/// Application state containing shared services
#[derive(Clone)]
pub struct AppState {
    pub pool: DynDatabasePool,
    pub region_service: Arc<RegionService>,
    pub topic_service: Arc<TopicService>,
    pub tag_service: Arc<TagService>,
    pub item_service: Arc<ContentItemService>,
}

impl AppState {
    /// Wire repositories and services over a pool and cache
    pub fn build(pool: DynDatabasePool, cache: Arc<MemoryCache>) -> Self {
        let region_service = Arc::new(RegionService::new(SqlxRegionRepository::boxed(
            pool.clone(),
        )));
        let topic_service = Arc::new(TopicService::new(SqlxTopicRepository::boxed(pool.clone())));
        let tag_service = Arc::new(TagService::new(SqlxTagRepository::boxed(pool.clone())));
        let item_service = Arc::new(ContentItemService::new(
            SqlxContentItemRepository::boxed(pool.clone()),
            SqlxAnswerOptionRepository::boxed(pool.clone()),
            SqlxTopicRepository::boxed(pool.clone()),
            region_service.clone(),
            cache,
        ));

        Self {
            pool,
            region_service,
            topic_service,
            tag_service,
            item_service,
        }
    }
}

/// Error response for API errors
#[derive(Debug, Serialize, Deserialize)]
pub struct ApiError {
    pub error: ApiErrorDetail,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ApiErrorDetail {
    pub code: String,
    pub message: String,
}

impl ApiError {
    pub fn new(code: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error: ApiErrorDetail {
                code: code.into(),
                message: message.into(),
            },
        }
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        Self::new("NOT_FOUND", message)
    }

    pub fn validation_error(message: impl Into<String>) -> Self {
        Self::new("VALIDATION_ERROR", message)
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        Self::new("CONFLICT", message)
    }

    pub fn internal_error(message: impl Into<String>) -> Self {
        Self::new("INTERNAL_ERROR", message)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match self.error.code.as_str() {
            "NOT_FOUND" => StatusCode::NOT_FOUND,
            "VALIDATION_ERROR" => StatusCode::BAD_REQUEST,
            "CONFLICT" => StatusCode::CONFLICT,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        (status, Json(self)).into_response()
    }
}

impl From<RegionServiceError> for ApiError {
    fn from(err: RegionServiceError) -> Self {
        match err {
            RegionServiceError::NotFound(msg) => ApiError::not_found(msg),
            RegionServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            RegionServiceError::DuplicateCode(code) => {
                ApiError::conflict(format!("Region code already exists: {}", code))
            }
            RegionServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<TopicServiceError> for ApiError {
    fn from(err: TopicServiceError) -> Self {
        match err {
            TopicServiceError::NotFound(msg) => ApiError::not_found(msg),
            TopicServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TopicServiceError::DuplicateSlug(slug) => {
                ApiError::conflict(format!("Topic slug already exists: {}", slug))
            }
            TopicServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<TagServiceError> for ApiError {
    fn from(err: TagServiceError) -> Self {
        match err {
            TagServiceError::NotFound(msg) => ApiError::not_found(msg),
            TagServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            TagServiceError::InternalError(e) => internal(e),
        }
    }
}

impl From<ContentItemServiceError> for ApiError {
    fn from(err: ContentItemServiceError) -> Self {
        match err {
            ContentItemServiceError::NotFound(msg) => ApiError::not_found(msg),
            ContentItemServiceError::ValidationError(msg) => ApiError::validation_error(msg),
            ContentItemServiceError::InvalidTransition(msg) => ApiError::conflict(msg),
            ContentItemServiceError::RegionError(msg) => ApiError::validation_error(msg),
            ContentItemServiceError::InternalError(e) => internal(e),
        }
    }
}

fn internal(e: anyhow::Error) -> ApiError {
    error!(error = ?e, "Internal API error");
    ApiError::internal_error("Internal server error")
}

/// Build the API router under /api/v1
pub fn build_api_router() -> Router<AppState> {
    Router::new()
        .route("/feed", get(items::live_feed_handler))
        .nest("/regions", regions::router())
        .nest("/topics", topics::router())
        .nest("/tags", tags::router())
        .nest("/items", items::router())
}

/// Build the complete router with middleware
pub fn build_router(state: AppState, cors_origin: &str) -> Router {
    let cors = match cors_origin.parse::<HeaderValue>() {
        Ok(origin) => CorsLayer::new()
            .allow_origin(origin)
            .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
            .allow_headers([header::CONTENT_TYPE]),
        Err(_) => {
            error!(cors_origin, "Invalid CORS origin, falling back to permissive CORS");
            CorsLayer::permissive()
        }
    };

    Router::new()
        .route("/health", get(health_handler))
        .nest("/api/v1", build_api_router())
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// GET /health - liveness and database reachability
async fn health_handler(State(state): State<AppState>) -> Response {
    match state.pool.ping().await {
        Ok(()) => Json(json!({"status": "ok"})).into_response(),
        Err(e) => {
            error!(error = ?e, "Health check database ping failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(json!({"status": "degraded"})),
            )
                .into_response()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::{create_test_pool, migrations};
    use axum_test::TestServer;
    use serde_json::Value;

    async fn setup_server() -> TestServer {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let cache = create_cache(&CacheConfig::default());
        let state = AppState::build(pool, cache);
        let app = build_router(state, "http://localhost:3000");
        TestServer::new(app).expect("Failed to start test server")
    }

    #[tokio::test]
    async fn test_health() {
        let server = setup_server().await;

        let response = server.get("/health").await;
        response.assert_status_ok();
        let body: Value = response.json();
        assert_eq!(body["status"], "ok");
    }

    #[tokio::test]
    async fn test_region_crud_over_http() {
        let server = setup_server().await;

        let response = server
            .post("/api/v1/regions")
            .json(&json!({"code": "de", "name": "Germany", "level": 0}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let region: Value = response.json();
        assert_eq!(region["code"], "DE");

        let response = server.get("/api/v1/regions/de").await;
        response.assert_status_ok();

        // Duplicate code is a conflict
        let response = server
            .post("/api/v1/regions")
            .json(&json!({"code": "DE", "name": "Again", "level": 0}))
            .await;
        response.assert_status(StatusCode::CONFLICT);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "CONFLICT");
    }

    #[tokio::test]
    async fn test_unknown_region_is_404() {
        let server = setup_server().await;

        let response = server.get("/api/v1/regions/XX").await;
        response.assert_status(StatusCode::NOT_FOUND);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "NOT_FOUND");
    }

    #[tokio::test]
    async fn test_feed_requires_known_locale() {
        let server = setup_server().await;

        let response = server.get("/api/v1/feed?locale=xx").await;
        response.assert_status(StatusCode::BAD_REQUEST);
        let body: Value = response.json();
        assert_eq!(body["error"]["code"], "VALIDATION_ERROR");
    }

    #[tokio::test]
    async fn test_publish_flow_over_http() {
        let server = setup_server().await;

        let response = server
            .post("/api/v1/topics")
            .json(&json!({"title": "Mobility", "locale": "de"}))
            .await;
        response.assert_status(StatusCode::CREATED);
        let topic: Value = response.json();
        let topic_id = topic["id"].as_i64().expect("topic id");

        let response = server
            .post("/api/v1/items")
            .json(&json!({
                "kind": "SWIPE",
                "locale": "de",
                "topic_id": topic_id,
                "text": "Ban cars downtown?"
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let item: Value = response.json();
        let item_id = item["id"].as_i64().expect("item id");
        assert_eq!(item["status"], "draft");

        // Draft items do not show in the feed
        let response = server.get("/api/v1/feed?locale=de").await;
        response.assert_status_ok();
        let feed: Value = response.json();
        assert_eq!(feed["total"], 0);

        let response = server.post(&format!("/api/v1/items/{}/publish", item_id)).await;
        response.assert_status_ok();
        let published: Value = response.json();
        assert_eq!(published["status"], "published");
        assert!(!published["publish_at"].is_null());

        let response = server.get("/api/v1/feed?locale=de").await;
        response.assert_status_ok();
        let feed: Value = response.json();
        assert_eq!(feed["total"], 1);
        assert_eq!(feed["items"][0]["text"], "Ban cars downtown?");

        // Wrong locale sees nothing
        let response = server.get("/api/v1/feed?locale=en").await;
        response.assert_status_ok();
        let feed: Value = response.json();
        assert_eq!(feed["total"], 0);
    }

    #[tokio::test]
    async fn test_poll_options_embedded_in_feed() {
        let server = setup_server().await;

        let topic: Value = server
            .post("/api/v1/topics")
            .json(&json!({"title": "Polls", "locale": "de"}))
            .await
            .json();
        let topic_id = topic["id"].as_i64().expect("topic id");

        let response = server
            .post("/api/v1/items")
            .json(&json!({
                "kind": "SUNDAY_POLL",
                "locale": "de",
                "topic_id": topic_id,
                "text": "Which mode do you use most?",
                "options": [
                    {"value": "bike", "label": "Bike", "sort_order": 0},
                    {"value": "car", "label": "Car", "sort_order": 1}
                ]
            }))
            .await;
        response.assert_status(StatusCode::CREATED);
        let item: Value = response.json();
        let item_id = item["id"].as_i64().expect("item id");

        server
            .post(&format!("/api/v1/items/{}/publish", item_id))
            .await
            .assert_status_ok();

        let feed: Value = server.get("/api/v1/feed?locale=de").await.json();
        assert_eq!(feed["items"][0]["options"].as_array().map(|a| a.len()), Some(2));
    }

    #[tokio::test]
    async fn test_invalid_transition_is_conflict() {
        let server = setup_server().await;

        let topic: Value = server
            .post("/api/v1/topics")
            .json(&json!({"title": "T", "locale": "de"}))
            .await
            .json();
        let item: Value = server
            .post("/api/v1/items")
            .json(&json!({
                "kind": "SWIPE",
                "locale": "de",
                "topic_id": topic["id"],
                "text": "x"
            }))
            .await
            .json();
        let item_id = item["id"].as_i64().expect("item id");

        server
            .post(&format!("/api/v1/items/{}/archive", item_id))
            .await
            .assert_status_ok();
        let response = server.post(&format!("/api/v1/items/{}/publish", item_id)).await;
        response.assert_status(StatusCode::CONFLICT);
    }

    #[tokio::test]
    async fn test_item_tagging_over_http() {
        let server = setup_server().await;

        let topic: Value = server
            .post("/api/v1/topics")
            .json(&json!({"title": "T", "locale": "de"}))
            .await
            .json();
        let item: Value = server
            .post("/api/v1/items")
            .json(&json!({
                "kind": "SWIPE",
                "locale": "de",
                "topic_id": topic["id"],
                "text": "x"
            }))
            .await
            .json();
        let tag: Value = server
            .post("/api/v1/tags")
            .json(&json!({"label": "Klima"}))
            .await
            .json();

        let item_id = item["id"].as_i64().expect("item id");
        let tag_id = tag["id"].as_i64().expect("tag id");

        server
            .post(&format!("/api/v1/items/{}/tags/{}", item_id, tag_id))
            .await
            .assert_status(StatusCode::NO_CONTENT);

        let tags: Value = server
            .get(&format!("/api/v1/items/{}/tags", item_id))
            .await
            .json();
        assert_eq!(tags.as_array().map(|a| a.len()), Some(1));
        assert_eq!(tags[0]["label"], "Klima");
    }
}
