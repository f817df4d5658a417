//! Content item service
//!
//! Business logic for content items: creation with poll options, the
//! draft/review/published/archived lifecycle, region resolution on publish,
//! scheduled expiry, and the cached live feed.

use crate::cache::{CacheLayer, MemoryCache};
use crate::db::repositories::{
    AnswerOptionRepository, ContentItemRepository, LiveQuery, TopicRepository,
};
use crate::models::{
    AnswerOption, ContentItem, ContentKind, CreateAnswerOptionInput, CreateContentItemInput,
    ListParams, Locale, PagedResult, PublishStatus, UpdateAnswerOptionInput,
    UpdateContentItemInput,
};
use crate::services::region::RegionService;
use anyhow::Context;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tracing::{info, warn};

/// Cache TTL for live feed pages (5 minutes)
const FEED_CACHE_TTL_SECS: u64 = 300;

/// Cache key prefix for live feed pages
const CACHE_KEY_FEED: &str = "feed:";

/// Minimum number of answer options a Sunday poll needs
const MIN_POLL_OPTIONS: usize = 2;

/// Error types for content item service operations
#[derive(Debug, thiserror::Error)]
pub enum ContentItemServiceError {
    /// Item not found
    #[error("Content item not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Status transition not allowed
    #[error("Invalid status transition: {0}")]
    InvalidTransition(String),

    /// Region resolution error
    #[error("Region resolution error: {0}")]
    RegionError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// A content item together with its answer options
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ItemDetail {
    #[serde(flatten)]
    pub item: ContentItem,
    pub options: Vec<AnswerOption>,
}

/// Content item service
pub struct ContentItemService {
    repo: Arc<dyn ContentItemRepository>,
    option_repo: Arc<dyn AnswerOptionRepository>,
    topic_repo: Arc<dyn TopicRepository>,
    region_service: Arc<RegionService>,
    cache: Arc<MemoryCache>,
    feed_cache_ttl: Duration,
}

impl ContentItemService {
    /// Create a new content item service
    pub fn new(
        repo: Arc<dyn ContentItemRepository>,
        option_repo: Arc<dyn AnswerOptionRepository>,
        topic_repo: Arc<dyn TopicRepository>,
        region_service: Arc<RegionService>,
        cache: Arc<MemoryCache>,
    ) -> Self {
        Self {
            repo,
            option_repo,
            topic_repo,
            region_service,
            cache,
            feed_cache_ttl: Duration::from_secs(FEED_CACHE_TTL_SECS),
        }
    }

    /// Create a content item, with answer options for polls
    ///
    /// Options are only accepted for Sunday polls, which need at least two.
    /// If an option insert fails the item is rolled back.
    pub async fn create(
        &self,
        input: &CreateContentItemInput,
        options: &[CreateAnswerOptionInput],
    ) -> Result<ItemDetail, ContentItemServiceError> {
        if input.text.trim().is_empty() {
            return Err(ContentItemServiceError::ValidationError(
                "Item text cannot be empty".to_string(),
            ));
        }

        self.topic_repo
            .get_by_id(input.topic_id)
            .await
            .context("Failed to check topic")?
            .ok_or_else(|| {
                ContentItemServiceError::ValidationError(format!(
                    "Topic with ID {} does not exist",
                    input.topic_id
                ))
            })?;

        validate_options(input.kind, options)?;

        let item = self
            .repo
            .create(input)
            .await
            .context("Failed to create content item")?;

        let mut created_options = Vec::with_capacity(options.len());
        for option in options {
            match self.option_repo.create(item.id, option).await {
                Ok(created) => created_options.push(created),
                Err(e) => {
                    // Roll the item back so a half-built poll never lingers
                    if let Err(cleanup) = self.repo.delete(item.id).await {
                        warn!(item_id = item.id, error = %cleanup, "Failed to clean up item after option error");
                    }
                    return Err(ContentItemServiceError::InternalError(
                        e.context("Failed to create answer option"),
                    ));
                }
            }
        }

        info!(item_id = item.id, kind = %item.kind, "Content item created");

        Ok(ItemDetail {
            item,
            options: created_options,
        })
    }

    /// Get an item with its options
    pub async fn get(&self, id: i64) -> Result<ItemDetail, ContentItemServiceError> {
        let item = self.require_item(id).await?;
        let options = self
            .option_repo
            .list_for_item(id)
            .await
            .context("Failed to list answer options")?;

        Ok(ItemDetail { item, options })
    }

    /// List items for a topic
    pub async fn list_by_topic(
        &self,
        topic_id: i64,
    ) -> Result<Vec<ContentItem>, ContentItemServiceError> {
        self.repo
            .list_by_topic(topic_id)
            .await
            .context("Failed to list items by topic")
            .map_err(Into::into)
    }

    /// List items with a given status
    pub async fn list_by_status(
        &self,
        status: PublishStatus,
    ) -> Result<Vec<ContentItem>, ContentItemServiceError> {
        self.repo
            .list_by_status(status)
            .await
            .context("Failed to list items by status")
            .map_err(Into::into)
    }

    /// Update an item's editable fields
    ///
    /// Published items get their effective region re-resolved, since the
    /// update may have changed the region inputs.
    pub async fn update(
        &self,
        id: i64,
        input: &UpdateContentItemInput,
    ) -> Result<ContentItem, ContentItemServiceError> {
        if let Some(text) = &input.text {
            if text.trim().is_empty() {
                return Err(ContentItemServiceError::ValidationError(
                    "Item text cannot be empty".to_string(),
                ));
            }
        }

        let updated = self
            .repo
            .update(id, input)
            .await
            .context("Failed to update content item")?
            .ok_or_else(|| {
                ContentItemServiceError::NotFound(format!("Content item with ID {} not found", id))
            })?;

        let updated = if updated.status == PublishStatus::Published {
            self.resolve_and_store(&updated).await?
        } else {
            updated
        };

        self.invalidate_feed().await?;
        Ok(updated)
    }

    /// Move a draft into review
    pub async fn submit_for_review(&self, id: i64) -> Result<ContentItem, ContentItemServiceError> {
        let item = self.require_item(id).await?;
        if item.status != PublishStatus::Draft {
            return Err(ContentItemServiceError::InvalidTransition(format!(
                "Only drafts can be submitted for review, item is {}",
                item.status
            )));
        }

        self.repo
            .set_status(id, PublishStatus::Review, None)
            .await
            .context("Failed to set status")?;

        self.require_item(id).await
    }

    /// Publish an item
    ///
    /// Accepted from draft or review. Stamps publish_at with the current
    /// time when it was never set, checks poll completeness, and resolves
    /// the effective region.
    pub async fn publish(&self, id: i64) -> Result<ContentItem, ContentItemServiceError> {
        let item = self.require_item(id).await?;
        match item.status {
            PublishStatus::Draft | PublishStatus::Review => {}
            other => {
                return Err(ContentItemServiceError::InvalidTransition(format!(
                    "Cannot publish an item that is {}",
                    other
                )));
            }
        }

        if item.kind == ContentKind::SundayPoll {
            let count = self
                .option_repo
                .count_for_item(id)
                .await
                .context("Failed to count answer options")?;
            if (count as usize) < MIN_POLL_OPTIONS {
                return Err(ContentItemServiceError::ValidationError(format!(
                    "A Sunday poll needs at least {} answer options",
                    MIN_POLL_OPTIONS
                )));
            }
        }

        let publish_at = match item.publish_at {
            Some(_) => None,
            None => Some(Utc::now()),
        };
        self.repo
            .set_status(id, PublishStatus::Published, publish_at)
            .await
            .context("Failed to set status")?;

        let published = self.require_item(id).await?;
        let published = self.resolve_and_store(&published).await?;

        self.invalidate_feed().await?;
        info!(item_id = id, region = ?published.effective_region_id, "Content item published");

        Ok(published)
    }

    /// Archive an item, taking it out of the live feed
    pub async fn archive(&self, id: i64) -> Result<ContentItem, ContentItemServiceError> {
        let item = self.require_item(id).await?;
        if item.status == PublishStatus::Archived {
            return Err(ContentItemServiceError::InvalidTransition(
                "Item is already archived".to_string(),
            ));
        }

        self.repo
            .set_status(id, PublishStatus::Archived, None)
            .await
            .context("Failed to set status")?;

        self.invalidate_feed().await?;
        self.require_item(id).await
    }

    /// Archive all published items whose expire_at has passed
    ///
    /// Returns the number of items archived. Meant to be called
    /// periodically by the expiry sweep.
    pub async fn expire_due(&self, now: DateTime<Utc>) -> Result<usize, ContentItemServiceError> {
        let due = self
            .repo
            .list_due_for_expiry(now)
            .await
            .context("Failed to list items due for expiry")?;

        let count = due.len();
        for item in due {
            self.repo
                .set_status(item.id, PublishStatus::Archived, None)
                .await
                .context("Failed to archive expired item")?;
            info!(item_id = item.id, "Content item expired and archived");
        }

        if count > 0 {
            self.invalidate_feed().await?;
        }

        Ok(count)
    }

    /// The live feed: published, within its publish window, for the given
    /// audience
    ///
    /// Pages are cached; any item mutation invalidates all feed pages.
    pub async fn live_feed(
        &self,
        locale: Locale,
        region_id: Option<i64>,
        kind: Option<ContentKind>,
        params: &ListParams,
    ) -> Result<PagedResult<ContentItem>, ContentItemServiceError> {
        let cache_key = feed_cache_key(locale, region_id, kind, params);

        if let Some(cached) = self
            .cache
            .get::<PagedResult<ContentItem>>(&cache_key)
            .await
            .context("Failed to read feed cache")?
        {
            return Ok(cached);
        }

        let query = LiveQuery {
            locale,
            region_id,
            kind,
            now: Utc::now(),
            limit: params.limit(),
            offset: params.offset(),
        };

        let items = self
            .repo
            .list_live(&query)
            .await
            .context("Failed to list live items")?;
        let total = self
            .repo
            .count_live(&query)
            .await
            .context("Failed to count live items")?;

        let page = PagedResult::new(items, total, params);
        self.cache
            .set(&cache_key, &page, self.feed_cache_ttl)
            .await
            .context("Failed to write feed cache")?;

        Ok(page)
    }

    /// Re-run region resolution for an item and store the result
    pub async fn resolve_region(&self, id: i64) -> Result<Option<i64>, ContentItemServiceError> {
        let item = self.require_item(id).await?;
        let resolved = self.resolve_and_store(&item).await?;
        self.invalidate_feed().await?;
        Ok(resolved.effective_region_id)
    }

    /// Add an answer option to a Sunday poll
    pub async fn add_option(
        &self,
        item_id: i64,
        input: &CreateAnswerOptionInput,
    ) -> Result<AnswerOption, ContentItemServiceError> {
        let item = self.require_item(item_id).await?;
        if item.kind != ContentKind::SundayPoll {
            return Err(ContentItemServiceError::ValidationError(
                "Answer options are only valid on Sunday polls".to_string(),
            ));
        }
        if input.value.trim().is_empty() || input.label.trim().is_empty() {
            return Err(ContentItemServiceError::ValidationError(
                "Option value and label cannot be empty".to_string(),
            ));
        }

        self.option_repo
            .create(item_id, input)
            .await
            .context("Failed to create answer option")
            .map_err(Into::into)
    }

    /// Update an answer option
    pub async fn update_option(
        &self,
        option_id: i64,
        input: &UpdateAnswerOptionInput,
    ) -> Result<AnswerOption, ContentItemServiceError> {
        self.option_repo
            .update(option_id, input)
            .await
            .context("Failed to update answer option")?
            .ok_or_else(|| {
                ContentItemServiceError::NotFound(format!(
                    "Answer option with ID {} not found",
                    option_id
                ))
            })
    }

    /// Remove an answer option
    ///
    /// A published poll may not drop below the option minimum.
    pub async fn remove_option(&self, option_id: i64) -> Result<(), ContentItemServiceError> {
        let option = self
            .option_repo
            .get_by_id(option_id)
            .await
            .context("Failed to get answer option")?
            .ok_or_else(|| {
                ContentItemServiceError::NotFound(format!(
                    "Answer option with ID {} not found",
                    option_id
                ))
            })?;

        let item = self.require_item(option.item_id).await?;
        if item.status == PublishStatus::Published {
            let count = self
                .option_repo
                .count_for_item(item.id)
                .await
                .context("Failed to count answer options")?;
            if (count as usize) <= MIN_POLL_OPTIONS {
                return Err(ContentItemServiceError::ValidationError(format!(
                    "A published poll needs at least {} answer options",
                    MIN_POLL_OPTIONS
                )));
            }
        }

        self.option_repo
            .delete(option_id)
            .await
            .context("Failed to delete answer option")
            .map_err(Into::into)
    }

    /// List an item's answer options
    pub async fn list_options(
        &self,
        item_id: i64,
    ) -> Result<Vec<AnswerOption>, ContentItemServiceError> {
        self.option_repo
            .list_for_item(item_id)
            .await
            .context("Failed to list answer options")
            .map_err(Into::into)
    }

    /// Delete an item and everything hanging off it
    pub async fn delete(&self, id: i64) -> Result<(), ContentItemServiceError> {
        self.require_item(id).await?;
        self.repo
            .delete(id)
            .await
            .context("Failed to delete content item")?;
        self.invalidate_feed().await?;
        Ok(())
    }

    async fn require_item(&self, id: i64) -> Result<ContentItem, ContentItemServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get content item")?
            .ok_or_else(|| {
                ContentItemServiceError::NotFound(format!("Content item with ID {} not found", id))
            })
    }

    async fn resolve_and_store(
        &self,
        item: &ContentItem,
    ) -> Result<ContentItem, ContentItemServiceError> {
        let resolved = self
            .region_service
            .resolve(item)
            .await
            .map_err(|e| ContentItemServiceError::RegionError(e.to_string()))?;

        if resolved != item.effective_region_id {
            self.repo
                .set_effective_region(item.id, resolved)
                .await
                .context("Failed to store effective region")?;
        }

        let mut updated = item.clone();
        updated.effective_region_id = resolved;
        Ok(updated)
    }

    async fn invalidate_feed(&self) -> Result<(), ContentItemServiceError> {
        self.cache
            .delete_pattern(&format!("{}*", CACHE_KEY_FEED))
            .await
            .context("Failed to invalidate feed cache")
            .map_err(Into::into)
    }
}

/// Build the cache key for a feed page
fn feed_cache_key(
    locale: Locale,
    region_id: Option<i64>,
    kind: Option<ContentKind>,
    params: &ListParams,
) -> String {
    let kind = kind.map(|k| k.as_str().to_string()).unwrap_or_else(|| "all".to_string());
    let region = region_id
        .map(|id| id.to_string())
        .unwrap_or_else(|| "global".to_string());
    format!(
        "{}{}:{}:{}:{}:{}",
        CACHE_KEY_FEED,
        locale.as_str(),
        kind,
        region,
        params.page,
        params.per_page
    )
}

/// Validate options supplied at creation time
fn validate_options(
    kind: ContentKind,
    options: &[CreateAnswerOptionInput],
) -> Result<(), ContentItemServiceError> {
    if kind != ContentKind::SundayPoll {
        if !options.is_empty() {
            return Err(ContentItemServiceError::ValidationError(
                "Answer options are only valid on Sunday polls".to_string(),
            ));
        }
        return Ok(());
    }

    if options.len() < MIN_POLL_OPTIONS {
        return Err(ContentItemServiceError::ValidationError(format!(
            "A Sunday poll needs at least {} answer options",
            MIN_POLL_OPTIONS
        )));
    }

    let mut values = HashSet::new();
    let mut sort_orders = HashSet::new();
    for option in options {
        if option.value.trim().is_empty() || option.label.trim().is_empty() {
            return Err(ContentItemServiceError::ValidationError(
                "Option value and label cannot be empty".to_string(),
            ));
        }
        if !values.insert(option.value.as_str()) {
            return Err(ContentItemServiceError::ValidationError(format!(
                "Duplicate option value: {}",
                option.value
            )));
        }
        if !sort_orders.insert(option.sort_order) {
            return Err(ContentItemServiceError::ValidationError(format!(
                "Duplicate option sort_order: {}",
                option.sort_order
            )));
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cache::create_cache;
    use crate::config::CacheConfig;
    use crate::db::repositories::{
        SqlxAnswerOptionRepository, SqlxContentItemRepository, SqlxRegionRepository,
        SqlxTopicRepository,
    };
    use crate::db::{create_test_pool, migrations, DynDatabasePool};
    use crate::models::{CreateRegionInput, CreateTopicInput, JsonField};
    use crate::services::region::RegionService;
    use crate::services::topic::TopicService;
    use chrono::Duration as ChronoDuration;
    use serde_json::json;

    struct TestContext {
        pool: DynDatabasePool,
        service: ContentItemService,
        region_service: Arc<RegionService>,
        topic_id: i64,
    }

    async fn setup() -> TestContext {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let region_service = Arc::new(RegionService::new(SqlxRegionRepository::boxed(
            pool.clone(),
        )));
        let cache = create_cache(&CacheConfig::default());
        let service = ContentItemService::new(
            SqlxContentItemRepository::boxed(pool.clone()),
            SqlxAnswerOptionRepository::boxed(pool.clone()),
            SqlxTopicRepository::boxed(pool.clone()),
            region_service.clone(),
            cache,
        );

        let topic_service = TopicService::new(SqlxTopicRepository::boxed(pool.clone()));
        let topic = topic_service
            .create(&CreateTopicInput::new("Test Topic", Locale::De))
            .await
            .expect("Failed to create topic");

        TestContext {
            pool,
            service,
            region_service,
            topic_id: topic.id,
        }
    }

    fn swipe(topic_id: i64, text: &str) -> CreateContentItemInput {
        CreateContentItemInput::new(ContentKind::Swipe, Locale::De, topic_id, text)
    }

    fn poll_options() -> Vec<CreateAnswerOptionInput> {
        vec![
            CreateAnswerOptionInput::new("yes", "Yes", 0),
            CreateAnswerOptionInput::new("no", "No", 1),
        ]
    }

    // ========================================================================
    // create tests
    // ========================================================================

    #[tokio::test]
    async fn test_create_swipe_item() {
        let ctx = setup().await;

        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "Ban cars downtown?"), &[])
            .await
            .expect("Failed to create item");

        assert_eq!(detail.item.status, PublishStatus::Draft);
        assert!(detail.options.is_empty());
    }

    #[tokio::test]
    async fn test_create_empty_text_fails() {
        let ctx = setup().await;

        let result = ctx.service.create(&swipe(ctx.topic_id, "   "), &[]).await;
        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_unknown_topic_fails() {
        let ctx = setup().await;

        let result = ctx.service.create(&swipe(99999, "x"), &[]).await;
        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_poll_with_options() {
        let ctx = setup().await;

        let input = CreateContentItemInput::new(
            ContentKind::SundayPoll,
            Locale::De,
            ctx.topic_id,
            "Which mode do you use most?",
        );
        let detail = ctx
            .service
            .create(&input, &poll_options())
            .await
            .expect("Failed to create poll");

        assert_eq!(detail.options.len(), 2);
        assert_eq!(detail.options[0].value, "yes");
    }

    #[tokio::test]
    async fn test_create_poll_needs_two_options() {
        let ctx = setup().await;

        let input =
            CreateContentItemInput::new(ContentKind::SundayPoll, Locale::De, ctx.topic_id, "Poll?");
        let result = ctx
            .service
            .create(&input, &[CreateAnswerOptionInput::new("yes", "Yes", 0)])
            .await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_non_poll_rejects_options() {
        let ctx = setup().await;

        let result = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &poll_options())
            .await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_create_poll_duplicate_option_values_rejected() {
        let ctx = setup().await;

        let input =
            CreateContentItemInput::new(ContentKind::SundayPoll, Locale::De, ctx.topic_id, "Poll?");
        let options = vec![
            CreateAnswerOptionInput::new("yes", "Yes", 0),
            CreateAnswerOptionInput::new("yes", "Also yes", 1),
        ];
        let result = ctx.service.create(&input, &options).await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
        // Nothing should have been persisted
        let drafts = ctx
            .service
            .list_by_status(PublishStatus::Draft)
            .await
            .expect("list");
        assert!(drafts.is_empty());
    }

    // ========================================================================
    // Lifecycle tests
    // ========================================================================

    #[tokio::test]
    async fn test_lifecycle_draft_review_published_archived() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &[])
            .await
            .expect("create");
        let id = detail.item.id;

        let reviewed = ctx.service.submit_for_review(id).await.expect("review");
        assert_eq!(reviewed.status, PublishStatus::Review);

        let published = ctx.service.publish(id).await.expect("publish");
        assert_eq!(published.status, PublishStatus::Published);
        assert!(published.publish_at.is_some());

        let archived = ctx.service.archive(id).await.expect("archive");
        assert_eq!(archived.status, PublishStatus::Archived);
    }

    #[tokio::test]
    async fn test_submit_for_review_only_from_draft() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &[])
            .await
            .expect("create");

        ctx.service
            .submit_for_review(detail.item.id)
            .await
            .expect("review");
        let result = ctx.service.submit_for_review(detail.item.id).await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_archived_item_fails() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &[])
            .await
            .expect("create");

        ctx.service.publish(detail.item.id).await.expect("publish");
        ctx.service.archive(detail.item.id).await.expect("archive");
        let result = ctx.service.publish(detail.item.id).await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::InvalidTransition(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_keeps_existing_publish_at() {
        let ctx = setup().await;
        let scheduled = Utc::now() + ChronoDuration::hours(6);
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x").with_publish_at(scheduled), &[])
            .await
            .expect("create");

        let published = ctx.service.publish(detail.item.id).await.expect("publish");

        let stored = published.publish_at.expect("publish_at missing");
        assert_eq!(stored.timestamp(), scheduled.timestamp());
    }

    #[tokio::test]
    async fn test_publish_poll_without_options_fails() {
        let ctx = setup().await;

        // Insert a poll directly, bypassing creation checks
        let result = sqlx::query(
            "INSERT INTO content_items (kind, locale, topic_id, text, status, region_mode) \
             VALUES ('SUNDAY_POLL', 'de', ?, 'Poll?', 'draft', 'AUTO')",
        )
        .bind(ctx.topic_id)
        .execute(ctx.pool.as_sqlite().unwrap())
        .await
        .expect("insert");
        let id = result.last_insert_rowid();

        let outcome = ctx.service.publish(id).await;
        assert!(matches!(
            outcome,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_publish_resolves_region() {
        let ctx = setup().await;
        let region = ctx
            .region_service
            .create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("create region");

        let mut input = swipe(ctx.topic_id, "regional news");
        input.region_auto = JsonField::Value(json!({"codes": ["DE"]}));
        let detail = ctx.service.create(&input, &[]).await.expect("create");

        let published = ctx.service.publish(detail.item.id).await.expect("publish");
        assert_eq!(published.effective_region_id, Some(region.id));
    }

    // ========================================================================
    // Expiry tests
    // ========================================================================

    #[tokio::test]
    async fn test_expire_due_archives_overdue_items() {
        let ctx = setup().await;
        let now = Utc::now();

        let overdue = ctx
            .service
            .create(
                &swipe(ctx.topic_id, "overdue").with_expire_at(now + ChronoDuration::seconds(1)),
                &[],
            )
            .await
            .expect("create");
        ctx.service.publish(overdue.item.id).await.expect("publish");

        let fresh = ctx
            .service
            .create(
                &swipe(ctx.topic_id, "fresh").with_expire_at(now + ChronoDuration::hours(2)),
                &[],
            )
            .await
            .expect("create");
        ctx.service.publish(fresh.item.id).await.expect("publish");

        let expired = ctx
            .service
            .expire_due(now + ChronoDuration::hours(1))
            .await
            .expect("Failed to expire");

        assert_eq!(expired, 1);
        let archived = ctx.service.get(overdue.item.id).await.expect("get");
        assert_eq!(archived.item.status, PublishStatus::Archived);
        let still_live = ctx.service.get(fresh.item.id).await.expect("get");
        assert_eq!(still_live.item.status, PublishStatus::Published);
    }

    // ========================================================================
    // Feed tests
    // ========================================================================

    #[tokio::test]
    async fn test_live_feed_and_cache_invalidation() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "first"), &[])
            .await
            .expect("create");
        ctx.service.publish(detail.item.id).await.expect("publish");

        let params = ListParams::new(1, 20);
        let page = ctx
            .service
            .live_feed(Locale::De, None, None, &params)
            .await
            .expect("Failed to load feed");
        assert_eq!(page.items.len(), 1);

        // Publishing another item must bust the cached page
        let second = ctx
            .service
            .create(&swipe(ctx.topic_id, "second"), &[])
            .await
            .expect("create");
        ctx.service.publish(second.item.id).await.expect("publish");

        let page = ctx
            .service
            .live_feed(Locale::De, None, None, &params)
            .await
            .expect("Failed to load feed");
        assert_eq!(page.items.len(), 2);
    }

    #[tokio::test]
    async fn test_live_feed_filters_kind() {
        let ctx = setup().await;

        let swipe_item = ctx
            .service
            .create(&swipe(ctx.topic_id, "swipe"), &[])
            .await
            .expect("create");
        ctx.service.publish(swipe_item.item.id).await.expect("publish");

        let event = ctx
            .service
            .create(
                &CreateContentItemInput::new(ContentKind::Event, Locale::De, ctx.topic_id, "event"),
                &[],
            )
            .await
            .expect("create");
        ctx.service.publish(event.item.id).await.expect("publish");

        let page = ctx
            .service
            .live_feed(Locale::De, None, Some(ContentKind::Event), &ListParams::new(1, 20))
            .await
            .expect("Failed to load feed");

        assert_eq!(page.items.len(), 1);
        assert_eq!(page.items[0].kind, ContentKind::Event);
    }

    // ========================================================================
    // Option management tests
    // ========================================================================

    #[tokio::test]
    async fn test_add_option_only_on_polls() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &[])
            .await
            .expect("create");

        let result = ctx
            .service
            .add_option(detail.item.id, &CreateAnswerOptionInput::new("yes", "Yes", 0))
            .await;

        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));
    }

    #[tokio::test]
    async fn test_remove_option_keeps_published_poll_valid() {
        let ctx = setup().await;
        let input =
            CreateContentItemInput::new(ContentKind::SundayPoll, Locale::De, ctx.topic_id, "Poll?");
        let detail = ctx
            .service
            .create(&input, &poll_options())
            .await
            .expect("create");
        ctx.service.publish(detail.item.id).await.expect("publish");

        let result = ctx.service.remove_option(detail.options[0].id).await;
        assert!(matches!(
            result,
            Err(ContentItemServiceError::ValidationError(_))
        ));

        // With a third option the removal goes through
        ctx.service
            .add_option(
                detail.item.id,
                &CreateAnswerOptionInput::new("maybe", "Maybe", 2),
            )
            .await
            .expect("add option");
        ctx.service
            .remove_option(detail.options[0].id)
            .await
            .expect("Failed to remove option");

        let remaining = ctx
            .service
            .list_options(detail.item.id)
            .await
            .expect("list options");
        assert_eq!(remaining.len(), 2);
    }

    #[tokio::test]
    async fn test_delete_item() {
        let ctx = setup().await;
        let detail = ctx
            .service
            .create(&swipe(ctx.topic_id, "x"), &[])
            .await
            .expect("create");

        ctx.service.delete(detail.item.id).await.expect("delete");

        let result = ctx.service.get(detail.item.id).await;
        assert!(matches!(result, Err(ContentItemServiceError::NotFound(_))));
    }
}
