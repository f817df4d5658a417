//! Tag service
//!
//! Business logic for tags: create-or-reuse by label, the weighted tag list,
//! and attaching tags to topics and content items.

use crate::db::repositories::TagRepository;
use crate::models::{Tag, TagWithCount};
use crate::services::topic::generate_slug;
use anyhow::Context;
use std::sync::Arc;

/// Error types for tag service operations
#[derive(Debug, thiserror::Error)]
pub enum TagServiceError {
    /// Tag not found
    #[error("Tag not found: {0}")]
    NotFound(String),

    /// Validation error
    #[error("Validation error: {0}")]
    ValidationError(String),

    /// Internal error
    #[error("Internal error: {0}")]
    InternalError(#[from] anyhow::Error),
}

/// Tag service for managing content tags
pub struct TagService {
    repo: Arc<dyn TagRepository>,
}

impl TagService {
    /// Create a new tag service
    pub fn new(repo: Arc<dyn TagRepository>) -> Self {
        Self { repo }
    }

    /// Create a tag or return the existing one with the same slug
    ///
    /// The slug is derived from the label, so "Klima" and "klima" land on
    /// the same tag.
    pub async fn create_or_get(&self, label: &str) -> Result<Tag, TagServiceError> {
        let trimmed = label.trim();
        if trimmed.is_empty() {
            return Err(TagServiceError::ValidationError(
                "Tag label cannot be empty".to_string(),
            ));
        }

        let slug = generate_slug(trimmed);
        if slug.is_empty() {
            return Err(TagServiceError::ValidationError(format!(
                "Cannot derive a slug from label: {}",
                trimmed
            )));
        }

        if let Some(existing) = self
            .repo
            .get_by_slug(&slug)
            .await
            .context("Failed to check existing tag")?
        {
            return Ok(existing);
        }

        let created = self
            .repo
            .create(&slug, trimmed)
            .await
            .context("Failed to create tag")?;

        Ok(created)
    }

    /// Get tag by ID
    pub async fn get_by_id(&self, id: i64) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_id(id)
            .await
            .context("Failed to get tag by ID")
            .map_err(Into::into)
    }

    /// Get tag by slug
    pub async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>, TagServiceError> {
        self.repo
            .get_by_slug(slug)
            .await
            .context("Failed to get tag by slug")
            .map_err(Into::into)
    }

    /// List all tags ordered by label
    pub async fn list(&self) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list()
            .await
            .context("Failed to list tags")
            .map_err(Into::into)
    }

    /// List tags with their item usage counts, most used first
    pub async fn list_with_counts(
        &self,
        limit: usize,
    ) -> Result<Vec<TagWithCount>, TagServiceError> {
        self.repo
            .list_with_counts(limit)
            .await
            .context("Failed to list tags with counts")
            .map_err(Into::into)
    }

    /// Delete a tag and its associations
    pub async fn delete(&self, id: i64) -> Result<(), TagServiceError> {
        let tag = self
            .repo
            .get_by_id(id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", id)))?;

        self.repo
            .delete(tag.id)
            .await
            .context("Failed to delete tag")?;

        Ok(())
    }

    /// Attach a tag to a topic (idempotent)
    pub async fn attach_to_topic(&self, tag_id: i64, topic_id: i64) -> Result<(), TagServiceError> {
        self.require_tag(tag_id).await?;
        self.repo
            .add_to_topic(tag_id, topic_id)
            .await
            .context("Failed to attach tag to topic")
            .map_err(Into::into)
    }

    /// Detach a tag from a topic
    pub async fn detach_from_topic(
        &self,
        tag_id: i64,
        topic_id: i64,
    ) -> Result<(), TagServiceError> {
        self.repo
            .remove_from_topic(tag_id, topic_id)
            .await
            .context("Failed to detach tag from topic")
            .map_err(Into::into)
    }

    /// List tags attached to a topic
    pub async fn list_for_topic(&self, topic_id: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_for_topic(topic_id)
            .await
            .context("Failed to list tags for topic")
            .map_err(Into::into)
    }

    /// Attach a tag to a content item (idempotent)
    pub async fn attach_to_item(&self, tag_id: i64, item_id: i64) -> Result<(), TagServiceError> {
        self.require_tag(tag_id).await?;
        self.repo
            .add_to_item(tag_id, item_id)
            .await
            .context("Failed to attach tag to item")
            .map_err(Into::into)
    }

    /// Detach a tag from a content item
    pub async fn detach_from_item(&self, tag_id: i64, item_id: i64) -> Result<(), TagServiceError> {
        self.repo
            .remove_from_item(tag_id, item_id)
            .await
            .context("Failed to detach tag from item")
            .map_err(Into::into)
    }

    /// List tags attached to a content item
    pub async fn list_for_item(&self, item_id: i64) -> Result<Vec<Tag>, TagServiceError> {
        self.repo
            .list_for_item(item_id)
            .await
            .context("Failed to list tags for item")
            .map_err(Into::into)
    }

    async fn require_tag(&self, tag_id: i64) -> Result<(), TagServiceError> {
        self.repo
            .get_by_id(tag_id)
            .await
            .context("Failed to get tag")?
            .ok_or_else(|| TagServiceError::NotFound(format!("Tag with ID {} not found", tag_id)))?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::repositories::SqlxTagRepository;
    use crate::db::{create_test_pool, migrations, DynDatabasePool};

    async fn setup_test_service() -> (DynDatabasePool, TagService) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");

        let repo = SqlxTagRepository::boxed(pool.clone());
        (pool, TagService::new(repo))
    }

    async fn create_test_topic(pool: &DynDatabasePool, slug: &str) -> i64 {
        let result = sqlx::query("INSERT INTO topics (slug, title, locale) VALUES (?, ?, 'de')")
            .bind(slug)
            .bind(slug)
            .execute(pool.as_sqlite().unwrap())
            .await
            .expect("Failed to create test topic");
        result.last_insert_rowid()
    }

    async fn create_test_item(pool: &DynDatabasePool, topic_id: i64) -> i64 {
        let result = sqlx::query(
            "INSERT INTO content_items (kind, locale, topic_id, text, status, region_mode) \
             VALUES ('SWIPE', 'de', ?, 'x', 'draft', 'AUTO')",
        )
        .bind(topic_id)
        .execute(pool.as_sqlite().unwrap())
        .await
        .expect("Failed to create test item");
        result.last_insert_rowid()
    }

    #[tokio::test]
    async fn test_create_or_get_creates_new_tag() {
        let (_pool, service) = setup_test_service().await;

        let tag = service
            .create_or_get("Urban Mobility")
            .await
            .expect("Failed to create tag");

        assert!(tag.id > 0);
        assert_eq!(tag.label, "Urban Mobility");
        assert_eq!(tag.slug, "urban-mobility");
    }

    #[tokio::test]
    async fn test_create_or_get_reuses_by_slug() {
        let (_pool, service) = setup_test_service().await;

        let first = service.create_or_get("Klima").await.expect("create");
        let second = service.create_or_get("klima").await.expect("reuse");

        assert_eq!(first.id, second.id);
        assert_eq!(second.label, "Klima");
    }

    #[tokio::test]
    async fn test_create_or_get_empty_label_fails() {
        let (_pool, service) = setup_test_service().await;

        let result = service.create_or_get("   ").await;
        assert!(matches!(result, Err(TagServiceError::ValidationError(_))));
    }

    #[tokio::test]
    async fn test_list_with_counts_sorted_by_usage() {
        let (pool, service) = setup_test_service().await;
        let topic_id = create_test_topic(&pool, "t").await;

        let popular = service.create_or_get("Popular").await.expect("create");
        let rare = service.create_or_get("Rare").await.expect("create");

        for _ in 0..3 {
            let item_id = create_test_item(&pool, topic_id).await;
            service
                .attach_to_item(popular.id, item_id)
                .await
                .expect("attach");
        }
        let item_id = create_test_item(&pool, topic_id).await;
        service.attach_to_item(rare.id, item_id).await.expect("attach");

        let counts = service
            .list_with_counts(10)
            .await
            .expect("Failed to list counts");

        assert_eq!(counts.len(), 2);
        assert_eq!(counts[0].tag.label, "Popular");
        assert_eq!(counts[0].item_count, 3);
        assert_eq!(counts[1].item_count, 1);
    }

    #[tokio::test]
    async fn test_attach_to_item_requires_existing_tag() {
        let (pool, service) = setup_test_service().await;
        let topic_id = create_test_topic(&pool, "t").await;
        let item_id = create_test_item(&pool, topic_id).await;

        let result = service.attach_to_item(99999, item_id).await;
        assert!(matches!(result, Err(TagServiceError::NotFound(_))));
    }

    #[tokio::test]
    async fn test_attach_detach_topic() {
        let (pool, service) = setup_test_service().await;
        let topic_id = create_test_topic(&pool, "t").await;
        let tag = service.create_or_get("Energy").await.expect("create");

        service
            .attach_to_topic(tag.id, topic_id)
            .await
            .expect("Failed to attach");
        let tags = service.list_for_topic(topic_id).await.expect("list");
        assert_eq!(tags.len(), 1);

        service
            .detach_from_topic(tag.id, topic_id)
            .await
            .expect("Failed to detach");
        let tags = service.list_for_topic(topic_id).await.expect("list");
        assert!(tags.is_empty());
    }

    #[tokio::test]
    async fn test_delete_not_found() {
        let (_pool, service) = setup_test_service().await;

        let result = service.delete(99999).await;
        assert!(matches!(result, Err(TagServiceError::NotFound(_))));
    }

    // ========================================================================
    // Property-based tests
    // ========================================================================

    mod property_tests {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            #![proptest_config(ProptestConfig::with_cases(20))]

            /// Repeated create_or_get with the same label never creates a
            /// second tag row.
            #[test]
            fn property_tag_reuse_consistency(
                label in "[a-zA-Z]{3,20}",
                call_count in 2..8usize
            ) {
                let rt = tokio::runtime::Runtime::new().unwrap();
                let result: Result<(), TestCaseError> = rt.block_on(async {
                    let (_pool, service) = setup_test_service().await;

                    let mut ids = Vec::new();
                    for _ in 0..call_count {
                        let tag = service
                            .create_or_get(&label)
                            .await
                            .expect("create_or_get should succeed");
                        ids.push(tag.id);
                    }

                    let first = ids[0];
                    for id in &ids {
                        prop_assert_eq!(*id, first, "All calls should return the same tag");
                    }

                    let all = service.list().await.expect("list should succeed");
                    prop_assert_eq!(all.len(), 1, "Exactly one tag row should exist");

                    Ok(())
                });
                result?;
            }
        }
    }
}
