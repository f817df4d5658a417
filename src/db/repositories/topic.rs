//! Topic repository
//!
//! Database operations for topics.
//!
//! This module provides:
//! - `TopicRepository` trait defining the interface for topic data access
//! - `SqlxTopicRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateTopicInput, ListParams, Locale, Topic, UpdateTopicInput};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Topic repository trait
#[async_trait]
pub trait TopicRepository: Send + Sync {
    /// Create a new topic (slug must already be set)
    async fn create(&self, slug: &str, input: &CreateTopicInput) -> Result<Topic>;

    /// Get topic by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>>;

    /// Get topic by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>>;

    /// List topics with pagination, newest first
    async fn list(&self, params: &ListParams) -> Result<Vec<Topic>>;

    /// Count all topics
    async fn count(&self) -> Result<i64>;

    /// Update a topic
    async fn update(&self, id: i64, input: &UpdateTopicInput) -> Result<Option<Topic>>;

    /// Delete a topic
    async fn delete(&self, id: i64) -> Result<()>;

    /// Check whether a slug is already taken
    async fn exists_by_slug(&self, slug: &str) -> Result<bool>;
}

/// SQLx-based topic repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTopicRepository {
    pool: DynDatabasePool,
}

impl SqlxTopicRepository {
    /// Create a new SQLx topic repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TopicRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TopicRepository for SqlxTopicRepository {
    async fn create(&self, slug: &str, input: &CreateTopicInput) -> Result<Topic> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_topic_sqlite(self.pool.as_sqlite().unwrap(), slug, input).await
            }
            DatabaseDriver::Mysql => {
                create_topic_mysql(self.pool.as_mysql().unwrap(), slug, input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_topic_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_topic_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_topic_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_topic_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self, params: &ListParams) -> Result<Vec<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_topics_sqlite(self.pool.as_sqlite().unwrap(), params).await
            }
            DatabaseDriver::Mysql => list_topics_mysql(self.pool.as_mysql().unwrap(), params).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_topics_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_topics_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateTopicInput) -> Result<Option<Topic>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_topic_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_topic_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_topic_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_topic_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn exists_by_slug(&self, slug: &str) -> Result<bool> {
        Ok(self.get_by_slug(slug).await?.is_some())
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_topic_sqlite(
    pool: &SqlitePool,
    slug: &str,
    input: &CreateTopicInput,
) -> Result<Topic> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO topics (slug, title, description, locale, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.locale.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        locale: input.locale,
        created_at: now,
        updated_at: now,
    })
}

async fn get_topic_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get topic by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_topic_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn get_topic_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Topic>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get topic by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_topic_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_topics_sqlite(pool: &SqlitePool, params: &ListParams) -> Result<Vec<Topic>> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list topics")?;

    let mut topics = Vec::new();
    for row in rows {
        topics.push(row_to_topic_sqlite(&row)?);
    }

    Ok(topics)
}

async fn count_topics_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateTopicInput,
) -> Result<Option<Topic>> {
    let existing = get_topic_by_id_sqlite(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let title = input.title.clone().unwrap_or(existing.title);
    let description = input.description.clone().or(existing.description);
    let locale = input.locale.unwrap_or(existing.locale);
    let now = Utc::now();

    sqlx::query(
        "UPDATE topics SET title = ?, description = ?, locale = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(locale.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update topic")?;

    Ok(Some(Topic {
        id,
        slug: existing.slug,
        title,
        description,
        locale,
        created_at: existing.created_at,
        updated_at: now,
    }))
}

async fn delete_topic_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // content_items and topic_tags rows go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(())
}

fn row_to_topic_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<Topic> {
    let locale: String = row.get("locale");
    Ok(Topic {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        locale: Locale::from_str(&locale).ok_or_else(|| anyhow!("Unknown locale: {}", locale))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_topic_mysql(
    pool: &MySqlPool,
    slug: &str,
    input: &CreateTopicInput,
) -> Result<Topic> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO topics (slug, title, description, locale, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(&input.title)
    .bind(&input.description)
    .bind(input.locale.as_str())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create topic")?;

    Ok(Topic {
        id: result.last_insert_id() as i64,
        slug: slug.to_string(),
        title: input.title.clone(),
        description: input.description.clone(),
        locale: input.locale,
        created_at: now,
        updated_at: now,
    })
}

async fn get_topic_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Topic>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get topic by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_topic_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn get_topic_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Topic>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get topic by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_topic_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_topics_mysql(pool: &MySqlPool, params: &ListParams) -> Result<Vec<Topic>> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, title, description, locale, created_at, updated_at
        FROM topics
        ORDER BY created_at DESC, id DESC
        LIMIT ? OFFSET ?
        "#,
    )
    .bind(params.limit())
    .bind(params.offset())
    .fetch_all(pool)
    .await
    .context("Failed to list topics")?;

    let mut topics = Vec::new();
    for row in rows {
        topics.push(row_to_topic_mysql(&row)?);
    }

    Ok(topics)
}

async fn count_topics_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM topics")
        .fetch_one(pool)
        .await
        .context("Failed to count topics")?;

    Ok(row.get("count"))
}

async fn update_topic_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateTopicInput,
) -> Result<Option<Topic>> {
    let existing = get_topic_by_id_mysql(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let title = input.title.clone().unwrap_or(existing.title);
    let description = input.description.clone().or(existing.description);
    let locale = input.locale.unwrap_or(existing.locale);
    let now = Utc::now();

    sqlx::query(
        "UPDATE topics SET title = ?, description = ?, locale = ?, updated_at = ? WHERE id = ?",
    )
    .bind(&title)
    .bind(&description)
    .bind(locale.as_str())
    .bind(now)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update topic")?;

    Ok(Some(Topic {
        id,
        slug: existing.slug,
        title,
        description,
        locale,
        created_at: existing.created_at,
        updated_at: now,
    }))
}

async fn delete_topic_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM topics WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete topic")?;

    Ok(())
}

fn row_to_topic_mysql(row: &sqlx::mysql::MySqlRow) -> Result<Topic> {
    let locale: String = row.get("locale");
    Ok(Topic {
        id: row.get("id"),
        slug: row.get("slug"),
        title: row.get("title"),
        description: row.get("description"),
        locale: Locale::from_str(&locale).ok_or_else(|| anyhow!("Unknown locale: {}", locale))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxTopicRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxTopicRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_topic() {
        let (_pool, repo) = setup_test_repo().await;
        let input = CreateTopicInput::new("Climate Change", Locale::En);

        let created = repo
            .create("climate-change", &input)
            .await
            .expect("Failed to create topic");

        assert!(created.id > 0);
        assert_eq!(created.slug, "climate-change");
        assert_eq!(created.title, "Climate Change");
        assert_eq!(created.locale, Locale::En);
        assert!(created.description.is_none());
    }

    #[tokio::test]
    async fn test_create_topic_duplicate_slug() {
        let (_pool, repo) = setup_test_repo().await;
        let input = CreateTopicInput::new("Climate", Locale::En);

        repo.create("climate", &input)
            .await
            .expect("Failed to create topic");

        let duplicate = repo.create("climate", &input).await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_get_topic_by_slug() {
        let (_pool, repo) = setup_test_repo().await;
        let input =
            CreateTopicInput::new("Energie", Locale::De).with_description("Energiepolitik");
        repo.create("energie", &input)
            .await
            .expect("Failed to create topic");

        let found = repo
            .get_by_slug("energie")
            .await
            .expect("Failed to get topic")
            .expect("Topic not found");

        assert_eq!(found.title, "Energie");
        assert_eq!(found.description.as_deref(), Some("Energiepolitik"));
        assert_eq!(found.locale, Locale::De);
    }

    #[tokio::test]
    async fn test_get_topic_by_slug_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo
            .get_by_slug("nonexistent")
            .await
            .expect("Failed to get topic");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_exists_by_slug() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create("taken", &CreateTopicInput::new("Taken", Locale::En))
            .await
            .expect("Failed to create topic");

        assert!(repo.exists_by_slug("taken").await.expect("Failed to check"));
        assert!(!repo.exists_by_slug("free").await.expect("Failed to check"));
    }

    #[tokio::test]
    async fn test_list_topics_paged() {
        let (_pool, repo) = setup_test_repo().await;

        for i in 1..=5 {
            repo.create(
                &format!("topic-{}", i),
                &CreateTopicInput::new(format!("Topic {}", i), Locale::En),
            )
            .await
            .expect("Failed to create topic");
        }

        let page1 = repo
            .list(&ListParams::new(1, 2))
            .await
            .expect("Failed to list topics");
        assert_eq!(page1.len(), 2);

        let page3 = repo
            .list(&ListParams::new(3, 2))
            .await
            .expect("Failed to list topics");
        assert_eq!(page3.len(), 1);

        assert_eq!(repo.count().await.expect("Failed to count"), 5);
    }

    #[tokio::test]
    async fn test_update_topic() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create("original", &CreateTopicInput::new("Original", Locale::En))
            .await
            .expect("Failed to create topic");

        let updated = repo
            .update(
                created.id,
                &UpdateTopicInput {
                    title: Some("Updated".to_string()),
                    description: Some("Now with description".to_string()),
                    locale: None,
                },
            )
            .await
            .expect("Failed to update topic")
            .expect("Topic not found");

        assert_eq!(updated.title, "Updated");
        assert_eq!(updated.description.as_deref(), Some("Now with description"));
        assert_eq!(updated.slug, "original");
        assert_eq!(updated.locale, Locale::En);
    }

    #[tokio::test]
    async fn test_delete_topic() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create("to-delete", &CreateTopicInput::new("To Delete", Locale::En))
            .await
            .expect("Failed to create topic");

        repo.delete(created.id).await.expect("Failed to delete");

        let found = repo.get_by_id(created.id).await.expect("Failed to get");
        assert!(found.is_none());
    }
}
