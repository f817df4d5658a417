//! Tag repository
//!
//! Database operations for tags and their associations with topics and
//! content items.
//!
//! This module provides:
//! - `TagRepository` trait defining the interface for tag data access
//! - `SqlxTagRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{Tag, TagWithCount};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Tag repository trait
#[async_trait]
pub trait TagRepository: Send + Sync {
    /// Create a new tag
    async fn create(&self, slug: &str, label: &str) -> Result<Tag>;

    /// Get tag by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>>;

    /// Get tag by slug
    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>>;

    /// List all tags ordered by label
    async fn list(&self) -> Result<Vec<Tag>>;

    /// List tags with item usage counts, most used first
    async fn list_with_counts(&self, limit: usize) -> Result<Vec<TagWithCount>>;

    /// Delete a tag
    async fn delete(&self, id: i64) -> Result<()>;

    /// Associate tag with topic (no-op when already associated)
    async fn add_to_topic(&self, tag_id: i64, topic_id: i64) -> Result<()>;

    /// Remove tag from topic
    async fn remove_from_topic(&self, tag_id: i64, topic_id: i64) -> Result<()>;

    /// Get tags for a topic
    async fn list_for_topic(&self, topic_id: i64) -> Result<Vec<Tag>>;

    /// Associate tag with content item (no-op when already associated)
    async fn add_to_item(&self, tag_id: i64, item_id: i64) -> Result<()>;

    /// Remove tag from content item
    async fn remove_from_item(&self, tag_id: i64, item_id: i64) -> Result<()>;

    /// Get tags for a content item
    async fn list_for_item(&self, item_id: i64) -> Result<Vec<Tag>>;

    /// Count content items using a tag
    async fn count_items(&self, tag_id: i64) -> Result<i64>;
}

/// SQLx-based tag repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxTagRepository {
    pool: DynDatabasePool,
}

impl SqlxTagRepository {
    /// Create a new SQLx tag repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn TagRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl TagRepository for SqlxTagRepository {
    async fn create(&self, slug: &str, label: &str) -> Result<Tag> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_tag_sqlite(self.pool.as_sqlite().unwrap(), slug, label).await
            }
            DatabaseDriver::Mysql => {
                create_tag_mysql(self.pool.as_mysql().unwrap(), slug, label).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tag_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_tag_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn get_by_slug(&self, slug: &str) -> Result<Option<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_tag_by_slug_sqlite(self.pool.as_sqlite().unwrap(), slug).await
            }
            DatabaseDriver::Mysql => {
                get_tag_by_slug_mysql(self.pool.as_mysql().unwrap(), slug).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_tags_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_tags_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn list_with_counts(&self, limit: usize) -> Result<Vec<TagWithCount>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_tags_with_counts_sqlite(self.pool.as_sqlite().unwrap(), limit).await
            }
            DatabaseDriver::Mysql => {
                list_tags_with_counts_mysql(self.pool.as_mysql().unwrap(), limit).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_tag_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_tag_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn add_to_topic(&self, tag_id: i64, topic_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_tag_to_topic_sqlite(self.pool.as_sqlite().unwrap(), tag_id, topic_id).await
            }
            DatabaseDriver::Mysql => {
                add_tag_to_topic_mysql(self.pool.as_mysql().unwrap(), tag_id, topic_id).await
            }
        }
    }

    async fn remove_from_topic(&self, tag_id: i64, topic_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_tag_from_topic_sqlite(self.pool.as_sqlite().unwrap(), tag_id, topic_id).await
            }
            DatabaseDriver::Mysql => {
                remove_tag_from_topic_mysql(self.pool.as_mysql().unwrap(), tag_id, topic_id).await
            }
        }
    }

    async fn list_for_topic(&self, topic_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_tags_for_topic_sqlite(self.pool.as_sqlite().unwrap(), topic_id).await
            }
            DatabaseDriver::Mysql => {
                list_tags_for_topic_mysql(self.pool.as_mysql().unwrap(), topic_id).await
            }
        }
    }

    async fn add_to_item(&self, tag_id: i64, item_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                add_tag_to_item_sqlite(self.pool.as_sqlite().unwrap(), tag_id, item_id).await
            }
            DatabaseDriver::Mysql => {
                add_tag_to_item_mysql(self.pool.as_mysql().unwrap(), tag_id, item_id).await
            }
        }
    }

    async fn remove_from_item(&self, tag_id: i64, item_id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                remove_tag_from_item_sqlite(self.pool.as_sqlite().unwrap(), tag_id, item_id).await
            }
            DatabaseDriver::Mysql => {
                remove_tag_from_item_mysql(self.pool.as_mysql().unwrap(), tag_id, item_id).await
            }
        }
    }

    async fn list_for_item(&self, item_id: i64) -> Result<Vec<Tag>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_tags_for_item_sqlite(self.pool.as_sqlite().unwrap(), item_id).await
            }
            DatabaseDriver::Mysql => {
                list_tags_for_item_mysql(self.pool.as_mysql().unwrap(), item_id).await
            }
        }
    }

    async fn count_items(&self, tag_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_items_for_tag_sqlite(self.pool.as_sqlite().unwrap(), tag_id).await
            }
            DatabaseDriver::Mysql => {
                count_items_for_tag_mysql(self.pool.as_mysql().unwrap(), tag_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_tag_sqlite(pool: &SqlitePool, slug: &str, label: &str) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tags (slug, label, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(label)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_rowid(),
        slug: slug.to_string(),
        label: label.to_string(),
        created_at: now,
    })
}

async fn get_tag_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_tag_by_slug_sqlite(pool: &SqlitePool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_sqlite(&row))),
        None => Ok(None),
    }
}

async fn list_tags_sqlite(pool: &SqlitePool) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        ORDER BY label
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn list_tags_with_counts_sqlite(
    pool: &SqlitePool,
    limit: usize,
) -> Result<Vec<TagWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at, COUNT(it.item_id) as item_count
        FROM tags t
        LEFT JOIN item_tags it ON t.id = it.tag_id
        GROUP BY t.id, t.slug, t.label, t.created_at
        ORDER BY item_count DESC, t.label ASC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .context("Failed to list tags with counts")?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(TagWithCount {
            tag: row_to_tag_sqlite(&row),
            item_count: row.get("item_count"),
        });
    }

    Ok(tags)
}

async fn delete_tag_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // topic_tags and item_tags rows go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

async fn add_tag_to_topic_sqlite(pool: &SqlitePool, tag_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO topic_tags (topic_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(topic_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to topic")?;

    Ok(())
}

async fn remove_tag_from_topic_sqlite(pool: &SqlitePool, tag_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM topic_tags
        WHERE topic_id = ? AND tag_id = ?
        "#,
    )
    .bind(topic_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from topic")?;

    Ok(())
}

async fn list_tags_for_topic_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at
        FROM tags t
        INNER JOIN topic_tags tt ON t.id = tt.tag_id
        WHERE tt.topic_id = ?
        ORDER BY t.label
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for topic")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn add_tag_to_item_sqlite(pool: &SqlitePool, tag_id: i64, item_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT OR IGNORE INTO item_tags (item_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(item_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to item")?;

    Ok(())
}

async fn remove_tag_from_item_sqlite(pool: &SqlitePool, tag_id: i64, item_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM item_tags
        WHERE item_id = ? AND tag_id = ?
        "#,
    )
    .bind(item_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from item")?;

    Ok(())
}

async fn list_tags_for_item_sqlite(pool: &SqlitePool, item_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at
        FROM tags t
        INNER JOIN item_tags it ON t.id = it.tag_id
        WHERE it.item_id = ?
        ORDER BY t.label
        "#,
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for item")?;

    Ok(rows.iter().map(row_to_tag_sqlite).collect())
}

async fn count_items_for_tag_sqlite(pool: &SqlitePool, tag_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM item_tags WHERE tag_id = ?")
        .bind(tag_id)
        .fetch_one(pool)
        .await
        .context("Failed to count items for tag")?;

    Ok(row.get("count"))
}

fn row_to_tag_sqlite(row: &sqlx::sqlite::SqliteRow) -> Tag {
    Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        label: row.get("label"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_tag_mysql(pool: &MySqlPool, slug: &str, label: &str) -> Result<Tag> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO tags (slug, label, created_at)
        VALUES (?, ?, ?)
        "#,
    )
    .bind(slug)
    .bind(label)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create tag")?;

    Ok(Tag {
        id: result.last_insert_id() as i64,
        slug: slug.to_string(),
        label: label.to_string(),
        created_at: now,
    })
}

async fn get_tag_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_tag_by_slug_mysql(pool: &MySqlPool, slug: &str) -> Result<Option<Tag>> {
    let row = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        WHERE slug = ?
        "#,
    )
    .bind(slug)
    .fetch_optional(pool)
    .await
    .context("Failed to get tag by slug")?;

    match row {
        Some(row) => Ok(Some(row_to_tag_mysql(&row))),
        None => Ok(None),
    }
}

async fn list_tags_mysql(pool: &MySqlPool) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT id, slug, label, created_at
        FROM tags
        ORDER BY label
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list tags")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn list_tags_with_counts_mysql(pool: &MySqlPool, limit: usize) -> Result<Vec<TagWithCount>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at, COUNT(it.item_id) as item_count
        FROM tags t
        LEFT JOIN item_tags it ON t.id = it.tag_id
        GROUP BY t.id, t.slug, t.label, t.created_at
        ORDER BY item_count DESC, t.label ASC
        LIMIT ?
        "#,
    )
    .bind(limit as i64)
    .fetch_all(pool)
    .await
    .context("Failed to list tags with counts")?;

    let mut tags = Vec::new();
    for row in rows {
        tags.push(TagWithCount {
            tag: row_to_tag_mysql(&row),
            item_count: row.get("item_count"),
        });
    }

    Ok(tags)
}

async fn delete_tag_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM tags WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete tag")?;

    Ok(())
}

async fn add_tag_to_topic_mysql(pool: &MySqlPool, tag_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO topic_tags (topic_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(topic_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to topic")?;

    Ok(())
}

async fn remove_tag_from_topic_mysql(pool: &MySqlPool, tag_id: i64, topic_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM topic_tags
        WHERE topic_id = ? AND tag_id = ?
        "#,
    )
    .bind(topic_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from topic")?;

    Ok(())
}

async fn list_tags_for_topic_mysql(pool: &MySqlPool, topic_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at
        FROM tags t
        INNER JOIN topic_tags tt ON t.id = tt.tag_id
        WHERE tt.topic_id = ?
        ORDER BY t.label
        "#,
    )
    .bind(topic_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for topic")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn add_tag_to_item_mysql(pool: &MySqlPool, tag_id: i64, item_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        INSERT IGNORE INTO item_tags (item_id, tag_id)
        VALUES (?, ?)
        "#,
    )
    .bind(item_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to add tag to item")?;

    Ok(())
}

async fn remove_tag_from_item_mysql(pool: &MySqlPool, tag_id: i64, item_id: i64) -> Result<()> {
    sqlx::query(
        r#"
        DELETE FROM item_tags
        WHERE item_id = ? AND tag_id = ?
        "#,
    )
    .bind(item_id)
    .bind(tag_id)
    .execute(pool)
    .await
    .context("Failed to remove tag from item")?;

    Ok(())
}

async fn list_tags_for_item_mysql(pool: &MySqlPool, item_id: i64) -> Result<Vec<Tag>> {
    let rows = sqlx::query(
        r#"
        SELECT t.id, t.slug, t.label, t.created_at
        FROM tags t
        INNER JOIN item_tags it ON t.id = it.tag_id
        WHERE it.item_id = ?
        ORDER BY t.label
        "#,
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
    .context("Failed to list tags for item")?;

    Ok(rows.iter().map(row_to_tag_mysql).collect())
}

async fn count_items_for_tag_mysql(pool: &MySqlPool, tag_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM item_tags WHERE tag_id = ?")
        .bind(tag_id)
        .fetch_one(pool)
        .await
        .context("Failed to count items for tag")?;

    Ok(row.get("count"))
}

fn row_to_tag_mysql(row: &sqlx::mysql::MySqlRow) -> Tag {
    Tag {
        id: row.get("id"),
        slug: row.get("slug"),
        label: row.get("label"),
        created_at: row.get("created_at"),
    }
}
