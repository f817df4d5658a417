//! Content item repository
//!
//! Database operations for content items.
//!
//! This module provides:
//! - `ContentItemRepository` trait defining the interface for item data access
//! - `SqlxContentItemRepository` implementing the trait for SQLite and MySQL
//! - `LiveQuery` describing a live-feed lookup
//!
//! An item is live when it is published, its publish_at is unset or in the
//! past, and its expire_at is unset or in the future.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{
    ContentItem, ContentKind, CreateContentItemInput, JsonField, Locale, PublishStatus,
    RegionMode, UpdateContentItemInput,
};
use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Parameters for a live-feed query
#[derive(Debug, Clone)]
pub struct LiveQuery {
    /// Locale of the requesting audience
    pub locale: Locale,
    /// Resolved region of the audience; None means only global items match
    pub region_id: Option<i64>,
    /// Optional kind filter
    pub kind: Option<ContentKind>,
    /// Reference time for publish_at/expire_at checks
    pub now: DateTime<Utc>,
    /// Maximum number of rows to return
    pub limit: i64,
    /// Number of rows to skip
    pub offset: i64,
}

/// Content item repository trait
#[async_trait]
pub trait ContentItemRepository: Send + Sync {
    /// Create a new content item (status starts at draft)
    async fn create(&self, input: &CreateContentItemInput) -> Result<ContentItem>;

    /// Get item by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<ContentItem>>;

    /// List items for a topic, newest first
    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<ContentItem>>;

    /// List items with a given status, newest first
    async fn list_by_status(&self, status: PublishStatus) -> Result<Vec<ContentItem>>;

    /// List live items matching the query
    async fn list_live(&self, query: &LiveQuery) -> Result<Vec<ContentItem>>;

    /// Count live items matching the query (limit/offset are ignored)
    async fn count_live(&self, query: &LiveQuery) -> Result<i64>;

    /// Update a content item
    async fn update(&self, id: i64, input: &UpdateContentItemInput) -> Result<Option<ContentItem>>;

    /// Set the publication status; when `publish_at` is given, it is stamped too
    async fn set_status(
        &self,
        id: i64,
        status: PublishStatus,
        publish_at: Option<DateTime<Utc>>,
    ) -> Result<()>;

    /// Store the resolved effective region (None clears it)
    async fn set_effective_region(&self, id: i64, region_id: Option<i64>) -> Result<()>;

    /// List published items whose expire_at has passed
    async fn list_due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>>;

    /// Count items in a topic
    async fn count_by_topic(&self, topic_id: i64) -> Result<i64>;

    /// Count all items
    async fn count(&self) -> Result<i64>;

    /// Delete a content item
    async fn delete(&self, id: i64) -> Result<()>;
}

/// SQLx-based content item repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxContentItemRepository {
    pool: DynDatabasePool,
}

impl SqlxContentItemRepository {
    /// Create a new SQLx content item repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn ContentItemRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl ContentItemRepository for SqlxContentItemRepository {
    async fn create(&self, input: &CreateContentItemInput) -> Result<ContentItem> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_item_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => create_item_mysql(self.pool.as_mysql().unwrap(), input).await,
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_item_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => get_item_by_id_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn list_by_topic(&self, topic_id: i64) -> Result<Vec<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_items_by_topic_sqlite(self.pool.as_sqlite().unwrap(), topic_id).await
            }
            DatabaseDriver::Mysql => {
                list_items_by_topic_mysql(self.pool.as_mysql().unwrap(), topic_id).await
            }
        }
    }

    async fn list_by_status(&self, status: PublishStatus) -> Result<Vec<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_items_by_status_sqlite(self.pool.as_sqlite().unwrap(), status).await
            }
            DatabaseDriver::Mysql => {
                list_items_by_status_mysql(self.pool.as_mysql().unwrap(), status).await
            }
        }
    }

    async fn list_live(&self, query: &LiveQuery) -> Result<Vec<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_live_sqlite(self.pool.as_sqlite().unwrap(), query).await
            }
            DatabaseDriver::Mysql => list_live_mysql(self.pool.as_mysql().unwrap(), query).await,
        }
    }

    async fn count_live(&self, query: &LiveQuery) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_live_sqlite(self.pool.as_sqlite().unwrap(), query).await
            }
            DatabaseDriver::Mysql => count_live_mysql(self.pool.as_mysql().unwrap(), query).await,
        }
    }

    async fn update(&self, id: i64, input: &UpdateContentItemInput) -> Result<Option<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_item_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_item_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn set_status(
        &self,
        id: i64,
        status: PublishStatus,
        publish_at: Option<DateTime<Utc>>,
    ) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_status_sqlite(self.pool.as_sqlite().unwrap(), id, status, publish_at).await
            }
            DatabaseDriver::Mysql => {
                set_status_mysql(self.pool.as_mysql().unwrap(), id, status, publish_at).await
            }
        }
    }

    async fn set_effective_region(&self, id: i64, region_id: Option<i64>) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                set_effective_region_sqlite(self.pool.as_sqlite().unwrap(), id, region_id).await
            }
            DatabaseDriver::Mysql => {
                set_effective_region_mysql(self.pool.as_mysql().unwrap(), id, region_id).await
            }
        }
    }

    async fn list_due_for_expiry(&self, now: DateTime<Utc>) -> Result<Vec<ContentItem>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_due_for_expiry_sqlite(self.pool.as_sqlite().unwrap(), now).await
            }
            DatabaseDriver::Mysql => {
                list_due_for_expiry_mysql(self.pool.as_mysql().unwrap(), now).await
            }
        }
    }

    async fn count_by_topic(&self, topic_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_items_by_topic_sqlite(self.pool.as_sqlite().unwrap(), topic_id).await
            }
            DatabaseDriver::Mysql => {
                count_items_by_topic_mysql(self.pool.as_mysql().unwrap(), topic_id).await
            }
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_items_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_items_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => delete_item_sqlite(self.pool.as_sqlite().unwrap(), id).await,
            DatabaseDriver::Mysql => delete_item_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }
}

const ITEM_COLUMNS: &str = "id, kind, locale, topic_id, text, rich_text, status, publish_at, \
     expire_at, region_mode, manual_region_id, effective_region_id, region_auto, validation, \
     meta, created_at, updated_at";

/// Build the WHERE clause shared by list_live and count_live.
///
/// Bind order: now, now, locale, [kind], [region_id].
fn live_predicate(query: &LiveQuery) -> String {
    let mut sql = String::from(
        "status = 'published' \
         AND (publish_at IS NULL OR publish_at <= ?) \
         AND (expire_at IS NULL OR expire_at > ?) \
         AND locale = ?",
    );
    if query.kind.is_some() {
        sql.push_str(" AND kind = ?");
    }
    match query.region_id {
        Some(_) => sql.push_str(" AND (effective_region_id = ? OR effective_region_id IS NULL)"),
        None => sql.push_str(" AND effective_region_id IS NULL"),
    }
    sql
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_item_sqlite(
    pool: &SqlitePool,
    input: &CreateContentItemInput,
) -> Result<ContentItem> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO content_items
            (kind, locale, topic_id, text, rich_text, status, publish_at, expire_at,
             region_mode, manual_region_id, region_auto, validation, meta,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.kind.as_str())
    .bind(input.locale.as_str())
    .bind(input.topic_id)
    .bind(&input.text)
    .bind(&input.rich_text)
    .bind(PublishStatus::Draft.as_str())
    .bind(input.publish_at)
    .bind(input.expire_at)
    .bind(input.region_mode.as_str())
    .bind(input.manual_region_id)
    .bind(input.region_auto.to_db())
    .bind(input.validation.to_db())
    .bind(input.meta.to_db())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create content item")?;

    Ok(ContentItem {
        id: result.last_insert_rowid(),
        kind: input.kind,
        locale: input.locale,
        topic_id: input.topic_id,
        text: input.text.clone(),
        rich_text: input.rich_text.clone(),
        status: PublishStatus::Draft,
        publish_at: input.publish_at,
        expire_at: input.expire_at,
        region_mode: input.region_mode,
        manual_region_id: input.manual_region_id,
        effective_region_id: None,
        region_auto: input.region_auto.clone(),
        validation: input.validation.clone(),
        meta: input.meta.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_item_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<ContentItem>> {
    let sql = format!("SELECT {} FROM content_items WHERE id = ?", ITEM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content item by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_item_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_items_by_topic_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE topic_id = ? ORDER BY created_at DESC, id DESC",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(topic_id)
        .fetch_all(pool)
        .await
        .context("Failed to list content items by topic")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_sqlite(&row)?);
    }

    Ok(items)
}

async fn list_items_by_status_sqlite(
    pool: &SqlitePool,
    status: PublishStatus,
) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE status = ? ORDER BY created_at DESC, id DESC",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await
        .context("Failed to list content items by status")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_sqlite(&row)?);
    }

    Ok(items)
}

async fn list_live_sqlite(pool: &SqlitePool, query: &LiveQuery) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE {} \
         ORDER BY publish_at DESC, id DESC LIMIT ? OFFSET ?",
        ITEM_COLUMNS,
        live_predicate(query)
    );

    let mut q = sqlx::query(&sql)
        .bind(query.now)
        .bind(query.now)
        .bind(query.locale.as_str());
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(region_id) = query.region_id {
        q = q.bind(region_id);
    }
    let rows = q
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list live content items")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_sqlite(&row)?);
    }

    Ok(items)
}

async fn count_live_sqlite(pool: &SqlitePool, query: &LiveQuery) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) as count FROM content_items WHERE {}",
        live_predicate(query)
    );

    let mut q = sqlx::query(&sql)
        .bind(query.now)
        .bind(query.now)
        .bind(query.locale.as_str());
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(region_id) = query.region_id {
        q = q.bind(region_id);
    }
    let row = q
        .fetch_one(pool)
        .await
        .context("Failed to count live content items")?;

    Ok(row.get("count"))
}

async fn update_item_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateContentItemInput,
) -> Result<Option<ContentItem>> {
    let existing = get_item_by_id_sqlite(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let merged = merge_update(existing, input);

    sqlx::query(
        r#"
        UPDATE content_items
        SET text = ?, rich_text = ?, publish_at = ?, expire_at = ?, region_mode = ?,
            manual_region_id = ?, region_auto = ?, validation = ?, meta = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.text)
    .bind(&merged.rich_text)
    .bind(merged.publish_at)
    .bind(merged.expire_at)
    .bind(merged.region_mode.as_str())
    .bind(merged.manual_region_id)
    .bind(merged.region_auto.to_db())
    .bind(merged.validation.to_db())
    .bind(merged.meta.to_db())
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update content item")?;

    Ok(Some(merged))
}

async fn set_status_sqlite(
    pool: &SqlitePool,
    id: i64,
    status: PublishStatus,
    publish_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let now = Utc::now();

    match publish_at {
        Some(publish_at) => {
            sqlx::query(
                "UPDATE content_items SET status = ?, publish_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(publish_at)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to set content item status")?;
        }
        None => {
            sqlx::query("UPDATE content_items SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to set content item status")?;
        }
    }

    Ok(())
}

async fn set_effective_region_sqlite(
    pool: &SqlitePool,
    id: i64,
    region_id: Option<i64>,
) -> Result<()> {
    sqlx::query("UPDATE content_items SET effective_region_id = ?, updated_at = ? WHERE id = ?")
        .bind(region_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set effective region")?;

    Ok(())
}

async fn list_due_for_expiry_sqlite(
    pool: &SqlitePool,
    now: DateTime<Utc>,
) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items \
         WHERE status = 'published' AND expire_at IS NOT NULL AND expire_at <= ? \
         ORDER BY expire_at",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list items due for expiry")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_sqlite(&row)?);
    }

    Ok(items)
}

async fn count_items_by_topic_sqlite(pool: &SqlitePool, topic_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM content_items WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .context("Failed to count content items by topic")?;

    Ok(row.get("count"))
}

async fn count_items_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM content_items")
        .fetch_one(pool)
        .await
        .context("Failed to count content items")?;

    Ok(row.get("count"))
}

async fn delete_item_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    // item_tags and answer_options rows go with it via ON DELETE CASCADE
    sqlx::query("DELETE FROM content_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete content item")?;

    Ok(())
}

fn row_to_item_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<ContentItem> {
    let kind: String = row.get("kind");
    let locale: String = row.get("locale");
    let status: String = row.get("status");
    let region_mode: String = row.get("region_mode");

    Ok(ContentItem {
        id: row.get("id"),
        kind: ContentKind::from_str(&kind).ok_or_else(|| anyhow!("Unknown kind: {}", kind))?,
        locale: Locale::from_str(&locale).ok_or_else(|| anyhow!("Unknown locale: {}", locale))?,
        topic_id: row.get("topic_id"),
        text: row.get("text"),
        rich_text: row.get("rich_text"),
        status: PublishStatus::from_str(&status)
            .ok_or_else(|| anyhow!("Unknown status: {}", status))?,
        publish_at: row.get("publish_at"),
        expire_at: row.get("expire_at"),
        region_mode: RegionMode::from_str(&region_mode)
            .ok_or_else(|| anyhow!("Unknown region mode: {}", region_mode))?,
        manual_region_id: row.get("manual_region_id"),
        effective_region_id: row.get("effective_region_id"),
        region_auto: JsonField::from_db(row.get("region_auto"))?,
        validation: JsonField::from_db(row.get("validation"))?,
        meta: JsonField::from_db(row.get("meta"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_item_mysql(
    pool: &MySqlPool,
    input: &CreateContentItemInput,
) -> Result<ContentItem> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO content_items
            (kind, locale, topic_id, text, rich_text, status, publish_at, expire_at,
             region_mode, manual_region_id, region_auto, validation, meta,
             created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(input.kind.as_str())
    .bind(input.locale.as_str())
    .bind(input.topic_id)
    .bind(&input.text)
    .bind(&input.rich_text)
    .bind(PublishStatus::Draft.as_str())
    .bind(input.publish_at)
    .bind(input.expire_at)
    .bind(input.region_mode.as_str())
    .bind(input.manual_region_id)
    .bind(input.region_auto.to_db())
    .bind(input.validation.to_db())
    .bind(input.meta.to_db())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create content item")?;

    Ok(ContentItem {
        id: result.last_insert_id() as i64,
        kind: input.kind,
        locale: input.locale,
        topic_id: input.topic_id,
        text: input.text.clone(),
        rich_text: input.rich_text.clone(),
        status: PublishStatus::Draft,
        publish_at: input.publish_at,
        expire_at: input.expire_at,
        region_mode: input.region_mode,
        manual_region_id: input.manual_region_id,
        effective_region_id: None,
        region_auto: input.region_auto.clone(),
        validation: input.validation.clone(),
        meta: input.meta.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_item_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<ContentItem>> {
    let sql = format!("SELECT {} FROM content_items WHERE id = ?", ITEM_COLUMNS);
    let row = sqlx::query(&sql)
        .bind(id)
        .fetch_optional(pool)
        .await
        .context("Failed to get content item by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_item_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_items_by_topic_mysql(pool: &MySqlPool, topic_id: i64) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE topic_id = ? ORDER BY created_at DESC, id DESC",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(topic_id)
        .fetch_all(pool)
        .await
        .context("Failed to list content items by topic")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_mysql(&row)?);
    }

    Ok(items)
}

async fn list_items_by_status_mysql(
    pool: &MySqlPool,
    status: PublishStatus,
) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE status = ? ORDER BY created_at DESC, id DESC",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(status.as_str())
        .fetch_all(pool)
        .await
        .context("Failed to list content items by status")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_mysql(&row)?);
    }

    Ok(items)
}

async fn list_live_mysql(pool: &MySqlPool, query: &LiveQuery) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items WHERE {} \
         ORDER BY publish_at DESC, id DESC LIMIT ? OFFSET ?",
        ITEM_COLUMNS,
        live_predicate(query)
    );

    let mut q = sqlx::query(&sql)
        .bind(query.now)
        .bind(query.now)
        .bind(query.locale.as_str());
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(region_id) = query.region_id {
        q = q.bind(region_id);
    }
    let rows = q
        .bind(query.limit)
        .bind(query.offset)
        .fetch_all(pool)
        .await
        .context("Failed to list live content items")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_mysql(&row)?);
    }

    Ok(items)
}

async fn count_live_mysql(pool: &MySqlPool, query: &LiveQuery) -> Result<i64> {
    let sql = format!(
        "SELECT COUNT(*) as count FROM content_items WHERE {}",
        live_predicate(query)
    );

    let mut q = sqlx::query(&sql)
        .bind(query.now)
        .bind(query.now)
        .bind(query.locale.as_str());
    if let Some(kind) = query.kind {
        q = q.bind(kind.as_str());
    }
    if let Some(region_id) = query.region_id {
        q = q.bind(region_id);
    }
    let row = q
        .fetch_one(pool)
        .await
        .context("Failed to count live content items")?;

    Ok(row.get("count"))
}

async fn update_item_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateContentItemInput,
) -> Result<Option<ContentItem>> {
    let existing = get_item_by_id_mysql(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let merged = merge_update(existing, input);

    sqlx::query(
        r#"
        UPDATE content_items
        SET text = ?, rich_text = ?, publish_at = ?, expire_at = ?, region_mode = ?,
            manual_region_id = ?, region_auto = ?, validation = ?, meta = ?, updated_at = ?
        WHERE id = ?
        "#,
    )
    .bind(&merged.text)
    .bind(&merged.rich_text)
    .bind(merged.publish_at)
    .bind(merged.expire_at)
    .bind(merged.region_mode.as_str())
    .bind(merged.manual_region_id)
    .bind(merged.region_auto.to_db())
    .bind(merged.validation.to_db())
    .bind(merged.meta.to_db())
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update content item")?;

    Ok(Some(merged))
}

async fn set_status_mysql(
    pool: &MySqlPool,
    id: i64,
    status: PublishStatus,
    publish_at: Option<DateTime<Utc>>,
) -> Result<()> {
    let now = Utc::now();

    match publish_at {
        Some(publish_at) => {
            sqlx::query(
                "UPDATE content_items SET status = ?, publish_at = ?, updated_at = ? WHERE id = ?",
            )
            .bind(status.as_str())
            .bind(publish_at)
            .bind(now)
            .bind(id)
            .execute(pool)
            .await
            .context("Failed to set content item status")?;
        }
        None => {
            sqlx::query("UPDATE content_items SET status = ?, updated_at = ? WHERE id = ?")
                .bind(status.as_str())
                .bind(now)
                .bind(id)
                .execute(pool)
                .await
                .context("Failed to set content item status")?;
        }
    }

    Ok(())
}

async fn set_effective_region_mysql(
    pool: &MySqlPool,
    id: i64,
    region_id: Option<i64>,
) -> Result<()> {
    sqlx::query("UPDATE content_items SET effective_region_id = ?, updated_at = ? WHERE id = ?")
        .bind(region_id)
        .bind(Utc::now())
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to set effective region")?;

    Ok(())
}

async fn list_due_for_expiry_mysql(
    pool: &MySqlPool,
    now: DateTime<Utc>,
) -> Result<Vec<ContentItem>> {
    let sql = format!(
        "SELECT {} FROM content_items \
         WHERE status = 'published' AND expire_at IS NOT NULL AND expire_at <= ? \
         ORDER BY expire_at",
        ITEM_COLUMNS
    );
    let rows = sqlx::query(&sql)
        .bind(now)
        .fetch_all(pool)
        .await
        .context("Failed to list items due for expiry")?;

    let mut items = Vec::new();
    for row in rows {
        items.push(row_to_item_mysql(&row)?);
    }

    Ok(items)
}

async fn count_items_by_topic_mysql(pool: &MySqlPool, topic_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM content_items WHERE topic_id = ?")
        .bind(topic_id)
        .fetch_one(pool)
        .await
        .context("Failed to count content items by topic")?;

    Ok(row.get("count"))
}

async fn count_items_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM content_items")
        .fetch_one(pool)
        .await
        .context("Failed to count content items")?;

    Ok(row.get("count"))
}

async fn delete_item_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM content_items WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete content item")?;

    Ok(())
}

fn row_to_item_mysql(row: &sqlx::mysql::MySqlRow) -> Result<ContentItem> {
    let kind: String = row.get("kind");
    let locale: String = row.get("locale");
    let status: String = row.get("status");
    let region_mode: String = row.get("region_mode");

    Ok(ContentItem {
        id: row.get("id"),
        kind: ContentKind::from_str(&kind).ok_or_else(|| anyhow!("Unknown kind: {}", kind))?,
        locale: Locale::from_str(&locale).ok_or_else(|| anyhow!("Unknown locale: {}", locale))?,
        topic_id: row.get("topic_id"),
        text: row.get("text"),
        rich_text: row.get("rich_text"),
        status: PublishStatus::from_str(&status)
            .ok_or_else(|| anyhow!("Unknown status: {}", status))?,
        publish_at: row.get("publish_at"),
        expire_at: row.get("expire_at"),
        region_mode: RegionMode::from_str(&region_mode)
            .ok_or_else(|| anyhow!("Unknown region mode: {}", region_mode))?,
        manual_region_id: row.get("manual_region_id"),
        effective_region_id: row.get("effective_region_id"),
        region_auto: JsonField::from_db(row.get("region_auto"))?,
        validation: JsonField::from_db(row.get("validation"))?,
        meta: JsonField::from_db(row.get("meta"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

/// Apply an update input to an existing item.
///
/// A JSON field is replaced only when the input provides one; sending
/// `JsonField::DbNull` explicitly clears the column.
fn merge_update(existing: ContentItem, input: &UpdateContentItemInput) -> ContentItem {
    ContentItem {
        text: input.text.clone().unwrap_or(existing.text),
        rich_text: input.rich_text.clone().or(existing.rich_text),
        publish_at: input.publish_at.or(existing.publish_at),
        expire_at: input.expire_at.or(existing.expire_at),
        region_mode: input.region_mode.unwrap_or(existing.region_mode),
        manual_region_id: input.manual_region_id.or(existing.manual_region_id),
        region_auto: input.region_auto.clone().unwrap_or(existing.region_auto),
        validation: input.validation.clone().unwrap_or(existing.validation),
        meta: input.meta.clone().unwrap_or(existing.meta),
        updated_at: Utc::now(),
        ..existing
    }
}
