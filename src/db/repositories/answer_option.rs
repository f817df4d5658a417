//! Answer option repository
//!
//! Database operations for poll answer options. Options belong to a content
//! item and are unique per item on both sort_order and value.

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{AnswerOption, CreateAnswerOptionInput, JsonField, UpdateAnswerOptionInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Answer option repository trait
#[async_trait]
pub trait AnswerOptionRepository: Send + Sync {
    /// Create an option for a content item
    async fn create(&self, item_id: i64, input: &CreateAnswerOptionInput) -> Result<AnswerOption>;

    /// Get option by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<AnswerOption>>;

    /// List options for an item ordered by sort_order
    async fn list_for_item(&self, item_id: i64) -> Result<Vec<AnswerOption>>;

    /// Count options for an item
    async fn count_for_item(&self, item_id: i64) -> Result<i64>;

    /// Update an option
    async fn update(&self, id: i64, input: &UpdateAnswerOptionInput) -> Result<Option<AnswerOption>>;

    /// Delete an option
    async fn delete(&self, id: i64) -> Result<()>;

    /// Delete all options of an item
    async fn delete_for_item(&self, item_id: i64) -> Result<u64>;
}

/// SQLx-based answer option repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxAnswerOptionRepository {
    pool: DynDatabasePool,
}

impl SqlxAnswerOptionRepository {
    /// Create a new SQLx answer option repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn AnswerOptionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl AnswerOptionRepository for SqlxAnswerOptionRepository {
    async fn create(&self, item_id: i64, input: &CreateAnswerOptionInput) -> Result<AnswerOption> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_option_sqlite(self.pool.as_sqlite().unwrap(), item_id, input).await
            }
            DatabaseDriver::Mysql => {
                create_option_mysql(self.pool.as_mysql().unwrap(), item_id, input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<AnswerOption>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_option_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_option_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn list_for_item(&self, item_id: i64) -> Result<Vec<AnswerOption>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_options_for_item_sqlite(self.pool.as_sqlite().unwrap(), item_id).await
            }
            DatabaseDriver::Mysql => {
                list_options_for_item_mysql(self.pool.as_mysql().unwrap(), item_id).await
            }
        }
    }

    async fn count_for_item(&self, item_id: i64) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                count_options_for_item_sqlite(self.pool.as_sqlite().unwrap(), item_id).await
            }
            DatabaseDriver::Mysql => {
                count_options_for_item_mysql(self.pool.as_mysql().unwrap(), item_id).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateAnswerOptionInput) -> Result<Option<AnswerOption>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_option_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_option_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_option_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_option_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn delete_for_item(&self, item_id: i64) -> Result<u64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_options_for_item_sqlite(self.pool.as_sqlite().unwrap(), item_id).await
            }
            DatabaseDriver::Mysql => {
                delete_options_for_item_mysql(self.pool.as_mysql().unwrap(), item_id).await
            }
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_option_sqlite(
    pool: &SqlitePool,
    item_id: i64,
    input: &CreateAnswerOptionInput,
) -> Result<AnswerOption> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO answer_options
            (item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item_id)
    .bind(&input.value)
    .bind(&input.label)
    .bind(input.sort_order)
    .bind(input.is_exclusive)
    .bind(input.meta.to_db())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create answer option")?;

    Ok(AnswerOption {
        id: result.last_insert_rowid(),
        item_id,
        value: input.value.clone(),
        label: input.label.clone(),
        sort_order: input.sort_order,
        is_exclusive: input.is_exclusive,
        meta: input.meta.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_option_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<AnswerOption>> {
    let row = sqlx::query(
        "SELECT id, item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at \
         FROM answer_options WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get answer option by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_option_sqlite(&row)?)),
        None => Ok(None),
    }
}

async fn list_options_for_item_sqlite(
    pool: &SqlitePool,
    item_id: i64,
) -> Result<Vec<AnswerOption>> {
    let rows = sqlx::query(
        "SELECT id, item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at \
         FROM answer_options WHERE item_id = ? ORDER BY sort_order",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
    .context("Failed to list answer options")?;

    let mut options = Vec::new();
    for row in rows {
        options.push(row_to_option_sqlite(&row)?);
    }

    Ok(options)
}

async fn count_options_for_item_sqlite(pool: &SqlitePool, item_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM answer_options WHERE item_id = ?")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .context("Failed to count answer options")?;

    Ok(row.get("count"))
}

async fn update_option_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateAnswerOptionInput,
) -> Result<Option<AnswerOption>> {
    let existing = get_option_by_id_sqlite(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let merged = merge_update(existing, input);

    sqlx::query(
        "UPDATE answer_options \
         SET value = ?, label = ?, sort_order = ?, is_exclusive = ?, meta = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&merged.value)
    .bind(&merged.label)
    .bind(merged.sort_order)
    .bind(merged.is_exclusive)
    .bind(merged.meta.to_db())
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update answer option")?;

    Ok(Some(merged))
}

async fn delete_option_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM answer_options WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete answer option")?;

    Ok(())
}

async fn delete_options_for_item_sqlite(pool: &SqlitePool, item_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM answer_options WHERE item_id = ?")
        .bind(item_id)
        .execute(pool)
        .await
        .context("Failed to delete answer options")?;

    Ok(result.rows_affected())
}

fn row_to_option_sqlite(row: &sqlx::sqlite::SqliteRow) -> Result<AnswerOption> {
    Ok(AnswerOption {
        id: row.get("id"),
        item_id: row.get("item_id"),
        value: row.get("value"),
        label: row.get("label"),
        sort_order: row.get("sort_order"),
        is_exclusive: row.get("is_exclusive"),
        meta: JsonField::from_db(row.get("meta"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_option_mysql(
    pool: &MySqlPool,
    item_id: i64,
    input: &CreateAnswerOptionInput,
) -> Result<AnswerOption> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO answer_options
            (item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at)
        VALUES (?, ?, ?, ?, ?, ?, ?, ?)
        "#,
    )
    .bind(item_id)
    .bind(&input.value)
    .bind(&input.label)
    .bind(input.sort_order)
    .bind(input.is_exclusive)
    .bind(input.meta.to_db())
    .bind(now)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create answer option")?;

    Ok(AnswerOption {
        id: result.last_insert_id() as i64,
        item_id,
        value: input.value.clone(),
        label: input.label.clone(),
        sort_order: input.sort_order,
        is_exclusive: input.is_exclusive,
        meta: input.meta.clone(),
        created_at: now,
        updated_at: now,
    })
}

async fn get_option_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<AnswerOption>> {
    let row = sqlx::query(
        "SELECT id, item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at \
         FROM answer_options WHERE id = ?",
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get answer option by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_option_mysql(&row)?)),
        None => Ok(None),
    }
}

async fn list_options_for_item_mysql(pool: &MySqlPool, item_id: i64) -> Result<Vec<AnswerOption>> {
    let rows = sqlx::query(
        "SELECT id, item_id, value, label, sort_order, is_exclusive, meta, created_at, updated_at \
         FROM answer_options WHERE item_id = ? ORDER BY sort_order",
    )
    .bind(item_id)
    .fetch_all(pool)
    .await
    .context("Failed to list answer options")?;

    let mut options = Vec::new();
    for row in rows {
        options.push(row_to_option_mysql(&row)?);
    }

    Ok(options)
}

async fn count_options_for_item_mysql(pool: &MySqlPool, item_id: i64) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM answer_options WHERE item_id = ?")
        .bind(item_id)
        .fetch_one(pool)
        .await
        .context("Failed to count answer options")?;

    Ok(row.get("count"))
}

async fn update_option_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateAnswerOptionInput,
) -> Result<Option<AnswerOption>> {
    let existing = get_option_by_id_mysql(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let merged = merge_update(existing, input);

    sqlx::query(
        "UPDATE answer_options \
         SET value = ?, label = ?, sort_order = ?, is_exclusive = ?, meta = ?, updated_at = ? \
         WHERE id = ?",
    )
    .bind(&merged.value)
    .bind(&merged.label)
    .bind(merged.sort_order)
    .bind(merged.is_exclusive)
    .bind(merged.meta.to_db())
    .bind(merged.updated_at)
    .bind(id)
    .execute(pool)
    .await
    .context("Failed to update answer option")?;

    Ok(Some(merged))
}

async fn delete_option_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM answer_options WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete answer option")?;

    Ok(())
}

async fn delete_options_for_item_mysql(pool: &MySqlPool, item_id: i64) -> Result<u64> {
    let result = sqlx::query("DELETE FROM answer_options WHERE item_id = ?")
        .bind(item_id)
        .execute(pool)
        .await
        .context("Failed to delete answer options")?;

    Ok(result.rows_affected())
}

fn row_to_option_mysql(row: &sqlx::mysql::MySqlRow) -> Result<AnswerOption> {
    Ok(AnswerOption {
        id: row.get("id"),
        item_id: row.get("item_id"),
        value: row.get("value"),
        label: row.get("label"),
        sort_order: row.get("sort_order"),
        is_exclusive: row.get("is_exclusive"),
        meta: JsonField::from_db(row.get("meta"))?,
        created_at: row.get("created_at"),
        updated_at: row.get("updated_at"),
    })
}

fn merge_update(existing: AnswerOption, input: &UpdateAnswerOptionInput) -> AnswerOption {
    AnswerOption {
        value: input.value.clone().unwrap_or(existing.value),
        label: input.label.clone().unwrap_or(existing.label),
        sort_order: input.sort_order.unwrap_or(existing.sort_order),
        is_exclusive: input.is_exclusive.unwrap_or(existing.is_exclusive),
        meta: input.meta.clone().unwrap_or(existing.meta),
        updated_at: Utc::now(),
        ..existing
    }
}
