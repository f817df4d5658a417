//! Region repository
//!
//! Database operations for regions.
//!
//! This module provides:
//! - `RegionRepository` trait defining the interface for region data access
//! - `SqlxRegionRepository` implementing the trait for SQLite and MySQL

use crate::config::DatabaseDriver;
use crate::db::DynDatabasePool;
use crate::models::{CreateRegionInput, Region, UpdateRegionInput};
use anyhow::{Context, Result};
use async_trait::async_trait;
use chrono::Utc;
use sqlx::{MySqlPool, Row, SqlitePool};
use std::sync::Arc;

/// Region repository trait
#[async_trait]
pub trait RegionRepository: Send + Sync {
    /// Create a new region
    async fn create(&self, input: &CreateRegionInput) -> Result<Region>;

    /// Get region by ID
    async fn get_by_id(&self, id: i64) -> Result<Option<Region>>;

    /// Get region by code
    async fn get_by_code(&self, code: &str) -> Result<Option<Region>>;

    /// List all regions ordered by level, then code
    async fn list(&self) -> Result<Vec<Region>>;

    /// List regions at a specific level
    async fn list_by_level(&self, level: i32) -> Result<Vec<Region>>;

    /// Update a region
    async fn update(&self, id: i64, input: &UpdateRegionInput) -> Result<Option<Region>>;

    /// Delete a region
    async fn delete(&self, id: i64) -> Result<()>;

    /// Count all regions
    async fn count(&self) -> Result<i64>;
}

/// SQLx-based region repository implementation
///
/// Supports both SQLite and MySQL databases.
pub struct SqlxRegionRepository {
    pool: DynDatabasePool,
}

impl SqlxRegionRepository {
    /// Create a new SQLx region repository
    pub fn new(pool: DynDatabasePool) -> Self {
        Self { pool }
    }

    /// Create a boxed repository for use with dependency injection
    pub fn boxed(pool: DynDatabasePool) -> Arc<dyn RegionRepository> {
        Arc::new(Self::new(pool))
    }
}

#[async_trait]
impl RegionRepository for SqlxRegionRepository {
    async fn create(&self, input: &CreateRegionInput) -> Result<Region> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                create_region_sqlite(self.pool.as_sqlite().unwrap(), input).await
            }
            DatabaseDriver::Mysql => {
                create_region_mysql(self.pool.as_mysql().unwrap(), input).await
            }
        }
    }

    async fn get_by_id(&self, id: i64) -> Result<Option<Region>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_region_by_id_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => {
                get_region_by_id_mysql(self.pool.as_mysql().unwrap(), id).await
            }
        }
    }

    async fn get_by_code(&self, code: &str) -> Result<Option<Region>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                get_region_by_code_sqlite(self.pool.as_sqlite().unwrap(), code).await
            }
            DatabaseDriver::Mysql => {
                get_region_by_code_mysql(self.pool.as_mysql().unwrap(), code).await
            }
        }
    }

    async fn list(&self) -> Result<Vec<Region>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => list_regions_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => list_regions_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }

    async fn list_by_level(&self, level: i32) -> Result<Vec<Region>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                list_regions_by_level_sqlite(self.pool.as_sqlite().unwrap(), level).await
            }
            DatabaseDriver::Mysql => {
                list_regions_by_level_mysql(self.pool.as_mysql().unwrap(), level).await
            }
        }
    }

    async fn update(&self, id: i64, input: &UpdateRegionInput) -> Result<Option<Region>> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                update_region_sqlite(self.pool.as_sqlite().unwrap(), id, input).await
            }
            DatabaseDriver::Mysql => {
                update_region_mysql(self.pool.as_mysql().unwrap(), id, input).await
            }
        }
    }

    async fn delete(&self, id: i64) -> Result<()> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => {
                delete_region_sqlite(self.pool.as_sqlite().unwrap(), id).await
            }
            DatabaseDriver::Mysql => delete_region_mysql(self.pool.as_mysql().unwrap(), id).await,
        }
    }

    async fn count(&self) -> Result<i64> {
        match self.pool.driver() {
            DatabaseDriver::Sqlite => count_regions_sqlite(self.pool.as_sqlite().unwrap()).await,
            DatabaseDriver::Mysql => count_regions_mysql(self.pool.as_mysql().unwrap()).await,
        }
    }
}

// ============================================================================
// SQLite implementations
// ============================================================================

async fn create_region_sqlite(pool: &SqlitePool, input: &CreateRegionInput) -> Result<Region> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO regions (code, name, level, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&input.code)
    .bind(&input.name)
    .bind(input.level)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create region")?;

    Ok(Region {
        id: result.last_insert_rowid(),
        code: input.code.clone(),
        name: input.name.clone(),
        level: input.level,
        created_at: now,
    })
}

async fn get_region_by_id_sqlite(pool: &SqlitePool, id: i64) -> Result<Option<Region>> {
    let row = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get region by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_region_sqlite(&row))),
        None => Ok(None),
    }
}

async fn get_region_by_code_sqlite(pool: &SqlitePool, code: &str) -> Result<Option<Region>> {
    let row = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .context("Failed to get region by code")?;

    match row {
        Some(row) => Ok(Some(row_to_region_sqlite(&row))),
        None => Ok(None),
    }
}

async fn list_regions_sqlite(pool: &SqlitePool) -> Result<Vec<Region>> {
    let rows = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        ORDER BY level, code
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list regions")?;

    Ok(rows.iter().map(row_to_region_sqlite).collect())
}

async fn list_regions_by_level_sqlite(pool: &SqlitePool, level: i32) -> Result<Vec<Region>> {
    let rows = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE level = ?
        ORDER BY code
        "#,
    )
    .bind(level)
    .fetch_all(pool)
    .await
    .context("Failed to list regions by level")?;

    Ok(rows.iter().map(row_to_region_sqlite).collect())
}

async fn update_region_sqlite(
    pool: &SqlitePool,
    id: i64,
    input: &UpdateRegionInput,
) -> Result<Option<Region>> {
    let existing = get_region_by_id_sqlite(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let name = input.name.clone().unwrap_or(existing.name);
    let level = input.level.unwrap_or(existing.level);

    sqlx::query("UPDATE regions SET name = ?, level = ? WHERE id = ?")
        .bind(&name)
        .bind(level)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update region")?;

    Ok(Some(Region {
        id,
        code: existing.code,
        name,
        level,
        created_at: existing.created_at,
    }))
}

async fn delete_region_sqlite(pool: &SqlitePool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM regions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete region")?;

    Ok(())
}

async fn count_regions_sqlite(pool: &SqlitePool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM regions")
        .fetch_one(pool)
        .await
        .context("Failed to count regions")?;

    Ok(row.get("count"))
}

fn row_to_region_sqlite(row: &sqlx::sqlite::SqliteRow) -> Region {
    Region {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        level: row.get("level"),
        created_at: row.get("created_at"),
    }
}

// ============================================================================
// MySQL implementations
// ============================================================================

async fn create_region_mysql(pool: &MySqlPool, input: &CreateRegionInput) -> Result<Region> {
    let now = Utc::now();

    let result = sqlx::query(
        r#"
        INSERT INTO regions (code, name, level, created_at)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(&input.code)
    .bind(&input.name)
    .bind(input.level)
    .bind(now)
    .execute(pool)
    .await
    .context("Failed to create region")?;

    Ok(Region {
        id: result.last_insert_id() as i64,
        code: input.code.clone(),
        name: input.name.clone(),
        level: input.level,
        created_at: now,
    })
}

async fn get_region_by_id_mysql(pool: &MySqlPool, id: i64) -> Result<Option<Region>> {
    let row = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE id = ?
        "#,
    )
    .bind(id)
    .fetch_optional(pool)
    .await
    .context("Failed to get region by ID")?;

    match row {
        Some(row) => Ok(Some(row_to_region_mysql(&row))),
        None => Ok(None),
    }
}

async fn get_region_by_code_mysql(pool: &MySqlPool, code: &str) -> Result<Option<Region>> {
    let row = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE code = ?
        "#,
    )
    .bind(code)
    .fetch_optional(pool)
    .await
    .context("Failed to get region by code")?;

    match row {
        Some(row) => Ok(Some(row_to_region_mysql(&row))),
        None => Ok(None),
    }
}

async fn list_regions_mysql(pool: &MySqlPool) -> Result<Vec<Region>> {
    let rows = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        ORDER BY level, code
        "#,
    )
    .fetch_all(pool)
    .await
    .context("Failed to list regions")?;

    Ok(rows.iter().map(row_to_region_mysql).collect())
}

async fn list_regions_by_level_mysql(pool: &MySqlPool, level: i32) -> Result<Vec<Region>> {
    let rows = sqlx::query(
        r#"
        SELECT id, code, name, level, created_at
        FROM regions
        WHERE level = ?
        ORDER BY code
        "#,
    )
    .bind(level)
    .fetch_all(pool)
    .await
    .context("Failed to list regions by level")?;

    Ok(rows.iter().map(row_to_region_mysql).collect())
}

async fn update_region_mysql(
    pool: &MySqlPool,
    id: i64,
    input: &UpdateRegionInput,
) -> Result<Option<Region>> {
    let existing = get_region_by_id_mysql(pool, id).await?;
    let Some(existing) = existing else {
        return Ok(None);
    };

    let name = input.name.clone().unwrap_or(existing.name);
    let level = input.level.unwrap_or(existing.level);

    sqlx::query("UPDATE regions SET name = ?, level = ? WHERE id = ?")
        .bind(&name)
        .bind(level)
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to update region")?;

    Ok(Some(Region {
        id,
        code: existing.code,
        name,
        level,
        created_at: existing.created_at,
    }))
}

async fn delete_region_mysql(pool: &MySqlPool, id: i64) -> Result<()> {
    sqlx::query("DELETE FROM regions WHERE id = ?")
        .bind(id)
        .execute(pool)
        .await
        .context("Failed to delete region")?;

    Ok(())
}

async fn count_regions_mysql(pool: &MySqlPool) -> Result<i64> {
    let row = sqlx::query("SELECT COUNT(*) as count FROM regions")
        .fetch_one(pool)
        .await
        .context("Failed to count regions")?;

    Ok(row.get("count"))
}

fn row_to_region_mysql(row: &sqlx::mysql::MySqlRow) -> Region {
    Region {
        id: row.get("id"),
        code: row.get("code"),
        name: row.get("name"),
        level: row.get("level"),
        created_at: row.get("created_at"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::{create_test_pool, migrations};

    async fn setup_test_repo() -> (DynDatabasePool, SqlxRegionRepository) {
        let pool = create_test_pool().await.expect("Failed to create test pool");
        migrations::run_migrations(&pool)
            .await
            .expect("Failed to run migrations");
        let repo = SqlxRegionRepository::new(pool.clone());
        (pool, repo)
    }

    #[tokio::test]
    async fn test_create_region() {
        let (_pool, repo) = setup_test_repo().await;

        let created = repo
            .create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("Failed to create region");

        assert!(created.id > 0);
        assert_eq!(created.code, "DE");
        assert_eq!(created.name, "Germany");
        assert_eq!(created.level, 0);
    }

    #[tokio::test]
    async fn test_create_region_duplicate_code() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("Failed to create region");

        let duplicate = repo
            .create(&CreateRegionInput::new("DE", "Duplicate", 0))
            .await;
        assert!(duplicate.is_err());
    }

    #[tokio::test]
    async fn test_get_region_by_id() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&CreateRegionInput::new("DE-BY", "Bavaria", 1))
            .await
            .expect("Failed to create region");

        let found = repo
            .get_by_id(created.id)
            .await
            .expect("Failed to get region")
            .expect("Region not found");

        assert_eq!(found.code, "DE-BY");
        assert_eq!(found.level, 1);
    }

    #[tokio::test]
    async fn test_get_region_by_id_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let found = repo.get_by_id(99999).await.expect("Failed to get region");

        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_get_region_by_code() {
        let (_pool, repo) = setup_test_repo().await;
        repo.create(&CreateRegionInput::new("FR", "France", 0))
            .await
            .expect("Failed to create region");

        let found = repo
            .get_by_code("FR")
            .await
            .expect("Failed to get region")
            .expect("Region not found");

        assert_eq!(found.name, "France");
    }

    #[tokio::test]
    async fn test_list_regions_ordered() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&CreateRegionInput::new("DE-BY", "Bavaria", 1))
            .await
            .expect("Failed to create region");
        repo.create(&CreateRegionInput::new("FR", "France", 0))
            .await
            .expect("Failed to create region");
        repo.create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("Failed to create region");

        let regions = repo.list().await.expect("Failed to list regions");

        assert_eq!(regions.len(), 3);
        assert_eq!(regions[0].code, "DE");
        assert_eq!(regions[1].code, "FR");
        assert_eq!(regions[2].code, "DE-BY");
    }

    #[tokio::test]
    async fn test_list_regions_by_level() {
        let (_pool, repo) = setup_test_repo().await;

        repo.create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("Failed to create region");
        repo.create(&CreateRegionInput::new("DE-BY", "Bavaria", 1))
            .await
            .expect("Failed to create region");
        repo.create(&CreateRegionInput::new("DE-BW", "Baden-Wuerttemberg", 1))
            .await
            .expect("Failed to create region");

        let states = repo.list_by_level(1).await.expect("Failed to list regions");

        assert_eq!(states.len(), 2);
        assert_eq!(states[0].code, "DE-BW");
        assert_eq!(states[1].code, "DE-BY");
    }

    #[tokio::test]
    async fn test_update_region() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&CreateRegionInput::new("IT", "Italia", 0))
            .await
            .expect("Failed to create region");

        let updated = repo
            .update(
                created.id,
                &UpdateRegionInput {
                    name: Some("Italy".to_string()),
                    level: None,
                },
            )
            .await
            .expect("Failed to update region")
            .expect("Region not found");

        assert_eq!(updated.name, "Italy");
        assert_eq!(updated.code, "IT");
        assert_eq!(updated.level, 0);
    }

    #[tokio::test]
    async fn test_update_region_not_found() {
        let (_pool, repo) = setup_test_repo().await;

        let updated = repo
            .update(
                99999,
                &UpdateRegionInput {
                    name: Some("Nope".to_string()),
                    level: None,
                },
            )
            .await
            .expect("Failed to update region");

        assert!(updated.is_none());
    }

    #[tokio::test]
    async fn test_delete_region() {
        let (_pool, repo) = setup_test_repo().await;
        let created = repo
            .create(&CreateRegionInput::new("ES", "Spain", 0))
            .await
            .expect("Failed to create region");

        repo.delete(created.id).await.expect("Failed to delete");

        let found = repo.get_by_id(created.id).await.expect("Failed to get");
        assert!(found.is_none());
    }

    #[tokio::test]
    async fn test_count_regions() {
        let (_pool, repo) = setup_test_repo().await;

        assert_eq!(repo.count().await.expect("Failed to count"), 0);

        repo.create(&CreateRegionInput::new("DE", "Germany", 0))
            .await
            .expect("Failed to create region");
        repo.create(&CreateRegionInput::new("FR", "France", 0))
            .await
            .expect("Failed to create region");

        assert_eq!(repo.count().await.expect("Failed to count"), 2);
    }
}
