//! Database migrations module
//!
//! This module provides code-based database migrations for Contentdeck.
//! All migrations are embedded directly in Rust code as SQL strings, supporting
//! both SQLite and MySQL databases for single-binary deployment.
//!
//! # Usage
//!
//! ```ignore
//! use contentdeck::db::{create_pool, migrations};
//!
//! let pool = create_pool(&config).await?;
//! migrations::run_migrations(&pool).await?;
//! ```
//!
//! # Architecture
//!
//! Each migration is defined as a `Migration` struct containing:
//! - `version`: Unique version number for ordering
//! - `name`: Human-readable migration name
//! - `up_sqlite`: SQL for SQLite database
//! - `up_mysql`: SQL for MySQL database

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use sqlx::{MySqlPool, Row, SqlitePool};

use super::DynDatabasePool;
use crate::config::DatabaseDriver;

/// A database migration with SQL for both SQLite and MySQL
#[derive(Debug, Clone)]
pub struct Migration {
    /// Migration version number (must be unique and sequential)
    pub version: i32,
    /// Human-readable migration name
    pub name: &'static str,
    /// SQL statements for SQLite
    pub up_sqlite: &'static str,
    /// SQL statements for MySQL
    pub up_mysql: &'static str,
}

/// Migration record stored in the database
#[derive(Debug, Clone)]
pub struct MigrationRecord {
    /// Migration version number
    pub version: i64,
    /// Migration name/description
    pub name: String,
    /// When the migration was applied
    pub applied_at: DateTime<Utc>,
}

/// All migrations for Contentdeck.
/// These are embedded in the binary for single-binary deployment.
pub const MIGRATIONS: &[Migration] = &[
    // Migration 1: Create regions table
    // Hierarchy is carried by level + hierarchical codes, no parent FK
    Migration {
        version: 1,
        name: "create_regions",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS regions (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                code VARCHAR(30) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                level INTEGER NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_regions_code ON regions(code);
            CREATE INDEX IF NOT EXISTS idx_regions_level ON regions(level);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS regions (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                code VARCHAR(30) NOT NULL UNIQUE,
                name VARCHAR(200) NOT NULL,
                level INT NOT NULL DEFAULT 0,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_regions_code ON regions(code);
            CREATE INDEX idx_regions_level ON regions(level);
        "#,
    },
    // Migration 2: Create topics table
    Migration {
        version: 2,
        name: "create_topics",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                locale VARCHAR(5) NOT NULL DEFAULT 'de',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_topics_slug ON topics(slug);
            CREATE INDEX IF NOT EXISTS idx_topics_locale ON topics(locale);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS topics (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                title VARCHAR(255) NOT NULL,
                description TEXT,
                locale VARCHAR(5) NOT NULL DEFAULT 'de',
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_topics_slug ON topics(slug);
            CREATE INDEX idx_topics_locale ON topics(locale);
        "#,
    },
    // Migration 3: Create tags table
    Migration {
        version: 3,
        name: "create_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX IF NOT EXISTS idx_tags_slug ON tags(slug);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                slug VARCHAR(100) NOT NULL UNIQUE,
                label VARCHAR(100) NOT NULL,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            );
            CREATE INDEX idx_tags_slug ON tags(slug);
        "#,
    },
    // Migration 4: Create topic_tags junction table
    Migration {
        version: 4,
        name: "create_topic_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS topic_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                topic_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE(topic_id, tag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_topic_tags_topic_id ON topic_tags(topic_id);
            CREATE INDEX IF NOT EXISTS idx_topic_tags_tag_id ON topic_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS topic_tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                topic_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE KEY uk_topic_tags (topic_id, tag_id)
            );
            CREATE INDEX idx_topic_tags_topic_id ON topic_tags(topic_id);
            CREATE INDEX idx_topic_tags_tag_id ON topic_tags(tag_id);
        "#,
    },
    // Migration 5: Create content_items table
    // JSON columns are stored as TEXT; NULL and the literal 'null' are distinct
    Migration {
        version: 5,
        name: "create_content_items",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS content_items (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                kind VARCHAR(20) NOT NULL,
                locale VARCHAR(5) NOT NULL,
                topic_id INTEGER NOT NULL,
                text TEXT NOT NULL,
                rich_text TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                publish_at TIMESTAMP,
                expire_at TIMESTAMP,
                region_mode VARCHAR(10) NOT NULL DEFAULT 'AUTO',
                manual_region_id INTEGER,
                effective_region_id INTEGER,
                region_auto TEXT,
                validation TEXT,
                meta TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (manual_region_id) REFERENCES regions(id) ON DELETE SET NULL,
                FOREIGN KEY (effective_region_id) REFERENCES regions(id) ON DELETE SET NULL
            );
            CREATE INDEX IF NOT EXISTS idx_content_items_topic_id ON content_items(topic_id);
            CREATE INDEX IF NOT EXISTS idx_content_items_status ON content_items(status);
            CREATE INDEX IF NOT EXISTS idx_content_items_kind ON content_items(kind);
            CREATE INDEX IF NOT EXISTS idx_content_items_locale ON content_items(locale);
            CREATE INDEX IF NOT EXISTS idx_content_items_publish_at ON content_items(publish_at);
            CREATE INDEX IF NOT EXISTS idx_content_items_expire_at ON content_items(expire_at);
            CREATE INDEX IF NOT EXISTS idx_content_items_effective_region ON content_items(effective_region_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS content_items (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                kind VARCHAR(20) NOT NULL,
                locale VARCHAR(5) NOT NULL,
                topic_id BIGINT NOT NULL,
                text TEXT NOT NULL,
                rich_text TEXT,
                status VARCHAR(20) NOT NULL DEFAULT 'draft',
                publish_at TIMESTAMP NULL,
                expire_at TIMESTAMP NULL,
                region_mode VARCHAR(10) NOT NULL DEFAULT 'AUTO',
                manual_region_id BIGINT,
                effective_region_id BIGINT,
                region_auto TEXT,
                validation TEXT,
                meta TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (topic_id) REFERENCES topics(id) ON DELETE CASCADE,
                FOREIGN KEY (manual_region_id) REFERENCES regions(id) ON DELETE SET NULL,
                FOREIGN KEY (effective_region_id) REFERENCES regions(id) ON DELETE SET NULL
            );
            CREATE INDEX idx_content_items_topic_id ON content_items(topic_id);
            CREATE INDEX idx_content_items_status ON content_items(status);
            CREATE INDEX idx_content_items_kind ON content_items(kind);
            CREATE INDEX idx_content_items_locale ON content_items(locale);
            CREATE INDEX idx_content_items_publish_at ON content_items(publish_at);
            CREATE INDEX idx_content_items_expire_at ON content_items(expire_at);
            CREATE INDEX idx_content_items_effective_region ON content_items(effective_region_id);
        "#,
    },
    // Migration 6: Create item_tags junction table
    Migration {
        version: 6,
        name: "create_item_tags",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS item_tags (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                tag_id INTEGER NOT NULL,
                FOREIGN KEY (item_id) REFERENCES content_items(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE(item_id, tag_id)
            );
            CREATE INDEX IF NOT EXISTS idx_item_tags_item_id ON item_tags(item_id);
            CREATE INDEX IF NOT EXISTS idx_item_tags_tag_id ON item_tags(tag_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS item_tags (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                item_id BIGINT NOT NULL,
                tag_id BIGINT NOT NULL,
                FOREIGN KEY (item_id) REFERENCES content_items(id) ON DELETE CASCADE,
                FOREIGN KEY (tag_id) REFERENCES tags(id) ON DELETE CASCADE,
                UNIQUE KEY uk_item_tags (item_id, tag_id)
            );
            CREATE INDEX idx_item_tags_item_id ON item_tags(item_id);
            CREATE INDEX idx_item_tags_tag_id ON item_tags(tag_id);
        "#,
    },
    // Migration 7: Create answer_options table
    // Both sort_order and value are unique within one item
    Migration {
        version: 7,
        name: "create_answer_options",
        up_sqlite: r#"
            CREATE TABLE IF NOT EXISTS answer_options (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                item_id INTEGER NOT NULL,
                value VARCHAR(100) NOT NULL,
                label VARCHAR(255) NOT NULL,
                sort_order INTEGER NOT NULL DEFAULT 0,
                is_exclusive INTEGER NOT NULL DEFAULT 0,
                meta TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                FOREIGN KEY (item_id) REFERENCES content_items(id) ON DELETE CASCADE,
                UNIQUE(item_id, sort_order),
                UNIQUE(item_id, value)
            );
            CREATE INDEX IF NOT EXISTS idx_answer_options_item_id ON answer_options(item_id);
        "#,
        up_mysql: r#"
            CREATE TABLE IF NOT EXISTS answer_options (
                id BIGINT PRIMARY KEY AUTO_INCREMENT,
                item_id BIGINT NOT NULL,
                value VARCHAR(100) NOT NULL,
                label VARCHAR(255) NOT NULL,
                sort_order INT NOT NULL DEFAULT 0,
                is_exclusive TINYINT NOT NULL DEFAULT 0,
                meta TEXT,
                created_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP,
                updated_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP ON UPDATE CURRENT_TIMESTAMP,
                FOREIGN KEY (item_id) REFERENCES content_items(id) ON DELETE CASCADE,
                UNIQUE KEY uk_answer_options_order (item_id, sort_order),
                UNIQUE KEY uk_answer_options_value (item_id, value)
            );
            CREATE INDEX idx_answer_options_item_id ON answer_options(item_id);
        "#,
    },
];

/// Run all pending migrations
///
/// This function:
/// 1. Creates the migrations tracking table if it doesn't exist
/// 2. Checks which migrations have already been applied
/// 3. Runs any pending migrations in order
///
/// # Returns
///
/// Number of migrations applied
///
/// # Errors
///
/// Returns an error if any migration fails to apply
pub async fn run_migrations(pool: &DynDatabasePool) -> Result<usize> {
    create_migrations_table(pool).await?;

    let applied = get_applied_migrations(pool).await?;
    let applied_versions: Vec<i32> = applied.iter().map(|m| m.version as i32).collect();

    let mut count = 0;

    for migration in MIGRATIONS {
        if !applied_versions.contains(&migration.version) {
            tracing::info!(
                "Applying migration {}: {}",
                migration.version,
                migration.name
            );
            apply_migration(pool, migration)
                .await
                .with_context(|| format!("Failed to apply migration: {}", migration.name))?;
            count += 1;
        }
    }

    if count > 0 {
        tracing::info!("Applied {} migration(s)", count);
    } else {
        tracing::debug!("No pending migrations");
    }

    Ok(count)
}

/// Create the migrations tracking table if it doesn't exist
async fn create_migrations_table(pool: &DynDatabasePool) -> Result<()> {
    let sql = match pool.driver() {
        DatabaseDriver::Sqlite => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INTEGER PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
        DatabaseDriver::Mysql => {
            r#"
            CREATE TABLE IF NOT EXISTS _migrations (
                version INT PRIMARY KEY,
                name VARCHAR(255) NOT NULL UNIQUE,
                applied_at TIMESTAMP NOT NULL DEFAULT CURRENT_TIMESTAMP
            )
            "#
        }
    };

    pool.execute(sql).await?;
    Ok(())
}

/// Get list of already applied migrations
async fn get_applied_migrations(pool: &DynDatabasePool) -> Result<Vec<MigrationRecord>> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite = pool
                .as_sqlite()
                .context("SQLite pool not available")?;
            get_applied_migrations_sqlite(sqlite).await
        }
        DatabaseDriver::Mysql => {
            let mysql = pool.as_mysql().context("MySQL pool not available")?;
            get_applied_migrations_mysql(mysql).await
        }
    }
}

async fn get_applied_migrations_sqlite(pool: &SqlitePool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

async fn get_applied_migrations_mysql(pool: &MySqlPool) -> Result<Vec<MigrationRecord>> {
    let rows = sqlx::query("SELECT version, name, applied_at FROM _migrations ORDER BY version")
        .fetch_all(pool)
        .await?;

    let mut records = Vec::new();
    for row in rows {
        records.push(MigrationRecord {
            version: row.get("version"),
            name: row.get("name"),
            applied_at: row.get("applied_at"),
        });
    }

    Ok(records)
}

/// Apply a single migration
async fn apply_migration(pool: &DynDatabasePool, migration: &Migration) -> Result<()> {
    match pool.driver() {
        DatabaseDriver::Sqlite => {
            let sqlite = pool
                .as_sqlite()
                .context("SQLite pool not available")?;
            apply_migration_sqlite(sqlite, migration).await
        }
        DatabaseDriver::Mysql => {
            let mysql = pool.as_mysql().context("MySQL pool not available")?;
            apply_migration_mysql(mysql, migration).await
        }
    }
}

async fn apply_migration_sqlite(pool: &SqlitePool, migration: &Migration) -> Result<()> {
    // Execute migration SQL (may contain multiple statements)
    for statement in split_sql_statements(migration.up_sqlite) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    // Record the migration
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

async fn apply_migration_mysql(pool: &MySqlPool, migration: &Migration) -> Result<()> {
    // Execute migration SQL (may contain multiple statements)
    for statement in split_sql_statements(migration.up_mysql) {
        let statement = statement.trim();
        if !statement.is_empty() {
            sqlx::query(statement)
                .execute(pool)
                .await
                .with_context(|| format!("Failed to execute: {}", truncate_sql(statement)))?;
        }
    }

    // Record the migration
    sqlx::query("INSERT INTO _migrations (version, name) VALUES (?, ?)")
        .bind(migration.version)
        .bind(migration.name)
        .execute(pool)
        .await?;

    Ok(())
}

/// Truncate SQL for error messages
fn truncate_sql(sql: &str) -> String {
    if sql.len() > 100 {
        format!("{}...", &sql[..100])
    } else {
        sql.to_string()
    }
}

/// Split SQL into individual statements, handling comments properly
fn split_sql_statements(sql: &str) -> Vec<&str> {
    let mut statements = Vec::new();
    let mut current_start = 0;
    let mut in_statement = false;

    for (i, c) in sql.char_indices() {
        match c {
            ';' => {
                if in_statement {
                    let stmt = sql[current_start..i].trim();
                    if !stmt.is_empty() && !is_comment_only(stmt) {
                        statements.push(stmt);
                    }
                    in_statement = false;
                }
                current_start = i + 1;
            }
            _ if !c.is_whitespace() && !in_statement => {
                current_start = i;
                in_statement = true;
            }
            _ => {}
        }
    }

    // Handle last statement without trailing semicolon
    if in_statement {
        let stmt = sql[current_start..].trim();
        if !stmt.is_empty() && !is_comment_only(stmt) {
            statements.push(stmt);
        }
    }

    statements
}

/// Check if a string contains only SQL comments
fn is_comment_only(s: &str) -> bool {
    for line in s.lines() {
        let trimmed = line.trim();
        if !trimmed.is_empty() && !trimmed.starts_with("--") {
            return false;
        }
    }
    true
}

/// Check if migrations are up to date
pub async fn is_up_to_date(pool: &DynDatabasePool) -> Result<bool> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(applied.len() == MIGRATIONS.len())
}

/// Get pending migrations count
pub async fn pending_count(pool: &DynDatabasePool) -> Result<usize> {
    let _ = create_migrations_table(pool).await;

    let applied = get_applied_migrations(pool).await?;
    Ok(MIGRATIONS.len().saturating_sub(applied.len()))
}

/// Get the total number of migrations defined
pub fn total_migrations() -> usize {
    MIGRATIONS.len()
}
