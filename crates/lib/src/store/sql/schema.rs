//! SQL schema definitions and migrations.
//!
//! The schema is portable between SQLite and PostgreSQL apart from the
//! auto-incrementing id column, which is chosen per dialect.
//!
//! # Migration System
//!
//! Migrations are code rather than SQL files so each step can issue
//! dialect-specific statements.
//!
//! ## Adding a New Migration
//!
//! 1. Increment `SCHEMA_VERSION`
//! 2. Add a new `migrate_vN_to_vM` async function
//! 3. Add it to the match in `run_migration`

use super::{DbKind, SqlxResultExt, SqlxStore};
use crate::Result;
use crate::store::StoreError;

/// Current schema version.
pub const SCHEMA_VERSION: i64 = 1;

/// Schema version tracking. BIGINT for portability.
const CREATE_SCHEMA_VERSION: &str = "CREATE TABLE IF NOT EXISTS schema_version (
    version BIGINT PRIMARY KEY
)";

/// Everything after the id column of `users`.
///
/// Role flags are BIGINT 0/1. `sca_name` and `password_hash` use '' for
/// absent so every column is NOT NULL. `tracks` is a JSON array of names.
const USER_COLUMNS: &str = "
    mundane_name TEXT NOT NULL,
    sca_name TEXT NOT NULL DEFAULT '',
    email TEXT NOT NULL UNIQUE,
    password_hash TEXT NOT NULL DEFAULT '',
    admin BIGINT NOT NULL DEFAULT 0,
    coordinator BIGINT NOT NULL DEFAULT 0,
    instructor BIGINT NOT NULL DEFAULT 0,
    pu_staff BIGINT NOT NULL DEFAULT 0,
    proofreader BIGINT NOT NULL DEFAULT 0,
    tracks TEXT NOT NULL DEFAULT '[]'";

/// SQL statements to create indexes.
pub const CREATE_INDEXES: &[&str] = &[
    // Emails are unique regardless of case
    "CREATE UNIQUE INDEX IF NOT EXISTS idx_users_email_lower ON users (LOWER(email))",
    // Listing order
    "CREATE INDEX IF NOT EXISTS idx_users_mundane_name ON users (mundane_name, id)",
];

fn create_users_table(kind: DbKind) -> String {
    let id_column = match kind {
        DbKind::Sqlite => "id INTEGER PRIMARY KEY AUTOINCREMENT",
        DbKind::Postgres => "id BIGSERIAL PRIMARY KEY",
    };
    format!("CREATE TABLE IF NOT EXISTS users (\n    {id_column},{USER_COLUMNS}\n)")
}

/// Create tables and indexes if missing and bring the schema up to date.
pub async fn initialize(store: &SqlxStore) -> Result<()> {
    let pool = store.pool();

    let statements = [CREATE_SCHEMA_VERSION.to_string(), create_users_table(store.db_kind())];
    for statement in &statements {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Sqlx {
                reason: format!("Schema creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    let row: Option<(i64,)> = sqlx::query_as("SELECT version FROM schema_version")
        .fetch_optional(pool)
        .await
        .sql_context("Failed to check schema version")?;

    match row {
        None => {
            sqlx::query("INSERT INTO schema_version (version) VALUES ($1)")
                .bind(SCHEMA_VERSION)
                .execute(pool)
                .await
                .sql_context("Failed to initialize schema version")?;
            tracing::debug!(version = SCHEMA_VERSION, "Initialized SQL schema");
        }
        Some((current,)) if current < SCHEMA_VERSION => {
            migrate(store, current, SCHEMA_VERSION).await?;
        }
        Some((current,)) if current > SCHEMA_VERSION => {
            return Err(StoreError::Sqlx {
                reason: format!(
                    "Database schema v{current} is newer than this build supports (v{SCHEMA_VERSION})"
                ),
                source: None,
            }
            .into());
        }
        Some(_) => {}
    }

    for statement in CREATE_INDEXES {
        sqlx::query(statement)
            .execute(pool)
            .await
            .map_err(|e| StoreError::Sqlx {
                reason: format!("Index creation failed: {e} - SQL: {statement}"),
                source: Some(e),
            })?;
    }

    Ok(())
}

async fn migrate(store: &SqlxStore, from: i64, to: i64) -> Result<()> {
    tracing::info!(from, to, "Starting SQL schema migration");

    let mut current = from;
    while current < to {
        let next = current + 1;
        tracing::info!(from = current, to = next, "Running migration");

        run_migration(store, current, next).await?;

        sqlx::query("UPDATE schema_version SET version = $1")
            .bind(next)
            .execute(store.pool())
            .await
            .sql_context(&format!("Failed to update schema version to {next}"))?;

        tracing::info!(version = next, "Migration completed");
        current = next;
    }

    tracing::info!(from, to, "All migrations completed successfully");
    Ok(())
}

async fn run_migration(store: &SqlxStore, from: i64, to: i64) -> Result<()> {
    // No migrations yet; v1 is the first schema.
    let _ = store;

    Err(StoreError::Sqlx {
        reason: format!(
            "Unknown migration path: v{from} to v{to}. \
             SCHEMA_VERSION was incremented without adding a migration."
        ),
        source: None,
    }
    .into())
}
