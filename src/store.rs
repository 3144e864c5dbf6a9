//! Connection setup, `_sys_*` table DDL, schema document persistence and the user table.

use crate::config::AppConfig;
use crate::error::AppError;
use crate::schema::StoredSchema;
use serde_json::Value;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions};
use sqlx::{SqliteConnection, SqlitePool};
use std::str::FromStr;

/// Open the pool, creating the database file if it does not exist.
/// In-memory databases get a single long-lived connection so every query sees the same data.
pub async fn connect(config: &AppConfig) -> Result<SqlitePool, AppError> {
    let url = &config.connection.url;
    let mut opts = SqliteConnectOptions::from_str(url)
        .map_err(|e| AppError::BadRequest(format!("invalid DATABASE_URL: {}", e)))?
        .create_if_missing(true)
        .foreign_keys(true);

    let pool = if config.is_in_memory() {
        SqlitePoolOptions::new()
            .max_connections(1)
            .idle_timeout(None)
            .max_lifetime(None)
            .connect_with(opts)
            .await?
    } else {
        opts = opts.journal_mode(SqliteJournalMode::Wal);
        SqlitePoolOptions::new().max_connections(5).connect_with(opts).await?
    };
    tracing::info!(url = %url, "database connected");
    Ok(pool)
}

/// Create the bookkeeping tables if they do not exist.
pub async fn ensure_sys_tables(pool: &SqlitePool) -> Result<(), AppError> {
    let ddl = [
        r#"
        CREATE TABLE IF NOT EXISTS _sys_schema (
            id INTEGER PRIMARY KEY CHECK (id = 1),
            version INTEGER NOT NULL,
            document TEXT NOT NULL,
            updated_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS _sys_schema_history (
            version INTEGER PRIMARY KEY,
            document TEXT NOT NULL,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS _sys_users (
            id INTEGER PRIMARY KEY AUTOINCREMENT,
            email TEXT NOT NULL UNIQUE,
            password_hash TEXT NOT NULL,
            role TEXT,
            created_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )
        "#,
    ];
    for sql in ddl {
        sqlx::query(sql).execute(pool).await?;
    }
    Ok(())
}

/// Replace the stored schema document: copy the current one to history and bump the version.
/// Call within the migration transaction.
pub async fn replace_schema_document(
    tx: &mut SqliteConnection,
    current: Option<&StoredSchema>,
    document: &Value,
) -> Result<i64, AppError> {
    let new_version = current.map(|c| c.version + 1).unwrap_or(1);

    if let Some(prev) = current {
        sqlx::query("INSERT OR REPLACE INTO _sys_schema_history (version, document) VALUES (?, ?)")
            .bind(prev.version)
            .bind(prev.document.to_string())
            .execute(&mut *tx)
            .await?;
    }

    sqlx::query(
        "INSERT INTO _sys_schema (id, version, document, updated_at) VALUES (1, ?, ?, CURRENT_TIMESTAMP) \
         ON CONFLICT (id) DO UPDATE SET version = excluded.version, document = excluded.document, updated_at = excluded.updated_at",
    )
    .bind(new_version)
    .bind(document.to_string())
    .execute(&mut *tx)
    .await?;

    Ok(new_version)
}

/// Row from `_sys_users`.
#[derive(Clone, Debug, sqlx::FromRow)]
pub struct UserRow {
    pub id: i64,
    pub email: String,
    pub password_hash: String,
    pub role: Option<String>,
}

pub async fn find_user_by_email(pool: &SqlitePool, email: &str) -> Result<Option<UserRow>, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "SELECT id, email, password_hash, role FROM _sys_users WHERE email = ? COLLATE NOCASE",
    )
    .bind(email)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

pub async fn insert_user(
    pool: &SqlitePool,
    email: &str,
    password_hash: &str,
    role: Option<&str>,
) -> Result<UserRow, AppError> {
    let row = sqlx::query_as::<_, UserRow>(
        "INSERT INTO _sys_users (email, password_hash, role) VALUES (?, ?, ?) RETURNING id, email, password_hash, role",
    )
    .bind(email)
    .bind(password_hash)
    .bind(role)
    .fetch_one(pool)
    .await
    .map_err(|e| match e {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            AppError::Conflict(format!("user already exists: {}", email))
        }
        other => AppError::Db(other),
    })?;
    Ok(row)
}

pub async fn count_users(pool: &SqlitePool) -> Result<i64, AppError> {
    let (count,): (i64,) = sqlx::query_as("SELECT COUNT(1) FROM _sys_users")
        .fetch_one(pool)
        .await?;
    Ok(count)
}
