//! SQLite database: connection lifecycle and schema bootstrap

use super::retry::ConnectRetry;
use crate::config::DatabaseConfig;
use crate::error::StoreError;
use sqlx::sqlite::{SqliteConnectOptions, SqliteJournalMode, SqlitePoolOptions, SqliteSynchronous};
use sqlx::{Connection, SqlitePool};
use tracing::info;

pub struct Database {
    pub(super) pool: SqlitePool,
}

impl Database {
    /// Open the pool and ping it, retrying per the configured budget.
    ///
    /// Running out of attempts yields `StoreError::Unavailable`; the server
    /// treats that as fatal.
    pub async fn connect(config: &DatabaseConfig) -> Result<Self, StoreError> {
        info!("Opening SQLite database at: {}", config.path);

        if let Some(parent) = std::path::Path::new(&config.path).parent() {
            if !parent.as_os_str().is_empty() {
                if let Err(e) = tokio::fs::create_dir_all(parent).await {
                    tracing::warn!(
                        "Failed to create database directory {}: {}",
                        parent.display(),
                        e
                    );
                }
            }
        }

        let options = SqliteConnectOptions::new()
            .filename(&config.path)
            .create_if_missing(true)
            .foreign_keys(true)
            .journal_mode(SqliteJournalMode::Wal)
            .synchronous(SqliteSynchronous::Normal);

        let retry = ConnectRetry::new(config.connect_attempts, config.connect_interval());

        let pool = retry
            .run("database", |_| Self::open_and_ping(config, options.clone()))
            .await
            .map_err(|source| StoreError::Unavailable {
                attempts: retry.attempts(),
                source,
            })?;

        info!(
            "SQLite connection established (max_connections={}, max_lifetime={:?}), bootstrapping schema...",
            config.max_connections,
            config.max_lifetime()
        );

        Self::ensure_schema(&pool).await?;

        info!("Database initialization complete");

        Ok(Self { pool })
    }

    async fn open_and_ping(
        config: &DatabaseConfig,
        options: SqliteConnectOptions,
    ) -> Result<SqlitePool, sqlx::Error> {
        let pool = SqlitePoolOptions::new()
            .max_connections(config.max_connections)
            .min_connections(config.min_connections.min(config.max_connections))
            .idle_timeout(config.idle_timeout())
            .max_lifetime(config.max_lifetime())
            .connect_with(options)
            .await?;

        let mut conn = pool.acquire().await?;
        conn.ping().await?;

        Ok(pool)
    }

    async fn ensure_schema(pool: &SqlitePool) -> Result<(), StoreError> {
        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS tasks (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT NOT NULL,
                description TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS comments (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                task_id INTEGER NOT NULL REFERENCES tasks(id) ON DELETE CASCADE,
                author INTEGER NOT NULL,
                text TEXT NOT NULL,
                created_at TEXT NOT NULL DEFAULT (strftime('%Y-%m-%dT%H:%M:%fZ', 'now'))
            )
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE INDEX IF NOT EXISTS idx_comments_task_id ON comments (task_id)
            "#,
        )
        .execute(pool)
        .await?;

        sqlx::query(
            r#"
            CREATE TABLE IF NOT EXISTS users (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                login TEXT NOT NULL UNIQUE,
                hash TEXT NOT NULL
            )
            "#,
        )
        .execute(pool)
        .await?;

        Ok(())
    }
}

pub(super) fn is_unique_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_unique_violation() || db.message().contains("UNIQUE constraint failed")
        }
        _ => false,
    }
}

pub(super) fn is_foreign_key_violation(e: &sqlx::Error) -> bool {
    match e {
        sqlx::Error::Database(db) => {
            db.is_foreign_key_violation() || db.message().contains("FOREIGN KEY constraint failed")
        }
        _ => false,
    }
}
