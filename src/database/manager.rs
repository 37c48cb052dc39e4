use sqlx::{postgres::PgPoolOptions, PgPool};
use std::time::Duration;
use thiserror::Error;
use tracing::info;

use crate::config::DatabaseConfig;

/// Errors from DatabaseManager
#[derive(Debug, Error)]
pub enum DatabaseError {
    #[error("Missing configuration: {0}")]
    ConfigMissing(&'static str),

    #[error("Invalid database URL")]
    InvalidDatabaseUrl,

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Builds the Postgres pool and applies the schema.
pub struct DatabaseManager;

impl DatabaseManager {
    const SCHEMA: [&'static str; 3] = [
        r#"
        CREATE TABLE IF NOT EXISTS users (
            uid        TEXT PRIMARY KEY,
            email      TEXT UNIQUE,
            full_name  TEXT,
            role       TEXT,
            status     TEXT,
            created_at TIMESTAMPTZ,
            updated_at TIMESTAMPTZ
        )
        "#,
        r#"
        CREATE TABLE IF NOT EXISTS notifications (
            id            UUID PRIMARY KEY,
            recipient_uid TEXT NOT NULL,
            title         TEXT NOT NULL,
            message       TEXT NOT NULL,
            is_read       BOOLEAN NOT NULL DEFAULT FALSE,
            created_at    TIMESTAMPTZ NOT NULL DEFAULT NOW()
        )
        "#,
        r#"
        CREATE INDEX IF NOT EXISTS notifications_recipient_created
            ON notifications (recipient_uid, created_at DESC)
        "#,
    ];

    /// Connect using the configured URL.
    pub async fn connect(config: &DatabaseConfig) -> Result<PgPool, DatabaseError> {
        let url = config.url.as_deref().ok_or(DatabaseError::ConfigMissing("DATABASE_URL"))?;
        url::Url::parse(url).map_err(|_| DatabaseError::InvalidDatabaseUrl)?;

        let pool = PgPoolOptions::new()
            .max_connections(config.max_connections)
            .acquire_timeout(Duration::from_secs(config.connection_timeout))
            .connect(url)
            .await?;

        info!("Created database pool (max {} connections)", config.max_connections);
        Ok(pool)
    }

    /// Create tables and indexes when missing. Safe to run on every start.
    pub async fn ensure_schema(pool: &PgPool) -> Result<(), DatabaseError> {
        for statement in Self::SCHEMA {
            sqlx::query(statement).execute(pool).await?;
        }
        info!("Database schema verified");
        Ok(())
    }
}
