use async_trait::async_trait;
use chrono::Utc;
use sqlx::PgPool;
use std::future::Future;
use std::time::Duration;
use uuid::Uuid;

use super::{NotificationStore, ProfileStore, StoreError};
use crate::types::{Notification, ProfilePatch, ProfileRecord, UserStatus};
use crate::upstream::bounded;

const PROFILE_COLUMNS: &str = "uid, email, full_name, role, status, created_at, updated_at";

/// Postgres-backed profile and notification store.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
    timeout: Duration,
}

impl PgStore {
    pub fn new(pool: PgPool, timeout: Duration) -> Self {
        Self { pool, timeout }
    }

    async fn run<F, T>(&self, what: &'static str, fut: F) -> Result<T, StoreError>
    where
        F: Future<Output = Result<T, sqlx::Error>>,
    {
        bounded(self.timeout, what, fut).await?.map_err(map_sqlx)
    }
}

fn map_sqlx(err: sqlx::Error) -> StoreError {
    match &err {
        sqlx::Error::Database(db) if db.is_unique_violation() => {
            StoreError::Conflict("Email address is already in use by another account.".to_string())
        }
        _ => StoreError::Sqlx(err),
    }
}

#[async_trait]
impl ProfileStore for PgStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, StoreError> {
        let query = format!("SELECT {} FROM users WHERE uid = $1", PROFILE_COLUMNS);
        self.run(
            "profile lookup",
            sqlx::query_as::<_, ProfileRecord>(&query).bind(uid).fetch_optional(&self.pool),
        )
        .await
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError> {
        let query = format!(
            "SELECT {} FROM users ORDER BY created_at DESC NULLS LAST, uid ASC",
            PROFILE_COLUMNS
        );
        self.run("profile listing", sqlx::query_as::<_, ProfileRecord>(&query).fetch_all(&self.pool))
            .await
    }

    async fn insert_profile(&self, record: ProfileRecord) -> Result<(), StoreError> {
        let query = format!(
            "INSERT INTO users ({}) VALUES ($1, $2, $3, $4, $5, $6, $7)",
            PROFILE_COLUMNS
        );
        self.run(
            "profile insert",
            sqlx::query(&query)
                .bind(&record.uid)
                .bind(&record.email)
                .bind(&record.full_name)
                .bind(&record.role)
                .bind(&record.status)
                .bind(record.created_at)
                .bind(record.updated_at)
                .execute(&self.pool),
        )
        .await?;
        Ok(())
    }

    async fn update_profile(&self, uid: &str, patch: ProfilePatch) -> Result<Option<ProfileRecord>, StoreError> {
        let query = format!(
            r#"
            UPDATE users SET
                full_name  = COALESCE($2, full_name),
                role       = COALESCE($3, role),
                status     = COALESCE($4, status),
                updated_at = $5
            WHERE uid = $1
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        self.run(
            "profile update",
            sqlx::query_as::<_, ProfileRecord>(&query)
                .bind(uid)
                .bind(patch.full_name)
                .bind(patch.role.map(|r| r.as_str()))
                .bind(patch.status.map(|s| s.as_str()))
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn transition_status(
        &self,
        uid: &str,
        from: UserStatus,
        to: UserStatus,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let query = format!(
            r#"
            UPDATE users SET
                status     = $3,
                updated_at = $4
            WHERE uid = $1 AND COALESCE(NULLIF(status, ''), 'active') = $2
            RETURNING {}
            "#,
            PROFILE_COLUMNS
        );
        self.run(
            "profile status transition",
            sqlx::query_as::<_, ProfileRecord>(&query)
                .bind(uid)
                .bind(from.as_str())
                .bind(to.as_str())
                .bind(Utc::now())
                .fetch_optional(&self.pool),
        )
        .await
    }

    async fn delete_profile(&self, uid: &str) -> Result<bool, StoreError> {
        let result = self
            .run(
                "profile delete",
                sqlx::query("DELETE FROM users WHERE uid = $1").bind(uid).execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        self.run("database ping", sqlx::query("SELECT 1").execute(&self.pool)).await?;
        Ok(())
    }
}

#[async_trait]
impl NotificationStore for PgStore {
    async fn list_for(&self, uid: &str, limit: usize) -> Result<Vec<Notification>, StoreError> {
        self.run(
            "notification listing",
            sqlx::query_as::<_, Notification>(
                r#"
                SELECT id, recipient_uid, title, message, is_read, created_at
                FROM notifications
                WHERE recipient_uid = $1
                ORDER BY created_at DESC
                LIMIT $2
                "#,
            )
            .bind(uid)
            .bind(limit as i64)
            .fetch_all(&self.pool),
        )
        .await
    }

    async fn mark_read(&self, uid: &str, id: Uuid) -> Result<bool, StoreError> {
        let result = self
            .run(
                "notification update",
                sqlx::query("UPDATE notifications SET is_read = TRUE WHERE id = $1 AND recipient_uid = $2")
                    .bind(id)
                    .bind(uid)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn mark_all_read(&self, uid: &str) -> Result<u64, StoreError> {
        // one statement for the whole batch
        let result = self
            .run(
                "notification batch update",
                sqlx::query("UPDATE notifications SET is_read = TRUE WHERE recipient_uid = $1 AND is_read = FALSE")
                    .bind(uid)
                    .execute(&self.pool),
            )
            .await?;
        Ok(result.rows_affected())
    }

    async fn insert(&self, notification: Notification) -> Result<(), StoreError> {
        self.run(
            "notification insert",
            sqlx::query(
                r#"
                INSERT INTO notifications (id, recipient_uid, title, message, is_read, created_at)
                VALUES ($1, $2, $3, $4, $5, $6)
                "#,
            )
            .bind(notification.id)
            .bind(&notification.recipient_uid)
            .bind(&notification.title)
            .bind(&notification.message)
            .bind(notification.is_read)
            .bind(notification.created_at)
            .execute(&self.pool),
        )
        .await?;
        Ok(())
    }
}
