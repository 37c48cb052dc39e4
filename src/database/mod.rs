pub mod manager;
pub mod memory;
pub mod postgres;
pub mod seed;

pub use manager::DatabaseManager;
pub use memory::MemoryStore;
pub use postgres::PgStore;
pub use seed::SeedData;

use async_trait::async_trait;
use thiserror::Error;
use uuid::Uuid;

use crate::types::{Notification, ProfilePatch, ProfileRecord, UserStatus};
use crate::upstream::UpstreamTimeout;

/// Errors from profile and notification stores
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Backend error: {0}")]
    Backend(String),

    #[error(transparent)]
    Timeout(#[from] UpstreamTimeout),

    #[error(transparent)]
    Sqlx(#[from] sqlx::Error),
}

/// Durable user profiles keyed by uid.
#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, StoreError>;

    /// All profiles, newest `created_at` first.
    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError>;

    async fn insert_profile(&self, record: ProfileRecord) -> Result<(), StoreError>;

    /// Apply `patch` and return the updated record, or `None` when the uid is unknown.
    async fn update_profile(&self, uid: &str, patch: ProfilePatch) -> Result<Option<ProfileRecord>, StoreError>;

    /// Move the stored status from `from` to `to` in one step. An absent status
    /// reads as `active`. `None` when the uid is unknown or the status is no
    /// longer `from`.
    async fn transition_status(
        &self,
        uid: &str,
        from: UserStatus,
        to: UserStatus,
    ) -> Result<Option<ProfileRecord>, StoreError>;

    async fn delete_profile(&self, uid: &str) -> Result<bool, StoreError>;

    async fn ping(&self) -> Result<(), StoreError> {
        Ok(())
    }
}

/// Per-user notification inbox.
#[async_trait]
pub trait NotificationStore: Send + Sync {
    /// Newest first, at most `limit` entries.
    async fn list_for(&self, uid: &str, limit: usize) -> Result<Vec<Notification>, StoreError>;

    /// Mark one notification read; `false` if it does not exist for `uid`.
    async fn mark_read(&self, uid: &str, id: Uuid) -> Result<bool, StoreError>;

    /// Mark every unread notification read and return how many changed.
    async fn mark_all_read(&self, uid: &str) -> Result<u64, StoreError>;

    async fn insert(&self, notification: Notification) -> Result<(), StoreError>;
}
