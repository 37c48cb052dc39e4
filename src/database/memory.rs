use async_trait::async_trait;
use chrono::Utc;
use std::collections::HashMap;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{NotificationStore, ProfileStore, SeedData, StoreError};
use crate::types::{Notification, ProfilePatch, ProfileRecord, UserStatus};

/// In-process store for development and tests. Nothing survives a restart.
#[derive(Default)]
pub struct MemoryStore {
    profiles: RwLock<HashMap<String, ProfileRecord>>,
    notifications: RwLock<HashMap<Uuid, Notification>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_seed(seed: SeedData) -> Self {
        let profiles = seed
            .profiles
            .into_iter()
            .map(|record| (record.uid.clone(), record))
            .collect();
        let notifications = seed
            .notifications
            .into_iter()
            .map(|notification| (notification.id, notification))
            .collect();

        Self {
            profiles: RwLock::new(profiles),
            notifications: RwLock::new(notifications),
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryStore {
    async fn get_profile(&self, uid: &str) -> Result<Option<ProfileRecord>, StoreError> {
        Ok(self.profiles.read().await.get(uid).cloned())
    }

    async fn list_profiles(&self) -> Result<Vec<ProfileRecord>, StoreError> {
        let mut records: Vec<ProfileRecord> = self.profiles.read().await.values().cloned().collect();
        // None sorts last, ties broken by uid for a stable listing
        records.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.uid.cmp(&b.uid)));
        Ok(records)
    }

    async fn insert_profile(&self, record: ProfileRecord) -> Result<(), StoreError> {
        let mut profiles = self.profiles.write().await;
        if profiles.contains_key(&record.uid) {
            return Err(StoreError::Conflict(format!("Profile '{}' already exists", record.uid)));
        }
        if let Some(email) = record.email.as_deref() {
            if profiles.values().any(|p| p.email.as_deref() == Some(email)) {
                return Err(StoreError::Conflict("Email address is already in use by another account.".to_string()));
            }
        }
        profiles.insert(record.uid.clone(), record);
        Ok(())
    }

    async fn update_profile(&self, uid: &str, patch: ProfilePatch) -> Result<Option<ProfileRecord>, StoreError> {
        let mut profiles = self.profiles.write().await;
        let Some(record) = profiles.get_mut(uid) else {
            return Ok(None);
        };

        if let Some(full_name) = patch.full_name {
            record.full_name = Some(full_name);
        }
        if let Some(role) = patch.role {
            record.role = Some(role.as_str().to_string());
        }
        if let Some(status) = patch.status {
            record.status = Some(status.as_str().to_string());
        }
        record.updated_at = Some(Utc::now());

        Ok(Some(record.clone()))
    }

    async fn transition_status(
        &self,
        uid: &str,
        from: UserStatus,
        to: UserStatus,
    ) -> Result<Option<ProfileRecord>, StoreError> {
        let mut profiles = self.profiles.write().await;
        let Some(record) = profiles.get_mut(uid) else {
            return Ok(None);
        };

        let current = record.status.as_deref().filter(|s| !s.is_empty()).unwrap_or(UserStatus::Active.as_str());
        if current != from.as_str() {
            return Ok(None);
        }
        record.status = Some(to.as_str().to_string());
        record.updated_at = Some(Utc::now());

        Ok(Some(record.clone()))
    }

    async fn delete_profile(&self, uid: &str) -> Result<bool, StoreError> {
        Ok(self.profiles.write().await.remove(uid).is_some())
    }
}

#[async_trait]
impl NotificationStore for MemoryStore {
    async fn list_for(&self, uid: &str, limit: usize) -> Result<Vec<Notification>, StoreError> {
        let mut items: Vec<Notification> = self
            .notifications
            .read()
            .await
            .values()
            .filter(|n| n.recipient_uid == uid)
            .cloned()
            .collect();
        items.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        items.truncate(limit);
        Ok(items)
    }

    async fn mark_read(&self, uid: &str, id: Uuid) -> Result<bool, StoreError> {
        let mut notifications = self.notifications.write().await;
        match notifications.get_mut(&id) {
            Some(n) if n.recipient_uid == uid => {
                n.is_read = true;
                Ok(true)
            }
            _ => Ok(false),
        }
    }

    async fn mark_all_read(&self, uid: &str) -> Result<u64, StoreError> {
        let mut notifications = self.notifications.write().await;
        let mut updated = 0;
        for n in notifications.values_mut().filter(|n| n.recipient_uid == uid && !n.is_read) {
            n.is_read = true;
            updated += 1;
        }
        Ok(updated)
    }

    async fn insert(&self, notification: Notification) -> Result<(), StoreError> {
        self.notifications.write().await.insert(notification.id, notification);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Role, UserStatus};
    use chrono::{Duration, TimeZone};

    fn record(uid: &str, email: &str, days: i64) -> ProfileRecord {
        ProfileRecord {
            uid: uid.to_string(),
            email: Some(email.to_string()),
            created_at: Some(Utc.with_ymd_and_hms(2025, 1, 1, 0, 0, 0).unwrap() + Duration::days(days)),
            ..Default::default()
        }
    }

    fn notification(uid: &str, minutes: i64, is_read: bool) -> Notification {
        Notification {
            id: Uuid::new_v4(),
            recipient_uid: uid.to_string(),
            title: "Order".into(),
            message: "New order received".into(),
            is_read,
            created_at: Utc::now() - Duration::minutes(minutes),
        }
    }

    #[tokio::test]
    async fn lists_profiles_newest_first() {
        let store = MemoryStore::new();
        store.insert_profile(record("old", "old@shop.test", 0)).await.unwrap();
        store.insert_profile(record("new", "new@shop.test", 5)).await.unwrap();
        store.insert_profile(record("mid", "mid@shop.test", 2)).await.unwrap();

        let uids: Vec<String> = store.list_profiles().await.unwrap().into_iter().map(|r| r.uid).collect();
        assert_eq!(uids, vec!["new", "mid", "old"]);
    }

    #[tokio::test]
    async fn rejects_duplicate_uid_and_email() {
        let store = MemoryStore::new();
        store.insert_profile(record("a", "a@shop.test", 0)).await.unwrap();
        assert!(matches!(
            store.insert_profile(record("a", "other@shop.test", 0)).await,
            Err(StoreError::Conflict(_))
        ));
        assert!(matches!(
            store.insert_profile(record("b", "a@shop.test", 0)).await,
            Err(StoreError::Conflict(_))
        ));
    }

    #[tokio::test]
    async fn update_applies_only_present_fields() {
        let store = MemoryStore::new();
        let mut seeded = record("v", "v@shop.test", 0);
        seeded.full_name = Some("Vera".into());
        store.insert_profile(seeded).await.unwrap();

        let patch = ProfilePatch {
            role: Some(Role::Vendor),
            status: Some(UserStatus::Active),
            ..Default::default()
        };
        let updated = store.update_profile("v", patch).await.unwrap().unwrap();
        assert_eq!(updated.full_name.as_deref(), Some("Vera"));
        assert_eq!(updated.role.as_deref(), Some("vendor"));
        assert!(updated.updated_at.is_some());

        assert!(store.update_profile("ghost", ProfilePatch::default()).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn status_transition_applies_once() {
        let store = MemoryStore::new();
        store.insert_profile(record("c", "c@shop.test", 0)).await.unwrap();

        let moved = store
            .transition_status("c", UserStatus::Active, UserStatus::PendingApproval)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(moved.status.as_deref(), Some("pending_approval"));

        let again = store
            .transition_status("c", UserStatus::Active, UserStatus::PendingApproval)
            .await
            .unwrap();
        assert!(again.is_none());
        assert!(store
            .transition_status("ghost", UserStatus::Active, UserStatus::PendingApproval)
            .await
            .unwrap()
            .is_none());
    }

    #[tokio::test]
    async fn notifications_are_scoped_to_recipient() {
        let store = MemoryStore::new();
        let mine = notification("v1", 5, false);
        let theirs = notification("v2", 1, false);
        store.insert(mine.clone()).await.unwrap();
        store.insert(theirs.clone()).await.unwrap();
        store.insert(notification("v1", 1, true)).await.unwrap();

        let listed = store.list_for("v1", 100).await.unwrap();
        assert_eq!(listed.len(), 2);
        assert!(listed[0].created_at > listed[1].created_at);

        assert!(!store.mark_read("v1", theirs.id).await.unwrap());
        assert_eq!(store.mark_all_read("v1").await.unwrap(), 1);
        assert_eq!(store.mark_all_read("v1").await.unwrap(), 0);
        assert_eq!(store.mark_all_read("v2").await.unwrap(), 1);
    }

    #[tokio::test]
    async fn list_respects_limit() {
        let store = MemoryStore::new();
        for i in 0..5 {
            store.insert(notification("v1", i, false)).await.unwrap();
        }
        assert_eq!(store.list_for("v1", 3).await.unwrap().len(), 3);
    }
}
