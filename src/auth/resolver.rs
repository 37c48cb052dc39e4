use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;

use super::{AuthError, Identity};
use crate::database::{ProfileStore, StoreError};
use crate::types::{ProfileRecord, Role, UserProfile, UserStatus};
use crate::upstream::bounded;

/// Loads the stored profile for a verified identity.
///
/// Absent fields are filled rather than rejected: role becomes `customer`,
/// status becomes `active`, email and name fall back to the token claims.
/// With `strict` set, an absent role is an error instead. Unrecognised role
/// or status strings are always errors.
#[derive(Clone)]
pub struct ProfileResolver {
    store: Arc<dyn ProfileStore>,
    timeout: Duration,
    strict: bool,
}

impl ProfileResolver {
    pub fn new(store: Arc<dyn ProfileStore>, timeout: Duration, strict: bool) -> Self {
        Self { store, timeout, strict }
    }

    pub async fn resolve(&self, identity: &Identity) -> Result<UserProfile, AuthError> {
        let record = bounded(self.timeout, "profile store", self.store.get_profile(&identity.uid))
            .await?
            .map_err(|e| match e {
                StoreError::Timeout(t) => AuthError::Timeout(t),
                other => AuthError::Upstream(other.to_string()),
            })?
            .ok_or_else(|| {
                tracing::warn!("User profile not found for uid {}", identity.uid);
                AuthError::ProfileNotFound(identity.uid.clone())
            })?;

        fill_profile(record, identity, self.strict)
    }
}

/// Turn a stored record into a complete profile.
pub fn fill_profile(record: ProfileRecord, identity: &Identity, strict: bool) -> Result<UserProfile, AuthError> {
    let role = match record.role.as_deref().filter(|r| !r.is_empty()) {
        Some(raw) => raw.parse::<Role>().map_err(|_| {
            tracing::warn!("Profile {} has unrecognised role '{}'", record.uid, raw);
            AuthError::InvalidProfile(format!("unrecognised role '{}'", raw))
        })?,
        None if strict => {
            tracing::warn!("Profile {} has no role and strict profiles are enabled", record.uid);
            return Err(AuthError::InvalidProfile("User account not fully set up.".to_string()));
        }
        None => {
            tracing::warn!("Profile {} has no role, defaulting to customer", record.uid);
            Role::Customer
        }
    };

    let status = match record.status.as_deref().filter(|s| !s.is_empty()) {
        Some(raw) => raw.parse::<UserStatus>().map_err(|_| {
            tracing::warn!("Profile {} has unrecognised status '{}'", record.uid, raw);
            AuthError::InvalidProfile(format!("unrecognised status '{}'", raw))
        })?,
        None => UserStatus::Active,
    };

    Ok(UserProfile {
        email: record.email.filter(|e| !e.is_empty()).or_else(|| identity.email.clone()),
        full_name: record.full_name.filter(|n| !n.is_empty()).or_else(|| identity.name.clone()),
        role,
        status,
        created_at: record.created_at.unwrap_or_else(Utc::now),
        updated_at: record.updated_at,
        uid: record.uid,
    })
}
