use chrono::{DateTime, Utc};
use serde::Deserialize;
use std::path::Path;
use uuid::Uuid;

use crate::types::{Notification, ProfileRecord};

#[derive(Debug, thiserror::Error)]
pub enum SeedError {
    #[error("failed to read seed file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid seed YAML: {0}")]
    Yaml(#[from] serde_yaml::Error),
}

#[derive(Debug, Default, Deserialize)]
struct SeedFile {
    #[serde(default)]
    profiles: Vec<ProfileRecord>,
    #[serde(default)]
    notifications: Vec<SeedNotification>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct SeedNotification {
    id: Option<Uuid>,
    recipient_uid: String,
    title: String,
    message: String,
    #[serde(default)]
    is_read: bool,
    created_at: Option<DateTime<Utc>>,
}

/// Profiles and notifications preloaded into the memory store.
#[derive(Debug, Default)]
pub struct SeedData {
    pub profiles: Vec<ProfileRecord>,
    pub notifications: Vec<Notification>,
}

impl SeedData {
    pub fn from_yaml(text: &str) -> Result<Self, SeedError> {
        let file: SeedFile = serde_yaml::from_str(text)?;
        let now = Utc::now();

        let notifications = file
            .notifications
            .into_iter()
            .map(|n| Notification {
                id: n.id.unwrap_or_else(Uuid::new_v4),
                recipient_uid: n.recipient_uid,
                title: n.title,
                message: n.message,
                is_read: n.is_read,
                created_at: n.created_at.unwrap_or(now),
            })
            .collect();

        Ok(Self {
            profiles: file.profiles,
            notifications,
        })
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self, SeedError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| SeedError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&text)
    }
}
