use axum::extract::{Path, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::handlers::protected::users::{stored_profile, valid_full_name};
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::{ProfileRecord, Role, UserProfile, UserStatus};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateUserRequest {
    pub email: String,
    pub full_name: String,
    pub role: String,
    pub status: String,
}

/// One entry of the admin user listing. Records whose role or status is not
/// recognised are passed through as stored so they can be found and fixed.
#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum ListedUser {
    Profile(UserProfile),
    Unrecognised(ProfileRecord),
}

impl From<ProfileRecord> for ListedUser {
    fn from(record: ProfileRecord) -> Self {
        match stored_profile(record.clone()) {
            Ok(profile) => ListedUser::Profile(profile),
            Err(_) => ListedUser::Unrecognised(record),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Deleted {
    pub uid: String,
    pub message: String,
}

impl CreateUserRequest {
    /// Validate every field and report all failures together.
    pub fn into_record(self) -> Result<ProfileRecord, ApiError> {
        let mut field_errors = HashMap::new();

        let email = self.email.trim().to_lowercase();
        let valid_email = email
            .split_once('@')
            .is_some_and(|(local, domain)| !local.is_empty() && domain.contains('.') && !domain.ends_with('.'));
        if !valid_email {
            field_errors.insert("email".to_string(), "Invalid email address.".to_string());
        }

        let full_name = valid_full_name(&self.full_name).ok();
        if full_name.is_none() {
            field_errors.insert("fullName".to_string(), "Full name must be at least 2 characters.".to_string());
        }

        let role = self.role.parse::<Role>().ok();
        if role.is_none() {
            field_errors.insert("role".to_string(), "Invalid role specified.".to_string());
        }
        let status = self.status.parse::<UserStatus>().ok();
        if status.is_none() {
            field_errors.insert("status".to_string(), "Invalid status specified.".to_string());
        }

        match (full_name, role, status) {
            (Some(full_name), Some(role), Some(status)) if field_errors.is_empty() => {
                let now = Utc::now();
                Ok(ProfileRecord {
                    uid: Uuid::new_v4().simple().to_string(),
                    email: Some(email),
                    full_name: Some(full_name),
                    role: Some(role.as_str().to_string()),
                    status: Some(status.as_str().to_string()),
                    created_at: Some(now),
                    updated_at: Some(now),
                })
            }
            _ => Err(ApiError::validation_error("Validation failed", Some(field_errors))),
        }
    }
}

/// GET /api/users - every profile, newest first
pub async fn list_users(State(state): State<AppState>) -> ApiResult<Vec<ListedUser>> {
    let records = state.profiles.list_profiles().await?;
    Ok(ApiResponse::success(records.into_iter().map(ListedUser::from).collect()))
}

/// POST /api/admin/users
pub async fn create_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    ApiJson(body): ApiJson<CreateUserRequest>,
) -> ApiResult<UserProfile> {
    let record = body.into_record()?;
    state.profiles.insert_profile(record.clone()).await?;

    tracing::info!("Admin {} created profile {}", ctx.uid(), record.uid);
    Ok(ApiResponse::created(stored_profile(record)?))
}

/// DELETE /api/users/:uid
pub async fn delete_user(State(state): State<AppState>, ctx: AuthContext, Path(uid): Path<String>) -> ApiResult<Deleted> {
    if ctx.uid() == uid {
        return Err(ApiError::forbidden(
            "Forbidden: Admins cannot delete their own account through this endpoint.",
        ));
    }

    let target = state
        .profiles
        .get_profile(&uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found."))?;
    if target.role.as_deref() == Some(Role::Admin.as_str()) {
        return Err(ApiError::forbidden("Forbidden: Cannot delete another admin account."));
    }

    if !state.profiles.delete_profile(&uid).await? {
        return Err(ApiError::not_found("User profile not found."));
    }

    tracing::info!("Admin {} deleted profile {}", ctx.uid(), uid);
    Ok(ApiResponse::success(Deleted {
        message: format!("User {} deleted successfully.", uid),
        uid,
    }))
}
