use axum::extract::{Path, State};
use serde::Deserialize;

use crate::auth::{resolver::fill_profile, AuthContext, Identity};
use crate::error::ApiError;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::{ProfilePatch, ProfileRecord, Role, UserProfile, UserStatus};

/// Body of PUT /api/users/:uid. Role and status stay raw strings so an
/// unknown value is reported as a field error rather than a JSON error.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub full_name: Option<String>,
    pub role: Option<String>,
    pub status: Option<String>,
}

/// Present a stored record to a client, filling absent fields the way the
/// resolver does.
pub fn stored_profile(record: ProfileRecord) -> Result<UserProfile, ApiError> {
    let identity = Identity {
        uid: record.uid.clone(),
        email: None,
        name: None,
    };
    fill_profile(record, &identity, false).map_err(|e| {
        tracing::error!("Stored profile {} cannot be presented: {}", identity.uid, e);
        ApiError::internal_server_error("Stored user profile is invalid.")
    })
}

pub fn valid_full_name(raw: &str) -> Result<String, ApiError> {
    let trimmed = raw.trim();
    if trimmed.chars().count() < 2 {
        return Err(ApiError::invalid_field(
            "fullName",
            "Invalid full name. Must be a string with at least 2 characters.",
        ));
    }
    Ok(trimmed.to_string())
}

/// Decide what `caller` may change on `target_uid`.
///
/// A caller editing their own profile may only rename themselves; sending
/// their current role or status back is tolerated, changing either is not.
/// Admins editing someone else may set name, role and status, and promoting
/// to vendor always activates the account. Anyone else is refused.
pub fn plan_profile_update(
    caller: &UserProfile,
    target_uid: &str,
    request: UpdateProfileRequest,
) -> Result<ProfilePatch, ApiError> {
    let is_self = caller.uid == target_uid;
    if !is_self && caller.role != Role::Admin {
        return Err(ApiError::forbidden(
            "Forbidden: You do not have permission to update this user profile.",
        ));
    }

    let mut patch = ProfilePatch::default();
    if let Some(name) = request.full_name.as_deref() {
        patch.full_name = Some(valid_full_name(name)?);
    }

    if is_self {
        if request.role.as_deref().is_some_and(|r| r != caller.role.as_str()) {
            return Err(ApiError::forbidden("Forbidden: You cannot change your own role."));
        }
        if request.status.as_deref().is_some_and(|s| s != caller.status.as_str()) {
            return Err(ApiError::forbidden(
                "Forbidden: You cannot change your own status directly through this endpoint.",
            ));
        }
    } else {
        if let Some(raw) = request.role.as_deref() {
            patch.role = Some(
                raw.parse::<Role>()
                    .map_err(|_| ApiError::invalid_field("role", "Invalid role specified."))?,
            );
        }
        if let Some(raw) = request.status.as_deref() {
            patch.status = Some(
                raw.parse::<UserStatus>()
                    .map_err(|_| ApiError::invalid_field("status", "Invalid status specified."))?,
            );
        }
        if patch.role == Some(Role::Vendor) {
            patch.status = Some(UserStatus::Active);
        }
    }

    if patch.is_empty() {
        return Err(ApiError::bad_request("No valid fields provided for update."));
    }
    Ok(patch)
}

/// A vendor application is only open to active customers.
pub fn check_vendor_request(profile: &UserProfile) -> Result<(), ApiError> {
    if profile.role != Role::Customer {
        return Err(ApiError::bad_request(format!(
            "Cannot request vendor status. Current role: {}.",
            profile.role
        )));
    }
    match profile.status {
        UserStatus::Active => Ok(()),
        UserStatus::PendingApproval => Err(ApiError::bad_request("Vendor status request is already pending approval.")),
        other => Err(ApiError::bad_request(format!(
            "Cannot request vendor status. Current status: {}. Account must be active.",
            other
        ))),
    }
}

/// GET /api/users/:uid - own profile, or any profile for admins
pub async fn get_user(State(state): State<AppState>, ctx: AuthContext, Path(uid): Path<String>) -> ApiResult<UserProfile> {
    if ctx.uid() != uid && ctx.profile.role != Role::Admin {
        return Err(ApiError::forbidden(
            "Forbidden: You do not have permission to view this user profile.",
        ));
    }

    let record = state
        .profiles
        .get_profile(&uid)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found."))?;

    Ok(ApiResponse::success(stored_profile(record)?))
}

/// PUT /api/users/:uid
pub async fn update_user(
    State(state): State<AppState>,
    ctx: AuthContext,
    Path(uid): Path<String>,
    ApiJson(request): ApiJson<UpdateProfileRequest>,
) -> ApiResult<UserProfile> {
    let patch = plan_profile_update(&ctx.profile, &uid, request)?;

    let record = state
        .profiles
        .update_profile(&uid, patch)
        .await?
        .ok_or_else(|| ApiError::not_found("User profile not found."))?;

    tracing::info!("Profile {} updated by {}", uid, ctx.uid());
    Ok(ApiResponse::success(stored_profile(record)?))
}

/// POST /api/users/me/request-vendor-status
pub async fn request_vendor_status(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<UserProfile> {
    check_vendor_request(&ctx.profile)?;

    let transition = state
        .profiles
        .transition_status(ctx.uid(), UserStatus::Active, UserStatus::PendingApproval)
        .await?;
    let record = match transition {
        Some(record) => record,
        None => {
            // changed after the caller was resolved
            let current = state
                .profiles
                .get_profile(ctx.uid())
                .await?
                .ok_or_else(|| ApiError::not_found("User profile not found."))?;
            check_vendor_request(&stored_profile(current)?)?;
            return Err(ApiError::conflict("Profile changed during the request. Try again."));
        }
    };

    tracing::info!("Vendor status requested by {}", ctx.uid());
    Ok(ApiResponse::success(stored_profile(record)?))
}
