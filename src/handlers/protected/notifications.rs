use axum::extract::{Path, State};
use serde::Serialize;
use uuid::Uuid;

use crate::auth::AuthContext;
use crate::error::ApiError;
use crate::middleware::{ApiResponse, ApiResult};
use crate::state::AppState;
use crate::types::Notification;

/// Most notifications returned by one listing.
pub const LIST_LIMIT: usize = 100;

#[derive(Debug, Serialize)]
pub struct ReadAllResult {
    pub updated: u64,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReadResult {
    pub id: Uuid,
    pub is_read: bool,
}

/// GET /api/vendor/notifications - caller's inbox, newest first
pub async fn list(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<Vec<Notification>> {
    let items = state.notifications.list_for(ctx.uid(), LIST_LIMIT).await?;
    Ok(ApiResponse::success(items))
}

/// PUT /api/vendor/notifications/read-all
pub async fn read_all(State(state): State<AppState>, ctx: AuthContext) -> ApiResult<ReadAllResult> {
    let updated = state.notifications.mark_all_read(ctx.uid()).await?;
    tracing::debug!("Marked {} notifications read for {}", updated, ctx.uid());
    Ok(ApiResponse::success(ReadAllResult { updated }))
}

/// PUT /api/vendor/notifications/:id/read
///
/// Another user's notification is reported as missing.
pub async fn read_one(State(state): State<AppState>, ctx: AuthContext, Path(id): Path<String>) -> ApiResult<ReadResult> {
    let id = Uuid::parse_str(&id).map_err(|_| ApiError::not_found("Notification not found."))?;

    if !state.notifications.mark_read(ctx.uid(), id).await? {
        return Err(ApiError::not_found("Notification not found."));
    }
    Ok(ApiResponse::success(ReadResult { id, is_read: true }))
}
