use serde::Serialize;
use serde_json::Value;

use crate::auth::AuthContext;
use crate::middleware::{ApiJson, ApiResponse, ApiResult};
use crate::types::UserProfile;

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Greeting {
    pub message: String,
    pub uid: String,
    pub user_profile: UserProfile,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub received_body: Option<Value>,
}

fn display_name(ctx: &AuthContext) -> &str {
    ctx.profile
        .full_name
        .as_deref()
        .or(ctx.identity.email.as_deref())
        .unwrap_or(&ctx.identity.uid)
}

/// GET /api/auth/whoami - the verified identity and its resolved profile
pub async fn whoami(ctx: AuthContext) -> ApiResult<AuthContext> {
    Ok(ApiResponse::success(ctx))
}

/// GET /api/protected - any role
pub async fn protected_get(ctx: AuthContext) -> ApiResult<Greeting> {
    Ok(ApiResponse::success(Greeting {
        message: format!(
            "Hello, {}! Your role is {}. This is a protected GET route.",
            display_name(&ctx),
            ctx.profile.role
        ),
        uid: ctx.identity.uid.clone(),
        user_profile: ctx.profile,
        received_body: None,
    }))
}

/// POST /api/protected - admin only; echoes the body back
pub async fn protected_post(ctx: AuthContext, ApiJson(body): ApiJson<Value>) -> ApiResult<Greeting> {
    Ok(ApiResponse::success(Greeting {
        message: format!("Admin {} performed an action.", display_name(&ctx)),
        uid: ctx.identity.uid.clone(),
        user_profile: ctx.profile,
        received_body: Some(body),
    }))
}

/// PUT /api/protected - vendor or admin
pub async fn protected_put(ctx: AuthContext) -> ApiResult<Greeting> {
    Ok(ApiResponse::success(Greeting {
        message: format!(
            "User {} with role {} accessed this VENDOR or ADMIN route.",
            display_name(&ctx),
            ctx.profile.role
        ),
        uid: ctx.identity.uid.clone(),
        user_profile: ctx.profile,
        received_body: None,
    }))
}
