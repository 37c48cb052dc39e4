// HTTP API Error Types
use axum::{http::StatusCode, response::IntoResponse, Json};
use serde_json::{json, Value};
use std::collections::HashMap;

use crate::auth::AuthError;
use crate::database::StoreError;
use crate::services::payments::PaymentError;
use crate::upstream::UpstreamTimeout;

/// HTTP API error with appropriate status codes and client-friendly messages
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request
    BadRequest(String),
    ValidationError {
        message: String,
        field_errors: Option<HashMap<String, String>>,
    },
    InvalidJson(String),

    // 401 Unauthorized
    Unauthorized(String),

    // 403 Forbidden
    Forbidden(String),

    // 404 Not Found
    NotFound(String),

    // 409 Conflict
    Conflict(String),

    // 500 Internal Server Error
    InternalServerError(String),

    // 503 Service Unavailable
    ServiceUnavailable(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> u16 {
        match self {
            ApiError::BadRequest(_) => 400,
            ApiError::ValidationError { .. } => 400,
            ApiError::InvalidJson(_) => 400,
            ApiError::Unauthorized(_) => 401,
            ApiError::Forbidden(_) => 403,
            ApiError::NotFound(_) => 404,
            ApiError::Conflict(_) => 409,
            ApiError::InternalServerError(_) => 500,
            ApiError::ServiceUnavailable(_) => 503,
        }
    }

    /// Get client-safe error message
    pub fn message(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::ValidationError { message, .. } => message,
            ApiError::InvalidJson(msg) => msg,
            ApiError::Unauthorized(msg) => msg,
            ApiError::Forbidden(msg) => msg,
            ApiError::NotFound(msg) => msg,
            ApiError::Conflict(msg) => msg,
            ApiError::InternalServerError(msg) => msg,
            ApiError::ServiceUnavailable(msg) => msg,
        }
    }

    /// Convert to JSON response body
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::ValidationError { message, field_errors } => {
                let mut response = json!({
                    "error": true,
                    "message": message,
                    "code": "VALIDATION_ERROR"
                });

                if let Some(field_errors) = field_errors {
                    response["field_errors"] = json!(field_errors);
                }

                response
            }
            _ => {
                json!({
                    "error": true,
                    "message": self.message(),
                    "code": self.error_code()
                })
            }
        }
    }

    /// Get error code for client handling
    pub fn error_code(&self) -> &'static str {
        match self {
            ApiError::BadRequest(_) => "BAD_REQUEST",
            ApiError::ValidationError { .. } => "VALIDATION_ERROR",
            ApiError::InvalidJson(_) => "INVALID_JSON",
            ApiError::Unauthorized(_) => "UNAUTHORIZED",
            ApiError::Forbidden(_) => "FORBIDDEN",
            ApiError::NotFound(_) => "NOT_FOUND",
            ApiError::Conflict(_) => "CONFLICT",
            ApiError::InternalServerError(_) => "INTERNAL_SERVER_ERROR",
            ApiError::ServiceUnavailable(_) => "SERVICE_UNAVAILABLE",
        }
    }
}

impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        ApiError::BadRequest(message.into())
    }

    pub fn validation_error(
        message: impl Into<String>,
        field_errors: Option<HashMap<String, String>>,
    ) -> Self {
        ApiError::ValidationError {
            message: message.into(),
            field_errors,
        }
    }

    /// Single-field validation failure.
    pub fn invalid_field(field: &str, problem: impl Into<String>) -> Self {
        let mut field_errors = HashMap::new();
        field_errors.insert(field.to_string(), problem.into());
        ApiError::validation_error("Invalid request body", Some(field_errors))
    }

    pub fn invalid_json(message: impl Into<String>) -> Self {
        ApiError::InvalidJson(message.into())
    }

    pub fn unauthorized(message: impl Into<String>) -> Self {
        ApiError::Unauthorized(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        ApiError::Forbidden(message.into())
    }

    pub fn not_found(message: impl Into<String>) -> Self {
        ApiError::NotFound(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        ApiError::Conflict(message.into())
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }

    pub fn service_unavailable(message: impl Into<String>) -> Self {
        ApiError::ServiceUnavailable(message.into())
    }
}

/// How a guard reports a verified caller that has no stored profile.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MissingProfile {
    #[default]
    Unauthorized,
    NotFound,
}

impl ApiError {
    /// Map a pipeline failure to its HTTP form under the route's policy.
    pub fn from_auth(err: AuthError, missing_profile: MissingProfile) -> Self {
        match err {
            AuthError::Unauthenticated(msg) => ApiError::unauthorized(format!("Unauthorized: {}", msg)),
            AuthError::ProfileNotFound(_) => match missing_profile {
                MissingProfile::Unauthorized => ApiError::unauthorized("Unauthorized: User account not fully set up."),
                MissingProfile::NotFound => ApiError::not_found("User profile not found."),
            },
            AuthError::InvalidProfile(msg) => ApiError::forbidden(format!("Forbidden: {}", msg)),
            AuthError::Forbidden => ApiError::forbidden("Forbidden: Insufficient permissions for this resource."),
            AuthError::Timeout(timeout) => {
                tracing::error!("Authentication upstream timeout: {}", timeout);
                ApiError::service_unavailable("Authentication service temporarily unavailable")
            }
            AuthError::Upstream(msg) => {
                tracing::error!("Authentication upstream error: {}", msg);
                ApiError::internal_server_error("Internal Server Error during authentication.")
            }
        }
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        ApiError::from_auth(err, MissingProfile::default())
    }
}

impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Conflict(msg) => ApiError::conflict(msg),
            StoreError::Timeout(timeout) => {
                tracing::error!("Store timeout: {}", timeout);
                ApiError::service_unavailable("Data store temporarily unavailable")
            }
            StoreError::Backend(msg) => {
                tracing::error!("Store backend error: {}", msg);
                ApiError::internal_server_error("An error occurred while processing your request")
            }
            StoreError::Sqlx(sqlx_err) => {
                // Log the real error but return generic message
                tracing::error!("SQLx error: {}", sqlx_err);
                ApiError::internal_server_error("Database error occurred")
            }
        }
    }
}

impl From<PaymentError> for ApiError {
    fn from(err: PaymentError) -> Self {
        match err {
            PaymentError::Validation(msg) => ApiError::bad_request(msg),
            PaymentError::Rejected { provider, message } => {
                tracing::warn!("{} rejected payment request: {}", provider, message);
                ApiError::bad_request(format!("Payment provider rejected the request: {}", message))
            }
            PaymentError::NotConfigured(provider) => {
                ApiError::service_unavailable(format!("{} payments are not configured", provider))
            }
            PaymentError::Timeout(timeout) => {
                tracing::error!("Payment provider timeout: {}", timeout);
                ApiError::service_unavailable("Payment provider temporarily unavailable")
            }
            PaymentError::Upstream { provider, message } => {
                tracing::error!("{} payment error: {}", provider, message);
                ApiError::internal_server_error("Payment failed")
            }
            PaymentError::Transport(e) => {
                tracing::error!("Payment transport error: {}", e);
                ApiError::internal_server_error("Payment failed")
            }
        }
    }
}

impl From<UpstreamTimeout> for ApiError {
    fn from(err: UpstreamTimeout) -> Self {
        tracing::error!("Upstream timeout: {}", err);
        ApiError::service_unavailable("Service temporarily unavailable")
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message())
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = StatusCode::from_u16(self.status_code()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        (status, Json(self.to_json())).into_response()
    }
}
