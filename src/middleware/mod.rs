pub mod auth;
pub mod json;
pub mod response;

pub use auth::{guarded, require_auth, Guard};
pub use json::ApiJson;
pub use response::{ApiResponse, ApiResult};
