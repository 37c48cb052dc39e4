pub mod gate;
pub mod pipeline;
pub mod resolver;
pub mod verifier;

pub use gate::RouteRequirement;
pub use pipeline::{AuthContext, AuthPipeline};
pub use resolver::ProfileResolver;
pub use verifier::{extract_bearer, CredentialVerifier, JwtVerifier};

use chrono::{Duration, Utc};
use jsonwebtoken::{encode, EncodingKey, Header};
use serde::{Deserialize, Serialize};

use crate::upstream::UpstreamTimeout;

/// Verified caller reference, immutable for the lifetime of a request.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Identity {
    pub uid: String,
    pub email: Option<String>,
    pub name: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    pub sub: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub iss: Option<String>,
    pub exp: i64,
    pub iat: i64,
}

/// Longest lifetime a token can be issued with: ten years.
pub const MAX_EXPIRY_HOURS: u64 = 24 * 365 * 10;

impl Claims {
    /// Expiry is clamped to `MAX_EXPIRY_HOURS`.
    pub fn new(uid: impl Into<String>, expiry_hours: u64) -> Self {
        let now = Utc::now();
        let exp = (now + Duration::hours(expiry_hours.min(MAX_EXPIRY_HOURS) as i64)).timestamp();

        Self {
            sub: uid.into(),
            email: None,
            name: None,
            iss: None,
            exp,
            iat: now.timestamp(),
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_issuer(mut self, issuer: Option<String>) -> Self {
        self.iss = issuer;
        self
    }
}

impl From<Claims> for Identity {
    fn from(claims: Claims) -> Self {
        Self {
            uid: claims.sub,
            email: claims.email,
            name: claims.name,
        }
    }
}

/// Failures of the authentication pipeline. Each one short-circuits the request.
#[derive(Debug, thiserror::Error)]
pub enum AuthError {
    #[error("unauthenticated: {0}")]
    Unauthenticated(String),

    #[error("no profile stored for uid {0}")]
    ProfileNotFound(String),

    #[error("profile unusable: {0}")]
    InvalidProfile(String),

    #[error("role not permitted for this route")]
    Forbidden,

    #[error(transparent)]
    Timeout(#[from] UpstreamTimeout),

    #[error("upstream failure: {0}")]
    Upstream(String),
}

#[derive(Debug, thiserror::Error)]
pub enum JwtError {
    #[error("JWT generation error: {0}")]
    TokenGeneration(String),
    #[error("Invalid JWT secret")]
    InvalidSecret,
}

/// Sign `claims` with an HS256 shared secret.
pub fn issue_token(secret: &str, claims: &Claims) -> Result<String, JwtError> {
    if secret.is_empty() {
        return Err(JwtError::InvalidSecret);
    }

    let encoding_key = EncodingKey::from_secret(secret.as_bytes());

    encode(&Header::default(), claims, &encoding_key).map_err(|e| JwtError::TokenGeneration(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn claims_become_identity() {
        let claims = Claims::new("u1", 1).with_email("a@b.test").with_name("Ada");
        let identity = Identity::from(claims);
        assert_eq!(identity.uid, "u1");
        assert_eq!(identity.email.as_deref(), Some("a@b.test"));
        assert_eq!(identity.name.as_deref(), Some("Ada"));
    }

    #[test]
    fn huge_expiry_is_clamped() {
        let claims = Claims::new("u1", u64::MAX);
        assert_eq!(claims.exp - claims.iat, (MAX_EXPIRY_HOURS * 3600) as i64);
    }

    #[test]
    fn empty_secret_is_rejected() {
        let claims = Claims::new("u1", 1);
        assert!(matches!(issue_token("", &claims), Err(JwtError::InvalidSecret)));
    }
}
