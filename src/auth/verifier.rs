use async_trait::async_trait;
use axum::http::{header::AUTHORIZATION, HeaderMap};
use jsonwebtoken::{decode, errors::ErrorKind, Algorithm, DecodingKey, Validation};

use super::{AuthError, Claims, Identity};

/// Trust authority seam: turns a raw credential into a verified identity.
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError>;
}

/// Extract the bearer token from the Authorization header
pub fn extract_bearer(headers: &HeaderMap) -> Result<&str, AuthError> {
    let auth_header = headers
        .get(AUTHORIZATION)
        .ok_or_else(|| AuthError::Unauthenticated("No token provided or malformed.".to_string()))?;

    let auth_str = auth_header
        .to_str()
        .map_err(|_| AuthError::Unauthenticated("No token provided or malformed.".to_string()))?;

    let token = auth_str
        .strip_prefix("Bearer ")
        .ok_or_else(|| AuthError::Unauthenticated("No token provided or malformed.".to_string()))?;

    if token.trim().is_empty() {
        return Err(AuthError::Unauthenticated("Token not found after Bearer.".to_string()));
    }

    Ok(token.trim())
}

/// HS256 JWT verifier backed by a shared secret. An empty secret verifies nothing.
pub struct JwtVerifier {
    decoding_key: Option<DecodingKey>,
    validation: Validation,
}

impl JwtVerifier {
    pub fn new(secret: &str, issuer: Option<&str>) -> Self {
        let mut validation = Validation::new(Algorithm::HS256);
        if let Some(issuer) = issuer {
            validation.set_issuer(&[issuer]);
        }

        Self {
            decoding_key: (!secret.is_empty()).then(|| DecodingKey::from_secret(secret.as_bytes())),
            validation,
        }
    }
}

#[async_trait]
impl CredentialVerifier for JwtVerifier {
    async fn verify(&self, token: &str) -> Result<Identity, AuthError> {
        let decoding_key = self.decoding_key.as_ref().ok_or_else(|| {
            tracing::error!("JWT secret is empty, refusing every token");
            AuthError::Unauthenticated("Invalid token.".to_string())
        })?;

        let token_data = decode::<Claims>(token, decoding_key, &self.validation).map_err(|e| {
            tracing::debug!("JWT rejected: {}", e);
            match e.kind() {
                ErrorKind::ExpiredSignature => AuthError::Unauthenticated("Token expired.".to_string()),
                _ => AuthError::Unauthenticated("Invalid token.".to_string()),
            }
        })?;

        if token_data.claims.sub.trim().is_empty() {
            return Err(AuthError::Unauthenticated("Invalid token.".to_string()));
        }

        Ok(token_data.claims.into())
    }
}
