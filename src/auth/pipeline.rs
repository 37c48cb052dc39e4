use axum::http::HeaderMap;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

use super::{extract_bearer, AuthError, CredentialVerifier, Identity, ProfileResolver, RouteRequirement};
use crate::types::UserProfile;
use crate::upstream::bounded;

/// Verified caller handed to handlers once the pipeline succeeds.
#[derive(Debug, Clone, Serialize)]
pub struct AuthContext {
    pub identity: Identity,
    pub profile: UserProfile,
}

impl AuthContext {
    pub fn uid(&self) -> &str {
        &self.identity.uid
    }
}

/// Verifier → resolver → gate. Holds no per-request state.
#[derive(Clone)]
pub struct AuthPipeline {
    verifier: Arc<dyn CredentialVerifier>,
    resolver: ProfileResolver,
    verify_timeout: Duration,
}

impl AuthPipeline {
    pub fn new(verifier: Arc<dyn CredentialVerifier>, resolver: ProfileResolver, verify_timeout: Duration) -> Self {
        Self {
            verifier,
            resolver,
            verify_timeout,
        }
    }

    pub async fn authenticate(&self, headers: &HeaderMap) -> Result<Identity, AuthError> {
        let token = extract_bearer(headers)?;
        bounded(self.verify_timeout, "credential verifier", self.verifier.verify(token)).await?
    }

    /// Run all three stages; the first failure wins.
    pub async fn authorize(&self, headers: &HeaderMap, requirement: &RouteRequirement) -> Result<AuthContext, AuthError> {
        let identity = self.authenticate(headers).await?;
        let profile = self.resolver.resolve(&identity).await?;

        if !requirement.allows(profile.role) {
            tracing::warn!(
                "Denied uid {} with role {}: route requires {:?}",
                identity.uid,
                profile.role,
                requirement
            );
            return Err(AuthError::Forbidden);
        }

        tracing::debug!("Authorized uid {} as {}", identity.uid, profile.role);
        Ok(AuthContext { identity, profile })
    }
}
