use async_trait::async_trait;
use axum::{
    extract::{FromRequestParts, Request, State},
    http::request::Parts,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::MethodRouter,
};
use std::sync::Arc;

use crate::auth::{AuthContext, AuthPipeline, RouteRequirement};
use crate::error::{ApiError, MissingProfile};

/// Per-route authorization policy: which roles pass, and how a missing
/// profile is reported.
#[derive(Clone)]
pub struct Guard {
    pipeline: Arc<AuthPipeline>,
    requirement: RouteRequirement,
    missing_profile: MissingProfile,
}

impl Guard {
    pub fn new(pipeline: Arc<AuthPipeline>, requirement: impl Into<RouteRequirement>) -> Self {
        Self {
            pipeline,
            requirement: requirement.into(),
            missing_profile: MissingProfile::default(),
        }
    }

    pub fn any(pipeline: Arc<AuthPipeline>) -> Self {
        Self::new(pipeline, RouteRequirement::any())
    }

    /// Report a verified caller without a stored profile as 404 instead of 401.
    pub fn missing_profile_as_not_found(mut self) -> Self {
        self.missing_profile = MissingProfile::NotFound;
        self
    }
}

/// Route layer that runs the pipeline and only then the wrapped handler.
pub async fn require_auth(State(guard): State<Guard>, mut request: Request, next: Next) -> Response {
    match guard.pipeline.authorize(request.headers(), &guard.requirement).await {
        Ok(context) => {
            request.extensions_mut().insert(context);
            next.run(request).await
        }
        Err(err) => ApiError::from_auth(err, guard.missing_profile).into_response(),
    }
}

/// Wrap every handler already registered on `route` with `guard`.
pub fn guarded<S>(route: MethodRouter<S>, guard: Guard) -> MethodRouter<S>
where
    S: Clone + Send + Sync + 'static,
{
    route.route_layer(middleware::from_fn_with_state(guard, require_auth))
}

#[async_trait]
impl<S> FromRequestParts<S> for AuthContext
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        // Only present when the route was wrapped with `guarded`
        parts
            .extensions
            .get::<AuthContext>()
            .cloned()
            .ok_or_else(|| ApiError::unauthorized("Unauthorized: authentication required."))
    }
}
