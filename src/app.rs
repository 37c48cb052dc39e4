use axum::{
    http::HeaderValue,
    routing::{delete, get, post, put},
    Router,
};
use tower_http::{
    cors::{AllowOrigin, Any, CorsLayer},
    trace::TraceLayer,
};

use crate::config::AppConfig;
use crate::handlers::{elevated::admin, protected, public};
use crate::middleware::{guarded, Guard};
use crate::state::AppState;
use crate::types::Role;

/// Guards shared by every route group.
struct Guards {
    any: Guard,
    admin: Guard,
    vendor_or_admin: Guard,
}

impl Guards {
    fn new(state: &AppState) -> Self {
        let pipeline = state.pipeline.clone();
        Self {
            any: Guard::any(pipeline.clone()),
            admin: Guard::new(pipeline.clone(), Role::Admin),
            vendor_or_admin: Guard::new(pipeline, [Role::Vendor, Role::Admin]),
        }
    }
}

/// Full application router with state applied.
pub fn app(state: AppState) -> Router {
    let guards = Guards::new(&state);

    Router::new()
        // Public
        .route("/", get(public::root))
        .route("/health", get(public::health))
        // Guarded
        .merge(session_routes(&guards))
        .merge(user_routes(&guards))
        .merge(vendor_routes(&guards))
        .merge(payment_routes(&guards))
        // Global middleware
        .layer(cors_layer(&state.config))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

fn session_routes(guards: &Guards) -> Router<AppState> {
    use protected::session;

    Router::new()
        .route("/api/auth/whoami", guarded(get(session::whoami), guards.any.clone()))
        .route(
            "/api/protected",
            guarded(get(session::protected_get), guards.any.clone())
                .merge(guarded(post(session::protected_post), guards.admin.clone()))
                .merge(guarded(put(session::protected_put), guards.vendor_or_admin.clone())),
        )
}

fn user_routes(guards: &Guards) -> Router<AppState> {
    use protected::users;

    Router::new()
        .route("/api/users", guarded(get(admin::list_users), guards.admin.clone()))
        .route(
            "/api/users/:uid",
            guarded(get(users::get_user).put(users::update_user), guards.any.clone())
                .merge(guarded(delete(admin::delete_user), guards.admin.clone())),
        )
        .route(
            "/api/users/me/request-vendor-status",
            guarded(
                post(users::request_vendor_status),
                guards.any.clone().missing_profile_as_not_found(),
            ),
        )
        .route("/api/admin/users", guarded(post(admin::create_user), guards.admin.clone()))
}

fn vendor_routes(guards: &Guards) -> Router<AppState> {
    use protected::notifications;

    Router::new()
        .route(
            "/api/vendor/notifications",
            guarded(get(notifications::list), guards.vendor_or_admin.clone()),
        )
        .route(
            "/api/vendor/notifications/read-all",
            guarded(put(notifications::read_all), guards.vendor_or_admin.clone()),
        )
        .route(
            "/api/vendor/notifications/:id/read",
            guarded(put(notifications::read_one), guards.vendor_or_admin.clone()),
        )
}

fn payment_routes(guards: &Guards) -> Router<AppState> {
    use protected::payments;

    Router::new()
        .route(
            "/api/payment/stripe/intent",
            guarded(post(payments::stripe_intent), guards.any.clone()),
        )
        .route(
            "/api/payment/paypal/order",
            guarded(post(payments::paypal_order), guards.any.clone()),
        )
        .route(
            "/api/payment/paypal/capture",
            guarded(post(payments::paypal_capture), guards.any.clone()),
        )
}

/// Permissive in development, otherwise limited to the configured origins.
pub fn cors_layer(config: &AppConfig) -> CorsLayer {
    if !config.security.enable_cors {
        return CorsLayer::new();
    }
    if config.is_development() || config.security.cors_origins.iter().any(|o| o == "*") {
        return CorsLayer::permissive();
    }

    let origins: Vec<HeaderValue> = config
        .security
        .cors_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!("Ignoring invalid CORS origin '{}'", origin);
                None
            }
        })
        .collect();

    CorsLayer::new()
        .allow_origin(AllowOrigin::list(origins))
        .allow_methods(Any)
        .allow_headers(Any)
}
