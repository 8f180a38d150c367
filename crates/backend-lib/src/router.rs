// ============================
// crates/backend-lib/src/router.rs
// ============================
//! HTTP router.
use std::sync::Arc;
use std::time::Duration;

use axum::{
    http::{header, HeaderName, Method},
    middleware,
    routing::post,
    Router,
};
use tower_http::{
    cors::{Any, CorsLayer},
    trace::TraceLayer,
};

use crate::handlers::{auth, register};
use crate::middleware::{require_app_identification, require_bearer, APP_IDENTIFICATION_HEADER};
use crate::storage::IdentityStore;
use crate::AppState;

/// Prefix every route is nested under
pub const API_PREFIX: &str = "/api/v1/sso";

/// Create the SSO router
pub fn create_router<S: IdentityStore + Clone + 'static>(state: Arc<AppState<S>>) -> Router {
    let protected = Router::new()
        .route("/auth/check-token", post(auth::check_token))
        .route("/auth/get-login-details", post(auth::get_login_details::<S>))
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.tokens),
            require_bearer,
        ));

    let api = Router::new()
        .route("/auth/login", post(auth::login::<S>))
        .route("/auth/refresh-token", post(auth::refresh_token::<S>))
        .route("/register/save-user", post(register::save_user::<S>))
        .merge(protected)
        .route_layer(middleware::from_fn_with_state(
            Arc::clone(&state.settings),
            require_app_identification,
        ));

    Router::new()
        .nest(API_PREFIX, api)
        .layer(TraceLayer::new_for_http())
        .layer(cors())
        .with_state(state)
}

fn cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([
            header::AUTHORIZATION,
            header::CONTENT_TYPE,
            HeaderName::from_static("app-identification"),
        ])
        .max_age(Duration::from_secs(24 * 60 * 60))
}
