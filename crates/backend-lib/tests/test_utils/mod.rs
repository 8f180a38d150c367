//! Shared setup for the router-level tests.
#![allow(dead_code)]

use std::sync::Arc;

use axum::{
    body::Body,
    http::{Request, StatusCode},
    Router,
};
use chrono::Utc;
use serde_json::Value;
use sso_backend_lib::{
    config::Settings,
    create_router,
    storage::{IdentityRecord, IdentityStore, MemoryStorage},
    AppState,
};
use tower::ServiceExt;

pub const ACCESS_SECRET: &str = "test-access-secret";
pub const REFRESH_SECRET: &str = "test-refresh-secret";

/// Settings with test secrets and a cheap hashing cost
pub fn test_settings() -> Settings {
    Settings {
        access_secret: ACCESS_SECRET.to_string(),
        refresh_secret: REFRESH_SECRET.to_string(),
        password_hash_log_n: 4,
        ..Settings::default()
    }
}

/// Router over an empty in-memory store
pub fn test_app(settings: Settings) -> (Router, Arc<AppState<MemoryStorage>>) {
    let state = Arc::new(AppState::new(MemoryStorage::new(), settings).unwrap());
    (create_router(Arc::clone(&state)), state)
}

/// Store an identity whose password is `password`
pub async fn seed_identity<S: IdentityStore>(
    state: &AppState<S>,
    handle: &str,
    national_id: i64,
    email: &str,
    password: &str,
) {
    let record = IdentityRecord {
        handle: handle.to_string(),
        national_id,
        email: email.to_string(),
        phone: format!("+{national_id}"),
        password_hash: state.hasher.hash(password).unwrap(),
        name: "Seeded User".to_string(),
        gender: String::new(),
        address: String::new(),
        date_of_birth: None,
        citizenship: String::new(),
        place_of_birth: String::new(),
        created_at: Utc::now(),
    };
    state.store.create(record).await.unwrap();
}

/// POST a raw body and return the status with the decoded JSON reply
pub async fn post_raw(app: &Router, uri: &str, body: &str, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    let mut request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("content-type", "application/json");
    for (name, value) in headers {
        request = request.header(*name, *value);
    }
    let request = request.body(Body::from(body.to_string())).unwrap();

    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let body = if bytes.is_empty() {
        Value::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, body)
}

pub async fn post_json(app: &Router, uri: &str, body: Value, headers: &[(&str, &str)]) -> (StatusCode, Value) {
    post_raw(app, uri, &body.to_string(), headers).await
}
