//! Shared application key check.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    middleware::Next,
    response::Response,
};

use crate::config::Settings;
use crate::error::AppError;

/// Header carrying the calling application's key
pub const APP_IDENTIFICATION_HEADER: &str = "App-Identification";

/// Rejects requests whose `App-Identification` header does not match the
/// configured key. A no-op when no key is configured.
pub async fn require_app_identification(
    State(settings): State<Arc<Settings>>,
    request: Request,
    next: Next,
) -> Result<Response, AppError> {
    if let Some(expected) = settings.app_identification.as_deref() {
        let presented = request
            .headers()
            .get(APP_IDENTIFICATION_HEADER)
            .and_then(|value| value.to_str().ok());
        if presented != Some(expected) {
            tracing::debug!("request without valid application identification");
            return Err(AppError::Auth("invalid application identification".to_string()));
        }
    }
    Ok(next.run(request).await)
}
