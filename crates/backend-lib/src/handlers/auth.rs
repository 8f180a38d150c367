//! `/auth` handlers.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Extension, Json,
};
use sso_common::{CheckTokenResponse, LoginDetailsResponse, LoginRequest, RefreshTokenRequest, TokenPair};

use super::json_body;
use crate::auth::service;
use crate::error::AppError;
use crate::middleware::AuthenticatedHandle;
use crate::storage::IdentityStore;
use crate::AppState;

const AUTHORIZED_MESSAGE: &str = "You are authorized";

/// `POST /auth/login`
pub async fn login<S: IdentityStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<LoginRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let request = json_body(body)?;
    service::login(&state, request).await.map(Json)
}

/// `POST /auth/refresh-token`
pub async fn refresh_token<S: IdentityStore>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<RefreshTokenRequest>, JsonRejection>,
) -> Result<Json<TokenPair>, AppError> {
    let request = json_body(body)?;
    service::refresh(&state.tokens, &request.refresh_token).map(Json)
}

/// `POST /auth/check-token`
pub async fn check_token(
    Extension(AuthenticatedHandle(handle)): Extension<AuthenticatedHandle>,
) -> Json<CheckTokenResponse> {
    Json(CheckTokenResponse {
        user_id: handle,
        message: AUTHORIZED_MESSAGE.to_string(),
    })
}

/// `POST /auth/get-login-details`
pub async fn get_login_details<S: IdentityStore>(
    State(state): State<Arc<AppState<S>>>,
    Extension(AuthenticatedHandle(handle)): Extension<AuthenticatedHandle>,
) -> Result<Json<LoginDetailsResponse>, AppError> {
    let user = service::login_details(&state, &handle).await?;
    Ok(Json(LoginDetailsResponse {
        user,
        message: AUTHORIZED_MESSAGE.to_string(),
    }))
}
