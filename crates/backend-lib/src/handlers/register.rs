//! `/register` handlers.
use std::sync::Arc;

use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use sso_common::{RegistrationInput, RegistrationResponse};

use super::json_body;
use crate::error::AppError;
use crate::storage::IdentityStore;
use crate::AppState;

/// `POST /register/save-user`
pub async fn save_user<S: IdentityStore + Clone + 'static>(
    State(state): State<Arc<AppState<S>>>,
    body: Result<Json<RegistrationInput>, JsonRejection>,
) -> Result<Json<RegistrationResponse>, AppError> {
    let input = json_body(body)?;
    let user = state.registration().register(input).await?;
    Ok(Json(RegistrationResponse {
        user,
        message: "User saved".to_string(),
    }))
}
