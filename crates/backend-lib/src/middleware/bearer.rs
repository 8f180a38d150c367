//! Bearer token gate.
use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::AUTHORIZATION,
    middleware::Next,
    response::Response,
};
use metrics::counter;
use tracing::debug;

use crate::auth::{TokenClass, TokenService};
use crate::error::AppError;
use crate::metrics::BEARER_REJECTED;

/// Reply to requests without a usable `Authorization` header
pub const MISSING_TOKEN_MESSAGE: &str = "missing token";

/// Handle of the identity an access token was issued to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedHandle(pub String);

/// Extract the token from an `Authorization: Bearer <token>` value
pub fn parse_authorization(value: &str) -> Result<&str, AppError> {
    let mut parts = value.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(scheme), Some(token), None) if scheme.eq_ignore_ascii_case("bearer") => Ok(token),
        _ => Err(AppError::Auth(MISSING_TOKEN_MESSAGE.to_string())),
    }
}

/// Resolve an `Authorization` header to the handle of a valid access token
pub fn authenticate(tokens: &TokenService, header: Option<&str>) -> Result<AuthenticatedHandle, AppError> {
    let token = header
        .ok_or_else(|| AppError::Auth(MISSING_TOKEN_MESSAGE.to_string()))
        .and_then(parse_authorization)?;
    let claims = tokens.verify(TokenClass::Access, token)?;
    Ok(AuthenticatedHandle(claims.aud))
}

/// Rejects requests without a valid access token; on success the handle is
/// available to handlers as `Extension<AuthenticatedHandle>`
pub async fn require_bearer(
    State(tokens): State<Arc<TokenService>>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header = request
        .headers()
        .get(AUTHORIZATION)
        .and_then(|value| value.to_str().ok());

    let handle = authenticate(&tokens, header).inspect_err(|err| {
        counter!(BEARER_REJECTED).increment(1);
        debug!(error = %err, "bearer token rejected");
    })?;

    request.extensions_mut().insert(handle);
    Ok(next.run(request).await)
}
