//! Login, refresh and profile flows.
use metrics::counter;
use sso_common::{IdentityProfile, LoginRequest, TokenPair};
use tracing::{info, instrument, warn};

use super::{CredentialVerifier, TokenClass, TokenError, TokenService};
use crate::error::AppError;
use crate::metrics::{LOGIN_REJECTED, LOGIN_SUCCEEDED, REFRESH_REJECTED, REFRESH_SUCCEEDED};
use crate::storage::IdentityStore;
use crate::validation::validate_refresh_token;
use crate::AppState;

/// Verify credentials and mint a token pair for the identity
#[instrument(skip_all, fields(id = %request.id, email = %request.email))]
pub async fn login<S: IdentityStore>(
    state: &AppState<S>,
    request: LoginRequest,
) -> Result<TokenPair, AppError> {
    let verifier = CredentialVerifier::new(&state.store, &state.hasher);
    let handle = match verifier.verify(request).await {
        Ok(handle) => handle,
        Err(err) => {
            counter!(LOGIN_REJECTED).increment(1);
            warn!(error = %err, "login rejected");
            return Err(err);
        },
    };

    let pair = state.tokens.issue_pair(&handle)?;
    counter!(LOGIN_SUCCEEDED).increment(1);
    info!(%handle, "login succeeded");
    Ok(pair)
}

/// Trade a refresh token for a brand-new pair.
///
/// Verification failures surface their reason with a 400; the presented
/// refresh token stays valid until it expires.
#[instrument(skip_all)]
pub fn refresh(tokens: &TokenService, refresh_token: &str) -> Result<TokenPair, AppError> {
    let refresh_token = validate_refresh_token(refresh_token)?;

    let claims = tokens
        .verify(TokenClass::Refresh, refresh_token)
        .map_err(|err| match err {
            TokenError::Invalid(_) => {
                counter!(REFRESH_REJECTED).increment(1);
                warn!(reason = %err, "refresh token rejected");
                AppError::InvalidRefreshToken(err.reason())
            },
            other => AppError::from(other),
        })?;

    let pair = tokens.issue_pair(&claims.aud)?;
    counter!(REFRESH_SUCCEEDED).increment(1);
    info!(handle = %claims.aud, "token pair refreshed");
    Ok(pair)
}

/// Profile of the authenticated identity
pub async fn login_details<S: IdentityStore>(
    state: &AppState<S>,
    handle: &str,
) -> Result<IdentityProfile, AppError> {
    state
        .store
        .find_by_handle(handle)
        .await?
        .map(|record| record.profile())
        .ok_or_else(|| AppError::Auth("Invalid user logged in".to_string()))
}
