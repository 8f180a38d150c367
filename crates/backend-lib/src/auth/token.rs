// ============================
// crates/backend-lib/src/auth/token.rs
// ============================
//! Signed access/refresh tokens.
//!
//! Both classes are HS256 JWTs carrying the same claim set. They differ in
//! TTL, in the HMAC secret they are signed with, and in the `sub` marker,
//! which verification checks so a token of one class is never accepted as
//! the other even when both secrets are equal.
use std::fmt;

use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{
    decode, encode, errors::ErrorKind, Algorithm, DecodingKey, EncodingKey, Header, Validation,
};
use serde::{Deserialize, Serialize};
use sso_common::TokenPair;
use thiserror::Error;
use uuid::Uuid;

use crate::config::Settings;
use crate::error::AppError;

/// Issuer claim of every token minted by this service
pub const ISSUER: &str = "SSO_GATE";

/// Accepted signing algorithms (HMAC family only)
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// Token class
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenClass {
    Access,
    Refresh,
}

impl TokenClass {
    /// `sub` claim marking the class
    pub fn subject(self) -> &'static str {
        match self {
            TokenClass::Access => "SSO_ACCESS",
            TokenClass::Refresh => "SSO_REFRESH",
        }
    }

    /// Lifetime from issuance
    pub fn ttl(self) -> Duration {
        match self {
            TokenClass::Access => Duration::minutes(30),
            TokenClass::Refresh => Duration::days(7),
        }
    }
}

impl fmt::Display for TokenClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TokenClass::Access => f.write_str("access"),
            TokenClass::Refresh => f.write_str("refresh"),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Eq)]
pub struct Claims {
    pub iss: String, // Issuer
    pub sub: String, // Token class marker
    pub aud: String, // Identity handle
    pub iat: i64,    // Issued at
    pub exp: i64,    // Expiration
    pub jti: String, // JWT ID
}

impl Claims {
    /// Claims for a new token of `class` bound to `handle`, issued at `now`
    pub fn new(class: TokenClass, handle: &str, now: DateTime<Utc>) -> Self {
        Self {
            iss: ISSUER.to_string(),
            sub: class.subject().to_string(),
            aud: handle.to_string(),
            iat: now.timestamp(),
            exp: (now + class.ttl()).timestamp(),
            jti: Uuid::new_v4().to_string(),
        }
    }
}

#[derive(Error, Debug)]
pub enum TokenError {
    #[error("{0} signing secret is not configured")]
    MissingSecret(TokenClass),

    #[error("token signing failed: {0}")]
    Signing(jsonwebtoken::errors::Error),

    #[error("{}", describe(.0.kind()))]
    Invalid(jsonwebtoken::errors::Error),
}

impl TokenError {
    /// Short reason a token was refused
    pub fn reason(&self) -> String {
        self.to_string()
    }
}

impl From<TokenError> for AppError {
    fn from(err: TokenError) -> Self {
        match err {
            TokenError::Invalid(_) => AppError::Auth(err.reason()),
            TokenError::MissingSecret(_) | TokenError::Signing(_) => {
                tracing::error!(error = %err, "token signing failed");
                AppError::Internal("Error when creating token".to_string())
            },
        }
    }
}

fn describe(kind: &ErrorKind) -> String {
    match kind {
        ErrorKind::ExpiredSignature => "token is expired".to_string(),
        ErrorKind::InvalidSignature => "signature is invalid".to_string(),
        ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => {
            "unexpected signing method".to_string()
        },
        ErrorKind::InvalidIssuer => "token was not issued by this service".to_string(),
        ErrorKind::InvalidSubject => "wrong token class".to_string(),
        ErrorKind::ImmatureSignature => "token is not valid yet".to_string(),
        ErrorKind::MissingRequiredClaim(claim) => format!("token is missing the {claim} claim"),
        _ => "token is malformed".to_string(),
    }
}

/// Signs and verifies tokens with one secret per class
pub struct TokenService {
    access_secret: String,
    refresh_secret: String,
}

impl TokenService {
    pub fn new(access_secret: impl Into<String>, refresh_secret: impl Into<String>) -> Self {
        Self {
            access_secret: access_secret.into(),
            refresh_secret: refresh_secret.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Self {
        Self::new(settings.access_secret.clone(), settings.refresh_secret.clone())
    }

    fn secret(&self, class: TokenClass) -> Result<&[u8], TokenError> {
        let secret = match class {
            TokenClass::Access => &self.access_secret,
            TokenClass::Refresh => &self.refresh_secret,
        };
        if secret.is_empty() {
            return Err(TokenError::MissingSecret(class));
        }
        Ok(secret.as_bytes())
    }

    /// Sign `claims` with the secret of `class`
    pub fn sign(&self, class: TokenClass, claims: &Claims) -> Result<String, TokenError> {
        let key = EncodingKey::from_secret(self.secret(class)?);
        encode(&Header::new(Algorithm::HS256), claims, &key).map_err(TokenError::Signing)
    }

    /// Mint a fresh access/refresh pair bound to `handle`
    pub fn issue_pair(&self, handle: &str) -> Result<TokenPair, TokenError> {
        let now = Utc::now();
        Ok(TokenPair {
            access_token: self.sign(TokenClass::Access, &Claims::new(TokenClass::Access, handle, now))?,
            refresh_token: self
                .sign(TokenClass::Refresh, &Claims::new(TokenClass::Refresh, handle, now))?,
        })
    }

    /// Verify a token of `class` and return its claims
    pub fn verify(&self, class: TokenClass, token: &str) -> Result<Claims, TokenError> {
        let key = DecodingKey::from_secret(self.secret(class)?);

        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_aud = false;
        validation.set_issuer(&[ISSUER]);
        validation.sub = Some(class.subject().to_string());
        validation.set_required_spec_claims(&["exp", "iss", "sub", "aud"]);

        let token_data = decode::<Claims>(token, &key, &validation).map_err(TokenError::Invalid)?;
        Ok(token_data.claims)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::{engine::general_purpose::URL_SAFE_NO_PAD, Engine as _};

    fn service() -> TokenService {
        TokenService::new("access-secret", "refresh-secret")
    }

    fn reason(err: TokenError) -> String {
        err.reason()
    }

    #[test]
    fn test_issue_pair_round_trip() {
        let service = service();
        let pair = service.issue_pair("DRD-ABCDEF").unwrap();
        assert!(!pair.access_token.is_empty());
        assert!(!pair.refresh_token.is_empty());
        assert_ne!(pair.access_token, pair.refresh_token);

        let access = service.verify(TokenClass::Access, &pair.access_token).unwrap();
        assert_eq!(access.aud, "DRD-ABCDEF");
        assert_eq!(access.iss, ISSUER);
        assert_eq!(access.sub, "SSO_ACCESS");
        assert_eq!(access.exp - access.iat, 30 * 60);

        let refresh = service.verify(TokenClass::Refresh, &pair.refresh_token).unwrap();
        assert_eq!(refresh.sub, "SSO_REFRESH");
        assert_eq!(refresh.exp - refresh.iat, 7 * 24 * 60 * 60);
        assert_ne!(access.jti, refresh.jti);
    }

    #[test]
    fn test_classes_do_not_cross() {
        let service = service();
        let pair = service.issue_pair("DRD-ABCDEF").unwrap();

        assert!(service.verify(TokenClass::Access, &pair.refresh_token).is_err());
        assert!(service.verify(TokenClass::Refresh, &pair.access_token).is_err());
    }

    #[test]
    fn test_classes_do_not_cross_with_shared_secret() {
        let service = TokenService::new("shared", "shared");
        let pair = service.issue_pair("DRD-ABCDEF").unwrap();

        let err = service.verify(TokenClass::Access, &pair.refresh_token).unwrap_err();
        assert_eq!(reason(err), "wrong token class");
        let err = service.verify(TokenClass::Refresh, &pair.access_token).unwrap_err();
        assert_eq!(reason(err), "wrong token class");
    }

    #[test]
    fn test_expired_token_rejected() {
        let service = service();
        let mut claims = Claims::new(TokenClass::Access, "DRD-ABCDEF", Utc::now());
        claims.iat -= 3600;
        claims.exp = Utc::now().timestamp() - 1;
        let token = service.sign(TokenClass::Access, &claims).unwrap();

        let err = service.verify(TokenClass::Access, &token).unwrap_err();
        assert_eq!(reason(err), "token is expired");
    }

    #[test]
    fn test_foreign_issuer_rejected() {
        let service = service();
        let mut claims = Claims::new(TokenClass::Refresh, "DRD-ABCDEF", Utc::now());
        claims.iss = "SOMEONE_ELSE".to_string();
        let token = service.sign(TokenClass::Refresh, &claims).unwrap();

        let err = service.verify(TokenClass::Refresh, &token).unwrap_err();
        assert_eq!(reason(err), "token was not issued by this service");
    }

    #[test]
    fn test_wrong_secret_rejected() {
        let signer = TokenService::new("other-access", "other-refresh");
        let token = signer.issue_pair("DRD-ABCDEF").unwrap().access_token;

        let err = service().verify(TokenClass::Access, &token).unwrap_err();
        assert_eq!(reason(err), "signature is invalid");
    }

    #[test]
    fn test_other_hmac_strengths_accepted() {
        let service = service();
        let claims = Claims::new(TokenClass::Access, "DRD-ABCDEF", Utc::now());
        let token = encode(
            &Header::new(Algorithm::HS512),
            &claims,
            &EncodingKey::from_secret(b"access-secret"),
        )
        .unwrap();

        assert_eq!(service.verify(TokenClass::Access, &token).unwrap(), claims);
    }

    #[test]
    fn test_substituted_algorithm_rejected() {
        let service = service();
        let token = service.issue_pair("DRD-ABCDEF").unwrap().access_token;

        // Same payload and signature, header now claims RS256
        let mut parts = token.splitn(2, '.');
        let _header = parts.next().unwrap();
        let rest = parts.next().unwrap();
        let forged_header = URL_SAFE_NO_PAD.encode(br#"{"typ":"JWT","alg":"RS256"}"#);
        let forged = format!("{forged_header}.{rest}");

        let err = service.verify(TokenClass::Access, &forged).unwrap_err();
        assert_eq!(reason(err), "unexpected signing method");
    }

    #[test]
    fn test_garbage_token_rejected() {
        let err = service().verify(TokenClass::Access, "not.a.jwt").unwrap_err();
        assert!(matches!(err, TokenError::Invalid(_)));
    }

    #[test]
    fn test_missing_secret_is_internal() {
        let service = TokenService::new("", "refresh-secret");
        let err = service.issue_pair("DRD-ABCDEF").unwrap_err();
        assert!(matches!(err, TokenError::MissingSecret(TokenClass::Access)));

        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Internal(_)));
    }

    #[test]
    fn test_invalid_token_maps_to_auth_error() {
        let err = service().verify(TokenClass::Access, "garbage").unwrap_err();
        let app_err: AppError = err.into();
        assert!(matches!(app_err, AppError::Auth(_)));
    }
}
