// ================
// crates/common/src/lib.rs
// ================
//! Wire types shared between the single-sign-on server and its clients.
//! Every type here is a JSON body of one of the `/api/v1/sso` endpoints.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// Login body: exactly one of `id` (handle) or `email` plus the password.
#[derive(Serialize, Deserialize, Clone, Default)]
#[serde(default)]
pub struct LoginRequest {
    /// Identity handle, e.g. `DRD-7K2Q9X`
    pub id: String,
    /// Email address of the identity
    pub email: String,
    /// Plaintext password
    pub password: String,
}

impl fmt::Debug for LoginRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginRequest")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// Body of `POST /auth/refresh-token`
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RefreshTokenRequest {
    pub refresh_token: String,
}

/// Access/refresh token pair returned by login and refresh
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TokenPair {
    /// Short-lived token accepted by the bearer gate
    pub access_token: String,
    /// Long-lived token accepted only by the refresh endpoint
    pub refresh_token: String,
}

/// Candidate profile submitted to `POST /register/save-user`.
///
/// `ktpNumber`, `email` and `phoneNumber` are mandatory; everything else may
/// be omitted.
#[derive(Serialize, Deserialize, Debug, Clone, Default)]
#[serde(default, rename_all = "camelCase")]
pub struct RegistrationInput {
    pub name: String,
    pub gender: String,
    pub email: String,
    #[serde(rename = "ktpNumber")]
    pub national_id: i64,
    pub address: String,
    pub phone_number: String,
    /// `YYYY-MM-DD`
    pub date_of_birth: Option<String>,
    pub citizenship: String,
    pub place_of_birth: String,
}

/// Public view of a stored identity. Never carries the password hash.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct IdentityProfile {
    /// Assigned handle
    pub id: String,
    pub name: String,
    pub gender: String,
    pub email: String,
    #[serde(rename = "ktpNumber")]
    pub national_id: i64,
    pub address: String,
    pub phone_number: String,
    pub date_of_birth: Option<NaiveDate>,
    pub citizenship: String,
    pub place_of_birth: String,
}

/// Profile of a freshly registered identity together with its one-time
/// plaintext password. This is the only place the password is ever returned.
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegisteredIdentity {
    #[serde(flatten)]
    pub profile: IdentityProfile,
    pub password: String,
}

/// Response of `POST /register/save-user`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct RegistrationResponse {
    pub user: RegisteredIdentity,
    pub message: String,
}

/// Response of `POST /auth/get-login-details`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct LoginDetailsResponse {
    pub user: IdentityProfile,
    pub message: String,
}

/// Response of `POST /auth/check-token`
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct CheckTokenResponse {
    #[serde(rename = "userID")]
    pub user_id: String,
    pub message: String,
}

/// Body of every error response
#[derive(Serialize, Deserialize, Debug, Clone)]
pub struct MessageResponse {
    pub message: String,
    /// Stable machine-readable error code
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
}
