// ============================
// crates/backend-lib/src/auth/mod.rs
// ============================
//! Authentication module.

mod credentials;
pub mod password;
pub mod service;
pub mod token;

pub use credentials::CredentialVerifier;
pub use password::SecretHasher;
pub use token::{Claims, TokenClass, TokenError, TokenService, ISSUER};
