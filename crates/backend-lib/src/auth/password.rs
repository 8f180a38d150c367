// ============================
// crates/backend-lib/src/auth/password.rs
// ============================
//! Password hashing and verification.
use std::sync::Arc;

use scrypt::{
    password_hash::{
        rand_core::OsRng, PasswordHash, PasswordHasher, PasswordVerifier, SaltString,
    },
    Params, Scrypt,
};
use zeroize::Zeroizing;

use crate::error::AppError;

/// scrypt block size
const BLOCK_SIZE: u32 = 8;
/// scrypt parallelism
const PARALLELISM: u32 = 1;

/// Salted one-way hashing of plaintext secrets with scrypt.
///
/// Hashes are PHC strings carrying their own salt and parameters, so a
/// change of cost only affects new hashes.
#[derive(Debug, Clone)]
pub struct SecretHasher {
    params: Params,
    // verified against when a login names an unknown identity
    decoy_hash: String,
}

impl SecretHasher {
    /// Create a hasher with cost `2^log_n`
    pub fn new(log_n: u8) -> Result<Self, AppError> {
        let params = Params::new(log_n, BLOCK_SIZE, PARALLELISM, Params::RECOMMENDED_LEN)
            .map_err(|e| AppError::Internal(format!("invalid scrypt parameters: {e}")))?;

        let decoy_hash = hash_with(params, uuid::Uuid::new_v4().to_string().as_bytes())?;
        Ok(Self { params, decoy_hash })
    }

    /// Hash a password using scrypt
    pub fn hash(&self, plain: &str) -> Result<String, AppError> {
        hash_with(self.params, plain.as_bytes())
    }

    /// Verify a password against a hash
    pub fn verify(&self, hash: &str, plain: &str) -> bool {
        let parsed_hash = match PasswordHash::new(hash) {
            Ok(h) => h,
            Err(_) => return false,
        };
        Scrypt.verify_password(plain.as_bytes(), &parsed_hash).is_ok()
    }

    /// Burn the same work as a real verification; always fails
    pub fn verify_decoy(&self, plain: &str) -> bool {
        let _ = self.verify(&self.decoy_hash, plain);
        false
    }

    /// [`hash`](Self::hash) on the blocking pool
    pub async fn hash_blocking(self: &Arc<Self>, plain: Zeroizing<String>) -> Result<String, AppError> {
        let hasher = Arc::clone(self);
        tokio::task::spawn_blocking(move || hasher.hash(&plain)).await?
    }

    /// [`verify`](Self::verify) on the blocking pool; `None` runs the decoy
    pub async fn verify_blocking(
        self: &Arc<Self>,
        hash: Option<String>,
        plain: Zeroizing<String>,
    ) -> Result<bool, AppError> {
        let hasher = Arc::clone(self);
        let matched = tokio::task::spawn_blocking(move || match hash {
            Some(hash) => hasher.verify(&hash, &plain),
            None => hasher.verify_decoy(&plain),
        })
        .await?;
        Ok(matched)
    }
}

fn hash_with(params: Params, plain: &[u8]) -> Result<String, AppError> {
    let salt = SaltString::generate(&mut OsRng);
    let hash = Scrypt
        .hash_password_customized(plain, None, None, params, &salt)
        .map_err(|e| AppError::Internal(format!("failed to hash password: {e}")))?
        .to_string();
    Ok(hash)
}
