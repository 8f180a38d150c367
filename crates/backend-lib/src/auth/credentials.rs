//! Resolves a login request to a stored identity.
use std::sync::Arc;

use sso_common::LoginRequest;
use zeroize::Zeroizing;

use super::SecretHasher;
use crate::error::AppError;
use crate::storage::IdentityStore;
use crate::validation::{validate_login, LoginIdentifier};

/// Checks login credentials against the identity store
pub struct CredentialVerifier<'a, S: ?Sized> {
    store: &'a S,
    hasher: &'a Arc<SecretHasher>,
}

impl<'a, S: IdentityStore + ?Sized> CredentialVerifier<'a, S> {
    pub fn new(store: &'a S, hasher: &'a Arc<SecretHasher>) -> Self {
        Self { store, hasher }
    }

    /// Return the handle of the identity the request authenticates as.
    ///
    /// Unknown identities and wrong passwords both end in
    /// [`AppError::InvalidCredentials`], after the same amount of hashing work.
    pub async fn verify(&self, request: LoginRequest) -> Result<String, AppError> {
        let identifier = validate_login(&request)?;

        let identity = match identifier {
            LoginIdentifier::Handle(handle) => self.store.find_by_handle(handle).await?,
            LoginIdentifier::Email(email) => self.store.find_by_email(email).await?,
        };

        let secret = Zeroizing::new(request.password);
        let (handle, hash) = match identity {
            Some(record) => (Some(record.handle), Some(record.password_hash)),
            None => (None, None),
        };

        let matched = self.hasher.verify_blocking(hash, secret).await?;
        match handle {
            Some(handle) if matched => Ok(handle),
            _ => Err(AppError::InvalidCredentials),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::{sample_record, MemoryStorage};

    async fn seeded() -> (MemoryStorage, Arc<SecretHasher>) {
        let hasher = Arc::new(SecretHasher::new(4).unwrap());
        let store = MemoryStorage::new();
        let mut record = sample_record("U1", 1, "u1@a.com", "+1");
        record.password_hash = hasher.hash("secret").unwrap();
        store.create(record).await.unwrap();
        (store, hasher)
    }

    fn request(id: &str, email: &str, password: &str) -> LoginRequest {
        LoginRequest {
            id: id.to_string(),
            email: email.to_string(),
            password: password.to_string(),
        }
    }

    #[tokio::test]
    async fn test_login_by_handle_and_email() {
        let (store, hasher) = seeded().await;
        let verifier = CredentialVerifier::new(&store, &hasher);

        assert_eq!(verifier.verify(request("U1", "", "secret")).await.unwrap(), "U1");
        assert_eq!(
            verifier.verify(request("", "u1@a.com", "secret")).await.unwrap(),
            "U1"
        );
    }

    #[tokio::test]
    async fn test_rejections_are_uniform() {
        let (store, hasher) = seeded().await;
        let verifier = CredentialVerifier::new(&store, &hasher);

        let wrong_password = verifier.verify(request("U1", "", "wrong")).await.unwrap_err();
        let unknown_handle = verifier.verify(request("U2", "", "secret")).await.unwrap_err();
        let unknown_email = verifier
            .verify(request("", "nobody@a.com", "secret"))
            .await
            .unwrap_err();

        for err in [&wrong_password, &unknown_handle, &unknown_email] {
            assert!(matches!(err, AppError::InvalidCredentials));
        }
        assert_eq!(wrong_password.sanitized_message(), unknown_handle.sanitized_message());
        assert_eq!(wrong_password.sanitized_message(), unknown_email.sanitized_message());
    }

    #[tokio::test]
    async fn test_missing_identifier_is_validation_error() {
        let (store, hasher) = seeded().await;
        let verifier = CredentialVerifier::new(&store, &hasher);

        let err = verifier.verify(request("", "", "secret")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }
}
