// ============================
// crates/backend-lib/src/registration/mod.rs
// ============================
//! Registration pipeline: validate, generate credentials, hash, persist.

pub mod generator;

use std::sync::Arc;

use chrono::Utc;
use metrics::counter;
use sso_common::{RegisteredIdentity, RegistrationInput};
use tracing::{info, instrument, warn};
use zeroize::Zeroizing;

pub use generator::{Alphabet, CredentialGenerator};

use crate::auth::SecretHasher;
use crate::error::AppError;
use crate::metrics::{REGISTRATION_COMPLETED, REGISTRATION_REJECTED};
use crate::storage::{IdentityField, IdentityFilter, IdentityRecord, IdentityStore};
use crate::validation::{parse_birth_date, validate_registration};

/// Onboards new identities
pub struct RegistrationPipeline<S> {
    store: S,
    generator: Arc<CredentialGenerator>,
    hasher: Arc<SecretHasher>,
}

impl<S> RegistrationPipeline<S> {
    pub fn new(store: S, generator: Arc<CredentialGenerator>, hasher: Arc<SecretHasher>) -> Self {
        Self {
            store,
            generator,
            hasher,
        }
    }
}

impl<S> RegistrationPipeline<S>
where
    S: IdentityStore + Clone + 'static,
{
    /// Register a new identity and return its profile together with the
    /// generated plaintext password.
    ///
    /// Nothing is persisted unless every step succeeds.
    #[instrument(skip_all, fields(national_id = input.national_id))]
    pub async fn register(&self, input: RegistrationInput) -> Result<RegisteredIdentity, AppError> {
        let result = self.run(input).await;
        match &result {
            Ok(identity) => {
                counter!(REGISTRATION_COMPLETED).increment(1);
                info!(handle = %identity.profile.id, "identity registered");
            },
            Err(err) => {
                counter!(REGISTRATION_REJECTED).increment(1);
                warn!(error = %err, "registration rejected");
            },
        }
        result
    }

    async fn run(&self, input: RegistrationInput) -> Result<RegisteredIdentity, AppError> {
        validate_registration(&input)?;
        let date_of_birth = parse_birth_date(input.date_of_birth.as_deref())?;

        let email = input.email.trim().to_string();
        let phone = input.phone_number.trim().to_string();
        self.ensure_unique(input.national_id, &email, &phone).await?;

        // Both tasks run to completion once spawned
        let password_task = {
            let generator = Arc::clone(&self.generator);
            tokio::spawn(async move { Ok::<_, AppError>(generator.password()) })
        };
        let handle_task = {
            let generator = Arc::clone(&self.generator);
            let store = self.store.clone();
            tokio::spawn(async move { generator.unique_handle(&store).await })
        };
        let (password, handle) = tokio::join!(password_task, handle_task);
        let password = Zeroizing::new(password??);
        let handle = handle??;

        let password_hash = self.hasher.hash_blocking(password.clone()).await?;

        let record = IdentityRecord {
            handle,
            national_id: input.national_id,
            email,
            phone,
            password_hash,
            name: input.name,
            gender: input.gender,
            address: input.address,
            date_of_birth,
            citizenship: input.citizenship,
            place_of_birth: input.place_of_birth,
            created_at: Utc::now(),
        };
        // a concurrent registration can claim the handle after its existence check
        self.store.create(record.clone()).await.map_err(|err| match err {
            AppError::Conflict(IdentityField::Handle) => {
                AppError::Internal("unique handle generation failed".to_string())
            },
            other => other,
        })?;

        Ok(RegisteredIdentity {
            profile: record.profile(),
            password: password.to_string(),
        })
    }

    /// Reject the input when national-ID, email or phone is already taken,
    /// checked in that order
    async fn ensure_unique(&self, national_id: i64, email: &str, phone: &str) -> Result<(), AppError> {
        for filter in [
            IdentityFilter::NationalId(national_id),
            IdentityFilter::Email(email),
            IdentityFilter::Phone(phone),
        ] {
            if self.store.count_where(filter).await? > 0 {
                return Err(AppError::Conflict(filter.field()));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Settings;
    use crate::storage::{sample_record, MemoryStorage};

    fn pipeline(store: &MemoryStorage, settings: &Settings) -> RegistrationPipeline<MemoryStorage> {
        RegistrationPipeline::new(
            store.clone(),
            Arc::new(CredentialGenerator::from_settings(settings).unwrap()),
            Arc::new(SecretHasher::new(4).unwrap()),
        )
    }

    fn input(national_id: i64, email: &str, phone: &str) -> RegistrationInput {
        RegistrationInput {
            national_id,
            email: email.to_string(),
            phone_number: phone.to_string(),
            ..RegistrationInput::default()
        }
    }

    #[tokio::test]
    async fn test_register_persists_hashed_identity() {
        let store = MemoryStorage::new();
        let settings = Settings::default();
        let pipeline = pipeline(&store, &settings);

        let registered = pipeline.register(input(1111, "a@a.com", "+1")).await.unwrap();
        assert!(registered.profile.id.starts_with("DRD-"));
        assert_eq!(registered.password.chars().count(), generator::PASSWORD_LENGTH);

        let record = store.find_by_handle(&registered.profile.id).await.unwrap().unwrap();
        assert_ne!(record.password_hash, registered.password);
        assert!(pipeline.hasher.verify(&record.password_hash, &registered.password));
        assert!(!pipeline.hasher.verify(&record.password_hash, "something-else"));
    }

    #[tokio::test]
    async fn test_duplicates_reported_in_order() {
        let store = MemoryStorage::new();
        store.create(sample_record("DRD-AAAAAA", 1111, "a@a.com", "+1")).await.unwrap();
        let pipeline = pipeline(&store, &Settings::default());

        let cases = [
            (input(1111, "a@a.com", "+1"), "national-ID already exists"),
            (input(2222, "a@a.com", "+1"), "email already exists"),
            (input(2222, "b@a.com", "+1"), "phone already exists"),
        ];
        for (input, message) in cases {
            let err = pipeline.register(input).await.unwrap_err();
            assert_eq!(err.status_code(), axum::http::StatusCode::BAD_REQUEST);
            assert_eq!(err.sanitized_message(), message);
        }
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_invalid_input_writes_nothing() {
        let store = MemoryStorage::new();
        let pipeline = pipeline(&store, &Settings::default());

        let err = pipeline.register(input(0, "a@a.com", "+1")).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        let mut bad_date = input(1111, "a@a.com", "+1");
        bad_date.date_of_birth = Some("1990/01/01".to_string());
        let err = pipeline.register(bad_date).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));

        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_handle_exhaustion_is_internal_error() {
        // a one-letter alphabet makes every candidate identical
        let settings = Settings {
            handle_alphabet: "A".to_string(),
            ..Settings::default()
        };
        let store = MemoryStorage::new();
        store.create(sample_record("DRD-AAAAAA", 1, "x@a.com", "+9")).await.unwrap();
        let pipeline = pipeline(&store, &settings);

        let err = pipeline.register(input(1111, "a@a.com", "+1")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.len().await, 1);
    }

    /// Reports every handle as free, like a store racing another registration
    #[derive(Clone, Default)]
    struct StaleHandleCheck(MemoryStorage);

    #[async_trait::async_trait]
    impl IdentityStore for StaleHandleCheck {
        async fn find_by_handle(&self, handle: &str) -> Result<Option<IdentityRecord>, AppError> {
            self.0.find_by_handle(handle).await
        }

        async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, AppError> {
            self.0.find_by_email(email).await
        }

        async fn count_where(&self, filter: IdentityFilter<'_>) -> Result<u64, AppError> {
            match filter {
                IdentityFilter::Handle(_) => Ok(0),
                other => self.0.count_where(other).await,
            }
        }

        async fn create(&self, record: IdentityRecord) -> Result<(), AppError> {
            self.0.create(record).await
        }
    }

    #[tokio::test]
    async fn test_handle_taken_before_create_is_internal_error() {
        let settings = Settings {
            handle_alphabet: "A".to_string(),
            ..Settings::default()
        };
        let store = StaleHandleCheck::default();
        store.create(sample_record("DRD-AAAAAA", 1, "x@a.com", "+9")).await.unwrap();
        let pipeline = RegistrationPipeline::new(
            store.clone(),
            Arc::new(CredentialGenerator::from_settings(&settings).unwrap()),
            Arc::new(SecretHasher::new(4).unwrap()),
        );

        let err = pipeline.register(input(1111, "a@a.com", "+1")).await.unwrap_err();
        assert!(matches!(err, AppError::Internal(_)));
        assert_eq!(err.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(store.0.len().await, 1);
    }
}
