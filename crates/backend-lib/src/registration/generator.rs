//! Random credential generation.
use metrics::counter;
use rand::Rng;
use tracing::{debug, warn};

use crate::config::Settings;
use crate::error::AppError;
use crate::metrics::HANDLE_COLLISION;
use crate::storage::{IdentityFilter, IdentityStore};

/// Length of a generated password
pub const PASSWORD_LENGTH: usize = 8;
/// Random characters after the handle prefix
pub const HANDLE_LENGTH: usize = 6;
/// Candidates tried before handle generation gives up
pub const HANDLE_ATTEMPTS: usize = 3;

/// Non-empty set of characters to draw from
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Alphabet(Vec<char>);

impl Alphabet {
    pub fn new(chars: &str) -> Result<Self, AppError> {
        let chars: Vec<char> = chars.chars().collect();
        if chars.is_empty() {
            return Err(AppError::Internal("alphabet must not be empty".to_string()));
        }
        Ok(Self(chars))
    }

    /// `len` characters picked uniformly at random
    pub fn draw(&self, len: usize) -> String {
        let mut rng = rand::rng();
        (0..len)
            .map(|_| self.0[rng.random_range(0..self.0.len())])
            .collect()
    }
}

/// Produces initial passwords and identity handles
#[derive(Debug, Clone)]
pub struct CredentialGenerator {
    password_alphabet: Alphabet,
    handle_alphabet: Alphabet,
    handle_prefix: String,
}

impl CredentialGenerator {
    pub fn new(
        password_alphabet: Alphabet,
        handle_alphabet: Alphabet,
        handle_prefix: impl Into<String>,
    ) -> Self {
        Self {
            password_alphabet,
            handle_alphabet,
            handle_prefix: handle_prefix.into(),
        }
    }

    pub fn from_settings(settings: &Settings) -> Result<Self, AppError> {
        Ok(Self::new(
            Alphabet::new(&settings.password_alphabet)?,
            Alphabet::new(&settings.handle_alphabet)?,
            settings.handle_prefix.clone(),
        ))
    }

    /// Fresh initial password
    pub fn password(&self) -> String {
        self.password_alphabet.draw(PASSWORD_LENGTH)
    }

    /// One handle candidate; uniqueness is not checked
    pub fn handle_candidate(&self) -> String {
        format!("{}{}", self.handle_prefix, self.handle_alphabet.draw(HANDLE_LENGTH))
    }

    /// Handle no stored identity uses yet
    pub async fn unique_handle<S: IdentityStore + ?Sized>(&self, store: &S) -> Result<String, AppError> {
        find_unique_handle(store, || self.handle_candidate()).await
    }
}

/// Try up to [`HANDLE_ATTEMPTS`] candidates from `draw`, returning the first
/// one the store does not know.
pub async fn find_unique_handle<S, F>(store: &S, mut draw: F) -> Result<String, AppError>
where
    S: IdentityStore + ?Sized,
    F: FnMut() -> String,
{
    for attempt in 1..=HANDLE_ATTEMPTS {
        let candidate = draw();
        if store.count_where(IdentityFilter::Handle(&candidate)).await? == 0 {
            debug!(attempt, "handle generated");
            return Ok(candidate);
        }
        counter!(HANDLE_COLLISION).increment(1);
        debug!(attempt, %candidate, "handle collision");
    }

    warn!(attempts = HANDLE_ATTEMPTS, "no unique handle found");
    Err(AppError::Internal("unique handle generation failed".to_string()))
}
