// ============================
// crates/backend-lib/src/lib.rs
// ============================
//! Core functionality for the SSO token service.

pub mod auth;
pub mod config;
pub mod error;
pub mod handlers;
pub mod metrics;
pub mod middleware;
pub mod registration;
pub mod router;
pub mod storage;
pub mod validation;

use std::sync::Arc;

use crate::auth::{SecretHasher, TokenService};
use crate::config::Settings;
use crate::error::AppError;
use crate::registration::{CredentialGenerator, RegistrationPipeline};

pub use router::create_router;

/// Application state shared across all handlers
pub struct AppState<S> {
    /// Identity storage backend
    pub store: S,
    /// Token signing and verification
    pub tokens: Arc<TokenService>,
    /// Password hashing
    pub hasher: Arc<SecretHasher>,
    /// Handle and password generation
    pub generator: Arc<CredentialGenerator>,
    /// Settings
    pub settings: Arc<Settings>,
}

impl<S> AppState<S> {
    /// Create a new application state
    pub fn new(store: S, settings: Settings) -> Result<Self, AppError> {
        Ok(Self {
            store,
            tokens: Arc::new(TokenService::from_settings(&settings)),
            hasher: Arc::new(SecretHasher::new(settings.password_hash_log_n)?),
            generator: Arc::new(CredentialGenerator::from_settings(&settings)?),
            settings: Arc::new(settings),
        })
    }
}

impl<S: Clone> AppState<S> {
    /// Registration pipeline over this state's store
    pub fn registration(&self) -> RegistrationPipeline<S> {
        RegistrationPipeline::new(
            self.store.clone(),
            Arc::clone(&self.generator),
            Arc::clone(&self.hasher),
        )
    }
}
