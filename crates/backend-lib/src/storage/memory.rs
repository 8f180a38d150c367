//! In-memory identity store.
use std::{collections::HashMap, sync::Arc};

use async_trait::async_trait;
use tokio::sync::RwLock;

use super::{IdentityFilter, IdentityRecord, IdentityStore};
use crate::error::AppError;

/// Identity store held entirely in memory, keyed by handle
#[derive(Clone, Default)]
pub struct MemoryStorage {
    identities: Arc<RwLock<HashMap<String, IdentityRecord>>>,
}

impl MemoryStorage {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored identities
    pub async fn len(&self) -> usize {
        self.identities.read().await.len()
    }

    /// Whether no identity has been stored yet
    pub async fn is_empty(&self) -> bool {
        self.identities.read().await.is_empty()
    }
}

#[async_trait]
impl IdentityStore for MemoryStorage {
    async fn find_by_handle(&self, handle: &str) -> Result<Option<IdentityRecord>, AppError> {
        let identities = self.identities.read().await;
        Ok(identities.get(handle).cloned())
    }

    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, AppError> {
        let identities = self.identities.read().await;
        Ok(identities.values().find(|record| record.email == email).cloned())
    }

    async fn count_where(&self, filter: IdentityFilter<'_>) -> Result<u64, AppError> {
        let identities = self.identities.read().await;
        Ok(identities.values().filter(|record| filter.matches(record)).count() as u64)
    }

    async fn create(&self, record: IdentityRecord) -> Result<(), AppError> {
        let mut identities = self.identities.write().await;

        if let Some(field) = identities
            .values()
            .find_map(|existing| record.conflicts_with(existing))
        {
            return Err(AppError::Conflict(field));
        }

        identities.insert(record.handle.clone(), record);
        Ok(())
    }
}
