// ============================
// crates/backend-lib/src/storage.rs
// ============================
//! Identity persistence: the gateway trait plus in-memory and flat-file
//! backends.
use std::fmt;

use async_trait::async_trait;
use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use sso_common::IdentityProfile;

use crate::error::AppError;

mod flat_file;
mod memory;

pub use flat_file::FlatFileStorage;
pub use memory::MemoryStorage;

/// A unique field of an identity
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IdentityField {
    Handle,
    NationalId,
    Email,
    Phone,
}

impl fmt::Display for IdentityField {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            IdentityField::Handle => "handle",
            IdentityField::NationalId => "national-ID",
            IdentityField::Email => "email",
            IdentityField::Phone => "phone",
        };
        f.write_str(name)
    }
}

/// Equality filter on one unique field, used by [`IdentityStore::count_where`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IdentityFilter<'a> {
    Handle(&'a str),
    NationalId(i64),
    Email(&'a str),
    Phone(&'a str),
}

impl IdentityFilter<'_> {
    /// Field this filter tests
    pub fn field(&self) -> IdentityField {
        match self {
            IdentityFilter::Handle(_) => IdentityField::Handle,
            IdentityFilter::NationalId(_) => IdentityField::NationalId,
            IdentityFilter::Email(_) => IdentityField::Email,
            IdentityFilter::Phone(_) => IdentityField::Phone,
        }
    }

    /// Whether `record` carries the filtered value
    pub fn matches(&self, record: &IdentityRecord) -> bool {
        match *self {
            IdentityFilter::Handle(handle) => record.handle == handle,
            IdentityFilter::NationalId(id) => record.national_id == id,
            IdentityFilter::Email(email) => record.email == email,
            IdentityFilter::Phone(phone) => record.phone == phone,
        }
    }
}

/// Persisted identity
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct IdentityRecord {
    pub handle: String,
    pub national_id: i64,
    pub email: String,
    pub phone: String,
    /// scrypt PHC string
    pub password_hash: String,
    pub name: String,
    pub gender: String,
    pub address: String,
    pub date_of_birth: Option<NaiveDate>,
    pub citizenship: String,
    pub place_of_birth: String,
    pub created_at: DateTime<Utc>,
}

impl IdentityRecord {
    /// First unique field of `self` that `other` already holds, checked in
    /// handle, national-ID, email, phone order
    pub fn conflicts_with(&self, other: &IdentityRecord) -> Option<IdentityField> {
        [
            IdentityFilter::Handle(&self.handle),
            IdentityFilter::NationalId(self.national_id),
            IdentityFilter::Email(&self.email),
            IdentityFilter::Phone(&self.phone),
        ]
        .into_iter()
        .find(|filter| filter.matches(other))
        .map(|filter| filter.field())
    }

    /// Public profile of this identity
    pub fn profile(&self) -> IdentityProfile {
        IdentityProfile {
            id: self.handle.clone(),
            name: self.name.clone(),
            gender: self.gender.clone(),
            email: self.email.clone(),
            national_id: self.national_id,
            address: self.address.clone(),
            phone_number: self.phone.clone(),
            date_of_birth: self.date_of_birth,
            citizenship: self.citizenship.clone(),
            place_of_birth: self.place_of_birth.clone(),
        }
    }
}

/// Trait for identity storage backends
#[async_trait]
pub trait IdentityStore: Send + Sync {
    /// Look up an identity by its handle
    async fn find_by_handle(&self, handle: &str) -> Result<Option<IdentityRecord>, AppError>;

    /// Look up an identity by its email
    async fn find_by_email(&self, email: &str) -> Result<Option<IdentityRecord>, AppError>;

    /// Count identities matching `filter`
    async fn count_where(&self, filter: IdentityFilter<'_>) -> Result<u64, AppError>;

    /// Persist a new identity.
    ///
    /// Fails with [`AppError::Conflict`] when any unique field is already
    /// taken; the check and the insert are atomic.
    async fn create(&self, record: IdentityRecord) -> Result<(), AppError>;
}

#[cfg(test)]
pub(crate) fn sample_record(handle: &str, national_id: i64, email: &str, phone: &str) -> IdentityRecord {
    IdentityRecord {
        handle: handle.to_string(),
        national_id,
        email: email.to_string(),
        phone: phone.to_string(),
        password_hash: String::new(),
        name: "Test User".to_string(),
        gender: String::new(),
        address: String::new(),
        date_of_birth: None,
        citizenship: String::new(),
        place_of_birth: String::new(),
        created_at: Utc::now(),
    }
}
