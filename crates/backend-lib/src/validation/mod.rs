// ============================
// crates/backend-lib/src/validation/mod.rs
// ============================
//! Request validation module.

use chrono::NaiveDate;
use sso_common::{LoginRequest, RegistrationInput};
use thiserror::Error;

use crate::error::AppError;

/// Accepted `dateOfBirth` format
pub const BIRTH_DATE_FORMAT: &str = "%Y-%m-%d";

/// Possible validation errors
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ValidationError {
    #[error("provide either an id or an email")]
    MissingLoginIdentifier,

    #[error("provide refresh token in body")]
    MissingRefreshToken,

    #[error("national-ID must be a positive number")]
    InvalidNationalId,

    #[error("email must not be empty")]
    MissingEmail,

    #[error("phone number must not be empty")]
    MissingPhone,

    #[error("date of birth must use the format YYYY-MM-DD")]
    InvalidBirthDate,
}

/// Result type for validation operations
pub type ValidationResult<T> = Result<T, ValidationError>;

impl From<ValidationError> for AppError {
    fn from(err: ValidationError) -> Self {
        AppError::Validation(err.to_string())
    }
}

/// Identifier a login request resolves through
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginIdentifier<'a> {
    Handle(&'a str),
    Email(&'a str),
}

fn non_blank(value: &str) -> Option<&str> {
    let trimmed = value.trim();
    (!trimmed.is_empty()).then_some(trimmed)
}

/// Pick the identifier of a login request; the handle wins when both are given
pub fn validate_login(request: &LoginRequest) -> ValidationResult<LoginIdentifier<'_>> {
    if let Some(handle) = non_blank(&request.id) {
        return Ok(LoginIdentifier::Handle(handle));
    }
    if let Some(email) = non_blank(&request.email) {
        return Ok(LoginIdentifier::Email(email));
    }
    Err(ValidationError::MissingLoginIdentifier)
}

/// Validate a refresh token body field
pub fn validate_refresh_token(token: &str) -> ValidationResult<&str> {
    non_blank(token).ok_or(ValidationError::MissingRefreshToken)
}

/// Validate the mandatory registration fields
pub fn validate_registration(input: &RegistrationInput) -> ValidationResult<()> {
    if input.national_id < 1 {
        return Err(ValidationError::InvalidNationalId);
    }
    if non_blank(&input.email).is_none() {
        return Err(ValidationError::MissingEmail);
    }
    if non_blank(&input.phone_number).is_none() {
        return Err(ValidationError::MissingPhone);
    }
    Ok(())
}

/// Parse an optional `YYYY-MM-DD` birth date; blank means absent
pub fn parse_birth_date(value: Option<&str>) -> ValidationResult<Option<NaiveDate>> {
    match value.and_then(non_blank) {
        None => Ok(None),
        Some(raw) => NaiveDate::parse_from_str(raw, BIRTH_DATE_FORMAT)
            .map(Some)
            .map_err(|_| ValidationError::InvalidBirthDate),
    }
}
