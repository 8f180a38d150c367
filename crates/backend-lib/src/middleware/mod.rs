// crates/backend-lib/src/middleware/mod.rs

//! Request gates for the protected API.

pub mod app_identification;
pub mod bearer;

pub use app_identification::{require_app_identification, APP_IDENTIFICATION_HEADER};
pub use bearer::{require_bearer, AuthenticatedHandle};
