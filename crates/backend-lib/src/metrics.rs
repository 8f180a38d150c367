// ==============
// crates/backend-lib/src/metrics.rs

//! Central place for metric keys
pub const LOGIN_SUCCEEDED: &str = "auth.login.succeeded";
pub const LOGIN_REJECTED: &str = "auth.login.rejected";
pub const REFRESH_SUCCEEDED: &str = "auth.refresh.succeeded";
pub const REFRESH_REJECTED: &str = "auth.refresh.rejected";
pub const BEARER_REJECTED: &str = "auth.bearer.rejected";
pub const REGISTRATION_COMPLETED: &str = "registration.completed";
pub const REGISTRATION_REJECTED: &str = "registration.rejected";
pub const HANDLE_COLLISION: &str = "registration.handle.collision";
