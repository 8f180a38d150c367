// crates/backend-lib/src/error.rs

//! Central error type + Axum integration.
use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sso_common::MessageResponse;
use thiserror::Error;

use crate::storage::IdentityField;

/// Message returned for every rejected login, whatever the cause.
pub const LOGIN_FAILED_MESSAGE: &str = "Please provide valid login details";

/// Application error types with error codes and context
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Authentication error: {0}")]
    Auth(String),

    #[error("{}", LOGIN_FAILED_MESSAGE)]
    InvalidCredentials,

    #[error("Invalid refresh token: {0}")]
    InvalidRefreshToken(String),

    #[error("{0} already exists")]
    Conflict(IdentityField),

    #[error("Internal error: {0}")]
    Internal(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

impl AppError {
    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidRefreshToken(_) | AppError::Conflict(_) => {
                StatusCode::BAD_REQUEST
            },
            AppError::Auth(_) | AppError::InvalidCredentials => StatusCode::UNAUTHORIZED,
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            },
        }
    }

    /// Get the error code for this error
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Validation(_) => "VAL_001",
            AppError::Auth(_) => "AUTH_001",
            AppError::InvalidCredentials => "AUTH_002",
            AppError::InvalidRefreshToken(_) => "AUTH_003",
            AppError::Conflict(_) => "CONFLICT_001",
            AppError::Internal(_) => "INT_001",
            AppError::Io(_) => "IO_001",
            AppError::Json(_) => "JSON_001",
        }
    }

    /// Get the message that is safe to hand back to the client
    pub fn sanitized_message(&self) -> String {
        match self {
            AppError::Validation(msg)
            | AppError::Auth(msg)
            | AppError::InvalidRefreshToken(msg) => msg.clone(),
            AppError::InvalidCredentials => LOGIN_FAILED_MESSAGE.to_string(),
            AppError::Conflict(field) => format!("{field} already exists"),
            AppError::Internal(_) | AppError::Io(_) | AppError::Json(_) => {
                "An internal server error occurred".to_string()
            },
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();

        if status.is_server_error() {
            tracing::error!(code = self.error_code(), error = %self, "request failed");
        } else {
            tracing::debug!(code = self.error_code(), error = %self, "request rejected");
        }

        let body = MessageResponse {
            message: self.sanitized_message(),
            code: Some(self.error_code().to_string()),
        };

        (status, axum::Json(body)).into_response()
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        tracing::error!(error = %err, "background task did not complete");
        AppError::Internal("background task failed".to_string())
    }
}

impl From<String> for AppError {
    fn from(msg: String) -> Self {
        AppError::Internal(msg)
    }
}

impl From<&str> for AppError {
    fn from(msg: &str) -> Self {
        AppError::Internal(msg.to_string())
    }
}
