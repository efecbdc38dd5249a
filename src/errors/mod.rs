//! Error handling module for the admin backend.
//!
//! Provides centralized error types with mapping to HTTP status codes and response envelopes.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};

use crate::runner::RunError;
use crate::store::StoreError;

/// Error codes as constants to avoid stringly-typed errors.
pub mod codes {
    pub const UNAUTHORIZED: &str = "UNAUTHORIZED";
    pub const FORBIDDEN: &str = "FORBIDDEN";
    pub const NOT_FOUND: &str = "NOT_FOUND";
    pub const PARSE_ERROR: &str = "PARSE_ERROR";
    pub const MALFORMED_JSON: &str = "MALFORMED_JSON";
    pub const IO_ERROR: &str = "IO_ERROR";
    pub const BAD_REQUEST: &str = "BAD_REQUEST";
    pub const INTERNAL_ERROR: &str = "INTERNAL_ERROR";
}

/// Application error type.
#[derive(Debug)]
pub enum AppError {
    /// Login required
    Unauthorized(String),
    /// Logged in without the required role
    Forbidden(String),
    /// Artifact, program or directory missing
    NotFound(String),
    /// YAML settings failed to parse
    Parse(String),
    /// Subscriptions file is not valid JSON
    MalformedJson(String),
    /// Filesystem failure
    Io(String),
    /// Bad request
    BadRequest(String),
    /// Internal server error
    Internal(String),
}

impl AppError {
    /// Get the HTTP status code for this error.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Parse(_)
            | AppError::MalformedJson(_)
            | AppError::Io(_)
            | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the error code for this error.
    pub fn error_code(&self) -> &'static str {
        match self {
            AppError::Unauthorized(_) => codes::UNAUTHORIZED,
            AppError::Forbidden(_) => codes::FORBIDDEN,
            AppError::NotFound(_) => codes::NOT_FOUND,
            AppError::Parse(_) => codes::PARSE_ERROR,
            AppError::MalformedJson(_) => codes::MALFORMED_JSON,
            AppError::Io(_) => codes::IO_ERROR,
            AppError::BadRequest(_) => codes::BAD_REQUEST,
            AppError::Internal(_) => codes::INTERNAL_ERROR,
        }
    }

    /// Get the error message.
    pub fn message(&self) -> &str {
        match self {
            AppError::Unauthorized(msg)
            | AppError::Forbidden(msg)
            | AppError::NotFound(msg)
            | AppError::Parse(msg)
            | AppError::MalformedJson(msg)
            | AppError::Io(msg)
            | AppError::BadRequest(msg)
            | AppError::Internal(msg) => msg,
        }
    }
}

impl std::fmt::Display for AppError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}: {}", self.error_code(), self.message())
    }
}

impl std::error::Error for AppError {}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        let message = err.to_string();
        match err {
            StoreError::NotFound { .. } => AppError::NotFound(message),
            StoreError::Parse { .. } => AppError::Parse(message),
            StoreError::MalformedJson { .. } => AppError::MalformedJson(message),
            StoreError::EmptyDocument { .. } => AppError::BadRequest(message),
            StoreError::Io { .. } => AppError::Io(message),
            StoreError::Serialization { .. } => AppError::Internal(message),
        }
    }
}

impl From<RunError> for AppError {
    fn from(err: RunError) -> Self {
        tracing::error!("Push process error: {}", err);
        match err {
            RunError::NotFound { .. } => AppError::NotFound(err.to_string()),
            RunError::Spawn { .. } => AppError::Internal(err.to_string()),
        }
    }
}

/// Error response envelope.
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub success: bool,
    pub error: String,
    pub code: String,
}

impl ErrorResponse {
    pub fn new(error: &AppError) -> Self {
        Self {
            success: false,
            error: error.message().to_string(),
            code: error.error_code().to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        (status, Json(ErrorResponse::new(&self))).into_response()
    }
}
