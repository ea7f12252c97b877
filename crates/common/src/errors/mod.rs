//! Error types for LexRank
//!
//! Provides a comprehensive error handling system with:
//! - Distinct error types for different failure modes
//! - HTTP status code mapping
//! - Structured error responses
//! - Error codes for client handling
//!
//! An invalid citation is not an error: the validator answers `false`.
//! A PageRank run that exhausts its iteration budget is not an error either,
//! it is reported through `converged = false`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Result type alias using AppError
pub type Result<T> = std::result::Result<T, AppError>;

/// Error codes for machine-readable error identification
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Validation errors (1xxx)
    ValidationError,

    // Resource errors (4xxx)
    DocumentNotFound,

    // Conflict errors (5xxx)
    RunInProgress,

    // Scoring run errors (6xxx)
    EmptyCorpus,
    RunTimeout,

    // Database errors (7xxx)
    DatabaseError,
    ConnectionError,
    PersistenceError,

    // Internal errors (9xxx)
    InternalError,
    ConfigurationError,
    SerializationError,
}

impl ErrorCode {
    /// Get the numeric code for this error
    pub fn as_code(&self) -> u16 {
        match self {
            ErrorCode::ValidationError => 1001,

            ErrorCode::DocumentNotFound => 4002,

            ErrorCode::RunInProgress => 5001,

            ErrorCode::EmptyCorpus => 6001,
            ErrorCode::RunTimeout => 6002,

            ErrorCode::DatabaseError => 7001,
            ErrorCode::ConnectionError => 7002,
            ErrorCode::PersistenceError => 7004,

            ErrorCode::InternalError => 9001,
            ErrorCode::ConfigurationError => 9002,
            ErrorCode::SerializationError => 9003,
        }
    }
}

/// Application error types
#[derive(Error, Debug)]
pub enum AppError {
    // Validation errors
    #[error("Validation failed: {message}")]
    Validation {
        message: String,
        field: Option<String>,
    },

    // Resource errors
    #[error("No authority score recorded for document {id}")]
    DocumentNotFound { id: String },

    // Scoring run errors
    #[error("PageRank calculation already in progress")]
    RunInProgress,

    #[error("No documents available for PageRank calculation")]
    EmptyCorpus,

    #[error("PageRank calculation timed out after {timeout_ms}ms")]
    RunTimeout { timeout_ms: u64 },

    // Database errors
    #[error("Database error: {0}")]
    Database(#[from] sea_orm::DbErr),

    #[error("Database connection error: {message}")]
    DatabaseConnection { message: String },

    #[error("Persistence failed: {message}")]
    Persistence { message: String },

    // Internal errors
    #[error("Internal server error: {message}")]
    Internal { message: String },

    #[error("Configuration error: {message}")]
    Configuration { message: String },

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    // Generic
    #[error("{0}")]
    Other(#[from] anyhow::Error),
}

impl AppError {
    /// Get the error code for this error
    pub fn code(&self) -> ErrorCode {
        match self {
            AppError::Validation { .. } => ErrorCode::ValidationError,
            AppError::DocumentNotFound { .. } => ErrorCode::DocumentNotFound,
            AppError::RunInProgress => ErrorCode::RunInProgress,
            AppError::EmptyCorpus => ErrorCode::EmptyCorpus,
            AppError::RunTimeout { .. } => ErrorCode::RunTimeout,
            AppError::Database(_) => ErrorCode::DatabaseError,
            AppError::DatabaseConnection { .. } => ErrorCode::ConnectionError,
            AppError::Persistence { .. } => ErrorCode::PersistenceError,
            AppError::Internal { .. } => ErrorCode::InternalError,
            AppError::Configuration { .. } => ErrorCode::ConfigurationError,
            AppError::Serialization(_) => ErrorCode::SerializationError,
            AppError::Other(_) => ErrorCode::InternalError,
        }
    }

    /// Get the HTTP status code for this error
    pub fn status_code(&self) -> StatusCode {
        match self {
            // 400 Bad Request
            AppError::Validation { .. } => StatusCode::BAD_REQUEST,

            // 404 Not Found
            AppError::DocumentNotFound { .. } => StatusCode::NOT_FOUND,

            // 409 Conflict
            AppError::RunInProgress => StatusCode::CONFLICT,

            // 422 Unprocessable Entity
            AppError::EmptyCorpus => StatusCode::UNPROCESSABLE_ENTITY,

            // 504 Gateway Timeout
            AppError::RunTimeout { .. } => StatusCode::GATEWAY_TIMEOUT,

            // 500 Internal Server Error
            AppError::Database(_) |
            AppError::Persistence { .. } |
            AppError::Internal { .. } |
            AppError::Configuration { .. } |
            AppError::Serialization(_) |
            AppError::Other(_) => StatusCode::INTERNAL_SERVER_ERROR,

            // 503 Service Unavailable
            AppError::DatabaseConnection { .. } => StatusCode::SERVICE_UNAVAILABLE,
        }
    }

    /// Check if this error should be logged at error level
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }

    /// Check if this error is a client error
    pub fn is_client_error(&self) -> bool {
        self.status_code().is_client_error()
    }

    /// Wrap any store failure as a persistence failure of the current run.
    ///
    /// Errors that are already persistence failures pass through unchanged.
    pub fn into_persistence(self) -> Self {
        match self {
            AppError::Persistence { .. } => self,
            other => AppError::Persistence {
                message: other.to_string(),
            },
        }
    }
}

/// Structured error response for API
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: ErrorDetails,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorDetails {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub field: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.code();
        let message = self.to_string();
        let field = match &self {
            AppError::Validation { field, .. } => field.clone(),
            _ => None,
        };

        // Log based on severity
        if self.is_server_error() {
            tracing::error!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Server error"
            );
        } else if self.is_client_error() {
            tracing::warn!(
                error = %message,
                code = ?code,
                status = status.as_u16(),
                "Client error"
            );
        }

        let body = ErrorResponse {
            error: ErrorDetails {
                code,
                message,
                field,
            },
        };

        (status, Json(body)).into_response()
    }
}

impl From<std::io::Error> for AppError {
    fn from(err: std::io::Error) -> Self {
        AppError::Internal {
            message: err.to_string(),
        }
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::DatabaseConnection {
            message: format!("Migration failed: {}", err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_mapping() {
        let err = AppError::DocumentNotFound { id: "test".into() };
        assert_eq!(err.code(), ErrorCode::DocumentNotFound);
        assert_eq!(err.status_code(), StatusCode::NOT_FOUND);
    }

    #[test]
    fn test_empty_corpus_is_client_visible() {
        let err = AppError::EmptyCorpus;
        assert_eq!(err.status_code(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(err.code().as_code(), 6001);
        assert!(err.is_client_error());
    }

    #[test]
    fn test_run_in_progress_conflict() {
        assert_eq!(AppError::RunInProgress.status_code(), StatusCode::CONFLICT);
    }

    #[test]
    fn test_anyhow_passthrough_is_internal() {
        let cause = anyhow::anyhow!("worker panicked").context("PageRank task failed");
        let err = AppError::from(cause);
        assert_eq!(err.code(), ErrorCode::InternalError);
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(err.to_string(), "PageRank task failed");
    }

    #[test]
    fn test_into_persistence() {
        let err = AppError::Internal { message: "disk full".into() }.into_persistence();
        assert_eq!(err.code(), ErrorCode::PersistenceError);
        assert!(err.to_string().contains("disk full"));
        assert!(err.is_server_error());

        let already = AppError::Persistence { message: "x".into() }.into_persistence();
        assert_eq!(already.to_string(), "Persistence failed: x");
    }
}
