//! Error types for ripple.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use thiserror::Error;

/// Application result type.
pub type AppResult<T> = Result<T, AppError>;

/// Application error type.
#[derive(Debug, Error)]
pub enum AppError {
    // === Auth ===
    #[error("Unauthenticated")]
    Unauthenticated,

    #[error("Unable to determine your role")]
    RoleUndetermined,

    #[error("Forbidden: {0}")]
    Forbidden(String),

    // === Client Errors ===
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Validation failed: {0}")]
    ValidationFailed(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    // === Collaborator Errors ===
    #[error("Upload failed: {0}")]
    UploadError(String),

    #[error("Backend error: {0}")]
    BackendError(String),

    #[error("Classification failed: {0}")]
    ClassificationError(String),

    // === Server Errors ===
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Returns the HTTP status code for this error.
    #[must_use]
    pub const fn status_code(&self) -> StatusCode {
        match self {
            Self::Unauthenticated => StatusCode::UNAUTHORIZED,
            Self::RoleUndetermined | Self::Forbidden(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Conflict(_) => StatusCode::CONFLICT,
            Self::ValidationFailed(_) | Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::UploadError(_) | Self::ClassificationError(_) => StatusCode::BAD_GATEWAY,
            Self::BackendError(_) | Self::Config(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    /// Returns the error code for API responses.
    #[must_use]
    pub const fn error_code(&self) -> &'static str {
        match self {
            Self::Unauthenticated => "UNAUTHENTICATED",
            Self::RoleUndetermined => "ROLE_UNDETERMINED",
            Self::Forbidden(_) => "FORBIDDEN",
            Self::NotFound(_) => "NOT_FOUND",
            Self::Conflict(_) => "CONFLICT",
            Self::ValidationFailed(_) => "VALIDATION_FAILED",
            Self::BadRequest(_) => "BAD_REQUEST",
            Self::UploadError(_) => "UPLOAD_ERROR",
            Self::BackendError(_) => "BACKEND_ERROR",
            Self::ClassificationError(_) => "CLASSIFICATION_ERROR",
            Self::Config(_) => "CONFIG_ERROR",
            Self::Internal(_) => "INTERNAL_ERROR",
        }
    }

    /// Returns whether this error should be logged at error level.
    #[must_use]
    pub fn is_server_error(&self) -> bool {
        self.status_code().is_server_error()
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let code = self.error_code();

        if self.is_server_error() {
            tracing::error!(error = %self, code = code, "Server error occurred");
        } else {
            tracing::debug!(error = %self, code = code, "Client error occurred");
        }

        let body = Json(json!({
            "error": {
                "code": code,
                "message": self.to_string(),
            }
        }));

        (status, body).into_response()
    }
}

// === From implementations ===

impl From<validator::ValidationErrors> for AppError {
    fn from(err: validator::ValidationErrors) -> Self {
        Self::ValidationFailed(err.to_string())
    }
}

impl From<config::ConfigError> for AppError {
    fn from(err: config::ConfigError) -> Self {
        Self::Config(err.to_string())
    }
}

impl From<sea_orm::DbErr> for AppError {
    fn from(err: sea_orm::DbErr) -> Self {
        Self::BackendError(err.to_string())
    }
}

impl From<anyhow::Error> for AppError {
    fn from(err: anyhow::Error) -> Self {
        Self::Internal(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_auth_errors_map_to_distinct_statuses() {
        assert_eq!(
            AppError::Unauthenticated.status_code(),
            StatusCode::UNAUTHORIZED
        );
        assert_eq!(
            AppError::RoleUndetermined.status_code(),
            StatusCode::FORBIDDEN
        );
        assert_eq!(AppError::RoleUndetermined.error_code(), "ROLE_UNDETERMINED");
    }

    #[test]
    fn test_collaborator_failures_are_bad_gateway() {
        assert_eq!(
            AppError::UploadError("rejected".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            AppError::ClassificationError("timeout".into()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert!(AppError::BackendError("boom".into()).is_server_error());
        assert!(!AppError::Conflict("taken".into()).is_server_error());
    }
}
