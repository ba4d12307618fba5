use actix_web::{http::StatusCode, HttpResponse, ResponseError};
use serde::Serialize;

use crate::quota::QuotaError;

/// JSON error response structure
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: ErrorDetail,
}

#[derive(Serialize)]
pub struct ErrorDetail {
    #[serde(rename = "type")]
    pub error_type: String,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub retry_after: Option<u64>,
}

/// Application errors
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Invalid category: {0}")]
    InvalidCategory(String),

    #[error("Unauthorized: {0}")]
    Unauthorized(String),

    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String, retry_after: u64 },

    #[error("Storage unavailable: {0}")]
    StorageUnavailable(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

impl From<QuotaError> for AppError {
    fn from(err: QuotaError) -> Self {
        match err {
            QuotaError::InvalidCategory(raw) => AppError::InvalidCategory(raw),
            QuotaError::StorageUnavailable(e) => AppError::StorageUnavailable(e.to_string()),
        }
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Validation(_) => StatusCode::BAD_REQUEST,
            AppError::InvalidCategory(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::QuotaExceeded { .. } => StatusCode::TOO_MANY_REQUESTS,
            AppError::StorageUnavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            AppError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        let error_type = match self {
            AppError::NotFound(_) => "NotFound",
            AppError::Validation(_) => "ValidationError",
            AppError::InvalidCategory(_) => "InvalidCategory",
            AppError::Unauthorized(_) => "Unauthorized",
            AppError::QuotaExceeded { .. } => "QuotaExceeded",
            AppError::StorageUnavailable(_) => "StorageUnavailable",
            AppError::Database(_) => "DatabaseError",
            AppError::Internal(_) => "InternalError",
        };

        let retry_after = match self {
            AppError::QuotaExceeded { retry_after, .. } => Some(*retry_after),
            _ => None,
        };

        let response = ErrorResponse {
            error: ErrorDetail {
                error_type: error_type.to_string(),
                message: self.to_string(),
                retry_after,
            },
        };

        let mut builder = HttpResponse::build(self.status_code());
        if let Some(secs) = retry_after {
            builder.insert_header(("Retry-After", secs.to_string()));
        }
        builder.json(response)
    }
}

/// Result type alias for handlers
pub type AppResult<T> = Result<T, AppError>;
