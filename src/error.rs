//! Error types for the catalog server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

/// Main application error type
#[derive(Error, Debug)]
pub enum AppError {
    /// Malformed or missing input
    #[error("{0}")]
    Validation(String),

    /// A referenced entity (the author of a book) does not exist
    #[error("{0}")]
    InvalidReference(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    NotFound(String),

    /// Rejected file upload, reported under `message`
    #[error("{0}")]
    Upload(String),

    /// Store failure in an operation that answers 400 rather than 500
    #[error("{0}")]
    Rejected(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Internal server error: {0}")]
    Internal(String),
}

/// Error response body
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorResponse {
    pub error: String,
}

/// Body used for upload rejections
#[derive(Serialize, utoipa::ToSchema)]
pub struct MessageResponse {
    pub message: String,
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::Validation(_)
            | AppError::InvalidReference(_)
            | AppError::Upload(_)
            | AppError::Rejected(_) => StatusCode::BAD_REQUEST,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Database(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Turn unexpected store failures into a 400 for handlers whose
    /// contract reports every failure as a bad request.
    pub fn reject_store_failure(self) -> Self {
        match self {
            AppError::Database(e) => {
                tracing::error!(error = ?e, "database error");
                AppError::Rejected("Request could not be processed".to_string())
            }
            other => other,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();

        // Every failure passes through here, which makes this the single
        // reporting point for request errors.
        match &self {
            AppError::Database(e) => tracing::error!(error = ?e, "database error"),
            AppError::Internal(msg) => tracing::error!(error = %msg, "internal error"),
            other => tracing::warn!(status = status.as_u16(), error = %other, "request rejected"),
        }

        match self {
            AppError::Upload(message) => (status, Json(MessageResponse { message })).into_response(),
            AppError::Database(_) => (
                status,
                Json(ErrorResponse {
                    error: "Database error".to_string(),
                }),
            )
                .into_response(),
            AppError::Internal(_) => (
                status,
                Json(ErrorResponse {
                    error: "Internal server error".to_string(),
                }),
            )
                .into_response(),
            other => (
                status,
                Json(ErrorResponse {
                    error: other.to_string(),
                }),
            )
                .into_response(),
        }
    }
}

/// Result type alias for application operations
pub type AppResult<T> = Result<T, AppError>;

/// Whether a store error is a unique index violation
pub fn is_unique_violation(err: &sqlx::Error) -> bool {
    match err {
        sqlx::Error::Database(db_err) => db_err.is_unique_violation(),
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::to_bytes;
    use serde_json::Value;

    async fn body_of(err: AppError) -> (StatusCode, Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_conflict_response() {
        let (status, body) = body_of(AppError::Conflict("Book title already exists".into())).await;
        assert_eq!(status, StatusCode::CONFLICT);
        assert_eq!(body["error"], "Book title already exists");
    }

    #[tokio::test]
    async fn test_upload_uses_message_field() {
        let (status, body) = body_of(AppError::Upload("File size should not exceed 24MB!".into())).await;
        assert_eq!(status, StatusCode::BAD_REQUEST);
        assert_eq!(body["message"], "File size should not exceed 24MB!");
        assert!(body.get("error").is_none());
    }

    #[tokio::test]
    async fn test_database_error_hides_details() {
        let (status, body) = body_of(AppError::Database(sqlx::Error::PoolTimedOut)).await;
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(body["error"], "Database error");
    }

    #[test]
    fn test_reject_store_failure() {
        let err = AppError::Database(sqlx::Error::PoolTimedOut).reject_store_failure();
        assert_eq!(err.status(), StatusCode::BAD_REQUEST);

        let err = AppError::NotFound("Book not found".into()).reject_store_failure();
        assert_eq!(err.status(), StatusCode::NOT_FOUND);
    }
}
