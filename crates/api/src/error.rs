//! Error responses.
//!
//! Every failure leaves a handler as `{"error": <code>, "message": <text>}`
//! with the status from [`AppError::status_code`].

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sana_db::repositories::{CategoryError, TransactionError};
use sana_shared::AppError;
use sea_orm::DbErr;
use serde_json::json;
use tracing::error;

/// Handler error.
#[derive(Debug)]
pub struct ApiError(pub AppError);

/// Result type for handlers.
pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    /// 400 with `message`.
    pub fn validation(message: impl Into<String>) -> Self {
        Self(AppError::Validation(message.into()))
    }

    /// 404 with `message`.
    pub fn not_found(message: impl Into<String>) -> Self {
        Self(AppError::NotFound(message.into()))
    }

    /// 503 with `message`.
    pub fn unavailable(message: impl Into<String>) -> Self {
        Self(AppError::ServiceUnavailable(message.into()))
    }
}

impl From<AppError> for ApiError {
    fn from(err: AppError) -> Self {
        Self(err)
    }
}

impl From<DbErr> for ApiError {
    fn from(err: DbErr) -> Self {
        error!(error = %err, "Database error");
        Self(AppError::Database(err.to_string()))
    }
}

impl From<TransactionError> for ApiError {
    fn from(err: TransactionError) -> Self {
        match err {
            TransactionError::NotFound(_) => Self::not_found("Transaction not found"),
            TransactionError::CategoryNotFound(_) => Self::not_found("Category not found"),
            TransactionError::Database(e) => e.into(),
        }
    }
}

impl From<CategoryError> for ApiError {
    fn from(err: CategoryError) -> Self {
        match err {
            CategoryError::Forbidden(_) => Self(AppError::Forbidden(
                "Cannot delete this category (Access denied or Default)".to_string(),
            )),
            CategoryError::Database(e) => e.into(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.0.status_code())
            .unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = Json(json!({
            "error": self.0.error_code(),
            "message": self.0.public_message(),
        }));
        (status, body).into_response()
    }
}
