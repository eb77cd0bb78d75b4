use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use sea_orm::{DbErr, SqlErr};
use serde::Serialize;

use crate::mailer::MailError;
use crate::payments::gateway::GatewayError;
use crate::payments::signature::SignatureError;

/// Structured error response returned by all endpoints on failure.
#[derive(Serialize, utoipa::ToSchema)]
pub struct ErrorBody {
    /// Always `false`.
    #[schema(example = false)]
    pub success: bool,
    /// Machine-readable error code. One of: `VALIDATION_ERROR`, `INVALID_STATE`,
    /// `INVALID_SIGNATURE`, `TOKEN_MISSING`, `TOKEN_INVALID`, `INVALID_CREDENTIALS`,
    /// `PERMISSION_DENIED`, `NOT_FOUND`, `CONFLICT`, `EXTERNAL_SERVICE_ERROR`,
    /// `INTERNAL_ERROR`.
    #[schema(example = "VALIDATION_ERROR")]
    pub code: &'static str,
    /// Human-readable error description.
    #[schema(example = "Password must be 8-128 characters")]
    pub error: String,
    /// Field-level problems, when the request failed validation on several fields.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub details: Option<Vec<String>>,
}

/// Application-level error type.
#[derive(Debug)]
pub enum AppError {
    Validation(String),
    /// Several field-level validation failures reported together.
    ValidationDetails(String, Vec<String>),
    /// The target exists but its current state forbids the operation.
    InvalidState(String),
    InvalidSignature,
    TokenMissing,
    TokenInvalid,
    InvalidCredentials,
    PermissionDenied,
    NotFound(String),
    Conflict(String),
    /// An upstream provider (payment processor) failed. The detail is logged only.
    ExternalService(String),
    Internal(String),
}

fn body(code: &'static str, error: impl Into<String>) -> ErrorBody {
    ErrorBody {
        success: false,
        code,
        error: error.into(),
        details: None,
    }
}

impl AppError {
    fn status_and_body(self) -> (StatusCode, ErrorBody) {
        match self {
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, body("VALIDATION_ERROR", msg)),
            AppError::ValidationDetails(msg, details) => (
                StatusCode::BAD_REQUEST,
                ErrorBody {
                    details: Some(details),
                    ..body("VALIDATION_ERROR", msg)
                },
            ),
            AppError::InvalidState(msg) => (StatusCode::BAD_REQUEST, body("INVALID_STATE", msg)),
            AppError::InvalidSignature => (
                StatusCode::BAD_REQUEST,
                body("INVALID_SIGNATURE", "Webhook signature verification failed"),
            ),
            AppError::TokenMissing => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_MISSING", "Authentication required"),
            ),
            AppError::TokenInvalid => (
                StatusCode::UNAUTHORIZED,
                body("TOKEN_INVALID", "Invalid or expired token"),
            ),
            AppError::InvalidCredentials => (
                StatusCode::UNAUTHORIZED,
                body("INVALID_CREDENTIALS", "Invalid credentials"),
            ),
            AppError::PermissionDenied => (
                StatusCode::FORBIDDEN,
                body("PERMISSION_DENIED", "Insufficient permissions"),
            ),
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, body("NOT_FOUND", msg)),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, body("CONFLICT", msg)),
            AppError::ExternalService(detail) => {
                tracing::error!("External service error: {}", detail);
                (
                    StatusCode::BAD_GATEWAY,
                    body(
                        "EXTERNAL_SERVICE_ERROR",
                        "The payment provider could not process the request",
                    ),
                )
            }
            AppError::Internal(detail) => {
                tracing::error!("Internal error: {}", detail);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    body("INTERNAL_ERROR", "An unexpected error occurred"),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, body) = self.status_and_body();
        (status, Json(body)).into_response()
    }
}

impl From<DbErr> for AppError {
    fn from(err: DbErr) -> Self {
        AppError::Internal(err.to_string())
    }
}

/// Maps a foreign key violation on delete to `Conflict(message)`.
///
/// Rows can gain references between the pre-delete count and the delete itself.
pub fn still_referenced(err: DbErr, message: &str) -> AppError {
    match err.sql_err() {
        Some(SqlErr::ForeignKeyConstraintViolation(_)) => AppError::Conflict(message.into()),
        _ => AppError::from(err),
    }
}

impl From<GatewayError> for AppError {
    fn from(err: GatewayError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<MailError> for AppError {
    fn from(err: MailError) -> Self {
        AppError::ExternalService(err.to_string())
    }
}

impl From<SignatureError> for AppError {
    fn from(err: SignatureError) -> Self {
        tracing::warn!("Rejected webhook: {}", err);
        AppError::InvalidSignature
    }
}
