use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;

/// Unified application error type that maps to JSON HTTP responses.
///
/// Error format: `{ "error": { "code": "...", "message": "..." } }`, with an
/// extra `"field"` key for form-level validation errors.
#[derive(Debug)]
pub enum AppError {
    /// 400 Bad Request
    BadRequest(String),
    /// 401 Unauthorized
    Unauthorized(String),
    /// 403 Forbidden
    Forbidden(String),
    /// 404 Not Found
    NotFound(String),
    /// 409 Conflict
    Conflict(String),
    /// 422 Unprocessable Entity, carrying the offending form field
    Validation {
        field: &'static str,
        message: String,
    },
    /// 500 Internal Server Error (wraps any error, logs details, returns generic message)
    Internal(anyhow::Error),
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, field, message) = match self {
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, "BAD_REQUEST", None, msg),
            Self::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, "UNAUTHORIZED", None, msg),
            Self::Forbidden(msg) => (StatusCode::FORBIDDEN, "FORBIDDEN", None, msg),
            Self::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", None, msg),
            Self::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", None, msg),
            Self::Validation { field, message } => (
                StatusCode::UNPROCESSABLE_ENTITY,
                "VALIDATION_ERROR",
                Some(field),
                message,
            ),
            Self::Internal(err) => {
                tracing::error!("Internal server error: {err:#}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "INTERNAL_ERROR",
                    None,
                    "An internal error occurred".to_string(),
                )
            }
        };

        let body = field.map_or_else(
            || json!({ "error": { "code": code, "message": message } }),
            |f| json!({ "error": { "code": code, "message": message, "field": f } }),
        );

        (status, Json(body)).into_response()
    }
}

/// Allow `?` to automatically convert any `anyhow::Error` into `AppError::Internal`.
impl<E> From<E> for AppError
where
    E: Into<anyhow::Error>,
{
    fn from(err: E) -> Self {
        Self::Internal(err.into())
    }
}

/// Map an update failure: a row that vanished mid-update is reported as
/// not-found; any other conflict stays a server error.
pub fn stale_update(err: sea_orm::DbErr, what: &str) -> AppError {
    match err {
        sea_orm::DbErr::RecordNotUpdated => AppError::NotFound(format!("{what} not found")),
        other => AppError::Internal(other.into()),
    }
}
