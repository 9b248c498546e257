use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::json;

use crate::store::StoreError;

/// Application-level error type for HTTP handlers.
///
/// Implements [`IntoResponse`] to produce consistent JSON error bodies; the
/// `retryable` flag tells clients whether repeating the same logical request
/// is safe and useful.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// No valid learner identity on an operation that requires one.
    #[error("authentication required")]
    AuthRequired,

    /// Lesson completion or progress view without a prior enrollment.
    #[error("not enrolled in this course")]
    NotEnrolled,

    /// Enrollment insert hit the uniqueness constraint and the existing
    /// record could not be recovered. The common already-enrolled path is
    /// answered with the existing enrollment instead of this error.
    #[error("already enrolled in this course")]
    DuplicateEnrollment,

    /// Progress computation over a course whose live lesson set is empty.
    #[error("course has no lessons")]
    InvalidLessonSet,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("validation error: {0}")]
    Validation(String),

    /// Transient Record Store failure; the request can be retried as-is.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// Speech provider failure or missing provider configuration.
    #[error("speech generation failed: {0}")]
    SpeechUpstream(String),
}

impl From<validator::ValidationErrors> for ApiError {
    fn from(errors: validator::ValidationErrors) -> Self {
        ApiError::Validation(errors.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code, retryable) = match &self {
            ApiError::AuthRequired => (StatusCode::UNAUTHORIZED, "AUTH_REQUIRED", false),
            ApiError::NotEnrolled => (StatusCode::FORBIDDEN, "NOT_ENROLLED", false),
            ApiError::DuplicateEnrollment => {
                (StatusCode::CONFLICT, "DUPLICATE_ENROLLMENT", false)
            }
            ApiError::InvalidLessonSet => {
                (StatusCode::UNPROCESSABLE_ENTITY, "INVALID_LESSON_SET", false)
            }
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NOT_FOUND", false),
            ApiError::Validation(_) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", false),
            ApiError::Store(store) => match store {
                StoreError::NotFound { .. } => (StatusCode::NOT_FOUND, "NOT_FOUND", false),
                StoreError::Duplicate { .. } => (StatusCode::CONFLICT, "CONFLICT", false),
                StoreError::Unavailable(_) => {
                    tracing::error!("Record store unavailable: {}", store);
                    (StatusCode::SERVICE_UNAVAILABLE, "STORE_UNAVAILABLE", true)
                }
            },
            ApiError::SpeechUpstream(message) => {
                tracing::error!("Speech generation failed: {}", message);
                (StatusCode::INTERNAL_SERVER_ERROR, "SPEECH_FAILED", false)
            }
        };

        let body = json!({
            "error": self.to_string(),
            "code": code,
            "retryable": retryable,
        });

        (status, Json(body)).into_response()
    }
}
