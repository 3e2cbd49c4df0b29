use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

use crate::hiring::StageError;

/// Application-level error type.
/// Implements `IntoResponse` so Axum handlers can return `Result<T, AppError>`.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error(transparent)]
    Stage(#[from] StageError),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("S3 error: {0}")]
    S3(String),
}

impl AppError {
    fn parts(&self) -> (StatusCode, &'static str, String) {
        match self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "NOT_FOUND", msg.clone()),
            AppError::Validation(msg) => (StatusCode::BAD_REQUEST, "VALIDATION_ERROR", msg.clone()),
            AppError::Conflict(msg) => (StatusCode::CONFLICT, "CONFLICT", msg.clone()),
            AppError::Stage(e) => {
                let (status, code) = match e {
                    StageError::NotFound(_) => (StatusCode::NOT_FOUND, "STAGE_NOT_FOUND"),
                    StageError::NoCurrentStage => (StatusCode::BAD_REQUEST, "NO_CURRENT_STAGE"),
                    StageError::InvalidStage(_) => (StatusCode::BAD_REQUEST, "INVALID_STAGE"),
                    StageError::OutcomeNotAllowed { .. } => {
                        (StatusCode::BAD_REQUEST, "OUTCOME_NOT_ALLOWED")
                    }
                    StageError::StageNotCurrent { .. } => (StatusCode::CONFLICT, "STAGE_NOT_CURRENT"),
                    StageError::InconsistentHistory(_) => {
                        (StatusCode::BAD_REQUEST, "INCONSISTENT_HISTORY")
                    }
                };
                (status, code, e.to_string())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "DATABASE_ERROR",
                    "A database error occurred".to_string(),
                )
            }
            AppError::Serialization(e) => {
                tracing::error!("Serialization error: {e}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "SERIALIZATION_ERROR",
                    "A stored record could not be read".to_string(),
                )
            }
            AppError::S3(msg) => {
                tracing::error!("S3 error: {msg}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "S3_ERROR",
                    "A storage error occurred".to_string(),
                )
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, code, message) = self.parts();

        let body = Json(json!({
            "error": {
                "code": code,
                "message": message
            }
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status_of(err: AppError) -> StatusCode {
        err.into_response().status()
    }

    #[test]
    fn test_stage_errors_map_to_client_statuses() {
        assert_eq!(
            status_of(StageError::NotFound("decision".into()).into()),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            status_of(StageError::NoCurrentStage.into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(StageError::InvalidStage("onsite".into()).into()),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            status_of(
                StageError::StageNotCurrent {
                    stage_id: "cv_review".into(),
                    current: "interview".into()
                }
                .into()
            ),
            StatusCode::CONFLICT
        );
    }

    #[test]
    fn test_internal_errors_hide_details() {
        let (status, code, message) =
            AppError::S3("bucket credentials rejected".into()).parts();
        assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
        assert_eq!(code, "S3_ERROR");
        assert!(!message.contains("credentials"));
    }
}
