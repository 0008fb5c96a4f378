//! API Error Handling
//!
//! Unified error types and conversion for API responses.

use axum::{
    Json,
    extract::rejection::{JsonRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};

use crate::service::job_service::JobError;
use crate::service::tool_service::ToolError;

/// API error type
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    Validation(String),
    Unavailable(String),
    InternalError(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::Validation(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::Unavailable(msg) => {
                tracing::error!("Backend unavailable: {}", msg);
                (
                    StatusCode::SERVICE_UNAVAILABLE,
                    "Service temporarily unavailable".to_string(),
                )
            }
            ApiError::InternalError(msg) => {
                tracing::error!("Internal error: {}", msg);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "Internal server error".to_string(),
                )
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}

impl From<JobError> for ApiError {
    fn from(err: JobError) -> Self {
        match err {
            JobError::Validation(e) => ApiError::Validation(e.to_string()),
            JobError::NotFound(id) => ApiError::NotFound(format!("Job {} not found", id)),
            JobError::Store(e) if e.is_unavailable() => ApiError::Unavailable(e.to_string()),
            JobError::Store(e) => ApiError::InternalError(e.to_string()),
            JobError::Queue(e) => ApiError::InternalError(format!("Failed to queue job: {}", e)),
        }
    }
}

impl From<ToolError> for ApiError {
    fn from(err: ToolError) -> Self {
        match err {
            ToolError::Validation(e) => ApiError::Validation(e.to_string()),
            ToolError::NotFound(name) => ApiError::NotFound(format!("Tool '{}' not found", name)),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(rejection.body_text())
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use curator_core::domain::JobId;
    use curator_store::{QueueError, StoreError};

    fn status_of(err: JobError) -> StatusCode {
        ApiError::from(err).into_response().status()
    }

    #[test]
    fn test_job_error_status_codes() {
        let id = JobId::new();

        assert_eq!(status_of(JobError::NotFound(id)), StatusCode::NOT_FOUND);
        assert_eq!(
            status_of(JobError::Store(StoreError::Unavailable(sqlx::Error::PoolTimedOut))),
            StatusCode::SERVICE_UNAVAILABLE
        );
        assert_eq!(
            status_of(JobError::Store(StoreError::DuplicateKey(id))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
        assert_eq!(
            status_of(JobError::Queue(QueueError::Unavailable(sqlx::Error::PoolTimedOut))),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_tool_error_status_codes() {
        let not_found = ApiError::from(ToolError::NotFound("teleport".to_string()));
        assert_eq!(not_found.into_response().status(), StatusCode::NOT_FOUND);
    }
}
