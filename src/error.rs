use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use tracing::{error, warn};

use crate::recurrence::ClassScheduleError;
use crate::schedule::ScheduleError;
use crate::store::StoreError;

#[derive(Debug)]
pub enum ApiError {
    Unauthorized(String),
    BadRequest(String),
    NotFound(String),
    Unprocessable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Unauthorized(msg) => (StatusCode::UNAUTHORIZED, msg).into_response(),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg).into_response(),
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg).into_response(),
            ApiError::Unprocessable(msg) => {
                (StatusCode::UNPROCESSABLE_ENTITY, msg).into_response()
            }
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg).into_response(),
        }
    }
}

impl From<ScheduleError> for ApiError {
    fn from(value: ScheduleError) -> Self {
        ApiError::BadRequest(value.to_string())
    }
}

/// Stored class data that cannot be expanded. The request itself was fine.
impl From<ClassScheduleError> for ApiError {
    fn from(value: ClassScheduleError) -> Self {
        warn!(class_id = %value.class_id, error = %value.source, "stored class has an invalid schedule");
        ApiError::Unprocessable(value.to_string())
    }
}

impl From<StoreError> for ApiError {
    fn from(value: StoreError) -> Self {
        match value {
            StoreError::NotFound { .. } => ApiError::NotFound(value.to_string()),
            StoreError::Http(err) => {
                error!("Document store error: {err}");
                ApiError::Internal("Failed to fetch classes".into())
            }
            StoreError::InvalidBaseUrl(_) => {
                error!("{value}");
                ApiError::Internal("Document store is misconfigured".into())
            }
        }
    }
}
