//! HTTP Error Handling
//!
//! 应用层错误到 HTTP 状态码的映射；错误体统一为 `{"error": message}`

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::application::ApplicationError;

/// 统一错误响应格式
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

/// API 错误
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(String),
    ServiceUnavailable(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => {
                tracing::warn!(error = %msg, "Resource not found");
                (StatusCode::NOT_FOUND, msg)
            }
            ApiError::BadRequest(msg) => {
                tracing::warn!(error = %msg, "Bad request");
                (StatusCode::BAD_REQUEST, msg)
            }
            ApiError::Internal(msg) => {
                tracing::error!(error = %msg, "Internal server error");
                (StatusCode::INTERNAL_SERVER_ERROR, msg)
            }
            ApiError::ServiceUnavailable(msg) => {
                tracing::error!(error = %msg, "Service unavailable");
                (StatusCode::SERVICE_UNAVAILABLE, msg)
            }
        };

        (status, Json(ErrorResponse { error: message })).into_response()
    }
}

impl From<ApplicationError> for ApiError {
    fn from(e: ApplicationError) -> Self {
        match e {
            ApplicationError::NotFound { .. } => ApiError::NotFound(e.to_string()),
            ApplicationError::ValidationError(msg) => ApiError::BadRequest(msg),
            ApplicationError::OutOfRange { .. } => ApiError::BadRequest(e.to_string()),
            ApplicationError::ExternalServiceError(msg) => ApiError::ServiceUnavailable(msg),
            ApplicationError::RepositoryError(msg)
            | ApplicationError::IoError(msg)
            | ApplicationError::InternalError(msg) => ApiError::Internal(msg),
        }
    }
}
