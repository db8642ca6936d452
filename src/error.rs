use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use thiserror::Error;

use crate::{auth::AuthError, models::ErrorResponse, service::HandlerError};

/// ApiError
///
/// Every failure a route can surface. Authentication and permission failures are produced
/// before the handler runs; handler failures are passed through untouched and only mapped
/// to a status code here.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Unauthorized(#[from] AuthError),
    #[error("permission denied: {0}")]
    Forbidden(String),
    #[error(transparent)]
    Handler(#[from] HandlerError),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Handler(HandlerError::NotFound(_)) => StatusCode::NOT_FOUND,
            ApiError::Handler(HandlerError::InvalidRequest(_)) => StatusCode::BAD_REQUEST,
            ApiError::Handler(HandlerError::Unavailable(_)) => StatusCode::SERVICE_UNAVAILABLE,
            ApiError::Handler(HandlerError::Internal(_)) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn code(&self) -> &'static str {
        match self {
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Handler(HandlerError::NotFound(_)) => "not_found",
            ApiError::Handler(HandlerError::InvalidRequest(_)) => "invalid_request",
            ApiError::Handler(HandlerError::Unavailable(_)) => "unavailable",
            ApiError::Handler(HandlerError::Internal(_)) => "internal",
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        // Internal details stay in the logs.
        let message = match &self {
            ApiError::Handler(HandlerError::Internal(detail)) => {
                tracing::error!(error = %detail, "profile handler failed");
                "internal error".to_string()
            }
            other => other.to_string(),
        };

        let body = ErrorResponse {
            code: self.code().to_string(),
            message,
        };
        (status, Json(body)).into_response()
    }
}
