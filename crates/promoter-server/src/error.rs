//! API error handling.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use tracing::warn;

/// API error type.
#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Unprocessable(String),
    BadGateway(String),
    Unavailable(String),
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, message) = match self {
            ApiError::NotFound(msg) => (StatusCode::NOT_FOUND, msg),
            ApiError::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg),
            ApiError::Unprocessable(msg) => (StatusCode::UNPROCESSABLE_ENTITY, msg),
            ApiError::BadGateway(msg) => (StatusCode::BAD_GATEWAY, msg),
            ApiError::Unavailable(msg) => (StatusCode::SERVICE_UNAVAILABLE, msg),
            ApiError::Internal(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg),
        };

        if status.is_server_error() {
            warn!(status = %status, error = %message, "Request failed");
        }

        let body = Json(json!({
            "error": message
        }));

        (status, body).into_response()
    }
}

impl From<promoter_core::Error> for ApiError {
    fn from(err: promoter_core::Error) -> Self {
        use promoter_core::Error;

        let message = err.to_string();
        match err.root() {
            Error::NotFound(_) => ApiError::NotFound(message),
            Error::InvalidInput(_) => ApiError::BadRequest(message),
            Error::MalformedConfig { .. } | Error::InvalidRule { .. } => {
                ApiError::Unprocessable(message)
            }
            Error::Collaborator { .. } => ApiError::BadGateway(message),
            Error::Cancelled => ApiError::Unavailable(message),
            _ => ApiError::Internal(message),
        }
    }
}
