//! Error-to-HTTP mapping.

use axum::extract::rejection::JsonRejection;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use tracing::error;

/// Body sent for every 5xx; the underlying detail only goes to the log.
pub const INTERNAL_ERROR_MESSAGE: &str = "internal server error";

#[derive(Debug)]
pub enum ApiError {
    NotFound(String),
    BadRequest(String),
    Internal(wellatlas_core::Error),
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl From<wellatlas_core::Error> for ApiError {
    fn from(err: wellatlas_core::Error) -> Self {
        match err {
            wellatlas_core::Error::NotFound(msg) => ApiError::NotFound(msg),
            wellatlas_core::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other),
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::BadRequest(rejection.body_text())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = match self {
            ApiError::NotFound(msg) | ApiError::BadRequest(msg) => msg,
            ApiError::Internal(err) => {
                error!(
                    subsystem = "api",
                    component = "error",
                    error = %err,
                    "Request failed"
                );
                INTERNAL_ERROR_MESSAGE.to_string()
            }
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
