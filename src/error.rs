// HTTP API Error Types
use axum::{
    extract::rejection::{BytesRejection, PathRejection},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde_json::{json, Value};

use crate::auth::{AuthError, Rejection};
use crate::database::store::StoreError;
use crate::filter::FilterError;
use crate::services::{ResourceError, UserError};

/// HTTP API error with appropriate status codes and client-facing envelopes
#[derive(Debug)]
pub enum ApiError {
    // 400 Bad Request, `error` carries the message verbatim
    BadRequest(String),

    // 401 Unauthorized, `message` carries the rejection reason
    Unauthorized(String),

    // 404 Not Found
    NotFound,

    // 413 Payload Too Large
    PayloadTooLarge,

    // 500 Internal Server Error
    InternalServerError(String),
}

impl ApiError {
    /// Get HTTP status code
    pub fn status_code(&self) -> StatusCode {
        match self {
            ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound => StatusCode::NOT_FOUND,
            ApiError::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            ApiError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Get the short error code for client handling
    pub fn error_code(&self) -> &str {
        match self {
            ApiError::BadRequest(msg) => msg,
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::NotFound => "not_found",
            ApiError::PayloadTooLarge => "payload_too_large",
            ApiError::InternalServerError(_) => "internal_error",
        }
    }

    /// Convert to JSON response body: `{error, message?}`
    pub fn to_json(&self) -> Value {
        match self {
            ApiError::Unauthorized(reason) if !reason.is_empty() => {
                json!({ "error": self.error_code(), "message": reason })
            }
            ApiError::InternalServerError(msg) => {
                json!({ "error": self.error_code(), "message": msg })
            }
            _ => json!({ "error": self.error_code() }),
        }
    }
}

// Static constructor methods
impl ApiError {
    pub fn bad_request(message: impl Into<String>) -> Self {
        let message = message.into();
        if message.is_empty() {
            return ApiError::BadRequest("bad_request".to_string());
        }
        ApiError::BadRequest(message)
    }

    pub fn unauthorized(reason: impl Into<String>) -> Self {
        ApiError::Unauthorized(reason.into())
    }

    pub fn not_found() -> Self {
        ApiError::NotFound
    }

    pub fn internal_server_error(message: impl Into<String>) -> Self {
        ApiError::InternalServerError(message.into())
    }
}

// Convert other error types to ApiError
impl From<StoreError> for ApiError {
    fn from(err: StoreError) -> Self {
        // Storage messages are surfaced verbatim; the provider is trusted not to leak internals
        tracing::debug!("storage error: {}", err);
        ApiError::bad_request(err.to_string())
    }
}

impl From<FilterError> for ApiError {
    fn from(err: FilterError) -> Self {
        ApiError::bad_request(err.to_string())
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        tracing::debug!("path rejected: {}", rejection.body_text());
        ApiError::bad_request("invalid_path")
    }
}

impl From<BytesRejection> for ApiError {
    fn from(rejection: BytesRejection) -> Self {
        tracing::debug!("body rejected: {}", rejection.body_text());
        if rejection.status() == StatusCode::PAYLOAD_TOO_LARGE {
            return ApiError::PayloadTooLarge;
        }
        ApiError::bad_request("invalid_body")
    }
}

impl From<AuthError> for ApiError {
    fn from(err: AuthError) -> Self {
        match err {
            AuthError::InvalidToken(_) | AuthError::MissingToken => {
                ApiError::unauthorized("invalid_token")
            }
            AuthError::Provider(msg) => ApiError::bad_request(msg),
            AuthError::Transport(e) => {
                tracing::error!("auth provider unreachable: {}", e);
                ApiError::internal_server_error(e.to_string())
            }
        }
    }
}

impl From<Rejection> for ApiError {
    fn from(rejection: Rejection) -> Self {
        ApiError::unauthorized(rejection.reason())
    }
}

impl From<ResourceError> for ApiError {
    fn from(err: ResourceError) -> Self {
        match err {
            ResourceError::Store(e) => e.into(),
            other => ApiError::bad_request(other.to_string()),
        }
    }
}

impl From<UserError> for ApiError {
    fn from(err: UserError) -> Self {
        match err {
            UserError::Validation(code) => ApiError::bad_request(code),
            UserError::Auth(e) => e.into(),
            UserError::Store(e) => e.into(),
        }
    }
}

// Standard error trait implementations
impl std::fmt::Display for ApiError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ApiError::Unauthorized(reason) => write!(f, "unauthorized: {}", reason),
            ApiError::InternalServerError(msg) => write!(f, "internal_error: {}", msg),
            other => write!(f, "{}", other.error_code()),
        }
    }
}

impl std::error::Error for ApiError {}

// Automatic HTTP response conversion for Axum
impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status_code(), Json(self.to_json())).into_response()
    }
}

pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bad_request_carries_message_as_error() {
        let err = ApiError::bad_request("duplicate key value violates unique constraint");
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        assert_eq!(
            err.to_json(),
            json!({ "error": "duplicate key value violates unique constraint" })
        );
    }

    #[test]
    fn empty_bad_request_falls_back_to_code() {
        assert_eq!(ApiError::bad_request("").to_json(), json!({ "error": "bad_request" }));
    }

    #[test]
    fn unauthorized_includes_reason() {
        let err = ApiError::unauthorized("not_admin");
        assert_eq!(err.status_code(), StatusCode::UNAUTHORIZED);
        assert_eq!(err.to_json(), json!({ "error": "unauthorized", "message": "not_admin" }));
    }

    #[test]
    fn payload_too_large_envelope() {
        let err = ApiError::PayloadTooLarge;
        assert_eq!(err.status_code(), StatusCode::PAYLOAD_TOO_LARGE);
        assert_eq!(err.to_json(), json!({ "error": "payload_too_large" }));
    }

    #[test]
    fn internal_error_envelope() {
        let err = ApiError::internal_server_error("boom");
        assert_eq!(err.to_json(), json!({ "error": "internal_error", "message": "boom" }));
    }
}
