use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;
use thiserror::Error;

use crate::store::d1::QueryError;

pub type Result<T> = std::result::Result<T, ReadexError>;

#[derive(Debug, Error)]
pub enum ReadexError {
    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Rate limit exceeded")]
    RateLimitExceeded,

    /// Saving failed for a reason the caller must not see.
    #[error("Failed to share")]
    ShareFailed,

    #[error("Document not found")]
    NotFound,

    #[error("Store unavailable: {0}")]
    StoreUnavailable(String),

    #[error(transparent)]
    Query(#[from] QueryError),

    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ReadexError {
    pub fn status_code(&self) -> StatusCode {
        match self {
            ReadexError::Validation(_) => StatusCode::BAD_REQUEST,
            ReadexError::RateLimitExceeded => StatusCode::TOO_MANY_REQUESTS,
            ReadexError::NotFound => StatusCode::NOT_FOUND,
            ReadexError::ShareFailed
            | ReadexError::StoreUnavailable(_)
            | ReadexError::Query(_)
            | ReadexError::Configuration(_)
            | ReadexError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

impl ErrorResponse {
    pub fn new(error: &str) -> Self {
        Self {
            error: error.to_string(),
        }
    }

    /// Client errors carry their message, server errors a generic one.
    pub fn from_error(err: &ReadexError) -> Self {
        match err {
            ReadexError::Validation(msg) => Self::new(msg),
            ReadexError::RateLimitExceeded => {
                Self::new("Too many shares from this address, try again later")
            }
            ReadexError::NotFound => Self::new("Not found"),
            ReadexError::ShareFailed => Self::new("Failed to share"),
            _ => Self::new("Internal server error"),
        }
    }
}

impl IntoResponse for ReadexError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            tracing::error!(error = %self, "Request failed");
        }
        (status, Json(ErrorResponse::from_error(&self))).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_status_codes() {
        assert_eq!(
            ReadexError::Validation("bad".into()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            ReadexError::RateLimitExceeded.status_code(),
            StatusCode::TOO_MANY_REQUESTS
        );
        assert_eq!(ReadexError::NotFound.status_code(), StatusCode::NOT_FOUND);
        assert_eq!(
            ReadexError::StoreUnavailable("disk".into()).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }

    #[test]
    fn test_server_errors_hide_details() {
        let err = ReadexError::Internal("token abc123 rejected".into());
        let body = serde_json::to_string(&ErrorResponse::from_error(&err)).unwrap();
        assert!(!body.contains("abc123"));
        assert_eq!(body, r#"{"error":"Internal server error"}"#);
    }

    #[test]
    fn test_validation_message_is_returned() {
        let err = ReadexError::Validation("Invalid content".into());
        let resp = ErrorResponse::from_error(&err);
        assert_eq!(resp.error, "Invalid content");
    }
}
