//! Custom error types for the API service

use std::sync::atomic::{AtomicBool, Ordering};

use axum::{
    Json,
    extract::multipart::MultipartError,
    extract::rejection::{JsonRejection, PathRejection, QueryRejection},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use common::error::DatabaseError;
use media::MediaError;
use serde_json::json;
use thiserror::Error;
use tracing::error;

static EXPOSE_INTERNAL_ERRORS: AtomicBool = AtomicBool::new(false);

/// Whether 500 responses carry the underlying error message
///
/// Off by default; `main` turns it on outside production.
pub fn set_expose_internal_errors(expose: bool) {
    EXPOSE_INTERNAL_ERRORS.store(expose, Ordering::Relaxed);
}

fn expose_internal_errors() -> bool {
    EXPOSE_INTERNAL_ERRORS.load(Ordering::Relaxed)
}

/// Custom error type for the API service
#[derive(Error, Debug)]
pub enum ApiError {
    /// Missing or invalid input
    #[error("{0}")]
    Validation(String),

    /// Missing, invalid or expired token, or a wrong password
    #[error("{0}")]
    Auth(String),

    /// Resource absent or not owned by the caller
    #[error("{0}")]
    NotFound(String),

    /// Upload size or count exceeded
    #[error("{0}")]
    UploadLimit(String),

    /// Rate limit exceeded for the caller's address
    #[error("Too many requests, please try again later")]
    TooManyRequests,

    /// Unexpected failure
    #[error("Internal server error: {0}")]
    Internal(String),

    /// Database error
    #[error("Database error: {0}")]
    Database(#[from] DatabaseError),
}

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn internal(msg: impl Into<String>) -> Self {
        ApiError::Internal(msg.into())
    }

    pub fn unauthorized() -> Self {
        ApiError::Auth("Authentication required".to_string())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) | ApiError::UploadLimit(_) => StatusCode::BAD_REQUEST,
            ApiError::Auth(_) => StatusCode::UNAUTHORIZED,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::TooManyRequests => StatusCode::TOO_MANY_REQUESTS,
            ApiError::Internal(_) | ApiError::Database(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Internal(_) | ApiError::Database(_) => {
                if expose_internal_errors() {
                    self.to_string()
                } else {
                    "Internal server error".to_string()
                }
            }
            other => other.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            error!("Request failed: {}", self);
        }

        let body = Json(json!({
            "success": false,
            "error": self.public_message(),
        }));

        (status, body).into_response()
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        ApiError::Database(DatabaseError::Query(err))
    }
}

impl From<MediaError> for ApiError {
    fn from(err: MediaError) -> Self {
        if err.is_limit() {
            ApiError::UploadLimit(err.to_string())
        } else if err.is_client_error() {
            ApiError::Validation(err.to_string())
        } else {
            ApiError::Internal(err.to_string())
        }
    }
}

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError::Validation(format!("Invalid request body: {}", rejection.body_text()))
    }
}

impl From<PathRejection> for ApiError {
    fn from(rejection: PathRejection) -> Self {
        // A malformed id can never name an existing resource
        ApiError::NotFound(format!("Resource not found: {}", rejection.body_text()))
    }
}

impl From<QueryRejection> for ApiError {
    fn from(rejection: QueryRejection) -> Self {
        ApiError::Validation(format!("Invalid query string: {}", rejection.body_text()))
    }
}

impl From<MultipartError> for ApiError {
    fn from(err: MultipartError) -> Self {
        if err.status() == StatusCode::PAYLOAD_TOO_LARGE {
            ApiError::UploadLimit(format!("Upload too large: {}", err.body_text()))
        } else {
            ApiError::Validation(format!("Invalid upload: {}", err.body_text()))
        }
    }
}

/// Type alias for API results
pub type ApiResult<T> = Result<T, ApiError>;

#[cfg(test)]
mod tests {
    use super::*;
    use http_body_util::BodyExt;
    use serial_test::serial;

    async fn body_json(err: ApiError) -> (StatusCode, serde_json::Value) {
        let response = err.into_response();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, serde_json::from_slice(&bytes).unwrap())
    }

    #[tokio::test]
    async fn test_status_mapping() {
        let cases = [
            (ApiError::validation("bad"), StatusCode::BAD_REQUEST),
            (ApiError::unauthorized(), StatusCode::UNAUTHORIZED),
            (ApiError::not_found("gone"), StatusCode::NOT_FOUND),
            (ApiError::UploadLimit("big".into()), StatusCode::BAD_REQUEST),
            (ApiError::TooManyRequests, StatusCode::TOO_MANY_REQUESTS),
            (ApiError::internal("boom"), StatusCode::INTERNAL_SERVER_ERROR),
        ];
        for (err, expected) in cases {
            let (status, body) = body_json(err).await;
            assert_eq!(status, expected);
            assert_eq!(body["success"], false);
            assert!(body["error"].is_string());
        }
    }

    #[tokio::test]
    #[serial]
    async fn test_internal_message_suppression() {
        set_expose_internal_errors(false);
        let (_, body) = body_json(ApiError::internal("secret detail")).await;
        assert_eq!(body["error"], "Internal server error");

        set_expose_internal_errors(true);
        let (_, body) = body_json(ApiError::internal("secret detail")).await;
        assert!(body["error"].as_str().unwrap().contains("secret detail"));

        set_expose_internal_errors(false);
    }

    #[test]
    fn test_media_error_mapping() {
        assert!(matches!(
            ApiError::from(MediaError::TooManyFiles { limit: 5 }),
            ApiError::UploadLimit(_)
        ));
        assert!(matches!(
            ApiError::from(MediaError::UnsupportedType("a.txt".into())),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(MediaError::NoFiles),
            ApiError::Validation(_)
        ));
        assert!(matches!(
            ApiError::from(MediaError::InvalidName("..".into())),
            ApiError::Internal(_)
        ));
    }
}
