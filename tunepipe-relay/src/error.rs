//! Error types for tunepipe-relay
//!
//! `ApiError` is the only error that reaches a client. Component errors
//! (`ResolveError`, `TranscodeError`) convert into it so handlers can use `?`.

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use thiserror::Error;
use tunepipe_common::api::types::ErrorResponse;

use crate::resolver::ResolveError;
use crate::transcoder::TranscodeError;

/// API error type
#[derive(Debug, Error)]
pub enum ApiError {
    /// Invalid request (400)
    #[error("Invalid request: {0}")]
    BadRequest(String),

    /// Nothing to return (404)
    #[error("Not found: {0}")]
    NotFound(String),

    /// Resolution service failure (500)
    #[error("Upstream error: {0}")]
    Upstream(String),

    /// Internal server error (500)
    #[error("Internal server error: {0}")]
    Internal(String),
}

impl ApiError {
    fn status_and_code(&self) -> (StatusCode, &'static str) {
        match self {
            ApiError::BadRequest(_) => (StatusCode::BAD_REQUEST, "BAD_REQUEST"),
            ApiError::NotFound(_) => (StatusCode::NOT_FOUND, "NO_TRACKS"),
            ApiError::Upstream(_) => (StatusCode::INTERNAL_SERVER_ERROR, "UPSTREAM_UNAVAILABLE"),
            ApiError::Internal(_) => (StatusCode::INTERNAL_SERVER_ERROR, "INTERNAL_ERROR"),
        }
    }

    fn message(self) -> String {
        match self {
            ApiError::BadRequest(msg)
            | ApiError::NotFound(msg)
            | ApiError::Upstream(msg)
            | ApiError::Internal(msg) => msg,
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let (status, code) = self.status_and_code();

        let body = Json(ErrorResponse {
            error: self.message(),
            code: code.to_string(),
        });

        (status, body).into_response()
    }
}

impl From<ResolveError> for ApiError {
    fn from(err: ResolveError) -> Self {
        match err {
            ResolveError::InvalidInput(msg) => ApiError::BadRequest(msg),
            ResolveError::NoTracksFound => {
                ApiError::NotFound("No audio URLs could be resolved".to_string())
            }
            // Upstream detail is logged by the caller, not echoed to clients
            ResolveError::UpstreamUnavailable(_) => {
                ApiError::Upstream("Failed to fetch audio".to_string())
            }
        }
    }
}

impl From<TranscodeError> for ApiError {
    fn from(err: TranscodeError) -> Self {
        match err {
            TranscodeError::InvalidInput(msg) => ApiError::BadRequest(msg),
            TranscodeError::TranscoderNotFound(_)
            | TranscodeError::Spawn(_)
            | TranscodeError::ProcessFailure(_) => {
                ApiError::Internal("Failed to start audio stream".to_string())
            }
        }
    }
}

impl From<tunepipe_common::Error> for ApiError {
    fn from(err: tunepipe_common::Error) -> Self {
        match err {
            tunepipe_common::Error::InvalidInput(msg) => ApiError::BadRequest(msg),
            other => ApiError::Internal(other.to_string()),
        }
    }
}

/// Result type for API handlers
pub type ApiResult<T> = Result<T, ApiError>;
