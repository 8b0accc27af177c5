//! HTTP mapping for pipeline errors.
//!
//! Validation failures answer 400 with a short fixed message. Everything else
//! answers 500 with the error's diagnostic text. Full detail always goes to
//! the server log.

use axum::Json;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use serde_json::json;
use siteintel_core::{Error, ErrorKind};

/// Error returned from HTTP handlers.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl ApiError {
    /// Status code and client-visible message for this error.
    pub fn status_and_message(&self) -> (StatusCode, String) {
        match &self.0 {
            Error::InvalidUrl(_) => (StatusCode::BAD_REQUEST, "Invalid URL".to_string()),
            Error::UrlNotAllowed(_) => (StatusCode::BAD_REQUEST, "URL not allowed".to_string()),
            other => (StatusCode::INTERNAL_SERVER_ERROR, other.to_string()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self.0.kind() {
            ErrorKind::Validation => tracing::debug!(error = %self.0, "rejected request"),
            _ => tracing::error!(error = %self.0, "analysis failed"),
        }

        let (status, message) = self.status_and_message();
        (status, Json(json!({ "error": message }))).into_response()
    }
}
