//! Unified error types for siteintel.
//!
//! Every stage of the analysis pipeline reports failures through [`Error`].
//! Variants render as `CODE: detail` so logs and client payloads carry a
//! stable machine-readable prefix.

/// Broad failure classes used to pick the client-facing outcome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// Malformed or disallowed address.
    Validation,
    /// Page retrieval failed.
    Fetch,
    /// Model service failed or returned unusable output.
    Model,
    /// Server is misconfigured.
    Config,
    /// Unexpected failure inside the server.
    Internal,
}

/// Unified error types for the siteintel pipeline.
#[derive(Debug, Clone, thiserror::Error)]
pub enum Error {
    /// Input could not be normalized into an absolute http(s) address.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Address points at a loopback or internal host.
    #[error("URL_NOT_ALLOWED: {0}")]
    UrlNotAllowed(String),

    /// Page retrieval exceeded its time budget.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// Network failure while retrieving the page.
    #[error("FETCH_FAILED: {0}")]
    FetchFailed(String),

    /// Target site answered with a non-success status.
    #[error("HTTP_ERROR: {status} {reason}")]
    HttpError { status: u16, reason: String },

    /// Model service answered with a non-success status or was unreachable.
    #[error("MODEL_HTTP_ERROR: {0}")]
    ModelHttp(String),

    /// Model call exceeded its time budget.
    #[error("MODEL_TIMEOUT: {0}")]
    ModelTimeout(String),

    /// Model response carried no message content.
    #[error("MODEL_EMPTY_RESPONSE: {0}")]
    ModelEmptyResponse(String),

    /// Model content was not valid JSON or did not fit the report shape.
    #[error("MODEL_MALFORMED_OUTPUT: {0}")]
    ModelMalformed(String),

    /// Missing or invalid configuration.
    #[error("CONFIG_ERROR: {0}")]
    Config(String),

    /// Background analysis task failed unexpectedly.
    #[error("INTERNAL_ERROR: {0}")]
    Internal(String),
}

impl Error {
    /// Classify this error into its failure class.
    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::InvalidUrl(_) | Error::UrlNotAllowed(_) => ErrorKind::Validation,
            Error::FetchTimeout(_) | Error::FetchFailed(_) | Error::HttpError { .. } => ErrorKind::Fetch,
            Error::ModelHttp(_) | Error::ModelTimeout(_) | Error::ModelEmptyResponse(_) | Error::ModelMalformed(_) => {
                ErrorKind::Model
            }
            Error::Config(_) => ErrorKind::Config,
            Error::Internal(_) => ErrorKind::Internal,
        }
    }

    /// Whether this failure was a timeout at either network suspension point.
    pub fn is_timeout(&self) -> bool {
        matches!(self, Error::FetchTimeout(_) | Error::ModelTimeout(_))
    }
}

impl From<crate::config::ConfigError> for Error {
    fn from(err: crate::config::ConfigError) -> Self {
        Error::Config(err.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::HttpError { status: 404, reason: "Not Found".into() };
        assert_eq!(err.to_string(), "HTTP_ERROR: 404 Not Found");

        let err = Error::ModelMalformed("expected value at line 1 column 1".into());
        assert!(err.to_string().starts_with("MODEL_MALFORMED_OUTPUT"));
    }

    #[test]
    fn test_error_kind() {
        assert_eq!(Error::InvalidUrl("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::UrlNotAllowed("x".into()).kind(), ErrorKind::Validation);
        assert_eq!(Error::FetchTimeout("x".into()).kind(), ErrorKind::Fetch);
        assert_eq!(Error::HttpError { status: 500, reason: String::new() }.kind(), ErrorKind::Fetch);
        assert_eq!(Error::ModelEmptyResponse("x".into()).kind(), ErrorKind::Model);
        assert_eq!(Error::ModelMalformed("x".into()).kind(), ErrorKind::Model);
        assert_eq!(Error::Config("x".into()).kind(), ErrorKind::Config);
        assert_eq!(Error::Internal("x".into()).kind(), ErrorKind::Internal);
    }

    #[test]
    fn test_is_timeout() {
        assert!(Error::FetchTimeout("15s".into()).is_timeout());
        assert!(Error::ModelTimeout("60s".into()).is_timeout());
        assert!(!Error::FetchFailed("reset".into()).is_timeout());
    }
}
