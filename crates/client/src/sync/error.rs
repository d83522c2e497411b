//! Sync client error types.

use std::sync::Arc;

/// Errors from the popular-products endpoint.
#[derive(Debug, thiserror::Error)]
pub enum SyncError {
    /// Base URL could not be parsed or joined.
    #[error("invalid URL: {0}")]
    InvalidUrl(String),

    /// HTTP error response.
    #[error("HTTP error: {status}")]
    HttpError { status: u16 },

    /// Request timeout.
    #[error("request timeout")]
    Timeout,

    /// Network error.
    #[error("network error: {0}")]
    Network(Arc<reqwest::Error>),

    /// Response parse error.
    #[error("parse error: {0}")]
    Parse(String),

    /// The server answered with `success: false`.
    #[error("server reported failure")]
    Unsuccessful,
}

impl From<reqwest::Error> for SyncError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() { SyncError::Timeout } else { SyncError::Network(Arc::new(err)) }
    }
}

impl From<SyncError> for pantry_core::Error {
    fn from(err: SyncError) -> Self {
        match err {
            SyncError::InvalidUrl(msg) => pantry_core::Error::InvalidUrl(msg),
            SyncError::Timeout => pantry_core::Error::FetchTimeout(err.to_string()),
            SyncError::HttpError { .. } | SyncError::Network(_) => pantry_core::Error::HttpError(err.to_string()),
            SyncError::Parse(_) | SyncError::Unsuccessful => pantry_core::Error::MalformedResponse(err.to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = SyncError::HttpError { status: 503 };
        assert_eq!(err.to_string(), "HTTP error: 503");

        let err = SyncError::Parse("expected value".to_string());
        assert!(err.to_string().contains("parse error"));
    }

    #[test]
    fn test_maps_onto_cache_errors() {
        let err: pantry_core::Error = SyncError::Timeout.into();
        assert!(matches!(err, pantry_core::Error::FetchTimeout(_)));

        let err: pantry_core::Error = SyncError::HttpError { status: 500 }.into();
        assert!(matches!(err, pantry_core::Error::HttpError(msg) if msg.contains("500")));

        let err: pantry_core::Error = SyncError::Unsuccessful.into();
        assert!(matches!(err, pantry_core::Error::MalformedResponse(_)));

        let err: pantry_core::Error = SyncError::InvalidUrl("nope".into()).into();
        assert!(matches!(err, pantry_core::Error::InvalidUrl(_)));
    }
}
