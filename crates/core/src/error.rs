//! Unified error types for the product cache.
//!
//! Internal storage and normalization functions return these through
//! `Result`. The [`ProductCache`](crate::ProductCache) facade never hands them
//! back as `Err`; it attaches them to an [`Outcome`](crate::Outcome) instead.

use tokio_rusqlite::rusqlite;

/// Unified error type for the product cache.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The persistent store could not be opened in this environment.
    #[error("STORAGE_UNAVAILABLE: {0}")]
    StorageUnavailable(String),

    /// Database operation failed.
    #[error("CACHE_ERROR: {0}")]
    Database(tokio_rusqlite::Error),

    /// Migration failed to apply.
    #[error("CACHE_ERROR: migration failed: {0}")]
    MigrationFailed(String),

    /// A stored row could not be decoded back into a record.
    #[error("CORRUPT_RECORD: {0}")]
    CorruptRecord(String),

    /// An incoming product payload could not be normalized.
    #[error("MALFORMED_PAYLOAD: {0}")]
    MalformedPayload(String),

    /// Invalid remote URL.
    #[error("INVALID_URL: {0}")]
    InvalidUrl(String),

    /// Fetch timeout.
    #[error("FETCH_TIMEOUT: {0}")]
    FetchTimeout(String),

    /// HTTP error response or network failure.
    #[error("HTTP_ERROR: {0}")]
    HttpError(String),

    /// The remote body was not the expected shape.
    #[error("MALFORMED_RESPONSE: {0}")]
    MalformedResponse(String),
}

impl From<tokio_rusqlite::Error<Error>> for Error {
    fn from(err: tokio_rusqlite::Error<Error>) -> Self {
        match err {
            tokio_rusqlite::Error::Error(e) => e,
            tokio_rusqlite::Error::ConnectionClosed => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
            tokio_rusqlite::Error::Close(c) => Error::Database(tokio_rusqlite::Error::Close(c)),
            _ => Error::Database(tokio_rusqlite::Error::ConnectionClosed),
        }
    }
}

impl From<tokio_rusqlite::Error<rusqlite::Error>> for Error {
    fn from(err: tokio_rusqlite::Error<rusqlite::Error>) -> Self {
        Error::Database(err)
    }
}

impl From<rusqlite::Error> for Error {
    fn from(err: rusqlite::Error) -> Self {
        Error::Database(tokio_rusqlite::Error::Error(err))
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::CorruptRecord(err.to_string())
    }
}

impl Error {
    /// Whether this error means the store itself is missing, as opposed to a
    /// single operation failing.
    pub fn is_unavailable(&self) -> bool {
        matches!(self, Error::StorageUnavailable(_))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::MalformedPayload("payload is not an object".to_string());
        assert!(err.to_string().contains("MALFORMED_PAYLOAD"));
        assert!(err.to_string().contains("not an object"));
    }

    #[test]
    fn test_unwraps_nested_error() {
        let nested: tokio_rusqlite::Error<Error> = tokio_rusqlite::Error::Error(Error::CorruptRecord("bad".into()));
        let err: Error = nested.into();
        assert!(matches!(err, Error::CorruptRecord(msg) if msg == "bad"));
    }

    #[test]
    fn test_is_unavailable() {
        assert!(Error::StorageUnavailable("read-only".into()).is_unavailable());
        assert!(!Error::HttpError("status 500".into()).is_unavailable());
    }
}
