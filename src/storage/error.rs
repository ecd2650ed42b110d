//! Storage module error types
//!
//! Provides the single error type shared by the remote and local backends.
//! Propagated failures only carry a message; the variant tells callers
//! where it came from.

use serde::Serialize;
use thiserror::Error;

/// Storage operation error type
#[derive(Error, Debug)]
pub enum StorageError {
    /// Error reported by the remote backend (its message is kept verbatim)
    #[error("{0}")]
    Backend(String),

    /// Transport failure talking to the remote backend
    #[error("HTTP error: {0}")]
    Http(String),

    /// Local SQLite store error
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),

    /// Data serialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// File operation error
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    /// Lock error when accessing the local store
    #[error("Local store lock poisoned")]
    LockError,
}

impl From<reqwest::Error> for StorageError {
    fn from(e: reqwest::Error) -> Self {
        StorageError::Http(e.to_string())
    }
}

impl StorageError {
    /// Error code for client-side handling
    pub fn code(&self) -> &'static str {
        match self {
            Self::Backend(_) => "BACKEND_ERROR",
            Self::Http(_) => "HTTP_ERROR",
            Self::Database(_) => "DATABASE_ERROR",
            Self::Serialization(_) => "SERIALIZATION_ERROR",
            Self::Io(_) => "IO_ERROR",
            Self::LockError => "LOCK_ERROR",
        }
    }
}

/// Serializable error response for front-end consumers
#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    /// Error code for client-side handling
    pub code: String,
    /// Human-readable error message
    pub message: String,
}

impl From<&StorageError> for ErrorResponse {
    fn from(err: &StorageError) -> Self {
        Self {
            code: err.code().to_string(),
            message: err.to_string(),
        }
    }
}

impl Serialize for StorageError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        ErrorResponse::from(self).serialize(serializer)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_error_keeps_message() {
        let err = StorageError::Backend("duplicate key value violates unique constraint".to_string());
        assert_eq!(err.to_string(), "duplicate key value violates unique constraint");
        assert_eq!(err.code(), "BACKEND_ERROR");
    }

    #[test]
    fn test_error_serialization() {
        let err = StorageError::Http("connection refused".to_string());
        let json = serde_json::to_string(&err).unwrap();
        assert!(json.contains("HTTP_ERROR"));
        assert!(json.contains("connection refused"));
    }

    #[test]
    fn test_lock_error_display() {
        assert_eq!(StorageError::LockError.to_string(), "Local store lock poisoned");
    }
}
