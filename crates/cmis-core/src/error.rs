//! Error types for the CMIS client core.
//!
//! Remote faults raised by the binding services travel through this enum
//! untouched. Cache-layer faults also use it internally, but the caches never
//! hand them to callers: they are logged and collapsed into a miss.

use thiserror::Error;

/// Main error type for the CMIS client.
#[derive(Debug, Error)]
pub enum CmisError {
    // Remote service faults
    #[error("Object not found: {message}")]
    ObjectNotFound { message: String },

    #[error("Constraint violation: {message}")]
    Constraint { message: String },

    #[error("Operation not supported: {message}")]
    NotSupported { message: String },

    #[error("Connection error: {message}")]
    Connection {
        message: String,
        /// HTTP status reported by the transport, if any
        status_code: Option<u16>,
    },

    #[error("Runtime error: {message}")]
    Runtime { message: String },

    // Caller mistakes
    #[error("Invalid argument: {message}")]
    InvalidArgument { message: String },

    // Cache backend faults
    #[error("Cache store error: {message}")]
    Store { message: String },

    #[error("Database error: {message}")]
    Database {
        message: String,
        #[source]
        source: Option<rusqlite::Error>,
    },

    #[error("IO error: {message}")]
    Io {
        message: String,
        #[source]
        source: Option<std::io::Error>,
    },

    // Serialization errors
    #[error("JSON error: {message}")]
    Json {
        message: String,
        #[source]
        source: Option<serde_json::Error>,
    },

    #[error("{0}")]
    Other(String),
}

/// Result type alias for CMIS operations.
pub type Result<T> = std::result::Result<T, CmisError>;

impl From<serde_json::Error> for CmisError {
    fn from(err: serde_json::Error) -> Self {
        CmisError::Json {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<rusqlite::Error> for CmisError {
    fn from(err: rusqlite::Error) -> Self {
        CmisError::Database {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl From<std::io::Error> for CmisError {
    fn from(err: std::io::Error) -> Self {
        CmisError::Io {
            message: err.to_string(),
            source: Some(err),
        }
    }
}

impl CmisError {
    /// Shorthand for an [`CmisError::InvalidArgument`].
    pub fn invalid_argument(message: impl Into<String>) -> Self {
        CmisError::InvalidArgument {
            message: message.into(),
        }
    }

    /// Shorthand for an [`CmisError::ObjectNotFound`].
    pub fn not_found(message: impl Into<String>) -> Self {
        CmisError::ObjectNotFound {
            message: message.into(),
        }
    }

    /// Shorthand for a [`CmisError::Runtime`].
    pub fn runtime(message: impl Into<String>) -> Self {
        CmisError::Runtime {
            message: message.into(),
        }
    }

    /// True when the repository reported that the object does not exist.
    pub fn is_not_found(&self) -> bool {
        matches!(self, CmisError::ObjectNotFound { .. })
    }

    /// True when the fault comes from the backing cache store rather than the
    /// repository.
    pub fn is_cache_fault(&self) -> bool {
        matches!(
            self,
            CmisError::Store { .. } | CmisError::Database { .. } | CmisError::Json { .. }
        )
    }

    /// Check if this error could succeed when retried by the transport layer.
    ///
    /// Nothing in this crate retries; the flag is for callers.
    pub fn is_retryable(&self) -> bool {
        match self {
            CmisError::Connection { status_code, .. } => {
                !matches!(status_code, Some(code) if (400..500).contains(code))
            }
            _ => false,
        }
    }
}
