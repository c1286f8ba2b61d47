//! Error types for rimborsi storage.

use rimborsi_core::ValidationError;

/// Result type for storage operations.
pub type Result<T> = std::result::Result<T, StoreError>;

/// Errors that can occur in storage operations.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    /// Database operation failed.
    #[error("database error: {0}")]
    Database(String),

    /// Serialization/deserialization failed.
    #[error("serialization error: {0}")]
    Serialization(String),

    /// Record not found.
    #[error("{entity} not found: {id}")]
    NotFound {
        /// Kind of record (`person`, `entry`, `content`).
        entity: &'static str,
        /// The id or name that was looked up.
        id: String,
    },

    /// The people roster has never been stored.
    #[error("not ready: people roster has not been initialized")]
    NotReady,

    /// The administrative credential did not match.
    #[error("unauthorized")]
    Unauthorized,

    /// A stored uniqueness invariant is broken.
    #[error("data corruption: {0}")]
    DataCorruption(String),

    /// Caller input failed validation.
    #[error(transparent)]
    Validation(#[from] ValidationError),

    /// Building an archive failed.
    #[error("archive error: {0}")]
    Archive(String),
}

impl StoreError {
    /// Shorthand for a `NotFound` error.
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}

impl From<serde_json::Error> for StoreError {
    fn from(err: serde_json::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}

impl From<zip::result::ZipError> for StoreError {
    fn from(err: zip::result::ZipError) -> Self {
        Self::Archive(err.to_string())
    }
}
