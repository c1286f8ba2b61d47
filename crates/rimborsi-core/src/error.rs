//! Validation errors for rimborsi.

/// Result type for validation.
pub type Result<T> = std::result::Result<T, ValidationError>;

/// Errors raised while validating caller-supplied data.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ValidationError {
    /// A required field was missing or empty.
    #[error("missing field: {0}")]
    MissingField(&'static str),

    /// The attachment exceeds the per-entry budget.
    #[error("attachment too large: {size} bytes > {limit} bytes")]
    PayloadTooLarge {
        /// Estimated decoded size in bytes.
        size: u64,
        /// Configured budget in bytes.
        limit: u64,
    },

    /// The content type is not of the form `type/subtype`.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),

    /// The file name contains a path separator or is otherwise unusable.
    #[error("invalid file name: {0}")]
    InvalidFileName(String),

    /// The attachment is not valid base64.
    #[error("attachment content is not valid base64")]
    InvalidContent,

    /// The amount is zero or not a finite number.
    #[error("invalid amount: {0}")]
    InvalidAmount(String),

    /// An identifier could not be parsed.
    #[error("invalid identifier: {0}")]
    InvalidId(String),

    /// A year could not be parsed.
    #[error("invalid year: {0}")]
    InvalidYear(String),

    /// A people roster must contain at least one person.
    #[error("people list is empty")]
    EmptyRoster,

    /// Two people share a name or an id.
    #[error("collision on {field}: {value}")]
    RosterCollision {
        /// Which field collided (`name` or `id`).
        field: &'static str,
        /// The repeated value.
        value: String,
    },
}
