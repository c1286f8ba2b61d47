//! Client error types.

/// Errors that can occur when using the rimborsi client.
#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// HTTP request failed.
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// Server returned an error response.
    #[error("API error: {code} - {message}")]
    Api {
        /// Error code.
        code: String,
        /// Error message.
        message: String,
        /// HTTP status code.
        status: u16,
    },

    /// The shared token was rejected.
    #[error("not authorized")]
    Unauthorized,

    /// The service is throttling this caller.
    #[error("rate limited")]
    RateLimited,

    /// The people roster has not been initialized yet.
    #[error("service not ready")]
    NotReady,

    /// A response was missing an expected header or had a malformed one.
    #[error("invalid response: {0}")]
    InvalidResponse(String),

    /// Serialization error.
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration.
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl ClientError {
    /// True if the server refused an archive slice because the next
    /// attachment does not fit the archive budget.
    #[must_use]
    pub fn is_payload_too_large(&self) -> bool {
        matches!(self, Self::Api { code, .. } if code == "payload_too_large")
    }
}
