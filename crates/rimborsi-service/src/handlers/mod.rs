//! API handlers.

pub mod download;
pub mod entries;
pub mod health;
pub mod people;

use serde::Serialize;

use crate::error::ApiError;

/// Success envelope shared by every JSON endpoint.
#[derive(Debug, Serialize)]
pub struct ApiResponse<T> {
    /// Human-readable summary.
    pub message: String,
    /// Payload.
    pub data: T,
}

impl<T> ApiResponse<T> {
    /// Wrap `data` with a summary message.
    pub fn new(message: impl Into<String>, data: T) -> Self {
        Self {
            message: message.into(),
            data,
        }
    }
}

/// Run store work off the async runtime. Backends block on disk I/O and
/// attachments are decoded in full.
pub(crate) async fn run_blocking<T, F>(task: &'static str, f: F) -> Result<T, ApiError>
where
    F: FnOnce() -> Result<T, ApiError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ApiError::Internal(format!("{task} task failed: {e}")))?
}
