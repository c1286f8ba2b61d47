//! Request and response types for the rimborsi client.

use rimborsi_core::{EntryId, NewEntry, Person, Year};
use serde::{Deserialize, Serialize};

/// Success envelope returned by JSON endpoints.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiEnvelope<T> {
    /// Human-readable summary.
    pub message: String,
    /// Payload.
    pub data: T,
}

/// Replace roster request.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ReplacePeopleRequest {
    /// The complete new roster.
    pub people: Vec<Person>,
    /// Administrative secret.
    pub admin_token: String,
}

/// Create entry request.
#[derive(Debug, Clone, Serialize)]
pub struct CreateEntryRequest {
    /// Person name.
    pub user: String,
    /// Bucket year.
    pub year: Year,
    /// Entry fields and attachment.
    #[serde(flatten)]
    pub fields: NewEntry,
}

/// Delete entry request.
#[derive(Debug, Clone, Serialize)]
pub struct DeleteEntryRequest {
    /// Person name.
    pub user: String,
    /// Bucket year.
    pub year: Year,
    /// Entry id.
    pub id: EntryId,
}

/// A downloaded attachment.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Attachment {
    /// Raw bytes.
    pub bytes: Vec<u8>,
    /// `Content-Type` reported by the server.
    pub content_type: Option<String>,
    /// File name from `Content-Disposition`, if present.
    pub file_name: Option<String>,
}

/// One zip slice of a bucket.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveChunk {
    /// Zip archive bytes.
    pub bytes: Vec<u8>,
    /// First bucket index in the archive.
    pub from: usize,
    /// Resume offset for the next call.
    pub to: usize,
    /// Bucket length.
    pub total: usize,
    /// Decoded bytes packed, if reported.
    pub packed_bytes: Option<u64>,
}

/// Result of following archive slices to the end of a bucket.
#[derive(Debug, Clone, Default)]
pub struct ArchiveDownload {
    /// Slices in order.
    pub chunks: Vec<ArchiveChunk>,
    /// Set when the download stopped at an attachment too large for any
    /// archive. Holds the offset it stopped at and the server's message,
    /// which names the entry.
    pub stalled: Option<(usize, String)>,
}

impl ArchiveDownload {
    /// True if every entry of the bucket was covered.
    #[must_use]
    pub fn is_complete(&self) -> bool {
        self.stalled.is_none()
    }
}

/// API error response.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorResponse {
    /// Error details.
    pub error: ApiErrorBody,
}

/// API error body.
#[derive(Debug, Clone, Deserialize)]
pub struct ApiErrorBody {
    /// Error code.
    pub code: String,
    /// Error message.
    pub message: String,
}
