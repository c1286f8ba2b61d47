//! Paginated zip export of an entry bucket.
//!
//! A single call packs a contiguous slice of a bucket, starting at a caller
//! supplied offset, into one zip archive. Two budgets bound the slice:
//!
//! 1. `max_files`: checked first, before the attachment is even fetched.
//! 2. `max_bytes`: decoded attachment bytes. A file is admitted while
//!    `packed + size <= max_bytes`; the first file that would exceed the budget
//!    is left for the next call.
//!
//! The returned `end_index` is the offset the next call should start from.
//! A file larger than `max_bytes` on its own can never be exported: the slice
//! comes back empty with `end_index == start_index` and
//! [`ArchiveSlice::is_stalled`] set, and callers must handle it out of band.

use std::collections::HashSet;
use std::io::{Cursor, Write};

use rimborsi_core::{EntryId, PersonId, Year};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::entries::EntryStore;
use crate::error::{Result, StoreError};

/// Default maximum number of files in one archive.
pub const DEFAULT_MAX_FILES_PER_ARCHIVE: usize = 100;

/// Default maximum decoded payload of one archive (24 MiB).
pub const DEFAULT_MAX_ARCHIVE_BYTES: u64 = 24 * 1024 * 1024;

/// Deflate level used for archives. Latency matters more than ratio here.
const COMPRESSION_LEVEL: i64 = 1;

/// Budgets for a single export call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ExportLimits {
    /// Maximum number of files per archive (at least 1).
    pub max_files: usize,
    /// Maximum decoded bytes per archive.
    pub max_bytes: u64,
}

impl ExportLimits {
    /// Build limits, raising `max_files` to 1 if zero is given.
    #[must_use]
    pub fn new(max_files: usize, max_bytes: u64) -> Self {
        Self {
            max_files: max_files.max(1),
            max_bytes,
        }
    }
}

impl Default for ExportLimits {
    fn default() -> Self {
        Self::new(DEFAULT_MAX_FILES_PER_ARCHIVE, DEFAULT_MAX_ARCHIVE_BYTES)
    }
}

/// A file written into an archive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackedFile {
    /// Entry the attachment belongs to.
    pub entry_id: EntryId,
    /// Name inside the archive (deduplicated).
    pub name: String,
    /// Decoded size in bytes.
    pub size: u64,
}

/// One archive covering `start_index..end_index` of a bucket.
#[derive(Debug, Clone)]
pub struct ArchiveSlice {
    /// Finished zip archive.
    pub bytes: Vec<u8>,
    /// First bucket index considered.
    pub start_index: usize,
    /// First bucket index not included; the resume offset.
    pub end_index: usize,
    /// Bucket length at the time of the call.
    pub total: usize,
    /// Sum of decoded sizes actually packed.
    pub packed_bytes: u64,
    /// Files in archive order.
    pub files: Vec<PackedFile>,
    /// Entries passed over because their attachment is missing.
    pub skipped: Vec<EntryId>,
    /// Entry that stopped the slice by exceeding the byte budget, if any.
    pub blocked_by: Option<EntryId>,
}

impl ArchiveSlice {
    /// True when the call made no progress: the next entry alone exceeds the
    /// byte budget and repeating the call will return the same empty slice.
    #[must_use]
    pub fn is_stalled(&self) -> bool {
        self.end_index == self.start_index
    }

    /// True when this slice reaches the end of the bucket.
    #[must_use]
    pub fn is_last(&self) -> bool {
        self.end_index >= self.total
    }
}

/// Result of an export call.
#[derive(Debug, Clone)]
pub enum ExportOutcome {
    /// An archive slice, possibly empty if stalled.
    Slice(ArchiveSlice),
    /// `start_index` is at or past the end of the bucket.
    NoMoreData {
        /// Bucket length at the time of the call.
        total: usize,
    },
}

/// Builds bounded zip slices of entry buckets.
#[derive(Clone)]
pub struct ArchiveExporter {
    entries: EntryStore,
    limits: ExportLimits,
}

impl ArchiveExporter {
    /// Create an exporter reading through `entries`.
    #[must_use]
    pub fn new(entries: EntryStore, limits: ExportLimits) -> Self {
        Self { entries, limits }
    }

    /// The budgets applied to every call.
    #[must_use]
    pub fn limits(&self) -> ExportLimits {
        self.limits
    }

    /// Pack the bucket of `uid`/`year` starting at `start_index`.
    ///
    /// Entries are visited in bucket order. Attachments that are missing
    /// (an interrupted create) are logged, listed in
    /// [`ArchiveSlice::skipped`] and stepped over so pagination keeps moving.
    ///
    /// # Errors
    ///
    /// Returns an error if the bucket or an attachment cannot be read, or if
    /// the archive cannot be written.
    pub fn export(&self, uid: PersonId, year: Year, start_index: usize) -> Result<ExportOutcome> {
        let bucket = self.entries.list_entries(uid, year)?;
        let total = bucket.len();

        if start_index >= total {
            return Ok(ExportOutcome::NoMoreData { total });
        }

        let options = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .compression_level(Some(COMPRESSION_LEVEL));
        let mut writer = ZipWriter::new(Cursor::new(Vec::new()));

        let mut used_names = HashSet::new();
        let mut files = Vec::new();
        let mut skipped = Vec::new();
        let mut blocked_by = None;
        let mut packed_bytes = 0u64;
        let mut end_index = start_index;

        for entry in &bucket[start_index..] {
            if files.len() >= self.limits.max_files {
                break;
            }

            let data = match self.entries.content().get(uid, &entry.id) {
                Ok(data) => data,
                Err(StoreError::NotFound { .. }) => {
                    tracing::warn!(
                        uid = %uid,
                        year = %year,
                        entry_id = %entry.id,
                        "Attachment missing for entry, skipping in export"
                    );
                    skipped.push(entry.id.clone());
                    end_index += 1;
                    continue;
                }
                Err(e) => return Err(e),
            };

            let size = data.len() as u64;
            if packed_bytes + size > self.limits.max_bytes {
                blocked_by = Some(entry.id.clone());
                break;
            }

            let name = unique_name(&entry.file_name(), &mut used_names);
            writer.start_file(name.clone(), options)?;
            writer
                .write_all(&data)
                .map_err(|e| StoreError::Archive(e.to_string()))?;

            packed_bytes += size;
            end_index += 1;
            files.push(PackedFile {
                entry_id: entry.id.clone(),
                name,
                size,
            });
        }

        let bytes = writer.finish()?.into_inner();

        let slice = ArchiveSlice {
            bytes,
            start_index,
            end_index,
            total,
            packed_bytes,
            files,
            skipped,
            blocked_by,
        };

        if slice.is_stalled() {
            tracing::warn!(
                uid = %uid,
                year = %year,
                start_index,
                blocked_by = ?slice.blocked_by,
                max_bytes = self.limits.max_bytes,
                "Export stalled: next attachment exceeds the archive budget on its own"
            );
        } else {
            tracing::debug!(
                uid = %uid,
                year = %year,
                start_index,
                end_index = slice.end_index,
                total,
                files = slice.files.len(),
                packed_bytes = slice.packed_bytes,
                "Archive slice built"
            );
        }

        Ok(ExportOutcome::Slice(slice))
    }
}

/// Return `name`, or `stem (n).ext` for the smallest `n >= 2` not yet used.
fn unique_name(name: &str, used: &mut HashSet<String>) -> String {
    if used.insert(name.to_string()) {
        return name.to_string();
    }

    let (stem, ext) = match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => (stem, Some(ext)),
        _ => (name, None),
    };

    let mut n = 2u32;
    loop {
        let candidate = match ext {
            Some(ext) => format!("{stem} ({n}).{ext}"),
            None => format!("{stem} ({n})"),
        };
        if used.insert(candidate.clone()) {
            return candidate;
        }
        n += 1;
    }
}
