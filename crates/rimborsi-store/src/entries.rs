//! Entry buckets.
//!
//! Each (person, year) pair owns a single JSON array of entries in insertion
//! order. Every mutation reads the whole array, applies one append or one
//! removal, and writes the whole array back. There is no compare-and-swap:
//! concurrent writers of the same bucket race and the last write wins.

use std::sync::Arc;

use rimborsi_core::{Entry, EntryId, NewEntry, PersonId, Year, DEFAULT_MAX_ENTRY_BYTES};

use crate::content::ContentStore;
use crate::error::{Result, StoreError};
use crate::keys::entries_key;
use crate::KvStore;

/// CRUD over entry buckets and their attachments.
#[derive(Clone)]
pub struct EntryStore {
    store: Arc<dyn KvStore>,
    content: ContentStore,
    max_entry_bytes: u64,
}

impl EntryStore {
    /// Create an entry store with the default attachment budget.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self::with_max_entry_bytes(store, DEFAULT_MAX_ENTRY_BYTES)
    }

    /// Create an entry store with a custom attachment budget, in decoded bytes.
    pub fn with_max_entry_bytes(store: Arc<dyn KvStore>, max_entry_bytes: u64) -> Self {
        Self {
            content: ContentStore::new(store.clone()),
            store,
            max_entry_bytes,
        }
    }

    /// The attachment store sharing this entry store's backend.
    #[must_use]
    pub fn content(&self) -> &ContentStore {
        &self.content
    }

    /// Entries of a bucket, in insertion order. A missing bucket is empty.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails or the bucket is not valid JSON.
    pub fn list_entries(&self, uid: PersonId, year: Year) -> Result<Vec<Entry>> {
        match self.store.get(&entries_key(uid, year))? {
            Some(raw) => Ok(serde_json::from_str(&raw)?),
            None => Ok(Vec::new()),
        }
    }

    /// Look up one entry of a bucket.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotFound` if the bucket has no entry with that id.
    pub fn get_entry(&self, uid: PersonId, year: Year, entry_id: &EntryId) -> Result<Entry> {
        self.list_entries(uid, year)?
            .into_iter()
            .find(|e| &e.id == entry_id)
            .ok_or_else(|| StoreError::not_found("entry", entry_id))
    }

    /// Validate and store a new entry with its attachment.
    ///
    /// Nothing is written if validation fails. The bucket is written before
    /// the attachment; if the attachment write fails the entry is left
    /// dangling and the error is returned as-is.
    ///
    /// # Errors
    ///
    /// - `StoreError::Validation` for missing fields, an oversized attachment,
    ///   a malformed content type or file name.
    /// - Backend errors from either write.
    pub fn create_entry(&self, uid: PersonId, year: Year, fields: NewEntry) -> Result<Entry> {
        let (entry, content) = fields.prepare(uid, EntryId::generate(), self.max_entry_bytes)?;

        let mut bucket = self.list_entries(uid, year)?;
        if bucket.iter().any(|e| e.id == entry.id) {
            return Err(StoreError::DataCorruption(format!(
                "generated entry id {} already present in bucket",
                entry.id
            )));
        }
        bucket.push(entry.clone());
        self.write_bucket(uid, year, &bucket)?;

        self.content.put(uid, &entry.id, &content)?;

        tracing::info!(
            uid = %uid,
            year = %year,
            entry_id = %entry.id,
            bytes = content.len(),
            "Entry created"
        );

        Ok(entry)
    }

    /// Remove an entry and its attachment, returning the removed entry.
    ///
    /// The bucket is rewritten first. Once that succeeds the entry is gone, so
    /// a failed attachment delete is only logged and leaves an orphaned blob
    /// that nothing references.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if the bucket has no entry with that id.
    /// - Backend errors from reading or rewriting the bucket.
    pub fn delete_entry(&self, uid: PersonId, year: Year, entry_id: &EntryId) -> Result<Entry> {
        let mut bucket = self.list_entries(uid, year)?;
        let position = bucket
            .iter()
            .position(|e| &e.id == entry_id)
            .ok_or_else(|| StoreError::not_found("entry", entry_id))?;

        let removed = bucket.remove(position);
        self.write_bucket(uid, year, &bucket)?;

        if let Err(e) = self.content.delete(uid, entry_id) {
            tracing::warn!(
                uid = %uid,
                entry_id = %entry_id,
                error = %e,
                "Entry removed but attachment delete failed; blob is orphaned"
            );
        } else {
            tracing::info!(uid = %uid, year = %year, entry_id = %entry_id, "Entry deleted");
        }

        Ok(removed)
    }

    fn write_bucket(&self, uid: PersonId, year: Year, bucket: &[Entry]) -> Result<()> {
        let value = serde_json::to_string(bucket)?;
        self.store.put(&entries_key(uid, year), &value)
    }
}
