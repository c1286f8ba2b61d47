//! Attachment storage.

use std::sync::Arc;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rimborsi_core::{EntryId, PersonId};

use crate::error::{Result, StoreError};
use crate::keys::content_key;
use crate::KvStore;

/// Stores one base64 attachment per entry under `U{uid}::E{entry_id}::content`.
#[derive(Clone)]
pub struct ContentStore {
    store: Arc<dyn KvStore>,
}

impl ContentStore {
    /// Create a content store over `store`.
    pub fn new(store: Arc<dyn KvStore>) -> Self {
        Self { store }
    }

    /// Fetch and decode an attachment.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if no attachment is stored for the entry.
    /// - `StoreError::Serialization` if the stored text is not valid base64.
    pub fn get(&self, uid: PersonId, entry_id: &EntryId) -> Result<Vec<u8>> {
        let raw = self
            .store
            .get(&content_key(uid, entry_id))?
            .ok_or_else(|| StoreError::not_found("content", entry_id))?;

        STANDARD
            .decode(raw.as_bytes())
            .map_err(|e| StoreError::Serialization(format!("attachment {entry_id}: {e}")))
    }

    /// Store an attachment as-is. `base64` must already be standard base64.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn put(&self, uid: PersonId, entry_id: &EntryId, base64: &str) -> Result<()> {
        self.store.put(&content_key(uid, entry_id), base64)
    }

    /// Remove an attachment.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    pub fn delete(&self, uid: PersonId, entry_id: &EntryId) -> Result<()> {
        self.store.delete(&content_key(uid, entry_id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::MemoryStore;

    #[test]
    fn put_then_get_decodes() {
        let store = Arc::new(MemoryStore::new());
        let content = ContentStore::new(store.clone());
        let id: EntryId = "abc".parse().unwrap();

        content
            .put(PersonId::new(7), &id, &STANDARD.encode(b"receipt"))
            .unwrap();

        assert_eq!(content.get(PersonId::new(7), &id).unwrap(), b"receipt");
        assert!(store.get("U7::Eabc::content").unwrap().is_some());
    }

    #[test]
    fn missing_content_is_not_found() {
        let content = ContentStore::new(Arc::new(MemoryStore::new()));
        let id: EntryId = "abc".parse().unwrap();

        assert!(matches!(
            content.get(PersonId::new(7), &id),
            Err(StoreError::NotFound {
                entity: "content",
                ..
            })
        ));
    }

    #[test]
    fn delete_removes_content() {
        let content = ContentStore::new(Arc::new(MemoryStore::new()));
        let id: EntryId = "abc".parse().unwrap();

        content.put(PersonId::new(7), &id, "AAAA").unwrap();
        content.delete(PersonId::new(7), &id).unwrap();

        assert!(content.get(PersonId::new(7), &id).is_err());
    }
}
