//! Storage layer for rimborsi.
//!
//! Everything is persisted in a plain string-to-string key-value store with no
//! transactions and no multi-key atomicity. On top of the [`KvStore`] trait this
//! crate provides:
//!
//! - [`PeopleRegistry`]: the roster of people, stored under a single key
//! - [`EntryStore`]: one JSON array of entries per (person, year) bucket
//! - [`ContentStore`]: base64 attachments, one key per entry
//! - [`ArchiveExporter`]: size- and count-bounded zip slices of a bucket
//!
//! # Key layout
//!
//! - `people`: the roster
//! - `U{uid}::entries{year}`: entry bucket
//! - `U{uid}::E{entry_id}::content`: attachment
//!
//! # Consistency
//!
//! Bucket mutations are read-modify-write without compare-and-swap. Two
//! concurrent writers of the same bucket can lose an update; the last write
//! wins. Creating or deleting an entry touches two keys in sequence, so an
//! interruption can leave a dangling entry or an orphaned attachment.
//!
//! # Example
//!
//! ```
//! use std::sync::Arc;
//! use rimborsi_store::{KvStore, MemoryStore, PeopleRegistry};
//! use rimborsi_core::{Person, PersonId};
//!
//! let store: Arc<dyn KvStore> = Arc::new(MemoryStore::new());
//! let registry = PeopleRegistry::new(store, "admin-secret");
//!
//! registry
//!     .replace(vec![Person::new(PersonId::new(1), "Anna")], "admin-secret")
//!     .unwrap();
//! assert_eq!(registry.find_by_name("Anna").unwrap().id, PersonId::new(1));
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod archive;
pub mod content;
pub mod entries;
pub mod error;
pub mod keys;
pub mod memory;
pub mod people;
#[cfg(feature = "rocksdb-backend")]
pub mod rocks;
#[cfg(feature = "rocksdb-backend")]
pub mod schema;

pub use archive::{
    ArchiveExporter, ArchiveSlice, ExportLimits, ExportOutcome, PackedFile,
    DEFAULT_MAX_ARCHIVE_BYTES, DEFAULT_MAX_FILES_PER_ARCHIVE,
};
pub use content::ContentStore;
pub use entries::EntryStore;
pub use error::{Result, StoreError};
pub use memory::MemoryStore;
pub use people::PeopleRegistry;
#[cfg(feature = "rocksdb-backend")]
pub use rocks::RocksStore;

/// The key-value contract every backing store must implement.
///
/// Keys and values are strings; binary data is base64-encoded by the caller
/// before it reaches the store.
pub trait KvStore: Send + Sync {
    /// Fetch the value stored under `key`.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn get(&self, key: &str) -> Result<Option<String>>;

    /// Store `value` under `key`, replacing any previous value.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn put(&self, key: &str, value: &str) -> Result<()>;

    /// Remove `key`. Deleting an absent key is not an error.
    ///
    /// # Errors
    ///
    /// Returns an error if the backend fails.
    fn delete(&self, key: &str) -> Result<()>;
}
