//! Key derivation for the key-value store.
//!
//! The layout is shared with other deployments reading the same namespace, so
//! these formats must not change.

use rimborsi_core::{EntryId, PersonId, Year};

/// Key holding the people roster.
pub const PEOPLE_KEY: &str = "people";

/// Key of the entry bucket for one person and year.
///
/// Format: `U{uid}::entries{year}`
#[must_use]
pub fn entries_key(uid: PersonId, year: Year) -> String {
    format!("U{uid}::entries{year}")
}

/// Key of the attachment of one entry.
///
/// Format: `U{uid}::E{entry_id}::content`
#[must_use]
pub fn content_key(uid: PersonId, entry_id: &EntryId) -> String {
    format!("U{uid}::E{entry_id}::content")
}
