//! Core types and validation for the rimborsi expense ledger.
//!
//! This crate provides the foundational types shared by the store, the HTTP
//! service and the client SDK:
//!
//! - **Identifiers**: `PersonId`, `EntryId`, `Year`
//! - **People**: `Person` and roster validation
//! - **Entries**: `Entry`, `NewEntry`
//! - **Attachments**: content-type hygiene, file names, size estimates
//!
//! # Attachments
//!
//! Attachment bytes always travel as standard base64 text. Size budgets are
//! expressed in decoded bytes and estimated as `base64_len * 3 / 4`.

#![forbid(unsafe_code)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![warn(clippy::pedantic)]

pub mod attachment;
pub mod entry;
pub mod error;
pub mod ids;
pub mod people;

pub use attachment::{
    decoded_size_estimate, default_file_name, extension_for, normalize_content_type,
    validate_file_name, DEFAULT_CONTENT_TYPE, DEFAULT_MAX_ENTRY_BYTES, FALLBACK_EXTENSION,
};
pub use entry::{Entry, NewEntry};
pub use error::{Result, ValidationError};
pub use ids::{EntryId, PersonId, Year};
pub use people::{validate_roster, Person};
