//! Identifier types for rimborsi.
//!
//! These identifiers end up inside store keys (`U{uid}::E{entry}::content`), so
//! their textual forms must never contain the `::` delimiter.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::ValidationError;

/// Maximum accepted length for an entry identifier.
const MAX_ENTRY_ID_LEN: usize = 128;

/// A person identifier, assigned by the administrator in the people roster.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PersonId(u32);

impl PersonId {
    /// Create a `PersonId` from its numeric value.
    #[must_use]
    pub const fn new(id: u32) -> Self {
        Self(id)
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u32 {
        self.0
    }
}

impl FromStr for PersonId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        s.trim()
            .parse()
            .map(Self)
            .map_err(|_| ValidationError::InvalidId(s.to_string()))
    }
}

impl fmt::Debug for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "PersonId({})", self.0)
    }
}

impl fmt::Display for PersonId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// An entry identifier.
///
/// Freshly generated ids are hyphenated UUID v4 strings. Ids read back from
/// storage or received from callers are only required to be key-safe: non-empty,
/// bounded in length and free of `:`, `/` and `\`.
#[derive(Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct EntryId(String);

impl EntryId {
    /// Generate a new random `EntryId`.
    #[must_use]
    pub fn generate() -> Self {
        Self(uuid::Uuid::new_v4().to_string())
    }

    /// Return the id as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl FromStr for EntryId {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let unsafe_char = s
            .chars()
            .any(|c| c == ':' || c == '/' || c == '\\' || c.is_control() || c.is_whitespace());

        if s.is_empty() || s.len() > MAX_ENTRY_ID_LEN || unsafe_char {
            return Err(ValidationError::InvalidId(s.to_string()));
        }

        Ok(Self(s.to_string()))
    }
}

impl fmt::Debug for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "EntryId({})", self.0)
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl TryFrom<String> for EntryId {
    type Error = ValidationError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<EntryId> for String {
    fn from(id: EntryId) -> Self {
        id.0
    }
}

/// A calendar year used to bucket entries.
///
/// Deserializes from either a JSON number or a numeric string, since form
/// inputs frequently submit the year as text.
#[derive(Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "YearRepr", into = "u16")]
pub struct Year(u16);

impl Year {
    /// Create a `Year`, rejecting zero.
    ///
    /// # Errors
    ///
    /// Returns `ValidationError::InvalidYear` for year zero.
    pub fn new(year: u16) -> Result<Self, ValidationError> {
        if year == 0 {
            return Err(ValidationError::InvalidYear(year.to_string()));
        }
        Ok(Self(year))
    }

    /// Return the numeric value.
    #[must_use]
    pub const fn get(self) -> u16 {
        self.0
    }
}

impl FromStr for Year {
    type Err = ValidationError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let year = s
            .trim()
            .parse::<u16>()
            .map_err(|_| ValidationError::InvalidYear(s.to_string()))?;
        Self::new(year)
    }
}

impl fmt::Debug for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Year({})", self.0)
    }
}

impl fmt::Display for Year {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<Year> for u16 {
    fn from(year: Year) -> Self {
        year.0
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum YearRepr {
    Number(u16),
    Text(String),
}

impl TryFrom<YearRepr> for Year {
    type Error = ValidationError;

    fn try_from(value: YearRepr) -> Result<Self, Self::Error> {
        match value {
            YearRepr::Number(n) => Self::new(n),
            YearRepr::Text(s) => s.parse(),
        }
    }
}
