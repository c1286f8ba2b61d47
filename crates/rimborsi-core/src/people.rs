//! People roster types.

use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::error::ValidationError;
use crate::ids::PersonId;

/// A person allowed to file expenses.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Person {
    /// Numeric id, used to namespace store keys.
    pub id: PersonId,
    /// Display name, used by callers to address the person.
    pub name: String,
}

impl Person {
    /// Create a new person.
    #[must_use]
    pub fn new(id: PersonId, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
        }
    }
}

/// Check that a roster is non-empty and that names and ids are unique.
///
/// # Errors
///
/// - `ValidationError::EmptyRoster` if `people` is empty.
/// - `ValidationError::MissingField` if a name is blank.
/// - `ValidationError::RosterCollision` on the first repeated name or id.
pub fn validate_roster(people: &[Person]) -> Result<(), ValidationError> {
    if people.is_empty() {
        return Err(ValidationError::EmptyRoster);
    }

    let mut names = HashSet::with_capacity(people.len());
    let mut ids = HashSet::with_capacity(people.len());

    for person in people {
        if person.name.trim().is_empty() {
            return Err(ValidationError::MissingField("name"));
        }
        if !names.insert(person.name.as_str()) {
            return Err(ValidationError::RosterCollision {
                field: "name",
                value: person.name.clone(),
            });
        }
        if !ids.insert(person.id) {
            return Err(ValidationError::RosterCollision {
                field: "id",
                value: person.id.to_string(),
            });
        }
    }

    Ok(())
}
