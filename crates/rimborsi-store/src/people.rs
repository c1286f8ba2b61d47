//! The people roster.

use std::sync::Arc;

use rimborsi_core::{validate_roster, Person};
use subtle::ConstantTimeEq;

use crate::error::{Result, StoreError};
use crate::keys::PEOPLE_KEY;
use crate::KvStore;

/// Authoritative list of people, stored as one JSON array under [`PEOPLE_KEY`].
#[derive(Clone)]
pub struct PeopleRegistry {
    store: Arc<dyn KvStore>,
    admin_secret: String,
}

impl PeopleRegistry {
    /// Create a registry over `store`, guarded by `admin_secret` for replacements.
    pub fn new(store: Arc<dyn KvStore>, admin_secret: impl Into<String>) -> Self {
        Self {
            store,
            admin_secret: admin_secret.into(),
        }
    }

    /// Current roster.
    ///
    /// # Errors
    ///
    /// Returns `StoreError::NotReady` if no roster has ever been stored.
    pub fn list(&self) -> Result<Vec<Person>> {
        let raw = self.store.get(PEOPLE_KEY)?.ok_or(StoreError::NotReady)?;
        Ok(serde_json::from_str(&raw)?)
    }

    /// Resolve a person by name.
    ///
    /// # Errors
    ///
    /// - `StoreError::NotFound` if nobody has that name.
    /// - `StoreError::DataCorruption` if several people share it, which means the
    ///   stored roster bypassed validation.
    pub fn find_by_name(&self, name: &str) -> Result<Person> {
        let mut matches = self.list()?.into_iter().filter(|p| p.name == name);

        let person = matches
            .next()
            .ok_or_else(|| StoreError::not_found("person", name))?;

        if matches.next().is_some() {
            tracing::error!(name = %name, "Stored people roster contains a duplicate name");
            return Err(StoreError::DataCorruption(format!(
                "duplicate person name in roster: {name}"
            )));
        }

        Ok(person)
    }

    /// Replace the whole roster.
    ///
    /// Validation happens before the single key write, so a rejected roster
    /// leaves the stored one untouched.
    ///
    /// # Errors
    ///
    /// - `StoreError::Unauthorized` if `credential` is not the admin secret, or
    ///   if no admin secret is configured.
    /// - `StoreError::Validation` if the roster is empty or has collisions.
    pub fn replace(&self, people: Vec<Person>, credential: &str) -> Result<()> {
        let authorized = !self.admin_secret.is_empty()
            && bool::from(credential.as_bytes().ct_eq(self.admin_secret.as_bytes()));
        if !authorized {
            tracing::warn!("People roster replacement with wrong admin credential");
            return Err(StoreError::Unauthorized);
        }

        validate_roster(&people)?;

        let value = serde_json::to_string(&people)?;
        self.store.put(PEOPLE_KEY, &value)?;

        tracing::info!(count = people.len(), "People roster replaced");

        Ok(())
    }
}
