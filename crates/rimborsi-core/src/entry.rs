//! Expense entry types.

use std::borrow::Cow;

use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use serde::{Deserialize, Serialize};

use crate::attachment::{
    decoded_size_estimate, default_file_name, normalize_content_type, validate_file_name,
    DEFAULT_CONTENT_TYPE,
};
use crate::error::ValidationError;
use crate::ids::{EntryId, PersonId};

/// One expense record, as stored inside its (person, year) bucket.
///
/// The attachment itself is not part of the entry; it lives under a separate
/// content key so that bucket reads never carry attachment payloads.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Entry {
    /// Owner of the entry.
    pub uid: PersonId,
    /// Unique entry id.
    pub id: EntryId,
    /// Amount to reimburse.
    pub importo: f64,
    /// Expense date as entered by the caller.
    pub date: String,
    /// Normalized attachment content type.
    #[serde(default = "default_content_type")]
    pub content_file_type: String,
    /// Attachment file name. Empty for entries written before names were stored.
    #[serde(default)]
    pub content_file_name: String,
}

fn default_content_type() -> String {
    DEFAULT_CONTENT_TYPE.to_string()
}

impl Entry {
    /// The name the attachment should be served or archived under.
    #[must_use]
    pub fn file_name(&self) -> Cow<'_, str> {
        if self.content_file_name.is_empty() {
            Cow::Owned(default_file_name(&self.id, &self.content_file_type))
        } else {
            Cow::Borrowed(&self.content_file_name)
        }
    }
}

/// Caller-supplied fields for a new entry.
///
/// Every field is optional at the serde level so that missing values surface
/// as `ValidationError::MissingField` rather than as a body parse failure.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NewEntry {
    /// Expense date.
    #[serde(default)]
    pub date: String,
    /// Amount to reimburse.
    #[serde(default)]
    pub importo: Option<f64>,
    /// Base64 attachment.
    #[serde(default)]
    pub content: String,
    /// Attachment content type.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_file_type: Option<String>,
    /// Attachment file name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub content_file_name: Option<String>,
}

impl NewEntry {
    /// Validate the fields and turn them into an [`Entry`] plus its base64 content.
    ///
    /// Checks run cheapest first: required fields, the size budget, content type,
    /// file name, and finally base64 well-formedness.
    ///
    /// # Errors
    ///
    /// - `MissingField` when `date`, `importo` or `content` is absent or empty.
    /// - `InvalidAmount` when `importo` is zero or not finite.
    /// - `PayloadTooLarge` when the estimated decoded size exceeds `max_entry_bytes`.
    /// - `InvalidContentType`, `InvalidFileName`, `InvalidContent` on malformed input.
    pub fn prepare(
        self,
        uid: PersonId,
        id: EntryId,
        max_entry_bytes: u64,
    ) -> Result<(Entry, String), ValidationError> {
        if self.date.trim().is_empty() {
            return Err(ValidationError::MissingField("date"));
        }
        let importo = self.importo.ok_or(ValidationError::MissingField("importo"))?;
        if !importo.is_finite() || importo == 0.0 {
            return Err(ValidationError::InvalidAmount(importo.to_string()));
        }
        if self.content.is_empty() {
            return Err(ValidationError::MissingField("content"));
        }

        let size = decoded_size_estimate(&self.content);
        if size > max_entry_bytes {
            return Err(ValidationError::PayloadTooLarge {
                size,
                limit: max_entry_bytes,
            });
        }

        let content_file_type = normalize_content_type(self.content_file_type.as_deref())?;

        let content_file_name = match self.content_file_name.filter(|n| !n.trim().is_empty()) {
            Some(name) => {
                validate_file_name(&name)?;
                name
            }
            None => default_file_name(&id, &content_file_type),
        };

        STANDARD
            .decode(self.content.as_bytes())
            .map_err(|_| ValidationError::InvalidContent)?;

        let entry = Entry {
            uid,
            id,
            importo,
            date: self.date,
            content_file_type,
            content_file_name,
        };

        Ok((entry, self.content))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fields() -> NewEntry {
        NewEntry {
            date: "2024-03-01".into(),
            importo: Some(12.5),
            content: STANDARD.encode(b"%PDF-1.4 receipt"),
            content_file_type: Some("application/pdf".into()),
            content_file_name: None,
        }
    }

    fn id() -> EntryId {
        "abc".parse().unwrap()
    }

    #[test]
    fn prepare_derives_file_name() {
        let (entry, content) = fields().prepare(PersonId::new(3), id(), 1024).unwrap();
        assert_eq!(entry.content_file_name, "abc.pdf");
        assert_eq!(entry.content_file_type, "application/pdf");
        assert_eq!(entry.uid, PersonId::new(3));
        assert_eq!(content, STANDARD.encode(b"%PDF-1.4 receipt"));
    }

    #[test]
    fn prepare_keeps_supplied_file_name() {
        let mut f = fields();
        f.content_file_name = Some("taxi.pdf".into());
        let (entry, _) = f.prepare(PersonId::new(3), id(), 1024).unwrap();
        assert_eq!(entry.content_file_name, "taxi.pdf");
    }

    #[test]
    fn prepare_defaults_content_type() {
        let mut f = fields();
        f.content_file_type = None;
        let (entry, _) = f.prepare(PersonId::new(3), id(), 1024).unwrap();
        assert_eq!(entry.content_file_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(entry.content_file_name, "abc.bin");
    }

    #[test]
    fn prepare_rejects_missing_fields() {
        let mut f = fields();
        f.date = String::new();
        assert_eq!(
            f.prepare(PersonId::new(3), id(), 1024).unwrap_err(),
            ValidationError::MissingField("date")
        );

        let mut f = fields();
        f.importo = None;
        assert_eq!(
            f.prepare(PersonId::new(3), id(), 1024).unwrap_err(),
            ValidationError::MissingField("importo")
        );

        let mut f = fields();
        f.content = String::new();
        assert_eq!(
            f.prepare(PersonId::new(3), id(), 1024).unwrap_err(),
            ValidationError::MissingField("content")
        );
    }

    #[test]
    fn prepare_rejects_zero_amount() {
        let mut f = fields();
        f.importo = Some(0.0);
        assert!(matches!(
            f.prepare(PersonId::new(3), id(), 1024),
            Err(ValidationError::InvalidAmount(_))
        ));
    }

    #[test]
    fn prepare_enforces_budget_inclusively() {
        let mut f = fields();
        f.content = "A".repeat(16); // 12 decoded bytes
        assert!(f.clone().prepare(PersonId::new(3), id(), 12).is_ok());
        assert_eq!(
            f.prepare(PersonId::new(3), id(), 11).unwrap_err(),
            ValidationError::PayloadTooLarge { size: 12, limit: 11 }
        );
    }

    #[test]
    fn prepare_rejects_path_in_file_name() {
        let mut f = fields();
        f.content_file_name = Some("../secret.pdf".into());
        assert!(matches!(
            f.prepare(PersonId::new(3), id(), 1024),
            Err(ValidationError::InvalidFileName(_))
        ));
    }

    #[test]
    fn prepare_rejects_bad_base64() {
        let mut f = fields();
        f.content = "not base64!".into();
        assert_eq!(
            f.prepare(PersonId::new(3), id(), 1024).unwrap_err(),
            ValidationError::InvalidContent
        );
    }

    #[test]
    fn legacy_entries_without_attachment_fields_still_parse() {
        let entry: Entry =
            serde_json::from_str(r#"{"uid":1,"id":"abc","importo":3.5,"date":"2023-01-02"}"#)
                .unwrap();
        assert_eq!(entry.content_file_type, DEFAULT_CONTENT_TYPE);
        assert_eq!(entry.file_name(), "abc.bin");
    }

    #[test]
    fn entry_json_uses_camel_case() {
        let (entry, _) = fields().prepare(PersonId::new(3), id(), 1024).unwrap();
        let json = serde_json::to_value(&entry).unwrap();
        assert_eq!(json["contentFileType"], "application/pdf");
        assert_eq!(json["contentFileName"], "abc.pdf");
        assert_eq!(json["uid"], 3);
    }
}
