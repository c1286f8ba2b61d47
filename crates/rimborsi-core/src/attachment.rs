//! Attachment hygiene: content types, file names and size estimates.

use crate::error::ValidationError;
use crate::ids::EntryId;

/// Content type used when the caller does not provide one.
pub const DEFAULT_CONTENT_TYPE: &str = "application/octet-stream";

/// Extension used when none can be derived from the content type.
pub const FALLBACK_EXTENSION: &str = "bin";

/// Default per-entry attachment budget in decoded bytes (6 MiB).
pub const DEFAULT_MAX_ENTRY_BYTES: u64 = 6 * 1024 * 1024;

/// Longest extension taken verbatim from a subtype.
const MAX_EXTENSION_LEN: usize = 8;

/// Longest accepted file name, in bytes.
const MAX_FILE_NAME_LEN: usize = 255;

/// Estimate the decoded size of a base64 payload.
#[must_use]
pub fn decoded_size_estimate(base64: &str) -> u64 {
    (base64.len() as u64).saturating_mul(3) / 4
}

fn is_token_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || "!#$&-^_.+".contains(c)
}

fn is_token(s: &str) -> bool {
    s.chars().next().is_some_and(|c| c.is_ascii_alphanumeric()) && s.chars().all(is_token_char)
}

/// Validate and normalize a MIME-like content type.
///
/// `None` or a blank string yields [`DEFAULT_CONTENT_TYPE`]. Otherwise the
/// value must be `type/subtype` made of token characters; it is returned
/// trimmed and lowercased.
///
/// # Errors
///
/// Returns `ValidationError::InvalidContentType` for anything else, including
/// values carrying parameters (`text/plain; charset=utf-8`).
pub fn normalize_content_type(content_type: Option<&str>) -> Result<String, ValidationError> {
    let Some(raw) = content_type.map(str::trim).filter(|s| !s.is_empty()) else {
        return Ok(DEFAULT_CONTENT_TYPE.to_string());
    };

    let lowered = raw.to_ascii_lowercase();
    match lowered.split_once('/') {
        Some((kind, subtype)) if is_token(kind) && is_token(subtype) => Ok(lowered),
        _ => Err(ValidationError::InvalidContentType(raw.to_string())),
    }
}

/// Derive a file extension from a normalized content type.
///
/// Structured suffixes are dropped (`image/svg+xml` → `svg`) and a few common
/// subtypes are mapped to their usual extension. Anything that is not a short
/// alphanumeric word falls back to [`FALLBACK_EXTENSION`].
#[must_use]
pub fn extension_for(content_type: &str) -> &str {
    let subtype = content_type
        .split_once('/')
        .map_or("", |(_, subtype)| subtype);
    let subtype = subtype.split('+').next().unwrap_or_default();

    match subtype {
        "jpeg" | "pjpeg" => "jpg",
        "plain" => "txt",
        "octet-stream" => FALLBACK_EXTENSION,
        s if !s.is_empty()
            && s.len() <= MAX_EXTENSION_LEN
            && s.chars().all(|c| c.is_ascii_alphanumeric()) =>
        {
            s
        }
        _ => FALLBACK_EXTENSION,
    }
}

/// Validate a caller-supplied file name.
///
/// # Errors
///
/// Returns `ValidationError::InvalidFileName` if the name is blank, `.` or
/// `..`, too long, or contains a path separator or control character.
pub fn validate_file_name(name: &str) -> Result<(), ValidationError> {
    let trimmed = name.trim();
    let bad = trimmed.is_empty()
        || trimmed == "."
        || trimmed == ".."
        || name.len() > MAX_FILE_NAME_LEN
        || name.chars().any(|c| c == '/' || c == '\\' || c.is_control());

    if bad {
        return Err(ValidationError::InvalidFileName(name.to_string()));
    }
    Ok(())
}

/// File name used when the caller did not supply one.
#[must_use]
pub fn default_file_name(id: &EntryId, content_type: &str) -> String {
    format!("{id}.{}", extension_for(content_type))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn size_estimate_is_three_quarters() {
        assert_eq!(decoded_size_estimate(""), 0);
        assert_eq!(decoded_size_estimate("AAAA"), 3);
        assert_eq!(decoded_size_estimate(&"A".repeat(8)), 6);
    }

    #[test]
    fn missing_content_type_defaults() {
        assert_eq!(normalize_content_type(None).unwrap(), DEFAULT_CONTENT_TYPE);
        assert_eq!(
            normalize_content_type(Some("  ")).unwrap(),
            DEFAULT_CONTENT_TYPE
        );
    }

    #[test]
    fn content_type_is_normalized() {
        assert_eq!(
            normalize_content_type(Some(" Image/PNG ")).unwrap(),
            "image/png"
        );
        assert_eq!(
            normalize_content_type(Some("image/svg+xml")).unwrap(),
            "image/svg+xml"
        );
    }

    #[test]
    fn malformed_content_types_are_rejected() {
        for bad in ["pdf", "image/", "/png", "a/b/c", "text/plain; charset=utf-8", "<x>/y"] {
            assert!(
                normalize_content_type(Some(bad)).is_err(),
                "{bad} should be rejected"
            );
        }
    }

    #[test]
    fn extensions() {
        assert_eq!(extension_for("application/pdf"), "pdf");
        assert_eq!(extension_for("image/jpeg"), "jpg");
        assert_eq!(extension_for("image/svg+xml"), "svg");
        assert_eq!(extension_for("text/plain"), "txt");
        assert_eq!(extension_for(DEFAULT_CONTENT_TYPE), "bin");
        assert_eq!(
            extension_for("application/vnd.openxmlformats-officedocument.spreadsheetml.sheet"),
            "bin"
        );
        assert_eq!(extension_for("garbage"), "bin");
    }

    #[test]
    fn file_names() {
        assert!(validate_file_name("scontrino.pdf").is_ok());
        assert!(validate_file_name("ricevuta taxi.jpg").is_ok());
        assert!(validate_file_name("../etc/passwd").is_err());
        assert!(validate_file_name("a\\b.pdf").is_err());
        assert!(validate_file_name("..").is_err());
        assert!(validate_file_name("").is_err());
    }

    #[test]
    fn default_name_uses_entry_id() {
        let id: EntryId = "abc".parse().unwrap();
        assert_eq!(default_file_name(&id, "application/pdf"), "abc.pdf");
        assert_eq!(default_file_name(&id, DEFAULT_CONTENT_TYPE), "abc.bin");
    }
}
