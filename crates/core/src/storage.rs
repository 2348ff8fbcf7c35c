//! Upload rules and blob path layout.
//!
//! Every stored file lives at `{collection}/{timestamp-ms}-{filename}`, where
//! the collection is one of the prefixes below. Evidence and avatars add the
//! owning ticket or user id to the collection.

use crate::error::CoreError;
use crate::types::DbId;

/// Largest accepted upload (10 MiB).
pub const MAX_UPLOAD_BYTES: usize = 10 * 1024 * 1024;

pub const ALLOWED_CONTENT_TYPES: &[&str] =
    &["image/jpeg", "image/png", "image/webp", "application/pdf"];

/// Profile pictures accept images only.
pub const AVATAR_CONTENT_TYPES: &[&str] = &["image/jpeg", "image/png", "image/webp"];

pub const TICKET_ATTACHMENTS: &str = "ticket-attachments";
pub const REQUISITION_ATTACHMENTS: &str = "requisition-attachments";
const TICKET_EVIDENCE: &str = "ticket-evidence";
const AVATARS: &str = "avatars";

/// Evidence is grouped per ticket.
pub fn evidence_prefix(ticket_id: DbId) -> String {
    format!("{TICKET_EVIDENCE}/{ticket_id}")
}

pub fn avatar_prefix(user_id: DbId) -> String {
    format!("{AVATARS}/{user_id}")
}

/// `image/png; charset=binary` -> `image/png`.
fn base_content_type(content_type: &str) -> String {
    content_type
        .split(';')
        .next()
        .unwrap_or_default()
        .trim()
        .to_ascii_lowercase()
}

/// Reject uploads that are empty, too large, or of an unsupported type.
pub fn validate_upload(content_type: &str, size: usize) -> Result<(), CoreError> {
    if size == 0 {
        return Err(CoreError::validation("Uploaded file is empty"));
    }
    if size > MAX_UPLOAD_BYTES {
        return Err(CoreError::Validation(format!(
            "File exceeds the {} MB limit",
            MAX_UPLOAD_BYTES / (1024 * 1024)
        )));
    }
    if !ALLOWED_CONTENT_TYPES.contains(&base_content_type(content_type).as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported file type '{content_type}'. Allowed: JPG, PNG, WEBP, PDF"
        )));
    }
    Ok(())
}

/// An avatar passes [`validate_upload`] and is an image.
pub fn validate_avatar(content_type: &str, size: usize) -> Result<(), CoreError> {
    validate_upload(content_type, size)?;
    if !AVATAR_CONTENT_TYPES.contains(&base_content_type(content_type).as_str()) {
        return Err(CoreError::Validation(format!(
            "Unsupported avatar type '{content_type}'. Allowed: JPG, PNG, WEBP"
        )));
    }
    Ok(())
}

/// Reduce a client-supplied filename to a safe single path segment.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, and leading dots are removed so the result is never hidden
/// or a parent reference.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '_' | '-') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Full blob path for an upload.
pub fn blob_path(prefix: &str, timestamp_ms: i64, filename: &str) -> String {
    format!("{prefix}/{timestamp_ms}-{}", sanitize_filename(filename))
}
