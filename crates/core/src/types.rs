use serde::{Deserialize, Serialize};

/// Database primary keys (BIGSERIAL).
pub type DbId = i64;

/// UTC timestamp used for every stored instant.
pub type Timestamp = chrono::DateTime<chrono::Utc>;

/// A stored file referenced from a ticket or requisition.
///
/// `url` is the public URL returned by the blob store; `description` is the
/// original file name unless the uploader supplied one.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub url: String,
    pub description: String,
}
