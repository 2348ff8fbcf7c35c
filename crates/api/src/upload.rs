//! Multipart upload handling shared by the attachment and evidence endpoints.
//!
//! Every `file` part is validated (type and size) before any of them is
//! stored, so a rejected batch leaves nothing behind in the blob store.

use std::collections::HashMap;

use axum::body::Bytes;
use axum::extract::Multipart;
use gemellifix_core::storage::{blob_path, validate_upload};
use gemellifix_core::types::Attachment;

use crate::error::{AppError, AppResult};
use crate::storage::{BlobStore, StorageError};

/// Name of the multipart part that carries a file. Repeat it for several files.
pub const FILE_FIELD: &str = "file";

/// How many later timestamps a file may try when its path is taken.
const MAX_PATH_ATTEMPTS: usize = 32;

#[derive(Debug)]
pub struct UploadedFile {
    pub filename: String,
    pub content_type: String,
    pub bytes: Bytes,
}

/// A parsed multipart form: the files plus any plain text fields.
#[derive(Debug, Default)]
pub struct UploadForm {
    pub files: Vec<UploadedFile>,
    pub fields: HashMap<String, String>,
}

impl UploadForm {
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }
}

/// Read every part of `multipart`. Files are checked against the allowed
/// types and the size limit as they arrive.
pub async fn read_form(mut multipart: Multipart) -> AppResult<UploadForm> {
    let mut form = UploadForm::default();

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().unwrap_or("").to_string();
        if name == FILE_FIELD {
            let filename = field.file_name().unwrap_or("archivo").to_string();
            let content_type = field
                .content_type()
                .unwrap_or("application/octet-stream")
                .to_string();
            let bytes = field.bytes().await?;
            validate_upload(&content_type, bytes.len())?;
            form.files.push(UploadedFile {
                filename,
                content_type,
                bytes,
            });
        } else if !name.is_empty() {
            let text = field.text().await?;
            form.fields.insert(name, text);
        }
    }

    Ok(form)
}

/// Store each file under `prefix` and describe it as an [`Attachment`].
///
/// The description is the original file name. Each file takes its own
/// millisecond, starting from now; a path already taken by another upload
/// moves the file to the next free one.
pub async fn store_files(
    blobs: &dyn BlobStore,
    prefix: &str,
    files: &[UploadedFile],
) -> AppResult<Vec<Attachment>> {
    if files.is_empty() {
        return Err(AppError::BadRequest(format!(
            "At least one '{FILE_FIELD}' part is required"
        )));
    }

    let mut timestamp = chrono::Utc::now().timestamp_millis();
    let mut stored = Vec::with_capacity(files.len());
    for file in files {
        let mut attempts = 0;
        let (path, url) = loop {
            let path = blob_path(prefix, timestamp, &file.filename);
            timestamp += 1;
            attempts += 1;
            match blobs.put(&path, &file.bytes).await {
                Ok(url) => break (path, url),
                Err(StorageError::AlreadyExists(_)) if attempts < MAX_PATH_ATTEMPTS => {}
                Err(e) => return Err(e.into()),
            }
        };
        tracing::debug!(path = %path, content_type = %file.content_type, "Stored upload");
        stored.push(Attachment {
            url,
            description: file.filename.clone(),
        });
    }
    Ok(stored)
}
