//! Blob storage for uploaded attachments and evidence.
//!
//! Paths come from [`gemellifix_core::storage::blob_path`]; the store only
//! writes bytes and answers with the public URL.

use std::path::{Component, Path, PathBuf};

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;

#[derive(Debug, thiserror::Error)]
pub enum StorageError {
    #[error("Invalid blob path '{0}'")]
    InvalidPath(String),

    #[error("Blob '{0}' already exists")]
    AlreadyExists(String),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store `bytes` at `path` (relative, `/`-separated) and return the URL
    /// clients use to fetch it. An existing blob is never replaced:
    /// [`StorageError::AlreadyExists`].
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError>;
}

/// Writes under a local directory that the router serves at `public_url`.
#[derive(Debug, Clone)]
pub struct LocalBlobStore {
    root: PathBuf,
    public_url: String,
}

impl LocalBlobStore {
    pub fn new(root: impl Into<PathBuf>, public_url: impl Into<String>) -> Self {
        Self {
            root: root.into(),
            public_url: public_url.into().trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn resolve(&self, path: &str) -> Result<PathBuf, StorageError> {
        let relative = Path::new(path);
        let only_normal = relative
            .components()
            .all(|c| matches!(c, Component::Normal(_)));
        if path.is_empty() || !only_normal {
            return Err(StorageError::InvalidPath(path.to_string()));
        }
        Ok(self.root.join(relative))
    }
}

#[async_trait]
impl BlobStore for LocalBlobStore {
    async fn put(&self, path: &str, bytes: &[u8]) -> Result<String, StorageError> {
        let target = self.resolve(path)?;
        if let Some(parent) = target.parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let mut file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&target)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => {
                return Err(StorageError::AlreadyExists(path.to_string()));
            }
            Err(e) => return Err(e.into()),
        };
        file.write_all(bytes).await?;
        file.flush().await?;
        tracing::debug!(path, size = bytes.len(), "Stored blob");
        Ok(format!("{}/{path}", self.public_url))
    }
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use axum::body::Bytes;
    use gemellifix_core::storage::{blob_path, TICKET_ATTACHMENTS};

    use super::*;
    use crate::upload::{store_files, UploadedFile};

    #[tokio::test]
    async fn put_writes_file_and_returns_url() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/files/");

        let url = store
            .put("ticket-evidence/9/1700000000000-foto.png", b"png-bytes")
            .await
            .unwrap();

        assert_eq!(url, "/files/ticket-evidence/9/1700000000000-foto.png");
        let written = tokio::fs::read(dir.path().join("ticket-evidence/9/1700000000000-foto.png"))
            .await
            .unwrap();
        assert_eq!(written, b"png-bytes");
    }

    #[tokio::test]
    async fn existing_blob_is_not_overwritten() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/files");

        store.put("ticket-attachments/1-image.jpg", b"first").await.unwrap();
        assert_matches!(
            store.put("ticket-attachments/1-image.jpg", b"second").await,
            Err(StorageError::AlreadyExists(_))
        );
        let kept = tokio::fs::read(dir.path().join("ticket-attachments/1-image.jpg"))
            .await
            .unwrap();
        assert_eq!(kept, b"first");
    }

    #[tokio::test]
    async fn same_named_files_in_one_batch_keep_their_own_content() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/files");
        let files = ["first", "second"].map(|body| UploadedFile {
            filename: "image.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from_static(body.as_bytes()),
        });

        let stored = store_files(&store, TICKET_ATTACHMENTS, &files).await.unwrap();

        assert_eq!(stored.len(), 2);
        assert_ne!(stored[0].url, stored[1].url);
        for (attachment, body) in stored.iter().zip(["first", "second"]) {
            assert_eq!(attachment.description, "image.jpg");
            let relative = attachment.url.trim_start_matches("/files/");
            let written = tokio::fs::read(dir.path().join(relative)).await.unwrap();
            assert_eq!(written, body.as_bytes());
        }
    }

    #[tokio::test]
    async fn clash_with_an_earlier_upload_moves_to_a_later_timestamp() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/files");
        let file = [UploadedFile {
            filename: "image.jpg".to_string(),
            content_type: "image/jpeg".to_string(),
            bytes: Bytes::from_static(b"new"),
        }];

        // Occupy the next few milliseconds with an older upload of the same name.
        let now = chrono::Utc::now().timestamp_millis();
        for offset in 0..3 {
            let path = blob_path(TICKET_ATTACHMENTS, now + offset, "image.jpg");
            store.put(&path, b"old").await.unwrap();
        }

        let stored = store_files(&store, TICKET_ATTACHMENTS, &file).await.unwrap();
        let relative = stored[0].url.trim_start_matches("/files/");
        let written = tokio::fs::read(dir.path().join(relative)).await.unwrap();
        assert_eq!(written, b"new");
    }

    #[tokio::test]
    async fn escaping_paths_are_refused() {
        let dir = tempfile::tempdir().unwrap();
        let store = LocalBlobStore::new(dir.path(), "/files");
        assert_matches!(
            store.put("../outside.txt", b"x").await,
            Err(StorageError::InvalidPath(_))
        );
        assert_matches!(
            store.put("/etc/passwd", b"x").await,
            Err(StorageError::InvalidPath(_))
        );
    }
}
