//! Upload sources.

use coffer_error::{StorageError, StorageErrorKind};
use std::path::Path;

/// A received upload: its declared name, its bytes, and a way to put those
/// bytes on disk.
///
/// The HTTP layer that received the upload usually implements this; its
/// `persist_to` may move an already-spooled temp file instead of writing.
#[async_trait::async_trait]
pub trait Upload: Send + Sync {
    /// Name declared by the uploader, possibly percent-encoded.
    fn name(&self) -> &str;

    /// Raw content.
    fn bytes(&self) -> &[u8];

    /// Write the content to `dest`.
    ///
    /// Implementations must not leave a partially written file at `dest`.
    async fn persist_to(&self, dest: &Path) -> Result<(), StorageError>;
}

/// Upload held entirely in memory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryUpload {
    name: String,
    data: Vec<u8>,
}

impl MemoryUpload {
    /// Create an upload from a declared name and its content.
    pub fn new(name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            data: data.into(),
        }
    }
}

#[async_trait::async_trait]
impl Upload for MemoryUpload {
    fn name(&self) -> &str {
        &self.name
    }

    fn bytes(&self) -> &[u8] {
        &self.data
    }

    async fn persist_to(&self, dest: &Path) -> Result<(), StorageError> {
        write_atomic(dest, &self.data).await
    }
}

/// Write to a sibling temp file, then rename into place.
pub(crate) async fn write_atomic(dest: &Path, data: &[u8]) -> Result<(), StorageError> {
    let temp_path = temp_path_for(dest);
    tokio::fs::write(&temp_path, data).await.map_err(|e| {
        StorageError::new(StorageErrorKind::FileWrite(format!(
            "{}: {}",
            temp_path.display(),
            e
        )))
    })?;

    if let Err(e) = tokio::fs::rename(&temp_path, dest).await {
        let _ = tokio::fs::remove_file(&temp_path).await;
        return Err(StorageError::new(StorageErrorKind::FileWrite(format!(
            "rename {} to {}: {}",
            temp_path.display(),
            dest.display(),
            e
        ))));
    }
    Ok(())
}

/// `<dest>.<uuid>.tmp`, unique so concurrent writers never share a temp file.
fn temp_path_for(dest: &Path) -> std::path::PathBuf {
    let mut name = dest.file_name().map(|n| n.to_os_string()).unwrap_or_default();
    name.push(format!(".{}.tmp", uuid::Uuid::new_v4().simple()));
    dest.with_file_name(name)
}
