//! In-memory implementation of MetadataStore.
//!
//! Records live in a HashMap behind an RwLock and are lost when the store is
//! dropped. Useful for tests and for embedding without a database.

use crate::{FileId, MetadataStore, StoredFile};
use async_trait::async_trait;
use coffer_error::{CofferResult, MetadataError};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;

/// In-memory metadata store.
///
/// Clones share the same records.
///
/// # Example
/// ```no_run
/// use coffer_storage::{InMemoryMetadataStore, MetadataStore};
///
/// #[tokio::main]
/// async fn main() {
///     let store = InMemoryMetadataStore::new();
///     assert!(store.get_file_by_hash("abc").await.unwrap().is_none());
/// }
/// ```
#[derive(Debug, Clone, Default)]
pub struct InMemoryMetadataStore {
    files: Arc<RwLock<HashMap<FileId, StoredFile>>>,
}

impl InMemoryMetadataStore {
    /// Create a new empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored records.
    pub async fn len(&self) -> usize {
        self.files.read().await.len()
    }

    /// Whether the store holds no records.
    pub async fn is_empty(&self) -> bool {
        self.files.read().await.is_empty()
    }

    /// All records sharing a content hash.
    pub async fn files_with_hash(&self, hash: &str) -> Vec<StoredFile> {
        self.files
            .read()
            .await
            .values()
            .filter(|file| file.hash == hash)
            .cloned()
            .collect()
    }

    /// Remove a record, returning it if present.
    pub async fn remove(&self, id: &FileId) -> Option<StoredFile> {
        self.files.write().await.remove(id)
    }
}

#[async_trait]
impl MetadataStore for InMemoryMetadataStore {
    async fn get_file_by_id(&self, id: &FileId) -> CofferResult<Option<StoredFile>> {
        Ok(self.files.read().await.get(id).cloned())
    }

    async fn get_file_by_hash(&self, hash: &str) -> CofferResult<Option<StoredFile>> {
        let files = self.files.read().await;
        // Oldest record first so lookups are stable across calls
        Ok(files
            .values()
            .filter(|file| file.hash == hash)
            .min_by_key(|file| file.last_modified)
            .cloned())
    }

    async fn get_file_by_hash_and_path(
        &self,
        hash: &str,
        path: &str,
    ) -> CofferResult<Option<StoredFile>> {
        let files = self.files.read().await;
        Ok(files
            .values()
            .filter(|file| file.hash == hash && file.path == path)
            .min_by_key(|file| file.last_modified)
            .cloned())
    }

    async fn create_file(&self, file: StoredFile) -> CofferResult<StoredFile> {
        let mut files = self.files.write().await;
        if files.contains_key(&file.id) {
            return Err(MetadataError::new(format!("Duplicate file id: {}", file.id)).into());
        }
        // The derived URL is never persisted
        let stored = StoredFile { url: None, ..file };
        files.insert(stored.id.clone(), stored.clone());
        Ok(stored)
    }
}
