//! Metadata store capability.

use crate::{FileId, StoredFile};
use coffer_error::CofferResult;

/// Persistence backend for file metadata.
///
/// Implementations own the records; the file store only looks them up and
/// creates new ones. Absence is reported as `Ok(None)`. Any `Err` is treated as
/// a failure of the backend, never as confirmation that a record is missing.
#[async_trait::async_trait]
pub trait MetadataStore: Send + Sync {
    /// Look up a record by id.
    async fn get_file_by_id(&self, id: &FileId) -> CofferResult<Option<StoredFile>>;

    /// Look up a record by content hash.
    ///
    /// When several records share the hash, any one of them may be returned.
    async fn get_file_by_hash(&self, hash: &str) -> CofferResult<Option<StoredFile>>;

    /// Look up a record by content hash within one logical path.
    ///
    /// Used to decide whether a save would duplicate an existing record. The
    /// default narrows [`MetadataStore::get_file_by_hash`], which only sees the
    /// one record that lookup returns; stores holding the same hash under
    /// several paths should override it.
    async fn get_file_by_hash_and_path(
        &self,
        hash: &str,
        path: &str,
    ) -> CofferResult<Option<StoredFile>> {
        Ok(self
            .get_file_by_hash(hash)
            .await?
            .filter(|file| file.path == path))
    }

    /// Persist a new record and return it as stored.
    ///
    /// The returned record may carry store-assigned fields. An error here makes
    /// the file store roll back any physical file written for the record.
    async fn create_file(&self, file: StoredFile) -> CofferResult<StoredFile>;

    /// Generate an id for a record the caller did not name.
    fn generate_id(&self) -> FileId {
        FileId::new(uuid::Uuid::new_v4().simple().to_string())
    }
}
