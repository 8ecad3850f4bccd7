//! Tests for the save, dedup and rollback pipeline.

use async_trait::async_trait;
use coffer_error::{CofferResult, MetadataError};
use coffer_storage::{
    content_hash, FileId, FileStore, FileType, InMemoryMetadataStore, MemoryUpload,
    MetadataStore, SaveOptions, StorageConfig, StorageError, StorageErrorKind, StoredFile, Upload,
};
use std::path::Path;
use std::sync::atomic::{AtomicUsize, Ordering};
use tempfile::TempDir;

/// Upload that counts how often it is written to disk.
struct CountingUpload {
    inner: MemoryUpload,
    writes: AtomicUsize,
}

impl CountingUpload {
    fn new(name: &str, data: &[u8]) -> Self {
        Self {
            inner: MemoryUpload::new(name, data.to_vec()),
            writes: AtomicUsize::new(0),
        }
    }

    fn writes(&self) -> usize {
        self.writes.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl Upload for CountingUpload {
    fn name(&self) -> &str {
        self.inner.name()
    }

    fn bytes(&self) -> &[u8] {
        self.inner.bytes()
    }

    async fn persist_to(&self, dest: &Path) -> Result<(), StorageError> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.persist_to(dest).await
    }
}

/// Store whose creates always fail.
#[derive(Default)]
struct RejectingStore {
    inner: InMemoryMetadataStore,
}

#[async_trait]
impl MetadataStore for RejectingStore {
    async fn get_file_by_id(&self, id: &FileId) -> CofferResult<Option<StoredFile>> {
        self.inner.get_file_by_id(id).await
    }

    async fn get_file_by_hash(&self, hash: &str) -> CofferResult<Option<StoredFile>> {
        self.inner.get_file_by_hash(hash).await
    }

    async fn create_file(&self, _file: StoredFile) -> CofferResult<StoredFile> {
        Err(MetadataError::new("database is read-only").into())
    }
}

/// Store whose lookups fail.
struct UnreachableStore;

#[async_trait]
impl MetadataStore for UnreachableStore {
    async fn get_file_by_id(&self, _id: &FileId) -> CofferResult<Option<StoredFile>> {
        Err(MetadataError::new("connection refused").into())
    }

    async fn get_file_by_hash(&self, _hash: &str) -> CofferResult<Option<StoredFile>> {
        Err(MetadataError::new("connection refused").into())
    }

    async fn create_file(&self, _file: StoredFile) -> CofferResult<StoredFile> {
        Err(MetadataError::new("connection refused").into())
    }
}

fn file_store(temp_dir: &TempDir) -> FileStore<InMemoryMetadataStore> {
    let config = StorageConfig::new(temp_dir.path().join("uploads"), "https://cdn.x/files");
    FileStore::new(config, InMemoryMetadataStore::new()).unwrap()
}

fn files_on_disk(root: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(root)
        .unwrap()
        .map(|entry| entry.unwrap().file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

#[tokio::test]
async fn test_save_new_file() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let data = b"%PDF-1.7 quarterly numbers";
    let hash = content_hash(data);

    let upload = MemoryUpload::new("report.pdf", data.to_vec());
    let file = store.save_file(&upload, SaveOptions::default()).await.unwrap();

    assert_eq!(file.hash, hash);
    assert_eq!(file.extension, ".pdf");
    assert_eq!(file.file_type, FileType::Document);
    assert_eq!(file.size, data.len() as u64);
    assert_eq!(file.path, "/");
    assert_eq!(file.name, "report.pdf");
    assert_eq!(file.url, Some(format!("https://cdn.x/files/{}", file.id)));

    let physical = store.codec().physical_path(&hash, ".pdf");
    assert!(physical.ends_with(format!("{}.pdf", hash)));
    assert_eq!(std::fs::read(&physical).unwrap(), data);

    let record = store.metadata().get_file_by_id(&file.id).await.unwrap().unwrap();
    assert_eq!(record.url, None);
    assert_eq!(record.hash, hash);
}

#[tokio::test]
async fn test_caller_supplied_id_and_fields() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let upload = MemoryUpload::new("avatar%20small.png", b"not really a png".to_vec());
    let options = SaveOptions::default()
        .with_id("user-42-avatar")
        .with_file_path("/avatars")
        .with_field("owner", "user-42");
    let file = store.save_file(&upload, options).await.unwrap();

    assert_eq!(file.id, FileId::from("user-42-avatar"));
    assert_eq!(file.name, "avatar small.png");
    assert_eq!(file.path, "/avatars");
    assert_eq!(file.extra["owner"], "user-42");
    assert_eq!(file.url.as_deref(), Some("https://cdn.x/files/user-42-avatar"));
}

#[tokio::test]
async fn test_same_content_same_path_returns_existing() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let first_upload = CountingUpload::new("a.txt", b"identical bytes");
    let first = store.save_file(&first_upload, SaveOptions::default()).await.unwrap();

    let second_upload = CountingUpload::new("a.txt", b"identical bytes");
    let second = store.save_file(&second_upload, SaveOptions::default()).await.unwrap();

    assert_eq!(second, first);
    assert_eq!(first_upload.writes(), 1);
    assert_eq!(second_upload.writes(), 0);
    assert_eq!(store.metadata().len().await, 1);
    assert_eq!(files_on_disk(store.codec().root()).len(), 1);
}

#[tokio::test]
async fn test_same_content_different_paths() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let data = b"shared content";

    let first = store
        .save_file(
            &MemoryUpload::new("a.txt", data.to_vec()),
            SaveOptions::default().with_file_path("/inbox"),
        )
        .await
        .unwrap();
    let second_upload = CountingUpload::new("b.txt", data);
    let second = store
        .save_file(&second_upload, SaveOptions::default().with_file_path("/archive"))
        .await
        .unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(first.hash, second.hash);
    assert_eq!(second.path, "/archive");
    assert_eq!(second_upload.writes(), 0);
    assert_eq!(store.metadata().files_with_hash(&first.hash).await.len(), 2);
    assert_eq!(files_on_disk(store.codec().root()).len(), 1);
}

#[tokio::test]
async fn test_known_content_reuses_existing_attributes() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let data = b"same bytes, different names";

    let first = store
        .save_file(
            &MemoryUpload::new("notes.txt", data.to_vec()),
            SaveOptions::default(),
        )
        .await
        .unwrap();
    let second = store
        .save_file(
            &MemoryUpload::new("notes.mp3", data.to_vec()),
            SaveOptions::default().with_file_path("/music"),
        )
        .await
        .unwrap();

    assert_eq!(second.name, "notes.mp3");
    assert_eq!(second.extension, first.extension);
    assert_eq!(second.file_type, FileType::Document);
    assert_eq!(second.size, first.size);

    let resolved = store.resolve_file_path(&second.id).await.unwrap();
    assert!(resolved.file_path.exists());
    assert_eq!(resolved.file_name, "notes.mp3");
}

#[tokio::test]
async fn test_duplicates_allowed() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::new(temp_dir.path(), "/files").with_allow_duplicates(true);
    let store = FileStore::new(config, InMemoryMetadataStore::new()).unwrap();

    let upload = CountingUpload::new("a.txt", b"again and again");
    let first = store.save_file(&upload, SaveOptions::default()).await.unwrap();
    let second = store.save_file(&upload, SaveOptions::default()).await.unwrap();

    assert_ne!(first.id, second.id);
    assert_eq!(upload.writes(), 1);
    assert_eq!(store.metadata().len().await, 2);
}

#[tokio::test]
async fn test_failed_create_removes_new_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::new(temp_dir.path(), "/files");
    let store = FileStore::new(config, RejectingStore::default()).unwrap();
    let data = b"never recorded";

    let result = store
        .save_file(&MemoryUpload::new("x.bin", data.to_vec()), SaveOptions::default())
        .await;

    let err = result.unwrap_err();
    assert!(matches!(
        err.storage_kind(),
        Some(StorageErrorKind::PersistenceFailure(_))
    ));
    assert!(!store.codec().physical_path(&content_hash(data), ".bin").exists());
    assert!(files_on_disk(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_failed_create_keeps_existing_file() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::new(temp_dir.path(), "/files");
    let data = b"already referenced";

    // Seed a record and its file through a working store
    let seeded = FileStore::new(config.clone(), InMemoryMetadataStore::new()).unwrap();
    let existing = seeded
        .save_file(&MemoryUpload::new("x.bin", data.to_vec()), SaveOptions::default())
        .await
        .unwrap();

    let rejecting = RejectingStore {
        inner: seeded.metadata().clone(),
    };
    let store = FileStore::new(config, rejecting).unwrap();
    let result = store
        .save_file(
            &MemoryUpload::new("x.bin", data.to_vec()),
            SaveOptions::default().with_file_path("/elsewhere"),
        )
        .await;

    assert!(result.is_err());
    assert!(store
        .codec()
        .physical_path(&existing.hash, &existing.extension)
        .exists());
}

#[tokio::test]
async fn test_lookup_failure_surfaces_without_writing() {
    let temp_dir = TempDir::new().unwrap();
    let config = StorageConfig::new(temp_dir.path(), "/files");
    let store = FileStore::new(config, UnreachableStore).unwrap();

    let upload = CountingUpload::new("x.bin", b"payload");
    let err = store.save_file(&upload, SaveOptions::default()).await.unwrap_err();

    assert!(matches!(
        err.storage_kind(),
        Some(StorageErrorKind::UpstreamUnavailable(_))
    ));
    assert_eq!(upload.writes(), 0);
    assert!(files_on_disk(temp_dir.path()).is_empty());
}

#[tokio::test]
async fn test_sniffed_extension() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let png = [0x89, 0x50, 0x4E, 0x47, 0x0D, 0x0A, 0x1A, 0x0A, 0x00];

    let file = store
        .save_file(&MemoryUpload::new("pasted-image", png.to_vec()), SaveOptions::default())
        .await
        .unwrap();

    assert_eq!(file.extension, ".png");
    assert_eq!(file.file_type, FileType::Image);
    assert!(store.codec().physical_path(&file.hash, ".png").exists());
}

#[tokio::test]
async fn test_concurrent_identical_uploads_coalesce() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let upload = CountingUpload::new("burst.txt", b"uploaded by many clients at once");

    let saves = (0..8).map(|_| store.save_file(&upload, SaveOptions::default()));
    let results = futures::future::join_all(saves).await;

    let ids: Vec<FileId> = results.into_iter().map(|r| r.unwrap().id).collect();
    assert!(ids.iter().all(|id| id == &ids[0]));
    assert_eq!(upload.writes(), 1);
    assert_eq!(store.metadata().len().await, 1);
}

#[tokio::test]
async fn test_read_file_verifies_content() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let data = b"original data";

    let file = store
        .save_file(&MemoryUpload::new("d.txt", data.to_vec()), SaveOptions::default())
        .await
        .unwrap();
    assert_eq!(store.read_file(&file.id).await.unwrap(), data);

    let path = store.codec().physical_path(&file.hash, &file.extension);
    tokio::fs::write(&path, b"corrupted data").await.unwrap();

    let err = store.read_file(&file.id).await.unwrap_err();
    assert!(matches!(
        err.storage_kind(),
        Some(StorageErrorKind::HashMismatch { .. })
    ));
}

#[tokio::test]
async fn test_read_unknown_id() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let err = store.read_file(&FileId::from("missing")).await.unwrap_err();
    assert!(err.is_not_found());
}

#[tokio::test]
async fn test_repeat_save_at_second_path_is_deduplicated() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);
    let data = b"filed under two folders";

    let mut saved = Vec::new();
    for path in ["/a", "/b", "/b", "/b"] {
        let file = store
            .save_file(
                &MemoryUpload::new("memo.txt", data.to_vec()),
                SaveOptions::default().with_file_path(path),
            )
            .await
            .unwrap();
        saved.push(file);
    }

    let records = store.metadata().files_with_hash(&content_hash(data)).await;
    assert_eq!(records.len(), 2);
    assert_eq!(records.iter().filter(|f| f.path == "/b").count(), 1);
    assert_eq!(saved[2].id, saved[1].id);
    assert_eq!(saved[3].id, saved[1].id);
}

#[tokio::test]
async fn test_reserved_field_rejected_before_writing() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let upload = CountingUpload::new("invoice.pdf", b"%PDF-1.7 invoice");
    let err = store
        .save_file(&upload, SaveOptions::default().with_field("type", "invoice"))
        .await
        .unwrap_err();

    assert!(matches!(
        err.storage_kind(),
        Some(StorageErrorKind::ReservedField(key)) if key == "type"
    ));
    assert_eq!(upload.writes(), 0);
    assert!(store.metadata().is_empty().await);
}

#[tokio::test]
async fn test_saved_record_survives_json_round_trip() {
    let temp_dir = TempDir::new().unwrap();
    let store = file_store(&temp_dir);

    let file = store
        .save_file(
            &MemoryUpload::new("invoice.pdf", b"%PDF-1.7 invoice".to_vec()),
            SaveOptions::default()
                .with_field("invoice_type", "credit")
                .with_field("amount", 125),
        )
        .await
        .unwrap();

    let json = serde_json::to_string(&file).unwrap();
    let back: StoredFile = serde_json::from_str(&json).unwrap();
    assert_eq!(back, file);
    assert_eq!(back.extra["invoice_type"], "credit");
}
