//! Content-addressable file store.
//!
//! Physical files live flat under the storage root, each named after the
//! SHA-256 of its content plus an extension:
//!
//! ```text
//! /var/lib/coffer/
//! ├── 2cf24dba5fb0a30e26e83b2ac5b9e29e1b161e5c1fa7425e73043362938b9824.pdf
//! ├── 9f86d081884c7d659a2feaa0c55ad015a3bf4f1b2b0b822cd15d6c15b0f00a08.png
//! └── e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855
//! ```
//!
//! Metadata records are owned by a [`MetadataStore`]. Any number of records may
//! point at one physical file; the file is written only the first time its
//! content is seen.

use crate::disk::{self, DiskUsage};
use crate::extension::{decode_name, resolve_extension};
use crate::hash::{content_hash, verify_hash};
use crate::in_flight::InFlight;
use crate::{
    FileId, FileType, MetadataStore, PathCodec, ResolvedFile, StorageConfig, StoredFile, Upload,
    ROOT_PATH,
};
use chrono::Utc;
use coffer_error::{CofferResult, StorageError, StorageErrorKind};
use serde_json::{Map, Value};
use std::path::{Path, PathBuf};

/// Per-call options for [`FileStore::save_file`].
#[derive(Debug, Clone, PartialEq, derive_setters::Setters)]
#[setters(prefix = "with_")]
pub struct SaveOptions {
    /// Logical folder for the record
    #[setters(into)]
    pub file_path: String,
    /// Id to use instead of a generated one
    #[setters(skip)]
    pub id: Option<FileId>,
    /// Extra fields merged into the record
    pub additional_data: Map<String, Value>,
}

impl Default for SaveOptions {
    fn default() -> Self {
        Self {
            file_path: ROOT_PATH.to_string(),
            id: None,
            additional_data: Map::new(),
        }
    }
}

impl SaveOptions {
    /// Use a caller-chosen id for the new record.
    pub fn with_id(mut self, id: impl Into<FileId>) -> Self {
        self.id = Some(id.into());
        self
    }

    /// Add one extra field to the record.
    pub fn with_field(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.additional_data.insert(key.into(), value.into());
        self
    }
}

/// Saves uploads by content hash and records them through a [`MetadataStore`].
///
/// # Example
///
/// ```no_run
/// use coffer_storage::{FileStore, InMemoryMetadataStore, MemoryUpload, SaveOptions, StorageConfig};
///
/// # async fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let config = StorageConfig::new("/tmp/coffer", "https://cdn.example/files");
/// let store = FileStore::new(config, InMemoryMetadataStore::new())?;
///
/// let upload = MemoryUpload::new("report.pdf", b"%PDF-1.7".to_vec());
/// let file = store.save_file(&upload, SaveOptions::default()).await?;
/// println!("{} -> {:?}", file.name, file.url);
/// # Ok(())
/// # }
/// ```
#[derive(Debug)]
pub struct FileStore<S> {
    config: StorageConfig,
    codec: PathCodec,
    metadata: S,
    in_flight: InFlight,
}

impl<S: MetadataStore> FileStore<S> {
    /// Create a file store over `metadata`.
    ///
    /// Creates the storage root if it doesn't exist.
    ///
    /// # Errors
    ///
    /// Returns error if the root directory cannot be created.
    #[tracing::instrument(skip(config, metadata), fields(root = %config.root().display()))]
    pub fn new(config: StorageConfig, metadata: S) -> CofferResult<Self> {
        std::fs::create_dir_all(config.root()).map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                config.root().display(),
                e
            )))
        })?;

        let codec = PathCodec::new(config.root().clone(), config.mask());
        tracing::info!(mask = %config.mask(), "Created file store");
        Ok(Self {
            config,
            codec,
            metadata,
            in_flight: InFlight::new(),
        })
    }

    /// Active configuration.
    pub fn config(&self) -> &StorageConfig {
        &self.config
    }

    /// Path and URL codec for this store.
    pub fn codec(&self) -> &PathCodec {
        &self.codec
    }

    /// The injected metadata store.
    pub fn metadata(&self) -> &S {
        &self.metadata
    }

    /// Public URL for a record id.
    pub fn id_to_url(&self, id: &FileId) -> String {
        self.codec.id_to_url(id)
    }

    /// Record id from a URL built by [`FileStore::id_to_url`].
    pub fn url_to_id(&self, url: &str) -> Option<FileId> {
        self.codec.url_to_id(url)
    }

    /// Save an upload, writing its bytes only if the content is new.
    ///
    /// A record is created unless a record with the same hash already sits at
    /// `options.file_path` and duplicates are disallowed; in that case the
    /// existing record is returned unchanged.
    ///
    /// # Errors
    ///
    /// - `ReservedField` if `options.additional_data` names a record field
    /// - `UpstreamUnavailable` if a lookup or the disk write fails
    /// - `PersistenceFailure` if the metadata store rejects the new record; a
    ///   file written by this call is removed first
    #[tracing::instrument(
        skip(self, upload, options),
        fields(name = upload.name(), size = upload.bytes().len(), file_path = %options.file_path)
    )]
    pub async fn save_file<U>(&self, upload: &U, options: SaveOptions) -> CofferResult<StoredFile>
    where
        U: Upload + ?Sized,
    {
        reject_reserved_fields(&options.additional_data)?;

        let data = upload.bytes();
        let hash = content_hash(data);
        let _guard = self.in_flight.acquire(&hash).await;

        let existing = self.metadata.get_file_by_hash(&hash).await.map_err(|e| {
            StorageError::new(StorageErrorKind::UpstreamUnavailable(format!(
                "lookup by hash {}: {}",
                hash, e
            )))
        })?;
        let is_novel = existing.is_none();

        // Records for known content inherit its extension so every record names the one physical copy
        let (extension, size, file_type) = match &existing {
            Some(file) => (file.extension.clone(), file.size, file.file_type),
            None => {
                let extension = resolve_extension(upload.name(), data);
                let file_type = FileType::for_extension(&extension);
                (extension, data.len() as u64, file_type)
            }
        };
        let disk_path = self.codec.physical_path(&hash, &extension);

        if is_novel {
            self.write_content(upload, &disk_path).await?;
            tracing::info!(
                hash = %hash,
                path = %disk_path.display(),
                size,
                "Stored new content"
            );
        } else {
            tracing::debug!(hash = %hash, "Content already stored, skipping write");
        }

        if !is_novel && !self.config.allow_duplicates() {
            let at_path = self
                .metadata
                .get_file_by_hash_and_path(&hash, &options.file_path)
                .await
                .map_err(|e| {
                    StorageError::new(StorageErrorKind::UpstreamUnavailable(format!(
                        "lookup by hash {} at {}: {}",
                        hash, options.file_path, e
                    )))
                })?;
            if let Some(existing) = at_path {
                tracing::info!(
                    id = %existing.id,
                    hash = %hash,
                    file_path = %existing.path,
                    "File already exists at this path, returning existing record"
                );
                return Ok(self.decorate(existing));
            }
        }

        let record = StoredFile {
            id: options.id.unwrap_or_else(|| self.metadata.generate_id()),
            name: decode_name(upload.name()).into_owned(),
            extension,
            hash: hash.clone(),
            size,
            file_type,
            last_modified: Utc::now(),
            path: options.file_path,
            url: None,
            extra: options.additional_data,
        };
        let id = record.id.clone();

        match self.metadata.create_file(record).await {
            Ok(created) => {
                tracing::info!(outcome = "success", id = %created.id, hash = %hash, "Saved file");
                Ok(self.decorate(created))
            }
            Err(e) => {
                tracing::error!(id = %id, hash = %hash, error = %e, "Failed to create file record");
                if is_novel {
                    self.remove_orphan(&disk_path).await;
                }
                Err(StorageError::new(StorageErrorKind::PersistenceFailure(format!(
                    "record {}: {}",
                    id, e
                )))
                .into())
            }
        }
    }

    /// Physical path and declared name for a record id.
    ///
    /// Returns `None` when no record exists. Lookup failures are logged and also
    /// yield `None`.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn resolve_file_path(&self, id: &FileId) -> Option<ResolvedFile> {
        match self.metadata.get_file_by_id(id).await {
            Ok(Some(file)) => Some(ResolvedFile {
                file_path: self.codec.physical_path(&file.hash, &file.extension),
                file_name: file.name,
            }),
            Ok(None) => {
                tracing::debug!("No record for id");
                None
            }
            Err(e) => {
                tracing::error!(error = %e, "Failed to look up file by id");
                None
            }
        }
    }

    /// Remove the physical file for a content hash.
    ///
    /// Metadata records pointing at it are left to the caller.
    ///
    /// # Errors
    ///
    /// - `InvalidPath` if `hash` is not a plain hex digest
    /// - `NotFound` if no file for `hash` exists
    #[tracing::instrument(skip(self), fields(hash = %hash))]
    pub async fn delete_file_by_hash(&self, hash: &str) -> CofferResult<()> {
        validate_hash(hash)?;
        let _guard = self.in_flight.acquire(hash).await;

        let matches = self.find_physical(hash).await?;
        if matches.is_empty() {
            return Err(
                StorageError::new(StorageErrorKind::NotFound(format!("hash {}", hash))).into(),
            );
        }

        for path in matches {
            remove_physical(&path).await?;
            tracing::info!(path = %path.display(), "Deleted file");
        }
        Ok(())
    }

    /// Remove the physical file behind a record id.
    ///
    /// The record itself stays in the metadata store; other records sharing
    /// the content will no longer resolve to bytes.
    ///
    /// # Errors
    ///
    /// `NotFound` if the id doesn't resolve or its file is already gone.
    /// Lookup failures are returned as they come from the store.
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn delete_file_by_id(&self, id: &FileId) -> CofferResult<()> {
        let file = self
            .metadata
            .get_file_by_id(id)
            .await?
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(format!("id {}", id))))?;
        let _guard = self.in_flight.acquire(&file.hash).await;

        let path = self.codec.physical_path(&file.hash, &file.extension);
        remove_physical(&path).await?;
        tracing::info!(path = %path.display(), hash = %file.hash, "Deleted file");
        Ok(())
    }

    /// Read a record's content, verifying it against the recorded hash.
    ///
    /// # Errors
    ///
    /// - `NotFound` if the record or its file is missing
    /// - `HashMismatch` if the bytes on disk were altered
    #[tracing::instrument(skip(self), fields(id = %id))]
    pub async fn read_file(&self, id: &FileId) -> CofferResult<Vec<u8>> {
        let file = self
            .metadata
            .get_file_by_id(id)
            .await?
            .ok_or_else(|| StorageError::new(StorageErrorKind::NotFound(format!("id {}", id))))?;
        let path = self.codec.physical_path(&file.hash, &file.extension);

        let data = tokio::fs::read(&path).await.map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
            } else {
                StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", path.display(), e)))
            }
        })?;

        verify_hash(&data, &file.hash)?;

        tracing::debug!(hash = %file.hash, size = data.len(), "Read file");
        Ok(data)
    }

    /// Whether a physical file for `hash` is present.
    pub async fn exists(&self, hash: &str) -> CofferResult<bool> {
        validate_hash(hash)?;
        Ok(!self.find_physical(hash).await?.is_empty())
    }

    /// Space on the filesystem holding the storage root.
    pub async fn get_disk_usage(&self) -> CofferResult<DiskUsage> {
        let root = self.codec.root().to_path_buf();
        let usage = tokio::task::spawn_blocking(move || disk::query(&root))
            .await
            .map_err(|e| {
                StorageError::new(StorageErrorKind::UpstreamUnavailable(format!(
                    "disk usage task: {}",
                    e
                )))
            })??;
        Ok(usage)
    }

    /// Remove temp files left behind by interrupted writes.
    ///
    /// Returns the number of files removed.
    #[tracing::instrument(skip(self))]
    pub async fn cleanup_temp_files(&self) -> CofferResult<usize> {
        let mut cleaned = 0;
        for path in self.scan_root(is_temp_name).await? {
            remove_physical(&path).await?;
            cleaned += 1;
        }
        if cleaned > 0 {
            tracing::info!(cleaned, "Removed leftover temp files");
        }
        Ok(cleaned)
    }

    fn decorate(&self, file: StoredFile) -> StoredFile {
        let url = self.codec.id_to_url(&file.id);
        file.with_url(url)
    }

    async fn write_content<U>(&self, upload: &U, disk_path: &Path) -> CofferResult<()>
    where
        U: Upload + ?Sized,
    {
        let root = self.codec.root();
        tokio::fs::create_dir_all(root).await.map_err(|e| {
            StorageError::new(StorageErrorKind::DirectoryCreation(format!(
                "{}: {}",
                root.display(),
                e
            )))
        })?;

        upload.persist_to(disk_path).await.map_err(|e| {
            StorageError::new(StorageErrorKind::UpstreamUnavailable(format!(
                "persist {}: {}",
                disk_path.display(),
                e
            )))
        })?;
        Ok(())
    }

    /// Roll back a file written for a record that was never created.
    async fn remove_orphan(&self, disk_path: &Path) {
        match tokio::fs::remove_file(disk_path).await {
            Ok(()) => {
                tracing::info!(path = %disk_path.display(), "Removed file after failed record create")
            }
            Err(e) => tracing::error!(
                path = %disk_path.display(),
                error = %e,
                "Failed to remove orphaned file"
            ),
        }
    }

    async fn find_physical(&self, hash: &str) -> CofferResult<Vec<PathBuf>> {
        self.scan_root(|name| is_physical_name(name, hash)).await
    }

    /// Regular files directly under the root whose names satisfy `keep`.
    async fn scan_root(&self, keep: impl Fn(&str) -> bool) -> CofferResult<Vec<PathBuf>> {
        let root = self.codec.root();
        let read_error = |e: std::io::Error| {
            StorageError::new(StorageErrorKind::FileRead(format!("{}: {}", root.display(), e)))
        };

        let mut entries = tokio::fs::read_dir(root).await.map_err(read_error)?;
        let mut found = Vec::new();
        while let Some(entry) = entries.next_entry().await.map_err(read_error)? {
            let is_file = entry.file_type().await.map_err(read_error)?.is_file();
            let name = entry.file_name();
            if is_file && name.to_str().is_some_and(&keep) {
                found.push(entry.path());
            }
        }
        Ok(found)
    }
}

/// `hash` or `hash.ext`, where `ext` holds no further dots.
fn is_physical_name(name: &str, hash: &str) -> bool {
    match name.strip_prefix(hash) {
        Some("") => true,
        Some(rest) => rest
            .strip_prefix('.')
            .is_some_and(|ext| !ext.is_empty() && !ext.contains('.')),
        None => false,
    }
}

/// `<anything>.<32 hex>.tmp`, as produced by atomic writes.
fn is_temp_name(name: &str) -> bool {
    name.strip_suffix(".tmp")
        .and_then(|stem| stem.rsplit_once('.'))
        .is_some_and(|(_, tag)| tag.len() == 32 && tag.chars().all(|c| c.is_ascii_hexdigit()))
}

fn reject_reserved_fields(fields: &Map<String, Value>) -> Result<(), StorageError> {
    match fields.keys().find(|key| StoredFile::is_reserved_field(key)) {
        Some(key) => Err(StorageError::new(StorageErrorKind::ReservedField(key.clone()))),
        None => Ok(()),
    }
}

fn validate_hash(hash: &str) -> Result<(), StorageError> {
    if hash.is_empty() || !hash.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(StorageError::new(StorageErrorKind::InvalidPath(format!(
            "not a content hash: {:?}",
            hash
        ))));
    }
    Ok(())
}

async fn remove_physical(path: &Path) -> Result<(), StorageError> {
    tokio::fs::remove_file(path).await.map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            StorageError::new(StorageErrorKind::NotFound(path.display().to_string()))
        } else {
            StorageError::new(StorageErrorKind::FileWrite(format!(
                "delete {}: {}",
                path.display(),
                e
            )))
        }
    })
}
