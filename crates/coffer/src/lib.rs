//! Coffer - Deduplicating File Storage
//!
//! Coffer stores uploaded files once per distinct content. Each physical file is
//! named after the SHA-256 of its bytes, while any number of metadata records
//! (name, logical folder, extra fields) point at it through a pluggable
//! [`MetadataStore`].
//!
//! # Quick Start
//!
//! ```rust,no_run
//! use coffer::{FileStore, InMemoryMetadataStore, MemoryUpload, SaveOptions, StorageConfig};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
//!     coffer::init_observability()?;
//!
//!     let store = FileStore::new(StorageConfig::load()?, InMemoryMetadataStore::new())?;
//!     let upload = MemoryUpload::new("invoice.pdf", std::fs::read("invoice.pdf")?);
//!
//!     let file = store.save_file(&upload, SaveOptions::default()).await?;
//!     println!("Saved {} at {:?}", file.name, file.url);
//!     Ok(())
//! }
//! ```
//!
//! # Architecture
//!
//! - `coffer-error` - Error types
//! - `coffer-storage` - Hashing, extension resolution, URL codec and the save pipeline
//!
//! This crate (`coffer`) re-exports both and adds logging setup.

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod observability;

pub use observability::{ObservabilityConfig, init_observability, init_observability_with_config};

pub use coffer_error::*;
pub use coffer_storage::{
    DiskSpace, DiskUsage, FileId, FileStore, FileType, InMemoryMetadataStore, MemoryUpload,
    MetadataStore, PathCodec, ROOT_PATH, ResolvedFile, SaveOptions, StorageConfig, StoredFile,
    Upload, content_hash, decode_name, resolve_extension,
};
