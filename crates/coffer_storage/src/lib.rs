//! Content-addressable file storage for Coffer.
//!
//! Uploads are stored once per distinct content, named by their SHA-256 hash,
//! while per-upload metadata is handed to a pluggable [`MetadataStore`].
//!
//! # Features
//!
//! - **Deduplication**: identical bytes are written to disk once, however many
//!   records point at them
//! - **Rollback**: a file written for a record the store refuses is removed again
//! - **Stable URLs**: record ids map to public URLs under a configured mask
//! - **Coalesced saves**: concurrent uploads of the same content are serialized
//!
//! # Example
//!
//! ```rust
//! use coffer_storage::{FileStore, InMemoryMetadataStore, MemoryUpload, SaveOptions, StorageConfig};
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let config = StorageConfig::new("/tmp/coffer", "https://cdn.example/files");
//! let store = FileStore::new(config, InMemoryMetadataStore::new())?;
//!
//! let upload = MemoryUpload::new("report.pdf", b"%PDF-1.7 ...".to_vec());
//! let file = store
//!     .save_file(&upload, SaveOptions::default().with_file_path("/reports"))
//!     .await?;
//!
//! assert_eq!(file.extension, ".pdf");
//! assert_eq!(store.url_to_id(file.url.as_deref().unwrap()), Some(file.id.clone()));
//!
//! let bytes = store.read_file(&file.id).await?;
//! assert_eq!(bytes, upload_bytes());
//! # Ok(())
//! # }
//! # fn upload_bytes() -> Vec<u8> { b"%PDF-1.7 ...".to_vec() }
//! ```

mod codec;
mod config;
mod disk;
mod extension;
mod file_store;
mod file_type;
mod hash;
mod in_flight;
mod memory;
mod metadata;
mod stored_file;
mod upload;

pub use codec::PathCodec;
pub use coffer_error::{CofferError, CofferErrorKind, CofferResult, StorageError, StorageErrorKind};
pub use config::StorageConfig;
pub use disk::{DiskSpace, DiskUsage};
pub use extension::{decode_name, resolve_extension};
pub use file_store::{FileStore, SaveOptions};
pub use file_type::FileType;
pub use hash::content_hash;
pub use memory::InMemoryMetadataStore;
pub use metadata::MetadataStore;
pub use stored_file::{FileId, ResolvedFile, StoredFile, ROOT_PATH};
pub use upload::{MemoryUpload, Upload};
