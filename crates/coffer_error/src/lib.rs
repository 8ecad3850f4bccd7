//! Error types for the Coffer file store.
//!
//! # Error Hierarchy
//!
//! All errors follow the `ErrorKind` + wrapper struct pattern:
//! - `*ErrorKind` enum defines specific error conditions
//! - `*Error` struct wraps the kind with source location tracking
//! - All constructors use `#[track_caller]` for automatic location capture
//!
//! # Examples
//!
//! ```
//! use coffer_error::{CofferResult, StorageError, StorageErrorKind};
//!
//! fn delete(hash: &str) -> CofferResult<()> {
//!     Err(StorageError::new(StorageErrorKind::NotFound(hash.to_string())))?
//! }
//!
//! let err = delete("abc123").unwrap_err();
//! assert!(err.is_not_found());
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod config;
mod error;
mod metadata;
mod storage;

pub use config::ConfigError;
pub use error::{CofferError, CofferErrorKind, CofferResult};
pub use metadata::MetadataError;
pub use storage::{StorageError, StorageErrorKind};
