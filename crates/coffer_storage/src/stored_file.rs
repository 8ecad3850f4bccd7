//! Metadata record types.

use crate::FileType;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::path::PathBuf;

/// Logical path used when the caller does not supply one.
pub const ROOT_PATH: &str = "/";

/// Opaque identifier of a metadata record.
///
/// Stores may use string or numeric keys; both are carried as their string form.
#[derive(
    Debug,
    Clone,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    derive_more::Display,
    derive_more::From,
)]
#[serde(transparent)]
pub struct FileId(String);

impl FileId {
    /// Create an id from any string-like value.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// The id as a string slice.
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<&str> for FileId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl From<u64> for FileId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

/// A persisted metadata record for one logical file.
///
/// Several records may share a `hash`, in which case they point at the same
/// physical file `<hash><extension>` under the storage root.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StoredFile {
    /// Unique identifier within the metadata store
    pub id: FileId,
    /// Original, decoded filename as declared by the uploader
    pub name: String,
    /// Leading-dot extension of the physical file, possibly empty
    pub extension: String,
    /// Hex SHA-256 of the content
    pub hash: String,
    /// Content length in bytes
    pub size: u64,
    /// Coarse category derived from the extension
    #[serde(rename = "type")]
    pub file_type: FileType,
    /// When this record was written
    pub last_modified: DateTime<Utc>,
    /// Caller-defined logical folder
    pub path: String,
    /// Public URL, derived from the id on read and never persisted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    /// Caller-supplied fields merged into the record
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl StoredFile {
    /// Serialized names of the record's own fields. Extra fields may not use them.
    pub const RESERVED_FIELDS: &'static [&'static str] = &[
        "id",
        "name",
        "extension",
        "hash",
        "size",
        "type",
        "last_modified",
        "path",
        "url",
    ];

    /// Whether `key` is taken by one of the record's own fields.
    pub fn is_reserved_field(key: &str) -> bool {
        Self::RESERVED_FIELDS.contains(&key)
    }

    /// Name of the physical file backing this record.
    pub fn physical_name(&self) -> String {
        format!("{}{}", self.hash, self.extension)
    }

    /// Attach a derived URL.
    pub fn with_url(mut self, url: impl Into<String>) -> Self {
        self.url = Some(url.into());
        self
    }
}

/// Physical location of a record's bytes plus its declared name.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedFile {
    /// Absolute path of the physical file
    pub file_path: PathBuf,
    /// Name the file was uploaded under
    pub file_name: String,
}
