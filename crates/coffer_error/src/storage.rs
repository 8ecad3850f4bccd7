//! Storage error types.

/// Kinds of storage errors.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, derive_more::Display)]
pub enum StorageErrorKind {
    /// Failed to create the storage root
    #[display("Failed to create storage directory: {}", _0)]
    DirectoryCreation(String),
    /// Failed to write or remove a physical file
    #[display("Failed to write file: {}", _0)]
    FileWrite(String),
    /// Failed to read a physical file or scan the storage root
    #[display("Failed to read file: {}", _0)]
    FileRead(String),
    /// No file or record for the requested hash or id
    #[display("File not found: {}", _0)]
    NotFound(String),
    /// Invalid storage path
    #[display("Invalid storage path: {}", _0)]
    InvalidPath(String),
    /// A caller-supplied field would shadow a record field
    #[display("Reserved field name: {}", _0)]
    ReservedField(String),
    /// Stored bytes no longer match their recorded hash
    #[display("Hash mismatch: expected {}, got {}", expected, actual)]
    HashMismatch {
        /// Hash recorded in the metadata
        expected: String,
        /// Hash of the bytes currently on disk
        actual: String,
    },
    /// The metadata store rejected a create
    #[display("Failed to persist metadata: {}", _0)]
    PersistenceFailure(String),
    /// A collaborator failed unexpectedly
    #[display("Upstream unavailable: {}", _0)]
    UpstreamUnavailable(String),
}

/// Storage error with location tracking.
///
/// # Examples
///
/// ```
/// use coffer_error::{StorageError, StorageErrorKind};
///
/// let err = StorageError::new(StorageErrorKind::NotFound("abc123".to_string()));
/// assert!(format!("{}", err).contains("not found"));
/// ```
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Storage Error: {} at line {} in {}", kind, line, file)]
pub struct StorageError {
    /// The kind of error that occurred
    pub kind: StorageErrorKind,
    /// Line number where error was created
    pub line: u32,
    /// File where error was created
    pub file: &'static str,
}

impl StorageError {
    /// Create a new storage error with automatic location tracking.
    #[track_caller]
    pub fn new(kind: StorageErrorKind) -> Self {
        let location = std::panic::Location::caller();
        Self {
            kind,
            line: location.line(),
            file: location.file(),
        }
    }

    /// Get the error kind.
    pub fn kind(&self) -> &StorageErrorKind {
        &self.kind
    }
}
