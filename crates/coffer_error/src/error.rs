//! Top-level error wrapper types.

use crate::{ConfigError, MetadataError, StorageError, StorageErrorKind};

/// Every error condition a Coffer operation can report.
///
/// # Examples
///
/// ```
/// use coffer_error::{CofferError, MetadataError};
///
/// let err: CofferError = MetadataError::new("connection reset").into();
/// assert!(format!("{}", err).contains("Metadata Error"));
/// ```
#[derive(Debug, derive_more::From, derive_more::Display, derive_more::Error)]
pub enum CofferErrorKind {
    /// Filesystem or orchestration error
    #[from(StorageError)]
    Storage(StorageError),
    /// Metadata store error
    #[from(MetadataError)]
    Metadata(MetadataError),
    /// Configuration error
    #[from(ConfigError)]
    Config(ConfigError),
}

/// Coffer error with kind discrimination.
#[derive(Debug, derive_more::Display, derive_more::Error)]
#[display("Coffer Error: {}", _0)]
pub struct CofferError(Box<CofferErrorKind>);

impl CofferError {
    /// Create a new error from a kind.
    pub fn new(kind: CofferErrorKind) -> Self {
        Self(Box::new(kind))
    }

    /// Get the error kind.
    pub fn kind(&self) -> &CofferErrorKind {
        &self.0
    }

    /// Whether this error reports a missing file or record.
    pub fn is_not_found(&self) -> bool {
        matches!(
            self.kind(),
            CofferErrorKind::Storage(StorageError {
                kind: StorageErrorKind::NotFound(_),
                ..
            })
        )
    }

    /// The storage error kind, if this is a storage error.
    pub fn storage_kind(&self) -> Option<&StorageErrorKind> {
        match self.kind() {
            CofferErrorKind::Storage(err) => Some(err.kind()),
            _ => None,
        }
    }
}

// Generic From implementation for any type that converts to CofferErrorKind
impl<T> From<T> for CofferError
where
    T: Into<CofferErrorKind>,
{
    fn from(err: T) -> Self {
        Self::new(err.into())
    }
}

/// Result type for Coffer operations.
pub type CofferResult<T> = std::result::Result<T, CofferError>;
