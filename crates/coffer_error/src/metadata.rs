//! Metadata store error types.

/// Error raised by a metadata store implementation.
///
/// Stores return this when a lookup or create fails for a reason other than
/// absence. Absence is reported as `Ok(None)`, never as an error.
#[derive(Debug, Clone, derive_more::Display, derive_more::Error)]
#[display("Metadata Error: {} at line {} in {}", message, line, file)]
pub struct MetadataError {
    /// Error message
    pub message: String,
    /// Line number where the error occurred
    pub line: u32,
    /// File where the error occurred
    pub file: &'static str,
}

impl MetadataError {
    /// Create a new MetadataError with the given message at the current location.
    ///
    /// # Examples
    ///
    /// ```
    /// use coffer_error::MetadataError;
    ///
    /// let err = MetadataError::new("unique constraint violated");
    /// assert!(err.message.contains("unique"));
    /// ```
    #[track_caller]
    pub fn new(message: impl Into<String>) -> Self {
        let location = std::panic::Location::caller();
        Self {
            message: message.into(),
            line: location.line(),
            file: location.file(),
        }
    }
}
