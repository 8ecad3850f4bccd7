//! Path and URL derivation.

use crate::FileId;
use std::path::{Path, PathBuf};

/// Maps ids to public URLs and content hashes to physical paths.
///
/// ```
/// use coffer_storage::{FileId, PathCodec};
///
/// let codec = PathCodec::new("/var/coffer", "https://cdn.example/files/");
/// let url = codec.id_to_url(&FileId::from("a1"));
/// assert_eq!(url, "https://cdn.example/files/a1");
/// assert_eq!(codec.url_to_id(&url), Some(FileId::from("a1")));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathCodec {
    root: PathBuf,
    /// Mask without its trailing separators
    mask: String,
}

impl PathCodec {
    /// Create a codec for a storage root and URL mask.
    pub fn new(root: impl Into<PathBuf>, mask: impl AsRef<str>) -> Self {
        Self {
            root: root.into(),
            mask: mask.as_ref().trim_end_matches('/').to_string(),
        }
    }

    /// Storage root directory.
    pub fn root(&self) -> &Path {
        &self.root
    }

    /// Public URL for a record id: the mask, one `/`, then the id.
    pub fn id_to_url(&self, id: &FileId) -> String {
        format!("{}/{}", self.mask, id)
    }

    /// Recover the id from a URL produced by [`PathCodec::id_to_url`].
    ///
    /// Returns `None` when `url` does not start with the mask and its separator.
    pub fn url_to_id(&self, url: &str) -> Option<FileId> {
        url.strip_prefix(self.mask.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .map(FileId::from)
    }

    /// Physical path of the bytes for `hash` stored with `extension`.
    pub fn physical_path(&self, hash: &str, extension: &str) -> PathBuf {
        self.root.join(format!("{}{}", hash, extension))
    }
}
