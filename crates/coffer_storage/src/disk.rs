//! Disk usage reporting.

use coffer_error::{StorageError, StorageErrorKind};
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Space figures, in bytes, for the filesystem holding the storage root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskSpace {
    /// Total capacity
    pub total: u64,
    /// Free space, including space reserved for privileged users
    pub free: u64,
    /// Space available to this process
    pub available: u64,
}

/// Result of a disk usage query.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DiskUsage {
    /// Space on the storage root's filesystem
    pub disk_space: DiskSpace,
}

/// Query the filesystem containing `root`.
pub(crate) fn query(root: &Path) -> Result<DiskUsage, StorageError> {
    let unavailable = |e: std::io::Error| {
        StorageError::new(StorageErrorKind::UpstreamUnavailable(format!(
            "disk usage for {}: {}",
            root.display(),
            e
        )))
    };

    Ok(DiskUsage {
        disk_space: DiskSpace {
            total: fs2::total_space(root).map_err(unavailable)?,
            free: fs2::free_space(root).map_err(unavailable)?,
            available: fs2::available_space(root).map_err(unavailable)?,
        },
    })
}
