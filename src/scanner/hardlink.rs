//! Hard-link observation.
//!
//! # Overview
//!
//! A file whose storage is referenced by more than one directory entry is
//! already deduplicated by the filesystem. The duplicate grouper needs that
//! number to avoid re-linking such files.
//!
//! # Platform Support
//!
//! - **Unix**: `st_nlink` from file metadata
//! - **Other**: link counts are not exposed; every file reports 1

use std::fs::Metadata;
use std::io;
use std::path::Path;

/// Number of directory entries that reference this file's storage.
///
/// # Example
///
/// ```no_run
/// use xattrsum::scanner::hardlink::link_count;
///
/// let meta = std::fs::metadata("/etc/passwd").unwrap();
/// assert!(link_count(&meta) >= 1);
/// ```
#[must_use]
pub fn link_count(metadata: &Metadata) -> u64 {
    #[cfg(unix)]
    {
        use std::os::unix::fs::MetadataExt;
        metadata.nlink()
    }

    #[cfg(not(unix))]
    {
        let _ = metadata;
        1
    }
}

/// Read the current link count of `path`, following symlinks.
///
/// # Errors
///
/// Returns the I/O error from `stat` if the path cannot be inspected.
pub fn observe_link_count(path: &Path) -> io::Result<u64> {
    std::fs::metadata(path).map(|meta| link_count(&meta))
}

/// Whether link counts are meaningful on this platform.
#[must_use]
pub const fn is_supported() -> bool {
    cfg!(unix)
}
