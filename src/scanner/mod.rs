//! Finding files and hashing them.
//!
//! [`walker`] turns root paths into [`FileEntry`](crate::entry::FileEntry)
//! values in a fixed order, [`hasher`] streams file content through the
//! configured digest, and [`hardlink`] reads link counts from metadata.
//!
//! ```no_run
//! use xattrsum::scanner::{Hasher, Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let config = WalkerConfig::new(false, true, vec!["*.part".into()]);
//! let hasher = Hasher::default();
//! for entry in Walker::new(vec![PathBuf::from(".")], config).scan().unwrap() {
//!     println!("{} {}", hasher.digest(entry.path()).unwrap(), entry.path().display());
//! }
//! ```

pub mod hardlink;
pub mod hasher;
pub mod walker;

use std::path::{Path, PathBuf};

pub use hasher::{HashAlgorithm, Hasher, DEFAULT_CHUNK_SIZE};
pub use walker::Walker;

/// What the walker visits.
#[derive(Debug, Clone, Default)]
pub struct WalkerConfig {
    /// Descend through symlinks instead of skipping them. Cycles are
    /// detected by walkdir and reported as skipped entries.
    pub follow_symlinks: bool,
    /// Prune dot-files and dot-directories below each root.
    pub skip_hidden: bool,
    /// Gitignore-style patterns, matched relative to each root.
    pub ignore_patterns: Vec<String>,
}

impl WalkerConfig {
    #[must_use]
    pub fn new(follow_symlinks: bool, skip_hidden: bool, ignore_patterns: Vec<String>) -> Self {
        Self {
            follow_symlinks,
            skip_hidden,
            ignore_patterns,
        }
    }
}

/// A root that cannot be enumerated. Fatal for the whole scan.
#[derive(thiserror::Error, Debug)]
pub enum ScanError {
    #[error("cannot read root {0}: permission denied")]
    PermissionDenied(PathBuf),

    #[error("root does not exist: {0}")]
    NotFound(PathBuf),

    /// Sockets, FIFOs and device nodes cannot be roots.
    #[error("not a regular file or directory: {0}")]
    NotADirectory(PathBuf),

    #[error("cannot access root {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// A file whose content could not be read to the end.
#[derive(thiserror::Error, Debug)]
pub enum HashError {
    #[error("{0}: no such file")]
    NotFound(PathBuf),

    #[error("{0}: permission denied")]
    PermissionDenied(PathBuf),

    #[error("read failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

impl HashError {
    /// Classify an I/O error raised while reading `path`.
    #[must_use]
    pub fn from_io(path: &Path, error: std::io::Error) -> Self {
        match error.kind() {
            std::io::ErrorKind::NotFound => Self::NotFound(path.to_path_buf()),
            std::io::ErrorKind::PermissionDenied => Self::PermissionDenied(path.to_path_buf()),
            _ => Self::Io {
                path: path.to_path_buf(),
                source: error,
            },
        }
    }
}
