//! Directory walker implementation using walkdir.
//!
//! # Overview
//!
//! [`Walker`] enumerates every regular file below one or more roots and
//! produces one [`FileEntry`] per file with a freshly observed link count.
//! Stored fingerprints are not loaded here; entries query the attribute
//! store only when an operation needs them.
//!
//! # Features
//!
//! - Deterministic order: roots in the given order, children by file name
//! - Overlapping or repeated roots yield each file once, at its first position
//! - Optional symlink following
//! - Gitignore-style pattern matching via the `ignore` crate
//! - Hidden file filtering
//!
//! # Errors
//!
//! A root that cannot be read fails the whole scan. Anything below a root
//! that cannot be read is logged and skipped.
//!
//! # Example
//!
//! ```no_run
//! use xattrsum::scanner::{Walker, WalkerConfig};
//! use std::path::PathBuf;
//!
//! let walker = Walker::new(vec![PathBuf::from("/srv/archive")], WalkerConfig::default());
//! for entry in walker.scan().unwrap() {
//!     println!("{} ({} links)", entry.path().display(), entry.link_count());
//! }
//! ```

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use ignore::gitignore::{Gitignore, GitignoreBuilder};
use walkdir::{DirEntry, WalkDir};

use super::hardlink::link_count;
use super::{ScanError, WalkerConfig};
use crate::entry::FileEntry;

/// Directory walker for file discovery.
#[derive(Debug)]
pub struct Walker {
    /// Roots to walk, in order
    roots: Vec<PathBuf>,
    /// Walker configuration
    config: WalkerConfig,
}

impl Walker {
    /// Create a new walker for the given roots.
    #[must_use]
    pub fn new(roots: Vec<PathBuf>, config: WalkerConfig) -> Self {
        Self { roots, config }
    }

    /// The configured roots.
    #[must_use]
    pub fn roots(&self) -> &[PathBuf] {
        &self.roots
    }

    /// Enumerate all roots.
    ///
    /// # Errors
    ///
    /// Returns [`ScanError`] for the first root that cannot be enumerated.
    pub fn scan(&self) -> Result<Vec<FileEntry>, ScanError> {
        let mut entries = Vec::new();
        for root in &self.roots {
            let before = entries.len();
            self.scan_root(root, &mut entries)?;
            log::debug!(
                "Found {} files under {}",
                entries.len() - before,
                root.display()
            );
        }
        Ok(Self::dedup_by_path(entries))
    }

    /// Drop entries whose file was already reached through an earlier root.
    fn dedup_by_path(entries: Vec<FileEntry>) -> Vec<FileEntry> {
        let mut seen = HashSet::with_capacity(entries.len());
        entries
            .into_iter()
            .filter(|entry| {
                let key = std::fs::canonicalize(entry.path())
                    .unwrap_or_else(|_| entry.path().to_path_buf());
                let first = seen.insert(key);
                if !first {
                    log::debug!("Already scanned: {}", entry.path().display());
                }
                first
            })
            .collect()
    }

    /// Check that a root can be enumerated before walking it.
    fn check_root(root: &Path) -> Result<(), ScanError> {
        use std::io::ErrorKind;

        let metadata = std::fs::metadata(root).map_err(|e| match e.kind() {
            ErrorKind::NotFound => ScanError::NotFound(root.to_path_buf()),
            ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
            _ => ScanError::Io {
                path: root.to_path_buf(),
                source: e,
            },
        })?;

        if metadata.is_dir() {
            std::fs::read_dir(root).map_err(|e| match e.kind() {
                ErrorKind::PermissionDenied => ScanError::PermissionDenied(root.to_path_buf()),
                _ => ScanError::Io {
                    path: root.to_path_buf(),
                    source: e,
                },
            })?;
        } else if !metadata.is_file() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }
        Ok(())
    }

    fn scan_root(&self, root: &Path, entries: &mut Vec<FileEntry>) -> Result<(), ScanError> {
        Self::check_root(root)?;
        let gitignore = self.build_gitignore(root);

        let walk = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| !self.is_pruned(root, entry, gitignore.as_ref()));

        for item in walk {
            let entry = match item {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().unwrap_or(root).to_path_buf();
                    log::warn!("Skipping {}: {}", path.display(), e);
                    continue;
                }
            };

            let file_type = entry.file_type();
            if file_type.is_symlink() {
                // Only reachable when follow_symlinks is false.
                log::trace!("Skipping symlink: {}", entry.path().display());
                continue;
            }
            if !file_type.is_file() {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    entries.push(FileEntry::new(entry.into_path(), link_count(&metadata)));
                }
                Err(e) => {
                    log::warn!("Skipping {}: {}", entry.path().display(), e);
                }
            }
        }
        Ok(())
    }

    /// Whether an entry (and, for directories, everything below it) is excluded.
    fn is_pruned(&self, root: &Path, entry: &DirEntry, gitignore: Option<&Gitignore>) -> bool {
        if entry.depth() == 0 {
            return false;
        }

        if self.config.skip_hidden && entry.file_name().to_string_lossy().starts_with('.') {
            log::trace!("Skipping hidden: {}", entry.path().display());
            return true;
        }

        if let Some(gi) = gitignore {
            let relative = entry.path().strip_prefix(root).unwrap_or(entry.path());
            if gi.matched(relative, entry.file_type().is_dir()).is_ignore() {
                log::trace!("Ignoring: {}", entry.path().display());
                return true;
            }
        }
        false
    }

    /// Build a matcher from the configured patterns.
    fn build_gitignore(&self, root: &Path) -> Option<Gitignore> {
        if self.config.ignore_patterns.is_empty() {
            return None;
        }

        let mut builder = GitignoreBuilder::new(root);
        for pattern in &self.config.ignore_patterns {
            if let Err(e) = builder.add_line(None, pattern) {
                log::warn!("Invalid ignore pattern '{}': {}", pattern, e);
            }
        }

        match builder.build() {
            Ok(gitignore) if !gitignore.is_empty() => Some(gitignore),
            Ok(_) => None,
            Err(e) => {
                log::warn!("Failed to build ignore patterns: {}", e);
                None
            }
        }
    }
}
