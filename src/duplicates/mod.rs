//! Duplicate detection module.
//!
//! Files are grouped by the digest already stored for them; nothing is
//! hashed here. See [`groups`] for the grouping rules.

pub mod groups;

pub use groups::{group_candidates, Candidate, DuplicateGroup, DuplicateGrouper, GroupingStats};

use crate::entry::{EntryContext, FileEntry};

/// Group scanned entries by their stored digests.
///
/// Link counts are read again at this point rather than taken from the
/// scan. An entry whose digest cannot be read is treated as unhashed.
#[must_use]
pub fn find_duplicates(entries: &[FileEntry], ctx: &EntryContext<'_>) -> Vec<DuplicateGroup> {
    let mut grouper = DuplicateGrouper::new();
    for entry in entries {
        let digest = entry.stored_digest(ctx).unwrap_or_else(|e| {
            log::warn!("{}", e);
            None
        });
        grouper.push(Candidate {
            path: entry.path().to_path_buf(),
            digest,
            link_count: entry.current_link_count(),
        });
    }

    let stats = grouper.stats();
    log::info!(
        "Checked {} files: {} without digest, {} already linked, {} duplicates",
        stats.considered,
        stats.unhashed,
        stats.linked,
        stats.duplicates
    );
    grouper.finish()
}
