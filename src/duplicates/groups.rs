//! Digest-based duplicate grouping.
//!
//! # Overview
//!
//! [`DuplicateGrouper`] walks candidates in scan order and keeps, per
//! digest, the current *representative*. A candidate becomes a duplicate
//! only when its digest was seen before **and** its link count is exactly
//! one. Any other candidate (new digest, or a file that is already a hard
//! link) becomes the representative for its digest, replacing the previous
//! one.
//!
//! Because of that replacement, an already-linked file found late in the
//! scan takes over as the link source for its digest. Groups are keyed by
//! digest, so every duplicate of a digest is reported against the
//! representative in place when grouping ends.
//!
//! # Example
//!
//! ```
//! use xattrsum::duplicates::{Candidate, DuplicateGrouper};
//!
//! let mut grouper = DuplicateGrouper::new();
//! grouper.push(Candidate::new("/a", Some("d1"), 1));
//! grouper.push(Candidate::new("/b", Some("d1"), 1));
//! grouper.push(Candidate::new("/c", None, 1));
//!
//! let groups = grouper.finish();
//! assert_eq!(groups.len(), 1);
//! assert_eq!(groups[0].representative, std::path::PathBuf::from("/a"));
//! ```

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Serialize;

/// A file as seen by the grouper.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
    /// Path of the file
    pub path: PathBuf,
    /// Stored digest, if any
    pub digest: Option<String>,
    /// Current link count
    pub link_count: u64,
}

impl Candidate {
    /// Create a candidate.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, digest: Option<&str>, link_count: u64) -> Self {
        Self {
            path: path.into(),
            digest: digest.map(str::to_string),
            link_count,
        }
    }
}

/// Files sharing one digest: a representative plus the copies that can be
/// replaced by hard links to it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DuplicateGroup {
    /// Shared digest
    pub digest: String,
    /// File the duplicates should link to
    pub representative: PathBuf,
    /// Independent copies, in scan order
    pub duplicates: Vec<PathBuf>,
}

impl DuplicateGroup {
    /// Number of duplicates (the representative is not counted).
    #[must_use]
    pub fn len(&self) -> usize {
        self.duplicates.len()
    }

    /// Whether the group has no duplicates.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.duplicates.is_empty()
    }
}

/// Counters collected while grouping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct GroupingStats {
    /// Candidates seen
    pub considered: usize,
    /// Candidates skipped for lack of a digest
    pub unhashed: usize,
    /// Candidates with a link count other than one
    pub linked: usize,
    /// Candidates placed in a duplicate set
    pub duplicates: usize,
}

/// Incremental digest grouper.
#[derive(Debug, Default)]
pub struct DuplicateGrouper {
    representatives: HashMap<String, PathBuf>,
    /// Duplicate sets in order of first duplicate
    sets: Vec<(String, Vec<PathBuf>)>,
    index: HashMap<String, usize>,
    stats: GroupingStats,
}

impl DuplicateGrouper {
    /// Create an empty grouper.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Feed the next candidate in scan order.
    pub fn push(&mut self, candidate: Candidate) {
        self.stats.considered += 1;
        let Some(digest) = candidate.digest else {
            self.stats.unhashed += 1;
            return;
        };
        if candidate.link_count != 1 {
            self.stats.linked += 1;
        }

        if candidate.link_count == 1 && self.representatives.contains_key(&digest) {
            self.stats.duplicates += 1;
            let slot = match self.index.get(&digest) {
                Some(&i) => i,
                None => {
                    self.sets.push((digest.clone(), Vec::new()));
                    self.index.insert(digest, self.sets.len() - 1);
                    self.sets.len() - 1
                }
            };
            self.sets[slot].1.push(candidate.path);
        } else {
            if let Some(previous) = self.representatives.get(&digest) {
                log::debug!(
                    "{} replaces {} as representative of {}",
                    candidate.path.display(),
                    previous.display(),
                    digest
                );
            }
            self.representatives.insert(digest, candidate.path);
        }
    }

    /// Counters so far.
    #[must_use]
    pub fn stats(&self) -> GroupingStats {
        self.stats
    }

    /// Produce the non-empty groups, ordered by their first duplicate.
    #[must_use]
    pub fn finish(mut self) -> Vec<DuplicateGroup> {
        self.sets
            .into_iter()
            .filter_map(|(digest, duplicates)| {
                let representative = self.representatives.remove(&digest)?;
                Some(DuplicateGroup {
                    digest,
                    representative,
                    duplicates,
                })
            })
            .collect()
    }
}

/// Group candidates in one pass.
#[must_use]
pub fn group_candidates<I>(candidates: I) -> Vec<DuplicateGroup>
where
    I: IntoIterator<Item = Candidate>,
{
    let mut grouper = DuplicateGrouper::new();
    for candidate in candidates {
        grouper.push(candidate);
    }
    grouper.finish()
}
