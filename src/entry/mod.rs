//! Per-file fingerprint state machine.
//!
//! # Overview
//!
//! A [`FileEntry`] is a path plus the link count observed when it was
//! scanned. Its digest and last-verified timestamp are never held in
//! memory: every operation reads them from the [`AttributeStore`] in its
//! [`EntryContext`].
//!
//! ```text
//!  Unhashed --compute--> Hashed --(time passes)--> Stale
//!                          ^                          |
//!                          +------- verify ok --------+
//!                                   verify mismatch --> Failed (store untouched)
//! ```
//!
//! Operations return an [`Outcome`]. Read, store and mismatch errors are
//! reported as [`Outcome::Failed`] instead of being raised, so a caller can
//! move on to the next file.

pub mod timestamp;

use std::fmt;
use std::path::{Path, PathBuf};

use chrono::{Local, NaiveDateTime, TimeDelta};

use crate::progress::{NoProgress, ProgressCallback};
use crate::scanner::hardlink::observe_link_count;
use crate::scanner::{HashError, Hasher};
use crate::store::{AttributeKeys, AttributeStore, StoreError};

/// Why an entry operation failed.
#[derive(thiserror::Error, Debug)]
pub enum EntryError {
    /// The file could not be read.
    #[error(transparent)]
    Read(#[from] HashError),

    /// An attribute could not be read or written.
    #[error(transparent)]
    Store(#[from] StoreError),

    /// The recomputed digest differs from the stored one.
    #[error("digest mismatch for {path}: stored {stored}, computed {actual}")]
    Mismatch {
        /// The file that changed
        path: PathBuf,
        /// Digest found in the store
        stored: String,
        /// Digest of the current content
        actual: String,
    },
}

/// Result of one operation on one entry.
#[derive(Debug)]
pub enum Outcome {
    /// Nothing to do; no file content was read.
    Unchanged,
    /// A fresh digest and timestamp were stored.
    Computed,
    /// The content matched the stored digest; the timestamp was refreshed.
    Verified,
    /// The operation failed; see the error.
    Failed(EntryError),
}

impl Outcome {
    /// Whether this is [`Outcome::Failed`].
    #[must_use]
    pub fn is_failed(&self) -> bool {
        matches!(self, Self::Failed(_))
    }

    fn from_result(result: Result<Self, EntryError>) -> Self {
        result.unwrap_or_else(Self::Failed)
    }
}

impl fmt::Display for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unchanged => f.write_str("unchanged"),
            Self::Computed => f.write_str("computed"),
            Self::Verified => f.write_str("verified"),
            Self::Failed(e) => write!(f, "failed: {e}"),
        }
    }
}

/// Persisted state of an entry relative to a staleness window.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryState {
    /// No digest stored.
    Unhashed,
    /// Digest stored and verified within the window.
    Hashed,
    /// Digest stored, timestamp absent, malformed or outside the window.
    Stale,
}

/// Everything an entry operation needs besides the entry itself.
pub struct EntryContext<'a> {
    /// Where digests and timestamps live
    pub store: &'a dyn AttributeStore,
    /// Attribute names for the configured algorithm
    pub keys: &'a AttributeKeys,
    /// Digest engine
    pub hasher: &'a Hasher,
    /// Observer for file and chunk events
    pub progress: &'a dyn ProgressCallback,
    clock: fn() -> NaiveDateTime,
}

impl<'a> EntryContext<'a> {
    /// Create a context without progress reporting, using local time.
    #[must_use]
    pub fn new(store: &'a dyn AttributeStore, keys: &'a AttributeKeys, hasher: &'a Hasher) -> Self {
        Self {
            store,
            keys,
            hasher,
            progress: &NoProgress,
            clock: local_now,
        }
    }

    /// Report file and chunk events to `progress`.
    #[must_use]
    pub fn with_progress(mut self, progress: &'a dyn ProgressCallback) -> Self {
        self.progress = progress;
        self
    }

    /// Replace the clock used for timestamps and staleness cutoffs.
    #[must_use]
    pub fn with_clock(mut self, clock: fn() -> NaiveDateTime) -> Self {
        self.clock = clock;
        self
    }

    fn now(&self) -> NaiveDateTime {
        (self.clock)()
    }
}

fn local_now() -> NaiveDateTime {
    Local::now().naive_local()
}

/// One regular file found by the scanner.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileEntry {
    path: PathBuf,
    link_count: u64,
}

impl FileEntry {
    /// Create an entry for `path` with the link count seen at scan time.
    #[must_use]
    pub fn new(path: PathBuf, link_count: u64) -> Self {
        Self { path, link_count }
    }

    /// Path of the file.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Link count observed when the entry was created.
    #[must_use]
    pub fn link_count(&self) -> u64 {
        self.link_count
    }

    /// Link count as of now, falling back to the scanned value if the file
    /// cannot be inspected.
    #[must_use]
    pub fn current_link_count(&self) -> u64 {
        observe_link_count(&self.path).unwrap_or_else(|e| {
            log::debug!("Cannot stat {}: {}", self.path.display(), e);
            self.link_count
        })
    }

    /// The stored digest, if any. Empty values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the attribute cannot be read.
    pub fn stored_digest(&self, ctx: &EntryContext<'_>) -> Result<Option<String>, StoreError> {
        let raw = ctx.store.get(&self.path, &ctx.keys.digest)?;
        Ok(raw.and_then(|bytes| {
            let text = String::from_utf8_lossy(&bytes);
            let text = text.trim_end_matches('\0').trim();
            (!text.is_empty()).then(|| text.to_string())
        }))
    }

    /// The stored last-verified timestamp. Malformed values count as absent.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the attribute cannot be read.
    pub fn last_verified(
        &self,
        ctx: &EntryContext<'_>,
    ) -> Result<Option<NaiveDateTime>, StoreError> {
        let Some(raw) = ctx.store.get(&self.path, &ctx.keys.timestamp)? else {
            return Ok(None);
        };
        match timestamp::parse(&raw) {
            Ok(ts) => Ok(Some(ts)),
            Err(e) => {
                log::warn!("Ignoring timestamp of {}: {}", self.path.display(), e);
                Ok(None)
            }
        }
    }

    /// Whether the timestamp is absent or strictly older than
    /// `max_age_days` before now.
    ///
    /// A window reaching past the earliest representable date leaves only
    /// absent timestamps stale.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if the timestamp cannot be read.
    pub fn is_older_than(
        &self,
        ctx: &EntryContext<'_>,
        max_age_days: u32,
    ) -> Result<bool, StoreError> {
        let cutoff = ctx
            .now()
            .checked_sub_signed(TimeDelta::days(i64::from(max_age_days)))
            .unwrap_or(NaiveDateTime::MIN);
        Ok(match self.last_verified(ctx)? {
            Some(ts) => ts < cutoff,
            None => true,
        })
    }

    /// Classify the persisted state against a staleness window.
    ///
    /// # Errors
    ///
    /// Returns [`StoreError`] if an attribute cannot be read.
    pub fn state(&self, ctx: &EntryContext<'_>, max_age_days: u32) -> Result<EntryState, StoreError> {
        if self.stored_digest(ctx)?.is_none() {
            return Ok(EntryState::Unhashed);
        }
        if self.is_older_than(ctx, max_age_days)? {
            Ok(EntryState::Stale)
        } else {
            Ok(EntryState::Hashed)
        }
    }

    /// Store a digest for this file.
    ///
    /// Without `force`, an entry that already has a digest is left alone
    /// and only the store is read. Otherwise the file is hashed and both
    /// the digest and the current time are written, replacing any previous
    /// values.
    pub fn compute(&self, ctx: &EntryContext<'_>, force: bool) -> Outcome {
        Outcome::from_result(self.try_compute(ctx, force))
    }

    fn try_compute(&self, ctx: &EntryContext<'_>, force: bool) -> Result<Outcome, EntryError> {
        if !force && self.stored_digest(ctx)?.is_some() {
            log::trace!("Already hashed: {}", self.path.display());
            return Ok(Outcome::Unchanged);
        }
        self.rehash(ctx)
    }

    fn rehash(&self, ctx: &EntryContext<'_>) -> Result<Outcome, EntryError> {
        let digest = self.hash_content(ctx)?;
        ctx.store
            .set(&self.path, &ctx.keys.digest, digest.as_bytes())?;
        self.touch(ctx)?;
        log::debug!("Stored digest {} for {}", digest, self.path.display());
        Ok(Outcome::Computed)
    }

    /// Verify the digest if the last verification is older than
    /// `max_age_days` or unknown; otherwise do nothing.
    pub fn verify_if_older_than(&self, ctx: &EntryContext<'_>, max_age_days: u32) -> Outcome {
        match self.is_older_than(ctx, max_age_days) {
            Ok(true) => self.verify(ctx),
            Ok(false) => {
                log::trace!("Recently verified: {}", self.path.display());
                Outcome::Unchanged
            }
            Err(e) => Outcome::Failed(e.into()),
        }
    }

    /// Recompute the digest and compare it with the stored one.
    ///
    /// With no stored digest this behaves like `compute(force = true)`.
    /// On a match the timestamp is refreshed. On a mismatch nothing is
    /// written, so the discrepancy is seen again on every later run until
    /// the file is recomputed on purpose.
    pub fn verify(&self, ctx: &EntryContext<'_>) -> Outcome {
        Outcome::from_result(self.try_verify(ctx))
    }

    fn try_verify(&self, ctx: &EntryContext<'_>) -> Result<Outcome, EntryError> {
        let Some(stored) = self.stored_digest(ctx)? else {
            return self.rehash(ctx);
        };

        let actual = self.hash_content(ctx)?;
        if actual != stored {
            return Err(EntryError::Mismatch {
                path: self.path.clone(),
                stored,
                actual,
            });
        }

        self.touch(ctx)?;
        log::debug!("Verified {}", self.path.display());
        Ok(Outcome::Verified)
    }

    fn hash_content(&self, ctx: &EntryContext<'_>) -> Result<String, HashError> {
        ctx.progress.on_file_start(&self.path);
        ctx.hasher.digest_with_progress(&self.path, ctx.progress)
    }

    fn touch(&self, ctx: &EntryContext<'_>) -> Result<(), StoreError> {
        let now = timestamp::format(ctx.now());
        ctx.store
            .set(&self.path, &ctx.keys.timestamp, now.as_bytes())
    }
}
