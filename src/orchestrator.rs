//! Drives fingerprint operations over a scanned tree.
//!
//! # Overview
//!
//! The [`Orchestrator`] owns the entries produced by the scanner and runs
//! one [`Mode`] over them, strictly one file at a time in scan order. Each
//! entry's [`Outcome`] is folded into a [`RunSummary`]; failures never stop
//! the run.
//!
//! A shutdown flag (set by Ctrl+C) is checked only between entries, so a
//! digest that has started always finishes.
//!
//! # Example
//!
//! ```no_run
//! use xattrsum::entry::EntryContext;
//! use xattrsum::orchestrator::{Mode, Orchestrator};
//! use xattrsum::scanner::{Hasher, Walker, WalkerConfig};
//! use xattrsum::store::{AttributeKeys, XattrStore};
//! use std::path::PathBuf;
//!
//! let entries = Walker::new(vec![PathBuf::from("/srv")], WalkerConfig::default())
//!     .scan()
//!     .unwrap();
//! let (store, keys, hasher) = (XattrStore::new(), AttributeKeys::default(), Hasher::default());
//! let ctx = EntryContext::new(&store, &keys, &hasher);
//!
//! let summary = Orchestrator::new(entries, ctx).run(Mode::Verify { max_age_days: 180 });
//! println!("{} failures", summary.failures.len());
//! ```

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use serde::Serialize;

use crate::duplicates::{find_duplicates, DuplicateGroup};
use crate::entry::{EntryContext, FileEntry, Outcome};

/// What to do with every entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Fingerprint files that have no digest yet.
    Compute,
    /// Verify files whose last verification is older than the window.
    Verify {
        /// Staleness window in days
        max_age_days: u32,
    },
    /// Recompute (overwriting) files whose last verification is older than
    /// the window. This is how a deliberate change is accepted.
    Update {
        /// Staleness window in days
        max_age_days: u32,
    },
}

impl Mode {
    /// Short name for progress and logs.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Compute => "compute",
            Self::Verify { .. } => "verify",
            Self::Update { .. } => "update",
        }
    }
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A file that failed during a run.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Failure {
    /// The file
    pub path: PathBuf,
    /// Rendered error
    pub reason: String,
}

/// Totals for one run.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RunSummary {
    /// Entries found by the scanner
    pub total: usize,
    /// Entries visited before the run ended
    pub processed: usize,
    /// Entries whose content matched the stored digest
    pub verified: usize,
    /// Entries that received a new digest
    pub computed: usize,
    /// Entries left alone
    pub unchanged: usize,
    /// Entries that failed, in scan order
    pub failures: Vec<Failure>,
    /// Whether the run stopped early on request
    pub interrupted: bool,
}

impl RunSummary {
    /// Whether any entry failed.
    #[must_use]
    pub fn has_failures(&self) -> bool {
        !self.failures.is_empty()
    }

    fn record(&mut self, path: PathBuf, outcome: &Outcome) {
        self.processed += 1;
        match outcome {
            Outcome::Unchanged => self.unchanged += 1,
            Outcome::Computed => self.computed += 1,
            Outcome::Verified => self.verified += 1,
            Outcome::Failed(e) => self.failures.push(Failure {
                path,
                reason: e.to_string(),
            }),
        }
    }
}

/// Runs modes over a list of entries.
pub struct Orchestrator<'a> {
    entries: Vec<FileEntry>,
    ctx: EntryContext<'a>,
    shutdown_flag: Option<Arc<AtomicBool>>,
}

impl<'a> Orchestrator<'a> {
    /// Create an orchestrator over scanned entries.
    #[must_use]
    pub fn new(entries: Vec<FileEntry>, ctx: EntryContext<'a>) -> Self {
        Self {
            entries,
            ctx,
            shutdown_flag: None,
        }
    }

    /// Stop between entries once `flag` is set.
    #[must_use]
    pub fn with_shutdown_flag(mut self, flag: Arc<AtomicBool>) -> Self {
        self.shutdown_flag = Some(flag);
        self
    }

    /// The scanned entries.
    #[must_use]
    pub fn entries(&self) -> &[FileEntry] {
        &self.entries
    }

    fn is_shutdown_requested(&self) -> bool {
        self.shutdown_flag
            .as_ref()
            .is_some_and(|f| f.load(Ordering::SeqCst))
    }

    /// Apply `mode` to every entry in order.
    pub fn run(&self, mode: Mode) -> RunSummary {
        let progress = self.ctx.progress;
        let mut summary = RunSummary {
            total: self.entries.len(),
            ..Default::default()
        };

        log::info!("Starting {} over {} files", mode, summary.total);
        progress.on_run_start(mode.name(), summary.total);

        for entry in &self.entries {
            if self.is_shutdown_requested() {
                log::info!("Shutdown requested, stopping before {}", entry.path().display());
                summary.interrupted = true;
                break;
            }

            let outcome = self.apply(mode, entry);
            match &outcome {
                Outcome::Failed(e) => {
                    log::warn!("{}: {}", entry.path().display(), e);
                    progress.on_file_failed(entry.path(), e);
                }
                other => progress.on_file_done(entry.path(), other),
            }
            summary.record(entry.path().to_path_buf(), &outcome);
        }

        progress.on_run_end();
        log::info!(
            "{} finished: {} verified, {} computed, {} unchanged, {} failed",
            mode,
            summary.verified,
            summary.computed,
            summary.unchanged,
            summary.failures.len()
        );
        summary
    }

    fn apply(&self, mode: Mode, entry: &FileEntry) -> Outcome {
        match mode {
            Mode::Compute => entry.compute(&self.ctx, false),
            Mode::Verify { max_age_days } => entry.verify_if_older_than(&self.ctx, max_age_days),
            Mode::Update { max_age_days } => match entry.is_older_than(&self.ctx, max_age_days) {
                Ok(true) => entry.compute(&self.ctx, true),
                Ok(false) => Outcome::Unchanged,
                Err(e) => Outcome::Failed(e.into()),
            },
        }
    }

    /// Group the entries by their stored digests.
    #[must_use]
    pub fn duplicates(&self) -> Vec<DuplicateGroup> {
        find_duplicates(&self.entries, &self.ctx)
    }
}
