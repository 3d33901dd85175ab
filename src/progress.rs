//! Progress reporting.
//!
//! The fingerprinting core reports what it is doing through the
//! [`ProgressCallback`] observer and never depends on how (or whether) that
//! is rendered. [`Progress`] draws an indicatif bar on stderr; [`NoProgress`]
//! discards everything.
//!
//! Terminal resizes are not delivered as signals. The renderer polls
//! [`TerminalLayout::poll_resize`] before drawing a file name and recomputes
//! how much of the path fits.

use std::path::Path;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use indicatif::{ProgressBar, ProgressDrawTarget, ProgressStyle};
use yansi::Paint;

use crate::entry::{EntryError, Outcome};

/// Observer for per-file fingerprinting events.
///
/// All methods are fire-and-forget notifications.
pub trait ProgressCallback: Send + Sync {
    /// A run over `total` entries is starting.
    fn on_run_start(&self, _mode: &str, _total: usize) {}

    /// Hashing of `path` is starting.
    fn on_file_start(&self, _path: &Path) {}

    /// A chunk of `bytes` was read from `path`.
    fn on_chunk(&self, _path: &Path, _bytes: u64) {}

    /// An entry finished with a non-failure outcome.
    fn on_file_done(&self, _path: &Path, _outcome: &Outcome) {}

    /// An entry failed.
    fn on_file_failed(&self, _path: &Path, _error: &EntryError) {}

    /// The run is over (completed or interrupted).
    fn on_run_end(&self) {}
}

/// Observer that ignores every event.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoProgress;

impl ProgressCallback for NoProgress {}

/// Columns taken by the bar template around the message.
const TEMPLATE_COLUMNS: u16 = 64;

/// Smallest message width worth drawing.
const MIN_MESSAGE_WIDTH: usize = 12;

/// Last known terminal size, refreshed on demand.
#[derive(Debug)]
pub struct TerminalLayout {
    size: Mutex<(u16, u16)>,
}

impl TerminalLayout {
    /// Fallback used when the size cannot be queried (not a TTY).
    pub const FALLBACK: (u16, u16) = (80, 24);

    /// Capture the current terminal size.
    #[must_use]
    pub fn new() -> Self {
        Self::with_size(Self::query())
    }

    /// Start from a known size.
    #[must_use]
    pub fn with_size(size: (u16, u16)) -> Self {
        Self {
            size: Mutex::new(size),
        }
    }

    fn query() -> (u16, u16) {
        crossterm::terminal::size().unwrap_or(Self::FALLBACK)
    }

    /// Re-read the terminal size. Returns the new size if it changed.
    pub fn poll_resize(&self) -> Option<(u16, u16)> {
        self.update(Self::query())
    }

    /// Record `size`, returning it if it differs from the previous one.
    pub fn update(&self, size: (u16, u16)) -> Option<(u16, u16)> {
        let mut current = self.size.lock().unwrap_or_else(|e| e.into_inner());
        if *current == size {
            return None;
        }
        *current = size;
        Some(size)
    }

    /// Current width in columns.
    #[must_use]
    pub fn width(&self) -> u16 {
        self.size.lock().unwrap_or_else(|e| e.into_inner()).0
    }

    /// Characters available for the file name next to the bar.
    #[must_use]
    pub fn message_width(&self) -> usize {
        usize::from(self.width().saturating_sub(TEMPLATE_COLUMNS)).max(MIN_MESSAGE_WIDTH)
    }
}

impl Default for TerminalLayout {
    fn default() -> Self {
        Self::new()
    }
}

/// Terminal progress display.
pub struct Progress {
    bar: ProgressBar,
    layout: TerminalLayout,
    bytes: AtomicU64,
    quiet: bool,
}

impl Progress {
    /// Create a progress display.
    ///
    /// # Arguments
    ///
    /// * `quiet` - If true, nothing is drawn.
    #[must_use]
    pub fn new(quiet: bool) -> Self {
        let bar = ProgressBar::hidden();
        if !quiet {
            bar.set_draw_target(ProgressDrawTarget::stderr());
        }
        Self {
            bar,
            layout: TerminalLayout::new(),
            bytes: AtomicU64::new(0),
            quiet,
        }
    }

    /// Total bytes read so far.
    #[must_use]
    pub fn bytes_hashed(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    fn style() -> ProgressStyle {
        ProgressStyle::with_template(
            "{spinner:.green} [{elapsed_precise}] [{bar:30.cyan/blue}] {pos}/{len} ({percent:>3}%) {msg}",
        )
        .unwrap_or_else(|_| ProgressStyle::default_bar())
        .progress_chars("#>-")
    }
}

impl ProgressCallback for Progress {
    fn on_run_start(&self, mode: &str, total: usize) {
        if self.quiet {
            return;
        }
        self.bar.set_style(Self::style());
        self.bar.set_length(total as u64);
        self.bar.set_position(0);
        self.bar.set_message(mode.to_string());
        self.bar.enable_steady_tick(Duration::from_millis(120));
    }

    fn on_file_start(&self, path: &Path) {
        if self.quiet {
            return;
        }
        if let Some((cols, _)) = self.layout.poll_resize() {
            log::trace!("Terminal resized to {} columns", cols);
        }
        let shown = truncate_path(&path.to_string_lossy(), self.layout.message_width());
        self.bar.set_message(shown);
    }

    fn on_chunk(&self, _path: &Path, bytes: u64) {
        self.bytes.fetch_add(bytes, Ordering::Relaxed);
    }

    fn on_file_done(&self, _path: &Path, _outcome: &Outcome) {
        if !self.quiet {
            self.bar.inc(1);
        }
    }

    fn on_file_failed(&self, path: &Path, error: &EntryError) {
        if self.quiet {
            return;
        }
        self.bar
            .println(format!("{} {}: {}", "FAILED".red().bold(), path.display(), error));
        self.bar.inc(1);
    }

    fn on_run_end(&self) {
        if self.quiet {
            return;
        }
        self.bar.finish_with_message(format!(
            "done, {} read",
            bytesize::ByteSize::b(self.bytes_hashed())
        ));
    }
}

/// Keep the tail of a path so the file name stays visible.
fn truncate_path(path: &str, max_len: usize) -> String {
    let count = path.chars().count();
    if count <= max_len {
        return path.to_string();
    }
    let keep = max_len.saturating_sub(3);
    let tail: String = path.chars().skip(count - keep).collect();
    format!("...{tail}")
}
