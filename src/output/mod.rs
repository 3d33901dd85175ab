//! Output formatters.
//!
//! - [`report`]: human-readable duplicate list
//! - [`script`]: POSIX shell script that hard-links duplicates
//! - [`summary`]: end-of-run totals and failing paths

pub mod report;
pub mod script;
pub mod summary;

// Re-export main types
pub use report::DuplicateReport;
pub use script::{shell_quote, DedupScript};
pub use summary::SummaryOutput;
