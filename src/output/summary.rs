//! End-of-run summary.

use std::io::Write;

use yansi::Paint;

use crate::orchestrator::RunSummary;

/// Formatter for a [`RunSummary`].
pub struct SummaryOutput<'a> {
    summary: &'a RunSummary,
}

impl<'a> SummaryOutput<'a> {
    /// Create a formatter for `summary`.
    #[must_use]
    pub fn new(summary: &'a RunSummary) -> Self {
        Self { summary }
    }

    /// Write the summary and, if any, the list of failing paths.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        let s = self.summary;
        writeln!(writer, "Summary")?;
        writeln!(writer, "=======")?;
        writeln!(writer, "Total files   : {}", s.total)?;
        writeln!(writer, "Verified files: {}", s.verified)?;
        writeln!(writer, "Computed files: {}", s.computed)?;
        if s.failures.is_empty() {
            writeln!(writer, "Errors        : 0")?;
        } else {
            writeln!(writer, "Errors        : {}", s.failures.len().red().bold())?;
        }
        if s.interrupted {
            writeln!(
                writer,
                "Interrupted after {} of {} files",
                s.processed, s.total
            )?;
        }

        if !s.failures.is_empty() {
            writeln!(writer)?;
            writeln!(writer, "Faulty files")?;
            writeln!(writer, "============")?;
            for failure in &s.failures {
                writeln!(writer, "{}", failure.path.display())?;
            }
        }
        Ok(())
    }
}
