//! Human-readable duplicate report.
//!
//! One line per group: the digest, the representative and the duplicates
//! that would be linked to it.
//!
//! ```text
//! a9993e36...d89d /data/a.txt --> /data/b.txt, /data/c.txt
//! ```
//!
//! On Unix, paths are written as raw bytes, as in the dedup script.

use std::borrow::Cow;
use std::io::Write;
use std::path::Path;

use crate::duplicates::DuplicateGroup;

/// Formatter for the duplicate report.
pub struct DuplicateReport<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> DuplicateReport<'a> {
    /// Create a report for the given groups.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Write the report.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        for group in self.groups.iter().filter(|g| !g.is_empty()) {
            write!(writer, "{} ", group.digest)?;
            writer.write_all(&path_bytes(&group.representative))?;
            writer.write_all(b" --> ")?;
            for (i, duplicate) in group.duplicates.iter().enumerate() {
                if i > 0 {
                    writer.write_all(b", ")?;
                }
                writer.write_all(&path_bytes(duplicate))?;
            }
            writer.write_all(b"\n")?;
        }
        Ok(())
    }
}

#[cfg(unix)]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    use std::os::unix::ffi::OsStrExt;
    Cow::Borrowed(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn path_bytes(path: &Path) -> Cow<'_, [u8]> {
    match path.to_string_lossy() {
        Cow::Borrowed(s) => Cow::Borrowed(s.as_bytes()),
        Cow::Owned(s) => Cow::Owned(s.into_bytes()),
    }
}
