//! Hard-link deduplication script.
//!
//! The script is plain POSIX `sh`: a `#!/bin/sh` line followed by one
//! `ln -f <representative> <duplicate>` per duplicate. Running it replaces
//! each duplicate with a hard link to its group's representative.
//!
//! # Quoting
//!
//! Every path is wrapped in single quotes and each embedded `'` becomes
//! `'\''`. Nothing inside single quotes is special to the shell, so spaces,
//! `$`, backticks, globs and newlines all pass through literally. On Unix
//! the raw path bytes are written, so non-UTF-8 names survive as well.
//!
//! # Usage
//!
//! ```
//! use xattrsum::duplicates::DuplicateGroup;
//! use xattrsum::output::DedupScript;
//! use std::path::PathBuf;
//!
//! let groups = vec![DuplicateGroup {
//!     digest: "d1".into(),
//!     representative: PathBuf::from("/data/a.txt"),
//!     duplicates: vec![PathBuf::from("/data/it's a copy.txt")],
//! }];
//!
//! let mut out = Vec::new();
//! DedupScript::new(&groups).write_to(&mut out).unwrap();
//! assert_eq!(
//!     String::from_utf8(out).unwrap(),
//!     "#!/bin/sh\nln -f '/data/a.txt' '/data/it'\\''s a copy.txt'\n"
//! );
//! ```

use std::io::Write;
use std::path::Path;

use crate::duplicates::DuplicateGroup;

/// Formatter for the deduplication script.
pub struct DedupScript<'a> {
    groups: &'a [DuplicateGroup],
}

impl<'a> DedupScript<'a> {
    /// Create a script for the given groups.
    #[must_use]
    pub fn new(groups: &'a [DuplicateGroup]) -> Self {
        Self { groups }
    }

    /// Number of `ln` commands the script will contain.
    #[must_use]
    pub fn link_count(&self) -> usize {
        self.groups.iter().map(DuplicateGroup::len).sum()
    }

    /// Write the script.
    ///
    /// # Errors
    ///
    /// Returns an error if writing fails.
    pub fn write_to<W: Write>(&self, writer: &mut W) -> std::io::Result<()> {
        writeln!(writer, "#!/bin/sh")?;
        for group in self.groups {
            let source = quote_path(&group.representative);
            for duplicate in &group.duplicates {
                writer.write_all(b"ln -f ")?;
                writer.write_all(&source)?;
                writer.write_all(b" ")?;
                writer.write_all(&quote_path(duplicate))?;
                writer.write_all(b"\n")?;
            }
        }
        Ok(())
    }
}

/// Quote a string for POSIX `sh`.
///
/// ```
/// use xattrsum::output::script::shell_quote;
///
/// assert_eq!(shell_quote("it's a file.txt"), r"'it'\''s a file.txt'");
/// ```
#[must_use]
pub fn shell_quote(text: &str) -> String {
    let quoted = quote_bytes(text.as_bytes());
    // Only ASCII bytes are inserted, so UTF-8 input stays UTF-8.
    String::from_utf8_lossy(&quoted).into_owned()
}

fn quote_bytes(raw: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(raw.len() + 2);
    out.push(b'\'');
    for &byte in raw {
        if byte == b'\'' {
            out.extend_from_slice(b"'\\''");
        } else {
            out.push(byte);
        }
    }
    out.push(b'\'');
    out
}

#[cfg(unix)]
fn quote_path(path: &Path) -> Vec<u8> {
    use std::os::unix::ffi::OsStrExt;
    quote_bytes(path.as_os_str().as_bytes())
}

#[cfg(not(unix))]
fn quote_path(path: &Path) -> Vec<u8> {
    quote_bytes(path.to_string_lossy().as_bytes())
}
