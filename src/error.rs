//! Exit codes and structured error reporting.
//!
//! Per-file errors live with the code that raises them
//! ([`EntryError`](crate::entry::EntryError),
//! [`HashError`](crate::scanner::HashError),
//! [`StoreError`](crate::store::StoreError)). This module covers how a
//! whole invocation ends.

use serde::Serialize;

/// Exit codes for the application.
///
/// - 0: Success (every file processed without failure)
/// - 1: General error (bad arguments, unreadable root, I/O on output)
/// - 2: Integrity failure (at least one file failed to verify or hash)
/// - 130: Interrupted by user (Ctrl+C)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ExitCode {
    /// Success: the run completed and nothing failed.
    Success = 0,
    /// General error: the run could not be carried out.
    GeneralError = 1,
    /// Integrity failure: the run completed but some files failed.
    IntegrityFailure = 2,
    /// Interrupted: the run was stopped by Ctrl+C.
    Interrupted = 130,
}

impl ExitCode {
    /// Get the numeric exit code.
    #[must_use]
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Get the machine-readable code prefix.
    #[must_use]
    pub fn code_prefix(self) -> &'static str {
        match self {
            Self::Success => "XS000",
            Self::GeneralError => "XS001",
            Self::IntegrityFailure => "XS002",
            Self::Interrupted => "XS130",
        }
    }
}

/// Structured error information for JSON output.
#[derive(Debug, Serialize)]
pub struct StructuredError {
    /// The error code (e.g., "XS001")
    pub code: String,
    /// The exit code number
    pub exit_code: i32,
    /// Human-readable error message, including its causes
    pub message: String,
}

impl StructuredError {
    /// Create a new structured error from an anyhow error and an exit code.
    #[must_use]
    pub fn new(err: &anyhow::Error, exit_code: ExitCode) -> Self {
        Self {
            code: exit_code.code_prefix().to_string(),
            exit_code: exit_code.as_i32(),
            message: format!("{err:#}"),
        }
    }
}
