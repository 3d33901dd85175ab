//! Command-line interface definitions for xattrsum.
//!
//! Global options (verbosity, color, config file, algorithm) apply to every
//! subcommand. Values given here override the config file and environment.
//!
//! # Example
//!
//! ```bash
//! # Fingerprint everything under /srv that has no digest yet
//! xattrsum compute /srv
//!
//! # Re-check files not verified in the last 90 days
//! xattrsum verify --max-age 90 /srv
//!
//! # Accept deliberate changes to stale files
//! xattrsum update /srv/photos/edited
//!
//! # Emit a hard-link script for duplicates
//! xattrsum dedup-script /srv > dedup.sh
//! ```

use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

use crate::scanner::HashAlgorithm;

/// Content fingerprints stored in extended attributes.
///
/// Each file's digest and the time it was last confirmed are kept in the
/// file's own xattrs, so the fingerprints travel with the files. Stored
/// digests are used to detect silent corruption and to find duplicates.
#[derive(Debug, Parser)]
#[command(name = "xattrsum")]
#[command(author, version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Increase verbosity level (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all output except errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Disable colored output
    #[arg(long, global = true, env = "NO_COLOR")]
    pub no_color: bool,

    /// Configuration file (default: platform config directory)
    #[arg(long, global = true, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Digest algorithm; selects the attribute names as well
    #[arg(long, global = true, value_enum)]
    pub algorithm: Option<HashAlgorithm>,

    /// Read size for hashing (e.g., 64KiB, 8MiB)
    #[arg(long, global = true, value_name = "SIZE", value_parser = parse_size)]
    pub chunk_size: Option<u64>,

    /// Report fatal errors as JSON on stderr
    #[arg(long, global = true)]
    pub json_errors: bool,

    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Commands,
}

/// Available subcommands.
#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Store a digest on every file that has none
    Compute(PathArgs),
    /// Re-hash files whose last verification is older than the window
    Verify(AgeArgs),
    /// Overwrite the digest of files whose last verification is older than the window
    Update(AgeArgs),
    /// Print the digest of a single file without touching its attributes
    Hash(HashArgs),
    /// List groups of files sharing a stored digest
    Duplicates(PathArgs),
    /// Print a shell script that hard-links duplicates to one copy
    DedupScript(PathArgs),
    /// Print the effective configuration as TOML
    Config,
}

impl Commands {
    /// Walker settings for commands that scan a tree.
    #[must_use]
    pub fn paths(&self) -> Option<&PathArgs> {
        match self {
            Self::Compute(args) | Self::Duplicates(args) | Self::DedupScript(args) => Some(args),
            Self::Verify(age) | Self::Update(age) => Some(&age.paths),
            Self::Hash(_) | Self::Config => None,
        }
    }
}

/// Roots to scan and how to walk them.
#[derive(Debug, Args)]
pub struct PathArgs {
    /// Files or directories to process
    #[arg(value_name = "PATH", required = true)]
    pub paths: Vec<PathBuf>,

    /// Glob patterns to ignore (can be specified multiple times)
    #[arg(short, long = "ignore", value_name = "PATTERN")]
    pub ignore_patterns: Vec<String>,

    /// Follow symbolic links during scan
    ///
    /// Warning: May cause infinite loops if symlinks form cycles.
    #[arg(long)]
    pub follow_symlinks: bool,

    /// Skip hidden files and directories (starting with .)
    #[arg(long)]
    pub skip_hidden: bool,

    /// Do not draw a progress bar
    #[arg(long)]
    pub no_progress: bool,
}

/// Arguments for the verify and update subcommands.
#[derive(Debug, Args)]
pub struct AgeArgs {
    /// Files verified within this many days are skipped (default from config: 180)
    #[arg(long = "max-age", value_name = "DAYS")]
    pub max_age_days: Option<u32>,

    #[command(flatten)]
    pub paths: PathArgs,
}

/// Arguments for the hash subcommand.
#[derive(Debug, Args)]
pub struct HashArgs {
    /// File to hash
    #[arg(value_name = "FILE")]
    pub path: PathBuf,
}

/// Parse a human-readable size string into bytes.
///
/// Supports suffixes: B, KB, KiB, MB, MiB, GB, GiB
/// Case-insensitive. Numbers without suffix are treated as bytes.
///
/// # Examples
///
/// ```
/// use xattrsum::cli::parse_size;
///
/// assert_eq!(parse_size("4096").unwrap(), 4096);
/// assert_eq!(parse_size("64KiB").unwrap(), 65_536);
/// assert_eq!(parse_size("8MiB").unwrap(), 8_388_608);
/// ```
/// # Errors
///
/// Returns an error if the string is empty, contains an invalid number,
/// is zero, or has an unknown size suffix.
pub fn parse_size(s: &str) -> Result<u64, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("Size cannot be empty".to_string());
    }

    let (num_str, suffix) = match s.find(|c: char| !c.is_ascii_digit() && c != '.') {
        Some(idx) => (&s[..idx], s[idx..].trim().to_uppercase()),
        None => (s, String::new()),
    };

    let num: f64 = num_str
        .parse()
        .map_err(|_| format!("Invalid number: '{num_str}'"))?;

    let multiplier: u64 = match suffix.as_str() {
        "" | "B" => 1,
        "KB" | "K" => 1_000,
        "KIB" => 1_024,
        "MB" | "M" => 1_000_000,
        "MIB" => 1_048_576,
        "GB" | "G" => 1_000_000_000,
        "GIB" => 1_073_741_824,
        _ => return Err(format!("Unknown size suffix: '{suffix}'")),
    };

    let bytes = (num * multiplier as f64) as u64;
    if bytes == 0 {
        return Err("Size must be at least one byte".to_string());
    }
    Ok(bytes)
}
