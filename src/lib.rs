//! xattrsum - content fingerprints stored in extended attributes
//!
//! Every regular file under the given roots carries two attributes: the hex
//! digest of its content (`user.sha1`) and the local time that digest was
//! last computed or confirmed (`user.sha1date`). From those the tool can
//!
//! - fingerprint new files ([`orchestrator::Mode::Compute`]),
//! - re-hash files that have not been checked recently and report silent
//!   corruption ([`orchestrator::Mode::Verify`]),
//! - accept deliberate changes ([`orchestrator::Mode::Update`]),
//! - group files by stored digest and emit a hard-link script
//!   ([`duplicates`], [`output::DedupScript`]).

pub mod cli;
pub mod config;
pub mod duplicates;
pub mod entry;
pub mod error;
pub mod logging;
pub mod orchestrator;
pub mod output;
pub mod progress;
pub mod scanner;
pub mod signal;
pub mod store;

use std::io::Write;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use anyhow::Context;

use crate::cli::{Cli, Commands, PathArgs};
use crate::config::Config;
use crate::entry::{EntryContext, FileEntry};
use crate::error::ExitCode;
use crate::orchestrator::{Mode, Orchestrator};
use crate::output::{DedupScript, DuplicateReport, SummaryOutput};
use crate::progress::Progress;
use crate::scanner::{Hasher, Walker};
use crate::store::AttributeStore;

/// Run the application with parsed arguments.
///
/// Sets up logging, color and the Ctrl+C handler, then executes the
/// command against the filesystem's extended attributes, writing results
/// to stdout.
///
/// # Errors
///
/// Returns an error for failures that prevent the command from running at
/// all: bad configuration, an unreadable root, a failed write to stdout.
/// Per-file failures are reported in the summary and reflected in the
/// returned [`ExitCode`].
pub fn run_app(cli: Cli) -> anyhow::Result<ExitCode> {
    logging::init_logging(cli.verbose, cli.quiet);
    if cli.no_color {
        yansi::disable();
    }

    let shutdown = signal::install_handler().context("failed to install Ctrl+C handler")?;
    let store = platform_store()?;

    let stdout = std::io::stdout();
    let mut out = stdout.lock();
    execute(&cli, &*store, Some(shutdown.get_flag()), &mut out)
}

#[cfg(unix)]
fn platform_store() -> anyhow::Result<Box<dyn AttributeStore>> {
    if !store::XattrStore::is_supported() {
        anyhow::bail!("extended attributes are not supported on this platform");
    }
    Ok(Box::new(store::XattrStore::new()))
}

#[cfg(not(unix))]
fn platform_store() -> anyhow::Result<Box<dyn AttributeStore>> {
    anyhow::bail!("extended attributes are not supported on this platform")
}

/// Execute `cli` against `store`, writing command output to `out`.
///
/// `shutdown` is polled between files during compute, verify and update.
///
/// # Errors
///
/// See [`run_app`].
pub fn execute<W: Write>(
    cli: &Cli,
    store: &dyn AttributeStore,
    shutdown: Option<Arc<AtomicBool>>,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let config = effective_config(cli)?;
    log::debug!("Effective configuration: {:?}", config);

    let keys = config.attribute_keys();
    let hasher = Hasher::new(config.algorithm).with_chunk_size(config.chunk_size);

    match &cli.command {
        Commands::Config => {
            let text = config.to_toml().context("failed to render configuration")?;
            write!(out, "{text}")?;
            Ok(ExitCode::Success)
        }
        Commands::Hash(args) => {
            let digest = hasher
                .digest(&args.path)
                .with_context(|| format!("failed to hash {}", args.path.display()))?;
            writeln!(out, "{} {}", args.path.display(), digest)?;
            Ok(ExitCode::Success)
        }
        Commands::Compute(args) => {
            let entries = scan(args, &config)?;
            let ctx = EntryContext::new(store, &keys, &hasher);
            run_mode(Mode::Compute, entries, ctx, &config, cli.quiet, shutdown, out)
        }
        Commands::Verify(args) => {
            let entries = scan(&args.paths, &config)?;
            let max_age_days = args.max_age_days.unwrap_or(config.max_age_days);
            let ctx = EntryContext::new(store, &keys, &hasher);
            run_mode(
                Mode::Verify { max_age_days },
                entries,
                ctx,
                &config,
                cli.quiet,
                shutdown,
                out,
            )
        }
        Commands::Update(args) => {
            let entries = scan(&args.paths, &config)?;
            let max_age_days = args.max_age_days.unwrap_or(config.max_age_days);
            let ctx = EntryContext::new(store, &keys, &hasher);
            run_mode(
                Mode::Update { max_age_days },
                entries,
                ctx,
                &config,
                cli.quiet,
                shutdown,
                out,
            )
        }
        Commands::Duplicates(args) => {
            let entries = scan(args, &config)?;
            let ctx = EntryContext::new(store, &keys, &hasher);
            let groups = Orchestrator::new(entries, ctx).duplicates();
            DuplicateReport::new(&groups).write_to(out)?;
            Ok(ExitCode::Success)
        }
        Commands::DedupScript(args) => {
            let entries = scan(args, &config)?;
            let ctx = EntryContext::new(store, &keys, &hasher);
            let groups = Orchestrator::new(entries, ctx).duplicates();
            let script = DedupScript::new(&groups);
            script.write_to(out)?;
            log::info!("Wrote {} link commands", script.link_count());
            Ok(ExitCode::Success)
        }
    }
}

/// Merge file and environment settings with command-line overrides.
///
/// # Errors
///
/// Returns an error if the configuration cannot be loaded or the chunk
/// size does not fit in memory.
pub fn effective_config(cli: &Cli) -> anyhow::Result<Config> {
    let mut config = Config::load(cli.config.as_deref()).context("failed to load configuration")?;

    if let Some(algorithm) = cli.algorithm {
        config.algorithm = algorithm;
    }
    if let Some(size) = cli.chunk_size {
        config.chunk_size = usize::try_from(size).context("chunk size is too large")?;
    }
    if let Some(args) = cli.command.paths() {
        config.follow_symlinks |= args.follow_symlinks;
        config.skip_hidden |= args.skip_hidden;
        config
            .ignore_patterns
            .extend(args.ignore_patterns.iter().cloned());
        if args.no_progress {
            config.progress = false;
        }
    }
    if cli.quiet {
        config.progress = false;
    }
    Ok(config)
}

fn scan(args: &PathArgs, config: &Config) -> anyhow::Result<Vec<FileEntry>> {
    let walker = Walker::new(args.paths.clone(), config.walker_config());
    let entries = walker.scan().context("scan failed")?;
    log::info!("Found {} files under {} roots", entries.len(), walker.roots().len());
    Ok(entries)
}

fn run_mode<W: Write>(
    mode: Mode,
    entries: Vec<FileEntry>,
    ctx: EntryContext<'_>,
    config: &Config,
    quiet: bool,
    shutdown: Option<Arc<AtomicBool>>,
    out: &mut W,
) -> anyhow::Result<ExitCode> {
    let progress = Progress::new(!config.progress);
    let mut orchestrator = Orchestrator::new(entries, ctx.with_progress(&progress));
    if let Some(flag) = shutdown {
        orchestrator = orchestrator.with_shutdown_flag(flag);
    }

    let summary = orchestrator.run(mode);
    if !quiet || summary.has_failures() {
        SummaryOutput::new(&summary).write_to(out)?;
    }

    Ok(if summary.interrupted {
        ExitCode::Interrupted
    } else if summary.has_failures() {
        ExitCode::IntegrityFailure
    } else {
        ExitCode::Success
    })
}
