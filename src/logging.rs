//! Logging setup.
//!
//! Everything logs through the `log` facade; `env_logger` writes to stderr
//! so stdout stays clean for reports and scripts. The level comes from, in
//! order: `RUST_LOG`, `-q` (errors only), `-v`/`-vv`/`-vvv`
//! (info/debug/trace), and finally `warn`, which keeps routine runs quiet
//! apart from per-file failures.
//!
//! ```rust,no_run
//! use xattrsum::logging::init_logging;
//!
//! init_logging(2, false); // -vv
//! log::debug!("visible");
//! ```

use std::io::Write;

use env_logger::Builder;
use log::LevelFilter;

/// Initialize logging from CLI verbosity flags.
///
/// Only the first call in a process takes effect; later calls are ignored.
pub fn init_logging(verbose: u8, quiet: bool) {
    let mut builder = Builder::new();

    let from_env = std::env::var_os("RUST_LOG").is_some();
    if from_env {
        builder.parse_default_env();
    } else {
        builder.filter_level(determine_level(verbose, quiet));
    }

    builder.format(move |buf, record| {
        let style = buf.default_level_style(record.level());
        if verbose >= 2 {
            writeln!(
                buf,
                "{} {style}{:<5}{style:#} [{}] {}",
                buf.timestamp_seconds(),
                record.level(),
                record.module_path().unwrap_or("unknown"),
                record.args()
            )
        } else {
            writeln!(
                buf,
                "{style}{:<5}{style:#} {}",
                record.level(),
                record.args()
            )
        }
    });

    if builder.try_init().is_ok() {
        log::debug!(
            "Logging initialized at {} ({})",
            log::max_level(),
            if from_env { "RUST_LOG" } else { "flags" }
        );
    }
}

/// Map CLI flags to a level filter. `quiet` wins over `verbose`.
fn determine_level(verbose: u8, quiet: bool) -> LevelFilter {
    if quiet {
        return LevelFilter::Error;
    }
    match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    }
}
