//! Logging bootstrap for embedders and for this crate's own tests.
//!
//! Library code never installs a logger on its own; it only ever calls the
//! `log` macros. This module exists so an embedder (or an integration test)
//! can opt into a sensible default without reaching for `env_logger` itself.

use log::LevelFilter;

/// Initialize `env_logger` at a level derived from a verbosity count.
///
/// `0` maps to `Warn`, each further step walks down the level ladder,
/// bottoming out at `Trace`. Calling this more than once in the same
/// process is a no-op after the first call (`env_logger::try_init` swallows
/// the "already initialized" error).
pub fn init(verbosity: u8) {
    let level = match verbosity {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        2 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };

    let _ = env_logger::Builder::new().filter_level(level).try_init();
}
