//! Diagnostic logging setup.

use tracing_subscriber::EnvFilter;

/// Environment variable holding the `tracing` filter directives.
pub const LOG_ENV: &str = "LOOPSCOPE_LOG";

/// Installs the global subscriber, writing to stderr.
///
/// `LOOPSCOPE_LOG` wins when set; otherwise `verbose` selects `debug` for this
/// crate and the default is `warn`. Calling this twice is harmless, the second
/// install is ignored.
pub fn init(verbose: bool) {
    let fallback = if verbose { "loopscope=debug" } else { "warn" };
    let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| EnvFilter::new(fallback));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .without_time()
        .try_init();
}
