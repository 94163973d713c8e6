//! Process-wide tracing setup for plugin binaries.

use std::sync::Once;

use tracing_subscriber::EnvFilter;

/// Environment variable holding the log filter, e.g. `CLASP_LOG=clasp=debug`.
pub const LOG_ENV: &str = "CLASP_LOG";

static INIT: Once = Once::new();

/// Install a fmt subscriber filtered by [`LOG_ENV`] (default `info`) and
/// bridge `log` records into it.
///
/// Safe to call from every plugin instance; only the first call does
/// anything, and a subscriber installed by the host is left alone.
/// The `log` bridge is installed either way.
pub fn init_logging() {
    INIT.call_once(|| {
        let filter = EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "info".into());
        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .try_init();
        if tracing_log::LogTracer::init().is_err() {
            tracing::debug!("a `log` logger is already installed");
        }
    });
}
