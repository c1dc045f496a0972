//! Diagnostic logging.
//!
//! Library code only emits `tracing` events. The binary installs a
//! subscriber that writes them to stderr, filtered by `RUST_LOG` when set and
//! by the command-line verbosity otherwise.

use tracing::Subscriber;
use tracing::subscriber::set_global_default;
use tracing_subscriber::fmt::MakeWriter;
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::{EnvFilter, fmt};

use crate::error::{Result, ToolkitError};

/// Default filter for a verbosity level (number of `-v` flags).
pub fn default_filter(verbosity: u8) -> &'static str {
    match verbosity {
        0 => "pdftoolkit=warn",
        1 => "pdftoolkit=info",
        _ => "pdftoolkit=debug",
    }
}

/// Build a subscriber writing human-readable lines to `sink`.
pub fn get_subscriber<Sink>(verbosity: u8, sink: Sink) -> impl Subscriber + Send + Sync
where
    Sink: for<'a> MakeWriter<'a> + Send + Sync + 'static,
{
    let env_filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbosity)));

    tracing_subscriber::registry().with(env_filter).with(
        fmt::layer()
            .with_writer(sink)
            .with_target(false)
            .without_time(),
    )
}

/// Install the stderr subscriber as the global default.
///
/// # Errors
///
/// Returns an error if a global subscriber is already set.
pub fn init(verbosity: u8) -> Result<()> {
    set_global_default(get_subscriber(verbosity, std::io::stderr))
        .map_err(|e| ToolkitError::other(format!("Failed to install logger: {e}")))
}
