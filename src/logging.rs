//! # Logging bootstrap (`logging` feature).
//!
//! Installs a global `tracing-subscriber` registry for hosts that do not
//! bring their own: JSON output for production pipelines, compact output
//! for development. The level filter comes from `RUST_LOG`, falling back
//! to `info`.
//!
//! Pair this with the bundled [`LogWriter`](crate::LogWriter) subscriber,
//! which renders lifecycle events as `tracing` records. Log rotation and
//! shipping are left to the host's collector.
//!
//! ## Example
//! ```no_run
//! use servisor::logging::{self, LogFormat};
//!
//! logging::init(LogFormat::Pretty).expect("no global subscriber installed yet");
//! ```

use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::{SubscriberInitExt, TryInitError};
use tracing_subscriber::{EnvFilter, fmt};

/// Output format for the bootstrap subscriber.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    /// Newline-delimited JSON records (production).
    Json,
    /// Compact human-readable output (development).
    Pretty,
}

/// Installs the global `tracing` subscriber.
///
/// Fails if a global subscriber is already set; hosts with their own
/// `tracing` setup should skip this and just register a
/// [`LogWriter`](crate::LogWriter).
pub fn init(format: LogFormat) -> Result<(), TryInitError> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    let registry = tracing_subscriber::registry().with(filter);

    match format {
        LogFormat::Json => registry.with(fmt::layer().json()).try_init(),
        LogFormat::Pretty => registry.with(fmt::layer().compact()).try_init(),
    }
}
