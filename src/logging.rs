//! Logging setup
//!
//! Logs go to stderr so stdout carries nothing but the query answer. The
//! library only emits `tracing` events; installing a subscriber is up to the
//! binary.

use tracing_subscriber::util::TryInitError;
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

/// Level used when neither `--log-level` nor `RUST_LOG` is set
pub const DEFAULT_LEVEL: &str = "warn";

/// Filter from an explicit level, else `RUST_LOG`, else `DEFAULT_LEVEL`
///
/// An explicit level that does not parse falls back to the default.
pub fn env_filter(level: Option<&str>) -> EnvFilter {
    match level {
        Some(level) => EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LEVEL)),
    }
}

/// Install the global stderr subscriber
///
/// # Arguments
/// * `level` - Override log level (otherwise uses RUST_LOG or defaults to "warn")
/// * `no_color` - Disable ANSI colors
pub fn init_logger(level: Option<&str>, no_color: bool) -> Result<(), TryInitError> {
    let stderr_layer = fmt::layer()
        .with_writer(std::io::stderr)
        .with_target(false)
        .with_ansi(!no_color)
        .with_filter(env_filter(level));

    tracing_subscriber::registry().with(stderr_layer).try_init()
}
