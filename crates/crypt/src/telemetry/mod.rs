//! Structured logging for the `crypt` binary.
//!
//! Records flow on stdout, so every log line goes to stderr as JSON.
//!
//! # Telemetry invariants
//!
//! - **No key material or passwords** may appear in any span or log field.
//!   A field warning carries the value that was emitted untouched, which is
//!   already on stdout.
//! - Log level is configurable via `CRYPT_LOG_LEVEL` (default: `info`);
//!   `RUST_LOG` takes precedence when set.

use anyhow::Result;
use tracing_subscriber::EnvFilter;

/// Initialise the global tracing subscriber.
///
/// # Errors
///
/// Returns an error if a subscriber has already been set.
pub fn init(log_level: &str) -> Result<()> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(log_level));

    tracing_subscriber::fmt()
        .json()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_current_span(true)
        .try_init()
        .map_err(|e| anyhow::anyhow!("failed to initialise tracing subscriber: {e}"))
}
