//! Structured logging via `tracing-subscriber`.
//!
//! Output is JSON lines filtered through `RUST_LOG`; without it everything at
//! `info` and above is emitted. Additional layers (correlation ids, OTLP)
//! hang off this one place when the deployment needs them.

use tracing_subscriber::EnvFilter;

/// Install the process-wide subscriber.
///
/// Calling this twice is harmless: `try_init` refuses the second subscriber
/// and we ignore the error.
pub fn init() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .json()
        .with_timer(tracing_subscriber::fmt::time::SystemTime)
        .with_target(false)
        .try_init();
}
