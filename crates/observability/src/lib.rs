//! Process-wide observability setup.

/// Tracing configuration (filters, layers).
pub mod tracing;

/// Initialize logging/tracing for the process.
///
/// Idempotent: the first caller wins, later calls are no-ops.
pub fn init() {
    tracing::init();
}
