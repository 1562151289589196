use chrono::{DateTime, Utc};

/// A domain event: an immutable fact, named and versioned for the stream.
///
/// Implementors are append-only payloads; nothing downstream may mutate one.
/// The schema version exists so stored payloads can evolve without breaking
/// replays.
pub trait Event: Clone + core::fmt::Debug + Send + Sync + 'static {
    /// Stable event name (e.g. "orders.order.status_changed").
    fn event_type(&self) -> &'static str;

    /// Schema version for this event type.
    fn version(&self) -> u32;

    /// When the event occurred (business time, not persistence time).
    fn occurred_at(&self) -> DateTime<Utc>;
}
