use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use std::sync::Arc;
use thiserror::Error;
use uuid::Uuid;

use brigade_core::{AggregateId, BranchId, ExpectedVersion};

/// An event decided by an aggregate but not yet written to its stream.
///
/// Built from a typed domain event via [`UncommittedEvent::from_typed`],
/// which serializes the payload and captures the metadata later needed to
/// deserialize it again. The store turns it into a [`StoredEvent`] by
/// assigning a sequence number at append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UncommittedEvent {
    pub event_id: Uuid,
    pub branch_id: BranchId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl UncommittedEvent {
    /// Wrap a typed domain event for persistence.
    pub fn from_typed<E>(
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        event_id: Uuid,
        event: &E,
    ) -> Result<Self, EventStoreError>
    where
        E: brigade_events::Event + Serialize,
    {
        let payload = serde_json::to_value(event).map_err(|e| {
            EventStoreError::InvalidAppend(format!("payload serialization failed: {e}"))
        })?;

        Ok(Self {
            event_id,
            branch_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            event_type: event.event_type().to_string(),
            event_version: event.version(),
            occurred_at: event.occurred_at(),
            payload,
        })
    }
}

/// One persisted position of an aggregate stream.
///
/// A stream is one aggregate instance keyed by `(branch_id, aggregate_id)`;
/// within it, `sequence_number` runs 1, 2, 3, ... with no gaps. That number
/// drives ordering, the compare-and-swap version check, and idempotent
/// projection catch-up.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoredEvent {
    pub event_id: Uuid,
    pub branch_id: BranchId,
    pub aggregate_id: AggregateId,
    pub aggregate_type: String,

    /// Position in the aggregate stream.
    pub sequence_number: u64,

    pub event_type: String,
    pub event_version: u32,
    pub occurred_at: DateTime<Utc>,

    pub payload: JsonValue,
}

impl StoredEvent {
    pub fn stream_version(&self) -> u64 {
        self.sequence_number
    }

    /// Re-wrap for publication on the bus.
    pub fn to_envelope(&self) -> brigade_events::EventEnvelope<JsonValue> {
        brigade_events::EventEnvelope::new(
            self.branch_id,
            self.aggregate_id,
            self.aggregate_type.clone(),
            self.sequence_number,
            self.event_id,
            self.payload.clone(),
        )
    }
}

/// Event store operation error.
///
/// Infrastructure failures only (storage, concurrency, isolation); domain
/// failures never reach this type.
#[derive(Debug, Error)]
pub enum EventStoreError {
    #[error("compare-and-swap failed: {0}")]
    Concurrency(String),

    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),

    #[error("aggregate type mismatch: {0}")]
    AggregateTypeMismatch(String),

    #[error("invalid append: {0}")]
    InvalidAppend(String),

    #[error("event publication failed: {0}")]
    Publish(String),
}

/// Append-only, branch-scoped event storage.
///
/// Implementations must reject cross-branch operations, enforce the
/// compare-and-swap version check before any append, assign sequence numbers
/// with no gaps or duplicates, and persist each batch atomically.
pub trait EventStore: Send + Sync {
    /// Append a batch of events to one aggregate stream.
    ///
    /// Sequence numbers start at `current_version + 1`; the append fails with
    /// [`EventStoreError::Concurrency`] if `expected_version` no longer
    /// matches the stream.
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;

    /// Load the full stream for a branch + aggregate, in sequence order.
    ///
    /// An absent stream yields an empty vector (aggregate not yet created).
    fn load_stream(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError>;
}

impl<S> EventStore for Arc<S>
where
    S: EventStore + ?Sized,
{
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).append(events, expected_version)
    }

    fn load_stream(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        (**self).load_stream(branch_id, aggregate_id)
    }
}
