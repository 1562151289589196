//! Command execution pipeline.
//!
//! Every state change in the system runs the same five steps:
//! load the stream (branch-scoped), rehydrate the aggregate from it, let the
//! aggregate decide events, append them with a compare-and-swap check, then
//! publish the committed events on the bus.
//!
//! The compare-and-swap is the serialization point the order workflow relies
//! on: the dispatcher captures the stream version it loaded and appends with
//! `ExpectedVersion::Exact(that_version)`. When two requests race on the same
//! order, the store accepts one append and the other surfaces as
//! [`DispatchError::StaleState`] — nothing is ever silently overwritten.
//!
//! Publication happens strictly after the append, so a failed publish can be
//! retried without losing a fact (at-least-once; projections are idempotent).
//! The dispatcher itself does no IO; it composes the `EventStore` and
//! `EventBus` traits.

use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use brigade_core::{Aggregate, AggregateId, BranchId, DomainError, ExpectedVersion};
use brigade_events::{EventBus, EventEnvelope};

use crate::event_store::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

#[derive(Debug)]
pub enum DispatchError {
    /// Compare-and-swap failure (a concurrent writer won the race).
    StaleState(String),
    /// Branch isolation violation (cross-branch or cross-aggregate stream mixing).
    BranchIsolation(String),
    /// The requested status change is not a graph edge.
    InvalidTransition(String),
    /// The actor's roles do not grant the operation.
    Unauthorized,
    /// Reconciliation attempted on an order without line items.
    EmptyOrder,
    /// Domain validation failure (deterministic).
    Validation(String),
    /// Domain-level not found.
    NotFound,
    /// Failed to deserialize historical event payloads into the aggregate event type.
    Deserialize(String),
    /// Persisting to the event store failed.
    Store(EventStoreError),
    /// Publication failed after a successful append (at-least-once; retry may duplicate).
    Publish(String),
}

impl From<EventStoreError> for DispatchError {
    fn from(value: EventStoreError) -> Self {
        match &value {
            EventStoreError::Concurrency(msg) => DispatchError::StaleState(msg.clone()),
            EventStoreError::BranchIsolation(msg) => DispatchError::BranchIsolation(msg.clone()),
            _ => DispatchError::Store(value),
        }
    }
}

impl From<DomainError> for DispatchError {
    fn from(value: DomainError) -> Self {
        match value {
            DomainError::InvalidTransition(msg) => DispatchError::InvalidTransition(msg),
            DomainError::Unauthorized => DispatchError::Unauthorized,
            DomainError::StaleState(msg) => DispatchError::StaleState(msg),
            DomainError::EmptyOrder => DispatchError::EmptyOrder,
            DomainError::NotFound => DispatchError::NotFound,
            DomainError::Validation(msg) => DispatchError::Validation(msg),
            DomainError::InvalidId(msg) => DispatchError::Validation(msg),
        }
    }
}

/// Reusable command execution engine for event-sourced aggregates.
///
/// Generic over the store and bus so tests run against the in-memory
/// implementations and a persistent backend can be swapped in without
/// touching domain code. Aggregates must be deterministic, side-effect free,
/// and advance their version by one per applied event — the compare-and-swap
/// check depends on it.
#[derive(Debug)]
pub struct CommandDispatcher<S, B> {
    store: S,
    bus: B,
}

impl<S, B> CommandDispatcher<S, B> {
    pub fn new(store: S, bus: B) -> Self {
        Self { store, bus }
    }

    pub fn into_parts(self) -> (S, B) {
        (self.store, self.bus)
    }
}

impl<S, B> CommandDispatcher<S, B>
where
    S: EventStore,
    B: EventBus<EventEnvelope<JsonValue>>,
{
    /// Run one command through the full pipeline.
    ///
    /// `make_aggregate` builds the blank instance to rehydrate into (e.g.
    /// `Order::empty(id)`), keeping the dispatcher generic over aggregate
    /// construction.
    ///
    /// Returns the committed `StoredEvent`s with their assigned sequence
    /// numbers. A command that decides no events (e.g. a reconcile that
    /// leaves status unchanged) appends nothing and returns an empty vector.
    pub fn dispatch<A>(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        command: A::Command,
        make_aggregate: impl FnOnce(BranchId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: Aggregate<Error = DomainError>,
        A::Event: brigade_events::Event + Serialize + DeserializeOwned,
    {
        let history = self.store.load_stream(branch_id, aggregate_id)?;
        validate_loaded_stream(branch_id, aggregate_id, &history)?;
        let expected = ExpectedVersion::Exact(stream_version(&history));

        let mut aggregate = make_aggregate(branch_id, aggregate_id);
        apply_history::<A>(&mut aggregate, &history)?;

        let decided = aggregate.handle(&command).map_err(DispatchError::from)?;
        if decided.is_empty() {
            return Ok(vec![]);
        }

        let aggregate_type = aggregate_type.into();
        let uncommitted = decided
            .iter()
            .map(|ev| {
                UncommittedEvent::from_typed(
                    branch_id,
                    aggregate_id,
                    aggregate_type.clone(),
                    Uuid::now_v7(),
                    ev,
                )
            })
            .collect::<Result<Vec<_>, _>>()?;

        let committed = self.store.append(uncommitted, expected)?;

        for stored in &committed {
            self.bus
                .publish(stored.to_envelope())
                .map_err(|e| DispatchError::Publish(format!("{e:?}")))?;
        }

        Ok(committed)
    }
}

fn stream_version(stream: &[StoredEvent]) -> u64 {
    stream.last().map_or(0, |e| e.sequence_number)
}

/// Refuse to rehydrate from a stream a buggy backend mis-assembled.
///
/// Checks branch/aggregate scoping and that sequence numbers are strictly
/// increasing from 1 — which also means `apply_history` can trust the order
/// events arrive in.
fn validate_loaded_stream(
    branch_id: BranchId,
    aggregate_id: AggregateId,
    stream: &[StoredEvent],
) -> Result<(), DispatchError> {
    let mut last = 0u64;
    for (idx, e) in stream.iter().enumerate() {
        if e.branch_id != branch_id {
            return Err(DispatchError::BranchIsolation(format!(
                "loaded stream contains wrong branch_id at index {idx}"
            )));
        }
        if e.aggregate_id != aggregate_id {
            return Err(DispatchError::BranchIsolation(format!(
                "loaded stream contains wrong aggregate_id at index {idx}"
            )));
        }
        if e.sequence_number == 0 {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(
                "stored event has sequence_number=0".to_string(),
            )));
        }
        if e.sequence_number <= last {
            return Err(DispatchError::Store(EventStoreError::InvalidAppend(format!(
                "non-monotonic sequence_number in loaded stream (last={last}, found={})",
                e.sequence_number
            ))));
        }
        last = e.sequence_number;
    }
    Ok(())
}

fn apply_history<A>(aggregate: &mut A, history: &[StoredEvent]) -> Result<(), DispatchError>
where
    A: Aggregate,
    A::Event: DeserializeOwned,
{
    // Ordering was checked by validate_loaded_stream.
    for stored in history {
        let ev: A::Event = serde_json::from_value(stored.payload.clone())
            .map_err(|e| DispatchError::Deserialize(e.to_string()))?;
        aggregate.apply(&ev);
    }

    Ok(())
}
