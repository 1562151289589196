use std::collections::HashMap;
use std::sync::RwLock;

use brigade_core::{AggregateId, BranchId, ExpectedVersion};

use super::r#trait::{EventStore, EventStoreError, StoredEvent, UncommittedEvent};

/// In-memory append-only event store.
///
/// Streams live in a per-branch map of per-aggregate vectors, so branch
/// isolation falls out of the layout rather than a filter. Intended for
/// tests and single-process deployments; nothing here is tuned.
#[derive(Debug, Default)]
pub struct InMemoryEventStore {
    branches: RwLock<HashMap<BranchId, HashMap<AggregateId, Vec<StoredEvent>>>>,
}

/// Stream coordinates shared by every event of a valid append batch.
struct BatchTarget {
    branch_id: BranchId,
    aggregate_id: AggregateId,
    aggregate_type: String,
}

fn batch_target(events: &[UncommittedEvent]) -> Result<BatchTarget, EventStoreError> {
    let first = &events[0];
    let target = BatchTarget {
        branch_id: first.branch_id,
        aggregate_id: first.aggregate_id,
        aggregate_type: first.aggregate_type.clone(),
    };

    for (idx, e) in events.iter().enumerate().skip(1) {
        if e.branch_id != target.branch_id {
            return Err(EventStoreError::BranchIsolation(format!(
                "batch contains multiple branch_ids (index {idx})"
            )));
        }
        if e.aggregate_id != target.aggregate_id {
            return Err(EventStoreError::InvalidAppend(format!(
                "batch contains multiple aggregate_ids (index {idx})"
            )));
        }
        if e.aggregate_type != target.aggregate_type {
            return Err(EventStoreError::AggregateTypeMismatch(format!(
                "batch contains multiple aggregate_types (index {idx})"
            )));
        }
    }

    Ok(target)
}

impl InMemoryEventStore {
    pub fn new() -> Self {
        Self::default()
    }
}

impl EventStore for InMemoryEventStore {
    fn append(
        &self,
        events: Vec<UncommittedEvent>,
        expected_version: ExpectedVersion,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        if events.is_empty() {
            return Ok(vec![]);
        }

        let target = batch_target(&events)?;

        let mut branches = self
            .branches
            .write()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        let stream = branches
            .entry(target.branch_id)
            .or_default()
            .entry(target.aggregate_id)
            .or_default();

        let current = stream.last().map_or(0, |e| e.sequence_number);
        if !expected_version.matches(current) {
            return Err(EventStoreError::Concurrency(format!(
                "expected {expected_version:?}, found {current}"
            )));
        }

        // A stream never changes aggregate type after its first event.
        if let Some(existing) = stream.first() {
            if existing.aggregate_type != target.aggregate_type {
                return Err(EventStoreError::AggregateTypeMismatch(format!(
                    "stream aggregate_type is '{}', attempted append with '{}'",
                    existing.aggregate_type, target.aggregate_type
                )));
            }
        }

        let committed: Vec<StoredEvent> = events
            .into_iter()
            .zip(current + 1..)
            .map(|(e, sequence_number)| StoredEvent {
                event_id: e.event_id,
                branch_id: e.branch_id,
                aggregate_id: e.aggregate_id,
                aggregate_type: e.aggregate_type,
                sequence_number,
                event_type: e.event_type,
                event_version: e.event_version,
                occurred_at: e.occurred_at,
                payload: e.payload,
            })
            .collect();

        stream.extend(committed.iter().cloned());

        Ok(committed)
    }

    fn load_stream(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
    ) -> Result<Vec<StoredEvent>, EventStoreError> {
        let branches = self
            .branches
            .read()
            .map_err(|_| EventStoreError::InvalidAppend("lock poisoned".to_string()))?;

        Ok(branches
            .get(&branch_id)
            .and_then(|streams| streams.get(&aggregate_id))
            .cloned()
            .unwrap_or_default())
    }
}
