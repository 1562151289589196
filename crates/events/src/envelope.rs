use serde::{Deserialize, Serialize};
use uuid::Uuid;

use brigade_core::{AggregateId, BranchId};

/// A domain event wrapped with the stream metadata needed to route it.
///
/// This is what travels over the bus and what the store persists. The branch
/// comes first everywhere in this system: a stream is `(branch_id,
/// aggregate_id)` and nothing outside that pair may observe the payload.
/// `sequence_number` is the event's position in its stream, assigned at
/// append time.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventEnvelope<E> {
    branch_id: BranchId,
    aggregate_id: AggregateId,
    aggregate_type: String,
    sequence_number: u64,

    event_id: Uuid,
    payload: E,
}

impl<E> EventEnvelope<E> {
    pub fn new(
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: impl Into<String>,
        sequence_number: u64,
        event_id: Uuid,
        payload: E,
    ) -> Self {
        Self {
            branch_id,
            aggregate_id,
            aggregate_type: aggregate_type.into(),
            sequence_number,
            event_id,
            payload,
        }
    }

    /// The stream this envelope belongs to.
    pub fn stream(&self) -> (BranchId, AggregateId) {
        (self.branch_id, self.aggregate_id)
    }

    pub fn branch_id(&self) -> BranchId {
        self.branch_id
    }

    pub fn aggregate_id(&self) -> AggregateId {
        self.aggregate_id
    }

    pub fn aggregate_type(&self) -> &str {
        &self.aggregate_type
    }

    pub fn sequence_number(&self) -> u64 {
        self.sequence_number
    }

    pub fn event_id(&self) -> Uuid {
        self.event_id
    }

    pub fn payload(&self) -> &E {
        &self.payload
    }

    pub fn into_payload(self) -> E {
        self.payload
    }
}
