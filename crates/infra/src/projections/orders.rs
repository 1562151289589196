use std::collections::HashMap;
use std::sync::RwLock;

use chrono::{DateTime, Utc};
use serde_json::Value as JsonValue;
use thiserror::Error;

use brigade_core::{AggregateId, BranchId, SupplierId};
use brigade_events::EventEnvelope;
use brigade_orders::{OrderEvent, OrderId, OrderItem, OrderKind, OrderState, RequestStatus};

use crate::read_model::BranchStore;

pub const ORDER_AGGREGATE_TYPE: &str = "orders.order";

/// Flattened view of one order, kept current by [`OrdersProjection`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrderReadModel {
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub kind: OrderKind,
    pub state: OrderState,
    pub request_status: RequestStatus,
    pub items: Vec<OrderItem>,
    pub opened_at: DateTime<Utc>,
}

/// Immutable filter configuration for order queries.
///
/// Built once per request from query parameters and passed by reference; query
/// functions never consult ambient request state.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct OrderFilter {
    pub kind: Option<OrderKind>,
    pub state: Option<OrderState>,
    pub request_status: Option<RequestStatus>,
    pub supplier_id: Option<SupplierId>,
    pub opened_after: Option<DateTime<Utc>>,
    pub opened_before: Option<DateTime<Utc>>,
}

impl OrderFilter {
    pub fn matches(&self, rm: &OrderReadModel) -> bool {
        if let Some(kind) = self.kind {
            if rm.kind != kind {
                return false;
            }
        }
        if let Some(state) = self.state {
            if rm.state != state {
                return false;
            }
        }
        if let Some(request_status) = self.request_status {
            if rm.request_status != request_status {
                return false;
            }
        }
        if let Some(supplier_id) = self.supplier_id {
            if rm.supplier_id != supplier_id {
                return false;
            }
        }
        if let Some(after) = self.opened_after {
            if rm.opened_at < after {
                return false;
            }
        }
        if let Some(before) = self.opened_before {
            if rm.opened_at > before {
                return false;
            }
        }
        true
    }
}

/// Offset/limit pagination window.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct Pagination {
    pub offset: usize,
    pub limit: usize,
}

impl Default for Pagination {
    fn default() -> Self {
        Self {
            offset: 0,
            limit: 50,
        }
    }
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    branch_id: BranchId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum OrderProjectionError {
    #[error("failed to deserialize order event: {0}")]
    Deserialize(String),
    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
}

/// Orders read model, fed by the event bus.
///
/// Idempotent: already-seen sequence numbers are skipped, gaps are rejected,
/// so at-least-once delivery is safe.
#[derive(Debug)]
pub struct OrdersProjection<S>
where
    S: BranchStore<OrderId, OrderReadModel>,
{
    store: S,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> OrdersProjection<S>
where
    S: BranchStore<OrderId, OrderReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            cursors: RwLock::new(HashMap::new()),
        }
    }

    fn get_cursor(&self, branch_id: BranchId, aggregate_id: AggregateId) -> u64 {
        match self.cursors.read() {
            Ok(cursors) => *cursors
                .get(&CursorKey { branch_id, aggregate_id })
                .unwrap_or(&0),
            Err(_) => 0,
        }
    }

    fn update_cursor(&self, branch_id: BranchId, aggregate_id: AggregateId, seq: u64) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.insert(CursorKey { branch_id, aggregate_id }, seq);
        }
    }

    fn clear_cursors(&self, branch_id: BranchId) {
        if let Ok(mut cursors) = self.cursors.write() {
            cursors.retain(|k, _| k.branch_id != branch_id);
        }
    }

    pub fn get(&self, branch_id: BranchId, order_id: &OrderId) -> Option<OrderReadModel> {
        self.store.get(branch_id, order_id)
    }

    pub fn list(&self, branch_id: BranchId) -> Vec<OrderReadModel> {
        self.store.list(branch_id)
    }

    /// Filtered, newest-first, paginated order listing.
    pub fn query(
        &self,
        branch_id: BranchId,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Vec<OrderReadModel> {
        let mut matched: Vec<_> = self
            .store
            .list(branch_id)
            .into_iter()
            .filter(|rm| filter.matches(rm))
            .collect();

        matched.sort_by(|a, b| {
            b.opened_at
                .cmp(&a.opened_at)
                .then_with(|| b.order_id.0.as_uuid().cmp(a.order_id.0.as_uuid()))
        });

        matched
            .into_iter()
            .skip(pagination.offset)
            .take(pagination.limit)
            .collect()
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), OrderProjectionError> {
        if envelope.aggregate_type() != ORDER_AGGREGATE_TYPE {
            return Ok(());
        }

        let (branch_id, aggregate_id) = envelope.stream();
        let seq = envelope.sequence_number();

        let last = self.get_cursor(branch_id, aggregate_id);
        if seq == 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(());
        }
        if seq != last + 1 && last != 0 {
            return Err(OrderProjectionError::NonMonotonicSequence { last, found: seq });
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| OrderProjectionError::Deserialize(e.to_string()))?;

        let (event_branch, order_id) = match &ev {
            OrderEvent::OrderOpened(e) => (e.branch_id, e.order_id),
            OrderEvent::ItemAdded(e) => (e.branch_id, e.order_id),
            OrderEvent::StatusChanged(e) => (e.branch_id, e.order_id),
            OrderEvent::ReceiptRecorded(e) => (e.branch_id, e.order_id),
        };

        if event_branch != branch_id {
            return Err(OrderProjectionError::BranchIsolation(
                "event branch_id does not match envelope branch_id".to_string(),
            ));
        }
        if order_id.0 != aggregate_id {
            return Err(OrderProjectionError::BranchIsolation(
                "event order_id does not match envelope aggregate_id".to_string(),
            ));
        }

        match ev {
            OrderEvent::OrderOpened(e) => {
                self.store.upsert(
                    branch_id,
                    e.order_id,
                    OrderReadModel {
                        order_id: e.order_id,
                        supplier_id: e.supplier_id,
                        kind: e.kind,
                        state: OrderState::Draft,
                        request_status: RequestStatus::NotSubmitted,
                        items: vec![],
                        opened_at: e.occurred_at,
                    },
                );
            }
            OrderEvent::ItemAdded(e) => {
                if let Some(mut rm) = self.store.get(branch_id, &e.order_id) {
                    rm.items.push(OrderItem {
                        line_no: e.line_no,
                        product_id: e.product_id,
                        ordered: e.quantity,
                        received: 0,
                    });
                    self.store.upsert(branch_id, e.order_id, rm);
                }
            }
            OrderEvent::StatusChanged(e) => {
                if let Some(mut rm) = self.store.get(branch_id, &e.order_id) {
                    rm.state = e.to;
                    rm.request_status = e.request_status;
                    self.store.upsert(branch_id, e.order_id, rm);
                }
            }
            OrderEvent::ReceiptRecorded(e) => {
                if let Some(mut rm) = self.store.get(branch_id, &e.order_id) {
                    if let Some(item) = rm.items.iter_mut().find(|i| i.line_no == e.line_no) {
                        item.received += e.quantity;
                    }
                    self.store.upsert(branch_id, e.order_id, rm);
                }
            }
        }

        self.update_cursor(branch_id, aggregate_id, seq);
        Ok(())
    }

    /// Replay a full set of envelopes against an empty read model.
    pub fn rebuild_from_scratch(
        &self,
        envelopes: impl IntoIterator<Item = EventEnvelope<JsonValue>>,
    ) -> Result<(), OrderProjectionError> {
        let mut envs: Vec<_> = envelopes.into_iter().collect();

        {
            let mut branches = envs.iter().map(|e| e.branch_id()).collect::<Vec<_>>();
            branches.sort_by_key(|b| *b.as_uuid().as_bytes());
            branches.dedup();
            for b in branches {
                self.store.clear_branch(b);
                self.clear_cursors(b);
            }
        }

        envs.sort_by_key(|e| {
            (
                *e.branch_id().as_uuid().as_bytes(),
                *e.aggregate_id().as_uuid().as_bytes(),
                e.sequence_number(),
            )
        });

        for env in &envs {
            self.apply_envelope(env)?;
        }
        Ok(())
    }
}
