//! Stock-on-hand read model.
//!
//! Fed from two streams: inventory adjustments (manual counts, registration)
//! and order receipts (a delivered line increases the product's on-hand).

use std::collections::HashMap;
use std::sync::RwLock;

use serde_json::Value as JsonValue;
use thiserror::Error;

use brigade_core::{AggregateId, BranchId, ProductId};
use brigade_events::EventEnvelope;
use brigade_inventory::{InventoryEvent, StockItemId};
use brigade_orders::OrderEvent;

use crate::projections::orders::ORDER_AGGREGATE_TYPE;
use crate::read_model::BranchStore;

pub const STOCK_AGGREGATE_TYPE: &str = "inventory.item";

/// On-hand quantity of one product at one branch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockReadModel {
    pub product_id: ProductId,
    pub name: String,
    pub unit: String,
    pub on_hand: i64,
}

#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash)]
struct CursorKey {
    branch_id: BranchId,
    aggregate_id: AggregateId,
}

#[derive(Debug, Error)]
pub enum StockProjectionError {
    #[error("failed to deserialize event: {0}")]
    Deserialize(String),
    #[error("branch isolation violation: {0}")]
    BranchIsolation(String),
    #[error("non-monotonic sequence number (last={last}, found={found})")]
    NonMonotonicSequence { last: u64, found: u64 },
    #[error("stock adjustment for unregistered item {0}")]
    UnknownItem(StockItemId),
}

/// Stock projection over inventory and receiving events.
#[derive(Debug)]
pub struct StockOnHandProjection<S>
where
    S: BranchStore<ProductId, StockReadModel>,
{
    store: S,
    /// Which product each registered stock item tracks.
    item_products: RwLock<HashMap<(BranchId, StockItemId), ProductId>>,
    cursors: RwLock<HashMap<CursorKey, u64>>,
}

impl<S> StockOnHandProjection<S>
where
    S: BranchStore<ProductId, StockReadModel>,
{
    pub fn new(store: S) -> Self {
        Self {
            store,
            item_products: RwLock::new(HashMap::new()),
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

    pub fn get(&self, branch_id: BranchId, product_id: &ProductId) -> Option<StockReadModel> {
        self.store.get(branch_id, product_id)
    }

    pub fn list(&self, branch_id: BranchId) -> Vec<StockReadModel> {
        let mut all = self.store.list(branch_id);
        all.sort_by(|a, b| a.name.cmp(&b.name));
        all
    }

    fn add_on_hand(&self, branch_id: BranchId, product_id: ProductId, delta: i64) {
        let mut rm = self
            .store
            .get(branch_id, &product_id)
            .unwrap_or(StockReadModel {
                product_id,
                name: String::new(),
                unit: String::new(),
                on_hand: 0,
            });
        rm.on_hand += delta;
        self.store.upsert(branch_id, product_id, rm);
    }

    /// Advance the cursor for one envelope, reporting whether it is new.
    fn advance(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
        seq: u64,
    ) -> Result<bool, StockProjectionError> {
        let last = self.get_cursor(branch_id, aggregate_id);
        if seq == 0 {
            return Err(StockProjectionError::NonMonotonicSequence { last, found: seq });
        }
        if seq <= last {
            return Ok(false);
        }
        if seq != last + 1 && last != 0 {
            return Err(StockProjectionError::NonMonotonicSequence { last, found: seq });
        }
        Ok(true)
    }

    pub fn apply_envelope(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), StockProjectionError> {
        match envelope.aggregate_type() {
            STOCK_AGGREGATE_TYPE => self.apply_inventory(envelope),
            ORDER_AGGREGATE_TYPE => self.apply_order(envelope),
            _ => Ok(()),
        }
    }

    fn apply_inventory(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), StockProjectionError> {
        let (branch_id, aggregate_id) = envelope.stream();
        if !self.advance(branch_id, aggregate_id, envelope.sequence_number())? {
            return Ok(());
        }

        let ev: InventoryEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| StockProjectionError::Deserialize(e.to_string()))?;

        match ev {
            InventoryEvent::ItemRegistered(e) => {
                if e.branch_id != branch_id {
                    return Err(StockProjectionError::BranchIsolation(
                        "event branch_id does not match envelope branch_id".to_string(),
                    ));
                }
                if let Ok(mut map) = self.item_products.write() {
                    map.insert((branch_id, e.item_id), e.product_id);
                }
                let mut rm = self
                    .store
                    .get(branch_id, &e.product_id)
                    .unwrap_or(StockReadModel {
                        product_id: e.product_id,
                        name: String::new(),
                        unit: String::new(),
                        on_hand: 0,
                    });
                rm.name = e.name;
                rm.unit = e.unit;
                self.store.upsert(branch_id, e.product_id, rm);
            }
            InventoryEvent::StockAdjusted(e) => {
                let product_id = self
                    .item_products
                    .read()
                    .ok()
                    .and_then(|map| map.get(&(branch_id, e.item_id)).copied())
                    .ok_or(StockProjectionError::UnknownItem(e.item_id))?;
                self.add_on_hand(branch_id, product_id, e.delta);
            }
        }

        self.update_cursor(branch_id, aggregate_id, envelope.sequence_number());
        Ok(())
    }

    fn apply_order(
        &self,
        envelope: &EventEnvelope<JsonValue>,
    ) -> Result<(), StockProjectionError> {
        let (branch_id, aggregate_id) = envelope.stream();
        if !self.advance(branch_id, aggregate_id, envelope.sequence_number())? {
            return Ok(());
        }

        let ev: OrderEvent = serde_json::from_value(envelope.payload().clone())
            .map_err(|e| StockProjectionError::Deserialize(e.to_string()))?;

        // Only deliveries move stock; the rest of the order stream advances
        // the cursor and nothing else.
        if let OrderEvent::ReceiptRecorded(e) = ev {
            if e.branch_id != branch_id {
                return Err(StockProjectionError::BranchIsolation(
                    "event branch_id does not match envelope branch_id".to_string(),
                ));
            }
            self.add_on_hand(branch_id, e.product_id, e.quantity);
        }

        self.update_cursor(branch_id, aggregate_id, envelope.sequence_number());
        Ok(())
    }
}
