use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brigade_core::{Aggregate, AggregateId, AggregateRoot, BranchId, DomainError, ProductId};
use brigade_events::Event;

/// Stock item identifier (branch-scoped via `branch_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StockItemId(pub AggregateId);

impl StockItemId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for StockItemId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Aggregate root: StockItem.
///
/// Tracks the on-hand quantity of one catalog product at one branch, counted
/// in the item's unit of measure.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StockItem {
    id: StockItemId,
    branch_id: Option<BranchId>,
    product_id: Option<ProductId>,
    name: String,
    unit: String,
    on_hand: i64,
    version: u64,
    created: bool,
}

impl StockItem {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: StockItemId) -> Self {
        Self {
            id,
            branch_id: None,
            product_id: None,
            name: String::new(),
            unit: String::new(),
            on_hand: 0,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> StockItemId {
        self.id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn product_id(&self) -> Option<ProductId> {
        self.product_id
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn unit(&self) -> &str {
        &self.unit
    }

    pub fn on_hand(&self) -> i64 {
        self.on_hand
    }
}

impl AggregateRoot for StockItem {
    type Id = StockItemId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: RegisterItem.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RegisterItem {
    pub branch_id: BranchId,
    pub item_id: StockItemId,
    pub product_id: ProductId,
    pub name: String,
    /// Unit of measure the on-hand count is kept in (e.g. "kg", "case").
    pub unit: String,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AdjustStock.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AdjustStock {
    pub branch_id: BranchId,
    pub item_id: StockItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryCommand {
    RegisterItem(RegisterItem),
    AdjustStock(AdjustStock),
}

/// Event: ItemRegistered.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemRegistered {
    pub branch_id: BranchId,
    pub item_id: StockItemId,
    pub product_id: ProductId,
    pub name: String,
    pub unit: String,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StockAdjusted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StockAdjusted {
    pub branch_id: BranchId,
    pub item_id: StockItemId,
    pub delta: i64,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum InventoryEvent {
    ItemRegistered(ItemRegistered),
    StockAdjusted(StockAdjusted),
}

impl Event for InventoryEvent {
    fn event_type(&self) -> &'static str {
        match self {
            InventoryEvent::ItemRegistered(_) => "inventory.item.registered",
            InventoryEvent::StockAdjusted(_) => "inventory.item.stock_adjusted",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            InventoryEvent::ItemRegistered(e) => e.occurred_at,
            InventoryEvent::StockAdjusted(e) => e.occurred_at,
        }
    }
}

impl Aggregate for StockItem {
    type Command = InventoryCommand;
    type Event = InventoryEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            InventoryEvent::ItemRegistered(e) => {
                self.id = e.item_id;
                self.branch_id = Some(e.branch_id);
                self.product_id = Some(e.product_id);
                self.name = e.name.clone();
                self.unit = e.unit.clone();
                self.on_hand = 0;
                self.created = true;
            }
            InventoryEvent::StockAdjusted(e) => {
                self.on_hand += e.delta;
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            InventoryCommand::RegisterItem(cmd) => self.handle_register(cmd),
            InventoryCommand::AdjustStock(cmd) => self.handle_adjust(cmd),
        }
    }
}

impl StockItem {
    fn ensure_branch(&self, branch_id: BranchId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.branch_id != Some(branch_id) {
            return Err(DomainError::validation("branch mismatch"));
        }
        Ok(())
    }

    fn ensure_item_id(&self, item_id: StockItemId) -> Result<(), DomainError> {
        if self.id != item_id {
            return Err(DomainError::validation("item_id mismatch"));
        }
        Ok(())
    }

    fn handle_register(&self, cmd: &RegisterItem) -> Result<Vec<InventoryEvent>, DomainError> {
        if self.created {
            return Err(DomainError::stale("stock item already exists"));
        }
        if cmd.name.trim().is_empty() {
            return Err(DomainError::validation("name cannot be empty"));
        }
        if cmd.unit.trim().is_empty() {
            return Err(DomainError::validation("unit cannot be empty"));
        }
        Ok(vec![InventoryEvent::ItemRegistered(ItemRegistered {
            branch_id: cmd.branch_id,
            item_id: cmd.item_id,
            product_id: cmd.product_id,
            name: cmd.name.clone(),
            unit: cmd.unit.clone(),
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_adjust(&self, cmd: &AdjustStock) -> Result<Vec<InventoryEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_item_id(cmd.item_id)?;

        if cmd.delta == 0 {
            return Err(DomainError::validation("delta cannot be zero"));
        }

        let new_on_hand = self.on_hand + cmd.delta;
        if new_on_hand < 0 {
            return Err(DomainError::validation("stock cannot go negative"));
        }

        Ok(vec![InventoryEvent::StockAdjusted(StockAdjusted {
            branch_id: cmd.branch_id,
            item_id: cmd.item_id,
            delta: cmd.delta,
            occurred_at: cmd.occurred_at,
        })])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn register(item: &mut StockItem, branch_id: BranchId) {
        let events = item
            .handle(&InventoryCommand::RegisterItem(RegisterItem {
                branch_id,
                item_id: item.id_typed(),
                product_id: ProductId::new(),
                name: "Espresso beans".to_string(),
                unit: "kg".to_string(),
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for e in &events {
            item.apply(e);
        }
    }

    #[test]
    fn register_then_adjust_tracks_on_hand() {
        let branch_id = BranchId::new();
        let mut item = StockItem::empty(StockItemId::new(AggregateId::new()));
        register(&mut item, branch_id);

        let events = item
            .handle(&InventoryCommand::AdjustStock(AdjustStock {
                branch_id,
                item_id: item.id_typed(),
                delta: 12,
                occurred_at: Utc::now(),
            }))
            .unwrap();
        for e in &events {
            item.apply(e);
        }

        assert_eq!(item.on_hand(), 12);
    }

    #[test]
    fn stock_cannot_go_negative() {
        let branch_id = BranchId::new();
        let mut item = StockItem::empty(StockItemId::new(AggregateId::new()));
        register(&mut item, branch_id);

        let err = item
            .handle(&InventoryCommand::AdjustStock(AdjustStock {
                branch_id,
                item_id: item.id_typed(),
                delta: -1,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert!(matches!(err, DomainError::Validation(_)));
        assert_eq!(item.on_hand(), 0);
    }

    #[test]
    fn adjusting_an_unregistered_item_is_not_found() {
        let item = StockItem::empty(StockItemId::new(AggregateId::new()));
        let err = item
            .handle(&InventoryCommand::AdjustStock(AdjustStock {
                branch_id: BranchId::new(),
                item_id: item.id_typed(),
                delta: 1,
                occurred_at: Utc::now(),
            }))
            .unwrap_err();
        assert_eq!(err, DomainError::NotFound);
    }

    mod properties {
        use super::*;
        use proptest::prelude::*;

        proptest! {
            /// Applying any sequence of accepted adjustments never drives
            /// on-hand below zero.
            #[test]
            fn on_hand_stays_non_negative(deltas in prop::collection::vec(-20i64..20, 0..32)) {
                let branch_id = BranchId::new();
                let mut item = StockItem::empty(StockItemId::new(AggregateId::new()));
                register(&mut item, branch_id);

                for delta in deltas {
                    let cmd = InventoryCommand::AdjustStock(AdjustStock {
                        branch_id,
                        item_id: item.id_typed(),
                        delta,
                        occurred_at: Utc::now(),
                    });
                    if let Ok(events) = item.handle(&cmd) {
                        for e in &events {
                            item.apply(e);
                        }
                    }
                    prop_assert!(item.on_hand() >= 0);
                }
            }
        }
    }
}
