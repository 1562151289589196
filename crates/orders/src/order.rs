use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use brigade_auth::{Actor, Capability, Role};
use brigade_core::{
    Aggregate, AggregateId, AggregateRoot, BranchId, DomainError, ProductId, SupplierId, UserId,
};
use brigade_events::Event;

use crate::reconcile::{Reconciliation, reconcile};
use crate::state::{OrderKind, OrderState, RequestStatus};
use crate::transition::{granting_role, request_status_for, validate};

/// Purchase order identifier (branch-scoped via `branch_id` fields in events/commands).
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct OrderId(pub AggregateId);

impl OrderId {
    pub fn new(id: AggregateId) -> Self {
        Self(id)
    }
}

impl core::fmt::Display for OrderId {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&self.0, f)
    }
}

/// Purchase order line item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderItem {
    pub line_no: u32,
    pub product_id: ProductId,
    pub ordered: i64,
    pub received: i64,
}

/// One entry of the append-only transition history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TransitionRecord {
    pub from: OrderState,
    pub to: OrderState,
    pub request_status: RequestStatus,
    pub actor: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Aggregate root: Order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Order {
    id: OrderId,
    branch_id: Option<BranchId>,
    supplier_id: Option<SupplierId>,
    kind: OrderKind,
    state: OrderState,
    request_status: RequestStatus,
    items: Vec<OrderItem>,
    history: Vec<TransitionRecord>,
    opened_at: Option<DateTime<Utc>>,
    version: u64,
    created: bool,
}

impl Order {
    /// Create an empty, not-yet-created aggregate instance for rehydration.
    pub fn empty(id: OrderId) -> Self {
        Self {
            id,
            branch_id: None,
            supplier_id: None,
            kind: OrderKind::Regular,
            state: OrderState::Draft,
            request_status: RequestStatus::NotSubmitted,
            items: Vec::new(),
            history: Vec::new(),
            opened_at: None,
            version: 0,
            created: false,
        }
    }

    pub fn id_typed(&self) -> OrderId {
        self.id
    }

    pub fn branch_id(&self) -> Option<BranchId> {
        self.branch_id
    }

    pub fn supplier_id(&self) -> Option<SupplierId> {
        self.supplier_id
    }

    pub fn kind(&self) -> OrderKind {
        self.kind
    }

    pub fn state(&self) -> OrderState {
        self.state
    }

    pub fn request_status(&self) -> RequestStatus {
        self.request_status
    }

    pub fn items(&self) -> &[OrderItem] {
        &self.items
    }

    pub fn history(&self) -> &[TransitionRecord] {
        &self.history
    }

    pub fn opened_at(&self) -> Option<DateTime<Utc>> {
        self.opened_at
    }
}

impl AggregateRoot for Order {
    type Id = OrderId;

    fn id(&self) -> &Self::Id {
        &self.id
    }

    fn version(&self) -> u64 {
        self.version
    }
}

/// Command: OpenOrder (creates a draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpenOrder {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub kind: OrderKind,
    pub occurred_at: DateTime<Utc>,
}

/// Command: AddItem (only allowed in Draft).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AddItem {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Transition (move the order along the lifecycle graph).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Transition {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub target: OrderState,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Command: RecordReceipt (a delivery landed for one line).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RecordReceipt {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub line_no: u32,
    pub quantity: i64,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

/// Command: Reconcile (decide completion from received quantities).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Reconcile {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub actor: Actor,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderCommand {
    OpenOrder(OpenOrder),
    AddItem(AddItem),
    Transition(Transition),
    RecordReceipt(RecordReceipt),
    Reconcile(Reconcile),
}

/// Event: OrderOpened.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrderOpened {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub supplier_id: SupplierId,
    pub kind: OrderKind,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ItemAdded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ItemAdded {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub occurred_at: DateTime<Utc>,
}

/// Event: StatusChanged.
///
/// Carries both sides of the status pair so applying one event updates them
/// atomically, plus the acting identity for the audit history.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StatusChanged {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub from: OrderState,
    pub to: OrderState,
    pub request_status: RequestStatus,
    pub actor: UserId,
    pub role: Role,
    pub occurred_at: DateTime<Utc>,
}

/// Event: ReceiptRecorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReceiptRecorded {
    pub branch_id: BranchId,
    pub order_id: OrderId,
    pub line_no: u32,
    pub product_id: ProductId,
    pub quantity: i64,
    pub actor: UserId,
    pub occurred_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum OrderEvent {
    OrderOpened(OrderOpened),
    ItemAdded(ItemAdded),
    StatusChanged(StatusChanged),
    ReceiptRecorded(ReceiptRecorded),
}

impl Event for OrderEvent {
    fn event_type(&self) -> &'static str {
        match self {
            OrderEvent::OrderOpened(_) => "orders.order.opened",
            OrderEvent::ItemAdded(_) => "orders.order.item_added",
            OrderEvent::StatusChanged(_) => "orders.order.status_changed",
            OrderEvent::ReceiptRecorded(_) => "orders.order.receipt_recorded",
        }
    }

    fn version(&self) -> u32 {
        1
    }

    fn occurred_at(&self) -> DateTime<Utc> {
        match self {
            OrderEvent::OrderOpened(e) => e.occurred_at,
            OrderEvent::ItemAdded(e) => e.occurred_at,
            OrderEvent::StatusChanged(e) => e.occurred_at,
            OrderEvent::ReceiptRecorded(e) => e.occurred_at,
        }
    }
}

impl Aggregate for Order {
    type Command = OrderCommand;
    type Event = OrderEvent;
    type Error = DomainError;

    fn apply(&mut self, event: &Self::Event) {
        match event {
            OrderEvent::OrderOpened(e) => {
                self.id = e.order_id;
                self.branch_id = Some(e.branch_id);
                self.supplier_id = Some(e.supplier_id);
                self.kind = e.kind;
                self.state = OrderState::Draft;
                self.request_status = RequestStatus::NotSubmitted;
                self.items.clear();
                self.history.clear();
                self.opened_at = Some(e.occurred_at);
                self.created = true;
            }
            OrderEvent::ItemAdded(e) => {
                self.items.push(OrderItem {
                    line_no: e.line_no,
                    product_id: e.product_id,
                    ordered: e.quantity,
                    received: 0,
                });
            }
            OrderEvent::StatusChanged(e) => {
                // Atomic: lifecycle state and approval status move together.
                self.state = e.to;
                self.request_status = e.request_status;
                self.history.push(TransitionRecord {
                    from: e.from,
                    to: e.to,
                    request_status: e.request_status,
                    actor: e.actor,
                    role: e.role,
                    occurred_at: e.occurred_at,
                });
            }
            OrderEvent::ReceiptRecorded(e) => {
                if let Some(item) = self.items.iter_mut().find(|i| i.line_no == e.line_no) {
                    item.received += e.quantity;
                }
            }
        }

        // Deterministic version tracking: +1 per applied event.
        self.version += 1;
    }

    fn handle(&self, command: &Self::Command) -> Result<Vec<Self::Event>, Self::Error> {
        match command {
            OrderCommand::OpenOrder(cmd) => self.handle_open(cmd),
            OrderCommand::AddItem(cmd) => self.handle_add_item(cmd),
            OrderCommand::Transition(cmd) => self.handle_transition(cmd),
            OrderCommand::RecordReceipt(cmd) => self.handle_record_receipt(cmd),
            OrderCommand::Reconcile(cmd) => self.handle_reconcile(cmd),
        }
    }
}

impl Order {
    fn ensure_branch(&self, branch_id: BranchId) -> Result<(), DomainError> {
        if !self.created {
            return Ok(());
        }
        if self.branch_id != Some(branch_id) {
            return Err(DomainError::validation("branch mismatch"));
        }
        Ok(())
    }

    fn ensure_order_id(&self, order_id: OrderId) -> Result<(), DomainError> {
        if self.id != order_id {
            return Err(DomainError::validation("order_id mismatch"));
        }
        Ok(())
    }

    fn status_changed(
        &self,
        branch_id: BranchId,
        to: OrderState,
        actor: UserId,
        role: Role,
        occurred_at: DateTime<Utc>,
    ) -> OrderEvent {
        OrderEvent::StatusChanged(StatusChanged {
            branch_id,
            order_id: self.id,
            from: self.state,
            to,
            request_status: request_status_for(to),
            actor,
            role,
            occurred_at,
        })
    }

    fn handle_open(&self, cmd: &OpenOrder) -> Result<Vec<OrderEvent>, DomainError> {
        if self.created {
            return Err(DomainError::stale("order already exists"));
        }

        Ok(vec![OrderEvent::OrderOpened(OrderOpened {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            supplier_id: cmd.supplier_id,
            kind: cmd.kind,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_add_item(&self, cmd: &AddItem) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if self.state != OrderState::Draft {
            return Err(DomainError::invalid_transition(
                "line items can only be edited while the order is a draft",
            ));
        }

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("quantity must be positive"));
        }

        let next_line_no = (self.items.len() as u32) + 1;
        Ok(vec![OrderEvent::ItemAdded(ItemAdded {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            line_no: next_line_no,
            product_id: cmd.product_id,
            quantity: cmd.quantity,
            occurred_at: cmd.occurred_at,
        })])
    }

    fn handle_transition(&self, cmd: &Transition) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        let role = validate(self.state, cmd.target, &cmd.actor.roles)?;

        Ok(vec![self.status_changed(
            cmd.branch_id,
            cmd.target,
            cmd.actor.user_id,
            role,
            cmd.occurred_at,
        )])
    }

    fn handle_record_receipt(&self, cmd: &RecordReceipt) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if !matches!(
            self.state,
            OrderState::Approved | OrderState::Committed | OrderState::PartiallyReceived
        ) {
            return Err(DomainError::invalid_transition(format!(
                "cannot record a receipt while the order is {}",
                self.state
            )));
        }

        let role = granting_role(&cmd.actor.roles, Capability::ReceiveGoods)
            .ok_or(DomainError::Unauthorized)?;

        if cmd.quantity <= 0 {
            return Err(DomainError::validation("received quantity must be positive"));
        }

        let item = self
            .items
            .iter()
            .find(|i| i.line_no == cmd.line_no)
            .ok_or_else(|| DomainError::validation(format!("unknown line_no {}", cmd.line_no)))?;

        // Invariant: received never exceeds ordered.
        if item.received + cmd.quantity > item.ordered {
            return Err(DomainError::validation(format!(
                "receipt would exceed ordered quantity on line {} ({} + {} > {})",
                item.line_no, item.received, cmd.quantity, item.ordered
            )));
        }

        let mut events = vec![OrderEvent::ReceiptRecorded(ReceiptRecorded {
            branch_id: cmd.branch_id,
            order_id: cmd.order_id,
            line_no: cmd.line_no,
            product_id: item.product_id,
            quantity: cmd.quantity,
            actor: cmd.actor.user_id,
            occurred_at: cmd.occurred_at,
        })];

        // The first receipt against a committed order moves it along.
        if self.state == OrderState::Committed {
            events.push(self.status_changed(
                cmd.branch_id,
                OrderState::PartiallyReceived,
                cmd.actor.user_id,
                role,
                cmd.occurred_at,
            ));
        }

        Ok(events)
    }

    fn handle_reconcile(&self, cmd: &Reconcile) -> Result<Vec<OrderEvent>, DomainError> {
        if !self.created {
            return Err(DomainError::not_found());
        }
        self.ensure_branch(cmd.branch_id)?;
        self.ensure_order_id(cmd.order_id)?;

        if !matches!(
            self.state,
            OrderState::Approved | OrderState::Committed | OrderState::PartiallyReceived
        ) {
            return Err(DomainError::invalid_transition(format!(
                "cannot reconcile while the order is {}",
                self.state
            )));
        }

        let role = granting_role(&cmd.actor.roles, Capability::ReconcileOrder)
            .ok_or(DomainError::Unauthorized)?;

        let target = match reconcile(&self.items)? {
            Reconciliation::Received => OrderState::Received,
            Reconciliation::Incomplete => OrderState::Incomplete,
            Reconciliation::Unchanged => return Ok(vec![]),
        };

        Ok(vec![self.status_changed(
            cmd.branch_id,
            target,
            cmd.actor.user_id,
            role,
            cmd.occurred_at,
        )])
    }
}
