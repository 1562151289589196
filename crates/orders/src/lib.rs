//! Purchase-order domain module (event-sourced).
//!
//! This crate contains the order lifecycle: the status-transition engine, the
//! receiving reconciler, and the `Order` aggregate that ties them together.
//! It is pure, deterministic domain logic (no IO, no HTTP, no storage).

pub mod order;
pub mod reconcile;
pub mod state;
pub mod transition;

pub use order::{
    AddItem, ItemAdded, OpenOrder, Order, OrderCommand, OrderEvent, OrderId, OrderItem,
    OrderOpened, ReceiptRecorded, Reconcile, RecordReceipt, StatusChanged, Transition,
    TransitionRecord,
};
pub use reconcile::{Reconciliation, reconcile};
pub use state::{OrderKind, OrderState, RequestStatus};
pub use transition::{allowed_targets, granting_role, request_status_for, required_capability, validate};
