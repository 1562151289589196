use serde::{Deserialize, Serialize};

use brigade_core::{DomainError, DomainResult};

use crate::roles::Role;

/// An operation a role may be granted.
///
/// Capabilities gate both the HTTP command boundary and the status-transition
/// edges inside the order aggregate, so the grant table below is the single
/// source of truth for who may do what.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Create a draft order and edit its line items.
    OpenOrder,
    /// Send a draft to the manager's approval queue.
    SubmitOrder,
    /// Approve a pending order.
    ApproveOrder,
    /// Reject a pending order.
    RejectOrder,
    /// Commit an approved order to its supplier.
    CommitOrder,
    /// Record delivered quantities against an order.
    ReceiveGoods,
    /// Reconcile received vs. ordered quantities.
    ReconcileOrder,
    /// Register stock items and adjust on-hand counts.
    ManageStock,
}

/// Role → capability grant table.
pub fn grants(role: Role, capability: Capability) -> bool {
    use Capability::*;

    match role {
        Role::Admin => true,
        Role::Staff => matches!(capability, OpenOrder | SubmitOrder),
        Role::Manager => matches!(
            capability,
            OpenOrder | SubmitOrder | ApproveOrder | RejectOrder | ManageStock
        ),
        Role::Purchasing => matches!(capability, CommitOrder),
        Role::Receiving => matches!(capability, ReceiveGoods | ReconcileOrder | ManageStock),
    }
}

/// Authorize an actor's role set for a capability.
///
/// - No IO
/// - No panics
/// - No business logic (pure policy check)
pub fn authorize(roles: &[Role], capability: Capability) -> DomainResult<()> {
    if roles.iter().any(|r| grants(*r, capability)) {
        Ok(())
    } else {
        Err(DomainError::Unauthorized)
    }
}
