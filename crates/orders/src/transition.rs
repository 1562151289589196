//! Status-transition engine: the legal state graph and its role gating.
//!
//! Every status change in the system funnels through [`validate`]. The graph
//! and the edge→capability mapping below are the complete description of the
//! approval workflow; there is no other place where status may move.

use brigade_auth::{Capability, Role, grants};
use brigade_core::{DomainError, DomainResult};

use crate::state::{OrderState, RequestStatus};

/// Allowed-next set for each lifecycle state.
///
/// `approved` can jump straight to a terminal receiving outcome because
/// deliveries may land (and be reconciled) before the formal supplier commit.
pub fn allowed_targets(state: OrderState) -> &'static [OrderState] {
    match state {
        OrderState::Draft => &[OrderState::PendingManagerApproval],
        OrderState::PendingManagerApproval => &[OrderState::Approved, OrderState::Rejected],
        OrderState::Approved => &[
            OrderState::Committed,
            OrderState::Received,
            OrderState::Incomplete,
        ],
        OrderState::Committed => &[
            OrderState::PartiallyReceived,
            OrderState::Received,
            OrderState::Incomplete,
        ],
        OrderState::PartiallyReceived => &[OrderState::Received, OrderState::Incomplete],
        OrderState::Received | OrderState::Incomplete | OrderState::Rejected => &[],
    }
}

/// The capability an actor must hold to take an edge.
///
/// Returns `None` when `(from, to)` is not an edge of the graph.
pub fn required_capability(from: OrderState, to: OrderState) -> Option<Capability> {
    if !allowed_targets(from).contains(&to) {
        return None;
    }

    let cap = match (from, to) {
        (OrderState::Draft, OrderState::PendingManagerApproval) => Capability::SubmitOrder,
        (OrderState::PendingManagerApproval, OrderState::Approved) => Capability::ApproveOrder,
        (OrderState::PendingManagerApproval, OrderState::Rejected) => Capability::RejectOrder,
        (OrderState::Approved, OrderState::Committed) => Capability::CommitOrder,
        (OrderState::Committed, OrderState::PartiallyReceived) => Capability::ReceiveGoods,
        // Every remaining edge is a reconciliation outcome.
        _ => Capability::ReconcileOrder,
    };
    Some(cap)
}

/// Approval-side status implied by a lifecycle state.
pub fn request_status_for(state: OrderState) -> RequestStatus {
    match state {
        OrderState::Draft => RequestStatus::NotSubmitted,
        OrderState::PendingManagerApproval => RequestStatus::Pending,
        OrderState::Rejected => RequestStatus::Rejected,
        _ => RequestStatus::Approved,
    }
}

/// Validate a status change for an actor's role set.
///
/// Fails with `InvalidTransition` when `(from, to)` is not a graph edge, and
/// with `Unauthorized` when none of the roles hold the edge's capability.
/// On success, returns the role that carries the edge (for the audit history).
pub fn validate(from: OrderState, to: OrderState, roles: &[Role]) -> DomainResult<Role> {
    let cap = required_capability(from, to).ok_or_else(|| {
        DomainError::invalid_transition(format!("{from} -> {to} is not a legal status change"))
    })?;

    granting_role(roles, cap).ok_or(DomainError::Unauthorized)
}

/// The first of the actor's roles granting a capability.
pub fn granting_role(roles: &[Role], capability: Capability) -> Option<Role> {
    roles.iter().copied().find(|r| grants(*r, capability))
}
