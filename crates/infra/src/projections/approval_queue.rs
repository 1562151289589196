//! Approval queues: pending orders per role and order kind, with counts.

use std::sync::Arc;

use serde::Serialize;

use brigade_auth::{Capability, Role, grants};
use brigade_core::BranchId;
use brigade_orders::{
    OrderId, OrderKind, OrderState, RequestStatus, allowed_targets, required_capability,
};

use crate::projections::orders::{OrderReadModel, OrdersProjection};
use crate::read_model::BranchStore;

/// Pending-order counts per order kind (dashboard badge numbers).
///
/// Derived and non-persistent: recomputed on demand from the orders read
/// model, never stored.
#[derive(Debug, Copy, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ApprovalCounts {
    pub regular: usize,
    pub additional: usize,
    pub emergency: usize,
}

impl ApprovalCounts {
    pub fn for_kind(&self, kind: OrderKind) -> usize {
        match kind {
            OrderKind::Regular => self.regular,
            OrderKind::Additional => self.additional,
            OrderKind::Emergency => self.emergency,
        }
    }
}

/// Per-role, per-kind queues over the orders read model.
#[derive(Debug)]
pub struct ApprovalQueueService<S>
where
    S: BranchStore<OrderId, OrderReadModel>,
{
    orders: Arc<OrdersProjection<S>>,
}

impl<S> ApprovalQueueService<S>
where
    S: BranchStore<OrderId, OrderReadModel>,
{
    pub fn new(orders: Arc<OrdersProjection<S>>) -> Self {
        Self { orders }
    }

    /// Whether a role holds a sign-off edge out of the given state.
    fn can_act(role: Role, state: OrderState) -> bool {
        allowed_targets(state).iter().any(|to| {
            matches!(
                required_capability(state, *to),
                Some(cap @ (Capability::ApproveOrder | Capability::RejectOrder))
                    if grants(role, cap)
            )
        })
    }

    fn is_pending_for(role: Role, kind: OrderKind, rm: &OrderReadModel) -> bool {
        rm.request_status == RequestStatus::Pending
            && rm.kind == kind
            && Self::can_act(role, rm.state)
    }

    /// Orders awaiting the role's sign-off for one kind, newest first.
    pub fn list_pending(
        &self,
        branch_id: BranchId,
        role: Role,
        kind: OrderKind,
    ) -> Vec<OrderReadModel> {
        let mut pending: Vec<_> = self
            .orders
            .list(branch_id)
            .into_iter()
            .filter(|rm| Self::is_pending_for(role, kind, rm))
            .collect();

        pending.sort_by(|a, b| {
            b.opened_at
                .cmp(&a.opened_at)
                .then_with(|| b.order_id.0.as_uuid().cmp(a.order_id.0.as_uuid()))
        });

        pending
    }

    /// Pending counts per kind, one pass over the same filter per kind.
    ///
    /// Invariant: `counts_by_kind(b, r).for_kind(k) == list_pending(b, r, k).len()`
    /// for every role/kind pair — both go through [`Self::is_pending_for`].
    pub fn counts_by_kind(&self, branch_id: BranchId, role: Role) -> ApprovalCounts {
        let all = self.orders.list(branch_id);
        let count = |kind: OrderKind| {
            all.iter()
                .filter(|rm| Self::is_pending_for(role, kind, rm))
                .count()
        };

        ApprovalCounts {
            regular: count(OrderKind::Regular),
            additional: count(OrderKind::Additional),
            emergency: count(OrderKind::Emergency),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{Duration, Utc};

    use brigade_core::{AggregateId, SupplierId};
    use brigade_orders::OrderItem;

    use crate::read_model::InMemoryBranchStore;

    type Store = Arc<InMemoryBranchStore<OrderId, OrderReadModel>>;

    fn service() -> (Store, ApprovalQueueService<Store>, BranchId) {
        let store: Store = Arc::new(InMemoryBranchStore::new());
        let projection = Arc::new(OrdersProjection::new(store.clone()));
        (store.clone(), ApprovalQueueService::new(projection), BranchId::new())
    }

    fn seed_order(
        store: &Store,
        branch_id: BranchId,
        kind: OrderKind,
        state: OrderState,
        request_status: RequestStatus,
        age_minutes: i64,
    ) -> OrderId {
        let order_id = OrderId::new(AggregateId::new());
        store.upsert(
            branch_id,
            order_id,
            OrderReadModel {
                order_id,
                supplier_id: SupplierId::new(),
                kind,
                state,
                request_status,
                items: vec![OrderItem {
                    line_no: 1,
                    product_id: brigade_core::ProductId::new(),
                    ordered: 5,
                    received: 0,
                }],
                opened_at: Utc::now() - Duration::minutes(age_minutes),
            },
        );
        order_id
    }

    #[test]
    fn counts_match_list_lengths_for_every_role_and_kind() {
        let (store, svc, branch_id) = service();

        for kind in OrderKind::ALL {
            seed_order(
                &store,
                branch_id,
                kind,
                OrderState::PendingManagerApproval,
                RequestStatus::Pending,
                1,
            );
        }
        seed_order(
            &store,
            branch_id,
            OrderKind::Additional,
            OrderState::PendingManagerApproval,
            RequestStatus::Pending,
            2,
        );
        seed_order(
            &store,
            branch_id,
            OrderKind::Emergency,
            OrderState::Approved,
            RequestStatus::Approved,
            3,
        );

        for role in Role::ALL {
            let counts = svc.counts_by_kind(branch_id, role);
            for kind in OrderKind::ALL {
                assert_eq!(
                    counts.for_kind(kind),
                    svc.list_pending(branch_id, role, kind).len(),
                    "count/list mismatch for {role} / {kind}"
                );
            }
        }
    }

    #[test]
    fn manager_sees_pending_orders_newest_first() {
        let (store, svc, branch_id) = service();

        let older = seed_order(
            &store,
            branch_id,
            OrderKind::Additional,
            OrderState::PendingManagerApproval,
            RequestStatus::Pending,
            30,
        );
        let newer = seed_order(
            &store,
            branch_id,
            OrderKind::Additional,
            OrderState::PendingManagerApproval,
            RequestStatus::Pending,
            5,
        );

        let pending = svc.list_pending(branch_id, Role::Manager, OrderKind::Additional);
        let ids: Vec<_> = pending.iter().map(|rm| rm.order_id).collect();
        assert_eq!(ids, vec![newer, older]);
    }

    #[test]
    fn roles_without_sign_off_rights_see_empty_queues() {
        let (store, svc, branch_id) = service();
        seed_order(
            &store,
            branch_id,
            OrderKind::Emergency,
            OrderState::PendingManagerApproval,
            RequestStatus::Pending,
            1,
        );

        assert!(svc.list_pending(branch_id, Role::Staff, OrderKind::Emergency).is_empty());
        assert!(svc.list_pending(branch_id, Role::Purchasing, OrderKind::Emergency).is_empty());
        assert_eq!(
            svc.list_pending(branch_id, Role::Manager, OrderKind::Emergency).len(),
            1
        );
        assert_eq!(
            svc.list_pending(branch_id, Role::Admin, OrderKind::Emergency).len(),
            1
        );
    }

    #[test]
    fn queues_are_branch_scoped() {
        let (store, svc, branch_id) = service();
        let other_branch = BranchId::new();
        seed_order(
            &store,
            other_branch,
            OrderKind::Regular,
            OrderState::PendingManagerApproval,
            RequestStatus::Pending,
            1,
        );

        assert!(svc.list_pending(branch_id, Role::Manager, OrderKind::Regular).is_empty());
        assert_eq!(
            svc.list_pending(other_branch, Role::Manager, OrderKind::Regular).len(),
            1
        );
    }
}
