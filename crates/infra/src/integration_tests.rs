//! End-to-end infrastructure tests: dispatcher + store + bus + projections.

use std::sync::Arc;

use chrono::Utc;
use serde_json::Value as JsonValue;
use uuid::Uuid;

use brigade_auth::{Actor, Role};
use brigade_core::{AggregateId, BranchId, ExpectedVersion, ProductId, SupplierId, UserId};
use brigade_events::{EventBus, EventEnvelope, InMemoryEventBus, Subscription};
use brigade_orders::{
    AddItem, OpenOrder, Order, OrderCommand, OrderId, OrderKind, OrderState, RecordReceipt,
    Reconcile, RequestStatus, StatusChanged, Transition,
};

use crate::command_dispatcher::{CommandDispatcher, DispatchError};
use crate::event_store::{EventStore, EventStoreError, InMemoryEventStore, UncommittedEvent};
use crate::projections::{
    ApprovalQueueService, OrderFilter, OrderReadModel, OrdersProjection, Pagination,
    StockOnHandProjection, StockReadModel,
};
use crate::read_model::InMemoryBranchStore;

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
type OrdersStore = Arc<InMemoryBranchStore<OrderId, OrderReadModel>>;
type StockStore = Arc<InMemoryBranchStore<ProductId, StockReadModel>>;

struct Harness {
    store: Arc<InMemoryEventStore>,
    dispatcher: CommandDispatcher<Arc<InMemoryEventStore>, Bus>,
    subscription: Subscription<EventEnvelope<JsonValue>>,
    orders: Arc<OrdersProjection<OrdersStore>>,
    queue: ApprovalQueueService<OrdersStore>,
    stock: Arc<StockOnHandProjection<StockStore>>,
    seen: std::cell::RefCell<Vec<EventEnvelope<JsonValue>>>,
}

impl Harness {
    fn new() -> Self {
        let store = Arc::new(InMemoryEventStore::new());
        let bus: Bus = Arc::new(InMemoryEventBus::new());
        let subscription = bus.subscribe();

        let orders_store: OrdersStore = Arc::new(InMemoryBranchStore::new());
        let orders = Arc::new(OrdersProjection::new(orders_store.clone()));
        let queue = ApprovalQueueService::new(orders.clone());

        let stock_store: StockStore = Arc::new(InMemoryBranchStore::new());
        let stock = Arc::new(StockOnHandProjection::new(stock_store));

        let dispatcher = CommandDispatcher::new(store.clone(), bus);
        Self {
            store,
            dispatcher,
            subscription,
            orders,
            queue,
            stock,
            seen: std::cell::RefCell::new(Vec::new()),
        }
    }

    /// Apply everything the bus has delivered so far (test-side projection pump).
    fn drain(&self) {
        for env in self.subscription.try_iter() {
            self.orders.apply_envelope(&env).expect("orders projection apply");
            self.stock.apply_envelope(&env).expect("stock projection apply");
            self.seen.borrow_mut().push(env);
        }
    }

    fn dispatch(
        &self,
        branch_id: BranchId,
        order_id: OrderId,
        command: OrderCommand,
    ) -> Result<(), DispatchError> {
        self.dispatcher
            .dispatch::<Order>(branch_id, order_id.0, "orders.order", command, |_b, id| {
                Order::empty(OrderId::new(id))
            })
            .map(|_| ())
    }
}

fn actor(roles: &[Role]) -> Actor {
    Actor::new(UserId::new(), roles.to_vec())
}

/// Open an order with one line and walk it to the requested state.
fn open_order(
    h: &Harness,
    branch_id: BranchId,
    kind: OrderKind,
    ordered: i64,
) -> (OrderId, ProductId) {
    let order_id = OrderId::new(AggregateId::new());
    let product_id = ProductId::new();

    h.dispatch(
        branch_id,
        order_id,
        OrderCommand::OpenOrder(OpenOrder {
            branch_id,
            order_id,
            supplier_id: SupplierId::new(),
            kind,
            occurred_at: Utc::now(),
        }),
    )
    .expect("open order");

    h.dispatch(
        branch_id,
        order_id,
        OrderCommand::AddItem(AddItem {
            branch_id,
            order_id,
            product_id,
            quantity: ordered,
            occurred_at: Utc::now(),
        }),
    )
    .expect("add item");

    (order_id, product_id)
}

fn transition(
    h: &Harness,
    branch_id: BranchId,
    order_id: OrderId,
    target: OrderState,
    roles: &[Role],
) -> Result<(), DispatchError> {
    h.dispatch(
        branch_id,
        order_id,
        OrderCommand::Transition(Transition {
            branch_id,
            order_id,
            target,
            actor: actor(roles),
            occurred_at: Utc::now(),
        }),
    )
}

#[test]
fn full_lifecycle_reaches_received_and_feeds_stock() {
    let h = Harness::new();
    let branch_id = BranchId::new();
    let (order_id, product_id) = open_order(&h, branch_id, OrderKind::Regular, 10);

    transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();
    transition(&h, branch_id, order_id, OrderState::Approved, &[Role::Manager]).unwrap();
    transition(&h, branch_id, order_id, OrderState::Committed, &[Role::Purchasing]).unwrap();

    h.dispatch(
        branch_id,
        order_id,
        OrderCommand::RecordReceipt(RecordReceipt {
            branch_id,
            order_id,
            line_no: 1,
            quantity: 10,
            actor: actor(&[Role::Receiving]),
            occurred_at: Utc::now(),
        }),
    )
    .unwrap();

    h.dispatch(
        branch_id,
        order_id,
        OrderCommand::Reconcile(Reconcile {
            branch_id,
            order_id,
            actor: actor(&[Role::Receiving]),
            occurred_at: Utc::now(),
        }),
    )
    .unwrap();

    h.drain();

    let rm = h.orders.get(branch_id, &order_id).expect("read model present");
    assert_eq!(rm.state, OrderState::Received);
    assert_eq!(rm.request_status, RequestStatus::Approved);
    assert_eq!(rm.items.len(), 1);
    assert_eq!(rm.items[0].received, 10);

    let stock = h.stock.get(branch_id, &product_id).expect("stock present");
    assert_eq!(stock.on_hand, 10);
}

#[test]
fn approval_clears_the_pending_queue() {
    let h = Harness::new();
    let branch_id = BranchId::new();
    let (order_id, _) = open_order(&h, branch_id, OrderKind::Additional, 10);

    transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();
    h.drain();

    let before = h.queue.counts_by_kind(branch_id, Role::Manager);
    assert_eq!(before.additional, 1);
    assert_eq!(
        h.queue
            .list_pending(branch_id, Role::Manager, OrderKind::Additional)
            .len(),
        1
    );

    transition(&h, branch_id, order_id, OrderState::Approved, &[Role::Manager]).unwrap();
    h.drain();

    let after = h.queue.counts_by_kind(branch_id, Role::Manager);
    assert_eq!(after.additional, before.additional - 1);
    assert!(h
        .queue
        .list_pending(branch_id, Role::Manager, OrderKind::Additional)
        .is_empty());
}

#[test]
fn stale_writer_loses_the_compare_and_swap() {
    let h = Harness::new();
    let branch_id = BranchId::new();
    let (order_id, _) = open_order(&h, branch_id, OrderKind::Regular, 5);
    transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();

    // Two writers load the same snapshot and decide conflicting transitions.
    let history = h.store.load_stream(branch_id, order_id.0).unwrap();
    let version = history.last().unwrap().sequence_number;

    let decide = |target: OrderState| {
        let event = StatusChanged {
            branch_id,
            order_id,
            from: OrderState::PendingManagerApproval,
            to: target,
            request_status: brigade_orders::request_status_for(target),
            actor: UserId::new(),
            role: Role::Manager,
            occurred_at: Utc::now(),
        };
        UncommittedEvent::from_typed(
            branch_id,
            order_id.0,
            "orders.order",
            Uuid::now_v7(),
            &brigade_orders::OrderEvent::StatusChanged(event),
        )
        .unwrap()
    };

    let first = h
        .store
        .append(vec![decide(OrderState::Approved)], ExpectedVersion::Exact(version));
    assert!(first.is_ok());

    let second = h
        .store
        .append(vec![decide(OrderState::Rejected)], ExpectedVersion::Exact(version));
    let err = second.unwrap_err();
    assert!(matches!(err, EventStoreError::Concurrency(_)));

    // The dispatcher surfaces that failure as StaleState.
    assert!(matches!(DispatchError::from(err), DispatchError::StaleState(_)));
}

#[test]
fn dispatch_against_moved_state_is_an_invalid_transition() {
    // A retry after losing the race reloads fresh state; the same command now
    // fails deterministically instead of double-applying.
    let h = Harness::new();
    let branch_id = BranchId::new();
    let (order_id, _) = open_order(&h, branch_id, OrderKind::Regular, 5);
    transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();
    transition(&h, branch_id, order_id, OrderState::Approved, &[Role::Manager]).unwrap();

    let err = transition(&h, branch_id, order_id, OrderState::Approved, &[Role::Manager]).unwrap_err();
    assert!(matches!(err, DispatchError::InvalidTransition(_)));
}

#[test]
fn cross_branch_dispatch_sees_nothing() {
    let h = Harness::new();
    let branch_id = BranchId::new();
    let other_branch = BranchId::new();
    let (order_id, _) = open_order(&h, branch_id, OrderKind::Regular, 5);

    // From the other branch the stream is empty, so the order does not exist.
    let err = transition(&h, other_branch, order_id, OrderState::PendingManagerApproval, &[Role::Staff])
        .unwrap_err();
    assert!(matches!(err, DispatchError::NotFound));
}

#[test]
fn filtered_query_honors_filter_and_pagination() {
    let h = Harness::new();
    let branch_id = BranchId::new();

    for _ in 0..3 {
        let (order_id, _) = open_order(&h, branch_id, OrderKind::Emergency, 5);
        transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();
    }
    let _ = open_order(&h, branch_id, OrderKind::Regular, 5);
    h.drain();

    let filter = OrderFilter {
        kind: Some(OrderKind::Emergency),
        request_status: Some(RequestStatus::Pending),
        ..OrderFilter::default()
    };

    let all = h.orders.query(branch_id, &filter, &Pagination::default());
    assert_eq!(all.len(), 3);
    // Newest first.
    assert!(all.windows(2).all(|w| w[0].opened_at >= w[1].opened_at));

    let page = h.orders.query(branch_id, &filter, &Pagination { offset: 2, limit: 2 });
    assert_eq!(page.len(), 1);
    assert_eq!(page[0].order_id, all[2].order_id);
}

#[test]
fn rebuild_from_scratch_matches_incremental_application() {
    let h = Harness::new();
    let branch_id = BranchId::new();
    let (order_id, _) = open_order(&h, branch_id, OrderKind::Additional, 8);
    transition(&h, branch_id, order_id, OrderState::PendingManagerApproval, &[Role::Staff]).unwrap();
    transition(&h, branch_id, order_id, OrderState::Approved, &[Role::Manager]).unwrap();
    h.drain();

    let incremental = h.orders.get(branch_id, &order_id).unwrap();

    let fresh_store: OrdersStore = Arc::new(InMemoryBranchStore::new());
    let fresh = OrdersProjection::new(fresh_store);
    fresh
        .rebuild_from_scratch(h.seen.borrow().iter().cloned())
        .unwrap();

    assert_eq!(fresh.get(branch_id, &order_id).unwrap(), incremental);
}
