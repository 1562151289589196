//! Dispatch-pipeline benchmarks: command handling, append, rehydration.

use std::sync::Arc;

use chrono::Utc;
use criterion::{BatchSize, Criterion, criterion_group, criterion_main};
use serde_json::Value as JsonValue;

use brigade_auth::{Actor, Role};
use brigade_core::{AggregateId, BranchId, ProductId, SupplierId, UserId};
use brigade_events::{EventEnvelope, InMemoryEventBus};
use brigade_infra::command_dispatcher::CommandDispatcher;
use brigade_infra::event_store::InMemoryEventStore;
use brigade_orders::{
    AddItem, OpenOrder, Order, OrderCommand, OrderId, OrderKind, OrderState, RecordReceipt,
    Reconcile, Transition,
};

type Bus = Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>;
type Dispatcher = CommandDispatcher<Arc<InMemoryEventStore>, Bus>;

fn dispatcher() -> Dispatcher {
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Bus = Arc::new(InMemoryEventBus::new());
    CommandDispatcher::new(store, bus)
}

fn dispatch(d: &Dispatcher, branch_id: BranchId, order_id: OrderId, command: OrderCommand) {
    d.dispatch::<Order>(branch_id, order_id.0, "orders.order", command, |_b, id| {
        Order::empty(OrderId::new(id))
    })
    .expect("dispatch");
}

fn actor(role: Role) -> Actor {
    Actor::new(UserId::new(), vec![role])
}

/// Open an order with `lines` line items of 10 units each.
fn opened_order(d: &Dispatcher, branch_id: BranchId, lines: u32) -> OrderId {
    let order_id = OrderId::new(AggregateId::new());
    dispatch(
        d,
        branch_id,
        order_id,
        OrderCommand::OpenOrder(OpenOrder {
            branch_id,
            order_id,
            supplier_id: SupplierId::new(),
            kind: OrderKind::Regular,
            occurred_at: Utc::now(),
        }),
    );
    for _ in 0..lines {
        dispatch(
            d,
            branch_id,
            order_id,
            OrderCommand::AddItem(AddItem {
                branch_id,
                order_id,
                product_id: ProductId::new(),
                quantity: 10,
                occurred_at: Utc::now(),
            }),
        );
    }
    order_id
}

fn bench_full_lifecycle(c: &mut Criterion) {
    c.bench_function("order_lifecycle_draft_to_received", |b| {
        let d = dispatcher();
        let branch_id = BranchId::new();
        b.iter(|| {
            let order_id = opened_order(&d, branch_id, 1);
            for (target, role) in [
                (OrderState::PendingManagerApproval, Role::Staff),
                (OrderState::Approved, Role::Manager),
                (OrderState::Committed, Role::Purchasing),
            ] {
                dispatch(
                    &d,
                    branch_id,
                    order_id,
                    OrderCommand::Transition(Transition {
                        branch_id,
                        order_id,
                        target,
                        actor: actor(role),
                        occurred_at: Utc::now(),
                    }),
                );
            }
            dispatch(
                &d,
                branch_id,
                order_id,
                OrderCommand::RecordReceipt(RecordReceipt {
                    branch_id,
                    order_id,
                    line_no: 1,
                    quantity: 10,
                    actor: actor(Role::Receiving),
                    occurred_at: Utc::now(),
                }),
            );
            dispatch(
                &d,
                branch_id,
                order_id,
                OrderCommand::Reconcile(Reconcile {
                    branch_id,
                    order_id,
                    actor: actor(Role::Receiving),
                    occurred_at: Utc::now(),
                }),
            );
        });
    });
}

fn bench_rehydration(c: &mut Criterion) {
    // Cost of replaying a wide order (many line items) before one decision.
    c.bench_function("dispatch_against_64_line_order", |b| {
        let d = dispatcher();
        let branch_id = BranchId::new();
        let order_id = opened_order(&d, branch_id, 64);
        b.iter_batched(
            || (),
            |_| {
                // Illegal edge: full rehydration happens, nothing is appended,
                // so the stream length stays fixed across iterations.
                let result = d.dispatch::<Order>(
                    branch_id,
                    order_id.0,
                    "orders.order",
                    OrderCommand::Transition(Transition {
                        branch_id,
                        order_id,
                        target: OrderState::Received,
                        actor: actor(Role::Admin),
                        occurred_at: Utc::now(),
                    }),
                    |_b, id| Order::empty(OrderId::new(id)),
                );
                assert!(result.is_err());
            },
            BatchSize::SmallInput,
        );
    });
}

criterion_group!(benches, bench_full_lifecycle, bench_rehydration);
criterion_main!(benches);
