use std::sync::Arc;

use serde_json::Value as JsonValue;

use brigade_auth::Role;
use brigade_core::{AggregateId, BranchId, DomainError, ProductId};
use brigade_events::{EventBus, EventEnvelope, InMemoryEventBus};
use brigade_infra::{
    command_dispatcher::{CommandDispatcher, DispatchError},
    event_store::{InMemoryEventStore, StoredEvent},
    projections::{
        ApprovalCounts, ApprovalQueueService, OrderFilter, OrderReadModel, OrdersProjection,
        Pagination, StockOnHandProjection, StockReadModel,
        orders::ORDER_AGGREGATE_TYPE, stock::STOCK_AGGREGATE_TYPE,
    },
    read_model::InMemoryBranchStore,
};
use brigade_orders::{OrderId, OrderKind};

type Dispatcher =
    CommandDispatcher<Arc<InMemoryEventStore>, Arc<InMemoryEventBus<EventEnvelope<JsonValue>>>>;
type OrdersStore = Arc<InMemoryBranchStore<OrderId, OrderReadModel>>;
type StockStore = Arc<InMemoryBranchStore<ProductId, StockReadModel>>;

/// In-memory infra wiring shared by all request handlers.
pub struct AppServices {
    dispatcher: Arc<Dispatcher>,
    orders_projection: Arc<OrdersProjection<OrdersStore>>,
    approval_queue: ApprovalQueueService<OrdersStore>,
    stock_projection: Arc<StockOnHandProjection<StockStore>>,
}

pub fn build_services() -> AppServices {
    // In-memory infra wiring: store + bus + projections.
    let store = Arc::new(InMemoryEventStore::new());
    let bus: Arc<InMemoryEventBus<EventEnvelope<JsonValue>>> = Arc::new(InMemoryEventBus::new());

    let orders_store: OrdersStore = Arc::new(InMemoryBranchStore::new());
    let orders_projection: Arc<OrdersProjection<_>> =
        Arc::new(OrdersProjection::new(orders_store));
    let approval_queue = ApprovalQueueService::new(orders_projection.clone());

    let stock_store: StockStore = Arc::new(InMemoryBranchStore::new());
    let stock_projection: Arc<StockOnHandProjection<_>> =
        Arc::new(StockOnHandProjection::new(stock_store));

    // Background subscriber: bus -> projections
    {
        let sub = bus.subscribe();
        let orders_projection = orders_projection.clone();
        let stock_projection = stock_projection.clone();
        tokio::task::spawn_blocking(move || {
            loop {
                match sub.recv() {
                    Ok(env) => {
                        // Apply to the relevant projection(s) only.
                        let apply_ok = match env.aggregate_type() {
                            ORDER_AGGREGATE_TYPE => orders_projection
                                .apply_envelope(&env)
                                .map_err(|e| e.to_string())
                                .and_then(|_| {
                                    stock_projection
                                        .apply_envelope(&env)
                                        .map_err(|e| e.to_string())
                                }),
                            STOCK_AGGREGATE_TYPE => stock_projection
                                .apply_envelope(&env)
                                .map_err(|e| e.to_string()),
                            _ => Ok(()),
                        };

                        if let Err(e) = apply_ok {
                            tracing::warn!("projection apply failed: {e}");
                        }
                    }
                    Err(_) => break,
                }
            }
        });
    }

    let dispatcher: Arc<Dispatcher> = Arc::new(CommandDispatcher::new(store, bus));
    AppServices {
        dispatcher,
        orders_projection,
        approval_queue,
        stock_projection,
    }
}

impl AppServices {
    pub fn dispatch<A>(
        &self,
        branch_id: BranchId,
        aggregate_id: AggregateId,
        aggregate_type: &str,
        command: A::Command,
        make_aggregate: impl FnOnce(BranchId, AggregateId) -> A,
    ) -> Result<Vec<StoredEvent>, DispatchError>
    where
        A: brigade_core::Aggregate<Error = DomainError>,
        A::Event: brigade_events::Event + serde::Serialize + serde::de::DeserializeOwned,
    {
        self.dispatcher
            .dispatch::<A>(branch_id, aggregate_id, aggregate_type, command, make_aggregate)
    }

    pub fn orders_get(&self, branch_id: BranchId, order_id: &OrderId) -> Option<OrderReadModel> {
        self.orders_projection.get(branch_id, order_id)
    }

    pub fn orders_query(
        &self,
        branch_id: BranchId,
        filter: &OrderFilter,
        pagination: &Pagination,
    ) -> Vec<OrderReadModel> {
        self.orders_projection.query(branch_id, filter, pagination)
    }

    pub fn approvals_pending(
        &self,
        branch_id: BranchId,
        role: Role,
        kind: OrderKind,
    ) -> Vec<OrderReadModel> {
        self.approval_queue.list_pending(branch_id, role, kind)
    }

    pub fn approvals_counts(&self, branch_id: BranchId, role: Role) -> ApprovalCounts {
        self.approval_queue.counts_by_kind(branch_id, role)
    }

    pub fn stock_get(&self, branch_id: BranchId, product_id: &ProductId) -> Option<StockReadModel> {
        self.stock_projection.get(branch_id, product_id)
    }

    pub fn stock_list(&self, branch_id: BranchId) -> Vec<StockReadModel> {
        self.stock_projection.list(branch_id)
    }
}
