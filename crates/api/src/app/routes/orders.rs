use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use brigade_auth::Capability;
use brigade_core::AggregateId;
use brigade_infra::projections::orders::ORDER_AGGREGATE_TYPE;
use brigade_orders::{
    AddItem, OpenOrder, Order, OrderCommand, OrderId, OrderState, RecordReceipt, Reconcile,
    Transition,
};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{BranchContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/", post(open_order).get(list_orders))
        .route("/:id", get(get_order))
        .route("/:id/submit", post(submit_order))
        .route("/:id/approve", post(approve_order))
        .route("/:id/reject", post(reject_order))
        .route("/:id/commit", post(commit_order))
        .route("/:id/receipts", post(record_receipt))
        .route("/:id/reconcile", post(reconcile_order))
}

fn dispatch_order(
    services: &AppServices,
    branch: &BranchContext,
    order_agg: AggregateId,
    command: OrderCommand,
) -> Result<usize, axum::response::Response> {
    services
        .dispatch::<Order>(
            branch.branch_id(),
            order_agg,
            ORDER_AGGREGATE_TYPE,
            command,
            |_b, aggregate_id| Order::empty(OrderId::new(aggregate_id)),
        )
        .map(|committed| committed.len())
        .map_err(errors::dispatch_error_to_response)
}

pub async fn open_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::OpenOrderRequest>,
) -> axum::response::Response {
    if crate::authz::authorize_request(&principal, Capability::OpenOrder).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let supplier_id = match body.supplier_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid supplier_id"),
    };
    let kind = match errors::parse_order_kind(&body.kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };

    let order_agg = AggregateId::new();
    let order_id = OrderId::new(order_agg);

    // 1) Open the draft
    let cmd = OrderCommand::OpenOrder(OpenOrder {
        branch_id: branch.branch_id(),
        order_id,
        supplier_id,
        kind,
        occurred_at: Utc::now(),
    });

    let mut committed_total = match dispatch_order(&services, &branch, order_agg, cmd) {
        Ok(n) => n,
        Err(resp) => return resp,
    };

    // 2) Add lines
    for l in body.lines {
        let product_id = match l.product_id.parse() {
            Ok(v) => v,
            Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
        };
        let add_cmd = OrderCommand::AddItem(AddItem {
            branch_id: branch.branch_id(),
            order_id,
            product_id,
            quantity: l.quantity,
            occurred_at: Utc::now(),
        });
        match dispatch_order(&services, &branch, order_agg, add_cmd) {
            Ok(n) => committed_total += n,
            Err(resp) => return resp,
        }
    }

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": order_agg.to_string(),
            "events_committed": committed_total,
        })),
    )
        .into_response()
}

/// Shared handler body for the four explicit workflow edges.
fn transition_order(
    services: &AppServices,
    branch: &BranchContext,
    principal: &PrincipalContext,
    id: &str,
    target: OrderState,
    capability: Capability,
) -> axum::response::Response {
    let order_agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    let order_id = OrderId::new(order_agg);

    if crate::authz::authorize_request(principal, capability).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let cmd = OrderCommand::Transition(Transition {
        branch_id: branch.branch_id(),
        order_id,
        target,
        actor: principal.actor(),
        occurred_at: Utc::now(),
    });

    match dispatch_order(services, branch, order_agg, cmd) {
        Ok(n) => (
            StatusCode::OK,
            Json(serde_json::json!({
                "id": order_agg.to_string(),
                "state": target.as_str(),
                "events_committed": n,
            })),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn submit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition_order(
        &services,
        &branch,
        &principal,
        &id,
        OrderState::PendingManagerApproval,
        Capability::SubmitOrder,
    )
}

pub async fn approve_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition_order(
        &services,
        &branch,
        &principal,
        &id,
        OrderState::Approved,
        Capability::ApproveOrder,
    )
}

pub async fn reject_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition_order(
        &services,
        &branch,
        &principal,
        &id,
        OrderState::Rejected,
        Capability::RejectOrder,
    )
}

pub async fn commit_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    transition_order(
        &services,
        &branch,
        &principal,
        &id,
        OrderState::Committed,
        Capability::CommitOrder,
    )
}

pub async fn record_receipt(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::ReceiptRequest>,
) -> axum::response::Response {
    let order_agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    let order_id = OrderId::new(order_agg);

    if crate::authz::authorize_request(&principal, Capability::ReceiveGoods).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let cmd = OrderCommand::RecordReceipt(RecordReceipt {
        branch_id: branch.branch_id(),
        order_id,
        line_no: body.line_no,
        quantity: body.quantity,
        actor: principal.actor(),
        occurred_at: Utc::now(),
    });

    match dispatch_order(&services, &branch, order_agg, cmd) {
        Ok(n) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": order_agg.to_string(), "events_committed": n })),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn reconcile_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    let order_id = OrderId::new(order_agg);

    if crate::authz::authorize_request(&principal, Capability::ReconcileOrder).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let cmd = OrderCommand::Reconcile(Reconcile {
        branch_id: branch.branch_id(),
        order_id,
        actor: principal.actor(),
        occurred_at: Utc::now(),
    });

    match dispatch_order(&services, &branch, order_agg, cmd) {
        // Zero committed events means the received quantities were not
        // decisive yet; the order keeps its current status.
        Ok(n) => (
            StatusCode::OK,
            Json(serde_json::json!({ "id": order_agg.to_string(), "events_committed": n })),
        )
            .into_response(),
        Err(resp) => resp,
    }
}

pub async fn get_order(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Path(id): Path<String>,
) -> axum::response::Response {
    let order_agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid order id"),
    };
    let order_id = OrderId::new(order_agg);
    match services.orders_get(branch.branch_id(), &order_id) {
        Some(rm) => (StatusCode::OK, Json(dto::order_to_json(rm))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "order not found"),
    }
}

pub async fn list_orders(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Query(query): Query<dto::OrderListQuery>,
) -> axum::response::Response {
    let (filter, pagination) = match query.into_query() {
        Ok(parsed) => parsed,
        Err(resp) => return resp,
    };

    let items = services
        .orders_query(branch.branch_id(), &filter, &pagination)
        .into_iter()
        .map(dto::order_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
