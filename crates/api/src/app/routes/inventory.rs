use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path},
    http::StatusCode,
    response::IntoResponse,
    routing::{get, post},
};
use chrono::Utc;

use brigade_auth::Capability;
use brigade_core::AggregateId;
use brigade_infra::projections::stock::STOCK_AGGREGATE_TYPE;
use brigade_inventory::{AdjustStock, InventoryCommand, RegisterItem, StockItem, StockItemId};

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{BranchContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/items", post(register_item))
        .route("/items/:id/adjust", post(adjust_stock))
        .route("/stock", get(list_stock))
        .route("/stock/:product_id", get(get_stock))
}

pub async fn register_item(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Json(body): Json<dto::RegisterStockItemRequest>,
) -> axum::response::Response {
    if crate::authz::authorize_request(&principal, Capability::ManageStock).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let product_id = match body.product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    let item_agg = AggregateId::new();
    let item_id = StockItemId::new(item_agg);

    let cmd = InventoryCommand::RegisterItem(RegisterItem {
        branch_id: branch.branch_id(),
        item_id,
        product_id,
        name: body.name,
        unit: body.unit,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch::<StockItem>(
        branch.branch_id(),
        item_agg,
        STOCK_AGGREGATE_TYPE,
        cmd,
        |_b, aggregate_id| StockItem::empty(StockItemId::new(aggregate_id)),
    ) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::CREATED,
        Json(serde_json::json!({
            "id": item_agg.to_string(),
            "events_committed": committed.len(),
        })),
    )
        .into_response()
}

pub async fn adjust_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(id): Path<String>,
    Json(body): Json<dto::AdjustStockRequest>,
) -> axum::response::Response {
    if crate::authz::authorize_request(&principal, Capability::ManageStock).is_err() {
        return errors::json_error(StatusCode::FORBIDDEN, "forbidden", "missing capability");
    }

    let item_agg: AggregateId = match id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid stock item id"),
    };
    let item_id = StockItemId::new(item_agg);

    let cmd = InventoryCommand::AdjustStock(AdjustStock {
        branch_id: branch.branch_id(),
        item_id,
        delta: body.delta,
        occurred_at: Utc::now(),
    });

    let committed = match services.dispatch::<StockItem>(
        branch.branch_id(),
        item_agg,
        STOCK_AGGREGATE_TYPE,
        cmd,
        |_b, aggregate_id| StockItem::empty(StockItemId::new(aggregate_id)),
    ) {
        Ok(c) => c,
        Err(e) => return errors::dispatch_error_to_response(e),
    };

    (
        StatusCode::OK,
        Json(serde_json::json!({ "id": item_agg.to_string(), "events_committed": committed.len() })),
    )
        .into_response()
}

pub async fn get_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Path(product_id): Path<String>,
) -> axum::response::Response {
    let product_id = match product_id.parse() {
        Ok(v) => v,
        Err(_) => return errors::json_error(StatusCode::BAD_REQUEST, "invalid_id", "invalid product id"),
    };

    match services.stock_get(branch.branch_id(), &product_id) {
        Some(rm) => (StatusCode::OK, Json(dto::stock_to_json(rm))).into_response(),
        None => errors::json_error(StatusCode::NOT_FOUND, "not_found", "no stock recorded for product"),
    }
}

pub async fn list_stock(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
) -> axum::response::Response {
    let items = services
        .stock_list(branch.branch_id())
        .into_iter()
        .map(dto::stock_to_json)
        .collect::<Vec<_>>();
    (StatusCode::OK, Json(serde_json::json!({ "items": items }))).into_response()
}
