use serde::Deserialize;

use brigade_infra::projections::{OrderFilter, OrderReadModel, Pagination, StockReadModel};

use crate::app::errors;

// -------------------------
// Request DTOs
// -------------------------

#[derive(Debug, Deserialize)]
pub struct OrderLineRequest {
    pub product_id: String,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct OpenOrderRequest {
    pub supplier_id: String,
    pub kind: String,
    pub lines: Vec<OrderLineRequest>,
}

#[derive(Debug, Deserialize)]
pub struct ReceiptRequest {
    pub line_no: u32,
    pub quantity: i64,
}

#[derive(Debug, Deserialize)]
pub struct RegisterStockItemRequest {
    pub product_id: String,
    pub name: String,
    pub unit: String,
}

#[derive(Debug, Deserialize)]
pub struct AdjustStockRequest {
    pub delta: i64,
}

/// Raw order-list query parameters.
///
/// Parsed once into the immutable (`OrderFilter`, `Pagination`) pair; handlers
/// never read query state after that.
#[derive(Debug, Default, Deserialize)]
pub struct OrderListQuery {
    pub kind: Option<String>,
    pub state: Option<String>,
    pub request_status: Option<String>,
    pub supplier_id: Option<String>,
    pub offset: Option<usize>,
    pub limit: Option<usize>,
}

impl OrderListQuery {
    pub fn into_query(self) -> Result<(OrderFilter, Pagination), axum::response::Response> {
        let mut filter = OrderFilter::default();

        if let Some(kind) = self.kind.as_deref() {
            filter.kind = Some(errors::parse_order_kind(kind)?);
        }
        if let Some(state) = self.state.as_deref() {
            filter.state = Some(errors::parse_order_state(state)?);
        }
        if let Some(request_status) = self.request_status.as_deref() {
            filter.request_status = Some(errors::parse_request_status(request_status)?);
        }
        if let Some(supplier_id) = self.supplier_id.as_deref() {
            let parsed = supplier_id.parse().map_err(|_| {
                errors::json_error(
                    axum::http::StatusCode::BAD_REQUEST,
                    "invalid_id",
                    "invalid supplier_id",
                )
            })?;
            filter.supplier_id = Some(parsed);
        }

        let defaults = Pagination::default();
        let pagination = Pagination {
            offset: self.offset.unwrap_or(defaults.offset),
            limit: self.limit.unwrap_or(defaults.limit).min(200),
        };

        Ok((filter, pagination))
    }
}

// -------------------------
// JSON mapping helpers
// -------------------------

pub fn order_to_json(rm: OrderReadModel) -> serde_json::Value {
    serde_json::json!({
        "id": rm.order_id.0.to_string(),
        "supplier_id": rm.supplier_id.to_string(),
        "kind": rm.kind.as_str(),
        "state": rm.state.as_str(),
        "request_status": rm.request_status.as_str(),
        "opened_at": rm.opened_at.to_rfc3339(),
        "items": rm.items.into_iter().map(|i| serde_json::json!({
            "line_no": i.line_no,
            "product_id": i.product_id.to_string(),
            "ordered": i.ordered,
            "received": i.received,
        })).collect::<Vec<_>>()
    })
}

pub fn stock_to_json(rm: StockReadModel) -> serde_json::Value {
    serde_json::json!({
        "product_id": rm.product_id.to_string(),
        "name": rm.name,
        "unit": rm.unit,
        "on_hand": rm.on_hand,
    })
}
