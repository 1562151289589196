use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde_json::json;

use brigade_auth::Role;
use brigade_infra::command_dispatcher::DispatchError;
use brigade_orders::{OrderKind, OrderState, RequestStatus};

pub fn dispatch_error_to_response(err: DispatchError) -> axum::response::Response {
    match err {
        DispatchError::StaleState(msg) => json_error(StatusCode::CONFLICT, "stale_state", msg),
        DispatchError::InvalidTransition(msg) => {
            json_error(StatusCode::UNPROCESSABLE_ENTITY, "invalid_transition", msg)
        }
        DispatchError::Unauthorized => json_error(StatusCode::FORBIDDEN, "unauthorized", "unauthorized"),
        DispatchError::EmptyOrder => json_error(
            StatusCode::UNPROCESSABLE_ENTITY,
            "empty_order",
            "order has no line items",
        ),
        DispatchError::Validation(msg) => json_error(StatusCode::BAD_REQUEST, "validation_error", msg),
        DispatchError::NotFound => json_error(StatusCode::NOT_FOUND, "not_found", "not found"),
        DispatchError::Deserialize(msg) => {
            json_error(StatusCode::INTERNAL_SERVER_ERROR, "deserialize_error", msg)
        }
        DispatchError::Store(e) => json_error(
            StatusCode::INTERNAL_SERVER_ERROR,
            "store_error",
            format!("{e:?}"),
        ),
        DispatchError::Publish(msg) => json_error(StatusCode::BAD_GATEWAY, "publish_error", msg),
        DispatchError::BranchIsolation(msg) => json_error(StatusCode::FORBIDDEN, "branch_isolation", msg),
    }
}

pub fn json_error(
    status: StatusCode,
    code: &'static str,
    message: impl Into<String>,
) -> axum::response::Response {
    (
        status,
        axum::Json(json!({
            "error": code,
            "message": message.into(),
        })),
    )
        .into_response()
}

pub fn parse_order_kind(s: &str) -> Result<OrderKind, axum::response::Response> {
    match s.to_lowercase().as_str() {
        "regular" => Ok(OrderKind::Regular),
        "additional" => Ok(OrderKind::Additional),
        "emergency" => Ok(OrderKind::Emergency),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_order_kind",
            "kind must be one of: regular, additional, emergency",
        )),
    }
}

pub fn parse_order_state(s: &str) -> Result<OrderState, axum::response::Response> {
    OrderState::ALL
        .into_iter()
        .find(|state| state.as_str() == s)
        .ok_or_else(|| {
            json_error(
                StatusCode::BAD_REQUEST,
                "invalid_order_state",
                "unknown order state",
            )
        })
}

pub fn parse_request_status(s: &str) -> Result<RequestStatus, axum::response::Response> {
    match s {
        "not_submitted" => Ok(RequestStatus::NotSubmitted),
        "pending" => Ok(RequestStatus::Pending),
        "approved" => Ok(RequestStatus::Approved),
        "rejected" => Ok(RequestStatus::Rejected),
        _ => Err(json_error(
            StatusCode::BAD_REQUEST,
            "invalid_request_status",
            "request_status must be one of: not_submitted, pending, approved, rejected",
        )),
    }
}

pub fn parse_role(s: &str) -> Result<Role, axum::response::Response> {
    s.parse().map_err(|_| {
        json_error(
            StatusCode::BAD_REQUEST,
            "invalid_role",
            "role must be one of: staff, manager, purchasing, receiving, admin",
        )
    })
}
