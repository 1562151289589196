use std::sync::Arc;

use axum::{
    Json, Router,
    extract::{Extension, Path, Query},
    http::StatusCode,
    response::IntoResponse,
    routing::get,
};
use serde::Deserialize;

use brigade_auth::Role;

use crate::app::services::AppServices;
use crate::app::{dto, errors};
use crate::context::{BranchContext, PrincipalContext};

pub fn router() -> Router {
    Router::new()
        .route("/counts", get(counts_by_kind))
        .route("/:kind", get(list_pending))
}

#[derive(Debug, Deserialize)]
pub struct RoleQuery {
    pub role: String,
}

/// The caller names the role they are acting as; it must be one they hold.
fn acting_role(
    principal: &PrincipalContext,
    query: &RoleQuery,
) -> Result<Role, axum::response::Response> {
    let role = errors::parse_role(&query.role)?;
    if !principal.roles().contains(&role) {
        return Err(errors::json_error(
            StatusCode::FORBIDDEN,
            "forbidden",
            format!("caller does not hold the '{role}' role"),
        ));
    }
    Ok(role)
}

pub async fn list_pending(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Path(kind): Path<String>,
    Query(query): Query<RoleQuery>,
) -> axum::response::Response {
    let kind = match errors::parse_order_kind(&kind) {
        Ok(k) => k,
        Err(resp) => return resp,
    };
    let role = match acting_role(&principal, &query) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let items = services
        .approvals_pending(branch.branch_id(), role, kind)
        .into_iter()
        .map(dto::order_to_json)
        .collect::<Vec<_>>();

    (
        StatusCode::OK,
        Json(serde_json::json!({
            "kind": kind.as_str(),
            "role": role.as_str(),
            "items": items,
        })),
    )
        .into_response()
}

pub async fn counts_by_kind(
    Extension(services): Extension<Arc<AppServices>>,
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
    Query(query): Query<RoleQuery>,
) -> axum::response::Response {
    let role = match acting_role(&principal, &query) {
        Ok(r) => r,
        Err(resp) => return resp,
    };

    let counts = services.approvals_counts(branch.branch_id(), role);
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "role": role.as_str(),
            "counts": counts,
        })),
    )
        .into_response()
}
