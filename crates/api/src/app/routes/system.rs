use axum::{Json, extract::Extension, http::StatusCode, response::IntoResponse};

use crate::context::{BranchContext, PrincipalContext};

pub async fn health() -> axum::response::Response {
    (StatusCode::OK, Json(serde_json::json!({ "status": "ok" }))).into_response()
}

pub async fn whoami(
    Extension(branch): Extension<BranchContext>,
    Extension(principal): Extension<PrincipalContext>,
) -> axum::response::Response {
    (
        StatusCode::OK,
        Json(serde_json::json!({
            "branch_id": branch.branch_id().to_string(),
            "user_id": principal.user_id().to_string(),
            "roles": principal.roles().iter().map(|r| r.as_str()).collect::<Vec<_>>(),
        })),
    )
        .into_response()
}
