use axum::{Router, routing::get};

pub mod approvals;
pub mod inventory;
pub mod orders;
pub mod system;

/// Protected routes (auth middleware is layered on by `app::build_app`).
pub fn router() -> Router {
    Router::new()
        .route("/whoami", get(system::whoami))
        .nest("/orders", orders::router())
        .nest("/approvals", approvals::router())
        .nest("/inventory", inventory::router())
}
