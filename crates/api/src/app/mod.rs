//! HTTP application assembly.
//!
//! Layout:
//! - `services.rs`: infrastructure wiring (event store/bus, projections, dispatcher)
//! - `routes/`: HTTP routes + handlers (one file per domain area)
//! - `dto.rs`: request/response DTOs and JSON mapping helpers
//! - `errors.rs`: consistent error responses

use std::sync::Arc;

use axum::{Extension, Router, routing::get};
use tower::ServiceBuilder;

use crate::middleware;

pub mod dto;
pub mod errors;
pub mod routes;
pub mod services;

/// Build the full router (used by `main.rs` and the black-box tests).
///
/// `/health` is the only route outside the auth boundary; everything else
/// requires a bearer token that names the branch being operated on.
pub fn build_app(jwt_secret: String) -> Router {
    let jwt = Arc::new(crate::jwt::Hs256JwtValidator::new(jwt_secret.into_bytes()));
    let services = Arc::new(services::build_services());

    let protected = routes::router().layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn_with_state(
                middleware::AuthState { jwt },
                middleware::auth_middleware,
            ))
            .layer(Extension(services)),
    );

    Router::new()
        .route("/health", get(routes::system::health))
        .merge(protected)
}
