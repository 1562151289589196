//! Bearer-token middleware: every protected route runs behind this.
//!
//! A verified token yields the request's `BranchContext` and
//! `PrincipalContext`; handlers read those from extensions and never touch
//! the token themselves.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use crate::context::{BranchContext, PrincipalContext};
use crate::jwt::JwtValidator;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
}

pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Result<Response, StatusCode> {
    let token = bearer_token(req.headers()).ok_or(StatusCode::UNAUTHORIZED)?;

    let claims = state.jwt.validate(token, Utc::now()).map_err(|e| {
        tracing::debug!("rejected bearer token: {e}");
        StatusCode::UNAUTHORIZED
    })?;

    let extensions = req.extensions_mut();
    extensions.insert(BranchContext::new(claims.branch_id));
    extensions.insert(PrincipalContext::new(claims.sub, claims.roles));

    Ok(next.run(req).await)
}

fn bearer_token(headers: &HeaderMap) -> Option<&str> {
    let token = headers
        .get(axum::http::header::AUTHORIZATION)?
        .to_str()
        .ok()?
        .strip_prefix("Bearer ")?
        .trim();

    if token.is_empty() { None } else { Some(token) }
}
