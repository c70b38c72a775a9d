use std::sync::Arc;

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    middleware::Next,
    response::Response,
};
use chrono::Utc;

use stockwatch_auth::{Actor, JwtValidator};
use stockwatch_infra::AdminRepository;

use crate::app::errors::json_error;
use crate::context::AdminContext;

#[derive(Clone)]
pub struct AuthState {
    pub jwt: Arc<dyn JwtValidator>,
    pub admins: Arc<dyn AdminRepository>,
}

/// Require a valid bearer token belonging to an active admin.
pub async fn auth_middleware(
    State(state): State<AuthState>,
    mut req: axum::http::Request<axum::body::Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer(req.headers()) else {
        return unauthorized("Not authorized, no token");
    };

    let claims = match state.jwt.validate(token, Utc::now()) {
        Ok(claims) => claims,
        Err(e) => {
            tracing::debug!(error = %e, "rejected bearer token");
            return unauthorized("Not authorized, token failed");
        }
    };

    let account = match state.admins.find_by_id(claims.sub).await {
        Ok(Some(account)) if account.status.is_active() => account,
        Ok(_) => return unauthorized("Not authorized, token failed"),
        Err(e) => {
            tracing::error!(error = %e, "failed to load admin for request");
            return json_error(StatusCode::INTERNAL_SERVER_ERROR, "Internal server error");
        }
    };

    req.extensions_mut()
        .insert(AdminContext::new(Actor::from(&account)));

    next.run(req).await
}

fn unauthorized(message: &str) -> Response {
    json_error(StatusCode::UNAUTHORIZED, message)
}

fn extract_bearer(headers: &HeaderMap) -> Option<&str> {
    let header = headers.get(axum::http::header::AUTHORIZATION)?;
    let header = header.to_str().ok()?;
    let token = header.strip_prefix("Bearer ")?.trim();
    if token.is_empty() {
        return None;
    }
    Some(token)
}
