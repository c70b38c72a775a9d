use axum::{
    Router,
    routing::{get, post, put},
};

pub mod auth;
pub mod stock;
pub mod system;

/// Endpoints reachable without a session.
pub fn public_router() -> Router {
    Router::new()
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
}

/// Endpoints behind the auth middleware.
pub fn protected_router() -> Router {
    Router::new()
        .route(
            "/api/auth/profile",
            get(auth::get_profile).put(auth::update_profile),
        )
        .route("/api/auth/list", get(auth::list_admins))
        .route("/api/stock/get", get(stock::list_stock))
        .route("/api/stock/check", get(stock::check_low_stock))
        .route("/api/stock/add", post(stock::add_stock))
        .route("/api/stock/notify-now", post(stock::notify_now))
        .route("/api/stock/:id", put(stock::update_stock))
}
