use axum::{
    Router,
    http::Method,
    middleware,
    routing::get,
};
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::handler::{AppState, healthcheck};

pub mod api;
pub mod auth;
pub mod bookmarks;
pub mod config;
pub mod db;
pub mod error;
pub mod handler;
pub mod model;

/// Assembles the service router. The bearer guard wraps the bookmark routes only when the
/// state carries a token; the health check stays open.
pub fn app(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST, Method::PATCH, Method::DELETE])
        .allow_headers(Any);

    let mut api = bookmarks::routes();
    if state.api_token.is_some() {
        api = api.route_layer(middleware::from_fn_with_state(state.clone(), auth::require_bearer_token));
    }

    Router::new()
        .route("/", get(healthcheck))
        .nest("/api/bookmarks", api)
        .layer(cors)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
