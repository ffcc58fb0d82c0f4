use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use avmux_protocol::endpoints;

use crate::config::ServerConfig;
use crate::handler;
use crate::state::AppState;

/// Build the axum router with all avmux endpoints.
pub fn build_router(state: AppState, config: &ServerConfig) -> Router {
    let router = Router::new()
        .route(endpoints::ROOT, get(handler::root_handler))
        .route(endpoints::HEALTH, get(handler::health_handler))
        .route(endpoints::MERGE, post(handler::merge_handler))
        .layer(DefaultBodyLimit::max(config.max_request_body))
        .layer(TraceLayer::new_for_http())
        .with_state(state);

    if config.cors {
        router.layer(CorsLayer::permissive())
    } else {
        router
    }
}
