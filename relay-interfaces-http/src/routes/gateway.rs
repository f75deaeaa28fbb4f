use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tower_http::cors::CorsLayer;
use tower_http::limit::RequestBodyLimitLayer;
use tower_http::timeout::TimeoutLayer;
use tower_http::trace::TraceLayer;

use relay_application::AppState;

use crate::handlers::{command_handlers, ingest_handlers, ops_handlers};

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/game-event", post(ingest_handlers::ingest_game_event))
        .route("/queue-command", post(command_handlers::queue_command))
        .route("/get-commands", get(command_handlers::get_commands))
        .route("/health/live", get(ops_handlers::health_live))
        .route("/health/ready", get(ops_handlers::health_ready))
        .route("/metrics", get(ops_handlers::metrics_prometheus))
        .fallback(ops_handlers::not_found)
        .with_state(state)
}

/// The router with body limit, request timeout, CORS and tracing applied.
pub fn build_router_with_layers(state: AppState) -> Router {
    build_router(state.clone())
        .layer(CorsLayer::permissive())
        .layer(RequestBodyLimitLayer::new(
            usize::try_from(state.config.max_body_bytes).unwrap_or(usize::MAX),
        ))
        .layer(TimeoutLayer::new(Duration::from_secs(
            state.config.request_timeout_seconds.max(1),
        )))
        .layer(TraceLayer::new_for_http())
}
