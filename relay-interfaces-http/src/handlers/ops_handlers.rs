use axum::extract::State;
use axum::http::{header, HeaderMap, HeaderValue, StatusCode};
use axum::response::IntoResponse;
use tracing::error;

use relay_application::queries::health_queries;
use relay_application::AppState;

use crate::error::HttpError;
use crate::middleware::authorize;

pub async fn not_found() -> HttpError {
    HttpError::NotFound
}

pub async fn health_live() -> StatusCode {
    StatusCode::OK
}

pub async fn health_ready(State(state): State<AppState>) -> StatusCode {
    match health_queries::check_store_ready(&state).await {
        Ok(()) => StatusCode::OK,
        Err(err) => {
            error!("ready check failed: {}", err);
            StatusCode::SERVICE_UNAVAILABLE
        }
    }
}

pub async fn metrics_prometheus(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<impl IntoResponse, HttpError> {
    if !authorize(&state, &headers) {
        return Err(HttpError::Unauthorized);
    }
    let queue_length = state.command_queue.len().await;
    let payload = state.metrics.render_prometheus(queue_length);
    let mut headers = HeaderMap::new();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static("text/plain; version=0.0.4; charset=utf-8"),
    );
    Ok((headers, payload))
}
