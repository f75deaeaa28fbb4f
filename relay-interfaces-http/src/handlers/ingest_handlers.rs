use axum::extract::State;
use axum::http::HeaderMap;
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use relay_application::commands::ingest_commands;
use relay_application::AppState;
use relay_domain::EventEnvelope;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json};

pub async fn ingest_game_event(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<Json<Value>, HttpError> {
    if !authorize(&state, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let envelope: EventEnvelope = parse_json(&headers, &body).map_err(|err| {
        state.metrics.record_ingest_rejected();
        warn!("failed to parse game event body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    ingest_commands::ingest_game_event(&state, envelope).await?;
    Ok(Json(json!({ "success": true })))
}
