use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::Json;
use serde_json::{json, Value};
use tracing::warn;

use relay_application::commands::queue_commands;
use relay_application::AppState;
use relay_domain::GameCommand;

use crate::error::HttpError;
use crate::middleware::{authorize, parse_json};

pub async fn queue_command(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: axum::body::Bytes,
) -> Result<(StatusCode, Json<Value>), HttpError> {
    if !authorize(&state, &headers) {
        return Err(HttpError::Unauthorized);
    }

    let command: GameCommand = parse_json(&headers, &body).map_err(|err| {
        warn!("failed to parse command body: {}", err);
        HttpError::BadRequest(err.to_string())
    })?;
    let queue_length = queue_commands::queue_command(&state, command).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "success": true, "queueLength": queue_length })),
    ))
}

/// Drains the queue. An empty queue is an empty array, never an error.
pub async fn get_commands(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<GameCommand>>, HttpError> {
    if !authorize(&state, &headers) {
        return Err(HttpError::Unauthorized);
    }
    Ok(Json(queue_commands::drain_commands(&state).await))
}
