use anyhow::anyhow;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, warn};

use crate::{AppError, AppState};
use relay_domain::{current_millis, EventEnvelope, EventKind, GameEvent};

/// Validates one game event and commits everything it implies.
///
/// Parsing happens before any store call, so a rejected event never mutates
/// the store. Store failures are not retried here.
pub async fn ingest_game_event(
    state: &AppState,
    envelope: EventEnvelope,
) -> Result<EventKind, AppError> {
    let event = GameEvent::from_envelope(envelope).map_err(|err| {
        state.metrics.record_ingest_rejected();
        warn!("rejected game event: {}", err);
        AppError::BadRequest(err.to_string())
    })?;
    let kind = event.kind();
    let batch = event.into_write_batch();

    let limit = Duration::from_secs(state.config.collaborator_timeout_seconds.max(1));
    let result = match timeout(limit, state.store.commit(batch, current_millis())).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("store commit timed out after {}s", limit.as_secs())),
    };
    if let Err(err) = result {
        state.metrics.record_ingest_error();
        error!(event = %kind, "failed to write game event: {:#}", err);
        return Err(AppError::Internal(err));
    }

    state.metrics.record_ingest();
    debug!(event = %kind, "game event stored");
    Ok(kind)
}
