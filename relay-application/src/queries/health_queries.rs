use anyhow::anyhow;
use tokio::time::{timeout, Duration};

use crate::{AppError, AppState};

/// Readiness: the store answers a ping within the collaborator timeout.
pub async fn check_store_ready(state: &AppState) -> Result<(), AppError> {
    let limit = Duration::from_secs(state.config.collaborator_timeout_seconds.max(1));
    match timeout(limit, state.store.ping()).await {
        Ok(result) => result.map_err(AppError::Internal),
        Err(_) => Err(AppError::Internal(anyhow!("store ping timed out"))),
    }
}
