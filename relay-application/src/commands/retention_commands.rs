use anyhow::anyhow;
use tokio::time::{timeout, Duration};
use tracing::{error, info};

use crate::{AppError, AppState};
use relay_domain::RetentionPolicy;

const DAY_MS: i64 = 86_400_000;

pub fn retention_cutoff(policy: &RetentionPolicy, now_ms: i64) -> i64 {
    now_ms.saturating_sub(i64::from(policy.retention_days).saturating_mul(DAY_MS))
}

/// Deletes every record of the policy's category older than its window.
/// Running it again with nothing new to delete is a no-op.
pub async fn sweep_retention(
    state: &AppState,
    policy: &RetentionPolicy,
    now_ms: i64,
) -> Result<u64, AppError> {
    let cutoff = retention_cutoff(policy, now_ms);
    // Purges can be slow on large tables, give them more room than a write.
    let limit = Duration::from_secs(state.config.collaborator_timeout_seconds.max(1) * 6);
    let result = match timeout(limit, state.store.purge_before(policy.category, cutoff)).await {
        Ok(result) => result,
        Err(_) => Err(anyhow!("purge timed out after {}s", limit.as_secs())),
    };
    match result {
        Ok(removed) => {
            state.metrics.record_purged(removed);
            info!(
                category = %policy.category,
                retention_days = policy.retention_days,
                removed,
                "retention sweep finished"
            );
            Ok(removed)
        }
        Err(err) => {
            error!(category = %policy.category, "retention sweep failed: {:#}", err);
            Err(AppError::Internal(err))
        }
    }
}
