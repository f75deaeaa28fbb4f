use chrono::{DateTime, Duration as ChronoDuration, NaiveDate, Utc};
use tracing::{error, info};

use relay_application::commands::retention_commands::sweep_retention;
use relay_application::AppState;
use relay_domain::{current_millis, RetentionPolicy};

/// Spawns one daily sweep loop per configured category.
pub fn schedule_retention(state: AppState) -> Vec<tokio::task::JoinHandle<()>> {
    state
        .config
        .retention
        .clone()
        .into_iter()
        .map(|policy| tokio::spawn(run_sweeps(state.clone(), policy)))
        .collect()
}

async fn run_sweeps(state: AppState, policy: RetentionPolicy) {
    loop {
        let now = Utc::now();
        let next = next_sweep_time(&policy, now);
        info!(category = %policy.category, next = %next, "next retention sweep scheduled");
        let sleep_ms = next.signed_duration_since(now).num_milliseconds().max(0) as u64;
        tokio::time::sleep(std::time::Duration::from_millis(sleep_ms)).await;

        if let Err(err) = sweep_retention(&state, &policy, current_millis()).await {
            error!(category = %policy.category, "retention sweep failed: {}", err);
        }
    }
}

/// The next occurrence of the policy's UTC wall-clock time strictly after `now`.
pub fn next_sweep_time(policy: &RetentionPolicy, now: DateTime<Utc>) -> DateTime<Utc> {
    let at = |day: NaiveDate| {
        day.and_hms_opt(policy.hour_utc, policy.minute_utc, 0)
            .map(|target| target.and_utc())
    };
    let today = now.date_naive();
    match at(today) {
        Some(target) if target > now => target,
        _ => today
            .succ_opt()
            .and_then(at)
            .unwrap_or_else(|| now + ChronoDuration::days(1)),
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;
    use relay_domain::Category;

    fn at(hour: u32, minute: u32, second: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 3, 10, hour, minute, second)
            .single()
            .expect("valid time")
    }

    #[test]
    fn later_today_runs_today() {
        let policy = RetentionPolicy::new(Category::Kills, 30, 0, 1);
        assert_eq!(next_sweep_time(&policy, at(0, 0, 30)), at(0, 1, 0));
    }

    #[test]
    fn passed_or_current_slot_rolls_to_tomorrow() {
        let policy = RetentionPolicy::new(Category::ChatLogs, 1, 0, 0);
        let tomorrow = Utc
            .with_ymd_and_hms(2024, 3, 11, 0, 0, 0)
            .single()
            .expect("valid time");
        assert_eq!(next_sweep_time(&policy, at(0, 0, 0)), tomorrow);
        assert_eq!(next_sweep_time(&policy, at(13, 45, 0)), tomorrow);
    }
}
