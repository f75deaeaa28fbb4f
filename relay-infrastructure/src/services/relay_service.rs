use std::sync::Arc;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, info, warn};

use relay_application::feeds::{FeedListener, FeedPublisher};
use relay_application::panels::{PanelReconciler, TickOutcome};
use relay_application::RelayState;
use relay_domain::{current_millis, Category};

/// Starts the panel loop and one feed watcher per configured category.
/// Dropping or aborting the handles stops the relay.
pub fn start_relay(state: RelayState) -> Vec<JoinHandle<()>> {
    let config = &state.config;
    let call_timeout = Duration::from_secs(config.collaborator_timeout_seconds.max(1));

    let reconciler = Arc::new(PanelReconciler::new(
        state.platform.clone(),
        state.store.clone(),
        config.links.clone(),
        call_timeout,
        vec![config.status_panel.clone(), config.bounty_panel.clone()],
    ));
    let publisher = Arc::new(FeedPublisher::new(
        state.platform.clone(),
        state.profiles.clone(),
        &config.feeds,
        call_timeout,
    ));

    let mut handles = vec![tokio::spawn(schedule_panels(
        reconciler,
        Duration::from_secs(config.panel_interval_seconds.max(1)),
    ))];

    let poll_interval = Duration::from_secs(config.feed_poll_interval_seconds.max(1));
    let mut categories: Vec<Category> = config.feeds.iter().map(|feed| feed.category).collect();
    categories.sort();
    categories.dedup();
    for category in categories {
        let listener = FeedListener::new(category, state.store.clone(), publisher.clone());
        handles.push(tokio::spawn(watch_feed(listener, poll_interval)));
    }
    info!(tasks = handles.len(), "relay started");
    handles
}

/// Ticks immediately, then every `period`. Each tick runs detached so a slow
/// platform never delays the schedule; the reconciler skips a panel whose
/// previous update is still in flight.
pub async fn schedule_panels(reconciler: Arc<PanelReconciler>, period: Duration) {
    let mut interval = tokio::time::interval(period);
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    loop {
        interval.tick().await;
        let reconciler = reconciler.clone();
        tokio::spawn(async move {
            for (kind, outcome) in reconciler.tick(current_millis()).await {
                match outcome {
                    TickOutcome::Updated { created: true, .. } => info!(panel = %kind, "panel created"),
                    TickOutcome::Failed => warn!(panel = %kind, "panel update failed, retrying next tick"),
                    other => debug!(panel = %kind, outcome = ?other, "panel tick"),
                }
            }
        });
    }
}

pub async fn watch_feed(mut listener: FeedListener, period: Duration) {
    loop {
        if let Err(err) = listener.poll_once().await {
            warn!(category = %listener.category(), "feed poll failed: {:#}", err);
        }
        tokio::time::sleep(period).await;
    }
}
