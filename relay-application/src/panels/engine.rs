// Panel reconciliation engine
//
// Each tick resolves the panel's message (fetch by id, create only when the
// platform says it does not exist) and performs exactly one edit with the
// rendered snapshot. Ticks for the same panel never overlap.

use std::sync::Arc;

use anyhow::{anyhow, Context};
use futures_util::future::join_all;
use tokio::sync::Mutex;
use tokio::time::{timeout, Duration};
use tracing::{debug, error, info, warn};

use relay_domain::ports::{MessagingPlatform, RelayStore};
use relay_domain::{MessageRef, OutgoingMessage, PanelBinding, PanelKind, PanelLinks, ServerSnapshot};

use crate::panels::render::{render_panel, Presentation};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PanelPhase {
    /// No message reference known.
    Uninitialized,
    /// Fetching the configured reference.
    Resolving,
    /// Reference confirmed to exist on the platform.
    Live,
    /// The configured reference no longer resolves.
    StaleReference,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TickOutcome {
    Updated { message: MessageRef, created: bool },
    Skipped,
    Failed,
}

struct PanelSlot {
    binding: PanelBinding,
    phase: PanelPhase,
}

struct PanelEntry {
    kind: PanelKind,
    slot: Mutex<PanelSlot>,
}

pub struct PanelReconciler {
    platform: Arc<dyn MessagingPlatform>,
    store: Arc<dyn RelayStore>,
    links: PanelLinks,
    call_timeout: Duration,
    panels: Vec<PanelEntry>,
    last_snapshot: Mutex<Option<ServerSnapshot>>,
}

impl PanelReconciler {
    pub fn new(
        platform: Arc<dyn MessagingPlatform>,
        store: Arc<dyn RelayStore>,
        links: PanelLinks,
        call_timeout: Duration,
        bindings: Vec<PanelBinding>,
    ) -> Self {
        let panels = bindings
            .into_iter()
            .map(|binding| {
                let phase = if binding.message_id.is_some() {
                    PanelPhase::Resolving
                } else {
                    PanelPhase::Uninitialized
                };
                PanelEntry {
                    kind: binding.kind,
                    slot: Mutex::new(PanelSlot { binding, phase }),
                }
            })
            .collect();
        Self {
            platform,
            store,
            links,
            call_timeout,
            panels,
            last_snapshot: Mutex::new(None),
        }
    }

    pub async fn phase(&self, kind: PanelKind) -> Option<PanelPhase> {
        let entry = self.panels.iter().find(|entry| entry.kind == kind)?;
        let slot = entry.slot.lock().await;
        Some(slot.phase)
    }

    pub async fn message_id(&self, kind: PanelKind) -> Option<String> {
        let entry = self.panels.iter().find(|entry| entry.kind == kind)?;
        let slot = entry.slot.lock().await;
        slot.binding.message_id.clone()
    }

    /// One reconciliation pass over every panel. Panels run concurrently and
    /// a failure in one does not affect the others.
    pub async fn tick(&self, now_ms: i64) -> Vec<(PanelKind, TickOutcome)> {
        let snapshot = self.load_snapshot().await;
        let passes = self
            .panels
            .iter()
            .map(|panel| self.reconcile(panel, snapshot.as_ref(), now_ms));
        join_all(passes).await
    }

    /// Reads the snapshot, falling back to the last good read so a single
    /// failed read does not flip the panels before the staleness threshold.
    async fn load_snapshot(&self) -> Option<ServerSnapshot> {
        let read = timeout(self.call_timeout, self.store.server_snapshot()).await;
        let mut cache = self.last_snapshot.lock().await;
        match read {
            Ok(Ok(snapshot)) => {
                *cache = snapshot;
            }
            Ok(Err(err)) => {
                error!("failed to read server snapshot, using last known: {:#}", err);
            }
            Err(_) => {
                error!("server snapshot read timed out, using last known");
            }
        }
        cache.clone()
    }

    async fn reconcile(
        &self,
        panel: &PanelEntry,
        snapshot: Option<&ServerSnapshot>,
        now_ms: i64,
    ) -> (PanelKind, TickOutcome) {
        let kind = panel.kind;
        let mut slot = match panel.slot.try_lock() {
            Ok(slot) => slot,
            Err(_) => {
                debug!(panel = %kind, "previous panel update still running, skipping tick");
                return (kind, TickOutcome::Skipped);
            }
        };

        let (target, created) = match self.resolve(&mut slot).await {
            Ok(resolved) => resolved,
            Err(err) => {
                error!(panel = %kind, "failed to resolve panel message: {:#}", err);
                return (kind, TickOutcome::Failed);
            }
        };

        let message = render_panel(kind, snapshot, now_ms, &self.links);
        match self.bounded(self.platform.edit_message(&target, &message)).await {
            Ok(()) => {
                let presentation = Presentation::classify(snapshot, now_ms);
                info!(panel = %kind, state = ?presentation, "panel updated");
                (
                    kind,
                    TickOutcome::Updated {
                        message: target,
                        created,
                    },
                )
            }
            Err(err) => {
                error!(panel = %kind, "failed to edit panel message: {:#}", err);
                (kind, TickOutcome::Failed)
            }
        }
    }

    /// Fetch the known reference; create a new message only when the
    /// platform reports it missing or none is known. Any other failure
    /// fails the tick so a flaky platform cannot produce duplicates.
    async fn resolve(&self, slot: &mut PanelSlot) -> anyhow::Result<(MessageRef, bool)> {
        let kind = slot.binding.kind;
        let channel_id = slot.binding.channel_id.clone();

        if let Some(message_id) = slot.binding.message_id.clone() {
            slot.phase = PanelPhase::Resolving;
            let fetched = self
                .bounded(self.platform.fetch_message(&channel_id, &message_id))
                .await
                .with_context(|| format!("fetching {kind} panel message {message_id}"));
            match fetched {
                Ok(Some(found)) => {
                    slot.phase = PanelPhase::Live;
                    return Ok((found, false));
                }
                Ok(None) => {
                    warn!(
                        panel = %kind,
                        "could not find message with id {}, it may have been deleted; a new one will be created",
                        message_id
                    );
                    slot.phase = PanelPhase::StaleReference;
                }
                Err(err) => {
                    slot.phase = PanelPhase::StaleReference;
                    return Err(err);
                }
            }
        }

        info!(panel = %kind, "sending a new panel message");
        let placeholder = OutgoingMessage::text(kind.placeholder());
        let created = self
            .bounded(self.platform.send_message(&channel_id, &placeholder))
            .await
            .with_context(|| format!("creating {kind} panel message"))?;

        error!(
            panel = %kind,
            "CRITICAL ACTION REQUIRED: a new {} panel message has been created; set {}={} in your configuration",
            kind,
            kind.message_id_env(),
            created.message_id
        );
        slot.binding.message_id = Some(created.message_id.clone());
        slot.phase = PanelPhase::Live;
        Ok((created, true))
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = anyhow::Result<T>>,
    ) -> anyhow::Result<T> {
        match timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(anyhow!("timed out after {:?}", self.call_timeout)),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::Ordering;

    use super::*;
    use crate::test_support::{PlatformCall, RecordingPlatform, SpyStore};
    use relay_domain::ServerUpdate;

    const NOW: i64 = 1_700_000_000_000;

    fn binding(kind: PanelKind, message_id: Option<&str>) -> PanelBinding {
        PanelBinding {
            kind,
            channel_id: format!("{kind}-channel"),
            message_id: message_id.map(str::to_string),
        }
    }

    fn reconciler(
        platform: Arc<RecordingPlatform>,
        store: Arc<SpyStore>,
        bindings: Vec<PanelBinding>,
    ) -> PanelReconciler {
        PanelReconciler::new(
            platform,
            store,
            PanelLinks::default(),
            Duration::from_millis(200),
            bindings,
        )
    }

    #[tokio::test]
    async fn existing_message_is_edited_in_place() {
        let platform = Arc::new(RecordingPlatform::with_existing(&["m-1"]));
        let store = Arc::new(SpyStore::default());
        let engine = reconciler(platform.clone(), store, vec![binding(PanelKind::Status, Some("m-1"))]);

        let outcomes = engine.tick(NOW).await;
        assert_eq!(outcomes.len(), 1);
        assert!(matches!(
            &outcomes[0].1,
            TickOutcome::Updated { created: false, message } if message.message_id == "m-1"
        ));
        assert!(platform.sends().is_empty());
        assert_eq!(platform.edits().len(), 1);
        assert_eq!(engine.phase(PanelKind::Status).await, Some(PanelPhase::Live));
    }

    #[tokio::test]
    async fn missing_reference_creates_once_then_reuses() {
        let platform = Arc::new(RecordingPlatform::default());
        let store = Arc::new(SpyStore::default());
        let engine = reconciler(platform.clone(), store, vec![binding(PanelKind::Bounty, None)]);
        assert_eq!(engine.phase(PanelKind::Bounty).await, Some(PanelPhase::Uninitialized));

        let first = engine.tick(NOW).await;
        assert!(matches!(&first[0].1, TickOutcome::Updated { created: true, .. }));
        let sends = platform.sends();
        assert_eq!(sends.len(), 1);
        assert_eq!(sends[0].1.content, "Initializing bounty status panel...");

        let second = engine.tick(NOW + 60_000).await;
        assert!(matches!(&second[0].1, TickOutcome::Updated { created: false, .. }));
        assert_eq!(platform.sends().len(), 1);
        assert_eq!(platform.edits().len(), 2);
        assert_eq!(engine.message_id(PanelKind::Bounty).await.as_deref(), Some("new-1"));
    }

    #[tokio::test]
    async fn deleted_message_is_replaced() {
        let platform = Arc::new(RecordingPlatform::default());
        let store = Arc::new(SpyStore::default());
        let engine = reconciler(platform.clone(), store, vec![binding(PanelKind::Status, Some("gone"))]);

        let outcomes = engine.tick(NOW).await;
        assert!(matches!(&outcomes[0].1, TickOutcome::Updated { created: true, .. }));
        assert_eq!(platform.sends().len(), 1);
        assert_eq!(engine.message_id(PanelKind::Status).await.as_deref(), Some("new-1"));
    }

    #[tokio::test]
    async fn transport_failure_does_not_create() {
        let platform = Arc::new(RecordingPlatform::with_existing(&["m-1"]));
        platform.fail_fetch.store(true, Ordering::SeqCst);
        let store = Arc::new(SpyStore::default());
        let engine = reconciler(platform.clone(), store, vec![binding(PanelKind::Status, Some("m-1"))]);

        let outcomes = engine.tick(NOW).await;
        assert_eq!(outcomes[0].1, TickOutcome::Failed);
        assert!(platform.sends().is_empty());
        assert!(platform.edits().is_empty());
        assert_eq!(engine.phase(PanelKind::Status).await, Some(PanelPhase::StaleReference));
    }

    #[tokio::test]
    async fn failing_panel_does_not_block_the_other() {
        let platform = Arc::new(RecordingPlatform::with_existing(&["s-1", "b-1"]));
        platform.fail_edit.store(true, Ordering::SeqCst);
        let store = Arc::new(SpyStore::default());
        let engine = reconciler(
            platform.clone(),
            store,
            vec![
                binding(PanelKind::Status, Some("s-1")),
                binding(PanelKind::Bounty, Some("b-1")),
            ],
        );

        let outcomes = engine.tick(NOW).await;
        assert_eq!(outcomes.len(), 2);
        assert!(outcomes.iter().all(|(_, outcome)| *outcome == TickOutcome::Failed));
        assert_eq!(platform.edits().len(), 2);

        platform.fail_edit.store(false, Ordering::SeqCst);
        let outcomes = engine.tick(NOW).await;
        assert!(outcomes
            .iter()
            .all(|(_, outcome)| matches!(outcome, TickOutcome::Updated { created: false, .. })));
    }

    #[tokio::test]
    async fn overlapping_ticks_never_create_twice() {
        let platform = Arc::new(RecordingPlatform::default());
        *platform.fetch_delay.lock().expect("platform lock") = Some(Duration::from_millis(50));
        let store = Arc::new(SpyStore::default());
        let engine = Arc::new(reconciler(
            platform.clone(),
            store,
            vec![binding(PanelKind::Status, Some("gone"))],
        ));

        let (first, second) = tokio::join!(engine.tick(NOW), engine.tick(NOW));
        let outcomes: Vec<TickOutcome> = first
            .into_iter()
            .chain(second)
            .map(|(_, outcome)| outcome)
            .collect();
        assert!(outcomes.contains(&TickOutcome::Skipped));
        assert_eq!(platform.sends().len(), 1);
    }

    #[tokio::test]
    async fn failed_snapshot_read_reuses_last_known() {
        let platform = Arc::new(RecordingPlatform::with_existing(&["s-1"]));
        let store = Arc::new(SpyStore::default());
        store.set_snapshot(Some(ServerSnapshot {
            state: ServerUpdate::default(),
            updated_at: NOW - 1_000,
        }));
        let engine = reconciler(platform.clone(), store.clone(), vec![binding(PanelKind::Status, Some("s-1"))]);

        engine.tick(NOW).await;
        store.fail_reads.store(true, Ordering::SeqCst);
        engine.tick(NOW + 10_000).await;
        engine.tick(NOW + 120_000).await;

        let edits = platform.edits();
        assert_eq!(edits.len(), 3);
        let status = |idx: usize| {
            edits[idx].1.embeds[0]
                .field_value("🖥️ Server Status")
                .map(str::to_string)
        };
        assert_eq!(status(0).as_deref(), Some("🟢 Online"));
        // A single failed read before the threshold keeps the panel online.
        assert_eq!(status(1).as_deref(), Some("🟢 Online"));
        assert_eq!(status(2).as_deref(), Some("🔴 Offline"));
        assert!(platform
            .calls()
            .iter()
            .all(|call| !matches!(call, PlatformCall::Send(..))));
    }
}
