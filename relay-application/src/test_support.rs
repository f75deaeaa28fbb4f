// In-test fakes for the store and platform ports

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use anyhow::anyhow;
use async_trait::async_trait;
use relay_domain::ports::{MessagingPlatform, ProfileLookup, RelayStore};
use relay_domain::{
    Category, FeedRecord, MessageRef, OutgoingMessage, Player, PlayerProfile, RecordBody, RetentionPolicy,
    RuntimeConfig, ServerSnapshot, WriteBatch,
};

#[derive(Default)]
struct SpyTables {
    records: Vec<FeedRecord>,
    players: HashMap<String, Player>,
    snapshot: Option<ServerSnapshot>,
    next_id: u64,
}

/// Store fake that counts mutations and can be told to fail.
#[derive(Default)]
pub struct SpyStore {
    tables: Mutex<SpyTables>,
    pub mutations: AtomicUsize,
    pub fail_writes: AtomicBool,
    pub fail_reads: AtomicBool,
}

impl SpyStore {
    pub fn mutation_count(&self) -> usize {
        self.mutations.load(Ordering::SeqCst)
    }

    pub fn set_snapshot(&self, snapshot: Option<ServerSnapshot>) {
        self.tables.lock().expect("spy lock").snapshot = snapshot;
    }

    pub fn insert_record(&self, created_at: i64, body: RecordBody) -> FeedRecord {
        let mut tables = self.tables.lock().expect("spy lock");
        tables.next_id += 1;
        let record = FeedRecord {
            id: format!("{:08}", tables.next_id),
            created_at,
            body,
        };
        tables.records.push(record.clone());
        record
    }

    pub fn record_count(&self, category: Category) -> usize {
        let tables = self.tables.lock().expect("spy lock");
        tables.records.iter().filter(|r| r.category() == category).count()
    }

    pub fn player(&self, steam_id: &str) -> Option<Player> {
        self.tables.lock().expect("spy lock").players.get(steam_id).cloned()
    }
}

fn key(record: &FeedRecord) -> (i64, String) {
    (record.created_at, record.id.clone())
}

#[async_trait]
impl RelayStore for SpyStore {
    async fn ensure_schema(&self) -> anyhow::Result<()> {
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch, now_ms: i64) -> anyhow::Result<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        let mut tables = self.tables.lock().expect("spy lock");
        for effect in &batch.player_effects {
            let existing = tables.players.remove(&effect.player.steam_id);
            let player = Player::sighted(existing, effect, now_ms);
            tables.players.insert(player.steam_id.clone(), player);
        }
        if let Some(update) = batch.snapshot {
            tables.snapshot = Some(ServerSnapshot {
                state: update,
                updated_at: now_ms,
            });
        }
        if let Some(body) = batch.record {
            tables.next_id += 1;
            let id = format!("{:08}", tables.next_id);
            tables.records.push(FeedRecord {
                id,
                created_at: now_ms,
                body,
            });
        }
        self.mutations.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }

    async fn latest_record(&self, category: Category) -> anyhow::Result<Option<FeedRecord>> {
        let tables = self.tables.lock().expect("spy lock");
        Ok(tables
            .records
            .iter()
            .filter(|r| r.category() == category)
            .max_by_key(|r| key(r))
            .cloned())
    }

    async fn records_after(
        &self,
        category: Category,
        created_at: i64,
        id: &str,
        limit: usize,
    ) -> anyhow::Result<Vec<FeedRecord>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        let tables = self.tables.lock().expect("spy lock");
        let mut out: Vec<FeedRecord> = tables
            .records
            .iter()
            .filter(|r| r.category() == category)
            .filter(|r| (r.created_at, r.id.as_str()) > (created_at, id))
            .cloned()
            .collect();
        out.sort_by_key(key);
        out.truncate(limit);
        Ok(out)
    }

    async fn server_snapshot(&self) -> anyhow::Result<Option<ServerSnapshot>> {
        if self.fail_reads.load(Ordering::SeqCst) {
            return Err(anyhow!("store unavailable"));
        }
        Ok(self.tables.lock().expect("spy lock").snapshot.clone())
    }

    async fn purge_before(&self, category: Category, cutoff_ms: i64) -> anyhow::Result<u64> {
        let mut tables = self.tables.lock().expect("spy lock");
        let before = tables.records.len();
        tables
            .records
            .retain(|r| r.category() != category || r.created_at >= cutoff_ms);
        let removed = (before - tables.records.len()) as u64;
        if removed > 0 {
            self.mutations.fetch_add(1, Ordering::SeqCst);
        }
        Ok(removed)
    }

    async fn ping(&self) -> anyhow::Result<()> {
        Ok(())
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum PlatformCall {
    Send(String, OutgoingMessage),
    Edit(MessageRef, OutgoingMessage),
    Fetch(String, String),
}

/// Platform fake that records every call. Messages listed in `existing`
/// resolve on fetch, everything else is "not found".
#[derive(Default)]
pub struct RecordingPlatform {
    pub calls: Mutex<Vec<PlatformCall>>,
    pub existing: Mutex<Vec<String>>,
    pub fail_fetch: AtomicBool,
    pub fail_edit: AtomicBool,
    pub fetch_delay: Mutex<Option<Duration>>,
    next_id: AtomicUsize,
}

impl RecordingPlatform {
    pub fn with_existing(ids: &[&str]) -> Self {
        let platform = Self::default();
        *platform.existing.lock().expect("platform lock") = ids.iter().map(|id| id.to_string()).collect();
        platform
    }

    pub fn calls(&self) -> Vec<PlatformCall> {
        self.calls.lock().expect("platform lock").clone()
    }

    pub fn sends(&self) -> Vec<(String, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Send(channel, message) => Some((channel, message)),
                _ => None,
            })
            .collect()
    }

    pub fn edits(&self) -> Vec<(MessageRef, OutgoingMessage)> {
        self.calls()
            .into_iter()
            .filter_map(|call| match call {
                PlatformCall::Edit(target, message) => Some((target, message)),
                _ => None,
            })
            .collect()
    }
}

#[async_trait]
impl MessagingPlatform for RecordingPlatform {
    async fn send_message(&self, channel_id: &str, message: &OutgoingMessage) -> anyhow::Result<MessageRef> {
        let id = format!("new-{}", self.next_id.fetch_add(1, Ordering::SeqCst) + 1);
        self.calls
            .lock()
            .expect("platform lock")
            .push(PlatformCall::Send(channel_id.to_string(), message.clone()));
        self.existing.lock().expect("platform lock").push(id.clone());
        Ok(MessageRef {
            channel_id: channel_id.to_string(),
            message_id: id,
        })
    }

    async fn edit_message(&self, target: &MessageRef, message: &OutgoingMessage) -> anyhow::Result<()> {
        self.calls
            .lock()
            .expect("platform lock")
            .push(PlatformCall::Edit(target.clone(), message.clone()));
        if self.fail_edit.load(Ordering::SeqCst) {
            return Err(anyhow!("edit rejected"));
        }
        Ok(())
    }

    async fn fetch_message(&self, channel_id: &str, message_id: &str) -> anyhow::Result<Option<MessageRef>> {
        let delay = *self.fetch_delay.lock().expect("platform lock");
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        self.calls
            .lock()
            .expect("platform lock")
            .push(PlatformCall::Fetch(channel_id.to_string(), message_id.to_string()));
        if self.fail_fetch.load(Ordering::SeqCst) {
            return Err(anyhow!("gateway timeout"));
        }
        let found = self
            .existing
            .lock()
            .expect("platform lock")
            .iter()
            .any(|id| id == message_id);
        Ok(found.then(|| MessageRef {
            channel_id: channel_id.to_string(),
            message_id: message_id.to_string(),
        }))
    }
}

#[derive(Default)]
pub struct StaticProfiles {
    pub profiles: HashMap<String, PlayerProfile>,
}

#[async_trait]
impl ProfileLookup for StaticProfiles {
    async fn player_profile(&self, steam_id: &str) -> Option<PlayerProfile> {
        self.profiles.get(steam_id).cloned()
    }
}

pub fn runtime_config() -> RuntimeConfig {
    RuntimeConfig {
        bind_addr: "127.0.0.1:0".to_string(),
        api_key: Some("secret".to_string()),
        max_body_bytes: 1_048_576,
        request_timeout_seconds: 10,
        collaborator_timeout_seconds: 5,
        retention: RetentionPolicy::defaults(),
    }
}
