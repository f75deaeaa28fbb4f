use std::collections::HashMap;

use anyhow::Result;
use async_trait::async_trait;
use tokio::sync::Mutex;
use uuid::Uuid;

use relay_domain::{Category, FeedRecord, Player, RelayStore, ServerSnapshot, WriteBatch};

#[derive(Default)]
struct Tables {
    records: HashMap<Category, Vec<FeedRecord>>,
    players: HashMap<String, Player>,
    snapshot: Option<ServerSnapshot>,
}

/// Process-local store for single-process runs and HTTP tests. Every commit
/// happens under one lock, so batches are all-or-nothing.
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    #[cfg(test)]
    async fn player(&self, steam_id: &str) -> Option<Player> {
        self.tables.lock().await.players.get(steam_id).cloned()
    }
}

fn position(record: &FeedRecord) -> (i64, &str) {
    (record.created_at, record.id.as_str())
}

#[async_trait]
impl RelayStore for MemoryStore {
    async fn ensure_schema(&self) -> Result<()> {
        Ok(())
    }

    async fn commit(&self, batch: WriteBatch, now_ms: i64) -> Result<()> {
        let mut tables = self.tables.lock().await;
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
            let records = tables.records.entry(body.category()).or_default();
            let previous = records.last().map(|record| record.created_at);
            records.push(FeedRecord {
                id: Uuid::now_v7().to_string(),
                created_at: FeedRecord::next_created_at(previous, now_ms),
                body,
            });
        }
        Ok(())
    }

    async fn latest_record(&self, category: Category) -> Result<Option<FeedRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .get(&category)
            .and_then(|records| records.last())
            .cloned())
    }

    async fn records_after(
        &self,
        category: Category,
        created_at: i64,
        id: &str,
        limit: usize,
    ) -> Result<Vec<FeedRecord>> {
        let tables = self.tables.lock().await;
        Ok(tables
            .records
            .get(&category)
            .map(|records| {
                records
                    .iter()
                    .filter(|record| position(record) > (created_at, id))
                    .take(limit)
                    .cloned()
                    .collect()
            })
            .unwrap_or_default())
    }

    async fn server_snapshot(&self) -> Result<Option<ServerSnapshot>> {
        Ok(self.tables.lock().await.snapshot.clone())
    }

    async fn purge_before(&self, category: Category, cutoff_ms: i64) -> Result<u64> {
        let mut tables = self.tables.lock().await;
        let Some(records) = tables.records.get_mut(&category) else {
            return Ok(0);
        };
        let before = records.len();
        records.retain(|record| record.created_at >= cutoff_ms);
        Ok((before - records.len()) as u64)
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}
