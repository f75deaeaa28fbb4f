use std::collections::HashMap;

use anyhow::{Context, Result};
use async_trait::async_trait;
use clickhouse::{Client, Row};
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;
use tokio::sync::Mutex;
use tracing::error;
use uuid::Uuid;

use relay_domain::{
    millis_to_utc, Category, FeedRecord, Player, RecordBody, RelayStore, ServerSnapshot, ServerUpdate,
    WriteBatch,
};

const SNAPSHOT_SLOT: u8 = 1;

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
struct FeedRow {
    id: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    created_at: OffsetDateTime,
    payload: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Row)]
struct PlayerRow {
    steam_id: String,
    steam_name: String,
    playtime_seconds: u64,
    kill_count: u64,
    death_count: u64,
    bank_balance: Option<i64>,
    cash_amount: Option<i64>,
    gold_amount: Option<i64>,
    fame_points: Option<i64>,
    is_banned: bool,
    banned_until: Option<i64>,
    ban_reason: Option<String>,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    first_seen_at: OffsetDateTime,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    last_seen_at: OffsetDateTime,
    version: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize, Row)]
struct SnapshotRow {
    slot: u8,
    payload: String,
    #[serde(with = "clickhouse::serde::time::datetime64::millis")]
    updated_at: OffsetDateTime,
}

fn to_millis(value: OffsetDateTime) -> i64 {
    (value.unix_timestamp_nanos() / 1_000_000) as i64
}

impl PlayerRow {
    fn from_player(player: &Player, version: u64) -> Self {
        Self {
            steam_id: player.steam_id.clone(),
            steam_name: player.steam_name.clone(),
            playtime_seconds: player.playtime_seconds,
            kill_count: player.kill_count,
            death_count: player.death_count,
            bank_balance: player.bank_balance,
            cash_amount: player.cash_amount,
            gold_amount: player.gold_amount,
            fame_points: player.fame_points,
            is_banned: player.is_banned,
            banned_until: player.banned_until,
            ban_reason: player.ban_reason.clone(),
            first_seen_at: millis_to_utc(player.first_seen_at),
            last_seen_at: millis_to_utc(player.last_seen_at),
            version,
        }
    }

    fn into_player(self) -> Player {
        Player {
            steam_id: self.steam_id,
            steam_name: self.steam_name,
            playtime_seconds: self.playtime_seconds,
            kill_count: self.kill_count,
            death_count: self.death_count,
            bank_balance: self.bank_balance,
            cash_amount: self.cash_amount,
            gold_amount: self.gold_amount,
            fame_points: self.fame_points,
            is_banned: self.is_banned,
            banned_until: self.banned_until,
            ban_reason: self.ban_reason,
            first_seen_at: to_millis(self.first_seen_at),
            last_seen_at: to_millis(self.last_seen_at),
        }
    }
}

fn decode_record(category: Category, row: FeedRow) -> Result<FeedRecord> {
    let body = RecordBody::from_json(category, &row.payload)
        .with_context(|| format!("corrupt {} record {}", category, row.id))?;
    Ok(FeedRecord {
        id: row.id,
        created_at: to_millis(row.created_at),
        body,
    })
}

/// A player row about to be written, with the row it replaces.
struct PendingPlayer {
    player: Player,
    version: u64,
    prior: Option<PlayerRow>,
}

/// What puts the players table back after a failed commit: prior rows
/// re-inserted above the version just written, and players that did not
/// exist before.
#[derive(Debug, Default, PartialEq)]
struct PlayerRollback {
    restore: Vec<PlayerRow>,
    remove: Vec<String>,
}

impl PlayerRollback {
    fn plan(pending: &[PendingPlayer]) -> Self {
        let mut rollback = Self::default();
        for entry in pending {
            match &entry.prior {
                Some(row) => {
                    let mut row = row.clone();
                    row.version = entry.version + 1;
                    rollback.restore.push(row);
                }
                None => rollback.remove.push(entry.player.steam_id.clone()),
            }
        }
        rollback
    }
}

/// ClickHouse-backed store. One table per feed category, a versioned
/// players table and a single-slot snapshot table.
pub struct ClickhouseStore {
    client: Client,
    database: String,
    /// Serialises writers and holds the last record stamp per category.
    write_lock: Mutex<HashMap<Category, i64>>,
}

impl ClickhouseStore {
    pub fn new(client: Client, database: String) -> Self {
        Self {
            client,
            database,
            write_lock: Mutex::new(HashMap::new()),
        }
    }

    async fn load_player_row(&self, steam_id: &str) -> Result<Option<PlayerRow>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM players FINAL WHERE steam_id = ? LIMIT 1")
            .bind(steam_id)
            .fetch_all::<PlayerRow>()
            .await?;
        Ok(rows.into_iter().next())
    }

    async fn plan_players(&self, batch: &WriteBatch, now_ms: i64) -> Result<Vec<PendingPlayer>> {
        // Effects on the same player within one batch fold in memory first.
        let mut pending: Vec<PendingPlayer> = Vec::new();
        for effect in &batch.player_effects {
            let slot = pending
                .iter_mut()
                .find(|entry| entry.player.steam_id == effect.player.steam_id);
            match slot {
                Some(entry) => {
                    entry.player = Player::sighted(Some(entry.player.clone()), effect, now_ms);
                }
                None => {
                    let prior = self.load_player_row(&effect.player.steam_id).await?;
                    let version = prior
                        .as_ref()
                        .map(|row| row.version + 1)
                        .unwrap_or(0)
                        .max(now_ms.max(0) as u64);
                    let player =
                        Player::sighted(prior.clone().map(PlayerRow::into_player), effect, now_ms);
                    pending.push(PendingPlayer {
                        player,
                        version,
                        prior,
                    });
                }
            }
        }
        Ok(pending)
    }

    async fn write_players(&self, pending: &[PendingPlayer]) -> Result<()> {
        if pending.is_empty() {
            return Ok(());
        }
        let mut insert = self.client.insert("players")?;
        for entry in pending {
            insert
                .write(&PlayerRow::from_player(&entry.player, entry.version))
                .await?;
        }
        insert.end().await?;
        Ok(())
    }

    async fn rollback_players(&self, pending: &[PendingPlayer]) -> Result<()> {
        let rollback = PlayerRollback::plan(pending);
        if !rollback.restore.is_empty() {
            let mut insert = self.client.insert("players")?;
            for row in &rollback.restore {
                insert.write(row).await?;
            }
            insert.end().await?;
        }
        for steam_id in &rollback.remove {
            self.client
                .query("ALTER TABLE players DELETE WHERE steam_id = ? SETTINGS mutations_sync = 1")
                .bind(steam_id)
                .execute()
                .await?;
        }
        Ok(())
    }

    async fn write_snapshot(&self, update: &ServerUpdate, now_ms: i64) -> Result<()> {
        let mut insert = self.client.insert("server_snapshot")?;
        insert
            .write(&SnapshotRow {
                slot: SNAPSHOT_SLOT,
                payload: serde_json::to_string(update)?,
                updated_at: millis_to_utc(now_ms),
            })
            .await?;
        insert.end().await?;
        Ok(())
    }

    async fn last_stamp(&self, category: Category) -> Result<Option<i64>> {
        let query = format!(
            "SELECT toUnixTimestamp64Milli(max(created_at)) FROM {}",
            category.as_str()
        );
        let last: i64 = self.client.query(&query).fetch_one().await?;
        Ok((last > 0).then_some(last))
    }

    async fn write_record(&self, body: &RecordBody, created_at: i64) -> Result<()> {
        let mut insert = self.client.insert(body.category().as_str())?;
        insert
            .write(&FeedRow {
                id: Uuid::now_v7().to_string(),
                created_at: millis_to_utc(created_at),
                payload: body.to_json()?,
            })
            .await?;
        insert.end().await?;
        Ok(())
    }

    async fn apply(
        &self,
        batch: &WriteBatch,
        pending: &[PendingPlayer],
        stamps: &mut HashMap<Category, i64>,
        now_ms: i64,
    ) -> Result<()> {
        self.write_players(pending).await?;
        if let Some(update) = &batch.snapshot {
            self.write_snapshot(update, now_ms).await?;
        }
        if let Some(body) = &batch.record {
            let category = body.category();
            let previous = match stamps.get(&category) {
                Some(last) => Some(*last),
                None => self.last_stamp(category).await?,
            };
            let created_at = FeedRecord::next_created_at(previous, now_ms);
            if let Err(err) = self.write_record(body, created_at).await {
                // The insert may still have landed; reload the stamp next time.
                stamps.remove(&category);
                return Err(err);
            }
            stamps.insert(category, created_at);
        }
        Ok(())
    }
}

#[async_trait]
impl RelayStore for ClickhouseStore {
    async fn ensure_schema(&self) -> Result<()> {
        let create_db = format!("CREATE DATABASE IF NOT EXISTS {}", self.database);
        self.client.query(&create_db).execute().await?;

        let create_players = r#"
CREATE TABLE IF NOT EXISTS players (
    steam_id String,
    steam_name String,
    playtime_seconds UInt64,
    kill_count UInt64,
    death_count UInt64,
    bank_balance Nullable(Int64),
    cash_amount Nullable(Int64),
    gold_amount Nullable(Int64),
    fame_points Nullable(Int64),
    is_banned Bool,
    banned_until Nullable(Int64),
    ban_reason Nullable(String),
    first_seen_at DateTime64(3),
    last_seen_at DateTime64(3),
    version UInt64
) ENGINE = ReplacingMergeTree(version)
ORDER BY steam_id
"#;
        self.client.query(create_players).execute().await?;

        let create_snapshot = r#"
CREATE TABLE IF NOT EXISTS server_snapshot (
    slot UInt8,
    payload String,
    updated_at DateTime64(3)
) ENGINE = ReplacingMergeTree(updated_at)
ORDER BY slot
"#;
        self.client.query(create_snapshot).execute().await?;

        for category in Category::ALL {
            let create_feed = format!(
                r#"
CREATE TABLE IF NOT EXISTS {} (
    id String,
    created_at DateTime64(3),
    payload String
) ENGINE = MergeTree
PARTITION BY toDate(created_at)
ORDER BY (created_at, id)
"#,
                category.as_str()
            );
            self.client.query(&create_feed).execute().await?;
        }
        Ok(())
    }

    /// ClickHouse has no multi-table transactions. Writes are serialised and
    /// the feed record goes last, so a listener never sees a record whose
    /// player and snapshot changes are missing. When any insert fails the
    /// player rows are rolled back before the error is returned.
    async fn commit(&self, batch: WriteBatch, now_ms: i64) -> Result<()> {
        let mut stamps = self.write_lock.lock().await;
        let pending = self.plan_players(&batch, now_ms).await?;
        let Err(err) = self.apply(&batch, &pending, &mut stamps, now_ms).await else {
            return Ok(());
        };
        if !pending.is_empty() {
            if let Err(rollback_err) = self.rollback_players(&pending).await {
                error!("failed to roll back player rows: {:#}", rollback_err);
            }
        }
        Err(err)
    }

    async fn latest_record(&self, category: Category) -> Result<Option<FeedRecord>> {
        let query = format!(
            "SELECT ?fields FROM {} ORDER BY created_at DESC, id DESC LIMIT 1",
            category.as_str()
        );
        let rows = self.client.query(&query).fetch_all::<FeedRow>().await?;
        rows.into_iter()
            .next()
            .map(|row| decode_record(category, row))
            .transpose()
    }

    async fn records_after(
        &self,
        category: Category,
        created_at: i64,
        id: &str,
        limit: usize,
    ) -> Result<Vec<FeedRecord>> {
        let query = format!(
            "SELECT ?fields FROM {} \
             WHERE created_at > fromUnixTimestamp64Milli(?) \
                OR (created_at = fromUnixTimestamp64Milli(?) AND id > ?) \
             ORDER BY created_at ASC, id ASC LIMIT {}",
            category.as_str(),
            limit
        );
        let rows = self
            .client
            .query(&query)
            .bind(created_at)
            .bind(created_at)
            .bind(id)
            .fetch_all::<FeedRow>()
            .await?;
        rows.into_iter()
            .map(|row| decode_record(category, row))
            .collect()
    }

    async fn server_snapshot(&self) -> Result<Option<ServerSnapshot>> {
        let rows = self
            .client
            .query("SELECT ?fields FROM server_snapshot FINAL WHERE slot = ? LIMIT 1")
            .bind(SNAPSHOT_SLOT)
            .fetch_all::<SnapshotRow>()
            .await?;
        let Some(row) = rows.into_iter().next() else {
            return Ok(None);
        };
        let state: ServerUpdate =
            serde_json::from_str(&row.payload).context("corrupt server snapshot payload")?;
        Ok(Some(ServerSnapshot {
            state,
            updated_at: to_millis(row.updated_at),
        }))
    }

    async fn purge_before(&self, category: Category, cutoff_ms: i64) -> Result<u64> {
        let _guard = self.write_lock.lock().await;
        let count_query = format!(
            "SELECT count() FROM {} WHERE created_at < fromUnixTimestamp64Milli(?)",
            category.as_str()
        );
        let expired: u64 = self
            .client
            .query(&count_query)
            .bind(cutoff_ms)
            .fetch_one()
            .await?;
        if expired == 0 {
            return Ok(0);
        }
        let delete_query = format!(
            "ALTER TABLE {} DELETE WHERE created_at < fromUnixTimestamp64Milli(?) SETTINGS mutations_sync = 1",
            category.as_str()
        );
        self.client.query(&delete_query).bind(cutoff_ms).execute().await?;
        Ok(expired)
    }

    async fn ping(&self) -> Result<()> {
        let _: u8 = self.client.query("SELECT toUInt8(1)").fetch_one().await?;
        Ok(())
    }
}
