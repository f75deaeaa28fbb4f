// Runtime configuration entities
// Resolved views of the file/env configuration handed to each process

use serde::{Deserialize, Serialize};

use crate::entities::{FeedChannel, PanelBinding, PanelLinks};
use crate::value_objects::Category;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    pub category: Category,
    pub retention_days: u32,
    pub hour_utc: u32,
    pub minute_utc: u32,
}

impl RetentionPolicy {
    pub fn new(category: Category, retention_days: u32, hour_utc: u32, minute_utc: u32) -> Self {
        Self {
            category,
            retention_days,
            hour_utc,
            minute_utc,
        }
    }

    /// Daily sweeps staggered a minute or two apart per category.
    pub fn defaults() -> Vec<RetentionPolicy> {
        vec![
            RetentionPolicy::new(Category::ChatLogs, 1, 0, 0),
            RetentionPolicy::new(Category::Kills, 30, 0, 1),
            RetentionPolicy::new(Category::Connections, 30, 0, 2),
            RetentionPolicy::new(Category::AdminLogs, 1, 0, 3),
            RetentionPolicy::new(Category::Lockpicking, 30, 0, 5),
            RetentionPolicy::new(Category::Interactions, 30, 0, 6),
        ]
    }
}

/// Ingestion gateway settings.
#[derive(Debug, Clone)]
pub struct RuntimeConfig {
    pub bind_addr: String,
    pub api_key: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub collaborator_timeout_seconds: u64,
    pub retention: Vec<RetentionPolicy>,
}

/// Bot-side relay settings: panels, feeds and collaborators.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    pub discord_api_base: String,
    pub discord_bot_token: String,
    pub status_panel: PanelBinding,
    pub bounty_panel: PanelBinding,
    pub feeds: Vec<FeedChannel>,
    pub steam_api_key: Option<String>,
    pub links: PanelLinks,
    pub panel_interval_seconds: u64,
    pub feed_poll_interval_seconds: u64,
    pub collaborator_timeout_seconds: u64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreBackend {
    Clickhouse,
    Memory,
}

#[derive(Debug, Clone)]
pub struct DbConfig {
    pub store_backend: StoreBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
}

/// Settings for operator tools that talk to a running gateway.
#[derive(Debug, Clone)]
pub struct GatewayClientConfig {
    pub gateway_url: String,
    pub api_key: Option<String>,
}
