use std::env;
use std::path::Path;

use serde::Deserialize;
use tokio::fs;
use tracing::warn;

use relay_domain::{
    Category, DbConfig, FeedChannel, GatewayClientConfig, PanelBinding, PanelKind, PanelLinks,
    RelayConfig, RetentionPolicy, RuntimeConfig, StoreBackend,
};

use crate::config::validation::{require, validate_retention, ConfigError};

pub const CONFIG_PATH_ENV: &str = "SCUM_RELAY_CONFIG";
const ENV_PREFIX: &str = "SCUM_RELAY_";

#[derive(Debug, Deserialize, Clone)]
#[serde(default)]
pub struct AppConfig {
    pub bind_addr: String,
    pub api_key: Option<String>,
    pub store_backend: StoreBackend,
    pub clickhouse_url: String,
    pub clickhouse_database: String,
    pub clickhouse_user: Option<String>,
    pub clickhouse_password: Option<String>,
    pub max_body_bytes: u64,
    pub request_timeout_seconds: u64,
    pub gateway_url: String,
    pub discord_api_base: String,
    pub discord_bot_token: Option<String>,
    pub status_channel_id: Option<String>,
    pub status_message_id: Option<String>,
    pub bounty_channel_id: Option<String>,
    pub bounty_message_id: Option<String>,
    pub killfeed_channel_id: Option<String>,
    pub connections_channel_id: Option<String>,
    pub chat_channel_id: Option<String>,
    pub admin_log_channel_id: Option<String>,
    pub interactions_channel_id: Option<String>,
    pub steam_api_key: Option<String>,
    pub play_url: String,
    pub rules_url: String,
    pub panel_interval_seconds: u64,
    pub feed_poll_interval_seconds: u64,
    pub collaborator_timeout_seconds: u64,
    pub retention: Vec<RetentionPolicy>,
}

impl Default for AppConfig {
    fn default() -> Self {
        let links = PanelLinks::default();
        Self {
            bind_addr: "0.0.0.0:3000".to_string(),
            api_key: None,
            store_backend: StoreBackend::Clickhouse,
            clickhouse_url: "http://127.0.0.1:8123".to_string(),
            clickhouse_database: "scum_relay".to_string(),
            clickhouse_user: None,
            clickhouse_password: None,
            max_body_bytes: 1024 * 1024,
            request_timeout_seconds: 15,
            gateway_url: "http://127.0.0.1:3000".to_string(),
            discord_api_base: "https://discord.com/api/v10".to_string(),
            discord_bot_token: None,
            status_channel_id: None,
            status_message_id: None,
            bounty_channel_id: None,
            bounty_message_id: None,
            killfeed_channel_id: None,
            connections_channel_id: None,
            chat_channel_id: None,
            admin_log_channel_id: None,
            interactions_channel_id: None,
            steam_api_key: None,
            play_url: links.play_url,
            rules_url: links.rules_url,
            panel_interval_seconds: 60,
            feed_poll_interval_seconds: 2,
            collaborator_timeout_seconds: 10,
            retention: RetentionPolicy::defaults(),
        }
    }
}

impl AppConfig {
    /// Reads the TOML file named by `SCUM_RELAY_CONFIG` (default
    /// `./config.toml`), then applies env overrides. A missing file means
    /// defaults.
    pub async fn load() -> Result<Self, ConfigError> {
        let path = env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "./config.toml".to_string());
        let file_path = Path::new(&path);
        let mut config = if file_path.exists() {
            let content = fs::read_to_string(file_path)
                .await
                .map_err(|source| ConfigError::Read {
                    path: path.clone(),
                    source,
                })?;
            Self::from_toml(&path, &content)?
        } else {
            warn!("config file {} not found, using defaults", path);
            AppConfig::default()
        };
        config.apply_env_overrides();
        config.normalize();
        Ok(config)
    }

    pub fn from_toml(path: &str, content: &str) -> Result<Self, ConfigError> {
        toml::from_str(content).map_err(|source| ConfigError::Parse {
            path: path.to_string(),
            source,
        })
    }

    pub fn normalize(&mut self) {
        for value in [
            &mut self.api_key,
            &mut self.clickhouse_user,
            &mut self.clickhouse_password,
            &mut self.discord_bot_token,
            &mut self.status_channel_id,
            &mut self.status_message_id,
            &mut self.bounty_channel_id,
            &mut self.bounty_message_id,
            &mut self.killfeed_channel_id,
            &mut self.connections_channel_id,
            &mut self.chat_channel_id,
            &mut self.admin_log_channel_id,
            &mut self.interactions_channel_id,
            &mut self.steam_api_key,
        ] {
            normalize_optional(value);
        }
        self.gateway_url = self.gateway_url.trim().trim_end_matches('/').to_string();
        self.discord_api_base = self.discord_api_base.trim().trim_end_matches('/').to_string();
        self.retention = merge_retention(std::mem::take(&mut self.retention));
    }

    pub fn validate_for_gateway(&self) -> Result<(), ConfigError> {
        require(&self.api_key, "api_key")?;
        self.bind_addr
            .parse::<std::net::SocketAddr>()
            .map_err(|err| ConfigError::Invalid {
                key: "bind_addr",
                reason: err.to_string(),
            })?;
        if self.max_body_bytes == 0 {
            return Err(ConfigError::Invalid {
                key: "max_body_bytes",
                reason: "must be greater than 0".to_string(),
            });
        }
        validate_retention(&self.retention)
    }

    pub fn validate_for_relay(&self) -> Result<(), ConfigError> {
        require(&self.discord_bot_token, "discord_bot_token")?;
        require(&self.status_channel_id, "status_channel_id")?;
        require(&self.bounty_channel_id, "bounty_channel_id")?;
        for (key, value) in [
            ("panel_interval_seconds", self.panel_interval_seconds),
            ("feed_poll_interval_seconds", self.feed_poll_interval_seconds),
        ] {
            if value == 0 {
                return Err(ConfigError::Invalid {
                    key,
                    reason: "must be greater than 0".to_string(),
                });
            }
        }
        Ok(())
    }

    pub fn validate_for_client(&self) -> Result<(), ConfigError> {
        require(&self.api_key, "api_key")?;
        if self.gateway_url.is_empty() {
            return Err(ConfigError::Missing("gateway_url"));
        }
        Ok(())
    }

    pub fn to_runtime_config(&self) -> RuntimeConfig {
        RuntimeConfig {
            bind_addr: self.bind_addr.clone(),
            api_key: self.api_key.clone(),
            max_body_bytes: self.max_body_bytes,
            request_timeout_seconds: self.request_timeout_seconds,
            collaborator_timeout_seconds: self.collaborator_timeout_seconds,
            retention: self.retention.clone(),
        }
    }

    pub fn to_relay_config(&self) -> RelayConfig {
        RelayConfig {
            discord_api_base: self.discord_api_base.clone(),
            discord_bot_token: self.discord_bot_token.clone().unwrap_or_default(),
            status_panel: PanelBinding {
                kind: PanelKind::Status,
                channel_id: self.status_channel_id.clone().unwrap_or_default(),
                message_id: self.status_message_id.clone(),
            },
            bounty_panel: PanelBinding {
                kind: PanelKind::Bounty,
                channel_id: self.bounty_channel_id.clone().unwrap_or_default(),
                message_id: self.bounty_message_id.clone(),
            },
            feeds: self.feed_channels(),
            steam_api_key: self.steam_api_key.clone(),
            links: PanelLinks {
                play_url: self.play_url.clone(),
                rules_url: self.rules_url.clone(),
            },
            panel_interval_seconds: self.panel_interval_seconds,
            feed_poll_interval_seconds: self.feed_poll_interval_seconds,
            collaborator_timeout_seconds: self.collaborator_timeout_seconds,
        }
    }

    pub fn to_db_config(&self) -> DbConfig {
        DbConfig {
            store_backend: self.store_backend,
            clickhouse_url: self.clickhouse_url.clone(),
            clickhouse_database: self.clickhouse_database.clone(),
            clickhouse_user: self.clickhouse_user.clone(),
            clickhouse_password: self.clickhouse_password.clone(),
        }
    }

    pub fn to_client_config(&self) -> GatewayClientConfig {
        GatewayClientConfig {
            gateway_url: self.gateway_url.clone(),
            api_key: self.api_key.clone(),
        }
    }

    /// Lockpicks and generic interactions share the interactions channel.
    fn feed_channels(&self) -> Vec<FeedChannel> {
        let mut feeds = Vec::new();
        for category in Category::ALL {
            let channel = match category {
                Category::Kills => &self.killfeed_channel_id,
                Category::Connections => &self.connections_channel_id,
                Category::ChatLogs => &self.chat_channel_id,
                Category::AdminLogs => &self.admin_log_channel_id,
                Category::Lockpicking | Category::Interactions => &self.interactions_channel_id,
            };
            match channel {
                Some(channel_id) => feeds.push(FeedChannel {
                    category,
                    channel_id: channel_id.clone(),
                }),
                None => warn!(category = %category, "no channel configured, feed disabled"),
            }
        }
        feeds
    }

    fn apply_env_overrides(&mut self) {
        self.apply_overrides(|key| env::var(format!("{ENV_PREFIX}{key}")).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let text = |key: &str, target: &mut String| {
            if let Some(value) = lookup(key) {
                *target = value;
            }
        };
        text("BIND_ADDR", &mut self.bind_addr);
        text("CLICKHOUSE_URL", &mut self.clickhouse_url);
        text("CLICKHOUSE_DATABASE", &mut self.clickhouse_database);
        text("GATEWAY_URL", &mut self.gateway_url);
        text("DISCORD_API_BASE", &mut self.discord_api_base);
        text("PLAY_URL", &mut self.play_url);
        text("RULES_URL", &mut self.rules_url);

        let optional = |key: &str, target: &mut Option<String>| {
            if let Some(value) = lookup(key) {
                *target = Some(value);
            }
        };
        optional("API_KEY", &mut self.api_key);
        optional("CLICKHOUSE_USER", &mut self.clickhouse_user);
        optional("CLICKHOUSE_PASSWORD", &mut self.clickhouse_password);
        optional("DISCORD_BOT_TOKEN", &mut self.discord_bot_token);
        optional("STATUS_CHANNEL_ID", &mut self.status_channel_id);
        optional("STATUS_MESSAGE_ID", &mut self.status_message_id);
        optional("BOUNTY_CHANNEL_ID", &mut self.bounty_channel_id);
        optional("BOUNTY_MESSAGE_ID", &mut self.bounty_message_id);
        optional("KILLFEED_CHANNEL_ID", &mut self.killfeed_channel_id);
        optional("CONNECTIONS_CHANNEL_ID", &mut self.connections_channel_id);
        optional("CHAT_CHANNEL_ID", &mut self.chat_channel_id);
        optional("ADMIN_LOG_CHANNEL_ID", &mut self.admin_log_channel_id);
        optional("INTERACTIONS_CHANNEL_ID", &mut self.interactions_channel_id);
        optional("STEAM_API_KEY", &mut self.steam_api_key);

        let number = |key: &str, target: &mut u64| {
            if let Some(value) = lookup(key) {
                *target = value.trim().parse().unwrap_or(*target);
            }
        };
        number("MAX_BODY_BYTES", &mut self.max_body_bytes);
        number("REQUEST_TIMEOUT_SECONDS", &mut self.request_timeout_seconds);
        number("PANEL_INTERVAL_SECONDS", &mut self.panel_interval_seconds);
        number("FEED_POLL_INTERVAL_SECONDS", &mut self.feed_poll_interval_seconds);
        number("COLLABORATOR_TIMEOUT_SECONDS", &mut self.collaborator_timeout_seconds);

        if let Some(value) = lookup("STORE_BACKEND") {
            match value.trim().to_lowercase().as_str() {
                "clickhouse" => self.store_backend = StoreBackend::Clickhouse,
                "memory" => self.store_backend = StoreBackend::Memory,
                other => warn!("ignoring unknown store backend '{}'", other),
            }
        }

        for category in Category::ALL {
            let key = format!("RETENTION_{}_DAYS", category.as_str().to_uppercase());
            let Some(days) = lookup(&key).and_then(|value| value.trim().parse::<u32>().ok()) else {
                continue;
            };
            match self.retention.iter_mut().find(|policy| policy.category == category) {
                Some(policy) => policy.retention_days = days,
                None => {
                    let mut policy = default_policy(category);
                    policy.retention_days = days;
                    self.retention.push(policy);
                }
            }
        }
    }
}

fn normalize_optional(value: &mut Option<String>) {
    if let Some(inner) = value {
        let trimmed = inner.trim();
        if trimmed.is_empty() {
            *value = None;
        } else if trimmed.len() != inner.len() {
            *value = Some(trimmed.to_string());
        }
    }
}

fn default_policy(category: Category) -> RetentionPolicy {
    RetentionPolicy::defaults()
        .into_iter()
        .find(|policy| policy.category == category)
        .unwrap_or_else(|| RetentionPolicy::new(category, 30, 0, 0))
}

/// Configured entries override the per-category defaults; categories the
/// file leaves out keep theirs. Duplicates survive for validation to catch.
fn merge_retention(configured: Vec<RetentionPolicy>) -> Vec<RetentionPolicy> {
    let mut merged: Vec<RetentionPolicy> = RetentionPolicy::defaults()
        .into_iter()
        .filter(|default| !configured.iter().any(|policy| policy.category == default.category))
        .collect();
    merged.extend(configured);
    merged.sort_by_key(|policy| (policy.hour_utc, policy.minute_utc));
    merged
}
