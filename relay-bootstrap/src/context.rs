use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use clickhouse::Client;
use tracing::{info, warn};

use relay_application::{AppState, RelayState};
use relay_domain::ports::RelayStore;
use relay_domain::{DbConfig, StoreBackend};
use relay_infrastructure::{AppConfig, ClickhouseStore, DiscordClient, MemoryStore, SteamProfileClient};

pub struct GatewayContext {
    pub state: AppState,
}

impl GatewayContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        config.validate_for_gateway()?;
        let store = open_store(&config.to_db_config()).await?;
        Ok(Self {
            state: AppState::new(config.to_runtime_config(), store),
        })
    }
}

pub struct RelayContext {
    pub state: RelayState,
}

impl RelayContext {
    pub async fn new() -> Result<Self> {
        let config = AppConfig::load().await?;
        config.validate_for_relay()?;
        let db_config = config.to_db_config();
        if db_config.store_backend == StoreBackend::Memory {
            warn!("relay is using the in-memory store; it will not see events written by a gateway process");
        }
        let store = open_store(&db_config).await?;

        let relay_config = config.to_relay_config();
        let call_timeout = Duration::from_secs(relay_config.collaborator_timeout_seconds.max(1));
        let platform = Arc::new(DiscordClient::new(
            &relay_config.discord_api_base,
            &relay_config.discord_bot_token,
            call_timeout,
        )?);
        let profiles = Arc::new(SteamProfileClient::new(
            relay_config.steam_api_key.clone(),
            call_timeout,
        )?);

        Ok(Self {
            state: RelayState {
                config: relay_config,
                store,
                platform,
                profiles,
            },
        })
    }
}

async fn open_store(db_config: &DbConfig) -> Result<Arc<dyn RelayStore>> {
    let store: Arc<dyn RelayStore> = match db_config.store_backend {
        StoreBackend::Memory => {
            info!("using in-memory store");
            Arc::new(MemoryStore::new())
        }
        StoreBackend::Clickhouse => {
            let mut clickhouse = Client::default()
                .with_url(&db_config.clickhouse_url)
                .with_database(&db_config.clickhouse_database);
            if let Some(user) = &db_config.clickhouse_user {
                clickhouse = clickhouse.with_user(user);
            }
            if let Some(password) = &db_config.clickhouse_password {
                clickhouse = clickhouse.with_password(password);
            }
            info!(url = %db_config.clickhouse_url, database = %db_config.clickhouse_database, "using clickhouse store");
            Arc::new(ClickhouseStore::new(
                clickhouse,
                db_config.clickhouse_database.clone(),
            ))
        }
    };
    store.ensure_schema().await?;
    Ok(store)
}
