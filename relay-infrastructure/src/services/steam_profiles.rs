use std::time::Duration;

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use tracing::{error, warn};

use relay_domain::ports::ProfileLookup;
use relay_domain::PlayerProfile;

const STEAM_API_BASE: &str = "https://api.steampowered.com";

#[derive(Debug, Deserialize)]
struct SummariesEnvelope {
    response: SummariesResponse,
}

#[derive(Debug, Default, Deserialize)]
struct SummariesResponse {
    #[serde(default)]
    players: Vec<PlayerSummary>,
}

#[derive(Debug, Deserialize)]
struct PlayerSummary {
    steamid: String,
    personaname: String,
    profileurl: String,
    #[serde(default)]
    avatarfull: Option<String>,
    #[serde(default)]
    loccountrycode: Option<String>,
}

impl From<PlayerSummary> for PlayerProfile {
    fn from(summary: PlayerSummary) -> Self {
        PlayerProfile {
            steam_id: summary.steamid,
            persona_name: summary.personaname,
            profile_url: summary.profileurl,
            avatar_url: summary.avatarfull,
            country_code: summary.loccountrycode,
        }
    }
}

/// Steam Web API player summary lookups. Every failure degrades to `None`.
pub struct SteamProfileClient {
    http: Client,
    api_base: String,
    api_key: Option<String>,
}

impl SteamProfileClient {
    pub fn new(api_key: Option<String>, request_timeout: Duration) -> anyhow::Result<Self> {
        Self::with_base(STEAM_API_BASE, api_key, request_timeout)
    }

    pub fn with_base(
        api_base: &str,
        api_key: Option<String>,
        request_timeout: Duration,
    ) -> anyhow::Result<Self> {
        let http = Client::builder().timeout(request_timeout).build()?;
        Ok(Self {
            http,
            api_base: api_base.trim_end_matches('/').to_string(),
            api_key,
        })
    }

    async fn fetch_summary(&self, api_key: &str, steam_id: &str) -> anyhow::Result<Option<PlayerProfile>> {
        let url = format!("{}/ISteamUser/GetPlayerSummaries/v0002/", self.api_base);
        let envelope: SummariesEnvelope = self
            .http
            .get(url)
            .query(&[("key", api_key), ("steamids", steam_id)])
            .send()
            .await?
            .error_for_status()?
            .json()
            .await?;
        Ok(envelope
            .response
            .players
            .into_iter()
            .next()
            .map(PlayerProfile::from))
    }
}

#[async_trait]
impl ProfileLookup for SteamProfileClient {
    async fn player_profile(&self, steam_id: &str) -> Option<PlayerProfile> {
        let Some(api_key) = self.api_key.as_deref() else {
            warn!("steam api key not configured, skipping profile lookup");
            return None;
        };
        match self.fetch_summary(api_key, steam_id).await {
            Ok(profile) => profile,
            Err(err) => {
                error!(steam_id = %steam_id, "steam profile lookup failed: {:#}", err);
                None
            }
        }
    }
}
