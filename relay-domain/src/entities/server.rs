// Server snapshot entity
// Single overwritten-in-place row; the only basis for online/offline inference

use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Number;

use crate::entities::PlayerRef;

/// Maximum snapshot age before the server is considered offline.
pub const STALENESS_THRESHOLD_MS: i64 = 60_000;

// The game agent sends plain JSON numbers; fractional values are rounded.
fn round_number(number: &Number) -> Option<i64> {
    number.as_i64().or_else(|| {
        number
            .as_f64()
            .filter(|value| value.is_finite())
            .map(|value| value.round() as i64)
    })
}

fn rounded<'de, D: Deserializer<'de>>(deserializer: D) -> Result<i64, D::Error> {
    let number = Number::deserialize(deserializer)?;
    round_number(&number).ok_or_else(|| D::Error::custom(format!("number out of range: {number}")))
}

fn rounded_count<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Option<u32>, D::Error> {
    let Some(number) = Option::<Number>::deserialize(deserializer)? else {
        return Ok(None);
    };
    let value = round_number(&number)
        .ok_or_else(|| D::Error::custom(format!("number out of range: {number}")))?;
    Ok(Some(value.clamp(0, i64::from(u32::MAX)) as u32))
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSettings {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(
        default,
        deserialize_with = "rounded_count",
        skip_serializing_if = "Option::is_none"
    )]
    pub max_players: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub playstyle: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub game_version: Option<String>,
    /// Seconds since the game server started.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub uptime: Option<f64>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct BountyReward {
    #[serde(deserialize_with = "rounded")]
    pub cash: i64,
    #[serde(deserialize_with = "rounded")]
    pub gold: i64,
    #[serde(deserialize_with = "rounded")]
    pub fame: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Bounty {
    pub target_user_id: String,
    pub target_name: String,
    pub rewards: BountyReward,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_sector: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_seen_keypad: Option<String>,
}

/// Payload of a `server-update` event.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerUpdate {
    pub server_settings: ServerSettings,
    pub player_list: Vec<PlayerRef>,
    pub bounties: Vec<Bounty>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServerSnapshot {
    #[serde(flatten)]
    pub state: ServerUpdate,
    pub updated_at: i64,
}

impl ServerSnapshot {
    pub fn age_ms(&self, now_ms: i64) -> i64 {
        now_ms.saturating_sub(self.updated_at)
    }

    pub fn is_online(&self, now_ms: i64) -> bool {
        self.age_ms(now_ms) < STALENESS_THRESHOLD_MS
    }
}
