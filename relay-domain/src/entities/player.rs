// Player entity
// Identity record keyed by Steam id, mutated incrementally by game events

use serde::{Deserialize, Serialize};

/// Denormalized player snapshot embedded in event records.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerRef {
    pub name: String,
    pub steam_id: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Player {
    pub steam_id: String,
    pub steam_name: String,
    pub playtime_seconds: u64,
    pub kill_count: u64,
    pub death_count: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub bank_balance: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cash_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub gold_amount: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fame_points: Option<i64>,
    #[serde(default)]
    pub is_banned: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub banned_until: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub ban_reason: Option<String>,
    pub first_seen_at: i64,
    pub last_seen_at: i64,
}

/// One player-side change produced by a game event.
///
/// Effects are applied in order, so a self-kill yields two effects against
/// the same steam id and both counters move.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PlayerEffect {
    pub player: PlayerRef,
    pub kills: u64,
    pub deaths: u64,
    pub playtime_seconds: u64,
}

impl PlayerEffect {
    pub fn sighting(player: PlayerRef) -> Self {
        Self {
            player,
            kills: 0,
            deaths: 0,
            playtime_seconds: 0,
        }
    }

    pub fn kill(player: PlayerRef) -> Self {
        Self {
            kills: 1,
            ..Self::sighting(player)
        }
    }

    pub fn death(player: PlayerRef) -> Self {
        Self {
            deaths: 1,
            ..Self::sighting(player)
        }
    }

    pub fn playtime(player: PlayerRef, seconds: u64) -> Self {
        Self {
            playtime_seconds: seconds,
            ..Self::sighting(player)
        }
    }
}

impl Player {
    pub fn first_seen(player: &PlayerRef, now_ms: i64) -> Self {
        Self {
            steam_id: player.steam_id.clone(),
            steam_name: player.name.clone(),
            playtime_seconds: 0,
            kill_count: 0,
            death_count: 0,
            bank_balance: None,
            cash_amount: None,
            gold_amount: None,
            fame_points: None,
            is_banned: false,
            banned_until: None,
            ban_reason: None,
            first_seen_at: now_ms,
            last_seen_at: now_ms,
        }
    }

    /// Upsert rule: create with zeroed counters when absent, otherwise patch
    /// name and last-seen, then add the effect's counters.
    pub fn sighted(existing: Option<Player>, effect: &PlayerEffect, now_ms: i64) -> Player {
        let mut player = match existing {
            Some(mut player) => {
                player.steam_name = effect.player.name.clone();
                player.last_seen_at = now_ms;
                player
            }
            None => Player::first_seen(&effect.player, now_ms),
        };
        player.kill_count = player.kill_count.saturating_add(effect.kills);
        player.death_count = player.death_count.saturating_add(effect.deaths);
        player.playtime_seconds = player
            .playtime_seconds
            .saturating_add(effect.playtime_seconds);
        player
    }
}
