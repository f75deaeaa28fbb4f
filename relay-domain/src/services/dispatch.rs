// Event dispatch table
// Maps an inbound event token to a typed event and the store writes it implies

use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use thiserror::Error;

use crate::entities::{
    AdminCommandEvent, ChatEvent, ConnectionEvent, InteractionEvent, KillEvent, LockpickEvent,
    PlayerEffect, RecordBody, ServerUpdate,
};
use crate::value_objects::EventKind;

/// Body of `POST /game-event`.
#[derive(Debug, Clone, Deserialize)]
pub struct EventEnvelope {
    pub event: String,
    #[serde(default)]
    pub payload: Value,
}

#[derive(Debug, Error)]
pub enum EventParseError {
    #[error("unknown event type: {0}")]
    UnknownEvent(String),
    #[error("invalid payload for {kind}: {source}")]
    InvalidPayload {
        kind: EventKind,
        #[source]
        source: serde_json::Error,
    },
}

#[derive(Debug, Clone, PartialEq)]
pub enum GameEvent {
    ServerUpdate(ServerUpdate),
    Kill(KillEvent),
    Connection(ConnectionEvent),
    AdminCommand(AdminCommandEvent),
    Chat(ChatEvent),
    Lockpick(LockpickEvent),
    Interaction(InteractionEvent),
}

/// Everything one event writes. The store commits a batch as one unit.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WriteBatch {
    pub record: Option<RecordBody>,
    pub player_effects: Vec<PlayerEffect>,
    pub snapshot: Option<ServerUpdate>,
}

impl WriteBatch {
    pub fn is_empty(&self) -> bool {
        self.record.is_none() && self.player_effects.is_empty() && self.snapshot.is_none()
    }
}

fn typed<T: DeserializeOwned>(kind: EventKind, payload: Value) -> Result<T, EventParseError> {
    serde_json::from_value(payload).map_err(|source| EventParseError::InvalidPayload { kind, source })
}

impl GameEvent {
    /// Token lookup first, then payload shape. Nothing is written on error.
    pub fn parse(token: &str, payload: Value) -> Result<Self, EventParseError> {
        let kind = EventKind::from_token(token)
            .ok_or_else(|| EventParseError::UnknownEvent(token.to_string()))?;
        Ok(match kind {
            EventKind::ServerUpdate => GameEvent::ServerUpdate(typed(kind, payload)?),
            EventKind::Kill => GameEvent::Kill(typed(kind, payload)?),
            EventKind::Connection => GameEvent::Connection(typed(kind, payload)?),
            EventKind::AdminCommand => GameEvent::AdminCommand(typed(kind, payload)?),
            EventKind::Chat => GameEvent::Chat(typed(kind, payload)?),
            EventKind::Lockpick => GameEvent::Lockpick(typed(kind, payload)?),
            EventKind::Interaction => GameEvent::Interaction(typed(kind, payload)?),
        })
    }

    pub fn from_envelope(envelope: EventEnvelope) -> Result<Self, EventParseError> {
        Self::parse(&envelope.event, envelope.payload)
    }

    pub fn kind(&self) -> EventKind {
        match self {
            GameEvent::ServerUpdate(_) => EventKind::ServerUpdate,
            GameEvent::Kill(_) => EventKind::Kill,
            GameEvent::Connection(_) => EventKind::Connection,
            GameEvent::AdminCommand(_) => EventKind::AdminCommand,
            GameEvent::Chat(_) => EventKind::Chat,
            GameEvent::Lockpick(_) => EventKind::Lockpick,
            GameEvent::Interaction(_) => EventKind::Interaction,
        }
    }

    pub fn into_write_batch(self) -> WriteBatch {
        match self {
            GameEvent::ServerUpdate(update) => WriteBatch {
                snapshot: Some(update),
                ..WriteBatch::default()
            },
            GameEvent::Kill(event) => {
                // Killer and victim are separate effects even for a self-kill.
                let player_effects = vec![
                    PlayerEffect::kill(event.killer.clone()),
                    PlayerEffect::death(event.victim.clone()),
                ];
                WriteBatch {
                    record: Some(RecordBody::Kill(event)),
                    player_effects,
                    snapshot: None,
                }
            }
            GameEvent::Connection(event) => {
                let effect = match event.accrued_playtime() {
                    Some(seconds) => PlayerEffect::playtime(event.user.clone(), seconds),
                    None => PlayerEffect::sighting(event.user.clone()),
                };
                WriteBatch {
                    record: Some(RecordBody::Connection(event)),
                    player_effects: vec![effect],
                    snapshot: None,
                }
            }
            GameEvent::AdminCommand(event) => append_only(RecordBody::AdminCommand(event)),
            GameEvent::Chat(event) => append_only(RecordBody::Chat(event)),
            GameEvent::Lockpick(event) => append_only(RecordBody::Lockpick(event)),
            GameEvent::Interaction(event) => append_only(RecordBody::Interaction(event)),
        }
    }
}

fn append_only(record: RecordBody) -> WriteBatch {
    WriteBatch {
        record: Some(record),
        ..WriteBatch::default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entities::Player;
    use serde_json::json;

    fn apply(effects: &[PlayerEffect]) -> Vec<Player> {
        let mut players: Vec<Player> = Vec::new();
        for effect in effects {
            let existing = players
                .iter()
                .position(|p| p.steam_id == effect.player.steam_id)
                .map(|idx| players.remove(idx));
            players.push(Player::sighted(existing, effect, 100));
        }
        players
    }

    #[test]
    fn self_kill_counts_kill_and_death() {
        let event = GameEvent::parse(
            "kill-event",
            json!({
                "killer": {"name": "Sam", "steamId": "42"},
                "victim": {"name": "Sam", "steamId": "42"},
                "timestamp": "2024-01-01T00:00:00Z"
            }),
        )
        .expect("parse kill");
        let batch = event.into_write_batch();
        assert!(matches!(batch.record, Some(RecordBody::Kill(_))));

        let players = apply(&batch.player_effects);
        assert_eq!(players.len(), 1);
        assert_eq!(players[0].kill_count, 1);
        assert_eq!(players[0].death_count, 1);
    }

    #[test]
    fn kill_credits_killer_and_victim_separately() {
        let batch = GameEvent::parse(
            "kill-event",
            json!({
                "killer": {"name": "A", "steamId": "1"},
                "victim": {"name": "B", "steamId": "2"},
                "timestamp": "t",
                "distance": "35m"
            }),
        )
        .expect("parse kill")
        .into_write_batch();
        let players = apply(&batch.player_effects);
        let killer = players.iter().find(|p| p.steam_id == "1").expect("killer");
        let victim = players.iter().find(|p| p.steam_id == "2").expect("victim");
        assert_eq!((killer.kill_count, killer.death_count), (1, 0));
        assert_eq!((victim.kill_count, victim.death_count), (0, 1));
    }

    #[test]
    fn non_positive_disconnect_leaves_playtime() {
        for payload in [
            json!({"type": "disconnect", "user": {"name": "A", "steamId": "1"}, "playDuration": 0}),
            json!({"type": "disconnect", "user": {"name": "A", "steamId": "1"}, "playDuration": -5}),
            json!({"type": "disconnect", "user": {"name": "A", "steamId": "1"}}),
        ] {
            let batch = GameEvent::parse("connections", payload)
                .expect("parse connection")
                .into_write_batch();
            assert_eq!(batch.player_effects.len(), 1);
            assert_eq!(batch.player_effects[0].playtime_seconds, 0);
        }

        let batch = GameEvent::parse(
            "connections",
            json!({"type": "disconnect", "user": {"name": "A", "steamId": "1"}, "playDuration": 600}),
        )
        .expect("parse connection")
        .into_write_batch();
        assert_eq!(batch.player_effects[0].playtime_seconds, 600);
    }

    #[test]
    fn unknown_token_is_rejected() {
        let err = GameEvent::parse("teleport-event", json!({})).expect_err("unknown token");
        assert!(matches!(err, EventParseError::UnknownEvent(ref t) if t == "teleport-event"));
    }

    #[test]
    fn wrong_shape_is_invalid_payload() {
        let err = GameEvent::parse(
            "lockpick-event",
            json!({"user": {"name": "A", "steamId": "1"}, "success": "yes"}),
        )
        .expect_err("bad payload");
        assert!(matches!(err, EventParseError::InvalidPayload { kind: EventKind::Lockpick, .. }));

        let err = GameEvent::parse("chat-event", Value::Null).expect_err("missing payload");
        assert!(matches!(err, EventParseError::InvalidPayload { .. }));
    }

    #[test]
    fn append_only_events_touch_no_players() {
        let batch = GameEvent::parse(
            "admin-command-event",
            json!({"user": {"name": "Admin", "steamId": "9"}, "command": "#SetTime 12"}),
        )
        .expect("parse admin")
        .into_write_batch();
        assert!(batch.player_effects.is_empty());
        assert!(batch.snapshot.is_none());
        assert!(batch.record.is_some());
    }

    #[test]
    fn server_update_is_snapshot_only() {
        let batch = GameEvent::parse(
            "server-update",
            json!({"serverSettings": {"name": "Omni"}, "playerList": [], "bounties": []}),
        )
        .expect("parse update")
        .into_write_batch();
        assert!(batch.record.is_none());
        assert_eq!(
            batch.snapshot.map(|s| s.server_settings.name),
            Some(Some("Omni".to_string()))
        );
    }
}
