// Event record entities
// Append-only, timestamped records, one table per category

use serde::{Deserialize, Serialize};

use crate::entities::PlayerRef;
use crate::value_objects::Category;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct KillEvent {
    pub killer: PlayerRef,
    pub victim: PlayerRef,
    pub timestamp: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub distance: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ConnectionKind {
    Connect,
    Disconnect,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionEvent {
    #[serde(rename = "type")]
    pub kind: ConnectionKind,
    pub user: PlayerRef,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub play_duration: Option<f64>,
}

impl ConnectionEvent {
    /// Whole seconds to add to the player's playtime. Only a disconnect with
    /// a positive, finite duration accrues anything.
    pub fn accrued_playtime(&self) -> Option<u64> {
        if self.kind != ConnectionKind::Disconnect {
            return None;
        }
        match self.play_duration {
            Some(seconds) if seconds.is_finite() && seconds > 0.0 => Some(seconds.floor() as u64),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatUser {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub steam_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ChatEvent {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user: Option<ChatUser>,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub channel: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdminCommandEvent {
    pub user: PlayerRef,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LockpickEvent {
    pub user: PlayerRef,
    pub success: bool,
    pub lockpickable: String,
    pub teleport_cmd: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InteractionEvent {
    #[serde(rename = "type")]
    pub kind: String,
    pub user: PlayerRef,
    pub description: String,
}

/// Body of an event record, one variant per category.
#[derive(Debug, Clone, PartialEq)]
pub enum RecordBody {
    Kill(KillEvent),
    Connection(ConnectionEvent),
    Chat(ChatEvent),
    AdminCommand(AdminCommandEvent),
    Lockpick(LockpickEvent),
    Interaction(InteractionEvent),
}

impl RecordBody {
    pub fn category(&self) -> Category {
        match self {
            RecordBody::Kill(_) => Category::Kills,
            RecordBody::Connection(_) => Category::Connections,
            RecordBody::Chat(_) => Category::ChatLogs,
            RecordBody::AdminCommand(_) => Category::AdminLogs,
            RecordBody::Lockpick(_) => Category::Lockpicking,
            RecordBody::Interaction(_) => Category::Interactions,
        }
    }

    pub fn to_json(&self) -> serde_json::Result<String> {
        match self {
            RecordBody::Kill(event) => serde_json::to_string(event),
            RecordBody::Connection(event) => serde_json::to_string(event),
            RecordBody::Chat(event) => serde_json::to_string(event),
            RecordBody::AdminCommand(event) => serde_json::to_string(event),
            RecordBody::Lockpick(event) => serde_json::to_string(event),
            RecordBody::Interaction(event) => serde_json::to_string(event),
        }
    }

    pub fn from_json(category: Category, payload: &str) -> serde_json::Result<Self> {
        Ok(match category {
            Category::Kills => RecordBody::Kill(serde_json::from_str(payload)?),
            Category::Connections => RecordBody::Connection(serde_json::from_str(payload)?),
            Category::ChatLogs => RecordBody::Chat(serde_json::from_str(payload)?),
            Category::AdminLogs => RecordBody::AdminCommand(serde_json::from_str(payload)?),
            Category::Lockpicking => RecordBody::Lockpick(serde_json::from_str(payload)?),
            Category::Interactions => RecordBody::Interaction(serde_json::from_str(payload)?),
        })
    }
}

/// A stored event record as read back by the feed listener.
#[derive(Debug, Clone, PartialEq)]
pub struct FeedRecord {
    pub id: String,
    pub created_at: i64,
    pub body: RecordBody,
}

impl FeedRecord {
    pub fn category(&self) -> Category {
        self.body.category()
    }

    /// Creation stamp for the next record of a category. Stays strictly above
    /// the previous stamp, so `(created_at, id)` grows in commit order even
    /// when the wall clock does not.
    pub fn next_created_at(previous: Option<i64>, now_ms: i64) -> i64 {
        match previous {
            Some(last) if last >= now_ms => last.saturating_add(1),
            _ => now_ms,
        }
    }
}
