// Game command entity
// Transient operator command, queued in memory until the agent drains it

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum GameCommand {
    Announce { message: String },
}

impl GameCommand {
    pub fn announce(message: impl Into<String>) -> Self {
        GameCommand::Announce {
            message: message.into(),
        }
    }

    pub fn is_blank(&self) -> bool {
        match self {
            GameCommand::Announce { message } => message.trim().is_empty(),
        }
    }
}
