// Record category value object
// One category per append-only event table

use std::fmt;

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    Kills,
    Connections,
    ChatLogs,
    AdminLogs,
    Lockpicking,
    Interactions,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Category::Kills,
        Category::Connections,
        Category::ChatLogs,
        Category::AdminLogs,
        Category::Lockpicking,
        Category::Interactions,
    ];

    /// Table name in the store.
    pub fn as_str(&self) -> &'static str {
        match self {
            Category::Kills => "kills",
            Category::Connections => "connections",
            Category::ChatLogs => "chat_logs",
            Category::AdminLogs => "admin_logs",
            Category::Lockpicking => "lockpicking",
            Category::Interactions => "interactions",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        let normalized = value.trim().to_lowercase();
        Category::ALL
            .into_iter()
            .find(|category| category.as_str() == normalized)
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
