// Event kind value object
// Closed set of event-type tokens accepted by the ingestion gateway

use std::fmt;

use crate::value_objects::Category;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EventKind {
    ServerUpdate,
    Kill,
    Connection,
    AdminCommand,
    Chat,
    Lockpick,
    Interaction,
}

impl EventKind {
    pub const ALL: [EventKind; 7] = [
        EventKind::ServerUpdate,
        EventKind::Kill,
        EventKind::Connection,
        EventKind::AdminCommand,
        EventKind::Chat,
        EventKind::Lockpick,
        EventKind::Interaction,
    ];

    pub fn as_token(&self) -> &'static str {
        match self {
            EventKind::ServerUpdate => "server-update",
            EventKind::Kill => "kill-event",
            EventKind::Connection => "connections",
            EventKind::AdminCommand => "admin-command-event",
            EventKind::Chat => "chat-event",
            EventKind::Lockpick => "lockpick-event",
            EventKind::Interaction => "interaction-event",
        }
    }

    /// Exact token match; unknown tokens are rejected by the caller.
    pub fn from_token(token: &str) -> Option<Self> {
        EventKind::ALL
            .into_iter()
            .find(|kind| kind.as_token() == token)
    }

    /// Event table written by this kind, `None` for the snapshot write.
    pub fn category(&self) -> Option<Category> {
        match self {
            EventKind::ServerUpdate => None,
            EventKind::Kill => Some(Category::Kills),
            EventKind::Connection => Some(Category::Connections),
            EventKind::AdminCommand => Some(Category::AdminLogs),
            EventKind::Chat => Some(Category::ChatLogs),
            EventKind::Lockpick => Some(Category::Lockpicking),
            EventKind::Interaction => Some(Category::Interactions),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_token())
    }
}
