// Panel kind value object

use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PanelKind {
    Status,
    Bounty,
}

impl PanelKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            PanelKind::Status => "status",
            PanelKind::Bounty => "bounty",
        }
    }

    /// Env var an operator sets to pin the panel message across restarts.
    pub fn message_id_env(&self) -> &'static str {
        match self {
            PanelKind::Status => "SCUM_RELAY_STATUS_MESSAGE_ID",
            PanelKind::Bounty => "SCUM_RELAY_BOUNTY_MESSAGE_ID",
        }
    }

    pub fn placeholder(&self) -> &'static str {
        match self {
            PanelKind::Status => "Initializing server status panel...",
            PanelKind::Bounty => "Initializing bounty status panel...",
        }
    }
}

impl fmt::Display for PanelKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
