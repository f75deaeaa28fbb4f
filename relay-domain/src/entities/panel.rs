// Panel and feed channel bindings

use crate::value_objects::{Category, PanelKind};

/// Binds one panel to its channel and, once known, its live message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelBinding {
    pub kind: PanelKind,
    pub channel_id: String,
    pub message_id: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FeedChannel {
    pub category: Category,
    pub channel_id: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PanelLinks {
    pub play_url: String,
    pub rules_url: String,
}

impl Default for PanelLinks {
    fn default() -> Self {
        Self {
            play_url: "https://play.omniscum.com".to_string(),
            rules_url: "https://omniscum.com/rules".to_string(),
        }
    }
}
