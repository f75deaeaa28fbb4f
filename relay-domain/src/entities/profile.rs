// Player profile from the identity lookup service

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlayerProfile {
    pub steam_id: String,
    pub persona_name: String,
    pub profile_url: String,
    pub avatar_url: Option<String>,
    pub country_code: Option<String>,
}

pub fn steam_profile_url(steam_id: &str) -> String {
    format!("https://steamcommunity.com/profiles/{}", steam_id)
}
