// Feed presenters: one message per stored event record

use relay_domain::{
    millis_to_rfc3339, steam_profile_url, AdminCommandEvent, ChatEvent, ConnectionEvent,
    ConnectionKind, Embed, FeedRecord, InteractionEvent, KillEvent, LockpickEvent, OutgoingMessage,
    PlayerProfile, PlayerRef, RecordBody,
};

use crate::panels::render::format_uptime;

pub const MESSAGE_LIMIT: usize = 2000;

const COLOR_JOIN: u32 = 0x4CAF50;
const COLOR_LEAVE: u32 = 0xAF4C50;

/// Interaction types with a dedicated embed style.
const INTERACTION_STYLES: [(&str, &str, u32); 8] = [
    ("cooking", "🍳 Cooking Activity", 0xF1C40F),
    ("world", "🌍 World Interaction", 0x2ECC71),
    ("base_building", "🏚️ Base Building", 0xE67E22),
    ("inventory", "📦 Inventory Action", 0x95A5A6),
    ("squad", "🛡️ Squad Management", 0x3498DB),
    ("combat", "⚔️ Combat Action", 0xE74C3C),
    ("misc", "✨ Miscellaneous", 0x9B59B6),
    ("economy", "💰 Economy", 0x27AE60),
];

/// Whether the presenter for this record wants a profile lookup.
pub fn profile_subject(record: &FeedRecord) -> Option<&str> {
    match &record.body {
        RecordBody::Connection(event) => Some(event.user.steam_id.as_str()),
        RecordBody::Lockpick(event) => Some(event.user.steam_id.as_str()),
        RecordBody::Interaction(event) => Some(event.user.steam_id.as_str()),
        _ => None,
    }
}

pub fn render_record(record: &FeedRecord, profile: Option<&PlayerProfile>) -> OutgoingMessage {
    let timestamp = millis_to_rfc3339(record.created_at);
    match &record.body {
        RecordBody::Kill(event) => OutgoingMessage::text(kill_line(event)),
        RecordBody::Connection(event) => {
            OutgoingMessage::embed(connection_embed(event, profile).timestamp(timestamp))
        }
        RecordBody::Chat(event) => OutgoingMessage::text(chat_line(event)),
        RecordBody::AdminCommand(event) => OutgoingMessage::text(admin_line(event)),
        RecordBody::Lockpick(event) => {
            OutgoingMessage::embed(lockpick_embed(event, profile).timestamp(timestamp))
        }
        RecordBody::Interaction(event) => {
            OutgoingMessage::embed(interaction_embed(event, profile).timestamp(timestamp))
        }
    }
}

/// Escapes the platform's inline markdown characters.
pub fn escape_markdown(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for ch in text.chars() {
        if matches!(ch, '\\' | '*' | '_' | '`' | '~' | '|') {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Breaks mentions with a zero-width space and escapes markdown.
pub fn sanitize_chat(text: &str) -> String {
    escape_markdown(&text.replace('@', "@\u{200b}"))
}

fn truncate_chars(text: String, limit: usize) -> String {
    if text.chars().count() <= limit {
        return text;
    }
    text.chars().take(limit).collect()
}

pub fn kill_line(event: &KillEvent) -> String {
    let killer = &event.killer;
    let victim = &event.victim;
    let line = if killer.steam_id == victim.steam_id {
        format!(
            "💀 {} **{}** ({}) killed themselves",
            event.timestamp,
            escape_markdown(&killer.name),
            killer.steam_id
        )
    } else {
        let mut line = format!(
            "💀 {} **{}** ({}) killed **{}** ({})",
            event.timestamp,
            escape_markdown(&killer.name),
            killer.steam_id,
            escape_markdown(&victim.name),
            victim.steam_id
        );
        if let Some(distance) = event.distance.as_deref().filter(|d| !d.trim().is_empty()) {
            line.push_str(&format!(" from {}m", distance.trim()));
        }
        line
    };
    truncate_chars(line, MESSAGE_LIMIT)
}

pub fn chat_line(event: &ChatEvent) -> String {
    let mut parts = Vec::new();
    if let Some(timestamp) = &event.timestamp {
        parts.push(timestamp.clone());
    }
    if let Some(channel) = &event.channel {
        parts.push(format!("[{channel}]"));
    }
    if let Some(user) = &event.user {
        let name = escape_markdown(user.name.as_deref().unwrap_or("Unknown"));
        match &user.steam_id {
            Some(steam_id) => parts.push(format!("**{name}** ({steam_id})")),
            None => parts.push(format!("**{name}**")),
        }
    }
    let line = format!("{}: {}", parts.join(" "), sanitize_chat(&event.message));
    truncate_chars(line, MESSAGE_LIMIT)
}

pub fn admin_line(event: &AdminCommandEvent) -> String {
    let prefix = event
        .timestamp
        .as_deref()
        .map(|timestamp| format!("{timestamp} "))
        .unwrap_or_default();
    let line = format!(
        "{}**{}** ({}): `#{}`",
        prefix,
        escape_markdown(&event.user.name),
        event.user.steam_id,
        event.command.replace('`', "'")
    );
    truncate_chars(line, MESSAGE_LIMIT)
}

fn display_identity(user: &PlayerRef, profile: Option<&PlayerProfile>) -> (String, String) {
    match profile {
        Some(profile) => (profile.persona_name.clone(), profile.profile_url.clone()),
        None => (user.name.clone(), steam_profile_url(&user.steam_id)),
    }
}

fn with_author(embed: Embed, user: &PlayerRef, profile: Option<&PlayerProfile>) -> Embed {
    match profile {
        Some(profile) => embed.author(
            profile.persona_name.clone(),
            Some(profile.profile_url.clone()),
            profile.avatar_url.clone(),
        ),
        None => embed.author(user.name.clone(), None, None),
    }
}

pub fn connection_embed(event: &ConnectionEvent, profile: Option<&PlayerProfile>) -> Embed {
    let (display_name, profile_url) = display_identity(&event.user, profile);
    let mut embed = Embed::new().author(
        display_name.clone(),
        Some(profile_url.clone()),
        profile.and_then(|p| p.avatar_url.clone()),
    );
    if let Some(avatar) = profile.and_then(|p| p.avatar_url.clone()) {
        embed = embed.thumbnail(avatar);
    }

    match event.kind {
        ConnectionKind::Connect => {
            embed = embed
                .title("Player Connected")
                .color(COLOR_JOIN)
                .description(format!("**[{display_name}]({profile_url})** has joined the server."));
            if let Some(country) = profile.and_then(|p| p.country_code.as_deref()) {
                embed = embed.field("Country", format!(":flag_{}:", country.to_lowercase()), true);
            }
        }
        ConnectionKind::Disconnect => {
            embed = embed
                .title("Player Disconnected")
                .color(COLOR_LEAVE)
                .description(format!("**[{display_name}]({profile_url})** has left the server."));
            if let Some(duration) = event.play_duration {
                embed = embed.field("Play Time", format_uptime(duration), true);
            }
        }
    }
    embed
}

pub fn lockpick_embed(event: &LockpickEvent, profile: Option<&PlayerProfile>) -> Embed {
    let (_, profile_url) = display_identity(&event.user, profile);
    let (color, outcome) = if event.success {
        (COLOR_JOIN, "🔓 Success")
    } else {
        (COLOR_LEAVE, "🔒 Failure")
    };
    with_author(Embed::new(), &event.user, profile)
        .title("🔐 Lockpicking")
        .color(color)
        .field("Player", format!("[{}]({})", event.user.name, profile_url), false)
        .field("Target", event.lockpickable.clone(), true)
        .field("Outcome", outcome, true)
        .field("Location (Copy/Paste)", format!("`{}`", event.teleport_cmd), false)
}

pub fn interaction_embed(event: &InteractionEvent, profile: Option<&PlayerProfile>) -> Embed {
    let embed = with_author(Embed::new(), &event.user, profile).description(event.description.clone());
    match INTERACTION_STYLES
        .iter()
        .find(|(kind, _, _)| *kind == event.kind)
    {
        Some((_, title, color)) => embed.title(*title).color(*color),
        None => embed.title("⚙️ General Interaction"),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use relay_domain::ChatUser;

    fn player(name: &str, id: &str) -> PlayerRef {
        PlayerRef {
            name: name.to_string(),
            steam_id: id.to_string(),
        }
    }

    fn profile() -> PlayerProfile {
        PlayerProfile {
            steam_id: "1".to_string(),
            persona_name: "Persona".to_string(),
            profile_url: "https://steamcommunity.com/id/persona".to_string(),
            avatar_url: Some("https://avatars/p.jpg".to_string()),
            country_code: Some("DE".to_string()),
        }
    }

    #[test]
    fn kill_lines() {
        let kill = KillEvent {
            killer: player("A", "1"),
            victim: player("B", "2"),
            timestamp: "12:00".to_string(),
            distance: Some("40".to_string()),
        };
        assert_eq!(kill_line(&kill), "💀 12:00 **A** (1) killed **B** (2) from 40m");

        let suicide = KillEvent {
            victim: player("A", "1"),
            distance: None,
            ..kill
        };
        assert_eq!(kill_line(&suicide), "💀 12:00 **A** (1) killed themselves");
    }

    #[test]
    fn chat_is_sanitized_and_truncated() {
        let event = ChatEvent {
            user: Some(ChatUser {
                name: Some("b_ob".to_string()),
                steam_id: Some("7".to_string()),
            }),
            message: "@everyone *bold*".to_string(),
            channel: Some("Global".to_string()),
            timestamp: Some("10:00".to_string()),
        };
        assert_eq!(
            chat_line(&event),
            "10:00 [Global] **b\\_ob** (7): @\u{200b}everyone \\*bold\\*"
        );

        let long = ChatEvent {
            user: None,
            message: "x".repeat(5000),
            channel: None,
            timestamp: None,
        };
        assert_eq!(chat_line(&long).chars().count(), MESSAGE_LIMIT);
    }

    #[test]
    fn admin_line_shape() {
        let event = AdminCommandEvent {
            user: player("Admin", "9"),
            command: "SetWeather 1".to_string(),
            timestamp: Some("08:15".to_string()),
        };
        assert_eq!(admin_line(&event), "08:15 **Admin** (9): `#SetWeather 1`");
    }

    #[test]
    fn connect_embed_uses_profile() {
        let event = ConnectionEvent {
            kind: ConnectionKind::Connect,
            user: player("InGame", "1"),
            play_duration: None,
        };
        let embed = connection_embed(&event, Some(&profile()));
        assert_eq!(embed.title.as_deref(), Some("Player Connected"));
        assert_eq!(embed.field_value("Country"), Some(":flag_de:"));
        assert_eq!(embed.thumbnail.map(|t| t.url).as_deref(), Some("https://avatars/p.jpg"));
        assert!(embed.description.unwrap_or_default().contains("Persona"));
    }

    #[test]
    fn disconnect_embed_without_profile_falls_back() {
        let event = ConnectionEvent {
            kind: ConnectionKind::Disconnect,
            user: player("InGame", "1"),
            play_duration: Some(3_700.0),
        };
        let embed = connection_embed(&event, None);
        assert_eq!(embed.title.as_deref(), Some("Player Disconnected"));
        assert_eq!(embed.field_value("Play Time"), Some("1 hour, 1 minute"));
        assert_eq!(
            embed.author.and_then(|a| a.url).as_deref(),
            Some("https://steamcommunity.com/profiles/1")
        );
    }

    #[test]
    fn interaction_styles() {
        let known = InteractionEvent {
            kind: "cooking".to_string(),
            user: player("Chef", "3"),
            description: "Cooked a steak".to_string(),
        };
        let embed = interaction_embed(&known, None);
        assert_eq!(embed.title.as_deref(), Some("🍳 Cooking Activity"));
        assert_eq!(embed.color, Some(0xF1C40F));

        let unknown = InteractionEvent {
            kind: "fishing".to_string(),
            ..known
        };
        let embed = interaction_embed(&unknown, None);
        assert_eq!(embed.title.as_deref(), Some("⚙️ General Interaction"));
        assert_eq!(embed.color, None);
    }

    #[test]
    fn lockpick_embed_fields() {
        let event = LockpickEvent {
            user: player("Thief", "5"),
            success: false,
            lockpickable: "Advanced Lock".to_string(),
            teleport_cmd: "#Teleport 1 2 3".to_string(),
        };
        let embed = lockpick_embed(&event, None);
        assert_eq!(embed.field_value("Outcome"), Some("🔒 Failure"));
        assert_eq!(embed.field_value("Location (Copy/Paste)"), Some("`#Teleport 1 2 3`"));
        assert_eq!(embed.author.map(|a| a.name).as_deref(), Some("Thief"));
    }
}
