// Pure panel renderers: (snapshot | absent, now) -> message description

use relay_domain::{
    format_thousands, millis_to_rfc3339, steam_profile_url, ActionRow, Bounty, BountyReward, Embed,
    LinkButton, OutgoingMessage, PanelKind, PanelLinks, ServerSnapshot, COLOR_BRIGHT_GREEN,
    COLOR_BRIGHT_RED, COLOR_GREEN, COLOR_GREY, COLOR_RED,
};

const FIELD_VALUE_LIMIT: usize = 1024;
const DESCRIPTION_LIMIT: usize = 4096;

/// Which variant a panel shows. Liveness and data recency are separate:
/// an offline panel still carries the last snapshot it saw.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presentation {
    AwaitingFirstUpdate,
    Online,
    Offline,
}

impl Presentation {
    pub fn classify(snapshot: Option<&ServerSnapshot>, now_ms: i64) -> Self {
        match snapshot {
            None => Presentation::AwaitingFirstUpdate,
            Some(snapshot) if snapshot.is_online(now_ms) => Presentation::Online,
            Some(_) => Presentation::Offline,
        }
    }
}

pub fn render_panel(
    kind: PanelKind,
    snapshot: Option<&ServerSnapshot>,
    now_ms: i64,
    links: &PanelLinks,
) -> OutgoingMessage {
    match kind {
        PanelKind::Status => render_status_panel(snapshot, now_ms, links),
        PanelKind::Bounty => render_bounty_panel(snapshot, now_ms),
    }
}

/// `N/A`, `1 minute`, or `2 days, 3 hours, 1 minute`.
pub fn format_uptime(total_seconds: f64) -> String {
    if !total_seconds.is_finite() || total_seconds <= 0.0 {
        return "N/A".to_string();
    }
    if total_seconds < 60.0 {
        return "1 minute".to_string();
    }
    let total = total_seconds.floor() as u64;
    let days = total / 86_400;
    let hours = (total % 86_400) / 3_600;
    let minutes = (total % 3_600) / 60;

    let mut parts = Vec::new();
    if days > 0 {
        parts.push(plural(days, "day"));
    }
    if hours > 0 {
        parts.push(plural(hours, "hour"));
    }
    if minutes > 0 || parts.is_empty() {
        parts.push(plural(minutes, "minute"));
    }
    parts.join(", ")
}

fn plural(count: u64, unit: &str) -> String {
    if count == 1 {
        format!("{count} {unit}")
    } else {
        format!("{count} {unit}s")
    }
}

pub fn format_bounty_reward(rewards: &BountyReward) -> String {
    let mut parts = Vec::new();
    if rewards.cash > 0 {
        parts.push(format!("${}", format_thousands(rewards.cash)));
    }
    if rewards.gold > 0 {
        parts.push(format!("{} Gold", format_thousands(rewards.gold)));
    }
    if rewards.fame > 0 {
        parts.push(format!("{} FP", format_thousands(rewards.fame)));
    }
    if parts.is_empty() {
        return "No Reward".to_string();
    }
    parts.join(" | ")
}

pub fn bounty_location(bounty: &Bounty) -> Option<String> {
    let sector = non_blank(bounty.last_seen_sector.as_deref());
    let keypad = non_blank(bounty.last_seen_keypad.as_deref()).map(|keypad| format!("K{keypad}"));
    let parts: Vec<String> = sector
        .map(str::to_string)
        .into_iter()
        .chain(keypad)
        .collect();
    if parts.is_empty() {
        return None;
    }
    Some(format!("📍[{}]", parts.join(", ")))
}

pub fn format_bounty_line(bounty: &Bounty) -> String {
    let target = format!(
        "🎯 [{}]({})",
        bounty.target_name,
        steam_profile_url(&bounty.target_user_id)
    );
    let mut details = vec![format_bounty_reward(&bounty.rewards)];
    details.extend(bounty_location(bounty));
    format!("{} - {}", target, details.join(" | "))
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|value| !value.is_empty())
}

/// Joins lines until `limit`, then summarises the rest.
fn join_limited(lines: &[String], limit: usize) -> String {
    let more = |count: usize| format!("… and {count} more");
    let mut out = String::new();
    for (idx, line) in lines.iter().enumerate() {
        let separator = usize::from(!out.is_empty());
        let left_after = lines.len() - idx - 1;
        let reserve = if left_after > 0 { more(left_after).len() + 1 } else { 0 };
        if out.len() + separator + line.len() + reserve > limit {
            if !out.is_empty() {
                out.push('\n');
            }
            out.push_str(&more(lines.len() - idx));
            return out;
        }
        if separator == 1 {
            out.push('\n');
        }
        out.push_str(line);
    }
    out
}

pub fn render_status_panel(
    snapshot: Option<&ServerSnapshot>,
    now_ms: i64,
    links: &PanelLinks,
) -> OutgoingMessage {
    let presentation = Presentation::classify(snapshot, now_ms);
    let play = LinkButton::new("Play Now", links.play_url.clone(), "🎮")
        .disabled(presentation != Presentation::Online);
    let rules = LinkButton::new("Server Rules", links.rules_url.clone(), "📝");
    let components = vec![ActionRow::new(vec![play, rules])];

    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            let embed = Embed::new()
                .color(COLOR_GREY)
                .title("⏳ Server Status: Awaiting First Update")
                .description("The bot is awaiting the first status update from the server.")
                .timestamp(millis_to_rfc3339(now_ms));
            return OutgoingMessage {
                content: String::new(),
                embeds: vec![embed],
                components,
            };
        }
    };

    let settings = &snapshot.state.server_settings;
    let name = non_blank(settings.name.as_deref()).unwrap_or("SCUM Server");
    let description = non_blank(settings.description.as_deref()).unwrap_or("No description.");
    let playstyle = non_blank(settings.playstyle.as_deref()).unwrap_or("N/A");
    let version = non_blank(settings.game_version.as_deref()).unwrap_or("N/A");
    let max_players = settings.max_players.unwrap_or(0);
    let online_players = snapshot.state.player_list.len();

    let player_lines: Vec<String> = snapshot
        .state
        .player_list
        .iter()
        .map(|player| format!("- [{}]({})", player.name, steam_profile_url(&player.steam_id)))
        .collect();
    let player_list = if player_lines.is_empty() {
        "No players online.".to_string()
    } else {
        join_limited(&player_lines, FIELD_VALUE_LIMIT)
    };

    let embed = Embed::new()
        .title(format!("💀 {name}"))
        .description(description)
        .timestamp(millis_to_rfc3339(now_ms));

    let embed = if presentation == Presentation::Online {
        let uptime = format_uptime(settings.uptime.unwrap_or(0.0));
        embed
            .color(COLOR_GREEN)
            .footer(format!("⏰ Uptime: {uptime} | 🔧 Server Version: v{version}"))
            .field("🎯 Playstyle", playstyle, true)
            .field("👤 Player Count", format!("{online_players} / {max_players}"), true)
            .field("🖥️ Server Status", "🟢 Online", true)
            .field("👥 Online Players", player_list, false)
    } else {
        embed
            .color(COLOR_RED)
            .footer(format!("⏰ Uptime: N/A | 🔧 Server Version: v{version}"))
            .field("🎯 Playstyle", playstyle, true)
            .field(
                "👤 Player Count",
                format!("Last Known: {online_players} / {max_players}"),
                true,
            )
            .field("🖥️ Server Status", "🔴 Offline", true)
            .field("👥 Last Seen Players", player_list, false)
            .field("📡 Last Update", format!("<t:{}:R>", snapshot.updated_at / 1000), false)
    };

    OutgoingMessage {
        content: String::new(),
        embeds: vec![embed],
        components,
    }
}

pub fn render_bounty_panel(snapshot: Option<&ServerSnapshot>, now_ms: i64) -> OutgoingMessage {
    let presentation = Presentation::classify(snapshot, now_ms);
    let embed = Embed::new()
        .title("💀 Active Server Bounties")
        .timestamp(millis_to_rfc3339(now_ms));

    let snapshot = match snapshot {
        Some(snapshot) => snapshot,
        None => {
            return OutgoingMessage::embed(
                embed
                    .color(COLOR_BRIGHT_RED)
                    .description("The bot is awaiting the first bounty update from the server."),
            );
        }
    };

    let lines: Vec<String> = snapshot.state.bounties.iter().map(format_bounty_line).collect();
    let description = match (presentation, lines.is_empty()) {
        (Presentation::Online, true) => "There are no active bounties on the server.".to_string(),
        (Presentation::Online, false) => join_limited(&lines, DESCRIPTION_LIMIT),
        (_, true) => "The server is currently offline. No bounty data is available.".to_string(),
        (_, false) => {
            let header = "🔴 The server is currently offline. Last known bounties:";
            let body = join_limited(&lines, DESCRIPTION_LIMIT - header.len() - 1);
            format!("{header}\n{body}")
        }
    };
    let color = if presentation == Presentation::Online {
        COLOR_BRIGHT_GREEN
    } else {
        COLOR_BRIGHT_RED
    };

    OutgoingMessage::embed(embed.color(color).description(description))
}
