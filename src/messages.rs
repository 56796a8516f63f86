//! Player-facing outcome messages.
//!
//! Templates are plain strings with `{placeholder}` slots. Colour/markup
//! handling belongs to whatever delivers the text, not to this crate.

use serde::{Deserialize, Serialize};

use crate::types::PlayerId;

// ---------------------------------------------------------------------------
// Recipients
// ---------------------------------------------------------------------------

/// Whoever issued a command and receives its feedback.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CommandSender {
    Player(PlayerId),
    Console,
}

impl CommandSender {
    pub fn player(&self) -> Option<&PlayerId> {
        match self {
            CommandSender::Player(id) => Some(id),
            CommandSender::Console => None,
        }
    }
}

impl std::fmt::Display for CommandSender {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CommandSender::Player(id) => write!(f, "{id}"),
            CommandSender::Console => f.write_str("console"),
        }
    }
}

/// Delivery of rendered messages. May be called from any thread.
pub trait MessageSink: Send + Sync {
    fn send(&self, to: &CommandSender, text: &str);
}

// ---------------------------------------------------------------------------
// Templates
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    CooldownBlocked,
    WarmupStarted,
    WarmupCancelled,
    Searching,
    NoSafeSpot,
    Teleported,
    TeleportedOther,
    NoPermission,
    NoPermissionOther,
    NoWorld,
    TargetNotFound,
    GenericError,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct MessageTemplates {
    /// `{time}`
    pub cooldown: String,
    /// `{time}` (warmup seconds)
    pub warmup_started: String,
    pub warmup_cancelled: String,
    /// `{attempt}`, `{max}`
    pub searching: String,
    pub no_safe_spot: String,
    /// `{x}`, `{y}`, `{z}`, `{distance}`
    pub teleported: String,
    /// `{player}`, `{x}`, `{y}`, `{z}`, `{distance}`
    pub teleported_other: String,
    pub no_permission: String,
    pub no_permission_other: String,
    pub no_world: String,
    /// `{player}`
    pub target_not_found: String,
    pub error: String,
}

impl Default for MessageTemplates {
    fn default() -> Self {
        Self {
            cooldown: "You must wait {time} before using /rtp again!".into(),
            warmup_started: "Teleporting in {time} seconds... Don't move!".into(),
            warmup_cancelled: "Teleportation cancelled! You moved too much.".into(),
            searching: "Searching for a safe location ({attempt}/{max})...".into(),
            no_safe_spot: "Could not find a safe location. Please try again.".into(),
            teleported: "Teleported to X: {x}, Y: {y}, Z: {z} ({distance} blocks from spawn)"
                .into(),
            teleported_other:
                "Teleported {player} to X: {x}, Y: {y}, Z: {z} ({distance} blocks from spawn)"
                    .into(),
            no_permission: "You don't have permission to do that.".into(),
            no_permission_other: "You don't have permission to teleport other players.".into(),
            no_world: "You must be in a world to use this command!".into(),
            target_not_found: "Player {player} is not online.".into(),
            error: "Something went wrong while teleporting.".into(),
        }
    }
}

impl MessageTemplates {
    pub fn template(&self, kind: MessageKind) -> &str {
        match kind {
            MessageKind::CooldownBlocked => &self.cooldown,
            MessageKind::WarmupStarted => &self.warmup_started,
            MessageKind::WarmupCancelled => &self.warmup_cancelled,
            MessageKind::Searching => &self.searching,
            MessageKind::NoSafeSpot => &self.no_safe_spot,
            MessageKind::Teleported => &self.teleported,
            MessageKind::TeleportedOther => &self.teleported_other,
            MessageKind::NoPermission => &self.no_permission,
            MessageKind::NoPermissionOther => &self.no_permission_other,
            MessageKind::NoWorld => &self.no_world,
            MessageKind::TargetNotFound => &self.target_not_found,
            MessageKind::GenericError => &self.error,
        }
    }

    /// Fill `{key}` slots of the template for `kind`. Unknown slots are left
    /// untouched.
    pub fn render(&self, kind: MessageKind, values: &[(&str, String)]) -> String {
        let mut text = self.template(kind).to_string();
        for (key, value) in values {
            text = text.replace(&format!("{{{key}}}"), value);
        }
        text
    }
}

/// Human-readable remaining time, e.g. `1 hour 2 minutes`, `3 minutes 5 seconds`.
pub fn format_remaining(millis: u64) -> String {
    fn unit(n: u64, name: &str) -> String {
        format!("{n} {name}{}", if n == 1 { "" } else { "s" })
    }

    let seconds = millis / 1000;
    let hours = seconds / 3600;
    let minutes = (seconds / 60) % 60;
    let seconds = seconds % 60;

    if hours > 0 {
        format!("{} {}", unit(hours, "hour"), unit(minutes, "minute"))
    } else if minutes > 0 {
        format!("{} {}", unit(minutes, "minute"), unit(seconds, "second"))
    } else {
        unit(seconds, "second")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn render_fills_every_placeholder() {
        let t = MessageTemplates::default();
        let text = t.render(
            MessageKind::Teleported,
            &[
                ("x", "10".into()),
                ("y", "65".into()),
                ("z", "-3".into()),
                ("distance", "5001".into()),
            ],
        );
        assert_eq!(text, "Teleported to X: 10, Y: 65, Z: -3 (5001 blocks from spawn)");
    }

    #[test]
    fn render_leaves_unknown_slots() {
        let t = MessageTemplates {
            searching: "{attempt} of {max} {other}".into(),
            ..Default::default()
        };
        let text = t.render(
            MessageKind::Searching,
            &[("attempt", "1".into()), ("max", "5".into())],
        );
        assert_eq!(text, "1 of 5 {other}");
    }

    #[test]
    fn format_remaining_picks_largest_units() {
        assert_eq!(format_remaining(3_590_000), "59 minutes 50 seconds");
        assert_eq!(format_remaining(3_600_000), "1 hour 0 minutes");
        assert_eq!(format_remaining(7_260_000), "2 hours 1 minute");
        assert_eq!(format_remaining(61_000), "1 minute 1 second");
        assert_eq!(format_remaining(999), "0 seconds");
    }
}
