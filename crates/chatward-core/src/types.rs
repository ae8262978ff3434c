//! Core types for chatward

use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fmt;
use std::str::FromStr;

/// Rule category, one per rule file
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Category {
    /// Rules applied to every chat message, command and sign
    Global,
    /// Rules applied to outgoing chat packets
    Packet,
    /// Rules applied to chat messages only
    Chat,
    /// Rules applied to commands only
    Command,
    /// Rules applied to sign text only
    Sign,
}

impl Category {
    /// All categories in load order
    pub const ALL: [Category; 5] = [
        Category::Global,
        Category::Chat,
        Category::Command,
        Category::Sign,
        Category::Packet,
    ];

    /// Name of the rule file holding this category
    pub fn file_name(&self) -> &'static str {
        match self {
            Self::Global => "rules.txt",
            Self::Packet => "packets.txt",
            Self::Chat => "chat.txt",
            Self::Command => "commands.txt",
            Self::Sign => "sign.txt",
        }
    }

    /// Whether rules may reference this category with `ignore event`
    pub fn can_be_ignored(&self) -> bool {
        self.event_kind().is_some()
    }

    /// The event kind backing this category, if any
    pub fn event_kind(&self) -> Option<EventKind> {
        match self {
            Self::Chat => Some(EventKind::Chat),
            Self::Command => Some(EventKind::Command),
            Self::Sign => Some(EventKind::Sign),
            Self::Global | Self::Packet => None,
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::Global => "GLOBAL",
            Self::Packet => "PACKET",
            Self::Chat => "CHAT",
            Self::Command => "COMMAND",
            Self::Sign => "SIGN",
        };
        f.write_str(name)
    }
}

/// Kind of player action that can be evaluated against category rules
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventKind {
    Chat,
    Command,
    Sign,
}

impl EventKind {
    /// The category whose rules run after the global pass
    pub fn category(&self) -> Category {
        match self {
            Self::Chat => Category::Chat,
            Self::Command => Category::Command,
            Self::Sign => Category::Sign,
        }
    }
}

impl FromStr for EventKind {
    type Err = String;

    /// Parses the value of an `ignore event` directive
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace(' ', "").as_str() {
            "chat" => Ok(Self::Chat),
            "command" | "commands" => Ok(Self::Command),
            "sign" | "signs" => Ok(Self::Sign),
            _ => Err(format!(
                "unknown event '{}', valid: chat, command, sign",
                s
            )),
        }
    }
}

impl fmt::Display for EventKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.category().fmt(f)
    }
}

/// Game mode of an actor
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum GameMode {
    Survival,
    Creative,
    Adventure,
    Spectator,
}

impl GameMode {
    /// Look up a game mode by its numeric id
    pub fn from_id(id: u8) -> Option<Self> {
        match id {
            0 => Some(Self::Survival),
            1 => Some(Self::Creative),
            2 => Some(Self::Adventure),
            3 => Some(Self::Spectator),
            _ => None,
        }
    }
}

impl FromStr for GameMode {
    type Err = String;

    /// Accepts either the numeric id or the case-insensitive name
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();

        if let Ok(id) = raw.parse::<u8>() {
            return Self::from_id(id).ok_or_else(|| format!("unknown gamemode id {}", id));
        }

        match raw.to_uppercase().as_str() {
            "SURVIVAL" => Ok(Self::Survival),
            "CREATIVE" => Ok(Self::Creative),
            "ADVENTURE" => Ok(Self::Adventure),
            "SPECTATOR" => Ok(Self::Spectator),
            _ => Err(format!("unknown gamemode '{}'", raw)),
        }
    }
}

/// A block position, used to describe where a sign was placed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Location {
    pub world: String,
    pub x: i64,
    pub y: i64,
    pub z: i64,
}

impl Location {
    pub fn new(world: impl Into<String>, x: i64, y: i64, z: i64) -> Self {
        Self {
            world: world.into(),
            x,
            y,
            z,
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} x:{} y:{} z:{}", self.world, self.x, self.y, self.z)
    }
}

/// The actor whose text is being evaluated
///
/// Collaborators build one per event from the host runtime's player object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Actor {
    /// Player name
    pub name: String,

    /// Granted permission nodes
    #[serde(default)]
    pub permissions: HashSet<String>,

    /// Name of the world the actor is in
    pub world: String,

    /// Current game mode
    pub game_mode: GameMode,

    /// Position of the block being edited (signs only)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub location: Option<Location>,
}

impl Actor {
    /// Create an actor in survival mode without permissions
    pub fn new(name: impl Into<String>, world: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            permissions: HashSet::new(),
            world: world.into(),
            game_mode: GameMode::Survival,
            location: None,
        }
    }

    /// Grant a permission node
    pub fn with_permission(mut self, permission: impl Into<String>) -> Self {
        self.permissions.insert(permission.into());
        self
    }

    /// Set the game mode
    pub fn with_game_mode(mut self, game_mode: GameMode) -> Self {
        self.game_mode = game_mode;
        self
    }

    /// Set the location of the edited block
    pub fn with_location(mut self, location: Location) -> Self {
        self.location = Some(location);
        self
    }

    /// Check whether the actor holds a permission node
    pub fn has_permission(&self, permission: &str) -> bool {
        self.permissions.contains(permission)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_category_files() {
        assert_eq!(Category::Global.file_name(), "rules.txt");
        assert_eq!(Category::Packet.file_name(), "packets.txt");
        assert!(!Category::Global.can_be_ignored());
        assert!(!Category::Packet.can_be_ignored());
        assert!(Category::Sign.can_be_ignored());
    }

    #[test]
    fn test_event_kind_parsing() {
        assert_eq!("chat".parse::<EventKind>().unwrap(), EventKind::Chat);
        assert_eq!("Commands".parse::<EventKind>().unwrap(), EventKind::Command);
        assert_eq!("signs".parse::<EventKind>().unwrap(), EventKind::Sign);
        assert!("global".parse::<EventKind>().is_err());
    }

    #[test]
    fn test_game_mode_parsing() {
        assert_eq!("1".parse::<GameMode>().unwrap(), GameMode::Creative);
        assert_eq!("adventure".parse::<GameMode>().unwrap(), GameMode::Adventure);
        assert!("9".parse::<GameMode>().is_err());
        assert!("flying".parse::<GameMode>().is_err());
    }

    #[test]
    fn test_actor_permissions() {
        let actor = Actor::new("Notch", "world").with_permission("chatward.bypass");
        assert!(actor.has_permission("chatward.bypass"));
        assert!(!actor.has_permission("chatward.admin"));
    }

    #[test]
    fn test_location_display() {
        let loc = Location::new("world", 10, 64, -3);
        assert_eq!(loc.to_string(), "world x:10 y:64 z:-3");
    }
}
