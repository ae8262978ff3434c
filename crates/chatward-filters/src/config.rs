//! Configuration for the text filters

use chatward_core::Result;
use serde::{Deserialize, Serialize};

/// Configuration for all filters
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FilterConfig {
    /// Caps-lock detection
    #[serde(default)]
    pub anti_caps: AntiCapsConfig,

    /// Delay and similarity limits
    #[serde(default)]
    pub anti_spam: AntiSpamConfig,

    /// Capitalization and punctuation
    #[serde(default)]
    pub grammar: GrammarConfig,
}

impl FilterConfig {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }
}

/// Anti-caps settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiCapsConfig {
    #[serde(default = "default_true")]
    pub enabled: bool,

    /// Tell the player when their message was lowered
    #[serde(default = "default_true")]
    pub warn_player: bool,

    /// Keep online player names as typed
    #[serde(default = "default_true")]
    pub ignore_usernames: bool,

    #[serde(default = "default_min_length")]
    pub min_message_length: usize,

    #[serde(default = "default_min_caps_percentage")]
    pub min_caps_percentage: u32,

    #[serde(default = "default_min_caps_in_a_row")]
    pub min_caps_in_a_row: usize,

    /// Words never counted as caps, compared case-insensitively
    #[serde(default = "default_caps_whitelist")]
    pub whitelist: Vec<String>,
}

impl Default for AntiCapsConfig {
    fn default() -> Self {
        Self {
            enabled: true,
            warn_player: true,
            ignore_usernames: true,
            min_message_length: default_min_length(),
            min_caps_percentage: default_min_caps_percentage(),
            min_caps_in_a_row: default_min_caps_in_a_row(),
            whitelist: default_caps_whitelist(),
        }
    }
}

/// Anti-spam settings
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AntiSpamConfig {
    #[serde(default = "default_message_limits")]
    pub messages: SpamLimits,

    #[serde(default = "default_command_limits")]
    pub commands: SpamLimits,

    /// Treat message whitelist entries as patterns instead of prefixes
    #[serde(default)]
    pub regex_in_whitelist: bool,

    #[serde(default = "default_true")]
    pub strip_special_chars: bool,

    #[serde(default)]
    pub strip_duplicate_chars: bool,

    /// Compare `/tell <player> <msg>` without the label and first argument
    #[serde(default = "default_true")]
    pub ignore_first_arguments_in_commands: bool,
}

impl Default for AntiSpamConfig {
    fn default() -> Self {
        Self {
            messages: default_message_limits(),
            commands: default_command_limits(),
            regex_in_whitelist: false,
            strip_special_chars: true,
            strip_duplicate_chars: false,
            ignore_first_arguments_in_commands: true,
        }
    }
}

/// Delay and similarity limits for messages or commands
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpamLimits {
    /// Minimum seconds between two texts
    pub delay_seconds: u64,

    /// Texts more similar than this percentage are blocked; 0 or 100 disables
    pub similarity_percentage: u32,

    /// Entries exempt from the delay
    #[serde(default)]
    pub whitelist_delay: Vec<String>,

    /// Entries exempt from the similarity check
    #[serde(default)]
    pub whitelist_similarity: Vec<String>,
}

impl SpamLimits {
    fn new(delay_seconds: u64) -> Self {
        Self {
            delay_seconds,
            similarity_percentage: 80,
            whitelist_delay: Vec::new(),
            whitelist_similarity: Vec::new(),
        }
    }

    /// Whether the similarity check is active
    pub fn checks_similarity(&self) -> bool {
        self.similarity_percentage > 0 && self.similarity_percentage < 100
    }
}

/// Grammar settings
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct GrammarConfig {
    #[serde(default)]
    pub insert_dot: GrammarRule,

    #[serde(default)]
    pub capitalize: GrammarRule,
}

/// A single grammar correction
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GrammarRule {
    #[serde(default)]
    pub enabled: bool,

    #[serde(default = "default_min_length")]
    pub min_message_length: usize,
}

impl Default for GrammarRule {
    fn default() -> Self {
        Self {
            enabled: false,
            min_message_length: default_min_length(),
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_min_length() -> usize {
    5
}

fn default_min_caps_percentage() -> u32 {
    50
}

fn default_min_caps_in_a_row() -> usize {
    5
}

fn default_caps_whitelist() -> Vec<String> {
    ["OMG", "LOL", "WTF", "WOW", "ROFL"]
        .iter()
        .map(|word| word.to_string())
        .collect()
}

fn default_message_limits() -> SpamLimits {
    SpamLimits::new(1)
}

fn default_command_limits() -> SpamLimits {
    SpamLimits::new(2)
}
