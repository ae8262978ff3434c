//! Named, reusable side-effect bundles referenced by `handle as <name>`
//!
//! Handlers are defined in `handlers.yml`, one mapping per handler:
//!
//! ```yaml
//! Swear:
//!   Bypass_With_Permission: chatward.bypass.swear
//!   Player_Warn_Message: "&cPlease do not swear, {player}."
//!   Staff_Alert_Message: "&c{player} swore: &f{message}"
//!   Staff_Alert_Permission: chatward.notify.swear
//!   Block_Message: false
//!   Replace_Word: "&c****"
//! ```
//!
//! A value of `none` (any case) or an empty string leaves the field unset.
//! Blocking, partial replacement and whole rewrite are mutually exclusive.

use crate::error::LoadError;
use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::Path;
use std::sync::Arc;

/// What happens to the text once the handler's messages have fired
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HandlerOutcome {
    /// Leave the text as it is
    Pass,
    /// Cancel the underlying action
    Block,
    /// Replace the span the rule matched
    ReplaceWord(String),
    /// Replace the whole text
    ReplaceWhole(String),
}

/// Message shown to every online actor holding a permission
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StaffAlert {
    pub message: String,
    pub permission: String,
}

/// A validated handler
#[derive(Debug, Clone)]
pub struct Handler {
    pub name: String,
    pub bypass_permission: Option<String>,

    /// Command prefixes the handler never fires for
    pub ignored_in_commands: Vec<String>,

    pub player_warn_message: Option<String>,
    pub broadcast_message: Option<String>,
    pub staff_alert: Option<StaffAlert>,
    pub console_message: Option<String>,
    pub commands: Vec<String>,

    /// File (relative to the log directory) the caught text is appended to
    pub write_to_file: Option<String>,

    pub outcome: HandlerOutcome,
    pub fine: Option<f64>,
}

impl Handler {
    /// Whether the handler cancels the action on its own
    pub fn blocks(&self) -> bool {
        self.outcome == HandlerOutcome::Block
    }

    fn from_entry(name: &str, entry: HandlerEntry) -> Result<Self, LoadError> {
        let replace_word = set(entry.replace_word);
        let replace_whole = set(entry.replace_whole);

        let outcome = match (entry.block_message, replace_word, replace_whole) {
            (true, None, None) => HandlerOutcome::Block,
            (true, _, _) => {
                return Err(LoadError::invalid_handler(
                    name,
                    "Block_Message cannot be combined with Replace_Word or Replace_Whole",
                ))
            }
            (false, Some(_), Some(_)) => {
                return Err(LoadError::invalid_handler(
                    name,
                    "Replace_Word and Replace_Whole cannot both be set",
                ))
            }
            (false, Some(word), None) => HandlerOutcome::ReplaceWord(word),
            (false, None, Some(whole)) => HandlerOutcome::ReplaceWhole(whole),
            (false, None, None) => HandlerOutcome::Pass,
        };

        let staff_alert = match (set(entry.staff_alert_message), set(entry.staff_alert_permission)) {
            (Some(message), Some(permission)) => Some(StaffAlert { message, permission }),
            (Some(_), None) => {
                return Err(LoadError::invalid_handler(
                    name,
                    "Staff_Alert_Message requires Staff_Alert_Permission",
                ))
            }
            (None, _) => None,
        };

        if let Some(fine) = entry.fine {
            if !fine.is_finite() || fine < 0.0 {
                return Err(LoadError::invalid_handler(
                    name,
                    format!("Fine must be a non-negative number, got {}", fine),
                ));
            }
        }

        Ok(Self {
            name: name.to_string(),
            bypass_permission: set(entry.bypass_with_permission),
            ignored_in_commands: entry.ignored_in_commands.unwrap_or_default(),
            player_warn_message: set(entry.player_warn_message),
            broadcast_message: set(entry.broadcast_message),
            staff_alert,
            console_message: set(entry.console_message),
            commands: entry.execute_commands.unwrap_or_default(),
            write_to_file: set(entry.write_to_file),
            outcome,
            fine: entry.fine,
        })
    }
}

fn set(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty() && !v.eq_ignore_ascii_case("none"))
}

/// Raw handler record as written in `handlers.yml`
#[derive(Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
struct HandlerEntry {
    #[serde(rename = "Bypass_With_Permission")]
    bypass_with_permission: Option<String>,

    #[serde(rename = "Player_Warn_Message")]
    player_warn_message: Option<String>,

    #[serde(rename = "Broadcast_Message")]
    broadcast_message: Option<String>,

    #[serde(rename = "Staff_Alert_Message")]
    staff_alert_message: Option<String>,

    #[serde(rename = "Staff_Alert_Permission")]
    staff_alert_permission: Option<String>,

    #[serde(rename = "Console_Message")]
    console_message: Option<String>,

    #[serde(rename = "Write_To_File")]
    write_to_file: Option<String>,

    #[serde(rename = "Block_Message", default)]
    block_message: bool,

    #[serde(rename = "Replace_Word")]
    replace_word: Option<String>,

    #[serde(rename = "Replace_Whole")]
    replace_whole: Option<String>,

    #[serde(rename = "Execute_Commands")]
    execute_commands: Option<Vec<String>>,

    #[serde(rename = "Ignored_In_Commands")]
    ignored_in_commands: Option<Vec<String>>,

    #[serde(rename = "Fine")]
    fine: Option<f64>,
}

/// Every handler from one definitions source, validated up front
#[derive(Debug, Clone, Default)]
pub struct HandlerSet {
    handlers: BTreeMap<String, Arc<Handler>>,
}

impl HandlerSet {
    /// An empty set, for rule files that never use `handle as`
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse handler definitions; `source` names the origin in errors
    pub fn from_yaml(yaml: &str, source: &str) -> Result<Self, LoadError> {
        let yaml_err = |e| LoadError::Yaml {
            path: source.to_string(),
            source: e,
        };

        if yaml.trim().is_empty() {
            return Ok(Self::new());
        }

        let value: serde_yaml::Value = serde_yaml::from_str(yaml).map_err(yaml_err)?;
        if value.is_null() {
            return Ok(Self::new());
        }

        let entries: BTreeMap<String, Option<HandlerEntry>> =
            serde_yaml::from_value(value).map_err(yaml_err)?;

        let mut handlers = BTreeMap::new();
        for (name, entry) in entries {
            let handler = Handler::from_entry(&name, entry.unwrap_or_default())?;
            handlers.insert(name, Arc::new(handler));
        }

        Ok(Self { handlers })
    }

    /// Load handler definitions from a file
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| LoadError::io(path, e))?;
        Self::from_yaml(&content, &path.display().to_string())
    }

    pub fn get(&self, name: &str) -> Option<Arc<Handler>> {
        self.handlers.get(name).cloned()
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.handlers.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.handlers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.handlers.is_empty()
    }
}
