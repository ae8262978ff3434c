//! Compiled rules and the builder the parser fills in

use crate::handler::Handler;
use chatward_core::{strip_colors, EventKind, GameMode};
use std::collections::BTreeMap;
use std::fmt;
use std::sync::Arc;

/// Kick message used by a bare `then kick`
pub const DEFAULT_KICK_MESSAGE: &str = "Kicked from the server";

/// Permission and message of a `then notify` directive
#[derive(Debug, Clone, PartialEq)]
pub struct Notify {
    pub permission: String,
    pub message: String,
}

/// A compiled rule: one `match` pattern, its gates and its side effects
///
/// Rules are only built through [`RuleBuilder`] and never change afterwards.
#[derive(Debug, Clone)]
pub struct Rule {
    /// The `match` pattern
    pub pattern: String,

    /// Optional identifier, `{ruleID}` in templates
    pub id: Option<String>,

    /// Text erased before matching so appending it cannot dodge the pattern
    pub ignored_message: Option<String>,

    /// Players holding this permission skip the rule
    pub bypass_permission: Option<String>,

    /// The rule is skipped for this event kind
    pub ignored_event: Option<EventKind>,

    /// The rule is skipped for players in these game modes
    pub ignored_gamemodes: Vec<GameMode>,

    /// Regex removed from the text before matching
    pub strip_before: Option<String>,

    /// Regex and replacement applied before matching
    pub replace_before: Option<(String, String)>,

    /// Alternatives for the matched span, one chosen at random
    pub replacements: Vec<String>,

    /// Alternatives for the whole message, one chosen at random
    pub rewrites: Vec<String>,

    /// Console commands run on match
    pub commands: Vec<String>,

    pub warn_message: Option<String>,

    pub notify: Option<Notify>,

    pub kick_message: Option<String>,

    /// Handler invoked on match
    pub handler: Option<Arc<Handler>>,

    /// `then deny`
    pub cancels: bool,

    /// `then log`
    pub logs: bool,

    /// Amount withdrawn from the player
    pub fine: Option<f64>,

    /// Packet-only behavior, present for rules loaded from the packet file
    pub packet: Option<PacketRule>,
}

impl Rule {
    /// Whether this rule was loaded from the packet file
    pub fn is_packet_rule(&self) -> bool {
        self.packet.is_some()
    }

    /// `{ruleID}` value
    pub fn id_or_unset(&self) -> &str {
        self.id.as_deref().unwrap_or(chatward_core::text::UNSET_ID)
    }

    /// One-line form used in errors and log lines
    pub fn short(&self) -> String {
        let kind = if self.is_packet_rule() { "PacketRule" } else { "Rule" };
        match &self.id {
            Some(id) => format!("{} {{ID={},Match='{}'}}", kind, id, self.pattern),
            None => format!("{} {{Match='{}'}}", kind, self.pattern),
        }
    }
}

impl fmt::Display for Rule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut out = String::new();

        if let Some(packet) = &self.packet {
            out.push_str("PacketRule{\n");
            out.push_str(&format!("    Match = '{}'\n", self.pattern));
            packet.describe(&mut out);
        } else {
            out.push_str("Rule{\n");
            if let Some(id) = &self.id {
                out.push_str(&format!("    Id = {}\n", id));
            }
            out.push_str(&format!("    Match = '{}'\n", self.pattern));
            if let Some(strip) = &self.strip_before {
                out.push_str(&format!("    Strip Before Match = '{}'\n", strip));
            }
            if let Some((pattern, replacement)) = &self.replace_before {
                out.push_str(&format!(
                    "    Replace Before Match = '{}' with '{}'\n",
                    pattern, replacement
                ));
            }
            if let Some(perm) = &self.bypass_permission {
                out.push_str(&format!("    Bypass With Perm = '{}'\n", perm));
            }
            if let Some(ignored) = &self.ignored_message {
                out.push_str(&format!("    Ignore Message = '{}'\n", ignored));
            }
            if let Some(event) = &self.ignored_event {
                out.push_str(&format!("    Ignore Event = '{}'\n", event));
            }
            if !self.ignored_gamemodes.is_empty() {
                let modes: Vec<_> = self.ignored_gamemodes.iter().map(|m| format!("{:?}", m)).collect();
                out.push_str(&format!("    Ignore Gamemodes = '{}'\n", modes.join(",")));
            }
            if !self.replacements.is_empty() {
                out.push_str(&format!("    Replace With = '{}'\n", self.replacements.join(",")));
            }
            if !self.rewrites.is_empty() {
                out.push_str(&format!("    Rewrite = '{}'\n", self.rewrites.join(",")));
            }
            if !self.commands.is_empty() {
                out.push_str(&format!("    Execute Command = '{}'\n", self.commands.join(",")));
            }
            if let Some(handler) = &self.handler {
                out.push_str(&format!("    Handler = '{}'\n", handler.name));
            }
            if let Some(warn) = &self.warn_message {
                out.push_str(&format!("    Warn Message = '{}'\n", warn));
            }
            if let Some(notify) = &self.notify {
                out.push_str(&format!(
                    "    Notify = '{}' with '{}'\n",
                    notify.permission, notify.message
                ));
            }
            if let Some(kick) = &self.kick_message {
                out.push_str(&format!("    Kick Message = '{}'\n", kick));
            }
            if let Some(fine) = self.fine {
                out.push_str(&format!("    Fine = {}\n", fine));
            }
            if self.cancels {
                out.push_str("    Deny = true\n");
            }
            if self.logs {
                out.push_str("    Log = true\n");
            }
        }
        out.push('}');

        f.write_str(&strip_colors(&out))
    }
}

/// Packet-only behavior of a rule from the packet file
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PacketRule {
    /// `then deny`: suppress the whole packet
    pub denies: bool,

    /// `then replace`: substitute the matched span
    pub replace: Option<String>,

    /// `then rewrite`: replace the whole string
    pub rewrite: Option<String>,

    /// `then rewritein <world>`: per-world whole-string replacement
    pub rewrite_per_world: BTreeMap<String, String>,

    /// `dont verbose`
    pub quiet: bool,
}

impl PacketRule {
    fn describe(&self, out: &mut String) {
        if let Some(replace) = &self.replace {
            out.push_str(&format!("    Replace Word: '{}'\n", replace));
        }
        if let Some(rewrite) = &self.rewrite {
            out.push_str(&format!("    Rewrite With: '{}'\n", rewrite));
        }
        for (world, rewrite) in &self.rewrite_per_world {
            out.push_str(&format!("    Rewrite In {}: '{}'\n", world, rewrite));
        }
        if self.quiet {
            out.push_str("    Do Not Verbose: true\n");
        }
        out.push_str(&format!("    Then Deny: {}\n", self.denies));
    }
}

/// Why a directive could not be applied to the rule being built
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DirectiveError {
    /// The field was already set; holds the directive name
    AlreadySet(&'static str),
}

fn set_once<T>(slot: &mut Option<T>, value: T, directive: &'static str) -> Result<(), DirectiveError> {
    if slot.is_some() {
        return Err(DirectiveError::AlreadySet(directive));
    }
    *slot = Some(value);
    Ok(())
}

fn set_flag(flag: &mut bool, directive: &'static str) -> Result<(), DirectiveError> {
    if *flag {
        return Err(DirectiveError::AlreadySet(directive));
    }
    *flag = true;
    Ok(())
}

/// Accumulates directives for one rule, each field at most once
#[derive(Debug, Clone, Default)]
pub struct RuleBuilder {
    pattern: String,
    id: Option<String>,
    ignored_message: Option<String>,
    bypass_permission: Option<String>,
    ignored_event: Option<EventKind>,
    ignored_gamemodes: Option<Vec<GameMode>>,
    strip_before: Option<String>,
    replace_before: Option<(String, String)>,
    replacements: Option<Vec<String>>,
    rewrites: Option<Vec<String>>,
    commands: Option<Vec<String>>,
    warn_message: Option<String>,
    notify: Option<Notify>,
    kick_message: Option<String>,
    handler: Option<Arc<Handler>>,
    cancels: bool,
    logs: bool,
    fine: Option<f64>,
    packet: Option<PacketRuleBuilder>,
}

#[derive(Debug, Clone, Default)]
struct PacketRuleBuilder {
    denies: bool,
    replace: Option<String>,
    rewrite: Option<String>,
    rewrite_per_world: BTreeMap<String, String>,
    quiet: bool,
}

impl RuleBuilder {
    /// Start a standard rule
    pub fn new(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            ..Default::default()
        }
    }

    /// Start a packet rule
    pub fn packet(pattern: impl Into<String>) -> Self {
        Self {
            pattern: pattern.into(),
            packet: Some(PacketRuleBuilder::default()),
            ..Default::default()
        }
    }

    pub fn is_packet_rule(&self) -> bool {
        self.packet.is_some()
    }

    pub fn id(&mut self, id: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.id, id.to_string(), "ID")
    }

    pub fn ignored_message(&mut self, pattern: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.ignored_message, pattern.to_string(), "ignored message")
    }

    pub fn bypass_permission(&mut self, permission: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.bypass_permission, permission.to_string(), "bypass permission")
    }

    pub fn ignored_event(&mut self, event: EventKind) -> Result<(), DirectiveError> {
        set_once(&mut self.ignored_event, event, "ignored event")
    }

    pub fn ignored_gamemodes(&mut self, modes: Vec<GameMode>) -> Result<(), DirectiveError> {
        set_once(&mut self.ignored_gamemodes, modes, "ignored gamemodes")
    }

    pub fn strip_before(&mut self, pattern: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.strip_before, pattern.to_string(), "strip before")
    }

    pub fn replace_before(&mut self, pattern: &str, replacement: &str) -> Result<(), DirectiveError> {
        set_once(
            &mut self.replace_before,
            (pattern.to_string(), replacement.to_string()),
            "replace before",
        )
    }

    pub fn replacements(&mut self, alternatives: Vec<String>) -> Result<(), DirectiveError> {
        set_once(&mut self.replacements, alternatives, "replacement")
    }

    pub fn rewrites(&mut self, alternatives: Vec<String>) -> Result<(), DirectiveError> {
        set_once(&mut self.rewrites, alternatives, "rewrite")
    }

    pub fn commands(&mut self, commands: Vec<String>) -> Result<(), DirectiveError> {
        set_once(&mut self.commands, commands, "console commands")
    }

    pub fn warn_message(&mut self, message: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.warn_message, message.to_string(), "warn message")
    }

    pub fn notify(&mut self, permission: &str, message: &str) -> Result<(), DirectiveError> {
        set_once(
            &mut self.notify,
            Notify {
                permission: permission.to_string(),
                message: message.to_string(),
            },
            "custom notify",
        )
    }

    /// An empty message falls back to [`DEFAULT_KICK_MESSAGE`]
    pub fn kick_message(&mut self, message: &str) -> Result<(), DirectiveError> {
        let message = if message.is_empty() { DEFAULT_KICK_MESSAGE } else { message };
        set_once(&mut self.kick_message, message.to_string(), "kick message")
    }

    pub fn handler(&mut self, handler: Arc<Handler>) -> Result<(), DirectiveError> {
        set_once(&mut self.handler, handler, "handler")
    }

    pub fn cancels(&mut self) -> Result<(), DirectiveError> {
        set_flag(&mut self.cancels, "deny")
    }

    pub fn logs(&mut self) -> Result<(), DirectiveError> {
        set_flag(&mut self.logs, "log")
    }

    pub fn fine(&mut self, amount: f64) -> Result<(), DirectiveError> {
        set_once(&mut self.fine, amount, "fine")
    }

    fn packet_mut(&mut self) -> &mut PacketRuleBuilder {
        self.packet.get_or_insert_with(PacketRuleBuilder::default)
    }

    pub fn packet_deny(&mut self) -> Result<(), DirectiveError> {
        set_flag(&mut self.packet_mut().denies, "deny")
    }

    pub fn packet_quiet(&mut self) -> Result<(), DirectiveError> {
        set_flag(&mut self.packet_mut().quiet, "dont verbose")
    }

    pub fn packet_replace(&mut self, replacement: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.packet_mut().replace, replacement.to_string(), "replace")
    }

    pub fn packet_rewrite(&mut self, rewrite: &str) -> Result<(), DirectiveError> {
        set_once(&mut self.packet_mut().rewrite, rewrite.to_string(), "rewrite")
    }

    pub fn packet_rewrite_in(&mut self, world: &str, rewrite: &str) -> Result<(), DirectiveError> {
        let per_world = &mut self.packet_mut().rewrite_per_world;
        if per_world.contains_key(world) {
            return Err(DirectiveError::AlreadySet("rewrite in world"));
        }
        per_world.insert(world.to_string(), rewrite.to_string());
        Ok(())
    }

    /// One-line form of the rule built so far
    pub fn short(&self) -> String {
        let kind = if self.is_packet_rule() { "PacketRule" } else { "Rule" };
        match &self.id {
            Some(id) => format!("{} {{ID={},Match='{}'}}", kind, id, self.pattern),
            None => format!("{} {{Match='{}'}}", kind, self.pattern),
        }
    }

    /// Produce the immutable rule
    pub fn build(self) -> Rule {
        Rule {
            pattern: self.pattern,
            id: self.id,
            ignored_message: self.ignored_message,
            bypass_permission: self.bypass_permission,
            ignored_event: self.ignored_event,
            ignored_gamemodes: self.ignored_gamemodes.unwrap_or_default(),
            strip_before: self.strip_before,
            replace_before: self.replace_before,
            replacements: self.replacements.unwrap_or_default(),
            rewrites: self.rewrites.unwrap_or_default(),
            commands: self.commands.unwrap_or_default(),
            warn_message: self.warn_message,
            notify: self.notify,
            kick_message: self.kick_message,
            handler: self.handler,
            cancels: self.cancels,
            logs: self.logs,
            fine: self.fine,
            packet: self.packet.map(|p| PacketRule {
                denies: p.denies,
                replace: p.replace,
                rewrite: p.rewrite,
                rewrite_per_world: p.rewrite_per_world,
                quiet: p.quiet,
            }),
        }
    }
}
