//! Anti-spam: message/command delays and near-duplicate blocking
//!
//! Each player owns a [`ChatHistory`]; the collaborator keeps it alive across
//! events and passes it to [`AntiSpam::check_message`] or
//! [`AntiSpam::check_command`] before rule evaluation.

use crate::config::{AntiSpamConfig, SpamLimits};
use crate::similarity::{prepare_for_similarity, similarity, SimilarityOptions};
use aho_corasick::{AhoCorasick, Anchored, Input, MatchKind, StartKind};
use chatward_core::{Error, Result};
use regex::RegexSet;
use std::time::{Duration, Instant};
use tracing::debug;

/// Result of an anti-spam check
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SpamVerdict {
    /// The text may proceed
    Allowed,

    /// Sent before the delay expired; `wait_secs` remain
    TooFast { wait_secs: u64 },

    /// Too similar to the previous text
    Similar,
}

impl SpamVerdict {
    pub fn is_allowed(&self) -> bool {
        matches!(self, Self::Allowed)
    }
}

/// Permissions the player holds to skip individual checks
#[derive(Debug, Clone, Copy, Default)]
pub struct SpamBypass {
    pub delay: bool,
    pub similarity: bool,
}

/// Per-player spam state
#[derive(Debug, Clone, Default)]
pub struct ChatHistory {
    last_message: Option<String>,
    last_command: Option<String>,
    last_message_at: Option<Instant>,
    last_command_at: Option<Instant>,
}

impl ChatHistory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Last accepted message, normalized
    pub fn last_message(&self) -> Option<&str> {
        self.last_message.as_deref()
    }

    /// Last accepted command, normalized
    pub fn last_command(&self) -> Option<&str> {
        self.last_command.as_deref()
    }
}

/// Message whitelist matched by prefix or by case-insensitive pattern
enum Whitelist {
    Empty,
    Prefix(AhoCorasick),
    Pattern(RegexSet),
}

impl Whitelist {
    fn build(entries: &[String], use_regex: bool) -> Result<Self> {
        if entries.is_empty() {
            return Ok(Self::Empty);
        }

        if use_regex {
            let patterns = entries.iter().map(|entry| format!("(?i){}", entry));
            let set = RegexSet::new(patterns)
                .map_err(|e| Error::config(format!("invalid anti-spam whitelist pattern: {}", e)))?;
            return Ok(Self::Pattern(set));
        }

        let ac = AhoCorasick::builder()
            .start_kind(StartKind::Anchored)
            .match_kind(MatchKind::LeftmostFirst)
            .build(entries)
            .map_err(|e| Error::config(format!("failed to build anti-spam whitelist: {}", e)))?;
        Ok(Self::Prefix(ac))
    }

    fn contains(&self, text: &str) -> bool {
        match self {
            Self::Empty => false,
            Self::Prefix(ac) => ac.find(Input::new(text).anchored(Anchored::Yes)).is_some(),
            Self::Pattern(set) => set.is_match(text),
        }
    }
}

/// Anti-spam checker built from [`AntiSpamConfig`]
pub struct AntiSpam {
    config: AntiSpamConfig,
    message_delay_whitelist: Whitelist,
    message_similarity_whitelist: Whitelist,
}

impl AntiSpam {
    /// Build the checker, compiling the message whitelists
    pub fn new(config: AntiSpamConfig) -> Result<Self> {
        let message_delay_whitelist =
            Whitelist::build(&config.messages.whitelist_delay, config.regex_in_whitelist)?;
        let message_similarity_whitelist =
            Whitelist::build(&config.messages.whitelist_similarity, config.regex_in_whitelist)?;

        Ok(Self {
            config,
            message_delay_whitelist,
            message_similarity_whitelist,
        })
    }

    pub fn config(&self) -> &AntiSpamConfig {
        &self.config
    }

    fn similarity_options(&self) -> SimilarityOptions {
        SimilarityOptions {
            strip_special_chars: self.config.strip_special_chars,
            strip_duplicate_chars: self.config.strip_duplicate_chars,
        }
    }

    /// Check a chat message
    pub fn check_message(
        &self,
        history: &mut ChatHistory,
        message: &str,
        bypass: SpamBypass,
        now: Instant,
    ) -> SpamVerdict {
        let limits = &self.config.messages;

        let exempt = bypass.delay || self.message_delay_whitelist.contains(message);
        if let Some(wait_secs) = remaining_delay(history.last_message_at, limits, now) {
            if !exempt {
                debug!(message = %message, wait_secs, "Message sent too fast");
                return SpamVerdict::TooFast { wait_secs };
            }
        } else {
            history.last_message_at = Some(now);
        }

        if limits.checks_similarity() {
            let exempt = bypass.similarity || self.message_similarity_whitelist.contains(message);
            if !exempt {
                let prepared = prepare_for_similarity(message, self.similarity_options());

                if is_similar(history.last_message.as_deref(), &prepared, limits) {
                    debug!(message = %message, "Message too similar to the previous one");
                    return SpamVerdict::Similar;
                }
                history.last_message = Some(prepared);
            }
        }

        SpamVerdict::Allowed
    }

    /// Check a command line such as `/tell Notch hello`
    ///
    /// Whitelists for commands hold command labels without the leading slash.
    pub fn check_command(
        &self,
        history: &mut ChatHistory,
        command: &str,
        bypass: SpamBypass,
        now: Instant,
    ) -> SpamVerdict {
        let limits = &self.config.commands;
        let args: Vec<&str> = command.split(' ').collect();
        let label = args[0].trim_start_matches('/');

        let exempt = bypass.delay || limits.whitelist_delay.iter().any(|entry| entry == label);
        if let Some(wait_secs) = remaining_delay(history.last_command_at, limits, now) {
            if !exempt {
                debug!(command = %command, wait_secs, "Command sent too fast");
                return SpamVerdict::TooFast { wait_secs };
            }
        } else {
            history.last_command_at = Some(now);
        }

        if limits.checks_similarity() {
            let mut stripped = command.to_string();
            if self.config.ignore_first_arguments_in_commands && args.len() > 2 {
                stripped = stripped.replace(args[0], "").replace(args[1], "");
            }

            let prepared = prepare_for_similarity(&stripped, self.similarity_options());

            if is_similar(history.last_command.as_deref(), &prepared, limits) {
                let exempt =
                    bypass.similarity || limits.whitelist_similarity.iter().any(|entry| entry == label);
                if exempt {
                    return SpamVerdict::Allowed;
                }

                debug!(command = %command, "Command too similar to the previous one");
                return SpamVerdict::Similar;
            }
            history.last_command = Some(prepared);
        }

        SpamVerdict::Allowed
    }
}

fn remaining_delay(last: Option<Instant>, limits: &SpamLimits, now: Instant) -> Option<u64> {
    let delay = Duration::from_secs(limits.delay_seconds);
    let elapsed = now.saturating_duration_since(last?);

    if elapsed < delay {
        Some(limits.delay_seconds - elapsed.as_secs())
    } else {
        None
    }
}

fn is_similar(previous: Option<&str>, current: &str, limits: &SpamLimits) -> bool {
    match previous {
        Some(previous) => u32::from(similarity(current, previous)) > limits.similarity_percentage,
        None => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn anti_spam() -> AntiSpam {
        AntiSpam::new(AntiSpamConfig::default()).unwrap()
    }

    #[test]
    fn test_message_delay() {
        let spam = anti_spam();
        let mut history = ChatHistory::new();
        let start = Instant::now();

        assert!(spam
            .check_message(&mut history, "first message", SpamBypass::default(), start)
            .is_allowed());
        assert_eq!(
            spam.check_message(&mut history, "something else", SpamBypass::default(), start),
            SpamVerdict::TooFast { wait_secs: 1 }
        );
        assert!(spam
            .check_message(
                &mut history,
                "something else",
                SpamBypass::default(),
                start + Duration::from_secs(2)
            )
            .is_allowed());
    }

    #[test]
    fn test_delay_bypass() {
        let spam = anti_spam();
        let mut history = ChatHistory::new();
        let now = Instant::now();
        let bypass = SpamBypass {
            delay: true,
            similarity: false,
        };

        spam.check_message(&mut history, "one", bypass, now);
        assert!(spam.check_message(&mut history, "two", bypass, now).is_allowed());
    }

    #[test]
    fn test_similar_messages() {
        let spam = anti_spam();
        let mut history = ChatHistory::new();
        let start = Instant::now();

        spam.check_message(&mut history, "buy cheap gold now", SpamBypass::default(), start);
        assert_eq!(history.last_message(), Some("buy cheap gold now"));

        let later = start + Duration::from_secs(5);
        assert_eq!(
            spam.check_message(&mut history, "Buy cheap gold now!", SpamBypass::default(), later),
            SpamVerdict::Similar
        );
    }

    #[test]
    fn test_prefix_whitelist() {
        let mut config = AntiSpamConfig::default();
        config.messages.whitelist_similarity = vec!["gg".to_string()];
        let spam = AntiSpam::new(config).unwrap();
        let mut history = ChatHistory::new();
        let start = Instant::now();

        spam.check_message(&mut history, "gg everyone", SpamBypass::default(), start);
        let later = start + Duration::from_secs(5);
        assert!(spam
            .check_message(&mut history, "gg everyone", SpamBypass::default(), later)
            .is_allowed());
    }

    #[test]
    fn test_regex_whitelist() {
        let mut config = AntiSpamConfig::default();
        config.regex_in_whitelist = true;
        config.messages.whitelist_delay = vec!["^hi+$".to_string()];
        let spam = AntiSpam::new(config).unwrap();
        let mut history = ChatHistory::new();
        let now = Instant::now();

        spam.check_message(&mut history, "hello", SpamBypass::default(), now);
        assert!(spam
            .check_message(&mut history, "HIII", SpamBypass::default(), now)
            .is_allowed());
    }

    #[test]
    fn test_invalid_regex_whitelist() {
        let mut config = AntiSpamConfig::default();
        config.regex_in_whitelist = true;
        config.messages.whitelist_delay = vec!["(unclosed".to_string()];
        assert!(AntiSpam::new(config).is_err());
    }

    #[test]
    fn test_command_ignores_first_arguments() {
        let spam = anti_spam();
        let mut history = ChatHistory::new();
        let start = Instant::now();

        spam.check_command(&mut history, "/tell Notch hello there", SpamBypass::default(), start);
        let later = start + Duration::from_secs(5);
        assert_eq!(
            spam.check_command(&mut history, "/tell Jeb hello there", SpamBypass::default(), later),
            SpamVerdict::Similar
        );
    }

    #[test]
    fn test_command_delay_whitelist() {
        let mut config = AntiSpamConfig::default();
        config.commands.whitelist_delay = vec!["spawn".to_string()];
        let spam = AntiSpam::new(config).unwrap();
        let mut history = ChatHistory::new();
        let now = Instant::now();

        spam.check_command(&mut history, "/home", SpamBypass::default(), now);
        assert!(spam
            .check_command(&mut history, "/spawn", SpamBypass::default(), now)
            .is_allowed());
        assert_eq!(
            spam.check_command(&mut history, "/warp", SpamBypass::default(), now),
            SpamVerdict::TooFast { wait_secs: 2 }
        );
    }
}
