//! Caps-lock detection and rewriting

use crate::config::AntiCapsConfig;
use tracing::debug;

/// Per-character caps flags: `1` for an uppercase letter, `0` otherwise
///
/// Words on the whitelist are lower-cased first so they never count.
pub fn caps_flags(message: &str, whitelist: &[String]) -> Vec<u8> {
    let normalized = message
        .split(' ')
        .map(|word| {
            if is_listed(word, whitelist) {
                word.to_lowercase()
            } else {
                word.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ");

    normalized
        .chars()
        .map(|c| u8::from(c.is_alphabetic() && c.is_uppercase()))
        .collect()
}

/// Percentage of flagged characters, truncated
pub fn caps_percentage(flags: &[u8]) -> u32 {
    if flags.is_empty() {
        return 0;
    }

    let sum: usize = flags.iter().map(|&f| f as usize).sum();
    (100 * sum / flags.len()) as u32
}

/// Longest run of consecutive flagged characters
pub fn caps_in_a_row(flags: &[u8]) -> usize {
    let mut longest = 0;
    let mut current = 0;

    for &flag in flags {
        if flag == 1 {
            current += 1;
            longest = longest.max(current);
        } else {
            current = 0;
        }
    }

    longest
}

fn is_listed(word: &str, list: &[String]) -> bool {
    list.iter().any(|entry| entry.eq_ignore_ascii_case(word))
}

/// Anti-caps filter
#[derive(Debug, Clone)]
pub struct AntiCaps {
    config: AntiCapsConfig,
}

impl AntiCaps {
    pub fn new(config: AntiCapsConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &AntiCapsConfig {
        &self.config
    }

    /// Whether `message` crosses either caps threshold
    pub fn violates(&self, message: &str) -> bool {
        if !self.config.enabled || message.chars().count() < self.config.min_message_length {
            return false;
        }

        let flags = caps_flags(message, &self.config.whitelist);

        caps_percentage(&flags) >= self.config.min_caps_percentage
            || caps_in_a_row(&flags) >= self.config.min_caps_in_a_row
    }

    /// Lower the caps in `message` when it crosses a threshold
    ///
    /// Returns `None` when the message is left unchanged. `usernames` holds the
    /// names of online players, kept as typed when `ignore_usernames` is set.
    pub fn apply(&self, message: &str, usernames: &[String]) -> Option<String> {
        if !self.violates(message) {
            return None;
        }

        let lowered = self.lower(message, usernames);
        if lowered == message {
            return None;
        }

        debug!(before = %message, after = %lowered, "Lowered caps");
        Some(lowered)
    }

    /// Lower every word except the first letter at the start of a sentence
    ///
    /// Whitelisted words and usernames are kept as typed and the word after
    /// them is lowered completely.
    pub fn lower(&self, message: &str, usernames: &[String]) -> String {
        let mut sentence_start = true;
        let mut words = Vec::new();

        for word in message.split(' ') {
            let kept = is_listed(word, &self.config.whitelist)
                || (self.config.ignore_usernames && is_listed(word, usernames));

            if kept {
                sentence_start = false;
                words.push(word.to_string());
                continue;
            }

            let lowered = if sentence_start {
                let mut chars = word.chars();
                match chars.next() {
                    Some(first) => {
                        let mut out = String::with_capacity(word.len());
                        out.push(first);
                        out.push_str(&chars.as_str().to_lowercase());
                        out
                    }
                    None => String::new(),
                }
            } else {
                word.to_lowercase()
            };

            sentence_start = lowered.ends_with('.') || lowered.ends_with('!');
            words.push(lowered);
        }

        words.join(" ")
    }
}

impl Default for AntiCaps {
    fn default() -> Self {
        Self::new(AntiCapsConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn whitelist() -> Vec<String> {
        AntiCapsConfig::default().whitelist
    }

    #[test]
    fn test_caps_flags_counts() {
        let flags = caps_flags("HELLO world", &whitelist());
        assert_eq!(&flags[..6], &[1, 1, 1, 1, 1, 0]);
        assert_eq!(caps_percentage(&flags), 45);
        assert_eq!(caps_in_a_row(&flags), 5);
    }

    #[test]
    fn test_whitelisted_words_do_not_count() {
        let flags = caps_flags("LOL ok", &whitelist());
        assert_eq!(caps_percentage(&flags), 0);
        assert_eq!(caps_in_a_row(&flags), 0);
    }

    #[test]
    fn test_empty_flags() {
        assert_eq!(caps_percentage(&[]), 0);
        assert_eq!(caps_in_a_row(&[]), 0);
    }

    #[test]
    fn test_violation_thresholds() {
        let caps = AntiCaps::default();
        assert!(caps.violates("HELLO EVERYONE"));
        assert!(!caps.violates("Hello everyone"));
        // Below the minimum length
        assert!(!caps.violates("HEY"));
    }

    #[test]
    fn test_lower_keeps_sentence_initials() {
        let caps = AntiCaps::default();
        assert_eq!(
            caps.apply("HELLO EVERYONE. HOW ARE YOU", &[]).as_deref(),
            Some("Hello everyone. How are you")
        );
    }

    #[test]
    fn test_lower_keeps_whitelist_and_usernames() {
        let caps = AntiCaps::default();
        let online = vec!["NOTCH".to_string()];

        assert_eq!(
            caps.lower("LOL NOTCH IS HERE", &online),
            "LOL NOTCH is here"
        );
    }

    #[test]
    fn test_apply_disabled() {
        let caps = AntiCaps::new(AntiCapsConfig {
            enabled: false,
            ..Default::default()
        });
        assert!(caps.apply("STOP SHOUTING", &[]).is_none());
    }
}
