//! Grammar touch-ups: sentence capitalization and trailing punctuation

use crate::config::GrammarConfig;
use fancy_regex::Regex;
use std::sync::OnceLock;

fn domain_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(
            r"^(?:https?://(?:www\.|(?!www))[^\s.]+\.[^\s]{2,}|www\.[^\s]+\.[^\s]{2,})$",
        )
        .expect("static domain pattern is valid")
    })
}

/// Whether `word` looks like a web address
pub fn is_domain(word: &str) -> bool {
    domain_regex().is_match(word).unwrap_or(false)
}

/// Upper-case the first letter of every sentence
///
/// A sentence ends at whitespace following `!`, `?` or `.`. Sentences that
/// start with a web address are left alone.
pub fn capitalize(message: &str) -> String {
    let mut sentences = Vec::new();
    let mut current = String::new();
    let mut previous = None;

    for c in message.chars() {
        if c.is_whitespace() && matches!(previous, Some('!' | '?' | '.')) {
            sentences.push(std::mem::take(&mut current));
        } else {
            current.push(c);
        }
        previous = Some(c);
    }
    sentences.push(current);

    sentences
        .iter()
        .map(|sentence| {
            let first_word = sentence.split_whitespace().next().unwrap_or("");
            if is_domain(first_word) {
                return sentence.clone();
            }

            let mut chars = sentence.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
        .trim()
        .to_string()
}

/// Append a period when the message ends with a letter
///
/// Messages whose last word is a web address are left alone.
pub fn insert_dot(message: &str) -> String {
    let ends_with_letter = message
        .chars()
        .last()
        .map_or(false, |c| c.is_ascii_alphabetic());

    let last_word = message.split_whitespace().last().unwrap_or("");

    if ends_with_letter && !is_domain(last_word) {
        format!("{}.", message)
    } else {
        message.to_string()
    }
}

/// Grammar filter gated by the configured minimum lengths
#[derive(Debug, Clone, Default)]
pub struct Grammar {
    config: GrammarConfig,
}

impl Grammar {
    pub fn new(config: GrammarConfig) -> Self {
        Self { config }
    }

    /// Apply capitalization then punctuation, each when enabled and the
    /// message is long enough
    pub fn apply(&self, message: &str) -> String {
        let mut message = message.to_string();

        let capitalize_cfg = &self.config.capitalize;
        if capitalize_cfg.enabled && message.chars().count() >= capitalize_cfg.min_message_length {
            message = capitalize(&message);
        }

        let dot_cfg = &self.config.insert_dot;
        if dot_cfg.enabled && message.chars().count() >= dot_cfg.min_message_length {
            message = insert_dot(&message);
        }

        message
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::GrammarRule;

    #[test]
    fn test_is_domain() {
        assert!(is_domain("https://example.com"));
        assert!(is_domain("www.example.com"));
        assert!(!is_domain("example"));
        assert!(!is_domain("hello."));
    }

    #[test]
    fn test_capitalize_sentences() {
        assert_eq!(capitalize("hello there. how are you? fine"), "Hello there. How are you? Fine");
        assert_eq!(capitalize("www.example.com is cool"), "www.example.com is cool");
        assert_eq!(capitalize(""), "");
    }

    #[test]
    fn test_insert_dot() {
        assert_eq!(insert_dot("hello there"), "hello there.");
        assert_eq!(insert_dot("hello there!"), "hello there!");
        assert_eq!(insert_dot("visit www.example.com"), "visit www.example.com");
        assert_eq!(insert_dot(""), "");
    }

    #[test]
    fn test_grammar_min_length() {
        let grammar = Grammar::new(GrammarConfig {
            capitalize: GrammarRule {
                enabled: true,
                min_message_length: 5,
            },
            insert_dot: GrammarRule {
                enabled: true,
                min_message_length: 5,
            },
        });

        assert_eq!(grammar.apply("hello world"), "Hello world.");
        assert_eq!(grammar.apply("hey"), "hey");
    }

    #[test]
    fn test_grammar_disabled_by_default() {
        assert_eq!(Grammar::default().apply("hello world"), "hello world");
    }
}
