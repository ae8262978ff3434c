//! Color codes and placeholder expansion
//!
//! Chat text uses the section sign (`§`) followed by a code character for
//! formatting. Configuration files use `&` as the alternate code character,
//! which [`colorize`] translates.

use crate::types::Actor;
use regex::Regex;
use std::borrow::Cow;
use std::sync::OnceLock;

/// The formatting code prefix understood by clients
pub const COLOR_CHAR: char = '§';

/// The alternate code prefix used in configuration files
pub const ALT_COLOR_CHAR: char = '&';

/// Placeholder used when a rule has no id
pub const UNSET_ID: &str = "UNSET";

fn color_code_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new("(?i)§[0-9A-FK-ORX]").expect("static color pattern is valid"))
}

fn is_color_code(c: char) -> bool {
    matches!(c.to_ascii_lowercase(), '0'..='9' | 'a'..='f' | 'k'..='o' | 'r' | 'x')
}

/// Remove all formatting codes from text
pub fn strip_colors(text: &str) -> Cow<'_, str> {
    if !text.contains(COLOR_CHAR) {
        return Cow::Borrowed(text);
    }

    color_code_regex().replace_all(text, "")
}

/// Translate `&`-codes into formatting codes
pub fn colorize(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut chars = text.chars().peekable();

    while let Some(c) = chars.next() {
        if c == ALT_COLOR_CHAR {
            if let Some(&next) = chars.peek() {
                if is_color_code(next) {
                    out.push(COLOR_CHAR);
                    out.push(next.to_ascii_lowercase());
                    chars.next();
                    continue;
                }
            }
        }
        out.push(c);
    }

    out
}

/// Values substituted into warn, notify, command and log templates
///
/// Recognized placeholders: `{ruleID}`, `{player}`, `{world}`, `{message}`
/// and, for handler templates, `{handler}`.
#[derive(Debug, Clone)]
pub struct Placeholders<'a> {
    pub rule_id: &'a str,
    pub player: &'a str,
    pub world: &'a str,
    pub message: &'a str,
    pub handler: Option<&'a str>,
}

impl<'a> Placeholders<'a> {
    /// Placeholders for a rule template
    pub fn new(rule_id: Option<&'a str>, actor: &'a Actor, message: &'a str) -> Self {
        Self {
            rule_id: rule_id.unwrap_or(UNSET_ID),
            player: &actor.name,
            world: &actor.world,
            message,
            handler: None,
        }
    }

    /// Add the handler name for handler templates
    pub fn with_handler(mut self, handler: &'a str) -> Self {
        self.handler = Some(handler);
        self
    }

    /// Expand every known placeholder in `template`
    pub fn apply(&self, template: &str) -> String {
        let expanded = template
            .replace("{ruleID}", self.rule_id)
            .replace("{player}", self.player)
            .replace("{world}", self.world)
            .replace("{message}", self.message);

        match self.handler {
            Some(handler) => expanded.replace("{handler}", handler),
            None => expanded,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_strip_colors() {
        assert_eq!(strip_colors("§cHello §lWorld"), "Hello World");
        assert_eq!(strip_colors("plain text"), "plain text");
        // Alternate codes are not formatting until colorized
        assert_eq!(strip_colors("&cHello"), "&cHello");
    }

    #[test]
    fn test_colorize() {
        assert_eq!(colorize("&cRed &LBold"), "§cRed §lBold");
        assert_eq!(colorize("Tom & Jerry"), "Tom & Jerry");
        assert_eq!(colorize("trailing &"), "trailing &");
    }

    #[test]
    fn test_colorize_then_strip() {
        assert_eq!(strip_colors(&colorize("&aGreen &rreset")), "Green reset");
    }

    #[test]
    fn test_placeholders() {
        let actor = Actor::new("Steve", "nether");
        let vars = Placeholders::new(Some("swear"), &actor, "bad word");

        assert_eq!(
            vars.apply("{player} in {world} broke {ruleID}: {message}"),
            "Steve in nether broke swear: bad word"
        );
        assert_eq!(vars.apply("{handler}"), "{handler}");

        let vars = Placeholders::new(None, &actor, "x").with_handler("swear");
        assert_eq!(vars.apply("{ruleID}/{handler}"), "UNSET/swear");
    }
}
