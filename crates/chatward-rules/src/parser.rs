//! Line-oriented rule file parser
//!
//! A rule file is a sequence of rules, each opened by a `match <regex>` line
//! and followed by directive lines that apply to it. Blank lines and lines
//! starting with `#` are ignored; every line is trimmed first.
//!
//! ```text
//! match f+u+c+k+
//! id swear
//! ignore perm chatward.bypass.swear
//! then replace ****|####
//! then warn &cPlease do not swear, {player}.
//! ```
//!
//! The packet file accepts a separate, smaller directive set.

use crate::error::LoadError;
use crate::handler::HandlerSet;
use crate::rule::{DirectiveError, Rule, RuleBuilder};
use chatward_core::{Category, EventKind, GameMode};
use std::collections::HashSet;
use tracing::warn;

/// Parse the rules of one category file
pub fn parse_rules(
    category: Category,
    source: &str,
    handlers: &HandlerSet,
) -> Result<Vec<Rule>, LoadError> {
    let mut parser = Parser::new(category, handlers);

    for (index, raw) in source.lines().enumerate() {
        parser.line(index + 1, raw.trim())?;
    }

    parser.finish()
}

/// Split a `|`-separated list, dropping trailing empty entries
///
/// A bare empty input yields a single empty entry.
fn split_alternatives(raw: &str, separator: &str) -> Vec<String> {
    let mut parts: Vec<String> = raw.split(separator).map(str::to_string).collect();
    while parts.len() > 1 && parts.last().is_some_and(|p| p.is_empty()) {
        parts.pop();
    }
    parts
}

struct Parser<'a> {
    category: Category,
    file: &'static str,
    handlers: &'a HandlerSet,
    current: Option<RuleBuilder>,
    opened_at: usize,
    rules: Vec<Rule>,
    seen: HashSet<String>,
}

impl<'a> Parser<'a> {
    fn new(category: Category, handlers: &'a HandlerSet) -> Self {
        Self {
            category,
            file: category.file_name(),
            handlers,
            current: None,
            opened_at: 0,
            rules: Vec::new(),
            seen: HashSet::new(),
        }
    }

    fn line(&mut self, line: usize, text: &str) -> Result<(), LoadError> {
        if text.is_empty() || text.starts_with('#') {
            return Ok(());
        }

        if let Some(pattern) = text.strip_prefix("match ") {
            self.flush()?;

            let builder = if self.category == Category::Packet {
                RuleBuilder::packet(pattern)
            } else {
                RuleBuilder::new(pattern)
            };
            self.current = Some(builder);
            self.opened_at = line;
            return Ok(());
        }

        let Some(mut builder) = self.current.take() else {
            return Err(LoadError::OperatorOutsideRule {
                file: self.file.to_string(),
                line,
                text: text.to_string(),
            });
        };

        let applied = if builder.is_packet_rule() {
            self.packet_directive(&mut builder, line, text)
        } else {
            self.directive(&mut builder, line, text)
        };

        match applied {
            Ok(Ok(())) => {
                self.current = Some(builder);
                Ok(())
            }
            Ok(Err(DirectiveError::AlreadySet(directive))) => Err(LoadError::DuplicateDirective {
                file: self.file.to_string(),
                line,
                directive: directive.to_string(),
                rule: builder.short(),
            }),
            Err(err) => Err(err),
        }
    }

    fn directive(
        &self,
        rule: &mut RuleBuilder,
        line: usize,
        text: &str,
    ) -> Result<Result<(), DirectiveError>, LoadError> {
        let applied = if text == "then deny" {
            rule.cancels()
        } else if text == "then log" {
            rule.logs()
        } else if let Some(pattern) = text.strip_prefix("strip ") {
            warn!(
                rule = %rule.short(),
                file = self.file,
                "Operator 'strip' is deprecated and replaced by 'before strip'"
            );
            rule.strip_before(pattern)
        } else if let Some(pattern) = text.strip_prefix("before strip ") {
            rule.strip_before(pattern)
        } else if let Some(raw) = text.strip_prefix("before replace ") {
            let parts = split_alternatives(raw, " with ");
            if parts.len() != 2 {
                return Err(self.malformed(line, text, "expected 'before replace <regex> with <replacement>'"));
            }
            rule.replace_before(&parts[0], &parts[1])
        } else if let Some(id) = text.strip_prefix("id ") {
            rule.id(id)
        } else if let Some(pattern) = text.strip_prefix("ignore string ") {
            rule.ignored_message(pattern)
        } else if let Some(raw) = text.strip_prefix("ignore event ") {
            let event = raw
                .parse::<EventKind>()
                .map_err(|reason| self.malformed(line, text, &reason))?;
            if Some(event) == self.category.event_kind() {
                return Err(self.malformed(
                    line,
                    text,
                    &format!("rules in {} always apply to {} events", self.file, event),
                ));
            }
            rule.ignored_event(event)
        } else if let Some(perm) = text.strip_prefix("ignore perm ") {
            rule.bypass_permission(perm)
        } else if let Some(raw) = text.strip_prefix("then rewrite ") {
            rule.rewrites(split_alternatives(raw, "|"))
        } else if let Some(raw) = text.strip_prefix("ignore gamemode ") {
            let modes = split_alternatives(raw, "|")
                .iter()
                .map(|mode| mode.parse::<GameMode>())
                .collect::<Result<Vec<_>, _>>()
                .map_err(|reason| self.malformed(line, text, &reason))?;
            rule.ignored_gamemodes(modes)
        } else if let Some(raw) = text.strip_prefix("then replace ") {
            rule.replacements(split_alternatives(raw, "|"))
        } else if text == "then replace" {
            rule.replacements(vec![String::new()])
        } else if let Some(raw) = text.strip_prefix("then console ") {
            rule.commands(split_alternatives(raw, "|"))
        } else if let Some(message) = text.strip_prefix("then warn ") {
            rule.warn_message(message)
        } else if let Some(raw) = text.strip_prefix("then notify ") {
            match raw.split_once(' ') {
                Some((permission, message)) if !permission.is_empty() && !message.is_empty() => {
                    rule.notify(permission, message)
                }
                _ => {
                    return Err(self.malformed(line, text, "expected 'then notify <permission> <message>'"))
                }
            }
        } else if let Some(raw) = text.strip_prefix("then fine ") {
            let amount = raw
                .trim()
                .parse::<f64>()
                .ok()
                .filter(|amount| amount.is_finite() && *amount >= 0.0)
                .ok_or_else(|| self.malformed(line, text, "fine must be a non-negative number"))?;
            rule.fine(amount)
        } else if let Some(message) = text.strip_prefix("then kick ") {
            rule.kick_message(message)
        } else if text == "then kick" {
            rule.kick_message("")
        } else if let Some(name) = text.strip_prefix("handle as ") {
            let handler = self.handlers.get(name).ok_or_else(|| LoadError::UnknownHandler {
                file: self.file.to_string(),
                line,
                name: name.to_string(),
            })?;
            rule.handler(handler)
        } else {
            return Err(LoadError::UnknownOperator {
                file: self.file.to_string(),
                line,
                text: text.to_string(),
                rule: rule.short(),
            });
        };

        Ok(applied)
    }

    fn packet_directive(
        &self,
        rule: &mut RuleBuilder,
        line: usize,
        text: &str,
    ) -> Result<Result<(), DirectiveError>, LoadError> {
        let applied = if text == "then deny" {
            rule.packet_deny()
        } else if text == "dont verbose" {
            rule.packet_quiet()
        } else if let Some(replacement) = text.strip_prefix("then replace ") {
            rule.packet_replace(replacement)
        } else if let Some(rewrite) = text.strip_prefix("then rewrite ") {
            rule.packet_rewrite(rewrite)
        } else if let Some(raw) = text.strip_prefix("then rewritein ") {
            match raw.split_once(' ') {
                Some((world, message)) if !world.is_empty() && !message.is_empty() => {
                    rule.packet_rewrite_in(world, message)
                }
                _ => {
                    return Err(self.malformed(
                        line,
                        text,
                        "expected 'then rewritein <world> <message>', use 'none' as the message to hide it",
                    ))
                }
            }
        } else {
            return Err(LoadError::UnknownPacketOperator {
                file: self.file.to_string(),
                line,
                text: text.to_string(),
                rule: rule.short(),
            });
        };

        Ok(applied)
    }

    fn malformed(&self, line: usize, text: &str, reason: &str) -> LoadError {
        LoadError::Malformed {
            file: self.file.to_string(),
            line,
            text: text.to_string(),
            reason: reason.to_string(),
        }
    }

    /// Close the open rule, rejecting exact duplicates of earlier rules
    fn flush(&mut self) -> Result<(), LoadError> {
        let Some(builder) = self.current.take() else {
            return Ok(());
        };

        let rule = builder.build();
        if !self.seen.insert(rule.to_string()) {
            return Err(LoadError::DuplicateRule {
                file: self.file.to_string(),
                line: self.opened_at,
                rule: rule.short(),
            });
        }

        self.rules.push(rule);
        Ok(())
    }

    fn finish(mut self) -> Result<Vec<Rule>, LoadError> {
        self.flush()?;
        Ok(self.rules)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::handler::HandlerOutcome;

    fn parse(category: Category, source: &str) -> Result<Vec<Rule>, LoadError> {
        parse_rules(category, source, &HandlerSet::new())
    }

    #[test]
    fn test_parse_full_rule() {
        let rules = parse(
            Category::Global,
            r#"
# swearing
match f+u+c+k+
id swear
ignore string fuchsia
ignore event sign
ignore perm chatward.bypass.swear
ignore gamemode 1|spectator
before strip [^a-z ]
before replace 4 with a
then replace ****|####
then rewrite Nope|Nah
then console say {player} swore|tell {player} stop
then warn &cDo not swear
then notify chatward.notify &c{player} swore
then fine 10.5
then kick &cBye
then log
then deny
"#,
        )
        .unwrap();

        assert_eq!(rules.len(), 1);
        let rule = &rules[0];
        assert_eq!(rule.pattern, "f+u+c+k+");
        assert_eq!(rule.id.as_deref(), Some("swear"));
        assert_eq!(rule.ignored_message.as_deref(), Some("fuchsia"));
        assert_eq!(rule.ignored_event, Some(EventKind::Sign));
        assert_eq!(rule.ignored_gamemodes, vec![GameMode::Creative, GameMode::Spectator]);
        assert_eq!(rule.strip_before.as_deref(), Some("[^a-z ]"));
        assert_eq!(rule.replace_before, Some(("4".to_string(), "a".to_string())));
        assert_eq!(rule.replacements, vec!["****", "####"]);
        assert_eq!(rule.rewrites, vec!["Nope", "Nah"]);
        assert_eq!(rule.commands.len(), 2);
        assert_eq!(rule.notify.as_ref().unwrap().permission, "chatward.notify");
        assert_eq!(rule.notify.as_ref().unwrap().message, "&c{player} swore");
        assert_eq!(rule.fine, Some(10.5));
        assert_eq!(rule.kick_message.as_deref(), Some("&cBye"));
        assert!(rule.logs);
        assert!(rule.cancels);
        assert!(!rule.is_packet_rule());
    }

    #[test]
    fn test_rules_keep_file_order() {
        let rules = parse(Category::Chat, "match one\nthen deny\n\nmatch two\nmatch three").unwrap();
        let patterns: Vec<_> = rules.iter().map(|r| r.pattern.as_str()).collect();
        assert_eq!(patterns, vec!["one", "two", "three"]);
    }

    #[test]
    fn test_operator_outside_rule() {
        let err = parse(Category::Chat, "then deny\nmatch x").unwrap_err();
        assert!(matches!(err, LoadError::OperatorOutsideRule { line: 1, .. }));
    }

    #[test]
    fn test_unknown_operator() {
        let err = parse(Category::Chat, "match x\nthen explode").unwrap_err();
        match err {
            LoadError::UnknownOperator { line, text, rule, .. } => {
                assert_eq!(line, 2);
                assert_eq!(text, "then explode");
                assert_eq!(rule, "Rule {Match='x'}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_directive() {
        let err = parse(Category::Chat, "match x\nid a\nthen warn hi\nid b").unwrap_err();
        match err {
            LoadError::DuplicateDirective { line, directive, rule, .. } => {
                assert_eq!(line, 4);
                assert_eq!(directive, "ID");
                assert_eq!(rule, "Rule {ID=a,Match='x'}");
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_duplicate_rule() {
        let err = parse(Category::Chat, "match x\nthen deny\nmatch x\nthen deny").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateRule { .. }));

        // same pattern, different directives
        assert!(parse(Category::Chat, "match x\nthen deny\nmatch x\nthen log").is_ok());
    }

    #[test]
    fn test_ignore_event_of_own_category() {
        let err = parse(Category::Chat, "match x\nignore event chat").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));

        assert!(parse(Category::Chat, "match x\nignore event global").is_err());
        assert!(parse(Category::Chat, "match x\nignore event command").is_ok());
    }

    #[test]
    fn test_bare_forms() {
        let rules = parse(Category::Chat, "match x\nthen replace\nthen kick").unwrap();
        assert_eq!(rules[0].replacements, vec![""]);
        assert_eq!(rules[0].kick_message.as_deref(), Some("Kicked from the server"));
    }

    #[test]
    fn test_deprecated_strip() {
        let rules = parse(Category::Chat, "match x\nstrip [0-9]").unwrap();
        assert_eq!(rules[0].strip_before.as_deref(), Some("[0-9]"));

        let err = parse(Category::Chat, "match x\nstrip [0-9]\nbefore strip [a]").unwrap_err();
        assert!(matches!(err, LoadError::DuplicateDirective { .. }));
    }

    #[test]
    fn test_malformed_arguments() {
        assert!(parse(Category::Chat, "match x\nbefore replace abc").is_err());
        assert!(parse(Category::Chat, "match x\nbefore replace a with ").is_err());
        assert!(parse(Category::Chat, "match x\nthen notify perm.only").is_err());
        assert!(parse(Category::Chat, "match x\nthen fine lots").is_err());
        assert!(parse(Category::Chat, "match x\nthen fine -5").is_err());
        assert!(parse(Category::Chat, "match x\nthen fine NaN").is_err());
        assert!(parse(Category::Chat, "match x\nthen fine 0").is_ok());
        assert!(parse(Category::Chat, "match x\nignore gamemode 1|flying").is_err());
    }

    #[test]
    fn test_handle_as() {
        let handlers = HandlerSet::from_yaml("Swear:\n  Block_Message: true\n", "handlers.yml").unwrap();
        let rules = parse_rules(Category::Chat, "match x\nhandle as Swear", &handlers).unwrap();
        assert_eq!(rules[0].handler.as_ref().unwrap().outcome, HandlerOutcome::Block);

        let err = parse_rules(Category::Chat, "match x\nhandle as Missing", &handlers).unwrap_err();
        assert!(matches!(err, LoadError::UnknownHandler { ref name, .. } if name == "Missing"));
    }

    #[test]
    fn test_packet_rules() {
        let rules = parse(
            Category::Packet,
            "match welcome\nthen rewrite Generic\nthen rewritein nether Disabled here\ndont verbose\n\nmatch secret\nthen deny",
        )
        .unwrap();

        let packet = rules[0].packet.as_ref().unwrap();
        assert_eq!(packet.rewrite.as_deref(), Some("Generic"));
        assert_eq!(packet.rewrite_per_world["nether"], "Disabled here");
        assert!(packet.quiet);
        assert!(rules[1].packet.as_ref().unwrap().denies);
    }

    #[test]
    fn test_packet_rules_reject_standard_directives() {
        let err = parse(Category::Packet, "match x\nthen warn hi").unwrap_err();
        assert!(matches!(err, LoadError::UnknownPacketOperator { .. }));

        let err = parse(Category::Packet, "match x\nthen rewritein nether").unwrap_err();
        assert!(matches!(err, LoadError::Malformed { .. }));
    }
}
