//! Rule evaluation engine
//!
//! [`RuleEngine::evaluate`] runs the global rules and then the rules of the
//! event's own category against one piece of text. Each matching rule fires
//! its side effects in a fixed order; a cancelling rule or handler ends the
//! evaluation at once and no later rule in either pass runs.
//!
//! The rule tables are published behind an `Arc`. A reload builds a complete
//! new [`RuleSet`] and swaps the pointer, so an evaluation in flight keeps the
//! snapshot it started with.

use crate::config::EngineSettings;
use crate::error::LoadError;
use crate::handler::{Handler, HandlerOutcome};
use crate::host::{Host, Scheduler};
use crate::loader::RuleLoader;
use crate::packet::{PacketOutcome, PacketTextRewriter};
use crate::rule::Rule;
use crate::ruleset::RuleSet;
use crate::safe_regex::{ReplaceMode, SafeRegex};
use chatward_core::{colorize, strip_colors, Actor, Category, EventKind, Placeholders};
use chatward_telemetry::{
    AuditEntry, AuditKind, AuditSink, FileAuditSink, LogWriter, MetricsCollector,
};
use parking_lot::RwLock;
use rand::seq::SliceRandom;
use std::sync::Arc;
use tracing::{debug, info};

/// Delay of effects that run on the next tick
const NEXT_TICK: u64 = 0;

/// Delay of messages shown after the player's own message
const AFTER_MESSAGE: u64 = 1;

/// Result of evaluating one text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Evaluation {
    /// The text after every rewrite and replacement
    pub text: String,

    /// Whether the underlying action must not proceed
    pub cancelled: bool,
}

/// Whether evaluation goes on after a rule
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Flow {
    Continue,
    Cancelled,
}

/// Deduplication state for one `evaluate` call
///
/// Keeps a handler's warn and broadcast messages from firing twice when
/// several rules match the same text.
#[derive(Debug, Default)]
struct EvaluationScope {
    last_warn: Option<String>,
    last_broadcast: Option<String>,
}

/// Builder for [`RuleEngine`]
pub struct EngineBuilder {
    settings: EngineSettings,
    host: Arc<dyn Host>,
    scheduler: Arc<dyn Scheduler>,
    audit: Option<Arc<dyn AuditSink>>,
    metrics: Option<MetricsCollector>,
}

impl EngineBuilder {
    /// Use a custom audit sink instead of flat files
    pub fn audit(mut self, audit: Arc<dyn AuditSink>) -> Self {
        self.audit = Some(audit);
        self
    }

    /// Share a metrics collector
    pub fn metrics(mut self, metrics: MetricsCollector) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn build(self, rules: RuleSet) -> RuleEngine {
        let audit = self.audit.unwrap_or_else(|| {
            Arc::new(FileAuditSink::new(LogWriter::new(self.settings.writer.clone())))
        });
        let metrics = self.metrics.unwrap_or_default();

        let regex = SafeRegex::new(
            self.settings.regex_timeout(),
            self.settings.regex_backtrack_limit,
            Arc::clone(&audit),
            metrics.clone(),
        );

        RuleEngine {
            rules: RwLock::new(Arc::new(rules)),
            settings: self.settings,
            regex,
            host: self.host,
            scheduler: self.scheduler,
            audit,
            metrics,
        }
    }
}

/// Evaluates text against loaded rules
pub struct RuleEngine {
    rules: RwLock<Arc<RuleSet>>,
    pub(crate) settings: EngineSettings,
    pub(crate) regex: SafeRegex,
    host: Arc<dyn Host>,
    scheduler: Arc<dyn Scheduler>,
    audit: Arc<dyn AuditSink>,
    pub(crate) metrics: MetricsCollector,
}

impl RuleEngine {
    /// Start building an engine around a host and its scheduler
    pub fn builder(
        settings: EngineSettings,
        host: Arc<dyn Host>,
        scheduler: Arc<dyn Scheduler>,
    ) -> EngineBuilder {
        EngineBuilder {
            settings,
            host,
            scheduler,
            audit: None,
            metrics: None,
        }
    }

    pub fn settings(&self) -> &EngineSettings {
        &self.settings
    }

    pub fn metrics(&self) -> &MetricsCollector {
        &self.metrics
    }

    /// Whether the collaborator should consult the engine for this kind
    pub fn is_enabled(&self, kind: EventKind) -> bool {
        self.settings.rules.checks(kind)
    }

    /// Whether outgoing packets should be rewritten
    pub fn packets_enabled(&self) -> bool {
        self.settings.rules.check_packets
    }

    /// The rule tables currently published
    pub fn snapshot(&self) -> Arc<RuleSet> {
        Arc::clone(&self.rules.read())
    }

    /// Publish a new rule set
    pub fn replace_rules(&self, rules: RuleSet) {
        *self.rules.write() = Arc::new(rules);
        self.regex.clear_cache();
    }

    /// Load every rule file again and publish the result
    ///
    /// On error the current rules stay in place.
    pub fn reload(&self, loader: &RuleLoader) -> Result<(), LoadError> {
        let rules = loader.load()?;
        let total = rules.len();

        self.replace_rules(rules);
        info!(rules = total, dir = %loader.dir().display(), "Reloaded rules");
        Ok(())
    }

    /// Rewrite an outgoing chat component tree with the packet rules
    pub fn rewrite_packet(&self, actor: &Actor, tree: serde_json::Value) -> PacketOutcome {
        PacketTextRewriter::new(self).rewrite(actor, tree)
    }

    /// Evaluate `text` written by `actor` in an event of the given kind
    pub fn evaluate(&self, kind: EventKind, actor: &Actor, text: &str) -> Evaluation {
        let rules = self.snapshot();
        let mut scope = EvaluationScope::default();
        let mut current = text.to_string();

        self.metrics.record_evaluation(&kind.to_string().to_lowercase());

        for category in [Category::Global, kind.category()] {
            let category_rules = rules.get(category);
            debug!(
                category = %category,
                rules = category_rules.len(),
                "Checking {} rules",
                category
            );

            for rule in category_rules {
                if self.apply_rule(rule, kind, actor, &mut current, &mut scope) == Flow::Cancelled {
                    self.metrics.record_cancellation();
                    verbose!(self, "Original message cancelled.");

                    return Evaluation {
                        text: current,
                        cancelled: true,
                    };
                }
            }
        }

        if current != text {
            verbose!(self, "FINAL: {}", current);
        }

        Evaluation {
            text: current,
            cancelled: false,
        }
    }

    fn skips(&self, rule: &Rule, kind: EventKind, actor: &Actor) -> bool {
        rule.ignored_event == Some(kind)
            || rule.ignored_gamemodes.contains(&actor.game_mode)
            || rule
                .bypass_permission
                .as_deref()
                .is_some_and(|perm| actor.has_permission(perm))
    }

    /// Whether the rule's pattern matches `text` after its pre-processing
    pub(crate) fn matches(&self, rule: &Rule, text: &str) -> bool {
        let mut text = text.to_string();

        if let Some(strip) = &rule.strip_before {
            text = self.regex.replace(strip, &text, "", ReplaceMode::Exact);
        }

        if let Some((pattern, replacement)) = &rule.replace_before {
            text = self.regex.replace(pattern, &text, replacement, ReplaceMode::Exact);
        }

        if let Some(ignored) = &rule.ignored_message {
            if self.regex.is_match(ignored, &text) {
                debug!(ignored = %ignored, message = %text, "Erasing ignored text before matching");
                text = self.regex.replace_all(ignored, &text, "");
            }
        }

        self.regex.is_match(&rule.pattern, &text)
    }

    fn apply_rule(
        &self,
        rule: &Rule,
        kind: EventKind,
        actor: &Actor,
        text: &mut String,
        scope: &mut EvaluationScope,
    ) -> Flow {
        if self.skips(rule, kind, actor) || !self.matches(rule, text) {
            return Flow::Continue;
        }

        self.metrics.record_rule_match(&kind.category().to_string().to_lowercase());

        verbose!(
            self,
            "*--------- Rule match on {} --------- ID {}",
            actor.name,
            rule.id_or_unset()
        );
        if self.settings.debug {
            verbose!(self, "MATCH: {}", rule);
        } else {
            verbose!(self, "MATCH: {}", rule.pattern);
        }
        verbose!(self, "CATCH: {}", text);

        let prefix = sign_prefix(kind, actor);

        if rule.logs {
            if !self.settings.verbose_rules {
                info!(
                    player = %actor.name,
                    rule = %rule.short(),
                    "{}{} violated {} with message: {}",
                    prefix,
                    actor.name,
                    rule.short(),
                    strip_colors(text)
                );
            }

            self.audit.record(
                AuditEntry::new(
                    AuditKind::RuleViolation,
                    format!("{}{} caught message: {}", prefix, rule.short(), text),
                )
                .with_actor(&actor.name),
            );
        }

        if let Some(notify) = &rule.notify {
            let message = colorize(&Placeholders::new(rule.id.as_deref(), actor, text).apply(&notify.message));

            for online in self.host.online_actors() {
                if online.has_permission(&notify.permission) {
                    self.tell_later(online.name, message.clone());
                }
            }
        }

        if let Some(handler) = &rule.handler {
            match self.apply_handler(handler, rule, kind, actor, text, scope) {
                Some(rewritten) => *text = rewritten,
                None => return Flow::Cancelled,
            }
        }

        if let Some(rewrite) = pick(&rule.rewrites) {
            let rewritten = colorize(&Placeholders::new(rule.id.as_deref(), actor, text).apply(rewrite));
            *text = rewritten;
        }

        if let Some(replacement) = pick(&rule.replacements) {
            let replacement = colorize(&Placeholders::new(rule.id.as_deref(), actor, text).apply(replacement));
            let replaced =
                self.regex
                    .replace(&rule.pattern, text, &replacement, ReplaceMode::KeepColors);
            *text = replaced;
        }

        for command in &rule.commands {
            let command = Placeholders::new(rule.id.as_deref(), actor, text).apply(command);
            self.custom_action(actor, &command, text);
        }

        if let Some(warn) = &rule.warn_message {
            let message = colorize(&Placeholders::new(rule.id.as_deref(), actor, text).apply(warn));

            if rule.cancels {
                self.host.tell(&actor.name, &message);
            } else {
                self.tell_later(actor.name.clone(), message);
            }
        }

        if let Some(fine) = rule.fine {
            self.host.withdraw(&actor.name, fine);
        }

        if let Some(kick) = &rule.kick_message {
            let command = format!("kick {} {}", actor.name, colorize(kick));
            let host = Arc::clone(&self.host);
            self.scheduler.run_later(
                NEXT_TICK,
                Box::new(move || host.dispatch_console_command(&command)),
            );
        }

        if rule.cancels {
            return Flow::Cancelled;
        }

        Flow::Continue
    }

    /// Fire a handler's effects; `None` means the action is cancelled
    fn apply_handler(
        &self,
        handler: &Handler,
        rule: &Rule,
        kind: EventKind,
        actor: &Actor,
        text: &str,
        scope: &mut EvaluationScope,
    ) -> Option<String> {
        if handler
            .bypass_permission
            .as_deref()
            .is_some_and(|perm| actor.has_permission(perm))
        {
            return Some(text.to_string());
        }

        if kind == EventKind::Command
            && handler
                .ignored_in_commands
                .iter()
                .any(|ignored| text.starts_with(ignored.as_str()))
        {
            return Some(text.to_string());
        }

        let placeholders = Placeholders::new(rule.id.as_deref(), actor, text).with_handler(&handler.name);
        let prefix = sign_prefix(kind, actor);

        if let Some(warn) = &handler.player_warn_message {
            if scope.last_warn.as_deref() != Some(warn.as_str()) {
                let message = colorize(&placeholders.apply(warn));

                if handler.blocks() {
                    self.host.tell(&actor.name, &message);
                } else {
                    self.tell_later(actor.name.clone(), message);
                }
                scope.last_warn = Some(warn.clone());
            }
        }

        if let Some(broadcast) = &handler.broadcast_message {
            if scope.last_broadcast.as_deref() != Some(broadcast.as_str()) {
                self.host.broadcast(&colorize(&placeholders.apply(broadcast)));
                scope.last_broadcast = Some(broadcast.clone());
            }
        }

        if let Some(alert) = &handler.staff_alert {
            let message = colorize(&format!("{}{}", prefix, placeholders.apply(&alert.message)));

            for online in self.host.online_actors() {
                if online.has_permission(&alert.permission) {
                    self.host.tell(&online.name, &message);
                }
            }
        }

        if let Some(console) = &handler.console_message {
            let line = colorize(&placeholders.apply(console));
            info!(handler = %handler.name, "{}", strip_colors(&line));
        }

        for command in &handler.commands {
            self.custom_action(actor, &placeholders.apply(command), text);
        }

        if let Some(target) = &handler.write_to_file {
            let header = placeholders.apply("[Handler={handler}, Rule ID={ruleID}] ");
            self.audit.record(
                AuditEntry::new(
                    AuditKind::HandlerFile {
                        target: target.clone(),
                    },
                    format!("{}{}", header, text),
                )
                .with_actor(&actor.name),
            );
        }

        if let Some(fine) = handler.fine {
            self.host.withdraw(&actor.name, fine);
        }

        let blocks_sign = kind == EventKind::Sign && self.settings.block_signs_on_violation;

        match &handler.outcome {
            _ if handler.blocks() || blocks_sign => None,
            HandlerOutcome::ReplaceWord(word) => {
                let replacement = colorize(&placeholders.apply(word));
                Some(self.regex.replace_all(&rule.pattern, text, &replacement))
            }
            HandlerOutcome::ReplaceWhole(whole) => Some(colorize(&placeholders.apply(whole))),
            HandlerOutcome::Pass | HandlerOutcome::Block => Some(text.to_string()),
        }
    }

    /// Dispatch a console command on the next tick
    ///
    /// Empty commands and `none` are skipped.
    fn custom_action(&self, actor: &Actor, command: &str, text: &str) {
        if command.is_empty() || command.eq_ignore_ascii_case("none") {
            return;
        }

        let command = colorize(
            &command
                .replace("{player}", &actor.name)
                .replace("{message}", text),
        );
        let host = Arc::clone(&self.host);

        self.scheduler.run_later(
            NEXT_TICK,
            Box::new(move || host.dispatch_console_command(&command)),
        );
    }

    fn tell_later(&self, recipient: String, message: String) {
        let host = Arc::clone(&self.host);

        self.scheduler.run_later(
            AFTER_MESSAGE,
            Box::new(move || host.tell(&recipient, &message)),
        );
    }
}

fn pick(alternatives: &[String]) -> Option<&String> {
    alternatives.choose(&mut rand::thread_rng())
}

fn sign_prefix(kind: EventKind, actor: &Actor) -> String {
    match (&actor.location, kind) {
        (Some(location), EventKind::Sign) => format!("[Sign - {}] ", location),
        _ => String::new(),
    }
}
