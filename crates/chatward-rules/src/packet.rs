//! Packet rules applied to outgoing chat component trees
//!
//! A chat packet carries a JSON tree of nested objects and arrays. Every
//! string leaf is run through the packet rules; other leaves are left alone.
//! A denying rule, or a per-world rewrite to `none` / `hidden`, suppresses the
//! whole packet and stops the walk at once.

use crate::engine::RuleEngine;
use crate::ruleset::RuleSet;
use chatward_core::{colorize, strip_colors, Actor, Category, Placeholders};
use serde_json::Value;
use std::sync::Arc;

/// Result of rewriting a whole tree
#[derive(Debug, Clone, PartialEq)]
pub enum PacketOutcome {
    /// Send the (possibly rewritten) tree
    Continue(Value),
    /// Do not send the packet
    Cancelled,
}

impl PacketOutcome {
    pub fn is_cancelled(&self) -> bool {
        matches!(self, Self::Cancelled)
    }
}

/// Result of rewriting one string leaf
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LeafOutcome {
    Continue(String),
    Cancelled,
}

/// Walks a chat component tree with the packet rules of one snapshot
pub struct PacketTextRewriter<'a> {
    engine: &'a RuleEngine,
    rules: Arc<RuleSet>,
}

impl<'a> PacketTextRewriter<'a> {
    pub fn new(engine: &'a RuleEngine) -> Self {
        Self {
            engine,
            rules: engine.snapshot(),
        }
    }

    /// Rewrite every string leaf of `tree`
    pub fn rewrite(&self, actor: &Actor, mut tree: Value) -> PacketOutcome {
        match self.visit(actor, &mut tree) {
            Ok(()) => PacketOutcome::Continue(tree),
            Err(Suppressed) => {
                self.engine.metrics.record_packet_cancellation();
                PacketOutcome::Cancelled
            }
        }
    }

    fn visit(&self, actor: &Actor, node: &mut Value) -> Result<(), Suppressed> {
        match node {
            Value::Object(map) => {
                for value in map.values_mut() {
                    self.visit(actor, value)?;
                }
            }
            Value::Array(items) => {
                for item in items.iter_mut() {
                    self.visit(actor, item)?;
                }
            }
            Value::String(text) => match self.rewrite_leaf(actor, text) {
                LeafOutcome::Continue(rewritten) => *text = rewritten,
                LeafOutcome::Cancelled => return Err(Suppressed),
            },
            Value::Null | Value::Bool(_) | Value::Number(_) => {}
        }

        Ok(())
    }

    /// Apply the packet rules to one string
    pub fn rewrite_leaf(&self, actor: &Actor, text: &str) -> LeafOutcome {
        if text.is_empty() {
            return LeafOutcome::Continue(String::new());
        }

        let mut text = text.to_string();

        for rule in self.rules.get(Category::Packet) {
            let Some(packet) = &rule.packet else {
                continue;
            };

            let normalized = strip_colors(&text.to_lowercase()).into_owned();
            if !self.engine.matches(rule, &normalized) {
                continue;
            }

            let noisy = !packet.quiet;
            if noisy {
                verbose!(self.engine, "*--------- Rule match: chat packet ---------");
                if self.engine.settings.debug {
                    verbose!(self.engine, "MATCH: {}", rule);
                } else {
                    verbose!(self.engine, "MATCH: {}", rule.pattern);
                }
                verbose!(self.engine, "CATCH: {}", text);
            }

            let origin = text.clone();
            let placeholders = Placeholders::new(rule.id.as_deref(), actor, &origin);

            if packet.denies {
                if noisy {
                    verbose!(self.engine, "Packet sending cancelled.");
                }
                return LeafOutcome::Cancelled;
            } else if let Some(rewrite) = packet.rewrite_per_world.get(&actor.world) {
                text = colorize(&placeholders.apply(rewrite));

                if text.eq_ignore_ascii_case("none") || text.eq_ignore_ascii_case("hidden") {
                    if noisy {
                        verbose!(self.engine, "Packet sending cancelled.");
                    }
                    return LeafOutcome::Cancelled;
                }
            } else if let Some(rewrite) = &packet.rewrite {
                text = colorize(&placeholders.apply(rewrite));
            } else if let Some(replacement) = &packet.replace {
                text = colorize(&self.engine.regex.replace_all(&rule.pattern, &origin, replacement));
            }

            if noisy && text != origin {
                verbose!(self.engine, "FINAL: {}", text);
            }
        }

        LeafOutcome::Continue(text)
    }
}

/// The walk was stopped by a suppressing rule
struct Suppressed;
