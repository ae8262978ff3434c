//! chatward Rule Engine
//!
//! Line-oriented moderation rules for player chat, commands, signs and
//! outgoing chat packets.
//!
//! Rules are written in five category files (`rules.txt`, `chat.txt`,
//! `commands.txt`, `sign.txt`, `packets.txt`) and may delegate to reusable
//! handlers from `handlers.yml`. Each rule specifies:
//! - A pattern, matched case-insensitively with color codes removed
//! - Gates (ignored event, game modes, bypass permission)
//! - Side effects (deny, warn, replace, rewrite, console commands, fines, kicks)
//!
//! ```no_run
//! use chatward_rules::prelude::*;
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let settings = EngineSettings::default();
//! let rules = RuleLoader::from_settings("rules", &settings).load()?;
//! let engine = RuleEngine::builder(
//!     settings,
//!     Arc::new(RecordingHost::new()),
//!     Arc::new(ManualScheduler::new()),
//! )
//! .build(rules);
//!
//! let result = engine.evaluate(EventKind::Chat, &Actor::new("steve", "world"), "hello");
//! assert!(!result.cancelled);
//! # Ok(())
//! # }
//! ```

/// Log a diagnostic line at info level when verbose rules are on, else at debug
macro_rules! verbose {
    ($engine:expr, $($arg:tt)+) => {
        if $engine.settings.verbose_rules {
            tracing::info!($($arg)+)
        } else {
            tracing::debug!($($arg)+)
        }
    };
}

pub mod config;
pub mod engine;
pub mod error;
pub mod handler;
pub mod host;
pub mod loader;
pub mod packet;
pub mod parser;
pub mod regex_engine;
pub mod rule;
pub mod ruleset;
pub mod safe_regex;

pub use config::{CheckToggles, EngineSettings};
pub use engine::{EngineBuilder, Evaluation, RuleEngine};
pub use error::LoadError;
pub use handler::{Handler, HandlerOutcome, HandlerSet, StaffAlert};
pub use host::{Host, ManualScheduler, RecordingHost, Scheduler, Task, TokioScheduler};
pub use loader::RuleLoader;
pub use packet::{LeafOutcome, PacketOutcome, PacketTextRewriter};
pub use parser::parse_rules;
pub use rule::{Notify, PacketRule, Rule, RuleBuilder};
pub use ruleset::RuleSet;
pub use safe_regex::{RegexFault, ReplaceMode, SafeRegex};

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::config::EngineSettings;
    pub use crate::engine::{Evaluation, RuleEngine};
    pub use crate::error::LoadError;
    pub use crate::host::{Host, ManualScheduler, RecordingHost, Scheduler, TokioScheduler};
    pub use crate::loader::RuleLoader;
    pub use crate::packet::PacketOutcome;
    pub use crate::ruleset::RuleSet;
    pub use chatward_core::{Actor, Category, EventKind, GameMode};
}
