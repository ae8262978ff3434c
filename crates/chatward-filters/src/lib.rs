//! chatward Filters
//!
//! Text heuristics that run around the rule engine:
//! - Anti-spam (before rules): message and command delays, near-duplicate blocking
//! - Anti-caps and grammar (after rules): caps lowering, capitalization, punctuation
//!
//! Everything here is synchronous and allocation-light; a chat message passes
//! through all filters in well under a millisecond.

pub mod antispam;
pub mod caps;
pub mod config;
pub mod grammar;
pub mod similarity;

pub use antispam::{AntiSpam, ChatHistory, SpamBypass, SpamVerdict};
pub use caps::{caps_flags, caps_in_a_row, caps_percentage, AntiCaps};
pub use config::{AntiCapsConfig, AntiSpamConfig, FilterConfig, GrammarConfig, GrammarRule, SpamLimits};
pub use grammar::{capitalize, insert_dot, is_domain, Grammar};
pub use similarity::{edit_distance, prepare_for_similarity, similarity, strip_duplicate, SimilarityOptions};

use chatward_core::Result;

/// A chat message after the post-rule filters
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Polished {
    /// Final message text
    pub text: String,

    /// Caps were lowered and the player should be told
    pub warn_caps: bool,
}

/// All filters built from one [`FilterConfig`]
pub struct TextFilters {
    pub anti_spam: AntiSpam,
    pub anti_caps: AntiCaps,
    pub grammar: Grammar,
}

impl TextFilters {
    /// Build every filter from configuration
    pub fn new(config: FilterConfig) -> Result<Self> {
        Ok(Self {
            anti_spam: AntiSpam::new(config.anti_spam)?,
            anti_caps: AntiCaps::new(config.anti_caps),
            grammar: Grammar::new(config.grammar),
        })
    }

    /// Apply anti-caps then grammar to a chat message that passed the rules
    ///
    /// `skip_caps` is set when the player may write in caps.
    pub fn polish(&self, message: &str, online: &[String], skip_caps: bool) -> Polished {
        let mut warn_caps = false;
        let mut text = message.to_string();

        if !skip_caps {
            if let Some(lowered) = self.anti_caps.apply(&text, online) {
                warn_caps = self.anti_caps.config().warn_player;
                text = lowered;
            }
        }

        Polished {
            text: self.grammar.apply(&text),
            warn_caps,
        }
    }
}

/// Prelude for convenient imports
pub mod prelude {
    pub use crate::antispam::{AntiSpam, ChatHistory, SpamBypass, SpamVerdict};
    pub use crate::caps::AntiCaps;
    pub use crate::config::FilterConfig;
    pub use crate::grammar::Grammar;
    pub use crate::similarity::similarity;
    pub use crate::{Polished, TextFilters};
}
