//! Engine settings

use chatward_core::{EventKind, Result};
use chatward_telemetry::WriterConfig;
use serde::{Deserialize, Serialize};
use std::time::Duration;

/// Settings for the rule engine
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EngineSettings {
    /// Time budget for a single regex operation in milliseconds
    #[serde(default = "default_regex_timeout_ms")]
    pub regex_timeout_ms: u64,

    /// Backtrack limit for patterns needing the backtracking engine
    #[serde(default = "default_backtrack_limit")]
    pub regex_backtrack_limit: usize,

    /// Emit MATCH / CATCH / FINAL lines at info level instead of debug
    #[serde(default = "default_true")]
    pub verbose_rules: bool,

    /// Dump every loaded rule
    #[serde(default)]
    pub debug: bool,

    /// Skip the per-file "Loaded N rules" lines
    #[serde(default = "default_true")]
    pub silent_startup: bool,

    /// Handlers always block sign text, whatever their outcome
    #[serde(default = "default_true")]
    pub block_signs_on_violation: bool,

    /// Which event kinds are checked at all
    #[serde(default)]
    pub rules: CheckToggles,

    /// Flat-file log destination
    #[serde(default)]
    pub writer: WriterConfig,
}

impl EngineSettings {
    /// Load from YAML string
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let settings: Self = serde_yaml::from_str(yaml)?;
        settings.validate()?;
        Ok(settings)
    }

    /// Load from file
    pub fn from_file(path: impl AsRef<std::path::Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml(&content)
    }

    /// Regex time budget
    pub fn regex_timeout(&self) -> Duration {
        Duration::from_millis(self.regex_timeout_ms)
    }

    fn validate(&self) -> Result<()> {
        if self.regex_backtrack_limit == 0 {
            return Err(chatward_core::Error::config(
                "regex_backtrack_limit must be greater than zero",
            ));
        }
        Ok(())
    }
}

impl Default for EngineSettings {
    fn default() -> Self {
        Self {
            regex_timeout_ms: default_regex_timeout_ms(),
            regex_backtrack_limit: default_backtrack_limit(),
            verbose_rules: true,
            debug: false,
            silent_startup: true,
            block_signs_on_violation: true,
            rules: CheckToggles::default(),
            writer: WriterConfig::default(),
        }
    }
}

/// Per event kind switches
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CheckToggles {
    #[serde(default = "default_true")]
    pub check_chat: bool,

    #[serde(default = "default_true")]
    pub check_commands: bool,

    #[serde(default = "default_true")]
    pub check_signs: bool,

    #[serde(default = "default_true")]
    pub check_packets: bool,
}

impl CheckToggles {
    pub fn checks(&self, kind: EventKind) -> bool {
        match kind {
            EventKind::Chat => self.check_chat,
            EventKind::Command => self.check_commands,
            EventKind::Sign => self.check_signs,
        }
    }
}

impl Default for CheckToggles {
    fn default() -> Self {
        Self {
            check_chat: true,
            check_commands: true,
            check_signs: true,
            check_packets: true,
        }
    }
}

fn default_regex_timeout_ms() -> u64 {
    100
}

fn default_backtrack_limit() -> usize {
    1_000_000
}

fn default_true() -> bool {
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let settings = EngineSettings::default();
        assert_eq!(settings.regex_timeout(), Duration::from_millis(100));
        assert!(settings.verbose_rules);
        assert!(settings.block_signs_on_violation);
        assert!(settings.rules.checks(EventKind::Sign));
    }

    #[test]
    fn test_partial_yaml() {
        let yaml = r#"
regex_timeout_ms: 250
verbose_rules: false
rules:
  check_signs: false
writer:
  base_dir: /var/log/chatward
"#;

        let settings = EngineSettings::from_yaml(yaml).unwrap();
        assert_eq!(settings.regex_timeout_ms, 250);
        assert!(!settings.verbose_rules);
        assert!(settings.silent_startup);
        assert!(!settings.rules.checks(EventKind::Sign));
        assert!(settings.rules.checks(EventKind::Chat));
        assert!(settings.rules.check_packets);
        assert_eq!(settings.writer.base_dir.to_str(), Some("/var/log/chatward"));
    }

    #[test]
    fn test_zero_backtrack_limit_rejected() {
        let err = EngineSettings::from_yaml("regex_backtrack_limit: 0").unwrap_err();
        assert!(matches!(err, chatward_core::Error::Config(_)));
    }
}
