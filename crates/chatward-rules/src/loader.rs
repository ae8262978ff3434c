//! Loads rule files and handler definitions from a directory

use crate::config::EngineSettings;
use crate::error::LoadError;
use crate::handler::HandlerSet;
use crate::parser::parse_rules;
use crate::ruleset::RuleSet;
use chatward_core::Category;
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// File holding handler definitions
pub const HANDLERS_FILE: &str = "handlers.yml";

const DEFAULT_HANDLERS: &str = include_str!("../assets/handlers.yml");

fn default_rules(category: Category) -> &'static str {
    match category {
        Category::Global => include_str!("../assets/rules.txt"),
        Category::Chat => include_str!("../assets/chat.txt"),
        Category::Command => include_str!("../assets/commands.txt"),
        Category::Sign => include_str!("../assets/sign.txt"),
        Category::Packet => include_str!("../assets/packets.txt"),
    }
}

/// Reads `handlers.yml` and the five category files from one directory
///
/// Missing files are created from the bundled defaults unless disabled.
#[derive(Debug, Clone)]
pub struct RuleLoader {
    dir: PathBuf,
    write_defaults: bool,
    debug: bool,
    silent_startup: bool,
}

impl RuleLoader {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            write_defaults: true,
            debug: false,
            silent_startup: true,
        }
    }

    /// Take the diagnostics switches from engine settings
    pub fn from_settings(dir: impl Into<PathBuf>, settings: &EngineSettings) -> Self {
        Self::new(dir)
            .with_debug(settings.debug)
            .with_silent_startup(settings.silent_startup)
    }

    /// Whether missing files are created from the bundled defaults
    pub fn with_defaults(mut self, write_defaults: bool) -> Self {
        self.write_defaults = write_defaults;
        self
    }

    pub fn with_debug(mut self, debug: bool) -> Self {
        self.debug = debug;
        self
    }

    pub fn with_silent_startup(mut self, silent_startup: bool) -> Self {
        self.silent_startup = silent_startup;
        self
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    /// Load handlers, then every category in load order
    pub fn load(&self) -> Result<RuleSet, LoadError> {
        let handlers = self.load_handlers()?;
        let mut rules = RuleSet::new();

        for category in Category::ALL {
            let path = self.extract(category.file_name(), default_rules(category))?;
            let Some(path) = path else {
                rules.insert(category, Vec::new())?;
                continue;
            };

            let source = std::fs::read_to_string(&path).map_err(|e| LoadError::io(&path, e))?;
            let parsed = parse_rules(category, &source, &handlers)?;
            rules.insert(category, parsed)?;
        }

        self.report(&rules);
        Ok(rules)
    }

    /// Load `handlers.yml` only
    pub fn load_handlers(&self) -> Result<HandlerSet, LoadError> {
        match self.extract(HANDLERS_FILE, DEFAULT_HANDLERS)? {
            Some(path) => HandlerSet::from_file(path),
            None => Ok(HandlerSet::new()),
        }
    }

    /// Path of an existing file, writing the default first if allowed
    fn extract(&self, name: &str, default: &str) -> Result<Option<PathBuf>, LoadError> {
        let path = self.dir.join(name);
        if path.exists() {
            return Ok(Some(path));
        }

        if !self.write_defaults {
            debug!(file = %path.display(), "Rule file missing, treating as empty");
            return Ok(None);
        }

        std::fs::create_dir_all(&self.dir).map_err(|e| LoadError::io(&self.dir, e))?;
        std::fs::write(&path, default).map_err(|e| LoadError::io(&path, e))?;
        info!(file = %path.display(), "Created default rule file");

        Ok(Some(path))
    }

    fn report(&self, rules: &RuleSet) {
        if self.debug {
            for category in Category::ALL {
                info!("Displaying rules from: {}", category.file_name());
                for rule in rules.get(category) {
                    info!("Loaded rule:\n{}", rule);
                }
            }
        }

        if !self.silent_startup {
            for (category, count) in rules.counts() {
                info!("Loaded {} rules in {}", count, category.file_name());
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bundled_defaults_parse() {
        let handlers = HandlerSet::from_yaml(DEFAULT_HANDLERS, HANDLERS_FILE).unwrap();
        assert_eq!(handlers.len(), 2);

        for category in Category::ALL {
            let rules = parse_rules(category, default_rules(category), &handlers).unwrap();
            assert!(!rules.is_empty(), "{} has no rules", category.file_name());
        }
    }

    #[test]
    fn test_writes_missing_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let loader = RuleLoader::new(dir.path());

        let rules = loader.load().unwrap();
        assert!(!rules.get(Category::Global).is_empty());
        assert!(dir.path().join("rules.txt").exists());
        assert!(dir.path().join("packets.txt").exists());
        assert!(dir.path().join(HANDLERS_FILE).exists());
    }

    #[test]
    fn test_keeps_existing_files() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("chat.txt"), "match only-this\nthen deny\n").unwrap();

        let rules = RuleLoader::new(dir.path()).load().unwrap();
        let chat = rules.get(Category::Chat);
        assert_eq!(chat.len(), 1);
        assert_eq!(chat[0].pattern, "only-this");
    }

    #[test]
    fn test_missing_files_without_defaults() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("sign.txt"), "match x\nthen deny\n").unwrap();

        let rules = RuleLoader::new(dir.path()).with_defaults(false).load().unwrap();
        assert_eq!(rules.len(), 1);
        assert!(rules.contains(Category::Global));
        assert!(!dir.path().join("rules.txt").exists());
    }

    #[test]
    fn test_parse_errors_name_the_file() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("commands.txt"), "match x\nthen fly").unwrap();

        let err = RuleLoader::new(dir.path()).load().unwrap_err();
        assert!(err.to_string().starts_with("commands.txt:2:"));
    }
}
