//! Flat-file log writer
//!
//! Appends timestamped lines to files below a base directory:
//! - one line per message line, prefixed with `[dd.MM.yyyy HH:mm:ss]`
//! - optional `<prefix>: ` (usually the player name)
//! - parent directories are created on demand

use chatward_core::strip_colors;
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::debug;

/// File where rule violations are logged
pub const RULES_PATH: &str = "logs/rules.txt";

/// File where runtime errors (regex faults) are logged
pub const ERROR_PATH: &str = "errors/errors.txt";

const DATE_FORMAT: &str = "%d.%m.%Y %H:%M:%S";

/// Configuration for the log writer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WriterConfig {
    /// Directory all relative log paths are resolved against
    #[serde(default = "default_base_dir")]
    pub base_dir: PathBuf,

    /// Remove formatting codes before writing
    #[serde(default = "default_true")]
    pub strip_colors: bool,
}

impl Default for WriterConfig {
    fn default() -> Self {
        Self {
            base_dir: default_base_dir(),
            strip_colors: true,
        }
    }
}

fn default_base_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_true() -> bool {
    true
}

/// Appends timestamped lines to log files
pub struct LogWriter {
    config: WriterConfig,
    lock: Mutex<()>,
}

impl LogWriter {
    /// Create a new writer
    pub fn new(config: WriterConfig) -> Self {
        Self {
            config,
            lock: Mutex::new(()),
        }
    }

    /// Base directory of all log files
    pub fn base_dir(&self) -> &Path {
        &self.config.base_dir
    }

    /// Resolve a relative log path
    pub fn resolve(&self, relative: &str) -> PathBuf {
        self.config.base_dir.join(relative)
    }

    /// Append `message` to the file at `relative`, one timestamped line per
    /// message line, each optionally prefixed with `prefix: `
    pub fn write(&self, relative: &str, prefix: Option<&str>, message: &str) -> std::io::Result<()> {
        let path = self.resolve(relative);

        if let Some(parent) = path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let message = if self.config.strip_colors {
            strip_colors(message)
        } else {
            message.into()
        };

        let timestamp = chrono::Local::now().format(DATE_FORMAT).to_string();

        let _guard = self.lock.lock();
        let file = OpenOptions::new().create(true).append(true).open(&path)?;
        let mut writer = BufWriter::new(file);

        for line in message.trim().split('\n') {
            match prefix {
                Some(prefix) => writeln!(writer, "[{}] {}: {}", timestamp, prefix, line)?,
                None => writeln!(writer, "[{}] {}", timestamp, line)?,
            }
        }

        writer.flush()?;
        debug!(path = %path.display(), "Appended log entry");

        Ok(())
    }
}

impl Default for LogWriter {
    fn default() -> Self {
        Self::new(WriterConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn writer(dir: &TempDir, strip: bool) -> LogWriter {
        LogWriter::new(WriterConfig {
            base_dir: dir.path().to_path_buf(),
            strip_colors: strip,
        })
    }

    #[test]
    fn test_write_creates_directories() {
        let dir = TempDir::new().unwrap();
        let writer = writer(&dir, true);

        writer.write(RULES_PATH, Some("Steve"), "caught message").unwrap();

        let content = std::fs::read_to_string(dir.path().join(RULES_PATH)).unwrap();
        assert!(content.starts_with('['));
        assert!(content.trim_end().ends_with("Steve: caught message"));
    }

    #[test]
    fn test_write_splits_lines_and_appends() {
        let dir = TempDir::new().unwrap();
        let writer = writer(&dir, true);

        writer.write(ERROR_PATH, None, "first\nsecond\n").unwrap();
        writer.write(ERROR_PATH, None, "third").unwrap();

        let content = std::fs::read_to_string(dir.path().join(ERROR_PATH)).unwrap();
        let lines: Vec<_> = content.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("] first"));
        assert!(lines[2].ends_with("] third"));
    }

    #[test]
    fn test_strip_colors_option() {
        let dir = TempDir::new().unwrap();

        writer(&dir, true).write("a.txt", None, "§cred").unwrap();
        writer(&dir, false).write("b.txt", None, "§cred").unwrap();

        let a = std::fs::read_to_string(dir.path().join("a.txt")).unwrap();
        let b = std::fs::read_to_string(dir.path().join("b.txt")).unwrap();
        assert!(a.trim_end().ends_with("] red"));
        assert!(b.trim_end().ends_with("] §cred"));
    }

    #[test]
    fn test_config_defaults() {
        let config: WriterConfig = serde_yaml::from_str("{}").unwrap();
        assert!(config.strip_colors);
        assert_eq!(config.base_dir, PathBuf::from("."));
    }
}
