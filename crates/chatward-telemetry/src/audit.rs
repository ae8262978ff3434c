//! Audit trail for rule violations and runtime faults
//!
//! The rule engine never writes files itself. It hands [`AuditEntry`] values
//! to an [`AuditSink`], which decides where they end up.

use crate::writer::{LogWriter, ERROR_PATH, RULES_PATH};
use parking_lot::Mutex;
use serde::{Deserialize, Serialize};
use std::time::SystemTime;
use tracing::warn;

/// What an audit entry records
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuditKind {
    /// A rule with `then log` matched
    RuleViolation,

    /// A handler asked for its message to be written to a file
    HandlerFile {
        /// Path relative to the writer's base directory
        target: String,
    },

    /// A pattern exceeded its time budget
    RegexTimeout,

    /// A pattern failed to compile or execute
    MalformedRegex,
}

impl AuditKind {
    /// Relative file path this kind of entry is written to
    pub fn target(&self) -> &str {
        match self {
            Self::RuleViolation => RULES_PATH,
            Self::HandlerFile { target } => target,
            Self::RegexTimeout | Self::MalformedRegex => ERROR_PATH,
        }
    }

    /// Whether this entry records a runtime fault rather than a violation
    pub fn is_fault(&self) -> bool {
        matches!(self, Self::RegexTimeout | Self::MalformedRegex)
    }
}

/// A single audit entry
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuditEntry {
    /// Entry kind, decides the destination
    pub kind: AuditKind,

    /// Name of the player responsible, if any
    pub actor: Option<String>,

    /// Message body, may span several lines
    pub message: String,

    /// When the entry was created
    pub timestamp: SystemTime,
}

impl AuditEntry {
    /// Create a new audit entry
    pub fn new(kind: AuditKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            actor: None,
            message: message.into(),
            timestamp: SystemTime::now(),
        }
    }

    /// Set the responsible player
    pub fn with_actor(mut self, actor: impl Into<String>) -> Self {
        self.actor = Some(actor.into());
        self
    }
}

/// Destination for audit entries
pub trait AuditSink: Send + Sync {
    /// Record an entry. Failures are reported, never propagated.
    fn record(&self, entry: AuditEntry);
}

/// Sink appending entries to flat files through a [`LogWriter`]
pub struct FileAuditSink {
    writer: LogWriter,
}

impl FileAuditSink {
    pub fn new(writer: LogWriter) -> Self {
        Self { writer }
    }

    pub fn writer(&self) -> &LogWriter {
        &self.writer
    }
}

impl AuditSink for FileAuditSink {
    fn record(&self, entry: AuditEntry) {
        let target = entry.kind.target();

        if let Err(e) = self
            .writer
            .write(target, entry.actor.as_deref(), &entry.message)
        {
            warn!(target_file = %target, error = %e, "Failed to write audit entry");
        }
    }
}

/// Sink keeping entries in memory
#[derive(Default)]
pub struct MemoryAuditSink {
    entries: Mutex<Vec<AuditEntry>>,
}

impl MemoryAuditSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// All recorded entries, oldest first
    pub fn entries(&self) -> Vec<AuditEntry> {
        self.entries.lock().clone()
    }

    /// Entries matching `kind`
    pub fn of_kind(&self, kind: &AuditKind) -> Vec<AuditEntry> {
        self.entries
            .lock()
            .iter()
            .filter(|entry| &entry.kind == kind)
            .cloned()
            .collect()
    }

    pub fn len(&self) -> usize {
        self.entries.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.lock().is_empty()
    }

    pub fn clear(&self) {
        self.entries.lock().clear();
    }
}

impl AuditSink for MemoryAuditSink {
    fn record(&self, entry: AuditEntry) {
        self.entries.lock().push(entry);
    }
}
