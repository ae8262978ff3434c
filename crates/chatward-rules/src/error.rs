//! Load-time errors for rule files and handler definitions
//!
//! Every variant carries enough context (file, 1-based line, offending text
//! or the short form of the rule being built) for an operator to find and fix
//! the problem without a debugger.

use std::path::Path;

/// Error raised while loading rule files or handler definitions
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    /// A directive appeared before the first `match` line
    #[error("{file}:{line}: cannot define an operator when no rule is being created: '{text}'")]
    OperatorOutsideRule {
        file: String,
        line: usize,
        text: String,
    },

    /// A directive not understood by the parser
    #[error("{file}:{line}: unknown operator '{text}' in {rule}")]
    UnknownOperator {
        file: String,
        line: usize,
        text: String,
        rule: String,
    },

    /// A directive not valid for packet rules
    #[error("{file}:{line}: unknown packet rule operator '{text}' in {rule}")]
    UnknownPacketOperator {
        file: String,
        line: usize,
        text: String,
        rule: String,
    },

    /// A directive that sets a field which is already set
    #[error("{file}:{line}: {directive} already set on {rule}")]
    DuplicateDirective {
        file: String,
        line: usize,
        directive: String,
        rule: String,
    },

    /// Two rules with the same representation in one file
    #[error("{file}:{line}: {file} already contains {rule}")]
    DuplicateRule {
        file: String,
        line: usize,
        rule: String,
    },

    /// A category loaded twice into the same rule set
    #[error("rules from {file} are already loaded")]
    DuplicateCategory { file: String },

    /// A directive with a missing or invalid argument
    #[error("{file}:{line}: malformed '{text}': {reason}")]
    Malformed {
        file: String,
        line: usize,
        text: String,
        reason: String,
    },

    /// `handle as` referencing a handler that does not exist
    #[error("{file}:{line}: unknown handler '{name}'")]
    UnknownHandler {
        file: String,
        line: usize,
        name: String,
    },

    /// A handler definition violating its invariants
    #[error("invalid handler '{name}': {reason}")]
    InvalidHandler { name: String, reason: String },

    /// Reading or writing a rule file failed
    #[error("failed to access {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The handler definitions are not valid YAML
    #[error("failed to parse {path}: {source}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
}

impl LoadError {
    pub(crate) fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.display().to_string(),
            source,
        }
    }

    pub(crate) fn invalid_handler(name: &str, reason: impl Into<String>) -> Self {
        Self::InvalidHandler {
            name: name.to_string(),
            reason: reason.into(),
        }
    }
}

impl From<LoadError> for chatward_core::Error {
    fn from(err: LoadError) -> Self {
        chatward_core::Error::load(err.to_string())
    }
}
