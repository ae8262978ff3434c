//! Error types for chatward

/// Result type alias using chatward's Error type
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for chatward operations
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// Rule or handler loading errors
    #[error("load error: {0}")]
    Load(String),

    /// Configuration errors
    #[error("configuration error: {0}")]
    Config(String),

    /// File IO errors
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// YAML errors (settings, handler definitions)
    #[error("yaml error: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// Generic internal errors
    #[error("internal error: {0}")]
    Internal(String),
}

impl Error {
    /// Create a new load error
    pub fn load(msg: impl Into<String>) -> Self {
        Self::Load(msg.into())
    }

    /// Create a new configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create a new internal error
    pub fn internal(msg: impl Into<String>) -> Self {
        Self::Internal(msg.into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::load("rules.txt:3: unknown operator");
        assert_eq!(err.to_string(), "load error: rules.txt:3: unknown operator");

        let err = Error::config("bad timeout");
        assert_eq!(err.to_string(), "configuration error: bad timeout");
    }

    #[test]
    fn test_io_conversion() {
        let io = std::io::Error::new(std::io::ErrorKind::NotFound, "missing");
        let err: Error = io.into();
        assert!(matches!(err, Error::Io(_)));
    }
}
