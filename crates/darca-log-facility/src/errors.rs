use std::fmt;
use std::path::PathBuf;

/// An error creating a logger or emitting a record
#[derive(Debug, thiserror::Error)]
pub enum LogError {
    #[error("failed to create log directory '{}': {source}", path.display())]
    CreateDirectory {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to open log file '{}' for append: {source}", path.display())]
    OpenFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to write log record to {target}: {source}")]
    Write {
        target: String,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to rotate log file '{}': {source}", path.display())]
    Rotate {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("no logger named '{name}' has been created")]
    NotFound { name: String },

    #[error("invalid logger name '{name}': {reason}")]
    InvalidName { name: String, reason: &'static str },

    #[error("failed to serialize JSON log record: {0}")]
    Json(#[from] serde_json::Error),
}

impl LogError {
    /// Returns `true` for failures caused by the filesystem or an output stream.
    pub fn is_io(&self) -> bool {
        matches!(
            self,
            LogError::CreateDirectory { .. }
                | LogError::OpenFile { .. }
                | LogError::Write { .. }
                | LogError::Rotate { .. }
        )
    }
}

/// Soft signal raised when an existing logger is requested with a different
/// configuration. The existing logger is returned unchanged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfigurationIgnored {
    pub name: String,
    pub fields: Vec<&'static str>,
}

impl fmt::Display for ConfigurationIgnored {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "logger '{}' already exists, ignoring configuration for: {}",
            self.name,
            self.fields.join(", ")
        )
    }
}
