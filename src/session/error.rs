use std::path::PathBuf;

/// Errors surfaced by session operations
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// `set`/`remove` was called outside a request started for this session
    #[error("Session '{name}' has not been started for the current request")]
    NotStarted { name: String },

    /// Persisting a record failed
    #[error("IO error on {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A value or record could not be converted to or from JSON
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

impl SessionError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }

    /// Whether the error only signals a missing `start()`
    pub fn is_not_started(&self) -> bool {
        matches!(self, Self::NotStarted { .. })
    }
}

/// Errors produced while validating session options
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("storage.directory is required")]
    MissingDirectory,

    #[error("Invalid session name: {0:?}")]
    InvalidName(String),

    #[error("Invalid cookie name: {0:?}")]
    InvalidCookieName(String),

    #[error("id_length must be between 1 and {max}, got {value}")]
    InvalidIdLength { value: usize, max: usize },

    #[error("Failed to read config file {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse TOML configuration: {0}")]
    Parse(#[from] toml::de::Error),
}
