use thiserror::Error;

/// Top-level error type for the Hawk system.
///
/// Expected empty outcomes (no entity, no matches, no stuck threads) are
/// never represented here; they are ordinary values with zero elements.
#[derive(Debug, Error)]
#[non_exhaustive]
pub enum HawkError {
    #[error("Configuration error: {0}")]
    Config(String),

    #[error("Data unavailable for project '{project}': {reason}")]
    DataUnavailable { project: String, reason: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(String),
}

impl HawkError {
    /// Shorthand for a loader failure on `project`.
    pub fn unavailable(project: impl Into<String>, reason: impl Into<String>) -> Self {
        HawkError::DataUnavailable {
            project: project.into(),
            reason: reason.into(),
        }
    }
}

impl From<toml::de::Error> for HawkError {
    fn from(err: toml::de::Error) -> Self {
        HawkError::Config(err.to_string())
    }
}

impl From<toml::ser::Error> for HawkError {
    fn from(err: toml::ser::Error) -> Self {
        HawkError::Config(err.to_string())
    }
}

impl From<serde_json::Error> for HawkError {
    fn from(err: serde_json::Error) -> Self {
        HawkError::Serialization(err.to_string())
    }
}

/// A specialized `Result` type for Hawk operations.
pub type Result<T> = std::result::Result<T, HawkError>;
