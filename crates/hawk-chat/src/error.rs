//! Error types for the conversational analysis engine.

use hawk_core::error::HawkError;

/// Errors from a conversation session.
///
/// Empty answers are not errors: a query that matches nothing yields a
/// payload with `total_matches == 0`.
#[derive(Debug, thiserror::Error)]
pub enum ChatError {
    #[error("no project loaded")]
    NotLoaded,
    #[error("data unavailable for project '{project}': {reason}")]
    DataUnavailable { project: String, reason: String },
    #[error("query exceeds maximum length of {0} characters")]
    QueryTooLong(usize),
    #[error("configuration error: {0}")]
    Config(String),
    /// Any other failure from the core layer, shown as-is.
    #[error(transparent)]
    Core(HawkError),
}

impl From<HawkError> for ChatError {
    fn from(err: HawkError) -> Self {
        match err {
            HawkError::DataUnavailable { project, reason } => {
                ChatError::DataUnavailable { project, reason }
            }
            HawkError::Config(msg) => ChatError::Config(msg),
            other => ChatError::Core(other),
        }
    }
}
