use thiserror::Error;

/// Errors from metadata store operations.
///
/// A missing key is never an error: lookups return `None` and deletes return
/// `false`. Every variant here means the backend could not answer.
#[derive(Debug, Error)]
pub enum StateError {
    #[error("connection error: {0}")]
    Connection(String),

    #[error("serialization error: {0}")]
    Serialization(String),

    #[error("backend error: {0}")]
    Backend(String),

    #[error("operation timed out after {0:?}")]
    Timeout(std::time::Duration),
}
