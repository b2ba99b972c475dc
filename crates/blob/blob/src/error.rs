use thiserror::Error;

/// Errors that can occur during blob storage operations.
#[derive(Debug, Error)]
pub enum BlobError {
    /// The requested blob was not found under any resource kind.
    #[error("blob not found: {0}")]
    NotFound(String),

    /// The blob exceeds the maximum allowed size.
    #[error("blob too large: {size} bytes exceeds limit of {limit} bytes")]
    TooLarge {
        /// Actual size.
        size: u64,
        /// Maximum allowed size.
        limit: u64,
    },

    /// A storage backend error occurred (network, auth, unexpected reply).
    #[error("blob storage error: {0}")]
    Storage(String),

    /// A public URL could not be mapped back to a blob reference.
    #[error("invalid blob reference: {0}")]
    InvalidReference(String),

    /// The content type is invalid or not allowed.
    #[error("invalid content type: {0}")]
    InvalidContentType(String),
}
