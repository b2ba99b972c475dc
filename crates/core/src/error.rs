use thiserror::Error;

/// Validation errors raised by core types.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CoreError {
    /// The access code is empty or contains characters outside `A-Z0-9`.
    #[error("invalid code: {0}")]
    InvalidCode(String),

    /// The expiry window is zero or exceeds the supported maximum.
    #[error("invalid expiry: {0} seconds")]
    InvalidExpiry(u64),

    /// The configured code length is outside the supported range.
    #[error("code length {length} outside {min}..={max}")]
    InvalidCodeLength {
        /// Requested length.
        length: usize,
        /// Smallest supported length.
        min: usize,
        /// Largest supported length.
        max: usize,
    },
}
