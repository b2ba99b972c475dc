use std::fmt;

use dropfade_blob::BlobError;
use dropfade_core::CoreError;
use dropfade_state::StateError;
use thiserror::Error;

/// Why a drop that existed can no longer be accessed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GoneReason {
    /// The one-time access was already used.
    Consumed,
    /// The drop outlived its expiry window and was just reclaimed.
    Expired,
}

impl fmt::Display for GoneReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Consumed => "already accessed",
            Self::Expired => "expired",
        })
    }
}

/// Errors returned by drop lifecycle operations.
#[derive(Debug, Error)]
pub enum LifecycleError {
    /// No drop exists for the code: it never existed, was already fully
    /// reclaimed, or another request won the claim.
    #[error("drop not found: {0}")]
    NotFound(String),

    /// The drop existed but was consumed or has just expired.
    #[error("drop {code} is gone: {reason}")]
    Gone {
        code: String,
        reason: GoneReason,
    },

    /// An uploaded file exceeds the configured size cap.
    #[error("file too large: {size} bytes exceeds limit of {limit} bytes")]
    Oversize {
        size: u64,
        limit: u64,
    },

    /// The request is missing content or violates a bound.
    #[error("{0}")]
    Validation(String),

    /// A backing store could not be reached or rejected the request.
    #[error("store unavailable: {0}")]
    StoreUnavailable(String),

    /// The access right was spent but the content could not be delivered.
    /// Retrying will not succeed.
    #[error("delivery failed: {0}")]
    DeliveryFailure(String),

    /// Every generated code collided with an existing drop.
    #[error("no free code after {attempts} attempts")]
    CodeSpaceExhausted {
        attempts: u32,
    },

    /// The manager was misconfigured (e.g. missing required components).
    #[error("configuration error: {0}")]
    Configuration(String),
}

impl LifecycleError {
    /// Whether the error means "this code does not give access", merging
    /// `NotFound` and `Gone` for callers that must not leak existence.
    pub fn is_inaccessible(&self) -> bool {
        matches!(self, Self::NotFound(_) | Self::Gone { .. })
    }
}

impl From<StateError> for LifecycleError {
    fn from(err: StateError) -> Self {
        Self::StoreUnavailable(err.to_string())
    }
}

impl From<CoreError> for LifecycleError {
    fn from(err: CoreError) -> Self {
        Self::Validation(err.to_string())
    }
}

impl From<BlobError> for LifecycleError {
    fn from(err: BlobError) -> Self {
        match err {
            BlobError::TooLarge { size, limit } => Self::Oversize { size, limit },
            BlobError::InvalidContentType(ct) => {
                Self::Validation(format!("invalid content type: {ct}"))
            }
            other => Self::StoreUnavailable(other.to_string()),
        }
    }
}
