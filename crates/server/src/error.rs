use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use dropfade_lifecycle::{GoneReason, LifecycleError};
use thiserror::Error;
use tracing::error;

/// Errors that can occur when running the dropfade server.
#[derive(Debug, Error)]
pub enum ServerError {
    /// A configuration error.
    #[error("configuration error: {0}")]
    Config(String),

    /// An I/O error (e.g. binding the listener).
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    /// A drop lifecycle error surfaced through the API.
    #[error(transparent)]
    Lifecycle(#[from] LifecycleError),

    /// The request was malformed before reaching the lifecycle layer.
    #[error("bad request: {0}")]
    BadRequest(String),

    /// A multipart body could not be read.
    #[error("multipart error: {message}")]
    Multipart {
        status: StatusCode,
        message: String,
    },
}

impl From<axum::extract::multipart::MultipartError> for ServerError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        Self::Multipart {
            status: err.status(),
            message: err.body_text(),
        }
    }
}

impl ServerError {
    /// Status code and client-facing message.
    ///
    /// Backend details are logged, never returned.
    fn status_and_message(&self) -> (StatusCode, String) {
        match self {
            Self::Config(msg) => (StatusCode::INTERNAL_SERVER_ERROR, msg.clone()),
            Self::Io(e) => (StatusCode::INTERNAL_SERVER_ERROR, e.to_string()),
            Self::BadRequest(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
            Self::Multipart { status, message } => (*status, message.clone()),
            Self::Lifecycle(err) => lifecycle_status(err),
        }
    }
}

fn lifecycle_status(err: &LifecycleError) -> (StatusCode, String) {
    match err {
        LifecycleError::NotFound(_) => (StatusCode::NOT_FOUND, "File not found or expired".into()),
        LifecycleError::Gone {
            reason: GoneReason::Consumed,
            ..
        } => (StatusCode::GONE, "File has already been accessed".into()),
        LifecycleError::Gone {
            reason: GoneReason::Expired,
            ..
        } => (
            StatusCode::GONE,
            "File has expired and has been permanently deleted".into(),
        ),
        LifecycleError::Oversize { .. } => (StatusCode::PAYLOAD_TOO_LARGE, "File too large".into()),
        LifecycleError::Validation(msg) => (StatusCode::BAD_REQUEST, msg.clone()),
        LifecycleError::StoreUnavailable(_) => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Storage is temporarily unavailable".into(),
        ),
        LifecycleError::CodeSpaceExhausted { .. } => (
            StatusCode::SERVICE_UNAVAILABLE,
            "Could not allocate an access code".into(),
        ),
        LifecycleError::DeliveryFailure(_) => (
            StatusCode::INTERNAL_SERVER_ERROR,
            "Failed to download file".into(),
        ),
        LifecycleError::Configuration(_) => {
            (StatusCode::INTERNAL_SERVER_ERROR, "Internal error".into())
        }
    }
}

impl IntoResponse for ServerError {
    fn into_response(self) -> Response {
        let (status, message) = self.status_and_message();
        if status.is_server_error() {
            error!(error = %self, status = status.as_u16(), "request failed");
        }

        let body = serde_json::json!({ "error": message });
        (status, axum::Json(body)).into_response()
    }
}
