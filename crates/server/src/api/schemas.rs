use dropfade_core::{DropKind, DropRecord};
use dropfade_lifecycle::{CreatedDrop, DropPreview, MetricsSnapshot};
use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// Error body returned by every failing route.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct ErrorResponse {
    /// Human-readable error message.
    #[schema(example = "File not found or expired")]
    pub error: String,
}

/// Health check response.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct HealthResponse {
    /// `ok` when the metadata store answers, `degraded` otherwise.
    #[schema(example = "ok")]
    pub status: String,
    /// Metadata store reachability.
    #[schema(example = "ok")]
    pub state_store: String,
    /// Current lifecycle counters.
    pub metrics: MetricsSnapshot,
}

/// JSON body for creating a text drop.
#[derive(Debug, Deserialize, ToSchema)]
pub struct UploadTextRequest {
    /// The note to share.
    #[schema(example = "the wifi password is hunter2")]
    #[serde(default)]
    pub text: Option<String>,
    /// Expiry token: `5min`, `1hour` or `1day`. Defaults to one hour.
    #[schema(example = "1hour")]
    #[serde(default)]
    pub expiry: Option<String>,
}

/// Response for a newly created drop.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct UploadResponse {
    #[schema(example = true)]
    pub success: bool,
    /// Access code to share with the recipient.
    #[schema(example = "K7Q2MX")]
    pub code: String,
    #[serde(rename = "type")]
    pub kind: DropKind,
    /// Original file name (file drops only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "report.pdf")]
    pub filename: Option<String>,
    /// Epoch milliseconds after which the drop is gone.
    #[schema(example = 1_700_003_600_000_i64)]
    pub expires_at: i64,
}

impl From<CreatedDrop> for UploadResponse {
    fn from(created: CreatedDrop) -> Self {
        Self {
            success: true,
            code: created.code,
            kind: created.kind,
            filename: created.filename,
            expires_at: created.expires_at,
        }
    }
}

/// A live drop as shown before it is consumed.
///
/// Text drops carry their note. File drops never expose the stored blob URL,
/// so the bytes are only reachable through `GET /download/{code}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct DropInfo {
    #[serde(rename = "type")]
    pub kind: DropKind,
    /// The note, for text drops only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "the wifi password is hunter2")]
    pub content: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    #[schema(example = "report.pdf")]
    pub filename: Option<String>,
    #[schema(example = 1_700_003_600_000_i64)]
    pub expires_at: i64,
    #[schema(example = 1_700_000_000_000_i64)]
    pub created_at: i64,
    pub has_downloaded: bool,
    /// Seconds until the drop expires.
    #[schema(example = 3540)]
    pub remaining_seconds: u64,
}

/// Response for a non-destructive peek.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct PeekResponse {
    #[schema(example = true)]
    pub success: bool,
    pub data: DropInfo,
}

impl From<DropPreview> for PeekResponse {
    fn from(preview: DropPreview) -> Self {
        let DropRecord {
            kind,
            content,
            filename,
            expires_at,
            consumed,
            created_at,
        } = preview.record;
        Self {
            success: true,
            data: DropInfo {
                kind,
                content: (kind == DropKind::Text).then_some(content),
                filename,
                expires_at,
                created_at,
                has_downloaded: consumed,
                remaining_seconds: preview.remaining_seconds,
            },
        }
    }
}

/// Body for `POST /file/{code}`.
#[derive(Debug, Deserialize, ToSchema)]
pub struct FileActionRequest {
    /// Only `download` is supported.
    #[schema(example = "download")]
    pub action: String,
}

/// Response for a successful `POST /file/{code}`.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct FileActionResponse {
    #[schema(example = true)]
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: DropKind,
}

/// Response for downloading a text drop.
#[derive(Debug, Serialize, Deserialize, ToSchema)]
pub struct TextDownloadResponse {
    #[schema(example = true)]
    pub success: bool,
    #[serde(rename = "type")]
    pub kind: DropKind,
    pub content: String,
    /// Suggested file name for clients that save the note.
    #[schema(example = "note-K7Q2MX.txt")]
    pub filename: String,
    #[schema(example = "Text has been permanently deleted after this access")]
    pub message: String,
}
