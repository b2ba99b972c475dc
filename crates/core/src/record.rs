use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::expiry::MAX_EXPIRY_SECONDS;

/// Current wall-clock time in milliseconds since the Unix epoch.
pub fn now_ms() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// What a drop carries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub enum DropKind {
    /// An uploaded file whose bytes live in the blob store.
    File,
    /// A short text note stored inline in the record.
    Text,
}

impl DropKind {
    /// Return a string representation of the kind.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::File => "file",
            Self::Text => "text",
        }
    }
}

impl std::fmt::Display for DropKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// The persisted metadata for one drop, stored under `drop:<CODE>`.
///
/// Serialized as `{type, content, filename?, expiresAt, hasDownloaded,
/// createdAt}`. For [`DropKind::Text`] `content` is the note itself; for
/// [`DropKind::File`] it is the public URL of the blob.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct DropRecord {
    /// File or text.
    #[serde(rename = "type")]
    pub kind: DropKind,
    /// Inline text, or the blob's public URL.
    pub content: String,
    /// Original filename (file drops only).
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub filename: Option<String>,
    /// Absolute expiry, in milliseconds since the epoch.
    pub expires_at: i64,
    /// Set once the one-time access has been used.
    #[serde(rename = "hasDownloaded", default)]
    pub consumed: bool,
    /// Creation time, in milliseconds since the epoch.
    pub created_at: i64,
}

impl DropRecord {
    /// Build a text record created at `created_at` that lives `ttl_seconds`.
    pub fn text(
        content: impl Into<String>,
        created_at: i64,
        ttl_seconds: u64,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            kind: DropKind::Text,
            content: content.into(),
            filename: None,
            expires_at: expiry_from(created_at, ttl_seconds)?,
            consumed: false,
            created_at,
        })
    }

    /// Build a file record pointing at the blob behind `url`.
    pub fn file(
        url: impl Into<String>,
        filename: impl Into<String>,
        created_at: i64,
        ttl_seconds: u64,
    ) -> Result<Self, CoreError> {
        Ok(Self {
            kind: DropKind::File,
            content: url.into(),
            filename: Some(filename.into()),
            expires_at: expiry_from(created_at, ttl_seconds)?,
            consumed: false,
            created_at,
        })
    }

    /// Whether the record is past its expiry at `now` (milliseconds).
    pub fn is_expired(&self, now: i64) -> bool {
        now > self.expires_at
    }

    /// Milliseconds left before expiry at `now`, floored at zero.
    pub fn remaining_ms(&self, now: i64) -> u64 {
        u64::try_from(self.expires_at.saturating_sub(now)).unwrap_or(0)
    }
}

fn expiry_from(created_at: i64, ttl_seconds: u64) -> Result<i64, CoreError> {
    if ttl_seconds == 0 || ttl_seconds > MAX_EXPIRY_SECONDS {
        return Err(CoreError::InvalidExpiry(ttl_seconds));
    }
    // Bounded by MAX_EXPIRY_SECONDS, so the conversion cannot fail.
    let ttl_ms = i64::try_from(ttl_seconds * 1000).unwrap_or(i64::MAX);
    Ok(created_at.saturating_add(ttl_ms))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn text_record_serializes_to_persisted_shape() {
        let record = DropRecord::text("hello", 1_000, 300).unwrap();
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "text");
        assert_eq!(json["content"], "hello");
        assert_eq!(json["expiresAt"], 301_000);
        assert_eq!(json["hasDownloaded"], false);
        assert_eq!(json["createdAt"], 1_000);
        assert!(json.get("filename").is_none());
    }

    #[test]
    fn file_record_keeps_filename() {
        let record =
            DropRecord::file("memory://blobs/x.pdf", "a.pdf", 0, 3600).unwrap();
        let json = serde_json::to_string(&record).unwrap();
        assert!(json.contains("\"filename\":\"a.pdf\""));
        let back: DropRecord = serde_json::from_str(&json).unwrap();
        assert_eq!(back, record);
    }

    #[test]
    fn parses_record_written_without_download_flag() {
        let raw = r#"{"type":"file","content":"u","filename":"f.png","expiresAt":10,"createdAt":1}"#;
        let record: DropRecord = serde_json::from_str(raw).unwrap();
        assert_eq!(record.kind, DropKind::File);
        assert!(!record.consumed);
    }

    #[test]
    fn expiry_is_strictly_after_creation() {
        let record = DropRecord::text("x", 5_000, 1).unwrap();
        assert!(record.expires_at > record.created_at);
        assert!(!record.is_expired(6_000));
        assert!(record.is_expired(6_001));
        assert_eq!(record.remaining_ms(5_500), 500);
        assert_eq!(record.remaining_ms(9_000), 0);
    }

    #[test]
    fn rejects_zero_and_oversized_windows() {
        assert_eq!(
            DropRecord::text("x", 0, 0),
            Err(CoreError::InvalidExpiry(0))
        );
        assert!(DropRecord::text("x", 0, MAX_EXPIRY_SECONDS + 1).is_err());
    }
}
