use std::fmt;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// How a backend classified a stored resource.
///
/// Backends that distinguish images from generic binaries may be ambiguous
/// about which class an upload landed in, so lookups try kinds in
/// [`ResourceKind::LOOKUP_ORDER`] when the kind is unknown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceKind {
    Image,
    Raw,
    Video,
}

impl ResourceKind {
    /// Order in which resource kinds are tried when the kind is unknown.
    pub const LOOKUP_ORDER: [ResourceKind; 3] = [Self::Image, Self::Raw, Self::Video];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Raw => "raw",
            Self::Video => "video",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "image" => Some(Self::Image),
            "raw" => Some(Self::Raw),
            "video" => Some(Self::Video),
            _ => None,
        }
    }

    /// Kinds to try for a reference: the hinted kind first, then the rest of
    /// the lookup order.
    pub fn lookup_order(hint: Option<Self>) -> Vec<Self> {
        let mut order = Vec::with_capacity(3);
        if let Some(kind) = hint {
            order.push(kind);
        }
        order.extend(Self::LOOKUP_ORDER.into_iter().filter(|k| Some(*k) != hint));
        order
    }
}

impl fmt::Display for ResourceKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Adapter-native reference to a stored blob.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct BlobRef {
    /// Backend identifier (for Cloudinary, the public id including folder).
    pub id: String,
    /// Resource kind, when it could be derived from the URL.
    pub kind: Option<ResourceKind>,
}

impl BlobRef {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: None,
        }
    }

    #[must_use]
    pub fn with_kind(mut self, kind: ResourceKind) -> Self {
        self.kind = Some(kind);
        self
    }
}

impl fmt::Display for BlobRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.kind {
            Some(kind) => write!(f, "{kind}/{}", self.id),
            None => f.write_str(&self.id),
        }
    }
}

/// Result of a successful upload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UploadedBlob {
    /// Reference usable for fetch and delete.
    pub blob_ref: BlobRef,
    /// Fetchable URL; this is what a drop record stores.
    pub public_url: String,
    /// Size in bytes as accepted by the backend.
    pub size_bytes: u64,
    /// When the backend recorded the upload.
    pub created_at: DateTime<Utc>,
}

/// A listed blob, used by the background reaper.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlobSummary {
    pub blob_ref: BlobRef,
    pub size_bytes: u64,
    pub created_at: DateTime<Utc>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lookup_order_without_hint() {
        assert_eq!(
            ResourceKind::lookup_order(None),
            vec![ResourceKind::Image, ResourceKind::Raw, ResourceKind::Video]
        );
    }

    #[test]
    fn lookup_order_puts_hint_first() {
        assert_eq!(
            ResourceKind::lookup_order(Some(ResourceKind::Video)),
            vec![ResourceKind::Video, ResourceKind::Image, ResourceKind::Raw]
        );
    }

    #[test]
    fn resource_kind_parse() {
        assert_eq!(ResourceKind::parse("raw"), Some(ResourceKind::Raw));
        assert_eq!(ResourceKind::parse("RAW"), None);
    }

    #[test]
    fn blob_ref_display() {
        let r = BlobRef::new("dropfade/report.pdf").with_kind(ResourceKind::Raw);
        assert_eq!(r.to_string(), "raw/dropfade/report.pdf");
        assert_eq!(BlobRef::new("abc").to_string(), "abc");
    }
}
