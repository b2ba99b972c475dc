use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};

use crate::error::BlobError;
use crate::types::{BlobRef, BlobSummary, UploadedBlob};

/// Pluggable blob storage backend for file drops.
///
/// A drop record stores only the public URL returned by [`upload`](Self::upload);
/// [`ref_from_url`](Self::ref_from_url) maps it back to the native reference
/// needed by [`fetch`](Self::fetch) and [`delete`](Self::delete).
#[async_trait]
pub trait BlobStore: Send + Sync {
    /// Store binary content and return its reference and public URL.
    ///
    /// Document-class content must be stored without lossy transformation.
    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadedBlob, BlobError>;

    /// Retrieve the full content of a blob.
    ///
    /// Returns [`BlobError::NotFound`] when no candidate location serves it.
    async fn fetch(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError>;

    /// Delete a blob. Returns `true` if it existed; deleting an already
    /// deleted reference returns `false`, not an error.
    async fn delete(&self, blob_ref: &BlobRef) -> Result<bool, BlobError>;

    /// Derive the native reference from a public URL produced by `upload`.
    fn ref_from_url(&self, url: &str) -> Result<BlobRef, BlobError>;

    /// List blobs created strictly before `cutoff`.
    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<BlobSummary>, BlobError>;
}
