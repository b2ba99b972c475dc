use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dashmap::DashMap;

use dropfade_blob::{BlobError, BlobRef, BlobStore, BlobSummary, UploadedBlob};

/// Scheme and host of the URLs handed out by [`MemoryBlobStore`].
pub const MEMORY_URL_PREFIX: &str = "memory://blobs/";

#[derive(Debug, Clone)]
struct StoredBlob {
    data: Bytes,
    created_at: DateTime<Utc>,
}

/// In-memory blob store backed by a [`DashMap`].
///
/// Blobs never expire on their own; the lifecycle manager and reaper are
/// responsible for deleting them.
#[derive(Debug, Default)]
pub struct MemoryBlobStore {
    blobs: DashMap<String, StoredBlob>,
}

impl MemoryBlobStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Number of stored blobs.
    pub fn len(&self) -> usize {
        self.blobs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.blobs.is_empty()
    }

    /// Whether a blob is currently stored under the reference.
    pub fn contains(&self, blob_ref: &BlobRef) -> bool {
        self.blobs.contains_key(&blob_ref.id)
    }

    /// Insert a blob with an explicit creation time.
    pub fn insert_with_created_at(
        &self,
        data: Bytes,
        filename: &str,
        created_at: DateTime<Utc>,
    ) -> UploadedBlob {
        let id = format!("{}/{}", uuid::Uuid::new_v4().simple(), sanitize(filename));
        let size_bytes = data.len() as u64;
        self.blobs.insert(id.clone(), StoredBlob { data, created_at });
        UploadedBlob {
            public_url: format!("{MEMORY_URL_PREFIX}{id}"),
            blob_ref: BlobRef::new(id),
            size_bytes,
            created_at,
        }
    }
}

/// Keep filenames usable as a single URL path segment.
fn sanitize(filename: &str) -> String {
    let cleaned: String = filename
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    if cleaned.is_empty() {
        "blob".to_owned()
    } else {
        cleaned
    }
}

#[async_trait]
impl BlobStore for MemoryBlobStore {
    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        _content_type: &str,
    ) -> Result<UploadedBlob, BlobError> {
        Ok(self.insert_with_created_at(data, filename, Utc::now()))
    }

    async fn fetch(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError> {
        self.blobs
            .get(&blob_ref.id)
            .map(|b| b.data.clone())
            .ok_or_else(|| BlobError::NotFound(blob_ref.id.clone()))
    }

    async fn delete(&self, blob_ref: &BlobRef) -> Result<bool, BlobError> {
        Ok(self.blobs.remove(&blob_ref.id).is_some())
    }

    fn ref_from_url(&self, url: &str) -> Result<BlobRef, BlobError> {
        match url.strip_prefix(MEMORY_URL_PREFIX) {
            Some(id) if !id.is_empty() => Ok(BlobRef::new(id)),
            _ => Err(BlobError::InvalidReference(url.to_owned())),
        }
    }

    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<BlobSummary>, BlobError> {
        Ok(self
            .blobs
            .iter()
            .filter(|entry| entry.value().created_at < cutoff)
            .map(|entry| BlobSummary {
                blob_ref: BlobRef::new(entry.key().clone()),
                size_bytes: entry.value().data.len() as u64,
                created_at: entry.value().created_at,
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use chrono::Duration;

    use super::*;

    #[tokio::test]
    async fn conformance() {
        let store = MemoryBlobStore::new();
        dropfade_blob::testing::run_blob_conformance_tests(&store)
            .await
            .expect("conformance tests should pass");
        assert!(store.is_empty());
    }

    #[tokio::test]
    async fn url_round_trip_keeps_filename() {
        let store = MemoryBlobStore::new();
        let uploaded = store
            .upload(Bytes::from_static(b"x"), "my report.pdf", "application/pdf")
            .await
            .unwrap();
        assert!(uploaded.public_url.starts_with(MEMORY_URL_PREFIX));
        assert!(uploaded.public_url.ends_with("/my_report.pdf"));
        assert_eq!(store.ref_from_url(&uploaded.public_url).unwrap(), uploaded.blob_ref);
    }

    #[test]
    fn foreign_url_is_invalid_reference() {
        let store = MemoryBlobStore::new();
        assert!(matches!(
            store.ref_from_url("https://res.cloudinary.com/demo/raw/upload/x.pdf"),
            Err(BlobError::InvalidReference(_))
        ));
        assert!(matches!(
            store.ref_from_url(MEMORY_URL_PREFIX),
            Err(BlobError::InvalidReference(_))
        ));
    }

    #[tokio::test]
    async fn list_respects_backdated_creation() {
        let store = MemoryBlobStore::new();
        let old = store.insert_with_created_at(
            Bytes::from_static(b"old"),
            "old.txt",
            Utc::now() - Duration::days(3),
        );
        let fresh = store
            .upload(Bytes::from_static(b"new"), "new.txt", "text/plain")
            .await
            .unwrap();

        let listed = store
            .list_older_than(Utc::now() - Duration::days(1))
            .await
            .unwrap();
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].blob_ref, old.blob_ref);
        assert!(store.contains(&fresh.blob_ref));
    }

    #[test]
    fn sanitize_replaces_unsafe_characters() {
        assert_eq!(sanitize("a b/c?.png"), "a_b_c_.png");
        assert_eq!(sanitize(""), "blob");
    }
}
