//! Shared conformance suite that every [`BlobStore`] backend runs.

use bytes::Bytes;
use chrono::{Duration, Utc};

use crate::error::BlobError;
use crate::store::BlobStore;

/// Run the conformance tests against the given blob store.
pub async fn run_blob_conformance_tests(store: &dyn BlobStore) -> Result<(), BlobError> {
    test_upload_fetch(store).await?;
    test_ref_from_url(store).await?;
    test_delete_idempotent(store).await?;
    test_fetch_after_delete(store).await?;
    test_list_older_than(store).await?;
    Ok(())
}

async fn test_upload_fetch(store: &dyn BlobStore) -> Result<(), BlobError> {
    let data = Bytes::from_static(b"%PDF-1.4 conformance");
    let uploaded = store
        .upload(data.clone(), "conformance.pdf", "application/pdf")
        .await?;
    assert_eq!(uploaded.size_bytes, data.len() as u64);

    let fetched = store.fetch(&uploaded.blob_ref).await?;
    assert_eq!(fetched, data, "fetched bytes must match uploaded bytes");

    store.delete(&uploaded.blob_ref).await?;
    Ok(())
}

async fn test_ref_from_url(store: &dyn BlobStore) -> Result<(), BlobError> {
    let uploaded = store
        .upload(Bytes::from_static(b"ref"), "ref-test.txt", "text/plain")
        .await?;

    let parsed = store.ref_from_url(&uploaded.public_url)?;
    assert_eq!(parsed.id, uploaded.blob_ref.id, "URL must map back to the same id");

    let fetched = store.fetch(&parsed).await?;
    assert_eq!(fetched.as_ref(), b"ref");

    store.delete(&parsed).await?;
    Ok(())
}

async fn test_delete_idempotent(store: &dyn BlobStore) -> Result<(), BlobError> {
    let uploaded = store
        .upload(Bytes::from_static(b"gone"), "gone.bin", "application/octet-stream")
        .await?;

    assert!(store.delete(&uploaded.blob_ref).await?, "first delete removes");
    assert!(
        !store.delete(&uploaded.blob_ref).await?,
        "second delete reports false"
    );
    Ok(())
}

async fn test_fetch_after_delete(store: &dyn BlobStore) -> Result<(), BlobError> {
    let uploaded = store
        .upload(Bytes::from_static(b"once"), "once.png", "image/png")
        .await?;
    store.delete(&uploaded.blob_ref).await?;

    let result = store.fetch(&uploaded.blob_ref).await;
    assert!(
        matches!(result, Err(BlobError::NotFound(_))),
        "fetch after delete must be NotFound"
    );
    Ok(())
}

async fn test_list_older_than(store: &dyn BlobStore) -> Result<(), BlobError> {
    let uploaded = store
        .upload(Bytes::from_static(b"old"), "listed.txt", "text/plain")
        .await?;

    let future = Utc::now() + Duration::seconds(60);
    let listed = store.list_older_than(future).await?;
    assert!(
        listed.iter().any(|b| b.blob_ref.id == uploaded.blob_ref.id),
        "blob must be listed before a future cutoff"
    );

    let past = Utc::now() - Duration::days(1);
    let listed = store.list_older_than(past).await?;
    assert!(
        !listed.iter().any(|b| b.blob_ref.id == uploaded.blob_ref.id),
        "fresh blob must not be listed before a past cutoff"
    );

    store.delete(&uploaded.blob_ref).await?;
    Ok(())
}
