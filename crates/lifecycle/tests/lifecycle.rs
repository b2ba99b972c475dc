use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use dropfade_blob::{BlobError, BlobRef, BlobStore, BlobSummary, UploadedBlob};
use dropfade_blob_memory::MemoryBlobStore;
use dropfade_core::{CodeGenerator, DropKind, DropRecord, Limits, now_ms};
use dropfade_lifecycle::{
    Delivery, DropContent, DropManager, DropManagerBuilder, GoneReason, LifecycleError, Reaper,
    ReaperConfig,
};
use dropfade_state::{KeyKind, StateError, StateKey, StateStore};
use dropfade_state_memory::MemoryStateStore;

struct Harness {
    manager: Arc<DropManager>,
    state: Arc<MemoryStateStore>,
    blobs: Arc<MemoryBlobStore>,
}

fn harness() -> Harness {
    harness_with(DropManagerBuilder::new())
}

fn harness_with(builder: DropManagerBuilder) -> Harness {
    let state = Arc::new(MemoryStateStore::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let manager = builder
        .state(state.clone())
        .blob(blobs.clone())
        .build()
        .expect("manager should build");
    Harness {
        manager: Arc::new(manager),
        state,
        blobs,
    }
}

fn file(data: &'static [u8], filename: &str) -> DropContent {
    DropContent::File {
        data: Bytes::from_static(data),
        filename: filename.to_owned(),
        content_type: None,
    }
}

/// Hands out a fixed sequence of codes, repeating the last one.
struct SequenceGenerator {
    codes: Vec<&'static str>,
    next: AtomicUsize,
}

impl SequenceGenerator {
    fn new(codes: Vec<&'static str>) -> Self {
        Self {
            codes,
            next: AtomicUsize::new(0),
        }
    }
}

impl CodeGenerator for SequenceGenerator {
    fn generate(&self) -> String {
        let i = self.next.fetch_add(1, Ordering::SeqCst);
        self.codes[i.min(self.codes.len() - 1)].to_owned()
    }
}

/// Blob store whose fetches always fail.
struct FlakyBlobStore {
    inner: MemoryBlobStore,
}

#[async_trait]
impl BlobStore for FlakyBlobStore {
    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadedBlob, BlobError> {
        self.inner.upload(data, filename, content_type).await
    }

    async fn fetch(&self, _blob_ref: &BlobRef) -> Result<Bytes, BlobError> {
        Err(BlobError::Storage("connection reset".into()))
    }

    async fn delete(&self, blob_ref: &BlobRef) -> Result<bool, BlobError> {
        self.inner.delete(blob_ref).await
    }

    fn ref_from_url(&self, url: &str) -> Result<BlobRef, BlobError> {
        self.inner.ref_from_url(url)
    }

    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<BlobSummary>, BlobError> {
        self.inner.list_older_than(cutoff).await
    }
}

/// Metadata store that rejects every write.
struct ReadOnlyStateStore;

#[async_trait]
impl StateStore for ReadOnlyStateStore {
    async fn check_and_set(
        &self,
        _key: &StateKey,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<bool, StateError> {
        Err(StateError::Connection("connection refused".into()))
    }

    async fn get(&self, _key: &StateKey) -> Result<Option<String>, StateError> {
        Ok(None)
    }

    async fn set(
        &self,
        _key: &StateKey,
        _value: &str,
        _ttl: Option<Duration>,
    ) -> Result<(), StateError> {
        Err(StateError::Connection("connection refused".into()))
    }

    async fn delete(&self, _key: &StateKey) -> Result<bool, StateError> {
        Ok(false)
    }

    async fn remaining_ttl(&self, _key: &StateKey) -> Result<Option<Duration>, StateError> {
        Ok(None)
    }

    async fn scan_keys_by_kind(
        &self,
        _kind: KeyKind,
    ) -> Result<Vec<(String, String)>, StateError> {
        Ok(Vec::new())
    }

    async fn ping(&self) -> Result<(), StateError> {
        Err(StateError::Connection("connection refused".into()))
    }
}

/// Store a record directly, bypassing create.
async fn plant(state: &MemoryStateStore, code: &str, record: &DropRecord) {
    let value = serde_json::to_string(record).unwrap();
    state
        .set(&StateKey::drop(code), &value, Some(Duration::from_secs(3600)))
        .await
        .unwrap();
}

#[tokio::test]
async fn text_round_trip() {
    let h = harness();
    let created = h
        .manager
        .create(DropContent::Text("hello".into()), 3600)
        .await
        .unwrap();
    assert_eq!(created.kind, DropKind::Text);
    assert_eq!(created.code.len(), 6);
    assert!(created.filename.is_none());

    let delivery = h.manager.consume(&created.code).await.unwrap();
    assert_eq!(
        delivery,
        Delivery::Text {
            content: "hello".into(),
            filename: format!("note-{}.txt", created.code),
        }
    );

    let again = h.manager.consume(&created.code).await.unwrap_err();
    assert!(again.is_inaccessible(), "second consume must not deliver: {again}");
    assert!(h.state.is_empty());
}

#[tokio::test]
async fn file_round_trip() {
    let h = harness();
    let created = h
        .manager
        .create(file(b"%PDF-1.7 body", "a.pdf"), 3600)
        .await
        .unwrap();
    assert_eq!(created.filename.as_deref(), Some("a.pdf"));
    assert_eq!(h.blobs.len(), 1);

    let preview = h.manager.peek(&created.code).await.unwrap();
    assert_eq!(preview.record.filename.as_deref(), Some("a.pdf"));
    assert!(!preview.record.consumed);
    assert!(preview.remaining_seconds > 3500 && preview.remaining_seconds <= 3600);

    let delivery = h.manager.consume(&created.code).await.unwrap();
    match delivery {
        Delivery::File {
            data,
            filename,
            content_type,
        } => {
            assert_eq!(data.as_ref(), b"%PDF-1.7 body");
            assert_eq!(filename, "a.pdf");
            assert_eq!(content_type, "application/pdf");
        }
        other => panic!("expected a file delivery, got {other:?}"),
    }
    assert!(h.blobs.is_empty(), "blob must be deleted after delivery");

    let err = h.manager.peek(&created.code).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
}

#[tokio::test]
async fn peek_does_not_consume() {
    let h = harness();
    let created = h
        .manager
        .create(DropContent::Text("still here".into()), 300)
        .await
        .unwrap();

    h.manager.peek(&created.code).await.unwrap();
    h.manager.peek(&created.code).await.unwrap();
    let delivery = h.manager.consume(&created.code).await.unwrap();
    assert_eq!(delivery.kind(), DropKind::Text);
}

#[tokio::test]
async fn codes_are_case_insensitive() {
    let h = harness();
    let created = h
        .manager
        .create(DropContent::Text("case".into()), 300)
        .await
        .unwrap();

    let lower = created.code.to_ascii_lowercase();
    let delivery = h.manager.consume(&format!("  {lower} ")).await.unwrap();
    assert_eq!(delivery.filename(), format!("note-{}.txt", created.code));
}

#[tokio::test]
async fn malformed_code_is_validation_error() {
    let h = harness();
    let err = h.manager.peek("AB-12!").await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));
}

#[tokio::test]
async fn oversize_file_is_rejected_without_side_effects() {
    let h = harness();
    let data = Bytes::from(vec![0u8; 6 * 1024 * 1024]);
    let err = h
        .manager
        .create(
            DropContent::File {
                data,
                filename: "big.bin".into(),
                content_type: None,
            },
            3600,
        )
        .await
        .unwrap_err();

    assert!(matches!(
        err,
        LifecycleError::Oversize {
            size: 6_291_456,
            limit: 5_242_880
        }
    ));
    assert!(h.blobs.is_empty());
    assert!(h.state.is_empty());
}

#[tokio::test]
async fn file_at_the_cap_is_accepted() {
    let h = harness_with(DropManagerBuilder::new().limits(Limits {
        max_file_size_bytes: 4,
        ..Limits::default()
    }));
    h.manager.create(file(b"four", "ok.txt"), 300).await.unwrap();
    let err = h.manager.create(file(b"fiver", "no.txt"), 300).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Oversize { size: 5, limit: 4 }));
}

#[tokio::test]
async fn text_length_cap() {
    let h = harness();
    let err = h
        .manager
        .create(DropContent::Text("a".repeat(1001)), 3600)
        .await
        .unwrap_err();
    match err {
        LifecycleError::Validation(msg) => {
            assert_eq!(msg, "Text too long (max 1000 characters)");
        }
        other => panic!("expected validation error, got {other:?}"),
    }
    assert!(h.state.is_empty());

    // The cap counts UTF-16 code units, not bytes.
    h.manager
        .create(DropContent::Text("é".repeat(1000)), 3600)
        .await
        .unwrap();

    // Astral-plane characters take two units each.
    let err = h
        .manager
        .create(DropContent::Text("😀".repeat(501)), 3600)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(_)));
    h.manager
        .create(DropContent::Text("😀".repeat(500)), 3600)
        .await
        .unwrap();
}

#[tokio::test]
async fn whitespace_text_is_accepted() {
    let h = harness();
    let created = h
        .manager
        .create(DropContent::Text("   ".into()), 3600)
        .await
        .unwrap();
    let delivery = h.manager.consume(&created.code).await.unwrap();
    assert!(matches!(delivery, Delivery::Text { content, .. } if content == "   "));
}

#[tokio::test]
async fn missing_content_is_rejected() {
    let h = harness();
    let err = h
        .manager
        .create(DropContent::Text(String::new()), 3600)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(msg) if msg == "No text provided"));

    let err = h.manager.create(file(b"x", ""), 3600).await.unwrap_err();
    assert!(matches!(err, LifecycleError::Validation(msg) if msg == "No file provided"));
}

#[tokio::test]
async fn expiry_outside_window_is_rejected() {
    let h = harness();
    for seconds in [0, 86_401] {
        let err = h
            .manager
            .create(DropContent::Text("x".into()), seconds)
            .await
            .unwrap_err();
        assert!(matches!(err, LifecycleError::Validation(_)));
    }
}

#[tokio::test]
async fn expired_record_is_never_served_and_is_reclaimed() {
    let h = harness();
    let uploaded = h
        .blobs
        .upload(Bytes::from_static(b"stale"), "old.png", "image/png")
        .await
        .unwrap();
    let record =
        DropRecord::file(&uploaded.public_url, "old.png", now_ms() - 10_000, 1).unwrap();
    plant(&h.state, "EXPIRD", &record).await;

    let err = h.manager.peek("EXPIRD").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Gone {
            reason: GoneReason::Expired,
            ..
        }
    ));
    assert!(h.state.is_empty(), "expired metadata must be deleted");
    assert!(h.blobs.is_empty(), "expired blob must be deleted");

    let err = h.manager.consume("EXPIRD").await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(h.manager.metrics().snapshot().expired_reclaimed, 1);
}

#[tokio::test]
async fn consume_of_expired_text_is_gone() {
    let h = harness();
    let record = DropRecord::text("secret", now_ms() - 5_000, 1).unwrap();
    plant(&h.state, "OLDTXT", &record).await;

    let err = h.manager.consume("OLDTXT").await.unwrap_err();
    assert!(matches!(
        err,
        LifecycleError::Gone {
            reason: GoneReason::Expired,
            ..
        }
    ));
    assert!(h.state.is_empty());
}

#[tokio::test]
async fn consumed_flag_reads_as_gone() {
    let h = harness();
    let mut record = DropRecord::text("secret", now_ms(), 3600).unwrap();
    record.consumed = true;
    plant(&h.state, "USEDUP", &record).await;

    for result in [
        h.manager.peek("USEDUP").await.map(|_| ()),
        h.manager.consume("USEDUP").await.map(|_| ()),
    ] {
        assert!(matches!(
            result,
            Err(LifecycleError::Gone {
                reason: GoneReason::Consumed,
                ..
            })
        ));
    }
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_consumes_deliver_exactly_once() {
    let h = harness();
    let created = h
        .manager
        .create(file(b"only once", "once.txt"), 3600)
        .await
        .unwrap();

    let tasks = (0..16).map(|_| {
        let manager = Arc::clone(&h.manager);
        let code = created.code.clone();
        tokio::spawn(async move { manager.consume(&code).await })
    });
    let results = futures::future::join_all(tasks).await;

    let mut delivered = 0;
    for result in results {
        match result.expect("task should not panic") {
            Ok(Delivery::File { data, .. }) => {
                assert_eq!(data.as_ref(), b"only once");
                delivered += 1;
            }
            Ok(other) => panic!("unexpected delivery {other:?}"),
            Err(e) => assert!(e.is_inaccessible(), "losers must see NotFound/Gone, got {e}"),
        }
    }
    assert_eq!(delivered, 1);
    assert!(h.blobs.is_empty());
    assert!(h.state.is_empty());
}

#[tokio::test]
async fn failed_fetch_after_claim_is_delivery_failure() {
    let state = Arc::new(MemoryStateStore::new());
    let blobs = Arc::new(FlakyBlobStore {
        inner: MemoryBlobStore::new(),
    });
    let manager = DropManagerBuilder::new()
        .state(state.clone())
        .blob(blobs.clone())
        .build()
        .unwrap();

    let created = manager.create(file(b"lost", "lost.pdf"), 3600).await.unwrap();
    assert_eq!(blobs.inner.len(), 1);

    let err = manager.consume(&created.code).await.unwrap_err();
    assert!(matches!(err, LifecycleError::DeliveryFailure(_)));
    assert!(state.is_empty(), "the access right is spent");
    assert!(blobs.inner.is_empty(), "the blob is deleted best-effort");

    let err = manager.consume(&created.code).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
    assert_eq!(manager.metrics().snapshot().delivery_failures, 1);
}

#[tokio::test]
async fn metadata_write_failure_deletes_uploaded_blob() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let manager = DropManagerBuilder::new()
        .state(Arc::new(ReadOnlyStateStore))
        .blob(blobs.clone())
        .build()
        .unwrap();

    let err = manager.create(file(b"data", "a.pdf"), 3600).await.unwrap_err();
    assert!(matches!(err, LifecycleError::StoreUnavailable(_)));
    assert!(blobs.is_empty());
    assert_eq!(manager.metrics().snapshot().compensated_blobs, 1);
    assert_eq!(manager.metrics().snapshot().created, 0);
}

#[tokio::test]
async fn metadata_write_failure_without_compensation_leaves_blob() {
    let blobs = Arc::new(MemoryBlobStore::new());
    let manager = DropManagerBuilder::new()
        .state(Arc::new(ReadOnlyStateStore))
        .blob(blobs.clone())
        .compensate_orphaned_blobs(false)
        .verify_unique_codes(false)
        .build()
        .unwrap();

    let err = manager.create(file(b"data", "a.pdf"), 3600).await.unwrap_err();
    assert!(matches!(err, LifecycleError::StoreUnavailable(_)));
    assert_eq!(blobs.len(), 1);
}

#[tokio::test]
async fn state_outage_is_not_reported_as_not_found() {
    let manager = DropManagerBuilder::new()
        .state(Arc::new(ReadOnlyStateStore))
        .blob(Arc::new(MemoryBlobStore::new()))
        .build()
        .unwrap();

    let err = manager
        .create(DropContent::Text("x".into()), 60)
        .await
        .unwrap_err();
    assert!(matches!(err, LifecycleError::StoreUnavailable(_)));
    assert!(manager.check_state_store().await.is_err());
}

#[tokio::test]
async fn colliding_code_is_regenerated() {
    let h = harness_with(
        DropManagerBuilder::new().code_generator(Arc::new(SequenceGenerator::new(vec![
            "AAAAAA", "AAAAAA", "BBBBBB",
        ]))),
    );

    let first = h
        .manager
        .create(DropContent::Text("one".into()), 300)
        .await
        .unwrap();
    let second = h
        .manager
        .create(DropContent::Text("two".into()), 300)
        .await
        .unwrap();
    assert_eq!(first.code, "AAAAAA");
    assert_eq!(second.code, "BBBBBB");

    let Delivery::Text { content, .. } = h.manager.consume("AAAAAA").await.unwrap() else {
        panic!("expected text");
    };
    assert_eq!(content, "one");
}

#[tokio::test]
async fn exhausted_code_space_compensates_blob() {
    let h = harness_with(
        DropManagerBuilder::new()
            .code_generator(Arc::new(SequenceGenerator::new(vec!["SAMEEE"])))
            .max_code_attempts(3),
    );

    h.manager
        .create(DropContent::Text("first".into()), 300)
        .await
        .unwrap();
    let err = h
        .manager
        .create(file(b"second", "b.png"), 300)
        .await
        .unwrap_err();

    assert!(matches!(err, LifecycleError::CodeSpaceExhausted { attempts: 3 }));
    assert!(h.blobs.is_empty());
    assert_eq!(h.state.len(), 1);
}

#[tokio::test]
async fn unverified_codes_overwrite_silently() {
    let h = harness_with(
        DropManagerBuilder::new()
            .code_generator(Arc::new(SequenceGenerator::new(vec!["DUPDUP"])))
            .verify_unique_codes(false),
    );

    h.manager
        .create(DropContent::Text("first".into()), 300)
        .await
        .unwrap();
    h.manager
        .create(DropContent::Text("second".into()), 300)
        .await
        .unwrap();

    let Delivery::Text { content, .. } = h.manager.consume("DUPDUP").await.unwrap() else {
        panic!("expected text");
    };
    assert_eq!(content, "second");
}

#[tokio::test]
async fn acknowledge_destroys_without_delivering() {
    let h = harness();
    let created = h
        .manager
        .create(file(b"copied", "c.docx"), 3600)
        .await
        .unwrap();

    let kind = h.manager.acknowledge(&created.code).await.unwrap();
    assert_eq!(kind, DropKind::File);
    assert!(h.blobs.is_empty());
    assert!(h.state.is_empty());

    let err = h.manager.acknowledge(&created.code).await.unwrap_err();
    assert!(matches!(err, LifecycleError::NotFound(_)));
}

#[tokio::test]
async fn reaper_pass_reclaims_expired_records_and_stale_blobs() {
    let h = harness();

    let live = h
        .manager
        .create(file(b"live", "live.pdf"), 3600)
        .await
        .unwrap();

    let expired_blob = h
        .blobs
        .upload(Bytes::from_static(b"expired"), "e.pdf", "application/pdf")
        .await
        .unwrap();
    let record =
        DropRecord::file(&expired_blob.public_url, "e.pdf", now_ms() - 60_000, 1).unwrap();
    plant(&h.state, "EXPIRE", &record).await;

    h.blobs.insert_with_created_at(
        Bytes::from_static(b"orphan"),
        "orphan.png",
        Utc::now() - chrono::Duration::days(3),
    );
    assert_eq!(h.blobs.len(), 3);

    let report = h.manager.reap(Duration::from_secs(3600)).await;
    assert_eq!(report.records, 1);
    assert_eq!(report.blobs, 1);
    assert_eq!(h.blobs.len(), 1, "only the live drop's blob remains");

    let snapshot = h.manager.metrics().snapshot();
    assert_eq!(snapshot.reaped_records, 1);
    assert_eq!(snapshot.reaped_blobs, 1);

    h.manager.consume(&live.code).await.unwrap();
}

#[tokio::test]
async fn blob_sweep_enforces_minimum_grace() {
    let h = harness();
    let window = chrono::Duration::seconds(86_400);

    // Uploaded just before a one-day record was stamped.
    let fresh = h.blobs.insert_with_created_at(
        Bytes::from_static(b"live"),
        "live.pdf",
        Utc::now() - window - chrono::Duration::seconds(30),
    );
    let stale = h.blobs.insert_with_created_at(
        Bytes::from_static(b"stale"),
        "stale.pdf",
        Utc::now() - window - chrono::Duration::minutes(10),
    );

    let reaped = h.manager.reap_orphaned_blobs(Duration::ZERO).await.unwrap();
    assert_eq!(reaped, 1);
    assert!(h.blobs.contains(&fresh.blob_ref));
    assert!(!h.blobs.contains(&stale.blob_ref));
}

#[tokio::test]
async fn reaper_discards_corrupt_records() {
    let h = harness();
    h.state
        .set(&StateKey::drop("JUNK01"), "not json", None)
        .await
        .unwrap();

    let reaped = h.manager.reap_expired_records().await.unwrap();
    assert_eq!(reaped, 1);
    assert!(h.state.is_empty());
}

#[tokio::test]
async fn reaper_task_stops_on_shutdown() {
    let h = harness();
    let record = DropRecord::text("old", now_ms() - 60_000, 1).unwrap();
    plant(&h.state, "TICKED", &record).await;

    let (mut reaper, shutdown_tx) = Reaper::new(
        Arc::clone(&h.manager),
        ReaperConfig {
            interval: Duration::from_millis(10),
            ..ReaperConfig::default()
        },
    );
    let handle = tokio::spawn(async move { reaper.run().await });

    // The first tick fires immediately.
    tokio::time::sleep(Duration::from_millis(50)).await;
    shutdown_tx.send(()).await.unwrap();
    tokio::time::timeout(Duration::from_secs(5), handle)
        .await
        .expect("reaper should stop")
        .unwrap();

    assert!(h.state.is_empty());
}
