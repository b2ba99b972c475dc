use std::sync::Arc;
use std::time::Duration;

use bytes::Bytes;
use chrono::Utc;
use dropfade_blob::{BlobRef, BlobStore};
use dropfade_core::{
    CodeGenerator, DropKind, DropRecord, Limits, MAX_EXPIRY_SECONDS, content_type_for, now_ms,
    normalize_code,
};
use tracing::{debug, error, info, instrument, warn};

use crate::error::{GoneReason, LifecycleError};
use crate::metrics::LifecycleMetrics;
use crate::reaper::{MIN_BLOB_GRACE, ReapReport};
use crate::repository::DropRepository;

/// Content submitted for a new drop.
#[derive(Debug, Clone)]
pub enum DropContent {
    /// A short text note, stored inline in the record.
    Text(String),
    /// A file, uploaded to the blob store.
    File {
        data: Bytes,
        filename: String,
        /// MIME type reported by the uploader; inferred from the filename
        /// when absent.
        content_type: Option<String>,
    },
}

/// Result of a successful create.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreatedDrop {
    pub code: String,
    pub kind: DropKind,
    pub filename: Option<String>,
    pub expires_at: i64,
}

/// A live drop as seen by a non-destructive peek.
#[derive(Debug, Clone)]
pub struct DropPreview {
    pub code: String,
    pub record: DropRecord,
    /// Seconds until the metadata store evicts the record.
    pub remaining_seconds: u64,
}

/// Content handed out by a successful consume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Delivery {
    Text {
        content: String,
        /// Synthetic `note-<CODE>.txt` name for clients that save the note.
        filename: String,
    },
    File {
        data: Bytes,
        filename: String,
        content_type: &'static str,
    },
}

impl Delivery {
    pub fn kind(&self) -> DropKind {
        match self {
            Self::Text { .. } => DropKind::Text,
            Self::File { .. } => DropKind::File,
        }
    }

    pub fn filename(&self) -> &str {
        match self {
            Self::Text { filename, .. } | Self::File { filename, .. } => filename,
        }
    }
}

/// Orchestrates drops across the metadata store and the blob store.
///
/// Construct with [`DropManagerBuilder`](crate::DropManagerBuilder).
pub struct DropManager {
    pub(crate) repo: DropRepository,
    pub(crate) blob: Arc<dyn BlobStore>,
    pub(crate) codes: Arc<dyn CodeGenerator>,
    pub(crate) limits: Limits,
    pub(crate) verify_unique_codes: bool,
    pub(crate) max_code_attempts: u32,
    pub(crate) compensate_orphaned_blobs: bool,
    pub(crate) metrics: Arc<LifecycleMetrics>,
}

impl std::fmt::Debug for DropManager {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropManager")
            .field("limits", &self.limits)
            .field("verify_unique_codes", &self.verify_unique_codes)
            .field("max_code_attempts", &self.max_code_attempts)
            .field("compensate_orphaned_blobs", &self.compensate_orphaned_blobs)
            .finish_non_exhaustive()
    }
}

impl DropManager {
    pub fn limits(&self) -> &Limits {
        &self.limits
    }

    pub fn metrics(&self) -> &Arc<LifecycleMetrics> {
        &self.metrics
    }

    /// Check that the metadata store is reachable.
    pub async fn check_state_store(&self) -> Result<(), LifecycleError> {
        self.repo.state().ping().await.map_err(Into::into)
    }

    /// Create a drop and return its access code.
    ///
    /// Files are uploaded before the record is written, so a failure leaves
    /// at worst an orphaned blob, never a record pointing at nothing. The
    /// orphan is deleted right away when compensation is enabled.
    #[instrument(skip(self, content), fields(kind = tracing::field::Empty))]
    pub async fn create(
        &self,
        content: DropContent,
        expiry_seconds: u64,
    ) -> Result<CreatedDrop, LifecycleError> {
        if expiry_seconds == 0 || expiry_seconds > MAX_EXPIRY_SECONDS {
            return Err(LifecycleError::Validation(format!(
                "expiry must be between 1 and {MAX_EXPIRY_SECONDS} seconds"
            )));
        }
        let created_at = now_ms();

        let (record, uploaded) = match content {
            DropContent::Text(text) => {
                tracing::Span::current().record("kind", "text");
                self.validate_text(&text)?;
                (DropRecord::text(text, created_at, expiry_seconds)?, None)
            }
            DropContent::File {
                data,
                filename,
                content_type,
            } => {
                tracing::Span::current().record("kind", "file");
                if filename.trim().is_empty() {
                    return Err(LifecycleError::Validation("No file provided".into()));
                }
                let size = data.len() as u64;
                if size > self.limits.max_file_size_bytes {
                    return Err(LifecycleError::Oversize {
                        size,
                        limit: self.limits.max_file_size_bytes,
                    });
                }

                let content_type =
                    content_type.unwrap_or_else(|| content_type_for(&filename).to_owned());
                let uploaded = self.blob.upload(data, &filename, &content_type).await?;
                debug!(blob_id = %uploaded.blob_ref, size, "blob uploaded");

                match DropRecord::file(&uploaded.public_url, filename, created_at, expiry_seconds) {
                    Ok(record) => (record, Some(uploaded.blob_ref)),
                    Err(e) => {
                        self.compensate(&uploaded.blob_ref).await;
                        return Err(e.into());
                    }
                }
            }
        };

        let ttl = Duration::from_secs(expiry_seconds);
        let code = match self.persist(&record, ttl).await {
            Ok(code) => code,
            Err(e) => {
                if let Some(blob_ref) = &uploaded {
                    self.compensate(blob_ref).await;
                }
                return Err(e);
            }
        };

        self.metrics.increment_created();
        info!(
            code = %code,
            kind = %record.kind,
            expires_at = record.expires_at,
            "drop created"
        );

        Ok(CreatedDrop {
            code,
            kind: record.kind,
            filename: record.filename,
            expires_at: record.expires_at,
        })
    }

    fn validate_text(&self, text: &str) -> Result<(), LifecycleError> {
        if text.is_empty() {
            return Err(LifecycleError::Validation("No text provided".into()));
        }
        // Length in UTF-16 code units, as browsers count it.
        if text.encode_utf16().count() > self.limits.max_text_chars {
            return Err(LifecycleError::Validation(format!(
                "Text too long (max {} characters)",
                self.limits.max_text_chars
            )));
        }
        Ok(())
    }

    /// Write the record under a fresh code.
    ///
    /// With verification on, the write is a set-if-absent and a collision
    /// regenerates the code; otherwise the first code is written blindly.
    async fn persist(&self, record: &DropRecord, ttl: Duration) -> Result<String, LifecycleError> {
        if !self.verify_unique_codes {
            let code = self.codes.generate();
            self.repo.put(&code, record, ttl).await?;
            return Ok(code);
        }

        for attempt in 1..=self.max_code_attempts {
            let code = self.codes.generate();
            if self.repo.insert_new(&code, record, ttl).await? {
                return Ok(code);
            }
            warn!(code = %code, attempt, "generated code already in use");
        }

        error!(attempts = self.max_code_attempts, "code space exhausted");
        Err(LifecycleError::CodeSpaceExhausted {
            attempts: self.max_code_attempts,
        })
    }

    /// Delete a blob whose record could not be written.
    async fn compensate(&self, blob_ref: &BlobRef) {
        if !self.compensate_orphaned_blobs {
            warn!(blob_id = %blob_ref, "record not persisted; leaving orphaned blob");
            return;
        }
        match self.blob.delete(blob_ref).await {
            Ok(_) => {
                self.metrics.increment_compensated_blobs();
                info!(blob_id = %blob_ref, "deleted orphaned blob");
            }
            Err(e) => {
                self.metrics.increment_blob_delete_failures();
                error!(blob_id = %blob_ref, error = %e, "failed to delete orphaned blob");
            }
        }
    }

    /// Look up a live drop without consuming it.
    ///
    /// A record past its expiry is reclaimed on the spot, even when the
    /// metadata store has not evicted it yet.
    #[instrument(skip(self))]
    pub async fn peek(&self, raw_code: &str) -> Result<DropPreview, LifecycleError> {
        let code = normalize_code(raw_code)?;
        let record = self.load_live(&code).await?;

        let remaining_seconds = match self.repo.remaining_ttl(&code).await? {
            Some(ttl) => ttl.as_secs(),
            None => record.remaining_ms(now_ms()) / 1000,
        };

        self.metrics.increment_peeked();
        debug!(code = %code, kind = %record.kind, remaining_seconds, "drop peeked");
        Ok(DropPreview {
            code,
            record,
            remaining_seconds,
        })
    }

    /// Deliver a drop's content exactly once.
    ///
    /// The record is deleted before the blob is fetched. Once that delete
    /// succeeds the access right is spent: a fetch failure afterwards is a
    /// [`LifecycleError::DeliveryFailure`] and the content is not recoverable.
    #[instrument(skip(self))]
    pub async fn consume(&self, raw_code: &str) -> Result<Delivery, LifecycleError> {
        let code = normalize_code(raw_code)?;
        let record = self.claim(&code).await?;

        let delivery = match record.kind {
            DropKind::Text => Delivery::Text {
                content: record.content,
                filename: format!("note-{code}.txt"),
            },
            DropKind::File => {
                let filename = record.filename.unwrap_or_else(|| "download".to_owned());
                let data = self.deliver_blob(&code, &record.content).await?;
                Delivery::File {
                    data,
                    content_type: content_type_for(&filename),
                    filename,
                }
            }
        };

        self.metrics.increment_consumed();
        info!(code = %code, kind = %delivery.kind(), "drop consumed");
        Ok(delivery)
    }

    /// Spend a drop's access right without returning its content.
    ///
    /// Used by clients that already hold the content (e.g. after copying a
    /// note) and only need the drop destroyed.
    #[instrument(skip(self))]
    pub async fn acknowledge(&self, raw_code: &str) -> Result<DropKind, LifecycleError> {
        let code = normalize_code(raw_code)?;
        let record = self.claim(&code).await?;

        if record.kind == DropKind::File {
            self.delete_blob_for_url(&code, &record.content).await;
        }

        self.metrics.increment_consumed();
        info!(code = %code, kind = %record.kind, "drop acknowledged");
        Ok(record.kind)
    }

    /// Read the record and verify it is neither consumed nor expired.
    async fn load_live(&self, code: &str) -> Result<DropRecord, LifecycleError> {
        let Some(record) = self.repo.get(code).await? else {
            self.metrics.increment_not_found();
            debug!(code, "no drop for code");
            return Err(LifecycleError::NotFound(code.to_owned()));
        };

        if record.consumed {
            self.metrics.increment_gone();
            info!(code, "drop already accessed");
            return Err(LifecycleError::Gone {
                code: code.to_owned(),
                reason: GoneReason::Consumed,
            });
        }

        if record.is_expired(now_ms()) {
            self.reclaim_expired(code, &record).await?;
            self.metrics.increment_expired_reclaimed();
            self.metrics.increment_gone();
            return Err(LifecycleError::Gone {
                code: code.to_owned(),
                reason: GoneReason::Expired,
            });
        }

        Ok(record)
    }

    /// Take the one-time access right: read, then delete the record. Only the
    /// caller whose delete removed the record may deliver.
    async fn claim(&self, code: &str) -> Result<DropRecord, LifecycleError> {
        let record = self.load_live(code).await?;

        if !self.repo.delete(code).await? {
            self.metrics.increment_not_found();
            info!(code, "lost claim race for drop");
            return Err(LifecycleError::NotFound(code.to_owned()));
        }

        debug!(code, kind = %record.kind, "drop claimed");
        Ok(record)
    }

    /// Fetch a claimed drop's blob, then delete it.
    async fn deliver_blob(&self, code: &str, url: &str) -> Result<Bytes, LifecycleError> {
        let blob_ref = match self.blob.ref_from_url(url) {
            Ok(r) => r,
            Err(e) => {
                self.metrics.increment_delivery_failures();
                error!(code, url, error = %e, "claimed drop has an unusable blob URL");
                return Err(LifecycleError::DeliveryFailure(e.to_string()));
            }
        };

        match self.blob.fetch(&blob_ref).await {
            Ok(data) => {
                self.delete_blob(code, &blob_ref).await;
                Ok(data)
            }
            Err(e) => {
                self.metrics.increment_delivery_failures();
                error!(code, blob_id = %blob_ref, error = %e, "blob fetch failed after claim");
                self.delete_blob(code, &blob_ref).await;
                Err(LifecycleError::DeliveryFailure(e.to_string()))
            }
        }
    }

    async fn delete_blob_for_url(&self, code: &str, url: &str) {
        match self.blob.ref_from_url(url) {
            Ok(blob_ref) => self.delete_blob(code, &blob_ref).await,
            Err(e) => {
                self.metrics.increment_blob_delete_failures();
                warn!(code, url, error = %e, "cannot derive blob reference; blob left behind");
            }
        }
    }

    /// Best-effort blob delete: failures are logged and counted, never raised.
    async fn delete_blob(&self, code: &str, blob_ref: &BlobRef) {
        match self.blob.delete(blob_ref).await {
            Ok(true) => debug!(code, blob_id = %blob_ref, "blob deleted"),
            Ok(false) => debug!(code, blob_id = %blob_ref, "blob already gone"),
            Err(e) => {
                self.metrics.increment_blob_delete_failures();
                warn!(code, blob_id = %blob_ref, error = %e, "blob delete failed; blob leaked");
            }
        }
    }

    /// Remove an expired record and its blob. Both deletes are idempotent.
    async fn reclaim_expired(&self, code: &str, record: &DropRecord) -> Result<(), LifecycleError> {
        self.repo.delete(code).await?;
        if record.kind == DropKind::File {
            self.delete_blob_for_url(code, &record.content).await;
        }
        info!(code, kind = %record.kind, "expired drop reclaimed");
        Ok(())
    }

    /// Reclaim every stored drop past its expiry and discard corrupt records.
    pub async fn reap_expired_records(&self) -> Result<u64, LifecycleError> {
        let now = now_ms();
        let mut reaped = 0;

        for (code, record) in self.repo.scan().await? {
            match record {
                Some(record) if record.is_expired(now) => {
                    self.reclaim_expired(&code, &record).await?;
                    reaped += 1;
                }
                Some(_) => {}
                None => {
                    warn!(code = %code, "reaping corrupt drop record");
                    if self.repo.delete(&code).await? {
                        reaped += 1;
                    }
                }
            }
        }

        self.metrics.add_reaped_records(reaped);
        Ok(reaped)
    }

    /// Delete blobs older than the longest expiry window plus `grace`.
    ///
    /// No live record can reference such a blob, so these are orphans left by
    /// drops the metadata store evicted on its own. `grace` is raised to at
    /// least [`MIN_BLOB_GRACE`], since a blob is uploaded before its record's
    /// `createdAt` is taken.
    pub async fn reap_orphaned_blobs(&self, grace: Duration) -> Result<u64, LifecycleError> {
        let max_age = Duration::from_secs(MAX_EXPIRY_SECONDS) + grace.max(MIN_BLOB_GRACE);
        let max_age = chrono::Duration::from_std(max_age)
            .map_err(|e| LifecycleError::Configuration(format!("invalid grace period: {e}")))?;
        let cutoff = Utc::now() - max_age;

        let mut reaped = 0;
        for blob in self.blob.list_older_than(cutoff).await? {
            match self.blob.delete(&blob.blob_ref).await {
                Ok(true) => reaped += 1,
                Ok(false) => {}
                Err(e) => {
                    self.metrics.increment_blob_delete_failures();
                    warn!(blob_id = %blob.blob_ref, error = %e, "failed to reap stale blob");
                }
            }
        }

        self.metrics.add_reaped_blobs(reaped);
        Ok(reaped)
    }

    /// Run one full reaper pass.
    pub async fn reap(&self, blob_grace: Duration) -> ReapReport {
        let records = match self.reap_expired_records().await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "record sweep failed");
                0
            }
        };
        let blobs = match self.reap_orphaned_blobs(blob_grace).await {
            Ok(n) => n,
            Err(e) => {
                error!(error = %e, "blob sweep failed");
                0
            }
        };
        ReapReport { records, blobs }
    }
}
