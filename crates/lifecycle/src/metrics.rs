use std::sync::atomic::{AtomicU64, Ordering};

use serde::{Deserialize, Serialize};

/// Atomic counters tracking drop lifecycle outcomes.
///
/// All counters use relaxed ordering. For a consistent point-in-time view,
/// call [`snapshot`](Self::snapshot).
#[derive(Debug, Default)]
pub struct LifecycleMetrics {
    /// Drops created.
    pub created: AtomicU64,
    /// Successful non-destructive peeks.
    pub peeked: AtomicU64,
    /// Drops claimed and delivered (or acknowledged).
    pub consumed: AtomicU64,
    /// Lookups for codes with no record, including lost claim races.
    pub not_found: AtomicU64,
    /// Lookups for drops already consumed or just expired.
    pub gone: AtomicU64,
    /// Expired drops reclaimed on touch.
    pub expired_reclaimed: AtomicU64,
    /// Claimed drops whose blob could not be fetched.
    pub delivery_failures: AtomicU64,
    /// Best-effort blob deletes that failed.
    pub blob_delete_failures: AtomicU64,
    /// Blobs deleted because their record could not be persisted.
    pub compensated_blobs: AtomicU64,
    /// Expired records removed by the reaper.
    pub reaped_records: AtomicU64,
    /// Stale blobs removed by the reaper.
    pub reaped_blobs: AtomicU64,
}

impl LifecycleMetrics {
    pub fn increment_created(&self) {
        self.created.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_peeked(&self) {
        self.peeked.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_consumed(&self) {
        self.consumed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_not_found(&self) {
        self.not_found.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_gone(&self) {
        self.gone.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_expired_reclaimed(&self) {
        self.expired_reclaimed.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_delivery_failures(&self) {
        self.delivery_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_blob_delete_failures(&self) {
        self.blob_delete_failures.fetch_add(1, Ordering::Relaxed);
    }

    pub fn increment_compensated_blobs(&self) {
        self.compensated_blobs.fetch_add(1, Ordering::Relaxed);
    }

    pub fn add_reaped_records(&self, n: u64) {
        self.reaped_records.fetch_add(n, Ordering::Relaxed);
    }

    pub fn add_reaped_blobs(&self, n: u64) {
        self.reaped_blobs.fetch_add(n, Ordering::Relaxed);
    }

    /// Take a point-in-time snapshot of all counters.
    pub fn snapshot(&self) -> MetricsSnapshot {
        MetricsSnapshot {
            created: self.created.load(Ordering::Relaxed),
            peeked: self.peeked.load(Ordering::Relaxed),
            consumed: self.consumed.load(Ordering::Relaxed),
            not_found: self.not_found.load(Ordering::Relaxed),
            gone: self.gone.load(Ordering::Relaxed),
            expired_reclaimed: self.expired_reclaimed.load(Ordering::Relaxed),
            delivery_failures: self.delivery_failures.load(Ordering::Relaxed),
            blob_delete_failures: self.blob_delete_failures.load(Ordering::Relaxed),
            compensated_blobs: self.compensated_blobs.load(Ordering::Relaxed),
            reaped_records: self.reaped_records.load(Ordering::Relaxed),
            reaped_blobs: self.reaped_blobs.load(Ordering::Relaxed),
        }
    }
}

/// A plain data snapshot of [`LifecycleMetrics`] at a point in time.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[cfg_attr(feature = "openapi", derive(utoipa::ToSchema))]
pub struct MetricsSnapshot {
    pub created: u64,
    pub peeked: u64,
    pub consumed: u64,
    pub not_found: u64,
    pub gone: u64,
    pub expired_reclaimed: u64,
    pub delivery_failures: u64,
    pub blob_delete_failures: u64,
    pub compensated_blobs: u64,
    pub reaped_records: u64,
    pub reaped_blobs: u64,
}
