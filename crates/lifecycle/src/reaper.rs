//! Periodic sweep of expired drops and orphaned blobs.
//!
//! Expired drops are also reclaimed lazily whenever their code is touched;
//! the reaper bounds how long untouched ones linger.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;
use tokio::time::interval;
use tracing::{debug, info};

use crate::manager::DropManager;

/// Smallest grace period the blob sweep accepts.
pub const MIN_BLOB_GRACE: Duration = Duration::from_secs(5 * 60);

/// Configuration for the background reaper.
#[derive(Debug, Clone)]
pub struct ReaperConfig {
    /// How often to sweep (default: 300 seconds).
    pub interval: Duration,
    /// Extra age, beyond the longest expiry window, before a blob is
    /// considered orphaned (default: 3600 seconds, never less than
    /// [`MIN_BLOB_GRACE`]).
    pub blob_grace: Duration,
    /// Whether the blob sweep runs at all (default: true).
    pub sweep_blobs: bool,
}

impl Default for ReaperConfig {
    fn default() -> Self {
        Self {
            interval: Duration::from_secs(300),
            blob_grace: Duration::from_secs(3600),
            sweep_blobs: true,
        }
    }
}

/// Outcome of one reaper pass.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReapReport {
    /// Expired or corrupt records removed.
    pub records: u64,
    /// Orphaned blobs removed.
    pub blobs: u64,
}

/// Background task that periodically reaps expired drops.
pub struct Reaper {
    manager: Arc<DropManager>,
    config: ReaperConfig,
    shutdown_rx: mpsc::Receiver<()>,
}

impl Reaper {
    /// Create a reaper and the sender that stops it.
    pub fn new(manager: Arc<DropManager>, config: ReaperConfig) -> (Self, mpsc::Sender<()>) {
        let (shutdown_tx, shutdown_rx) = mpsc::channel(1);
        (
            Self {
                manager,
                config,
                shutdown_rx,
            },
            shutdown_tx,
        )
    }

    /// Run one pass immediately.
    pub async fn run_once(&self) -> ReapReport {
        if self.config.sweep_blobs {
            self.manager.reap(self.config.blob_grace).await
        } else {
            let records = match self.manager.reap_expired_records().await {
                Ok(n) => n,
                Err(e) => {
                    tracing::error!(error = %e, "record sweep failed");
                    0
                }
            };
            ReapReport { records, blobs: 0 }
        }
    }

    /// Run until shutdown is signaled or the sender is dropped.
    pub async fn run(&mut self) {
        info!(interval_secs = self.config.interval.as_secs(), "reaper starting");
        let mut ticker = interval(self.config.interval);

        loop {
            tokio::select! {
                _ = self.shutdown_rx.recv() => {
                    info!("reaper received shutdown signal");
                    break;
                }
                _ = ticker.tick() => {
                    let report = self.run_once().await;
                    if report.records > 0 || report.blobs > 0 {
                        info!(records = report.records, blobs = report.blobs, "reaper pass completed");
                    } else {
                        debug!("reaper pass found nothing to reclaim");
                    }
                }
            }
        }

        info!("reaper stopped");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config() {
        let config = ReaperConfig::default();
        assert_eq!(config.interval, Duration::from_secs(300));
        assert_eq!(config.blob_grace, Duration::from_secs(3600));
        assert!(config.sweep_blobs);
    }
}
