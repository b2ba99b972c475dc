use std::time::Duration;

use dropfade_lifecycle::{MIN_BLOB_GRACE, ReaperConfig};
use serde::Deserialize;

/// Background reaper configuration.
///
/// Expired drops are always reclaimed when their code is next used; the
/// reaper additionally sweeps drops nobody touches again.
#[derive(Debug, Deserialize)]
pub struct ReaperServerConfig {
    /// Whether the reaper runs (default: false).
    #[serde(default)]
    pub enabled: bool,
    /// Seconds between sweeps (default: 300).
    #[serde(default = "default_interval")]
    pub interval_seconds: u64,
    /// Extra age beyond the one-day expiry window before a blob counts as
    /// orphaned (default: 3600, raised to at least 300).
    #[serde(default = "default_blob_grace")]
    pub blob_grace_seconds: u64,
    /// Whether orphaned blobs are swept as well as records (default: true).
    #[serde(default = "default_true")]
    pub sweep_blobs: bool,
}

impl Default for ReaperServerConfig {
    fn default() -> Self {
        Self {
            enabled: false,
            interval_seconds: default_interval(),
            blob_grace_seconds: default_blob_grace(),
            sweep_blobs: true,
        }
    }
}

impl ReaperServerConfig {
    pub fn to_reaper_config(&self) -> ReaperConfig {
        ReaperConfig {
            interval: Duration::from_secs(self.interval_seconds.max(1)),
            blob_grace: Duration::from_secs(self.blob_grace_seconds).max(MIN_BLOB_GRACE),
            sweep_blobs: self.sweep_blobs,
        }
    }
}

fn default_interval() -> u64 {
    300
}

fn default_blob_grace() -> u64 {
    3600
}

fn default_true() -> bool {
    true
}
