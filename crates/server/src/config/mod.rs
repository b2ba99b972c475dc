mod blob;
mod drops;
mod limits;
mod reaper;
mod server;
mod state;
mod telemetry;


pub use blob::*;
pub use drops::*;
pub use limits::*;
pub use reaper::*;
pub use server::*;
pub use state::*;
pub use telemetry::*;

use serde::Deserialize;

/// Top-level configuration for the dropfade server, loaded from a TOML file.
#[derive(Debug, Default, Deserialize)]
pub struct DropfadeConfig {
    /// HTTP server bind configuration.
    #[serde(default)]
    pub server: ServerConfig,
    /// Metadata store backend configuration.
    #[serde(default)]
    pub state: StateConfig,
    /// Blob store backend configuration.
    #[serde(default)]
    pub blob: BlobConfig,
    /// Size and code-length bounds for new drops.
    #[serde(default)]
    pub limits: LimitsConfig,
    /// Drop creation hardening options.
    #[serde(default)]
    pub drops: DropsConfig,
    /// Background reaper configuration.
    #[serde(default)]
    pub reaper: ReaperServerConfig,
    /// Logging configuration.
    #[serde(default)]
    pub telemetry: TelemetryConfig,
}

impl DropfadeConfig {
    /// Apply overrides from the process environment.
    pub fn apply_env(&mut self) {
        self.apply_env_from(|name| std::env::var(name).ok());
    }

    /// Apply overrides from `lookup`.
    ///
    /// `MAX_FILE_SIZE` and `CODE_LENGTH` override `[limits]`; the Cloudinary
    /// credential variables fill in `[blob]` fields left unset.
    pub fn apply_env_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(size) = lookup("MAX_FILE_SIZE").and_then(|v| v.trim().parse().ok()) {
            self.limits.max_file_size_bytes = size;
        }
        if let Some(length) = lookup("CODE_LENGTH").and_then(|v| v.trim().parse().ok()) {
            self.limits.code_length = length;
        }
        self.blob.fill_credentials_from(&lookup);
    }
}
