use serde::Deserialize;

/// Hardening options for drop creation.
#[derive(Debug, Deserialize)]
pub struct DropsConfig {
    /// Verify that each generated code is unused before committing it.
    #[serde(default = "default_true")]
    pub verify_unique_codes: bool,
    /// Codes tried before a create fails with "code space exhausted".
    #[serde(default = "default_max_code_attempts")]
    pub max_code_attempts: u32,
    /// Delete an uploaded blob when its record cannot be written.
    #[serde(default = "default_true")]
    pub compensate_orphaned_blobs: bool,
}

impl Default for DropsConfig {
    fn default() -> Self {
        Self {
            verify_unique_codes: true,
            max_code_attempts: default_max_code_attempts(),
            compensate_orphaned_blobs: true,
        }
    }
}

fn default_true() -> bool {
    true
}

fn default_max_code_attempts() -> u32 {
    dropfade_lifecycle::builder::DEFAULT_MAX_CODE_ATTEMPTS
}
