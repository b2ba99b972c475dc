use dropfade_core::Limits;
use serde::Deserialize;

/// Size and code-length bounds for new drops.
#[derive(Debug, Deserialize)]
pub struct LimitsConfig {
    /// Largest accepted file in bytes (default: 5 MiB).
    #[serde(default = "default_max_file_size")]
    pub max_file_size_bytes: u64,
    /// Largest accepted text note in characters (default: 1000).
    #[serde(default = "default_max_text_chars")]
    pub max_text_chars: usize,
    /// Length of generated access codes (default: 6).
    #[serde(default = "default_code_length")]
    pub code_length: usize,
}

impl Default for LimitsConfig {
    fn default() -> Self {
        Self {
            max_file_size_bytes: default_max_file_size(),
            max_text_chars: default_max_text_chars(),
            code_length: default_code_length(),
        }
    }
}

impl LimitsConfig {
    pub fn to_limits(&self) -> Limits {
        Limits {
            max_file_size_bytes: self.max_file_size_bytes,
            max_text_chars: self.max_text_chars,
            code_length: self.code_length,
        }
    }
}

fn default_max_file_size() -> u64 {
    Limits::default().max_file_size_bytes
}

fn default_max_text_chars() -> usize {
    Limits::default().max_text_chars
}

fn default_code_length() -> usize {
    Limits::default().code_length
}
