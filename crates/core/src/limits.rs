use crate::code::DEFAULT_CODE_LENGTH;

/// Size bounds applied to new drops.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Limits {
    /// Largest accepted file, in bytes.
    pub max_file_size_bytes: u64,
    /// Largest accepted text note, in characters.
    pub max_text_chars: usize,
    /// Number of characters in generated codes.
    pub code_length: usize,
}

impl Default for Limits {
    fn default() -> Self {
        Self {
            max_file_size_bytes: 5 * 1024 * 1024,
            max_text_chars: 1000,
            code_length: DEFAULT_CODE_LENGTH,
        }
    }
}
