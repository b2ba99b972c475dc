//! Access code generation and normalization.
//!
//! Codes are short, uppercase alphanumeric strings a person can read aloud or
//! type from a screen. Uniqueness is probabilistic; callers that need a hard
//! guarantee persist with an atomic create-if-absent and regenerate on
//! collision.

use rand_core::{OsRng, RngCore};

use crate::error::CoreError;

/// Characters a generated code may contain.
pub const CODE_ALPHABET: &[u8; 36] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";

/// Default number of characters in a generated code.
pub const DEFAULT_CODE_LENGTH: usize = 6;

/// Shortest code length accepted by [`AlphanumericCodeGenerator::new`].
pub const MIN_CODE_LENGTH: usize = 4;

/// Longest code length accepted by [`AlphanumericCodeGenerator::new`].
pub const MAX_CODE_LENGTH: usize = 32;

// Largest multiple of the alphabet size that fits in a byte; bytes at or
// above it are rejected so every character is equally likely.
const REJECTION_BOUND: u8 = 252;

/// Produces access codes for new drops.
pub trait CodeGenerator: Send + Sync {
    /// Generate a fresh code. Must not consult any store.
    fn generate(&self) -> String;
}

/// Uniform random code over [`CODE_ALPHABET`] backed by the OS RNG.
#[derive(Debug, Clone, Copy)]
pub struct AlphanumericCodeGenerator {
    length: usize,
}

impl AlphanumericCodeGenerator {
    /// Create a generator producing codes of `length` characters.
    pub fn new(length: usize) -> Result<Self, CoreError> {
        if !(MIN_CODE_LENGTH..=MAX_CODE_LENGTH).contains(&length) {
            return Err(CoreError::InvalidCodeLength {
                length,
                min: MIN_CODE_LENGTH,
                max: MAX_CODE_LENGTH,
            });
        }
        Ok(Self { length })
    }

    /// Number of characters in each generated code.
    pub fn length(&self) -> usize {
        self.length
    }
}

impl Default for AlphanumericCodeGenerator {
    fn default() -> Self {
        Self {
            length: DEFAULT_CODE_LENGTH,
        }
    }
}

impl CodeGenerator for AlphanumericCodeGenerator {
    fn generate(&self) -> String {
        let mut code = String::with_capacity(self.length);
        let mut buf = [0u8; 32];
        while code.len() < self.length {
            OsRng.fill_bytes(&mut buf);
            for &b in &buf {
                if b >= REJECTION_BOUND {
                    continue;
                }
                code.push(char::from(CODE_ALPHABET[usize::from(b) % CODE_ALPHABET.len()]));
                if code.len() == self.length {
                    break;
                }
            }
        }
        code
    }
}

/// Normalize a user-supplied code: trim whitespace and uppercase it.
///
/// Returns [`CoreError::InvalidCode`] for empty input or input containing
/// anything other than ASCII letters and digits.
pub fn normalize_code(raw: &str) -> Result<String, CoreError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(CoreError::InvalidCode("code is required".into()));
    }
    if trimmed.len() > MAX_CODE_LENGTH || !trimmed.bytes().all(|b| b.is_ascii_alphanumeric()) {
        return Err(CoreError::InvalidCode(trimmed.to_owned()));
    }
    Ok(trimmed.to_ascii_uppercase())
}
