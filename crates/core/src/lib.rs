pub mod code;
pub mod content_type;
pub mod error;
pub mod expiry;
pub mod limits;
pub mod record;

pub use code::{
    AlphanumericCodeGenerator, CODE_ALPHABET, CodeGenerator, DEFAULT_CODE_LENGTH, normalize_code,
};
pub use content_type::{content_type_for, is_document, is_document_extension};
pub use error::CoreError;
pub use expiry::{DEFAULT_EXPIRY_SECONDS, MAX_EXPIRY_SECONDS, expiry_seconds};
pub use limits::Limits;
pub use record::{DropKind, DropRecord, now_ms};
