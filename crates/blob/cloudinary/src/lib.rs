//! Cloudinary-compatible [`BlobStore`](dropfade_blob::BlobStore) backend.
//!
//! Documents are uploaded as untransformed `raw` resources. Fetching tries
//! resource kinds and delivery URLs in a fixed fallback order so an upload that
//! the service classified differently than expected is still retrievable.

mod config;
mod signature;
mod store;
mod types;
mod url;

pub use config::CloudinaryConfig;
pub use store::CloudinaryBlobStore;
