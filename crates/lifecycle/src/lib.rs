//! The drop lifecycle manager.
//!
//! [`DropManager`] coordinates the metadata store and the blob store so that a
//! drop's content is delivered at most once. The metadata delete performed at
//! the start of a consume is the claim: whichever caller's delete removes the
//! record is the only one allowed to deliver.

pub mod builder;
pub mod error;
pub mod manager;
pub mod metrics;
pub mod reaper;
mod repository;

pub use builder::DropManagerBuilder;
pub use error::{GoneReason, LifecycleError};
pub use manager::{CreatedDrop, Delivery, DropContent, DropManager, DropPreview};
pub use metrics::{LifecycleMetrics, MetricsSnapshot};
pub use reaper::{MIN_BLOB_GRACE, ReapReport, Reaper, ReaperConfig};
