use std::sync::Arc;

use dropfade_blob::BlobStore;
use dropfade_core::{AlphanumericCodeGenerator, CodeGenerator, Limits};
use dropfade_state::StateStore;

use crate::error::LifecycleError;
use crate::manager::DropManager;
use crate::metrics::LifecycleMetrics;
use crate::repository::DropRepository;

/// Default number of codes tried before giving up on a create.
pub const DEFAULT_MAX_CODE_ATTEMPTS: u32 = 5;

/// Fluent builder for constructing a [`DropManager`].
///
/// A [`StateStore`] and a [`BlobStore`] must be supplied. Everything else
/// has defaults: default [`Limits`], a code generator of
/// `limits.code_length` characters, verified unique codes, and compensating
/// deletes for orphaned blobs.
pub struct DropManagerBuilder {
    state: Option<Arc<dyn StateStore>>,
    blob: Option<Arc<dyn BlobStore>>,
    code_generator: Option<Arc<dyn CodeGenerator>>,
    limits: Limits,
    verify_unique_codes: bool,
    max_code_attempts: u32,
    compensate_orphaned_blobs: bool,
    metrics: Option<Arc<LifecycleMetrics>>,
}

impl DropManagerBuilder {
    pub fn new() -> Self {
        Self {
            state: None,
            blob: None,
            code_generator: None,
            limits: Limits::default(),
            verify_unique_codes: true,
            max_code_attempts: DEFAULT_MAX_CODE_ATTEMPTS,
            compensate_orphaned_blobs: true,
            metrics: None,
        }
    }

    /// Set the metadata store holding drop records.
    #[must_use]
    pub fn state(mut self, store: Arc<dyn StateStore>) -> Self {
        self.state = Some(store);
        self
    }

    /// Set the blob store holding file contents.
    #[must_use]
    pub fn blob(mut self, store: Arc<dyn BlobStore>) -> Self {
        self.blob = Some(store);
        self
    }

    /// Override the access code generator.
    #[must_use]
    pub fn code_generator(mut self, generator: Arc<dyn CodeGenerator>) -> Self {
        self.code_generator = Some(generator);
        self
    }

    #[must_use]
    pub fn limits(mut self, limits: Limits) -> Self {
        self.limits = limits;
        self
    }

    /// Whether create verifies that a generated code is unused.
    #[must_use]
    pub fn verify_unique_codes(mut self, verify: bool) -> Self {
        self.verify_unique_codes = verify;
        self
    }

    #[must_use]
    pub fn max_code_attempts(mut self, attempts: u32) -> Self {
        self.max_code_attempts = attempts;
        self
    }

    /// Whether a blob is deleted when its record cannot be persisted.
    #[must_use]
    pub fn compensate_orphaned_blobs(mut self, compensate: bool) -> Self {
        self.compensate_orphaned_blobs = compensate;
        self
    }

    /// Share an existing metrics instance.
    #[must_use]
    pub fn metrics(mut self, metrics: Arc<LifecycleMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    /// Build the manager.
    ///
    /// # Errors
    ///
    /// Returns [`LifecycleError::Configuration`] if a store is missing, the
    /// code length is out of range, or `max_code_attempts` is zero.
    pub fn build(self) -> Result<DropManager, LifecycleError> {
        let state = self
            .state
            .ok_or_else(|| LifecycleError::Configuration("state store is required".into()))?;

        let blob = self
            .blob
            .ok_or_else(|| LifecycleError::Configuration("blob store is required".into()))?;

        if self.max_code_attempts == 0 {
            return Err(LifecycleError::Configuration(
                "max_code_attempts must be at least 1".into(),
            ));
        }

        let codes = match self.code_generator {
            Some(generator) => generator,
            None => Arc::new(
                AlphanumericCodeGenerator::new(self.limits.code_length)
                    .map_err(|e| LifecycleError::Configuration(e.to_string()))?,
            ),
        };

        Ok(DropManager {
            repo: DropRepository::new(state),
            blob,
            codes,
            limits: self.limits,
            verify_unique_codes: self.verify_unique_codes,
            max_code_attempts: self.max_code_attempts,
            compensate_orphaned_blobs: self.compensate_orphaned_blobs,
            metrics: self.metrics.unwrap_or_default(),
        })
    }
}

impl Default for DropManagerBuilder {
    fn default() -> Self {
        Self::new()
    }
}
