use std::sync::Arc;

use dropfade_lifecycle::{DropManager, DropManagerBuilder};

use crate::blob_factory::create_blob;
use crate::config::DropfadeConfig;
use crate::error::ServerError;
use crate::state_factory::create_state;

/// Construct the [`DropManager`] and its backing stores from configuration.
pub fn create_manager(config: &DropfadeConfig) -> Result<Arc<DropManager>, ServerError> {
    let state = create_state(&config.state)?;
    let blob = create_blob(&config.blob)?;

    let manager = DropManagerBuilder::new()
        .state(state)
        .blob(blob)
        .limits(config.limits.to_limits())
        .verify_unique_codes(config.drops.verify_unique_codes)
        .max_code_attempts(config.drops.max_code_attempts)
        .compensate_orphaned_blobs(config.drops.compensate_orphaned_blobs)
        .build()
        .map_err(|e| ServerError::Config(e.to_string()))?;

    Ok(Arc::new(manager))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_builds_memory_manager() {
        let manager = create_manager(&DropfadeConfig::default()).unwrap();
        assert_eq!(manager.limits().code_length, 6);
    }

    #[test]
    fn invalid_code_length_is_a_config_error() {
        let mut config = DropfadeConfig::default();
        config.limits.code_length = 2;
        let err = create_manager(&config).err().unwrap();
        assert!(matches!(err, ServerError::Config(_)));
    }

    #[test]
    fn zero_attempts_is_a_config_error() {
        let mut config = DropfadeConfig::default();
        config.drops.max_code_attempts = 0;
        assert!(create_manager(&config).is_err());
    }
}
