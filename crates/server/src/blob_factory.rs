use std::sync::Arc;
#[cfg(feature = "cloudinary")]
use std::time::Duration;

use dropfade_blob::BlobStore;
#[cfg(feature = "cloudinary")]
use dropfade_blob_cloudinary::{CloudinaryBlobStore, CloudinaryConfig};
use dropfade_blob_memory::MemoryBlobStore;

use crate::config::BlobConfig;
use crate::error::ServerError;

/// Construct the blob store from configuration.
pub fn create_blob(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    match config.backend.as_str() {
        "memory" => Ok(Arc::new(MemoryBlobStore::new())),
        #[cfg(feature = "cloudinary")]
        "cloudinary" => create_cloudinary(config),
        other => Err(ServerError::Config(format!(
            "unsupported blob backend: {other} (is the feature enabled?)"
        ))),
    }
}

#[cfg(feature = "cloudinary")]
fn create_cloudinary(config: &BlobConfig) -> Result<Arc<dyn BlobStore>, ServerError> {
    let require = |value: &Option<String>, field: &str| {
        value.clone().ok_or_else(|| {
            ServerError::Config(format!(
                "cloudinary backend requires '{field}' in [blob] or CLOUDINARY_{} in the environment",
                field.to_uppercase()
            ))
        })
    };

    let mut cloudinary = CloudinaryConfig::new(
        require(&config.cloud_name, "cloud_name")?,
        require(&config.api_key, "api_key")?,
        require(&config.api_secret, "api_secret")?,
    )
    .with_folder(config.folder.clone())
    .with_timeout(Duration::from_secs(config.timeout_seconds));

    if let Some(base) = &config.api_base {
        cloudinary = cloudinary.with_api_base_url(base.clone());
    }
    if let Some(base) = &config.delivery_base {
        cloudinary = cloudinary.with_delivery_base_url(base.clone());
    }

    let store = CloudinaryBlobStore::new(cloudinary)
        .map_err(|e| ServerError::Config(format!("cloudinary store: {e}")))?;
    Ok(Arc::new(store))
}
