use std::time::Duration;

/// Configuration for the Cloudinary blob store.
#[derive(Clone)]
pub struct CloudinaryConfig {
    /// Cloud name that scopes every API and delivery URL.
    pub cloud_name: String,

    /// API key sent with signed requests.
    pub api_key: String,

    /// API secret used to sign requests and for admin API basic auth.
    pub api_secret: String,

    /// Folder that every upload is placed in.
    pub folder: String,

    /// Base URL of the upload and admin API. Override for testing.
    pub api_base_url: String,

    /// Base URL of the delivery CDN. Override for testing.
    pub delivery_base_url: String,

    /// Per-request timeout.
    pub timeout: Duration,
}

impl std::fmt::Debug for CloudinaryConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudinaryConfig")
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &"[REDACTED]")
            .field("folder", &self.folder)
            .field("api_base_url", &self.api_base_url)
            .field("delivery_base_url", &self.delivery_base_url)
            .field("timeout", &self.timeout)
            .finish()
    }
}

impl CloudinaryConfig {
    /// Create a configuration with the given credentials and default
    /// endpoints (`https://api.cloudinary.com`, `https://res.cloudinary.com`).
    pub fn new(
        cloud_name: impl Into<String>,
        api_key: impl Into<String>,
        api_secret: impl Into<String>,
    ) -> Self {
        Self {
            cloud_name: cloud_name.into(),
            api_key: api_key.into(),
            api_secret: api_secret.into(),
            folder: "dropfade".to_owned(),
            api_base_url: "https://api.cloudinary.com".to_owned(),
            delivery_base_url: "https://res.cloudinary.com".to_owned(),
            timeout: Duration::from_secs(30),
        }
    }

    #[must_use]
    pub fn with_folder(mut self, folder: impl Into<String>) -> Self {
        self.folder = folder.into();
        self
    }

    /// Override the API base URL (useful for testing).
    #[must_use]
    pub fn with_api_base_url(mut self, url: impl Into<String>) -> Self {
        self.api_base_url = url.into();
        self
    }

    /// Override the delivery base URL (useful for testing).
    #[must_use]
    pub fn with_delivery_base_url(mut self, url: impl Into<String>) -> Self {
        self.delivery_base_url = url.into();
        self
    }

    #[must_use]
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = CloudinaryConfig::new("demo", "key", "secret");
        assert_eq!(config.folder, "dropfade");
        assert_eq!(config.api_base_url, "https://api.cloudinary.com");
        assert_eq!(config.delivery_base_url, "https://res.cloudinary.com");
        assert_eq!(config.timeout, Duration::from_secs(30));
    }

    #[test]
    fn builders_override() {
        let config = CloudinaryConfig::new("demo", "key", "secret")
            .with_folder("drops")
            .with_api_base_url("http://localhost:9999")
            .with_delivery_base_url("http://localhost:9998")
            .with_timeout(Duration::from_secs(5));
        assert_eq!(config.folder, "drops");
        assert_eq!(config.api_base_url, "http://localhost:9999");
        assert_eq!(config.delivery_base_url, "http://localhost:9998");
        assert_eq!(config.timeout, Duration::from_secs(5));
    }

    #[test]
    fn debug_redacts_secret() {
        let config = CloudinaryConfig::new("demo", "key", "test-placeholder-secret");
        let debug = format!("{config:?}");
        assert!(debug.contains("[REDACTED]"));
        assert!(!debug.contains("test-placeholder-secret"));
        assert!(debug.contains("demo"));
    }
}
