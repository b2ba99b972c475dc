use serde::Deserialize;

/// Configuration for the blob store backend.
///
/// # Example
///
/// ```toml
/// [blob]
/// backend = "cloudinary"
/// cloud_name = "demo"
/// folder = "dropfade"
/// ```
///
/// Credentials left out of the file are read from `CLOUDINARY_CLOUD_NAME`,
/// `CLOUDINARY_API_KEY` and `CLOUDINARY_API_SECRET`.
#[derive(Deserialize)]
pub struct BlobConfig {
    /// Which backend to use: `"memory"` or `"cloudinary"`.
    #[serde(default = "default_backend")]
    pub backend: String,
    pub cloud_name: Option<String>,
    pub api_key: Option<String>,
    pub api_secret: Option<String>,
    /// Folder every upload is placed in.
    #[serde(default = "default_folder")]
    pub folder: String,
    /// Override for the upload/admin API base URL.
    pub api_base: Option<String>,
    /// Override for the delivery CDN base URL.
    pub delivery_base: Option<String>,
    /// Per-request timeout in seconds.
    #[serde(default = "default_timeout")]
    pub timeout_seconds: u64,
}

impl std::fmt::Debug for BlobConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("BlobConfig")
            .field("backend", &self.backend)
            .field("cloud_name", &self.cloud_name)
            .field("api_key", &self.api_key)
            .field("api_secret", &self.api_secret.as_ref().map(|_| "[REDACTED]"))
            .field("folder", &self.folder)
            .field("api_base", &self.api_base)
            .field("delivery_base", &self.delivery_base)
            .field("timeout_seconds", &self.timeout_seconds)
            .finish()
    }
}

impl Default for BlobConfig {
    fn default() -> Self {
        Self {
            backend: default_backend(),
            cloud_name: None,
            api_key: None,
            api_secret: None,
            folder: default_folder(),
            api_base: None,
            delivery_base: None,
            timeout_seconds: default_timeout(),
        }
    }
}

impl BlobConfig {
    /// Fill unset credentials from `lookup` (normally the environment).
    pub fn fill_credentials_from(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        let fields = [
            (&mut self.cloud_name, "CLOUDINARY_CLOUD_NAME"),
            (&mut self.api_key, "CLOUDINARY_API_KEY"),
            (&mut self.api_secret, "CLOUDINARY_API_SECRET"),
        ];
        for (field, var) in fields {
            if field.is_none() {
                *field = lookup(var).filter(|v| !v.is_empty());
            }
        }
    }
}

fn default_backend() -> String {
    "memory".to_owned()
}

fn default_folder() -> String {
    "dropfade".to_owned()
}

fn default_timeout() -> u64 {
    30
}
