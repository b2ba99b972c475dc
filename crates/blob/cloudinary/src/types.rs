use serde::Deserialize;

/// Reply of the upload endpoint.
#[derive(Debug, Deserialize)]
pub struct UploadResponse {
    pub public_id: String,
    pub resource_type: String,
    pub secure_url: Option<String>,
    pub url: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    pub created_at: Option<String>,
}

/// Reply of the admin resource-details endpoint.
#[derive(Debug, Default, Deserialize)]
pub struct ResourceDetails {
    pub secure_url: Option<String>,
    pub url: Option<String>,
    pub format: Option<String>,
}

/// Reply of the signed destroy endpoint.
#[derive(Debug, Deserialize)]
pub struct DestroyResponse {
    pub result: String,
}

/// One page of the admin resource listing.
#[derive(Debug, Deserialize)]
pub struct ResourceListPage {
    #[serde(default)]
    pub resources: Vec<ListedResource>,
    pub next_cursor: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ListedResource {
    pub public_id: String,
    pub resource_type: Option<String>,
    #[serde(default)]
    pub bytes: u64,
    pub created_at: String,
}

/// Error envelope returned by every endpoint on failure.
#[derive(Debug, Deserialize)]
pub struct ErrorEnvelope {
    pub error: ErrorMessage,
}

#[derive(Debug, Deserialize)]
pub struct ErrorMessage {
    pub message: String,
}
