use async_trait::async_trait;
use bytes::Bytes;
use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode, multipart};
use tracing::{debug, instrument, warn};

use dropfade_blob::{BlobError, BlobRef, BlobStore, BlobSummary, ResourceKind, UploadedBlob};
use dropfade_core::is_document;

use crate::config::CloudinaryConfig;
use crate::signature::{SIGNATURE_ALGORITHM, sign};
use crate::types::{
    DestroyResponse, ErrorEnvelope, ResourceDetails, ResourceListPage, UploadResponse,
};
use crate::url::{candidate_urls, ref_from_delivery_url};

/// Page size requested from the admin listing endpoint.
const LIST_PAGE_SIZE: u32 = 500;

/// Blob store backed by the Cloudinary upload, admin and delivery APIs.
pub struct CloudinaryBlobStore {
    config: CloudinaryConfig,
    client: Client,
}

impl CloudinaryBlobStore {
    /// Create a store with an HTTP client honouring the configured timeout.
    pub fn new(config: CloudinaryConfig) -> Result<Self, BlobError> {
        let client = Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| BlobError::Storage(format!("failed to build HTTP client: {e}")))?;
        Ok(Self { config, client })
    }

    /// Create a store with a custom HTTP client.
    pub fn with_client(config: CloudinaryConfig, client: Client) -> Self {
        Self { config, client }
    }

    fn api_url(&self, path: &str) -> String {
        format!(
            "{}/v1_1/{}/{path}",
            self.config.api_base_url.trim_end_matches('/'),
            self.config.cloud_name
        )
    }

    fn timestamp() -> String {
        Utc::now().timestamp().to_string()
    }

    /// Signed request fields: the signable params plus credentials.
    fn signed_fields(&self, params: Vec<(&'static str, String)>) -> Vec<(&'static str, String)> {
        let signature = sign(&params, &self.config.api_secret);
        let mut fields = params;
        fields.push(("api_key", self.config.api_key.clone()));
        fields.push(("signature", signature));
        fields.push(("signature_algorithm", SIGNATURE_ALGORITHM.to_owned()));
        fields
    }

    /// Look up a resource through the admin API. `Ok(None)` means the
    /// resource does not exist under `kind`.
    async fn resource_details(
        &self,
        kind: ResourceKind,
        public_id: &str,
    ) -> Result<Option<ResourceDetails>, BlobError> {
        let url = self.api_url(&format!("resources/{kind}/upload/{public_id}"));
        let response = self
            .client
            .get(&url)
            .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
            .send()
            .await
            .map_err(transport)?;

        if response.status() == StatusCode::NOT_FOUND {
            return Ok(None);
        }
        let response = check_status(response).await?;
        let details = response.json().await.map_err(transport)?;
        Ok(Some(details))
    }

    async fn download(&self, url: &str) -> Result<Bytes, BlobError> {
        let response = self.client.get(url).send().await.map_err(transport)?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(BlobError::NotFound(url.to_owned()));
        }
        let response = check_status(response).await?;
        response.bytes().await.map_err(transport)
    }

    async fn destroy(&self, kind: ResourceKind, public_id: &str) -> Result<bool, BlobError> {
        let fields = self.signed_fields(vec![
            ("invalidate", "true".to_owned()),
            ("public_id", public_id.to_owned()),
            ("timestamp", Self::timestamp()),
        ]);

        let response = self
            .client
            .post(self.api_url(&format!("{kind}/destroy")))
            .form(&fields)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let reply: DestroyResponse = response.json().await.map_err(transport)?;

        match reply.result.as_str() {
            "ok" => Ok(true),
            "not found" => Ok(false),
            other => Err(BlobError::Storage(format!("unexpected destroy result: {other}"))),
        }
    }

    async fn list_kind(
        &self,
        kind: ResourceKind,
        cutoff: DateTime<Utc>,
        out: &mut Vec<BlobSummary>,
    ) -> Result<(), BlobError> {
        let url = self.api_url(&format!("resources/{kind}/upload"));
        let prefix = format!("{}/", self.config.folder);
        let mut cursor: Option<String> = None;

        loop {
            let mut query = vec![
                ("prefix", prefix.clone()),
                ("max_results", LIST_PAGE_SIZE.to_string()),
            ];
            if let Some(c) = &cursor {
                query.push(("next_cursor", c.clone()));
            }

            let response = self
                .client
                .get(&url)
                .basic_auth(&self.config.api_key, Some(&self.config.api_secret))
                .query(&query)
                .send()
                .await
                .map_err(transport)?;
            let response = check_status(response).await?;
            let page: ResourceListPage = response.json().await.map_err(transport)?;

            for resource in page.resources {
                let Ok(created_at) = DateTime::parse_from_rfc3339(&resource.created_at) else {
                    warn!(public_id = %resource.public_id, "skipping resource with unparseable created_at");
                    continue;
                };
                let created_at = created_at.with_timezone(&Utc);
                if created_at >= cutoff {
                    continue;
                }
                let kind = resource
                    .resource_type
                    .as_deref()
                    .and_then(ResourceKind::parse)
                    .unwrap_or(kind);
                out.push(BlobSummary {
                    blob_ref: BlobRef::new(resource.public_id).with_kind(kind),
                    size_bytes: resource.bytes,
                    created_at,
                });
            }

            cursor = page.next_cursor;
            if cursor.is_none() {
                return Ok(());
            }
        }
    }
}

fn transport(e: reqwest::Error) -> BlobError {
    BlobError::Storage(e.to_string())
}

/// Turn a non-success reply into a [`BlobError::Storage`], surfacing the
/// service's error message when present.
async fn check_status(response: reqwest::Response) -> Result<reqwest::Response, BlobError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let body = response.text().await.unwrap_or_default();
    let message = error_message(&body).unwrap_or(body);
    Err(BlobError::Storage(format!("HTTP {status}: {message}")))
}

fn error_message(body: &str) -> Option<String> {
    serde_json::from_str::<ErrorEnvelope>(body)
        .ok()
        .map(|e| e.error.message)
}

#[async_trait]
impl BlobStore for CloudinaryBlobStore {
    #[instrument(skip(self, data), fields(size = data.len()))]
    async fn upload(
        &self,
        data: Bytes,
        filename: &str,
        content_type: &str,
    ) -> Result<UploadedBlob, BlobError> {
        // Documents go through the raw pipeline so no byte is ever re-encoded.
        let mode = if is_document(filename) { "raw" } else { "auto" };

        let fields = self.signed_fields(vec![
            ("access_mode", "public".to_owned()),
            ("folder", self.config.folder.clone()),
            ("timestamp", Self::timestamp()),
            ("unique_filename", "true".to_owned()),
            ("use_filename", "true".to_owned()),
        ]);

        let size = data.len() as u64;
        let part = multipart::Part::bytes(data.to_vec())
            .file_name(filename.to_owned())
            .mime_str(content_type)
            .map_err(|_| BlobError::InvalidContentType(content_type.to_owned()))?;
        let form = fields
            .into_iter()
            .fold(multipart::Form::new().part("file", part), |form, (k, v)| {
                form.text(k, v)
            });

        let response = self
            .client
            .post(self.api_url(&format!("{mode}/upload")))
            .multipart(form)
            .send()
            .await
            .map_err(transport)?;
        let response = check_status(response).await?;
        let reply: UploadResponse = response.json().await.map_err(transport)?;

        let kind = ResourceKind::parse(&reply.resource_type);
        let public_url = reply
            .secure_url
            .or(reply.url)
            .ok_or_else(|| BlobError::Storage("upload reply carried no URL".into()))?;
        let created_at = reply
            .created_at
            .as_deref()
            .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
            .map_or_else(Utc::now, |t| t.with_timezone(&Utc));

        let mut blob_ref = BlobRef::new(reply.public_id);
        blob_ref.kind = kind;

        debug!(blob_id = %blob_ref, mode, "uploaded blob");
        Ok(UploadedBlob {
            blob_ref,
            public_url,
            size_bytes: if reply.bytes > 0 { reply.bytes } else { size },
            created_at,
        })
    }

    #[instrument(skip(self), fields(blob_id = %blob_ref))]
    async fn fetch(&self, blob_ref: &BlobRef) -> Result<Bytes, BlobError> {
        let mut lookup_error = None;

        for kind in ResourceKind::lookup_order(blob_ref.kind) {
            let details = match self.resource_details(kind, &blob_ref.id).await {
                Ok(Some(details)) => details,
                Ok(None) => continue,
                Err(e) => {
                    warn!(%kind, error = %e, "resource lookup failed");
                    lookup_error = Some(e);
                    continue;
                }
            };

            let candidates = candidate_urls(
                &self.config.delivery_base_url,
                &self.config.cloud_name,
                kind,
                &blob_ref.id,
                details.secure_url.as_deref(),
                details.url.as_deref(),
                details.format.as_deref(),
            );
            for url in &candidates {
                match self.download(url).await {
                    Ok(bytes) => {
                        debug!(%kind, %url, "fetched blob");
                        return Ok(bytes);
                    }
                    Err(e) => debug!(%kind, %url, error = %e, "delivery attempt failed"),
                }
            }

            return Err(BlobError::Storage(format!(
                "resource {blob_ref} located as {kind} but none of {} delivery URLs served it",
                candidates.len()
            )));
        }

        Err(lookup_error.unwrap_or_else(|| BlobError::NotFound(blob_ref.id.clone())))
    }

    #[instrument(skip(self), fields(blob_id = %blob_ref))]
    async fn delete(&self, blob_ref: &BlobRef) -> Result<bool, BlobError> {
        for kind in ResourceKind::lookup_order(blob_ref.kind) {
            if self.destroy(kind, &blob_ref.id).await? {
                debug!(%kind, "destroyed blob");
                return Ok(true);
            }
        }
        Ok(false)
    }

    fn ref_from_url(&self, url: &str) -> Result<BlobRef, BlobError> {
        ref_from_delivery_url(url)
    }

    async fn list_older_than(&self, cutoff: DateTime<Utc>) -> Result<Vec<BlobSummary>, BlobError> {
        let mut out = Vec::new();
        for kind in ResourceKind::LOOKUP_ORDER {
            self.list_kind(kind, cutoff, &mut out).await?;
        }
        Ok(out)
    }
}
