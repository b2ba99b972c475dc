use axum::Json;
use axum::extract::{Multipart, State};
use axum::response::IntoResponse;
use bytes::Bytes;
use dropfade_core::expiry_seconds;
use dropfade_lifecycle::DropContent;

use super::AppState;
use super::schemas::{ErrorResponse, UploadResponse, UploadTextRequest};
use crate::error::ServerError;

/// A `file` part read from a multipart body.
struct FilePart {
    filename: String,
    content_type: Option<String>,
    data: Bytes,
}

/// `POST /upload/file` -- create a file drop from a multipart form.
#[utoipa::path(
    post,
    path = "/upload/file",
    tag = "Drops",
    summary = "Upload file",
    description = "Stores a file for one-time retrieval. Form fields: `file` (binary) and optional `expiry` (`5min`, `1hour`, `1day`).",
    request_body(content_type = "multipart/form-data", description = "Multipart form with `file` and `expiry` fields"),
    responses(
        (status = 200, description = "Drop created", body = UploadResponse),
        (status = 400, description = "No file provided", body = ErrorResponse),
        (status = 413, description = "File too large", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn upload_file(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> Result<impl IntoResponse, ServerError> {
    let mut file: Option<FilePart> = None;
    let mut expiry: Option<String> = None;

    while let Some(field) = multipart.next_field().await? {
        let name = field.name().map(str::to_owned);
        match name.as_deref() {
            Some("file") => {
                let filename = field.file_name().unwrap_or_default().to_owned();
                let content_type = field.content_type().map(str::to_owned);
                let data = field.bytes().await?;
                file = Some(FilePart {
                    filename,
                    content_type,
                    data,
                });
            }
            Some("expiry") => expiry = Some(field.text().await?),
            _ => {}
        }
    }

    let file = file.ok_or_else(|| ServerError::BadRequest("No file provided".into()))?;
    let created = state
        .manager
        .create(
            DropContent::File {
                data: file.data,
                filename: file.filename,
                content_type: file.content_type,
            },
            expiry_seconds(expiry.as_deref()),
        )
        .await?;

    Ok(Json(UploadResponse::from(created)))
}

/// `POST /upload/text` -- create a text drop.
#[utoipa::path(
    post,
    path = "/upload/text",
    tag = "Drops",
    summary = "Upload text",
    description = "Stores a short text note for one-time retrieval.",
    request_body(content = UploadTextRequest, description = "Note and expiry token"),
    responses(
        (status = 200, description = "Drop created", body = UploadResponse),
        (status = 400, description = "No text provided, or text too long", body = ErrorResponse),
        (status = 503, description = "Storage unavailable", body = ErrorResponse)
    )
)]
pub async fn upload_text(
    State(state): State<AppState>,
    Json(request): Json<UploadTextRequest>,
) -> Result<impl IntoResponse, ServerError> {
    let created = state
        .manager
        .create(
            DropContent::Text(request.text.unwrap_or_default()),
            expiry_seconds(request.expiry.as_deref()),
        )
        .await?;

    Ok(Json(UploadResponse::from(created)))
}
