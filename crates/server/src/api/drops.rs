use axum::Json;
use axum::body::Body;
use axum::extract::{Path, State};
use axum::http::{HeaderValue, header};
use axum::response::{IntoResponse, Response};
use dropfade_core::DropKind;
use dropfade_lifecycle::Delivery;
use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use super::AppState;
use super::schemas::{
    ErrorResponse, FileActionRequest, FileActionResponse, PeekResponse, TextDownloadResponse,
};
use crate::error::ServerError;

/// Characters left unescaped by URI component encoding.
const URI_COMPONENT: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'!')
    .remove(b'~')
    .remove(b'*')
    .remove(b'\'')
    .remove(b'(')
    .remove(b')');

const TEXT_DELETED_MESSAGE: &str = "Text has been permanently deleted after this access";

/// `GET /file/{code}` -- look at a drop without consuming it.
#[utoipa::path(
    get,
    path = "/file/{code}",
    tag = "Drops",
    summary = "Peek drop",
    description = "Returns a drop's metadata and remaining lifetime, plus the note for text drops. File bytes are only served by the download route. The drop stays available.",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    responses(
        (status = 200, description = "Drop is live", body = PeekResponse),
        (status = 400, description = "Malformed code", body = ErrorResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse),
        (status = 410, description = "Drop was consumed or has expired", body = ErrorResponse)
    )
)]
pub async fn peek_drop(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<impl IntoResponse, ServerError> {
    let preview = state.manager.peek(&code).await?;
    Ok(Json(PeekResponse::from(preview)))
}

/// `POST /file/{code}` -- spend a drop without receiving its content.
#[utoipa::path(
    post,
    path = "/file/{code}",
    tag = "Drops",
    summary = "Acknowledge drop",
    description = "Consumes a drop for clients that already hold its content, e.g. after copying a note to the clipboard.",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    request_body(content = FileActionRequest, description = "Action to perform"),
    responses(
        (status = 200, description = "Drop consumed", body = FileActionResponse),
        (status = 400, description = "Invalid action", body = ErrorResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse),
        (status = 410, description = "Drop was consumed or has expired", body = ErrorResponse)
    )
)]
pub async fn acknowledge_drop(
    State(state): State<AppState>,
    Path(code): Path<String>,
    Json(request): Json<FileActionRequest>,
) -> Result<impl IntoResponse, ServerError> {
    if request.action != "download" {
        return Err(ServerError::BadRequest("Invalid action".into()));
    }

    let kind = state.manager.acknowledge(&code).await?;
    Ok(Json(FileActionResponse {
        success: true,
        kind,
    }))
}

/// `GET /download/{code}` -- deliver a drop's content exactly once.
#[utoipa::path(
    get,
    path = "/download/{code}",
    tag = "Drops",
    summary = "Download drop",
    description = "Consumes a drop. Text drops are returned as JSON; file drops as an attachment with the original file name. The drop is deleted before the response is sent.",
    params(("code" = String, Path, description = "Access code (case-insensitive)")),
    responses(
        (status = 200, description = "Text drop as JSON, or file drop as an attachment body", body = TextDownloadResponse),
        (status = 404, description = "File not found or expired", body = ErrorResponse),
        (status = 410, description = "Drop was consumed or has expired", body = ErrorResponse),
        (status = 500, description = "Access was spent but the file could not be delivered", body = ErrorResponse)
    )
)]
pub async fn download_drop(
    State(state): State<AppState>,
    Path(code): Path<String>,
) -> Result<Response, ServerError> {
    let response = match state.manager.consume(&code).await? {
        Delivery::Text { content, filename } => Json(TextDownloadResponse {
            success: true,
            kind: DropKind::Text,
            content,
            filename,
            message: TEXT_DELETED_MESSAGE.to_owned(),
        })
        .into_response(),
        Delivery::File {
            data,
            filename,
            content_type,
        } => {
            let disposition = content_disposition(&filename);
            (
                [
                    (header::CONTENT_TYPE, HeaderValue::from_static(content_type)),
                    (header::CONTENT_DISPOSITION, disposition),
                    (header::CONTENT_LENGTH, HeaderValue::from(data.len())),
                    (header::CACHE_CONTROL, HeaderValue::from_static("no-store")),
                ],
                Body::from(data),
            )
                .into_response()
        }
    };
    Ok(response)
}

/// `attachment; filename="<name>"` with the name URI-component encoded, so
/// the header is always valid ASCII.
fn content_disposition(filename: &str) -> HeaderValue {
    let encoded = utf8_percent_encode(filename, URI_COMPONENT);
    HeaderValue::try_from(format!("attachment; filename=\"{encoded}\""))
        .unwrap_or_else(|_| HeaderValue::from_static("attachment"))
}
