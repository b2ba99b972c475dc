#![allow(clippy::needless_for_each)]

use dropfade_core::DropKind;
use dropfade_lifecycle::MetricsSnapshot;
use utoipa::OpenApi;

use super::schemas::{
    DropInfo, ErrorResponse, FileActionRequest, FileActionResponse, HealthResponse, PeekResponse,
    TextDownloadResponse, UploadResponse, UploadTextRequest,
};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "dropfade",
        description = "Share a file or a short note behind a short code. Each drop can be retrieved exactly once and expires after a chosen window.",
        license(name = "Apache-2.0"),
    ),
    tags(
        (name = "Drops", description = "Create, peek and consume one-time drops"),
        (name = "Health", description = "Health and metrics"),
    ),
    paths(
        super::uploads::upload_file,
        super::uploads::upload_text,
        super::drops::peek_drop,
        super::drops::acknowledge_drop,
        super::drops::download_drop,
        super::health::health,
        super::health::metrics,
    ),
    components(schemas(
        DropKind,
        DropInfo,
        ErrorResponse,
        FileActionRequest,
        FileActionResponse,
        HealthResponse,
        MetricsSnapshot,
        PeekResponse,
        TextDownloadResponse,
        UploadResponse,
        UploadTextRequest,
    ))
)]
pub struct ApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let doc = ApiDoc::openapi();
        for path in [
            "/upload/file",
            "/upload/text",
            "/file/{code}",
            "/download/{code}",
            "/health",
            "/metrics",
        ] {
            assert!(doc.paths.paths.contains_key(path), "missing {path}");
        }
    }
}
