pub mod drops;
pub mod health;
pub mod openapi;
pub mod schemas;
pub mod uploads;

use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use dropfade_lifecycle::DropManager;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;
use utoipa::OpenApi;
use utoipa_swagger_ui::SwaggerUi;

use self::openapi::ApiDoc;

/// Headroom on top of the file cap for multipart framing and the other form
/// fields.
const MULTIPART_OVERHEAD_BYTES: usize = 64 * 1024;

/// Shared application state passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    /// The drop lifecycle manager.
    pub manager: Arc<DropManager>,
}

/// Build the Axum router with all API routes.
pub fn router(state: AppState) -> Router {
    let upload_limit = upload_body_limit(state.manager.limits().max_file_size_bytes);

    let uploads = Router::new()
        .route("/upload/file", post(uploads::upload_file))
        .route("/upload/text", post(uploads::upload_text))
        .layer(DefaultBodyLimit::max(upload_limit));

    Router::new()
        .route("/health", get(health::health))
        .route("/metrics", get(health::metrics))
        .route(
            "/file/{code}",
            get(drops::peek_drop).post(drops::acknowledge_drop),
        )
        .route("/download/{code}", get(drops::download_drop))
        .merge(uploads)
        .merge(SwaggerUi::new("/swagger-ui").url("/api-doc/openapi.json", ApiDoc::openapi()))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Body limit for upload routes.
///
/// Files slightly over the cap must still reach the handler so the client
/// gets the "File too large" error rather than a bare 413 from the
/// extractor.
fn upload_body_limit(max_file_size_bytes: u64) -> usize {
    usize::try_from(max_file_size_bytes)
        .unwrap_or(usize::MAX)
        .saturating_mul(2)
        .saturating_add(MULTIPART_OVERHEAD_BYTES)
}
