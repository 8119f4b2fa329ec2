pub mod error;
pub mod picture;
pub mod state;
pub mod upload;

use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use axum::Router;
use tower_http::services::ServeDir;
use tower_http::trace::TraceLayer;

use crate::http::state::AppState;

/// Build the full application router: the two dynamic routes plus static
/// serving of the site directory (default document + uploaded files).
pub fn build_router(state: AppState) -> Router {
    let static_files = ServeDir::new(&state.site_dir).append_index_html_on_directories(true);
    Router::new()
        .route("/upload", post(upload::upload_image))
        .route("/picture/{id}", get(picture::picture_page))
        .fallback_service(static_files)
        .layer(DefaultBodyLimit::max(upload::MAX_UPLOAD_BYTES))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
