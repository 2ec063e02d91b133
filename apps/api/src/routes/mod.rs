pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::intake::handlers;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;
    let uploads = ServeDir::new(state.blobs.root());

    Router::new()
        .route("/health", get(health::health_handler))
        .route(
            "/resume",
            post(handlers::handle_submit).layer(DefaultBodyLimit::max(upload_limit)),
        )
        .route("/resume/:id", get(handlers::handle_get_resume))
        // Direct access to stored blobs by filename
        .nest_service("/uploads", uploads)
        .with_state(state)
}
