use std::sync::Arc;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::routing::{get, post};
use tower_http::trace::TraceLayer;

use crate::handlers;
use crate::state::AppState;

/// Build the application router.
pub fn router(state: Arc<AppState>) -> Router {
    let body_limit = match body_limit_bytes(state.config.max_upload_size) {
        Some(bytes) => DefaultBodyLimit::max(bytes),
        None => DefaultBodyLimit::disable(),
    };

    Router::new()
        .route("/", get(handlers::index::index))
        .route("/health", get(handlers::index::health))
        .route("/extract", post(handlers::extract::extract))
        .layer(body_limit)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Upload limit in bytes, `None` when uploads are unlimited.
fn body_limit_bytes(max_upload_size: u64) -> Option<usize> {
    if max_upload_size == 0 {
        return None;
    }
    Some(usize::try_from(max_upload_size).unwrap_or(usize::MAX))
}
