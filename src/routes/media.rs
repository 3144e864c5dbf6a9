//! Media routes. Uploads are raw request bodies capped at the configured size.

use crate::handlers::media::{delete, get as get_file, list, upload};
use crate::state::AppState;
use axum::{
    extract::DefaultBodyLimit,
    routing::{get, post},
    Router,
};

pub fn media_routes(state: AppState, max_size: usize) -> Router {
    Router::new()
        .route("/files", get(list))
        .route("/file/:name", get(get_file).delete(delete))
        .route(
            "/upload/:name",
            post(upload).layer(DefaultBodyLimit::max(max_size)),
        )
        .with_state(state)
}
