//! Backend route tables. Every backend path lives under `/api`.

mod auth;
mod common;
mod entity;
mod media;
mod system;

pub use auth::auth_routes;
pub use common::common_routes;
pub use entity::entity_routes;
pub use media::media_routes;
pub use system::system_routes;

use crate::error::AppError;
use crate::state::AppState;
use axum::{http::Uri, Router};

/// Full backend API. Auth and media routes are mounted only when enabled.
pub fn api_routes(state: AppState) -> Router {
    let mut router = Router::new()
        .nest("/api/data/entity", entity_routes(state.clone()))
        .nest("/api/system", system_routes(state.clone()));
    if state.auth.enabled() {
        router = router.nest("/api/auth", auth_routes(state.clone()));
    }
    if let Some(media) = &state.media {
        let max_size = media.max_size();
        router = router.nest("/api/media", media_routes(state.clone(), max_size));
    }
    router.fallback(not_found)
}

async fn not_found(uri: Uri) -> AppError {
    AppError::NotFound(format!("no route for {}", uri.path()))
}
