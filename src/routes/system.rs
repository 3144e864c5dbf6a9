//! Protected system routes.

use crate::handlers::system::{config, schema};
use crate::state::AppState;
use axum::{routing::get, Router};

pub fn system_routes(state: AppState) -> Router {
    Router::new()
        .route("/schema", get(schema))
        .route("/config", get(config))
        .with_state(state)
}
