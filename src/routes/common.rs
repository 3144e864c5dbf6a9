//! Liveness, readiness and build info. Mounted on the application router, outside `/api`.

use crate::schema::load_from_pool;
use crate::state::AppState;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;

async fn health() -> Json<serde_json::Value> {
    Json(json!({ "status": "ok" }))
}

/// Ready once the database answers and a schema has been applied.
async fn ready(State(state): State<AppState>) -> Response {
    match load_from_pool(&state.pool).await {
        Ok(Some(stored)) => Json(json!({
            "status": "ok",
            "database": "ok",
            "schema_version": stored.version,
            "entities": state.model.entities.len(),
        }))
        .into_response(),
        Ok(None) => {
            tracing::warn!("readiness probe: no schema applied");
            degraded("ok")
        }
        Err(e) => {
            tracing::warn!(error = %e, "readiness probe: database unavailable");
            degraded("unavailable")
        }
    }
}

fn degraded(database: &'static str) -> Response {
    (
        StatusCode::SERVICE_UNAVAILABLE,
        Json(json!({ "status": "degraded", "database": database })),
    )
        .into_response()
}

async fn version() -> Json<serde_json::Value> {
    Json(json!({
        "name": env!("CARGO_PKG_NAME"),
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

pub fn common_routes(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/ready", get(ready))
        .route("/version", get(version))
        .with_state(state)
}
