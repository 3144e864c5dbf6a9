//! Protected system handlers: stored schema document and non-secret runtime configuration.

use crate::error::AppError;
use crate::extractors::session::Protected;
use crate::response::success_one_ok;
use crate::schema::load_from_pool;
use crate::state::AppState;
use axum::{extract::State, response::IntoResponse};
use serde_json::json;

pub async fn schema(State(state): State<AppState>, Protected(_user): Protected) -> Result<impl IntoResponse, AppError> {
    let stored = load_from_pool(&state.pool)
        .await?
        .ok_or_else(|| AppError::NotFound("no schema has been applied".into()))?;
    Ok(success_one_ok(json!({
        "version": stored.version,
        "document": stored.document,
    })))
}

pub async fn config(State(state): State<AppState>, Protected(_user): Protected) -> Result<impl IntoResponse, AppError> {
    let config = &state.config;
    Ok(success_one_ok(json!({
        "entities": state.model.entity_names(),
        "auth": {
            "enabled": config.auth.enabled,
            "allow_register": state.auth.allow_register(),
            "cookie_name": state.auth.cookie_name(),
        },
        "media": {
            "enabled": state.media.is_some(),
            "max_size": config.media.max_size,
        },
        "admin": {
            "basepath": config.admin.basepath,
            "logo_return_path": config.admin.logo_return_path,
            "base_url": config.admin.base_url,
        },
    })))
}
