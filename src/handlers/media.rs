//! Media handlers: list, download, upload (raw body), delete.

use crate::error::AppError;
use crate::extractors::session::Protected;
use crate::media::{chunks, MediaStore};
use crate::response::success_one;
use crate::state::AppState;
use axum::{
    body::{Body, Bytes},
    extract::{Path, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde_json::json;

fn media(state: &AppState) -> Result<&MediaStore, AppError> {
    state
        .media
        .as_ref()
        .ok_or_else(|| AppError::NotFound("media is disabled".into()))
}

pub async fn list(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let files = media(&state)?.list().await?;
    Ok(Json(json!({ "data": files })))
}

pub async fn get(State(state): State<AppState>, Path(name): Path<String>) -> Result<impl IntoResponse, AppError> {
    let (info, file) = media(&state)?.open_file(&name).await?;
    Ok((
        [
            (header::CONTENT_TYPE, info.mime_type),
            (header::CONTENT_LENGTH, info.size.to_string()),
        ],
        Body::from_stream(chunks(file)),
    ))
}

pub async fn upload(
    State(state): State<AppState>,
    Protected(_user): Protected,
    Path(name): Path<String>,
    body: Bytes,
) -> Result<impl IntoResponse, AppError> {
    let info = media(&state)?.put(&name, &body).await?;
    Ok(success_one(info))
}

pub async fn delete(
    State(state): State<AppState>,
    Protected(_user): Protected,
    Path(name): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    media(&state)?.delete(&name).await?;
    Ok(StatusCode::NO_CONTENT)
}
