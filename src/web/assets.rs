//! Static files embedded at compile time.

use crate::error::AppError;
use axum::{
    extract::Path,
    http::header,
    response::IntoResponse,
};
use rust_embed::RustEmbed;

#[derive(RustEmbed)]
#[folder = "assets/"]
pub struct Assets;

pub async fn serve(Path(file): Path<String>) -> Result<impl IntoResponse, AppError> {
    let asset = Assets::get(&file).ok_or_else(|| AppError::NotFound(format!("asset {}", file)))?;
    let mime = mime_guess::from_path(&file).first_or_octet_stream().to_string();
    Ok((
        [(header::CONTENT_TYPE, mime), (header::CACHE_CONTROL, "no-cache".to_string())],
        asset.data.into_owned(),
    ))
}
