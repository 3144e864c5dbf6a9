//! Session extractor for protected backend routes.

use crate::auth::SessionUser;
use crate::error::AppError;
use crate::state::AppState;
use async_trait::async_trait;
use axum::{extract::FromRequestParts, http::request::Parts};

/// Requires a verified session when auth is enabled. With auth disabled every request passes
/// and the inner value is `None`.
#[derive(Clone, Debug)]
pub struct Protected(pub Option<SessionUser>);

#[async_trait]
impl FromRequestParts<AppState> for Protected {
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        if !state.auth.enabled() {
            return Ok(Protected(None));
        }
        let user = state.auth.verify_headers(&parts.headers)?;
        Ok(Protected(Some(user)))
    }
}

