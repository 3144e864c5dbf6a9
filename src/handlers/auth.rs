//! Password auth handlers: register, login, me, logout.

use crate::auth::SessionUser;
use crate::error::AppError;
use crate::extractors::json::JsonBody;
use crate::extractors::session::Protected;
use crate::state::AppState;
use axum::{
    extract::{Query, State},
    http::{header, StatusCode},
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::{json, Value};

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct Credentials {
    email: String,
    password: String,
}

fn credentials(body: Value) -> Result<Credentials, AppError> {
    serde_json::from_value(body).map_err(|e| AppError::Validation(format!("invalid credentials body: {}", e)))
}

fn session_response(state: &AppState, status: StatusCode, user: SessionUser) -> Result<impl IntoResponse, AppError> {
    let token = state.auth.issue_token(&user)?;
    let cookie = state.auth.session_cookie(&token);
    Ok((
        status,
        [(header::SET_COOKIE, cookie)],
        Json(json!({ "user": user, "token": token })),
    ))
}

pub async fn register(State(state): State<AppState>, JsonBody(body): JsonBody<Value>) -> Result<impl IntoResponse, AppError> {
    if !state.auth.allow_register() {
        return Err(AppError::NotFound("registration is disabled".into()));
    }
    let creds = credentials(body)?;
    let user = state.auth.register(&creds.email, &creds.password).await?;
    session_response(&state, StatusCode::CREATED, user)
}

pub async fn login(State(state): State<AppState>, JsonBody(body): JsonBody<Value>) -> Result<impl IntoResponse, AppError> {
    let creds = credentials(body)?;
    let user = state.auth.login(&creds.email, &creds.password).await?;
    tracing::debug!(user_id = user.id, "login");
    session_response(&state, StatusCode::OK, user)
}

pub async fn me(Protected(user): Protected) -> Result<impl IntoResponse, AppError> {
    let user = user.ok_or_else(|| AppError::Authentication("no session".into()))?;
    Ok(Json(json!({ "user": user })))
}

#[derive(Deserialize)]
pub struct LogoutQuery {
    redirect: Option<String>,
}

/// Only same-origin paths are followed.
fn local_redirect(target: Option<&str>) -> &str {
    match target {
        Some(t) if t.starts_with('/') && !t.starts_with("//") && !t.contains('\\') => t,
        _ => "/",
    }
}

pub async fn logout_get(State(state): State<AppState>, Query(q): Query<LogoutQuery>) -> impl IntoResponse {
    let location = local_redirect(q.redirect.as_deref()).to_string();
    (
        StatusCode::FOUND,
        [(header::LOCATION, location), (header::SET_COOKIE, state.auth.clear_cookie())],
    )
}

pub async fn logout_post(State(state): State<AppState>) -> impl IntoResponse {
    (
        [(header::SET_COOKIE, state.auth.clear_cookie())],
        Json(json!({ "ok": true })),
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn redirects_stay_on_site() {
        assert_eq!(local_redirect(Some("/../")), "/../");
        assert_eq!(local_redirect(Some("/login")), "/login");
        assert_eq!(local_redirect(Some("//evil.example")), "/");
        assert_eq!(local_redirect(Some("https://evil.example")), "/");
        assert_eq!(local_redirect(None), "/");
    }
}
