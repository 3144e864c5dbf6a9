//! Password auth routes.

use crate::handlers::auth::{login, logout_get, logout_post, me, register};
use crate::state::AppState;
use axum::{
    routing::{get, post},
    Router,
};

pub fn auth_routes(state: AppState) -> Router {
    Router::new()
        .route("/password/register", post(register))
        .route("/password/login", post(login))
        .route("/me", get(me))
        .route("/logout", get(logout_get).post(logout_post))
        .with_state(state)
}
