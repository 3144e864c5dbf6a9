//! Application router: API catch-all, admin catch-all, pages, server functions and assets.

pub mod admin;
pub mod assets;
pub mod pages;

use crate::backend::Backend;
use crate::functions::rpc;
use crate::routes::common_routes;
use axum::{
    extract::{Request, State},
    response::Response,
    routing::{any, get, post},
    Router,
};
use std::sync::Arc;
use tower::ServiceExt;
use tower_http::trace::TraceLayer;

/// Hand the request to the backend and return its response untouched. Extensions are left
/// behind so the backend router matches its own path parameters.
async fn proxy(State(backend): State<Arc<Backend>>, request: Request) -> Response {
    let (parts, body) = request.into_parts();
    let mut forwarded = Request::new(body);
    *forwarded.method_mut() = parts.method;
    *forwarded.uri_mut() = parts.uri;
    *forwarded.version_mut() = parts.version;
    *forwarded.headers_mut() = parts.headers;
    match backend.router().oneshot(forwarded).await {
        Ok(response) => response,
        Err(never) => match never {},
    }
}

pub fn app_router(backend: Arc<Backend>) -> Router {
    let admin = backend.config().admin.basepath.trim_end_matches('/').to_string();
    Router::new()
        .route("/", get(pages::home))
        .route("/ssr", get(pages::ssr))
        .route("/login", get(pages::account))
        .route(&admin, get(admin::shell))
        .route(&format!("{}/*path", admin), get(admin::shell))
        .route("/_assets/*file", get(assets::serve))
        .route("/_serverFn/:name", post(rpc::call))
        .route("/api", any(proxy))
        .route("/api/*path", any(proxy))
        .fallback(pages::not_found)
        .with_state(backend.clone())
        .merge(common_routes(backend.state().clone()))
        .layer(TraceLayer::new_for_http())
}
