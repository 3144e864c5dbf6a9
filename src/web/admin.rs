//! Admin catch-all: an HTML shell that boots the embedded admin bundle with its configuration.

use crate::auth::SessionUser;
use crate::backend::{ApiOptions, Backend};
use crate::config::AdminConfig;
use axum::{
    extract::State,
    http::HeaderMap,
    response::Html,
};
use serde_json::json;
use std::sync::Arc;

/// Configuration handed to the admin bundle.
pub fn admin_config(admin: &AdminConfig, user: Option<&SessionUser>) -> serde_json::Value {
    json!({
        "basepath": admin.basepath,
        "logo_return_path": admin.logo_return_path,
        "base_url": admin.base_url,
        "user": user,
    })
}

pub fn render_shell(config: &serde_json::Value) -> String {
    // Keep the JSON from closing the script element.
    let config = config.to_string().replace("</", "<\\/");
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>Admin - todo-start</title>
    <link rel="stylesheet" href="/_assets/admin.css">
    <script id="admin-config" type="application/json">{config}</script>
    <script defer src="/_assets/admin.js"></script>
</head>
<body>
    <div id="admin-root"></div>
</body>
</html>"##,
        config = config,
    )
}

pub async fn shell(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Html<String> {
    let user = backend
        .api(ApiOptions {
            verify_session: true,
            headers,
        })
        .ok()
        .and_then(|api| api.user().cloned());
    let config = admin_config(&backend.config().admin, user.as_ref());
    Html(render_shell(&config))
}
