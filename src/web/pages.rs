//! Server-rendered pages: home (todo list), SSR demo and account.

use crate::auth::SessionUser;
use crate::backend::{ApiOptions, Backend};
use crate::error::AppError;
use crate::functions::{list_todos, todo_titles, ListTodos, TodoList};
use axum::{
    extract::State,
    http::{HeaderMap, Uri},
    response::{Html, IntoResponse, Response},
};
use std::sync::Arc;

/// Minimal HTML escape for text and attribute values.
pub fn html_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&#x27;")
}

/// Base page layout.
pub fn layout(title: &str, content: &str, footer: &str) -> String {
    format!(
        r##"<!DOCTYPE html>
<html lang="en">
<head>
    <meta charset="UTF-8">
    <meta name="viewport" content="width=device-width, initial-scale=1.0">
    <title>{title} - todo-start</title>
    <link rel="stylesheet" href="/_assets/app.css">
    <script defer src="/_assets/app.js"></script>
</head>
<body>
    <main class="page">
        <header class="brand"><span class="logo">todo</span><span class="amp">&amp;</span><span class="logo">start</span></header>
        {content}
    </main>
    {footer}
</body>
</html>"##,
        title = html_escape(title),
        content = content,
        footer = footer,
    )
}

/// Shared footer. The first link flips between Home and SSR.
pub fn footer(current_path: &str, admin_path: &str) -> String {
    let (href, label) = if current_path == "/" { ("/ssr", "SSR") } else { ("/", "Home") };
    format!(
        r#"<footer class="footer">
        <a href="{href}">{label}</a>
        <a href="{admin}">Admin</a>
        <a href="/login">Account</a>
    </footer>"#,
        href = href,
        label = label,
        admin = html_escape(admin_path),
    )
}

fn admin_path(backend: &Backend) -> String {
    backend.config().admin.basepath.clone()
}

/// Verified session user from request headers, if any.
fn session_user(backend: &Backend, headers: &HeaderMap) -> Option<SessionUser> {
    backend
        .api(ApiOptions {
            verify_session: true,
            headers: headers.clone(),
        })
        .ok()
        .and_then(|api| api.user().cloned())
}

/// Loader failure page carrying the error code.
fn error_page(backend: &Backend, path: &str, err: &AppError) -> Response {
    let kind = err.kind();
    let content = format!(
        r#"<section class="error-page">
        <h1>Something went wrong</h1>
        <p class="error"><code>{code}</code> {message}</p>
    </section>"#,
        code = kind.code(),
        message = html_escape(&err.message()),
    );
    let html = layout("Error", &content, &footer(path, &admin_path(backend)));
    (kind.status(), Html(html)).into_response()
}

pub fn render_home(list: &TodoList) -> String {
    let hidden = if list.total > list.limit as u64 {
        format!(
            r#"<div class="hidden-note">{} more todo(s) hidden</div>"#,
            list.total - list.limit as u64
        )
    } else {
        String::new()
    };
    let items: String = list
        .items
        .iter()
        .rev()
        .map(|todo| {
            format!(
                r#"
            <li class="todo">
                <label>
                    <input type="checkbox" data-complete data-id="{id}" data-done="{done}"{checked}>
                    <span>{title}</span>
                </label>
                <button type="button" data-delete="{id}" aria-label="Delete todo">&#x274C;</button>
            </li>"#,
                id = todo.id,
                done = todo.done,
                checked = if todo.done { " checked" } else { "" },
                title = html_escape(&todo.title),
            )
        })
        .collect();
    format!(
        r#"<ol class="intro">
            <li>Get started with a full backend.</li>
            <li>Focus on what matters instead of repetition.</li>
        </ol>
        <section class="todos">
            <h2><code>What's next?</code></h2>
            <div id="error" class="error" role="alert" hidden></div>
            {hidden}
            <ul class="todo-list">{items}
            </ul>
            <form id="new-todo" class="new-todo">
                <input type="text" name="title" placeholder="New todo" autocomplete="off">
                <button type="submit">Add</button>
            </form>
        </section>"#,
        hidden = hidden,
        items = items,
    )
}

pub async fn home(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let loaded = match backend.api(ApiOptions {
        verify_session: false,
        headers,
    }) {
        Ok(api) => list_todos(&api, ListTodos::default()).await,
        Err(e) => Err(e),
    };
    match loaded {
        Ok(list) => {
            let html = layout("Todos", &render_home(&list), &footer("/", &admin_path(&backend)));
            Html(html).into_response()
        }
        Err(e) => error_page(&backend, "/", &e),
    }
}

pub async fn ssr(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let user = session_user(&backend, &headers);
    let titles = match backend.api(ApiOptions {
        verify_session: false,
        headers,
    }) {
        Ok(api) => todo_titles(&api).await,
        Err(e) => Err(e),
    };
    let titles = match titles {
        Ok(t) => t,
        Err(e) => return error_page(&backend, "/ssr", &e),
    };

    let items: String = titles
        .iter()
        .map(|t| format!("<li>{}</li>", html_escape(t)))
        .collect();
    let session = match &user {
        Some(user) => format!(
            r#"Logged in as {email}. <a href="/api/auth/logout">Logout</a>"#,
            email = html_escape(&user.email),
        ),
        None => {
            let auth = &backend.config().auth;
            let hint = match (&auth.seed_email, &auth.seed_password) {
                (Some(email), Some(password)) => format!(
                    r#"<p class="hint">Sign in with: <b><code>{}</code></b> / <b><code>{}</code></b></p>"#,
                    html_escape(email),
                    html_escape(password),
                ),
                _ => String::new(),
            };
            format!(r#"<p>Not logged in. <a href="/login">Login</a></p>{}"#, hint)
        }
    };
    let content = format!(
        r#"<ol class="titles">{items}</ol>
        <div class="session">{session}</div>"#,
        items = items,
        session = session,
    );
    Html(layout("SSR", &content, &footer("/ssr", &admin_path(&backend)))).into_response()
}

pub fn render_account(user: Option<&SessionUser>, admin_path: &str, allow_register: bool) -> String {
    match user {
        Some(user) => format!(
            r#"<section class="account">
            <h2>Account</h2>
            <div><strong>Signed in as:</strong> {email}</div>
            <div><strong>Verified:</strong> {verified}</div>
            <div id="error" class="error" role="alert" hidden></div>
            <div class="actions">
                <button type="button" id="logout">Sign out</button>
                <a class="button" href="{admin}">Go to Admin</a>
            </div>
        </section>"#,
            email = html_escape(&user.email),
            verified = if user.verified { "Yes" } else { "No" },
            admin = html_escape(admin_path),
        ),
        None => {
            let register = if allow_register {
                r#"<button type="button" data-mode="register">Register</button>"#
            } else {
                ""
            };
            format!(
                r#"<section class="account">
            <h2>Account</h2>
            <form id="auth" class="auth" data-mode="login">
                <div class="modes">
                    <button type="button" data-mode="login" class="active">Log in</button>
                    {register}
                </div>
                <input type="email" name="email" placeholder="Email" required>
                <input type="password" name="password" placeholder="Password" required>
                <div id="error" class="error" role="alert" hidden></div>
                <button type="submit" data-login="Log in" data-register="Create account">Log in</button>
            </form>
        </section>"#,
                register = register,
            )
        }
    }
}

pub async fn account(State(backend): State<Arc<Backend>>, headers: HeaderMap) -> Response {
    let user = session_user(&backend, &headers);
    let admin = admin_path(&backend);
    let allow_register = backend.state().auth.allow_register();
    let content = render_account(user.as_ref(), &admin, allow_register);
    Html(layout("Account", &content, &footer("/login", &admin))).into_response()
}

pub async fn not_found(State(backend): State<Arc<Backend>>, uri: Uri) -> Response {
    let err = AppError::NotFound(format!("page {}", uri.path()));
    error_page(&backend, uri.path(), &err)
}
