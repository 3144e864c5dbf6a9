#![allow(dead_code)]

use axum::body::{to_bytes, Body};
use axum::http::{header, HeaderMap, Method, Request, StatusCode};
use axum::Router;
use serde_json::Value;
use std::sync::Arc;
use tempfile::TempDir;
use todo_start::{app_router, AppConfig, Backend};
use tower::ServiceExt;

pub const SEED_EMAIL: &str = "test@example.com";
pub const SEED_PASSWORD: &str = "12345678";

/// Full application over a temporary SQLite file and media directory.
pub struct TestApp {
    pub backend: Arc<Backend>,
    pub router: Router,
    pub dir: TempDir,
}

pub struct TestResponse {
    pub status: StatusCode,
    pub headers: HeaderMap,
    pub text: String,
}

impl TestResponse {
    pub fn json(&self) -> Value {
        serde_json::from_str(&self.text).unwrap_or_else(|e| panic!("not JSON ({}): {}", e, self.text))
    }

    pub fn error_code(&self) -> String {
        self.json()["error"]["code"].as_str().unwrap_or_default().to_string()
    }

    /// `name=value` from the Set-Cookie header.
    pub fn cookie_pair(&self) -> String {
        let cookie = self.headers[header::SET_COOKIE].to_str().unwrap();
        cookie.split(';').next().unwrap().to_string()
    }
}

pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.connection.url = format!("sqlite://{}", dir.path().join("test.db").display());
    config.media.path = dir.path().join("uploads");
    config.auth.jwt_secret = "test-secret".into();
    config.auth.seed_email = Some(SEED_EMAIL.into());
    config.auth.seed_password = Some(SEED_PASSWORD.into());
    config
}

impl TestApp {
    pub async fn new() -> Self {
        Self::with_config(|_| {}).await
    }

    pub async fn with_config(customize: impl FnOnce(&mut AppConfig)) -> Self {
        let dir = tempfile::tempdir().unwrap();
        let mut config = test_config(&dir);
        customize(&mut config);
        let backend = Backend::init(config).await.unwrap();
        let router = app_router(backend.clone());
        TestApp { backend, router, dir }
    }

    pub async fn send(&self, request: Request<Body>) -> TestResponse {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let headers = response.headers().clone();
        let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
        TestResponse {
            status,
            headers,
            text: String::from_utf8_lossy(&bytes).into_owned(),
        }
    }

    pub async fn request(
        &self,
        method: Method,
        uri: &str,
        body: Option<Value>,
        headers: &[(header::HeaderName, &str)],
    ) -> TestResponse {
        let mut builder = Request::builder().method(method).uri(uri);
        for (name, value) in headers {
            builder = builder.header(name, *value);
        }
        let body = match body {
            Some(v) => {
                builder = builder.header(header::CONTENT_TYPE, "application/json");
                Body::from(v.to_string())
            }
            None => Body::empty(),
        };
        self.send(builder.body(body).unwrap()).await
    }

    /// POST a raw body with no content type.
    pub async fn post_raw(&self, uri: &str, body: &str) -> TestResponse {
        let request = Request::builder()
            .method(Method::POST)
            .uri(uri)
            .body(Body::from(body.to_string()))
            .unwrap();
        self.send(request).await
    }

    pub async fn get(&self, uri: &str) -> TestResponse {
        self.request(Method::GET, uri, None, &[]).await
    }

    pub async fn post(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::POST, uri, Some(body), &[]).await
    }

    pub async fn patch(&self, uri: &str, body: Value) -> TestResponse {
        self.request(Method::PATCH, uri, Some(body), &[]).await
    }

    pub async fn delete(&self, uri: &str) -> TestResponse {
        self.request(Method::DELETE, uri, None, &[]).await
    }

    /// Call a server function through the RPC bridge.
    pub async fn server_fn(&self, name: &str, input: Value) -> TestResponse {
        self.post(&format!("/_serverFn/{}", name), input).await
    }

    /// Log in as the seed user and return the session cookie pair.
    pub async fn login(&self) -> String {
        let res = self
            .post(
                "/api/auth/password/login",
                serde_json::json!({ "email": SEED_EMAIL, "password": SEED_PASSWORD }),
            )
            .await;
        assert_eq!(res.status, StatusCode::OK, "{}", res.text);
        res.cookie_pair()
    }
}
