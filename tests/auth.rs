mod common;

use axum::http::{header, Method, StatusCode};
use common::{TestApp, SEED_EMAIL, SEED_PASSWORD};
use serde_json::json;

#[tokio::test]
async fn register_login_me_logout() {
    let app = TestApp::new().await;

    let res = app
        .post("/api/auth/password/register", json!({ "email": "new@example.com", "password": "long enough" }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    let body = res.json();
    assert_eq!(body["user"]["email"], "new@example.com");
    assert!(body["token"].as_str().unwrap().len() > 20);
    let set_cookie = res.headers[header::SET_COOKIE].to_str().unwrap();
    assert!(set_cookie.contains("HttpOnly"));
    assert!(set_cookie.contains("SameSite=Lax"));

    let token = body["token"].as_str().unwrap().to_string();
    let bearer = format!("Bearer {}", token);
    let res = app
        .request(Method::GET, "/api/auth/me", None, &[(header::AUTHORIZATION, bearer.as_str())])
        .await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["user"]["email"], "new@example.com");
    assert_eq!(res.json()["user"]["verified"], true);

    let res = app
        .request(Method::GET, "/api/auth/logout?redirect=/login", None, &[])
        .await;
    assert_eq!(res.status, StatusCode::FOUND);
    assert_eq!(res.headers[header::LOCATION], "/login");
    assert!(res.headers[header::SET_COOKIE].to_str().unwrap().contains("Max-Age=0"));

    let res = app.request(Method::POST, "/api/auth/logout", Some(json!({})), &[]).await;
    assert_eq!(res.json(), json!({ "ok": true }));
}

#[tokio::test]
async fn bad_credentials_and_duplicates() {
    let app = TestApp::new().await;

    let res = app
        .post("/api/auth/password/login", json!({ "email": SEED_EMAIL, "password": "wrong-password" }))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.error_code(), "authentication_error");
    let res = app
        .post("/api/auth/password/login", json!({ "email": "nobody@example.com", "password": SEED_PASSWORD }))
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
    assert_eq!(res.json()["error"]["message"], "invalid credentials");

    let res = app
        .post("/api/auth/password/register", json!({ "email": SEED_EMAIL, "password": "another-password" }))
        .await;
    assert_eq!(res.status, StatusCode::CONFLICT);

    let res = app
        .post("/api/auth/password/register", json!({ "email": "short@example.com", "password": "1234" }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app
        .post("/api/auth/password/register", json!({ "email": "not-an-email", "password": "12345678" }))
        .await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn me_rejects_missing_and_forged_sessions() {
    let app = TestApp::new().await;
    let res = app.get("/api/auth/me").await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);

    for value in ["Bearer not.a.token", "Basic dXNlcjpwYXNz"] {
        let res = app
            .request(Method::GET, "/api/auth/me", None, &[(header::AUTHORIZATION, value)])
            .await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", value);
    }
    let res = app
        .request(Method::GET, "/api/auth/me", None, &[(header::COOKIE, "auth=forged")])
        .await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn protected_admin_actions_require_a_session() {
    let app = TestApp::new().await;

    for uri in ["/api/system/schema", "/api/system/config"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::UNAUTHORIZED, "{}", uri);
        assert_eq!(res.error_code(), "authentication_error");
    }

    let cookie = app.login().await;
    let res = app
        .request(Method::GET, "/api/system/schema", None, &[(header::COOKIE, cookie.as_str())])
        .await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    let data = &res.json()["data"];
    assert_eq!(data["version"], 1);
    assert!(data["document"]["entities"]["todos"].is_object());

    let res = app
        .request(Method::GET, "/api/system/config", None, &[(header::COOKIE, cookie.as_str())])
        .await;
    let data = &res.json()["data"];
    assert_eq!(data["entities"], json!(["posts", "todos"]));
    assert_eq!(data["admin"]["basepath"], "/admin");
    assert_eq!(data["auth"]["cookie_name"], "auth");
    assert!(!res.text.contains("test-secret"));
}

#[tokio::test]
async fn schema_reads_report_a_closed_pool_as_transport_errors() {
    let app = TestApp::new().await;
    let cookie = app.login().await;
    app.backend.shutdown().await;
    let res = app
        .request(Method::GET, "/api/system/schema", None, &[(header::COOKIE, cookie.as_str())])
        .await;
    assert_eq!(res.status, StatusCode::SERVICE_UNAVAILABLE, "{}", res.text);
    assert_eq!(res.error_code(), "transport_error");
}

#[tokio::test]
async fn disabled_auth_opens_protected_routes_and_unmounts_auth() {
    let app = TestApp::with_config(|c| c.auth.enabled = false).await;
    assert_eq!(app.get("/api/system/config").await.status, StatusCode::OK);
    assert_eq!(app.get("/api/auth/me").await.status, StatusCode::NOT_FOUND);
    let res = app.server_fn("getUser", json!({})).await;
    assert_eq!(res.status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn registration_can_be_turned_off() {
    let app = TestApp::with_config(|c| c.auth.allow_register = false).await;
    let res = app
        .post("/api/auth/password/register", json!({ "email": "x@example.com", "password": "12345678" }))
        .await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn malformed_credential_bodies_get_the_error_envelope() {
    let app = TestApp::new().await;
    for uri in ["/api/auth/password/login", "/api/auth/password/register"] {
        let res = app.post_raw(uri, "not json").await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{}", uri);
        assert_eq!(res.error_code(), "validation_error");
    }

    let body = json!({ "email": SEED_EMAIL, "password": SEED_PASSWORD }).to_string();
    let res = app.post_raw("/api/auth/password/login", &body).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
}
