mod common;

use axum::http::StatusCode;
use common::TestApp;
use serde_json::json;

#[tokio::test]
async fn crud_through_the_api_catch_all() {
    let app = TestApp::new().await;

    let res = app
        .post("/api/data/entity/posts", json!({ "title": "Hello", "content": "first post" }))
        .await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
    let post = res.json()["data"].clone();
    assert_eq!(post, json!({ "id": 1, "title": "Hello", "content": "first post" }));

    let res = app.get("/api/data/entity/posts/1").await;
    assert_eq!(res.status, StatusCode::OK);
    assert_eq!(res.json()["data"], post);

    let res = app.patch("/api/data/entity/posts/1", json!({ "content": "edited" })).await;
    assert_eq!(res.status, StatusCode::OK, "{}", res.text);
    assert_eq!(res.json()["data"], json!({ "id": 1, "title": "Hello", "content": "edited" }));

    let res = app.delete("/api/data/entity/posts/1").await;
    assert_eq!(res.status, StatusCode::NO_CONTENT);
    assert!(res.text.is_empty());

    let res = app.get("/api/data/entity/posts/1").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    assert_eq!(res.error_code(), "not_found");
    let res = app.delete("/api/data/entity/posts/1").await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
    let res = app.patch("/api/data/entity/posts/1", json!({ "title": "gone" })).await;
    assert_eq!(res.status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn list_meta_paging_sorting_and_filters() {
    let app = TestApp::new().await;
    for (title, done) in [("a", false), ("b", true), ("c", false), ("d", true)] {
        let res = app.post("/api/data/entity/todos", json!({ "title": title, "done": done })).await;
        assert_eq!(res.status, StatusCode::CREATED);
    }

    let res = app.get("/api/data/entity/todos").await;
    let body = res.json();
    assert_eq!(body["meta"], json!({ "total": 4, "count": 4, "limit": 10, "offset": 0, "sort": "id" }));
    assert_eq!(body["data"][0]["title"], "a");

    let body = app.get("/api/data/entity/todos?limit=2&offset=1&sort=-id").await.json();
    let titles: Vec<_> = body["data"].as_array().unwrap().iter().map(|t| t["title"].clone()).collect();
    assert_eq!(titles, [json!("c"), json!("b")]);
    assert_eq!(body["meta"]["total"], 4);
    assert_eq!(body["meta"]["count"], 2);
    assert_eq!(body["meta"]["sort"], "-id");

    let body = app.get("/api/data/entity/todos?done=true&sort=title").await.json();
    assert_eq!(body["meta"]["total"], 2);
    assert_eq!(body["data"][0]["title"], "b");
    assert_eq!(body["data"][1]["title"], "d");

    let res = app.get("/api/data/entity/todos?sort=color").await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    let res = app.get("/api/data/entity/todos?limit=many").await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);

    let body = app.get("/api/data/entity/todos?limit=5000").await.json();
    assert_eq!(body["meta"]["limit"], 1000);
}

#[tokio::test]
async fn invalid_records_are_rejected() {
    let app = TestApp::new().await;
    let cases = [
        json!({ "title": "" }),
        json!({ "title": "x", "done": "perhaps" }),
        json!({ "title": "x", "colour": "red" }),
        json!({ "id": 9, "title": "x" }),
        json!(["not", "an", "object"]),
    ];
    for body in cases {
        let res = app.post("/api/data/entity/todos", body.clone()).await;
        assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY, "{} -> {}", body, res.text);
        assert_eq!(res.error_code(), "validation_error");
    }
    assert_eq!(app.get("/api/data/entity/todos").await.json()["meta"]["total"], 0);

    let res = app.post("/api/data/entity/todos", json!({ "title": "ok", "done": "on" })).await;
    assert_eq!(res.json()["data"]["done"], true);
    let res = app.patch("/api/data/entity/todos/1", json!({ "title": "  " })).await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
}

#[tokio::test]
async fn unknown_routes_and_entities_are_not_found() {
    let app = TestApp::new().await;
    for uri in ["/api/data/entity/comments", "/api/nothing/here", "/api"] {
        let res = app.get(uri).await;
        assert_eq!(res.status, StatusCode::NOT_FOUND, "{}", uri);
        assert_eq!(res.error_code(), "not_found", "{}", uri);
        let error = res.json()["error"].clone();
        assert_eq!(error.as_object().unwrap().len(), 2, "{}", uri);
    }
    let res = app.get("/api/data/entity/todos/abc").await;
    assert_eq!(res.status, StatusCode::BAD_REQUEST);
    assert_eq!(res.error_code(), "bad_request");
}

#[tokio::test]
async fn migration_is_idempotent_across_restarts() {
    let app = TestApp::new().await;
    app.post("/api/data/entity/todos", json!({ "title": "survives" })).await;
    let config = common::test_config(&app.dir);
    app.backend.shutdown().await;

    let backend = todo_start::Backend::init(config).await.unwrap();
    let api = backend.api(Default::default()).unwrap();
    let page = api.data().read_many("todos", &Default::default()).await.unwrap();
    assert_eq!(page.meta.total, 1);
    assert_eq!(page.data[0]["title"], "survives");

    let (version,): (i64,) = sqlx::query_as("SELECT version FROM _sys_schema WHERE id = 1")
        .fetch_one(&backend.state().pool)
        .await
        .unwrap();
    assert_eq!(version, 1);
    backend.shutdown().await;
}

#[tokio::test]
async fn malformed_record_bodies_get_the_error_envelope() {
    let app = TestApp::new().await;
    let res = app.post_raw("/api/data/entity/todos", "{\"title\": ").await;
    assert_eq!(res.status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(res.error_code(), "validation_error");
    assert!(res.json()["error"].get("details").is_none());

    let res = app.post_raw("/api/data/entity/todos", r#"{"title": "no content type"}"#).await;
    assert_eq!(res.status, StatusCode::CREATED, "{}", res.text);
}
