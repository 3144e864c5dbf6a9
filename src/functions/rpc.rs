//! RPC bridge: `POST /_serverFn/{name}` with a JSON body. Success is `{"result": ...}`; failure
//! is the usual error envelope with the error's status.

use crate::backend::{ApiOptions, Backend};
use crate::error::AppError;
use crate::extractors::json as json_body;
use crate::functions::todos::{
    complete_todo, create_todo, delete_todo, list_todos, CompleteTodo, CreateTodo, DeleteTodo, ListTodos,
};
use axum::{
    body::Bytes,
    extract::{Path, State},
    http::HeaderMap,
    Json,
};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::{json, Value};
use std::sync::Arc;

#[derive(Deserialize)]
#[serde(deny_unknown_fields)]
struct GetUser {}

fn input<T: DeserializeOwned>(name: &str, value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Validation(format!("{}: {}", name, e)))
}

/// Run the named server function with a JSON input.
pub async fn dispatch(backend: &Backend, name: &str, headers: &HeaderMap, body: Value) -> Result<Value, AppError> {
    let options = ApiOptions {
        verify_session: false,
        headers: headers.clone(),
    };
    match name {
        "createTodo" => {
            create_todo(&backend.api(options)?, input::<CreateTodo>(name, body)?).await?;
            Ok(Value::Null)
        }
        "completeTodo" => {
            complete_todo(&backend.api(options)?, input::<CompleteTodo>(name, body)?).await?;
            Ok(Value::Null)
        }
        "deleteTodo" => {
            delete_todo(&backend.api(options)?, input::<DeleteTodo>(name, body)?).await?;
            Ok(Value::Null)
        }
        "listTodos" => {
            let list = list_todos(&backend.api(options)?, input::<ListTodos>(name, body)?).await?;
            serde_json::to_value(list).map_err(|e| AppError::Internal(e.to_string()))
        }
        "getUser" => {
            input::<GetUser>(name, body)?;
            let api = backend.api(ApiOptions {
                verify_session: true,
                ..options
            })?;
            Ok(json!({ "user": api.user() }))
        }
        _ => Err(AppError::NotFound(format!("server function {}", name))),
    }
}

pub async fn call(
    State(backend): State<Arc<Backend>>,
    Path(name): Path<String>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<Json<Value>, AppError> {
    let body: Value = if body.iter().all(u8::is_ascii_whitespace) {
        json!({})
    } else {
        json_body::parse(&body)?
    };
    let result = dispatch(&backend, &name, &headers, body).await.map_err(|e| {
        tracing::warn!(function = %name, error = %e, "server function failed");
        e
    })?;
    Ok(Json(json!({ "result": result })))
}
