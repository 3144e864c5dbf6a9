//! Todo server functions. Each takes a typed input and returns a typed result; backend errors
//! are returned to the caller unchanged.

use crate::api::{Api, ReadQuery};
use crate::error::AppError;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

pub const TODOS: &str = "todos";
pub const LIST_LIMIT: u32 = 5;
pub const LIST_SORT: &str = "-id";

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Todo {
    pub id: i64,
    pub title: String,
    pub done: bool,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateTodo {
    pub title: String,
}

/// `done` is the state the caller last saw; the stored value becomes its negation.
#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompleteTodo {
    pub id: i64,
    pub done: bool,
    #[serde(default)]
    pub title: Option<String>,
}

#[derive(Clone, Debug, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DeleteTodo {
    pub id: i64,
}

#[derive(Clone, Debug, Default, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListTodos {
    #[serde(default)]
    pub limit: Option<u32>,
    #[serde(default)]
    pub sort: Option<String>,
}

#[derive(Clone, Debug, Serialize)]
pub struct TodoList {
    pub total: u64,
    pub items: Vec<Todo>,
    pub limit: u32,
}

fn decode<T: for<'de> Deserialize<'de>>(value: Value) -> Result<T, AppError> {
    serde_json::from_value(value).map_err(|e| AppError::Transport(format!("unexpected todo shape: {}", e)))
}

pub async fn create_todo(api: &Api, input: CreateTodo) -> Result<(), AppError> {
    let row = api.data().create_one(TODOS, json!({ "title": input.title })).await?;
    tracing::debug!(id = ?row.get("id"), "todo created");
    Ok(())
}

pub async fn complete_todo(api: &Api, input: CompleteTodo) -> Result<(), AppError> {
    api.data()
        .update_one(TODOS, input.id, json!({ "done": !input.done }))
        .await?;
    Ok(())
}

pub async fn delete_todo(api: &Api, input: DeleteTodo) -> Result<(), AppError> {
    api.data().delete_one(TODOS, input.id).await
}

/// Up to `limit` todos (default 5) in `sort` order (default newest first), with the total
/// number of todos regardless of the limit.
pub async fn list_todos(api: &Api, input: ListTodos) -> Result<TodoList, AppError> {
    let query = ReadQuery {
        limit: Some(input.limit.unwrap_or(LIST_LIMIT)),
        sort: Some(input.sort.unwrap_or_else(|| LIST_SORT.to_string())),
        ..Default::default()
    };
    let page = api.data().read_many(TODOS, &query).await?;
    let items = page.data.into_iter().map(decode).collect::<Result<Vec<Todo>, _>>()?;
    Ok(TodoList {
        total: page.meta.total,
        items,
        limit: page.meta.limit,
    })
}

/// Titles from the backend's default page, for the SSR page.
pub async fn todo_titles(api: &Api) -> Result<Vec<String>, AppError> {
    let page = api.data().read_many(TODOS, &ReadQuery::default()).await?;
    page.data
        .into_iter()
        .map(|row| decode::<Todo>(row).map(|t| t.title))
        .collect()
}
