//! Standard response envelope helpers.

use axum::{http::StatusCode, Json};
use serde::{Deserialize, Serialize};

#[derive(Serialize, Deserialize)]
pub struct SuccessOne<T> {
    pub data: T,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub meta: Option<serde_json::Value>,
}

#[derive(Serialize, Deserialize)]
pub struct SuccessMany<T> {
    pub data: Vec<T>,
    pub meta: ListMeta,
}

/// Paging metadata for list responses. `total` ignores limit/offset.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ListMeta {
    pub total: u64,
    pub count: u64,
    pub limit: u32,
    pub offset: u32,
    pub sort: String,
}

pub fn success_one<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::CREATED, Json(SuccessOne { data, meta: None }))
}

pub fn success_one_ok<T: Serialize>(data: T) -> (StatusCode, Json<SuccessOne<T>>) {
    (StatusCode::OK, Json(SuccessOne { data, meta: None }))
}

pub fn success_many<T: Serialize>(data: Vec<T>, meta: ListMeta) -> (StatusCode, Json<SuccessMany<T>>) {
    (StatusCode::OK, Json(SuccessMany { data, meta }))
}
