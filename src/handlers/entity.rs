//! Entity CRUD handlers: list, create, read, update, delete.

use crate::error::AppError;
use crate::extractors::json::JsonBody;
use crate::response::{success_many, success_one, success_one_ok, ListMeta};
use crate::schema::{FieldKind, ResolvedEntity};
use crate::service::{CrudService, ListParams, RequestValidator};
use crate::state::AppState;
use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
};
use serde_json::Value;
use std::collections::HashMap;

fn entity<'a>(state: &'a AppState, name: &str) -> Result<&'a ResolvedEntity, AppError> {
    state
        .model
        .entity(name)
        .ok_or_else(|| AppError::NotFound(format!("entity {}", name)))
}

fn parse_id(id_str: &str) -> Result<i64, AppError> {
    id_str
        .parse()
        .map_err(|_| AppError::BadRequest(format!("invalid id '{}'", id_str)))
}

fn parse_number<T: std::str::FromStr>(key: &str, raw: &str) -> Result<T, AppError> {
    raw.trim()
        .parse()
        .map_err(|_| AppError::Validation(format!("{} must be a non-negative integer", key)))
}

/// Query string value for an exact-match filter, typed by the column's kind.
fn query_value_for_column(entity: &ResolvedEntity, col: &str, s: &str) -> Result<Value, AppError> {
    let Some(field) = entity.field(col) else {
        return Ok(s.parse::<i64>().map(Value::from).unwrap_or_else(|_| Value::String(s.to_string())));
    };
    match field.kind() {
        FieldKind::Json => Ok(serde_json::from_str(s).unwrap_or_else(|_| Value::String(s.to_string()))),
        _ => field
            .field
            .coerce(&Value::String(s.to_string()))
            .map_err(|reason| AppError::Validation(format!("filter {} {}", col, reason))),
    }
}

fn list_params(entity: &ResolvedEntity, query: HashMap<String, String>) -> Result<ListParams, AppError> {
    let mut params = ListParams::default();
    for (k, v) in query {
        match k.as_str() {
            "limit" => params.limit = Some(parse_number("limit", &v)?),
            "offset" => params.offset = Some(parse_number("offset", &v)?),
            "sort" => params.sort = Some(v),
            _ => {
                if entity.has_column(&k) {
                    let val = query_value_for_column(entity, &k, &v)?;
                    params.filters.push((k, val));
                }
            }
        }
    }
    // HashMap order is arbitrary; keep the generated SQL stable.
    params.filters.sort_by(|a, b| a.0.cmp(&b.0));
    Ok(params)
}

pub async fn list(
    State(state): State<AppState>,
    Path(name): Path<String>,
    Query(query): Query<HashMap<String, String>>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &name)?;
    let params = list_params(entity, query)?;
    let page = CrudService::list(&state.pool, entity, &params).await?;
    let meta = ListMeta {
        total: page.total,
        count: page.rows.len() as u64,
        limit: page.limit,
        offset: page.offset,
        sort: page.sort.to_string(),
    };
    Ok(success_many(page.rows, meta))
}

pub async fn create(
    State(state): State<AppState>,
    Path(name): Path<String>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &name)?;
    let values = RequestValidator::validate_create(entity, body)?;
    let row = CrudService::create(&state.pool, entity, &values).await?;
    tracing::debug!(entity = %entity.name, "record created");
    Ok(success_one(row))
}

pub async fn read(
    State(state): State<AppState>,
    Path((name, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &name)?;
    let id = parse_id(&id_str)?;
    let row = CrudService::read(&state.pool, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.name, id)))?;
    Ok(success_one_ok(row))
}

pub async fn update(
    State(state): State<AppState>,
    Path((name, id_str)): Path<(String, String)>,
    JsonBody(body): JsonBody<Value>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &name)?;
    let id = parse_id(&id_str)?;
    let values = RequestValidator::validate_update(entity, body)?;
    let row = CrudService::update(&state.pool, entity, id, &values)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.name, id)))?;
    Ok(success_one_ok(row))
}

pub async fn delete(
    State(state): State<AppState>,
    Path((name, id_str)): Path<(String, String)>,
) -> Result<impl IntoResponse, AppError> {
    let entity = entity(&state, &name)?;
    let id = parse_id(&id_str)?;
    CrudService::delete(&state.pool, entity, id)
        .await?
        .ok_or_else(|| AppError::NotFound(format!("{} {}", entity.name, id)))?;
    Ok(StatusCode::NO_CONTENT)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{app_schema, resolve};
    use serde_json::json;

    fn todos() -> ResolvedEntity {
        resolve(&app_schema()).unwrap().entity("todos").unwrap().clone()
    }

    fn query(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
    }

    #[test]
    fn filters_are_typed_by_column() {
        let params = list_params(&todos(), query(&[("done", "true"), ("id", "4"), ("title", "x"), ("color", "red")])).unwrap();
        assert_eq!(
            params.filters,
            vec![
                ("done".to_string(), json!(true)),
                ("id".to_string(), json!(4)),
                ("title".to_string(), json!("x")),
            ]
        );
    }

    #[test]
    fn paging_parameters_are_validated() {
        let params = list_params(&todos(), query(&[("limit", "5"), ("offset", "10"), ("sort", "-id")])).unwrap();
        assert_eq!((params.limit, params.offset, params.sort.as_deref()), (Some(5), Some(10), Some("-id")));
        assert!(matches!(list_params(&todos(), query(&[("limit", "-1")])), Err(AppError::Validation(_))));
        assert!(matches!(list_params(&todos(), query(&[("done", "maybe")])), Err(AppError::Validation(_))));
    }
}
