//! Generic CRUD execution against SQLite.

use crate::error::AppError;
use crate::schema::{FieldKind, ResolvedEntity};
use crate::sql::{bind_all, count, delete, insert, select_by_id, select_list, update, QueryBuf, Sort};
use serde_json::{Map, Value};
use sqlx::sqlite::SqliteRow;
use sqlx::{Row, SqlitePool};

pub const DEFAULT_LIMIT: u32 = 10;

/// One page of rows plus the total number of matching rows.
#[derive(Clone, Debug)]
pub struct Page {
    pub rows: Vec<Value>,
    pub total: u64,
    pub limit: u32,
    pub offset: u32,
    pub sort: Sort,
}

/// List parameters after parsing; `filters` are exact-match on known columns.
#[derive(Clone, Debug, Default)]
pub struct ListParams {
    pub filters: Vec<(String, Value)>,
    pub limit: Option<u32>,
    pub offset: Option<u32>,
    pub sort: Option<String>,
}

pub struct CrudService;

impl CrudService {
    /// List rows (limit default 10, max 1000; offset default 0) with the total count across all matching rows.
    pub async fn list(pool: &SqlitePool, entity: &ResolvedEntity, params: &ListParams) -> Result<Page, AppError> {
        let limit = params.limit.unwrap_or(DEFAULT_LIMIT).min(crate::sql::MAX_LIMIT);
        let offset = params.offset.unwrap_or(0);
        let sort = Sort::parse(entity, params.sort.as_deref())?;

        let q = count(entity, &params.filters);
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let total: i64 = bind_all(&q.sql, &q.params).fetch_one(pool).await?.try_get(0)?;

        let q = select_list(entity, &params.filters, &sort, limit, offset);
        let rows = Self::query_many(pool, entity, &q).await?;
        Ok(Page {
            rows,
            total: total.max(0) as u64,
            limit,
            offset,
            sort,
        })
    }

    /// Fetch one row by primary key.
    pub async fn read(pool: &SqlitePool, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        Self::query_optional(pool, entity, &select_by_id(entity, id)).await
    }

    /// Insert one row from validated values. Returns the created row.
    pub async fn create(
        pool: &SqlitePool,
        entity: &ResolvedEntity,
        values: &Map<String, Value>,
    ) -> Result<Value, AppError> {
        let q = insert(entity, values);
        Self::query_optional(pool, entity, &q)
            .await?
            .ok_or_else(|| AppError::Db(sqlx::Error::RowNotFound))
    }

    /// Merge validated values into the row. `None` when the id does not exist.
    pub async fn update(
        pool: &SqlitePool,
        entity: &ResolvedEntity,
        id: i64,
        values: &Map<String, Value>,
    ) -> Result<Option<Value>, AppError> {
        Self::query_optional(pool, entity, &update(entity, id, values)).await
    }

    /// Delete one row by id. Returns the deleted row or None.
    pub async fn delete(pool: &SqlitePool, entity: &ResolvedEntity, id: i64) -> Result<Option<Value>, AppError> {
        Self::query_optional(pool, entity, &delete(entity, id)).await
    }

    async fn query_optional(
        pool: &SqlitePool,
        entity: &ResolvedEntity,
        q: &QueryBuf,
    ) -> Result<Option<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let row = bind_all(&q.sql, &q.params).fetch_optional(pool).await?;
        Ok(row.map(|r| row_to_json(entity, &r)))
    }

    async fn query_many(pool: &SqlitePool, entity: &ResolvedEntity, q: &QueryBuf) -> Result<Vec<Value>, AppError> {
        tracing::debug!(sql = %q.sql, params = ?q.params, "query");
        let rows = bind_all(&q.sql, &q.params).fetch_all(pool).await?;
        Ok(rows.iter().map(|r| row_to_json(entity, r)).collect())
    }
}

fn row_to_json(entity: &ResolvedEntity, row: &SqliteRow) -> Value {
    let mut map = Map::new();
    map.insert(entity.pk_column.clone(), cell_to_value(row, &entity.pk_column, None));
    for f in &entity.fields {
        map.insert(f.name.clone(), cell_to_value(row, &f.name, Some(f.kind())));
    }
    Value::Object(map)
}

/// Decode by declared kind; SQLite is loosely typed so fall back through the storage classes.
fn cell_to_value(row: &SqliteRow, name: &str, kind: Option<FieldKind>) -> Value {
    match kind {
        None => {
            if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
                return Value::Number(n.into());
            }
        }
        Some(FieldKind::Boolean) => {
            if let Ok(Some(b)) = row.try_get::<Option<bool>, _>(name) {
                return Value::Bool(b);
            }
        }
        Some(FieldKind::Number) => {
            if let Ok(Some(n)) = row.try_get::<Option<f64>, _>(name) {
                if n.fract() == 0.0 && n.abs() < 9.0e15 {
                    return Value::Number((n as i64).into());
                }
                if let Some(n) = serde_json::Number::from_f64(n) {
                    return Value::Number(n);
                }
            }
            if let Ok(Some(n)) = row.try_get::<Option<i64>, _>(name) {
                return Value::Number(n.into());
            }
        }
        Some(FieldKind::Json) => {
            if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
                return serde_json::from_str(&s).unwrap_or(Value::String(s));
            }
        }
        Some(FieldKind::Text) | Some(FieldKind::Date) => {}
    }
    if let Ok(Some(s)) = row.try_get::<Option<String>, _>(name) {
        return Value::String(s);
    }
    Value::Null
}
