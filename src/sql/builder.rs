//! Builds parameterized INSERT, SELECT, UPDATE, DELETE from a resolved entity.

use crate::error::AppError;
use crate::schema::ResolvedEntity;
use crate::sql::BindValue;
use serde_json::{Map, Value};

pub const MAX_LIMIT: u32 = 1000;

/// Quote identifier for SQLite (safe: only from the schema).
fn quoted(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

pub struct QueryBuf {
    pub sql: String,
    pub params: Vec<BindValue>,
}

impl QueryBuf {
    fn new() -> Self {
        QueryBuf {
            sql: String::new(),
            params: Vec::new(),
        }
    }

    fn push_param(&mut self, v: BindValue) {
        self.params.push(v);
    }
}

/// ORDER BY column and direction, parsed from `field` / `-field`.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Sort {
    pub column: String,
    pub descending: bool,
}

impl Sort {
    pub fn parse(entity: &ResolvedEntity, raw: Option<&str>) -> Result<Self, AppError> {
        let raw = raw.map(str::trim).filter(|s| !s.is_empty());
        let Some(raw) = raw else {
            return Ok(Sort {
                column: entity.pk_column.clone(),
                descending: false,
            });
        };
        let (column, descending) = match raw.strip_prefix('-') {
            Some(rest) => (rest, true),
            None => (raw.strip_prefix('+').unwrap_or(raw), false),
        };
        if !entity.has_column(column) {
            return Err(AppError::Validation(format!(
                "cannot sort {} by unknown field '{}'",
                entity.name, column
            )));
        }
        Ok(Sort {
            column: column.to_string(),
            descending,
        })
    }

    fn order_clause(&self, pk: &str) -> String {
        let dir = if self.descending { "DESC" } else { "ASC" };
        if self.column == pk {
            format!(" ORDER BY {} {}", quoted(pk), dir)
        } else {
            // Tie-break on the primary key so pages are stable.
            format!(" ORDER BY {} {}, {} {}", quoted(&self.column), dir, quoted(pk), dir)
        }
    }
}

impl std::fmt::Display for Sort {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        if self.descending {
            write!(f, "-{}", self.column)
        } else {
            f.write_str(&self.column)
        }
    }
}

fn select_column_list(entity: &ResolvedEntity) -> String {
    entity
        .column_names()
        .into_iter()
        .map(quoted)
        .collect::<Vec<_>>()
        .join(", ")
}

fn column_kind(entity: &ResolvedEntity, col: &str) -> Option<crate::schema::FieldKind> {
    entity.field(col).map(|f| f.kind())
}

/// WHERE clause for exact-match filters; unknown columns are skipped.
fn where_clause(q: &mut QueryBuf, entity: &ResolvedEntity, filters: &[(String, Value)]) -> String {
    let mut parts = Vec::new();
    for (col, val) in filters {
        if !entity.has_column(col) {
            continue;
        }
        if val.is_null() {
            parts.push(format!("{} IS NULL", quoted(col)));
            continue;
        }
        q.push_param(BindValue::for_column(column_kind(entity, col), val));
        parts.push(format!("{} = ?", quoted(col)));
    }
    if parts.is_empty() {
        String::new()
    } else {
        format!(" WHERE {}", parts.join(" AND "))
    }
}

/// SELECT by primary key.
pub fn select_by_id(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(BindValue::Int(id));
    q.sql = format!(
        "SELECT {} FROM {} WHERE {} = ?",
        select_column_list(entity),
        quoted(&entity.table_name),
        quoted(&entity.pk_column)
    );
    q
}

/// SELECT list with exact-match filters, ORDER BY sort, LIMIT/OFFSET.
pub fn select_list(
    entity: &ResolvedEntity,
    filters: &[(String, Value)],
    sort: &Sort,
    limit: u32,
    offset: u32,
) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, filters);
    q.sql = format!(
        "SELECT {} FROM {}{}{} LIMIT {} OFFSET {}",
        select_column_list(entity),
        quoted(&entity.table_name),
        where_sql,
        sort.order_clause(&entity.pk_column),
        limit.min(MAX_LIMIT),
        offset
    );
    q
}

/// COUNT(*) with the same filters as [`select_list`].
pub fn count(entity: &ResolvedEntity, filters: &[(String, Value)]) -> QueryBuf {
    let mut q = QueryBuf::new();
    let where_sql = where_clause(&mut q, entity, filters);
    q.sql = format!("SELECT COUNT(*) FROM {}{}", quoted(&entity.table_name), where_sql);
    q
}

/// INSERT the given (already validated) field values. An empty body inserts a row of defaults.
pub fn insert(entity: &ResolvedEntity, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&entity.table_name);
    let mut cols = Vec::new();
    for f in &entity.fields {
        let Some(val) = body.get(&f.name) else { continue };
        q.push_param(BindValue::for_column(Some(f.kind()), val));
        cols.push(quoted(&f.name));
    }
    let returning = select_column_list(entity);
    q.sql = if cols.is_empty() {
        format!("INSERT INTO {} DEFAULT VALUES RETURNING {}", table, returning)
    } else {
        let placeholders = vec!["?"; cols.len()].join(", ");
        format!(
            "INSERT INTO {} ({}) VALUES ({}) RETURNING {}",
            table,
            cols.join(", "),
            placeholders,
            returning
        )
    };
    q
}

/// UPDATE by id: SET only fields present in body. Falls back to a plain SELECT when nothing is set.
pub fn update(entity: &ResolvedEntity, id: i64, body: &Map<String, Value>) -> QueryBuf {
    let mut q = QueryBuf::new();
    let table = quoted(&entity.table_name);
    let pk = quoted(&entity.pk_column);
    let mut sets = Vec::new();
    for f in &entity.fields {
        let Some(val) = body.get(&f.name) else { continue };
        q.push_param(BindValue::for_column(Some(f.kind()), val));
        sets.push(format!("{} = ?", quoted(&f.name)));
    }
    if sets.is_empty() {
        return select_by_id(entity, id);
    }
    q.push_param(BindValue::Int(id));
    q.sql = format!(
        "UPDATE {} SET {} WHERE {} = ? RETURNING {}",
        table,
        sets.join(", "),
        pk,
        select_column_list(entity)
    );
    q
}

/// DELETE by id, returning the removed row.
pub fn delete(entity: &ResolvedEntity, id: i64) -> QueryBuf {
    let mut q = QueryBuf::new();
    q.push_param(BindValue::Int(id));
    q.sql = format!(
        "DELETE FROM {} WHERE {} = ? RETURNING {}",
        quoted(&entity.table_name),
        quoted(&entity.pk_column),
        select_column_list(entity)
    );
    q
}
