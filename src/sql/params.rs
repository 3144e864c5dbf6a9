//! Convert serde_json::Value to types that sqlx can bind.

use crate::schema::FieldKind;
use serde_json::Value;
use sqlx::query::Query;
use sqlx::sqlite::{Sqlite, SqliteArguments};

/// A value that can be bound to a SQLite query.
#[derive(Clone, Debug, PartialEq)]
pub enum BindValue {
    Null,
    Bool(bool),
    Int(i64),
    Real(f64),
    Text(String),
}

pub type SqliteQuery<'q> = Query<'q, Sqlite, SqliteArguments<'q>>;

impl BindValue {
    pub fn from_json(v: &Value) -> Self {
        match v {
            Value::Null => BindValue::Null,
            Value::Bool(b) => BindValue::Bool(*b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => BindValue::Int(i),
                None => BindValue::Real(n.as_f64().unwrap_or(0.0)),
            },
            Value::String(s) => BindValue::Text(s.clone()),
            Value::Array(_) | Value::Object(_) => BindValue::Text(v.to_string()),
        }
    }

    /// Storage conversion for a column of the given kind. `None` is the primary key.
    pub fn for_column(kind: Option<FieldKind>, v: &Value) -> Self {
        match (kind, v) {
            (_, Value::Null) => BindValue::Null,
            (Some(FieldKind::Json), _) => BindValue::Text(v.to_string()),
            (Some(FieldKind::Number), Value::Number(n)) => BindValue::Real(n.as_f64().unwrap_or(0.0)),
            _ => BindValue::from_json(v),
        }
    }

    pub fn bind<'q>(&self, query: SqliteQuery<'q>) -> SqliteQuery<'q> {
        match self {
            BindValue::Null => query.bind(Option::<String>::None),
            BindValue::Bool(b) => query.bind(*b),
            BindValue::Int(n) => query.bind(*n),
            BindValue::Real(n) => query.bind(*n),
            BindValue::Text(s) => query.bind(s.clone()),
        }
    }
}

/// Bind all params in order.
pub fn bind_all<'q>(sql: &'q str, params: &[BindValue]) -> SqliteQuery<'q> {
    params.iter().fold(sqlx::query(sql), |q, p| p.bind(q))
}
