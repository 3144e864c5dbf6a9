//! Declarative entity definitions and the schema document they serialize to.

use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::BTreeMap;

/// Implicit primary key present on every entity.
pub const PRIMARY_FIELD: &str = "id";

#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Text,
    Boolean,
    Number,
    Date,
    Json,
}

impl FieldKind {
    /// SQLite column type used in DDL.
    pub fn sql_type(self) -> &'static str {
        match self {
            FieldKind::Text | FieldKind::Date | FieldKind::Json => "TEXT",
            FieldKind::Boolean => "BOOLEAN",
            FieldKind::Number => "REAL",
        }
    }
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Field {
    #[serde(rename = "type")]
    pub kind: FieldKind,
    #[serde(default, skip_serializing_if = "is_false")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max_length: Option<u32>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub pattern: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub minimum: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub maximum: Option<f64>,
}

fn is_false(b: &bool) -> bool {
    !*b
}

impl Field {
    fn of(kind: FieldKind) -> Self {
        Field {
            kind,
            required: false,
            default: None,
            min_length: None,
            max_length: None,
            pattern: None,
            minimum: None,
            maximum: None,
        }
    }

    pub fn text() -> Self {
        Self::of(FieldKind::Text)
    }

    pub fn boolean() -> Self {
        Self::of(FieldKind::Boolean)
    }

    pub fn number() -> Self {
        Self::of(FieldKind::Number)
    }

    pub fn date() -> Self {
        Self::of(FieldKind::Date)
    }

    pub fn json() -> Self {
        Self::of(FieldKind::Json)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn default_value(mut self, value: impl Into<Value>) -> Self {
        self.default = Some(value.into());
        self
    }

    pub fn min_length(mut self, n: u32) -> Self {
        self.min_length = Some(n);
        self
    }

    pub fn max_length(mut self, n: u32) -> Self {
        self.max_length = Some(n);
        self
    }

    pub fn pattern(mut self, pattern: impl Into<String>) -> Self {
        self.pattern = Some(pattern.into());
        self
    }

    pub fn minimum(mut self, n: f64) -> Self {
        self.minimum = Some(n);
        self
    }

    pub fn maximum(mut self, n: f64) -> Self {
        self.maximum = Some(n);
        self
    }

    /// Convert an input value to the stored representation for this field's kind.
    /// Null passes through; range and length rules are checked by the request validator.
    pub fn coerce(&self, value: &Value) -> Result<Value, String> {
        if value.is_null() {
            return Ok(Value::Null);
        }
        match self.kind {
            FieldKind::Text => match value {
                Value::String(_) => Ok(value.clone()),
                Value::Number(n) => Ok(Value::String(n.to_string())),
                _ => Err("must be a string".into()),
            },
            FieldKind::Boolean => coerce_bool(value)
                .map(Value::Bool)
                .ok_or_else(|| "must be a boolean (true/false, 1/0, on/off)".to_string()),
            FieldKind::Number => match value {
                Value::Number(_) => Ok(value.clone()),
                Value::String(s) => s
                    .trim()
                    .parse::<f64>()
                    .ok()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .ok_or_else(|| "must be a number".to_string()),
                _ => Err("must be a number".into()),
            },
            FieldKind::Date => {
                let s = value.as_str().ok_or_else(|| "must be an RFC 3339 date string".to_string())?;
                parse_date(s)
                    .map(Value::String)
                    .ok_or_else(|| "must be an RFC 3339 date string".to_string())
            }
            FieldKind::Json => Ok(value.clone()),
        }
    }
}

/// The fixed set of accepted boolean representations.
pub fn coerce_bool(value: &Value) -> Option<bool> {
    match value {
        Value::Bool(b) => Some(*b),
        Value::Number(n) => match n.as_i64() {
            Some(1) => Some(true),
            Some(0) => Some(false),
            _ => None,
        },
        Value::String(s) => match s.trim().to_ascii_lowercase().as_str() {
            "true" | "1" | "on" => Some(true),
            "false" | "0" | "off" => Some(false),
            _ => None,
        },
        _ => None,
    }
}

fn parse_date(s: &str) -> Option<String> {
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(s.trim()) {
        return Some(dt.with_timezone(&chrono::Utc).to_rfc3339());
    }
    chrono::NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .ok()
        .and_then(|d| d.and_hms_opt(0, 0, 0))
        .map(|dt| dt.and_utc().to_rfc3339())
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct EntityDefinition {
    /// Key in [`SchemaDefinition::entities`]; not repeated in the document.
    #[serde(skip)]
    pub name: String,
    pub fields: BTreeMap<String, Field>,
}

impl EntityDefinition {
    pub fn new(name: impl Into<String>) -> Self {
        EntityDefinition {
            name: name.into(),
            fields: BTreeMap::new(),
        }
    }

    pub fn field(mut self, name: impl Into<String>, field: Field) -> Self {
        self.fields.insert(name.into(), field);
        self
    }
}

/// All entities known to the backend. Ordered maps keep the document stable.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct SchemaDefinition {
    pub entities: BTreeMap<String, EntityDefinition>,
}

impl SchemaDefinition {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn entity(mut self, entity: EntityDefinition) -> Self {
        self.entities.insert(entity.name.clone(), entity);
        self
    }

    /// Serialized form compared against the stored document at startup.
    pub fn to_document(&self) -> Value {
        serde_json::to_value(self).unwrap_or(Value::Null)
    }

    pub fn from_document(doc: &Value) -> Result<Self, serde_json::Error> {
        let mut schema: SchemaDefinition = serde_json::from_value(doc.clone())?;
        for (name, entity) in schema.entities.iter_mut() {
            entity.name = name.clone();
        }
        Ok(schema)
    }
}

/// Entities used by the todo application.
pub fn app_schema() -> SchemaDefinition {
    SchemaDefinition::new()
        .entity(
            EntityDefinition::new("todos")
                .field("title", Field::text().required())
                .field("done", Field::boolean().default_value(false)),
        )
        .entity(
            EntityDefinition::new("posts")
                .field("title", Field::text().required())
                .field("content", Field::text()),
        )
}
