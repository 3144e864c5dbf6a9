//! Resolve a schema definition into the runtime model, and load the stored schema document from `_sys_schema`.

use crate::error::{AppError, ConfigError};
use crate::schema::resolved::{ResolvedEntity, ResolvedField, ResolvedModel};
use crate::schema::{validate, SchemaDefinition, PRIMARY_FIELD};
use regex::Regex;
use serde_json::Value;
use sqlx::SqlitePool;
use std::collections::HashMap;

/// Build resolved model from the schema definition (validates first).
pub fn resolve(schema: &SchemaDefinition) -> Result<ResolvedModel, ConfigError> {
    validate(schema)?;

    let mut entities = Vec::new();
    let mut entity_by_name = HashMap::new();

    for (name, definition) in &schema.entities {
        let mut fields = Vec::with_capacity(definition.fields.len());
        for (field_name, field) in &definition.fields {
            let pattern = match &field.pattern {
                Some(p) => Some(Regex::new(p).map_err(|e| ConfigError::InvalidField {
                    entity: name.clone(),
                    field: field_name.clone(),
                    reason: e.to_string(),
                })?),
                None => None,
            };
            fields.push(ResolvedField {
                name: field_name.clone(),
                field: field.clone(),
                pattern,
            });
        }

        let entity = ResolvedEntity {
            name: name.clone(),
            table_name: name.clone(),
            pk_column: PRIMARY_FIELD.to_string(),
            fields,
        };
        entity_by_name.insert(name.clone(), entity.clone());
        entities.push(entity);
    }

    Ok(ResolvedModel {
        entities,
        entity_by_name,
    })
}

/// Schema document as last applied to the database.
#[derive(Clone, Debug)]
pub struct StoredSchema {
    pub version: i64,
    pub document: Value,
}

/// Load the current schema document. `None` on a fresh database. `_sys_schema` must exist (ensure_sys_tables).
/// Database failures keep their `sqlx` error so pool outages surface as transport errors.
pub async fn load_from_pool(pool: &SqlitePool) -> Result<Option<StoredSchema>, AppError> {
    let sql = "SELECT version, document FROM _sys_schema WHERE id = 1";
    tracing::debug!(sql = %sql, "query");
    let row: Option<(i64, String)> = sqlx::query_as(sql).fetch_optional(pool).await?;

    match row {
        None => Ok(None),
        Some((version, text)) => {
            let document = serde_json::from_str(&text).map_err(|e| ConfigError::Load(e.to_string()))?;
            Ok(Some(StoredSchema { version, document }))
        }
    }
}
