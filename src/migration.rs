//! Apply the schema document to the database: CREATE TABLE for new entities, ADD COLUMN for new fields.
//! Skipped entirely when the stored document already matches; never drops tables or columns.

use crate::error::AppError;
use crate::schema::{load_from_pool, validate, EntityDefinition, SchemaDefinition, PRIMARY_FIELD};
use crate::store::replace_schema_document;
use sqlx::{SqliteConnection, SqlitePool};
use std::collections::HashSet;

fn quote(s: &str) -> String {
    format!("\"{}\"", s.replace('"', "\"\""))
}

/// Outcome of [`apply_migrations`].
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct MigrationReport {
    pub version: i64,
    pub changed: bool,
    pub created_tables: Vec<String>,
    pub added_columns: Vec<String>,
}

/// Validates the schema, compares it with the stored document and applies the difference in one transaction.
pub async fn apply_migrations(pool: &SqlitePool, schema: &SchemaDefinition) -> Result<MigrationReport, AppError> {
    validate(schema)?;
    let document = schema.to_document();
    let current = load_from_pool(pool).await?;

    if let Some(stored) = &current {
        if stored.document == document {
            tracing::debug!(version = stored.version, "schema unchanged, skipping migration");
            return Ok(MigrationReport {
                version: stored.version,
                changed: false,
                created_tables: Vec::new(),
                added_columns: Vec::new(),
            });
        }
    }

    let mut report = MigrationReport {
        version: 0,
        changed: true,
        created_tables: Vec::new(),
        added_columns: Vec::new(),
    };

    let mut tx = pool.begin().await?;
    for entity in schema.entities.values() {
        migrate_entity(&mut tx, entity, &mut report).await?;
    }
    report.version = replace_schema_document(&mut tx, current.as_ref(), &document).await?;
    tx.commit().await?;

    tracing::info!(
        version = report.version,
        created = ?report.created_tables,
        added = ?report.added_columns,
        "schema migrated"
    );
    Ok(report)
}

async fn migrate_entity(
    tx: &mut SqliteConnection,
    entity: &EntityDefinition,
    report: &mut MigrationReport,
) -> Result<(), AppError> {
    let table = quote(&entity.name);
    let existing = existing_columns(tx, &entity.name).await?;

    if existing.is_empty() {
        let mut col_defs = vec![format!("{} INTEGER PRIMARY KEY AUTOINCREMENT", quote(PRIMARY_FIELD))];
        for (name, field) in &entity.fields {
            col_defs.push(column_def(name, field));
        }
        let sql = format!("CREATE TABLE IF NOT EXISTS {} (\n  {}\n)", table, col_defs.join(",\n  "));
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(&mut *tx).await?;
        report.created_tables.push(entity.name.clone());
        return Ok(());
    }

    for (name, field) in &entity.fields {
        if existing.contains(name) {
            continue;
        }
        let sql = format!("ALTER TABLE {} ADD COLUMN {}", table, column_def(name, field));
        tracing::debug!(sql = %sql, "ddl");
        sqlx::query(&sql).execute(&mut *tx).await?;
        report.added_columns.push(format!("{}.{}", entity.name, name));
    }

    for column in &existing {
        if column != PRIMARY_FIELD && !entity.fields.contains_key(column) {
            tracing::warn!(table = %entity.name, column = %column, "column no longer in schema; left in place");
        }
    }
    Ok(())
}

/// Columns are nullable at the storage level; required/default rules are enforced by the request validator.
/// Defaults are still written to DDL so rows inserted outside the API agree with it.
fn column_def(name: &str, field: &crate::schema::Field) -> String {
    let mut def = format!("{} {}", quote(name), field.kind.sql_type());
    if let Some(default) = field.default.as_ref().and_then(|d| field.coerce(d).ok()) {
        let literal = match default {
            serde_json::Value::Bool(b) => (if b { "1" } else { "0" }).to_string(),
            serde_json::Value::Number(n) => n.to_string(),
            serde_json::Value::String(s) => format!("'{}'", s.replace('\'', "''")),
            serde_json::Value::Null => "NULL".to_string(),
            other => format!("'{}'", other.to_string().replace('\'', "''")),
        };
        def.push_str(" DEFAULT ");
        def.push_str(&literal);
    }
    def
}

async fn existing_columns(tx: &mut SqliteConnection, table: &str) -> Result<HashSet<String>, AppError> {
    let rows: Vec<(String,)> = sqlx::query_as("SELECT name FROM pragma_table_info(?)")
        .bind(table)
        .fetch_all(&mut *tx)
        .await?;
    Ok(rows.into_iter().map(|(name,)| name).collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::Field;

    #[test]
    fn column_defs_carry_defaults() {
        assert_eq!(
            column_def("done", &Field::boolean().default_value(false)),
            "\"done\" BOOLEAN DEFAULT 0"
        );
        assert_eq!(column_def("title", &Field::text().required()), "\"title\" TEXT");
        assert_eq!(
            column_def("label", &Field::text().default_value("it's")),
            "\"label\" TEXT DEFAULT 'it''s'"
        );
    }
}
