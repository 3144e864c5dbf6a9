//! Resolved entity model: schema validated and flattened for runtime use.

use crate::schema::{Field, FieldKind};
use regex::Regex;
use std::collections::HashMap;

#[derive(Clone, Debug)]
pub struct ResolvedField {
    pub name: String,
    pub field: Field,
    /// Compiled once from `field.pattern`.
    pub pattern: Option<Regex>,
}

impl ResolvedField {
    pub fn kind(&self) -> FieldKind {
        self.field.kind
    }
}

#[derive(Clone, Debug)]
pub struct ResolvedEntity {
    pub name: String,
    pub table_name: String,
    pub pk_column: String,
    /// Declared fields in document order (primary key excluded).
    pub fields: Vec<ResolvedField>,
}

impl ResolvedEntity {
    pub fn field(&self, name: &str) -> Option<&ResolvedField> {
        self.fields.iter().find(|f| f.name == name)
    }

    pub fn has_column(&self, name: &str) -> bool {
        name == self.pk_column || self.field(name).is_some()
    }

    /// Primary key first, then fields.
    pub fn column_names(&self) -> Vec<&str> {
        std::iter::once(self.pk_column.as_str())
            .chain(self.fields.iter().map(|f| f.name.as_str()))
            .collect()
    }
}

#[derive(Clone, Debug, Default)]
pub struct ResolvedModel {
    pub entities: Vec<ResolvedEntity>,
    pub entity_by_name: HashMap<String, ResolvedEntity>,
}

impl ResolvedModel {
    pub fn entity(&self, name: &str) -> Option<&ResolvedEntity> {
        self.entity_by_name.get(name)
    }

    pub fn entity_names(&self) -> Vec<&str> {
        self.entities.iter().map(|e| e.name.as_str()).collect()
    }
}
