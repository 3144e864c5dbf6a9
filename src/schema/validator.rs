//! Schema validation: names, reserved fields and field rule consistency.

use crate::error::ConfigError;
use crate::schema::{FieldKind, SchemaDefinition, PRIMARY_FIELD};
use regex::Regex;

fn is_identifier(name: &str) -> bool {
    let mut chars = name.chars();
    matches!(chars.next(), Some(c) if c.is_ascii_lowercase())
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_')
}

pub fn validate(schema: &SchemaDefinition) -> Result<(), ConfigError> {
    if schema.entities.is_empty() {
        return Err(ConfigError::Validation("at least one entity required".into()));
    }

    for (name, entity) in &schema.entities {
        if !is_identifier(name) || name.starts_with("_sys") {
            return Err(ConfigError::InvalidName {
                kind: "entity",
                name: name.clone(),
            });
        }
        if !entity.name.is_empty() && entity.name != *name {
            return Err(ConfigError::Validation(format!(
                "entity registered as '{}' is named '{}'",
                name, entity.name
            )));
        }

        for (field_name, field) in &entity.fields {
            let invalid = |reason: &str| ConfigError::InvalidField {
                entity: name.clone(),
                field: field_name.clone(),
                reason: reason.to_string(),
            };
            if field_name == PRIMARY_FIELD {
                return Err(invalid("'id' is reserved for the primary key"));
            }
            if !is_identifier(field_name) {
                return Err(ConfigError::InvalidName {
                    kind: "field",
                    name: format!("{}.{}", name, field_name),
                });
            }

            let text_rules = field.min_length.is_some() || field.max_length.is_some() || field.pattern.is_some();
            if text_rules && field.kind != FieldKind::Text {
                return Err(invalid("length and pattern rules apply to text fields only"));
            }
            let range_rules = field.minimum.is_some() || field.maximum.is_some();
            if range_rules && field.kind != FieldKind::Number {
                return Err(invalid("minimum and maximum apply to number fields only"));
            }
            if let (Some(min), Some(max)) = (field.min_length, field.max_length) {
                if min > max {
                    return Err(invalid("min_length is greater than max_length"));
                }
            }
            if let (Some(min), Some(max)) = (field.minimum, field.maximum) {
                if min > max {
                    return Err(invalid("minimum is greater than maximum"));
                }
            }
            if let Some(pattern) = &field.pattern {
                Regex::new(pattern).map_err(|e| invalid(&format!("invalid pattern: {}", e)))?;
            }
            if let Some(default) = &field.default {
                field
                    .coerce(default)
                    .map_err(|reason| invalid(&format!("default {}", reason)))?;
            }
        }
    }

    Ok(())
}
