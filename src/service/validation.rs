//! Request validation from schema field rules.

use crate::error::AppError;
use crate::schema::{FieldKind, ResolvedEntity, ResolvedField};
use serde_json::{Map, Value};

pub struct RequestValidator;

impl RequestValidator {
    /// Validate a create body. Missing fields take their default; required fields must be present and non-blank.
    /// Returns the normalized values to insert.
    pub fn validate_create(entity: &ResolvedEntity, body: Value) -> Result<Map<String, Value>, AppError> {
        let mut input = Self::object_with_known_fields(entity, body)?;
        let mut out = Map::new();
        for f in &entity.fields {
            let value = match input.remove(&f.name) {
                Some(v) => Some(v),
                None => f.field.default.clone(),
            };
            match value {
                Some(v) => {
                    let v = validate_field(f, &v)?;
                    if f.field.required && is_blank(&v) {
                        return Err(AppError::Validation(format!("{} is required", f.name)));
                    }
                    out.insert(f.name.clone(), v);
                }
                None if f.field.required => {
                    return Err(AppError::Validation(format!("{} is required", f.name)));
                }
                None => {}
            }
        }
        Ok(out)
    }

    /// Validate only the fields present in body (for PATCH). Required fields cannot be cleared.
    pub fn validate_update(entity: &ResolvedEntity, body: Value) -> Result<Map<String, Value>, AppError> {
        let input = Self::object_with_known_fields(entity, body)?;
        let mut out = Map::new();
        for (name, v) in input {
            let Some(f) = entity.field(&name) else { continue };
            let v = validate_field(f, &v)?;
            if f.field.required && is_blank(&v) {
                return Err(AppError::Validation(format!("{} cannot be empty", name)));
            }
            out.insert(name, v);
        }
        Ok(out)
    }

    fn object_with_known_fields(entity: &ResolvedEntity, body: Value) -> Result<Map<String, Value>, AppError> {
        let Value::Object(map) = body else {
            return Err(AppError::Validation("body must be a JSON object".into()));
        };
        for key in map.keys() {
            if *key == entity.pk_column {
                return Err(AppError::Validation(format!("{} is server-assigned", key)));
            }
            if entity.field(key).is_none() {
                return Err(AppError::Validation(format!("unknown field '{}' for {}", key, entity.name)));
            }
        }
        Ok(map)
    }
}

fn is_blank(v: &Value) -> bool {
    match v {
        Value::Null => true,
        Value::String(s) => s.trim().is_empty(),
        _ => false,
    }
}

/// Coerce to the field kind, then apply length/pattern/range rules.
fn validate_field(f: &ResolvedField, v: &Value) -> Result<Value, AppError> {
    let col = &f.name;
    let v = f
        .field
        .coerce(v)
        .map_err(|reason| AppError::Validation(format!("{} {}", col, reason)))?;
    if v.is_null() {
        return Ok(v);
    }
    let rule = &f.field;
    if f.kind() == FieldKind::Text {
        let s = v.as_str().unwrap_or_default();
        let len = s.chars().count();
        if let Some(max) = rule.max_length {
            if len > max as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at most {} characters",
                    col, max
                )));
            }
        }
        if let Some(min) = rule.min_length {
            if len < min as usize {
                return Err(AppError::Validation(format!(
                    "{} must be at least {} characters",
                    col, min
                )));
            }
        }
        if let Some(re) = &f.pattern {
            if !re.is_match(s) {
                return Err(AppError::Validation(format!("{} does not match required pattern", col)));
            }
        }
    }
    if let Some(n) = v.as_f64() {
        if let Some(min) = rule.minimum {
            if n < min {
                return Err(AppError::Validation(format!("{} must be at least {}", col, min)));
            }
        }
        if let Some(max) = rule.maximum {
            if n > max {
                return Err(AppError::Validation(format!("{} must be at most {}", col, max)));
            }
        }
    }
    Ok(v)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{app_schema, resolve, EntityDefinition, Field, SchemaDefinition};
    use serde_json::json;

    fn todos() -> ResolvedEntity {
        resolve(&app_schema()).unwrap().entity("todos").unwrap().clone()
    }

    #[test]
    fn create_fills_defaults() {
        let out = RequestValidator::validate_create(&todos(), json!({ "title": "Learn X" })).unwrap();
        assert_eq!(Value::Object(out), json!({ "title": "Learn X", "done": false }));
    }

    #[test]
    fn create_coerces_boolean_input() {
        let out = RequestValidator::validate_create(&todos(), json!({ "title": "a", "done": "on" })).unwrap();
        assert_eq!(out["done"], json!(true));
        let err = RequestValidator::validate_create(&todos(), json!({ "title": "a", "done": "perhaps" })).unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[test]
    fn create_requires_title() {
        for body in [json!({}), json!({ "title": "" }), json!({ "title": "   " }), json!({ "title": null })] {
            let err = RequestValidator::validate_create(&todos(), body.clone()).unwrap_err();
            assert!(matches!(err, AppError::Validation(ref m) if m.contains("title")), "{}", body);
        }
    }

    #[test]
    fn rejects_unknown_fields_and_id() {
        let err = RequestValidator::validate_create(&todos(), json!({ "title": "a", "color": "red" })).unwrap_err();
        assert!(err.to_string().contains("color"));
        let err = RequestValidator::validate_update(&todos(), json!({ "id": 3 })).unwrap_err();
        assert!(err.to_string().contains("server-assigned"));
        assert!(RequestValidator::validate_create(&todos(), json!(["title"])).is_err());
    }

    #[test]
    fn update_is_partial() {
        let out = RequestValidator::validate_update(&todos(), json!({ "done": 0 })).unwrap();
        assert_eq!(Value::Object(out), json!({ "done": false }));
        assert!(RequestValidator::validate_update(&todos(), json!({ "title": "" })).is_err());
    }

    #[test]
    fn length_pattern_and_range_rules() {
        let schema = SchemaDefinition::new().entity(
            EntityDefinition::new("things")
                .field("code", Field::text().max_length(3).pattern("^[A-Z]+$"))
                .field("score", Field::number().minimum(0.0).maximum(10.0)),
        );
        let entity = resolve(&schema).unwrap().entity("things").unwrap().clone();
        assert!(RequestValidator::validate_create(&entity, json!({ "code": "ABC", "score": 3 })).is_ok());
        assert!(RequestValidator::validate_create(&entity, json!({ "code": "ABCD" })).is_err());
        assert!(RequestValidator::validate_create(&entity, json!({ "code": "abc" })).is_err());
        assert!(RequestValidator::validate_create(&entity, json!({ "score": 11 })).is_err());
        assert!(RequestValidator::validate_create(&entity, json!({ "score": "-1" })).is_err());
    }
}
