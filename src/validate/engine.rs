//! Schema validation engine.
//!
//! Validates a raw JSON value against a [`Schema`] in exactly one mode and
//! produces either the canonicalized value (declared coercions applied,
//! defaults filled in) or the full ordered list of violations. Validation is
//! pure and idempotent: canonicalizing an already-canonical value returns it
//! unchanged with zero errors.

use serde_json::{json, Map, Value};

use super::error::{FieldPath, ValidationError};
use crate::schema::{FieldSpec, FieldType, Rule, Schema};

/// Validation mode. Exactly one applies per call.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Any undeclared field is itself a violation
    Strict,
    /// Undeclared fields pass through unvalidated and unmodified
    Passthrough,
}

/// Validate `raw` against `schema`.
///
/// On success returns the canonicalized value; on failure returns every
/// violation, in field declaration order, then unknown-field violations,
/// then cross-field rule violations.
pub fn validate(schema: &Schema, raw: &Value, mode: Mode) -> Result<Value, Vec<ValidationError>> {
    validate_object(schema, raw, mode, &FieldPath::root())
}

fn validate_object(
    schema: &Schema,
    raw: &Value,
    mode: Mode,
    path: &FieldPath,
) -> Result<Value, Vec<ValidationError>> {
    let Some(map) = raw.as_object() else {
        return Err(vec![ValidationError::new(
            path.clone(),
            "expected an object",
        )]);
    };

    let mut errors = Vec::new();
    let mut canonical = Map::new();

    for (name, spec) in schema.fields() {
        let field_path = path.key(name);

        match map.get(name) {
            None | Some(Value::Null) => {
                if let Some(default) = &spec.default {
                    canonical.insert(name.clone(), default.clone());
                } else if spec.required {
                    errors.push(ValidationError::new(field_path, "is required"));
                }
            },
            Some(value) => match check_field(spec, value, &field_path, mode) {
                Ok(value) => {
                    canonical.insert(name.clone(), value);
                },
                Err(mut field_errors) => errors.append(&mut field_errors),
            },
        }
    }

    for (name, value) in map {
        if schema.get(name).is_none() {
            match mode {
                Mode::Strict => {
                    errors.push(ValidationError::new(path.key(name), "unknown field"));
                },
                Mode::Passthrough => {
                    canonical.insert(name.clone(), value.clone());
                },
            }
        }
    }

    for rule in schema.rules() {
        let Rule::FieldsEqual {
            field,
            other,
            message,
        } = rule;
        if let (Some(a), Some(b)) = (map.get(field), map.get(other)) {
            if a != b {
                errors.push(ValidationError::new(path.key(other), message.clone()));
            }
        }
    }

    if errors.is_empty() {
        Ok(Value::Object(canonical))
    } else {
        Err(errors)
    }
}

fn check_field(
    spec: &FieldSpec,
    value: &Value,
    path: &FieldPath,
    mode: Mode,
) -> Result<Value, Vec<ValidationError>> {
    match &spec.ty {
        FieldType::String => check_string(spec, value, path),
        FieldType::Integer => check_integer(spec, value, path),
        FieldType::Float => check_float(spec, value, path),
        FieldType::Boolean => check_boolean(spec, value, path),
        FieldType::Object(schema) => validate_object(schema, value, mode, path),
        FieldType::Array(item) => check_array(spec, item, value, path, mode),
    }
}

fn single(path: &FieldPath, message: impl Into<String>) -> Vec<ValidationError> {
    vec![ValidationError::new(path.clone(), message)]
}

fn check_string(
    spec: &FieldSpec,
    value: &Value,
    path: &FieldPath,
) -> Result<Value, Vec<ValidationError>> {
    let Some(s) = value.as_str() else {
        return Err(single(path, "must be a string"));
    };

    let mut errors = Vec::new();
    let chars = s.chars().count();

    if let Some(min) = spec.min_len {
        if chars < min {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must be at least {min} characters"),
            ));
        }
    }
    if let Some(max) = spec.max_len {
        if chars > max {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must be at most {max} characters"),
            ));
        }
    }
    if let Some(pattern) = &spec.pattern {
        if !pattern.is_match(s) {
            errors.push(ValidationError::new(path.clone(), "has an invalid format"));
        }
    }
    if spec.email && !is_plausible_email(s) {
        errors.push(ValidationError::new(
            path.clone(),
            "must be a valid email address",
        ));
    }

    if errors.is_empty() {
        Ok(value.clone())
    } else {
        Err(errors)
    }
}

/// Loose RFC-shape check: one `@`, non-empty local part, dotted domain.
/// A mail server is the only real validator; this gate just rejects the
/// obviously malformed.
fn is_plausible_email(s: &str) -> bool {
    let Some((local, domain)) = s.split_once('@') else {
        return false;
    };
    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return false;
    }
    let Some((host, tld)) = domain.rsplit_once('.') else {
        return false;
    };
    !host.is_empty() && !tld.is_empty() && !s.contains(char::is_whitespace)
}

fn check_integer(
    spec: &FieldSpec,
    value: &Value,
    path: &FieldPath,
) -> Result<Value, Vec<ValidationError>> {
    let n: i64 = if let Some(n) = value.as_i64() {
        n
    } else if spec.coerce {
        let Some(parsed) = value.as_str().and_then(|s| s.trim().parse().ok()) else {
            return Err(single(path, "must be an integer"));
        };
        parsed
    } else {
        return Err(single(path, "must be an integer"));
    };

    check_range(spec, n as f64, path)?;
    Ok(json!(n))
}

fn check_float(
    spec: &FieldSpec,
    value: &Value,
    path: &FieldPath,
) -> Result<Value, Vec<ValidationError>> {
    let n: f64 = if let Some(n) = value.as_f64() {
        n
    } else if spec.coerce {
        let Some(parsed) = value.as_str().and_then(|s| s.trim().parse().ok()) else {
            return Err(single(path, "must be a number"));
        };
        parsed
    } else {
        return Err(single(path, "must be a number"));
    };

    check_range(spec, n, path)?;
    Ok(json!(n))
}

fn check_range(spec: &FieldSpec, n: f64, path: &FieldPath) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if let Some(min) = spec.min {
        if n < min {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must be at least {min}"),
            ));
        }
    }
    if let Some(max) = spec.max {
        if n > max {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must be at most {max}"),
            ));
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_boolean(
    spec: &FieldSpec,
    value: &Value,
    path: &FieldPath,
) -> Result<Value, Vec<ValidationError>> {
    if let Some(b) = value.as_bool() {
        return Ok(json!(b));
    }
    if spec.coerce {
        match value.as_str().map(str::trim) {
            Some("true") => return Ok(json!(true)),
            Some("false") => return Ok(json!(false)),
            _ => {},
        }
    }
    Err(single(path, "must be a boolean"))
}

fn check_array(
    spec: &FieldSpec,
    item: &FieldSpec,
    value: &Value,
    path: &FieldPath,
    mode: Mode,
) -> Result<Value, Vec<ValidationError>> {
    let Some(items) = value.as_array() else {
        return Err(single(path, "must be an array"));
    };

    let mut errors = Vec::new();

    if let Some(min) = spec.min_items {
        if items.len() < min {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must have at least {min} items"),
            ));
        }
    }
    if let Some(max) = spec.max_items {
        if items.len() > max {
            errors.push(ValidationError::new(
                path.clone(),
                format!("must have at most {max} items"),
            ));
        }
    }

    let mut canonical = Vec::with_capacity(items.len());
    for (i, element) in items.iter().enumerate() {
        match check_field(item, element, &path.index(i), mode) {
            Ok(value) => canonical.push(value),
            Err(mut element_errors) => errors.append(&mut element_errors),
        }
    }

    if errors.is_empty() {
        Ok(Value::Array(canonical))
    } else {
        Err(errors)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::{FieldSpec, Rule, Schema};

    fn registration_schema() -> Schema {
        Schema::builder()
            .field(
                "username",
                FieldSpec::string()
                    .required()
                    .min_len(3)
                    .max_len(32)
                    .pattern(r"^[a-zA-Z0-9_-]+$"),
            )
            .field("email", FieldSpec::string().required().email())
            .field("password", FieldSpec::string().required().min_len(8))
            .field("confirmPassword", FieldSpec::string().required())
            .rule(Rule::fields_equal("password", "confirmPassword"))
            .build()
            .unwrap()
    }

    #[test]
    fn test_conforming_input_passes() {
        let schema = registration_schema();
        let raw = json!({
            "username": "alice_1",
            "email": "alice@example.com",
            "password": "correct horse",
            "confirmPassword": "correct horse",
        });

        let canonical = validate(&schema, &raw, Mode::Strict).unwrap();
        assert_eq!(canonical, raw);
    }

    #[test]
    fn test_multiple_errors_reported() {
        let schema = registration_schema();
        let raw = json!({
            "username": "ab",
            "email": "not-an-email",
            "password": "short",
            "confirmPassword": "short",
        });

        let errors = validate(&schema, &raw, Mode::Strict).unwrap_err();
        assert!(errors.len() >= 2);
        assert!(errors.iter().any(|e| e.path.to_string() == "username"));
        assert!(errors.iter().any(|e| e.path.to_string() == "email"));
        // password/confirm agree, so no mismatch error
        assert!(!errors
            .iter()
            .any(|e| e.path.to_string() == "confirmPassword"));
    }

    #[test]
    fn test_password_mismatch_rule() {
        let schema = registration_schema();
        let raw = json!({
            "username": "alice",
            "email": "alice@example.com",
            "password": "correct horse",
            "confirmPassword": "wrong pony",
        });

        let errors = validate(&schema, &raw, Mode::Strict).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "confirmPassword");
    }

    #[test]
    fn test_strict_rejects_unknown_fields() {
        let schema = Schema::builder()
            .field("title", FieldSpec::string().required())
            .build()
            .unwrap();
        let raw = json!({"title": "ok", "extra": 1});

        let errors = validate(&schema, &raw, Mode::Strict).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "extra");
        assert_eq!(errors[0].message, "unknown field");
    }

    #[test]
    fn test_strict_failure_is_idempotent() {
        let schema = Schema::builder()
            .field("title", FieldSpec::string().required())
            .build()
            .unwrap();
        let raw = json!({"title": 7, "extra": 1});

        let first = validate(&schema, &raw, Mode::Strict).unwrap_err();
        let second = validate(&schema, &raw, Mode::Strict).unwrap_err();
        assert_eq!(first, second);
    }

    #[test]
    fn test_passthrough_preserves_unknown_fields() {
        let schema = Schema::builder()
            .field("title", FieldSpec::string().required())
            .build()
            .unwrap();
        let raw = json!({"title": "ok", "extra": {"untouched": true}});

        let canonical = validate(&schema, &raw, Mode::Passthrough).unwrap();
        assert_eq!(canonical["extra"], json!({"untouched": true}));
    }

    #[test]
    fn test_query_string_coercion() {
        let schema = Schema::builder()
            .field("page", FieldSpec::integer().coerce().min(1.0))
            .field("limit", FieldSpec::integer().coerce().max(100.0))
            .build()
            .unwrap();
        let raw = json!({"page": "2", "limit": "10"});

        let canonical = validate(&schema, &raw, Mode::Passthrough).unwrap();
        assert_eq!(canonical, json!({"page": 2, "limit": 10}));
    }

    #[test]
    fn test_coercion_rejects_garbage() {
        let schema = Schema::builder()
            .field("page", FieldSpec::integer().coerce())
            .build()
            .unwrap();

        let errors = validate(&schema, &json!({"page": "two"}), Mode::Strict).unwrap_err();
        assert_eq!(errors[0].message, "must be an integer");
    }

    #[test]
    fn test_no_coercion_without_declaration() {
        let schema = Schema::builder()
            .field("count", FieldSpec::integer())
            .build()
            .unwrap();

        assert!(validate(&schema, &json!({"count": "2"}), Mode::Strict).is_err());
    }

    #[test]
    fn test_defaults_filled_in() {
        let schema = Schema::builder()
            .field("page", FieldSpec::integer().coerce().default_value(json!(1)))
            .field("limit", FieldSpec::integer().coerce().default_value(json!(20)))
            .build()
            .unwrap();

        let canonical = validate(&schema, &json!({}), Mode::Passthrough).unwrap();
        assert_eq!(canonical, json!({"page": 1, "limit": 20}));
    }

    #[test]
    fn test_canonicalization_idempotent() {
        let schema = Schema::builder()
            .field("page", FieldSpec::integer().coerce().default_value(json!(1)))
            .field("active", FieldSpec::boolean().coerce())
            .build()
            .unwrap();
        let raw = json!({"page": "3", "active": "true"});

        let once = validate(&schema, &raw, Mode::Passthrough).unwrap();
        let twice = validate(&schema, &once, Mode::Passthrough).unwrap();
        assert_eq!(once, twice);
        assert_eq!(once, json!({"page": 3, "active": true}));
    }

    #[test]
    fn test_nested_object_paths() {
        let inner = Schema::builder()
            .field("city", FieldSpec::string().required())
            .build()
            .unwrap();
        let schema = Schema::builder()
            .field("address", FieldSpec::object(inner).required())
            .build()
            .unwrap();

        let errors = validate(&schema, &json!({"address": {}}), Mode::Strict).unwrap_err();
        assert_eq!(errors[0].path.to_string(), "address.city");
    }

    #[test]
    fn test_array_element_paths() {
        let schema = Schema::builder()
            .field("tags", FieldSpec::array(FieldSpec::string().min_len(2)))
            .build()
            .unwrap();

        let errors =
            validate(&schema, &json!({"tags": ["ok", "x", "also ok"]}), Mode::Strict).unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "tags[1]");
    }

    #[test]
    fn test_array_bounds() {
        let schema = Schema::builder()
            .field("tags", FieldSpec::array(FieldSpec::string()).max_items(2))
            .build()
            .unwrap();

        let errors =
            validate(&schema, &json!({"tags": ["a", "b", "c"]}), Mode::Strict).unwrap_err();
        assert!(errors[0].message.contains("at most 2"));
    }

    #[test]
    fn test_non_object_input() {
        let schema = Schema::builder()
            .field("x", FieldSpec::string())
            .build()
            .unwrap();

        let errors = validate(&schema, &json!([1, 2]), Mode::Strict).unwrap_err();
        assert_eq!(errors[0].message, "expected an object");
    }

    #[test]
    fn test_null_treated_as_absent() {
        let schema = Schema::builder()
            .field("required_field", FieldSpec::string().required())
            .field("optional_field", FieldSpec::string())
            .build()
            .unwrap();

        let errors = validate(
            &schema,
            &json!({"required_field": null, "optional_field": null}),
            Mode::Strict,
        )
        .unwrap_err();
        assert_eq!(errors.len(), 1);
        assert_eq!(errors[0].path.to_string(), "required_field");
    }

    #[test]
    fn test_email_shapes() {
        assert!(is_plausible_email("a@b.co"));
        assert!(is_plausible_email("user.name+tag@sub.example.com"));
        assert!(!is_plausible_email("not-an-email"));
        assert!(!is_plausible_email("@example.com"));
        assert!(!is_plausible_email("user@"));
        assert!(!is_plausible_email("user@nodot"));
        assert!(!is_plausible_email("a b@example.com"));
    }
}
