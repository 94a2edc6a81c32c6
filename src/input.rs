//! Loading and checking the JSON option files fed to the packers.

use std::fs;
use std::path::Path;

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{Result, ResultExt, ValidationError};

/// Read a JSON file whose top level must be an object.
pub fn read_json_object(path: &Path) -> Result<Map<String, Value>> {
    let text = fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    debug!(path = %path.display(), bytes = text.len(), "Read input JSON");
    into_object(serde_json::from_str(&text)?, "input")
}

/// Unwrap a JSON object or report what was found instead.
pub fn into_object(value: Value, field: &str) -> Result<Map<String, Value>> {
    match value {
        Value::Object(map) => Ok(map),
        other => Err(ValidationError::InvalidField {
            field: field.to_string(),
            reason: format!("expected a JSON object, got {}", type_name(&other)),
        }
        .into()),
    }
}

/// Fail with every absent field at once.
pub fn require_fields(
    options: &Map<String, Value>,
    fields: &[&str],
    context: &str,
) -> std::result::Result<(), ValidationError> {
    let missing: Vec<String> = fields
        .iter()
        .filter(|f| !options.contains_key(**f))
        .map(|f| (*f).to_string())
        .collect();
    if missing.is_empty() {
        Ok(())
    } else {
        Err(ValidationError::MissingFields {
            context: context.to_string(),
            fields: missing,
        })
    }
}

/// A field that must hold a JSON string.
pub fn string_field<'a>(
    options: &'a Map<String, Value>,
    field: &str,
) -> std::result::Result<&'a str, ValidationError> {
    match options.get(field) {
        Some(Value::String(s)) => Ok(s),
        Some(other) => Err(ValidationError::InvalidField {
            field: field.to_string(),
            reason: format!("expected a string, got {}", type_name(other)),
        }),
        None => Err(ValidationError::MissingFields {
            context: format!("'{field}'"),
            fields: vec![field.to_string()],
        }),
    }
}

/// An optional string field; absent and `null` both read as `None`.
pub fn optional_string<'a>(
    options: &'a Map<String, Value>,
    field: &str,
) -> std::result::Result<Option<&'a str>, ValidationError> {
    match options.get(field) {
        None | Some(Value::Null) => Ok(None),
        Some(_) => string_field(options, field).map(Some),
    }
}

const fn type_name(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}
