//! Schema validation helpers for prompt library JSON5 configuration.

use super::SchemaMode;
use crate::ConfigError;
use serde_json::{Map, Value};

/// Validate a single config layer against the schema.
pub(super) fn validate_layer_schema(
    value: &Value,
    _mode: SchemaMode,
    layer: &str,
) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, "")?;
    ensure_allowed_keys(map, &["$schema", "storage", "import", "export"], layer, "")?;

    if let Some(value) = map.get("$schema") {
        expect_string(value, layer, "$schema")?;
    }
    if let Some(value) = map.get("storage") {
        validate_storage(value, layer, "storage")?;
    }
    if let Some(value) = map.get("import") {
        validate_import(value, layer, "import")?;
    }
    if let Some(value) = map.get("export") {
        validate_export(value, layer, "export")?;
    }

    Ok(())
}

/// Validate the "storage" block.
fn validate_storage(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["path", "key", "quota_bytes"], layer, path)?;

    if let Some(value) = map.get("path") {
        expect_optional_string(value, layer, &join_path(path, "path"))?;
    }
    if let Some(value) = map.get("key") {
        expect_string(value, layer, &join_path(path, "key"))?;
    }
    if let Some(value) = map.get("quota_bytes") {
        if !value.is_null() {
            expect_u64(value, layer, &join_path(path, "quota_bytes"))?;
        }
    }
    Ok(())
}

/// Validate the "import" block.
fn validate_import(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["mode", "on_duplicate", "backup_retention"], layer, path)?;

    if let Some(value) = map.get("mode") {
        expect_one_of(
            value,
            &["merge", "replace"],
            layer,
            &join_path(path, "mode"),
            "invalid import mode",
        )?;
    }
    if let Some(value) = map.get("on_duplicate") {
        expect_one_of(
            value,
            &["ask", "keep", "overwrite"],
            layer,
            &join_path(path, "on_duplicate"),
            "invalid duplicate policy",
        )?;
    }
    if let Some(value) = map.get("backup_retention") {
        expect_u64(value, layer, &join_path(path, "backup_retention"))?;
    }
    Ok(())
}

/// Validate the "export" block.
fn validate_export(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    let map = expect_object(value, layer, path)?;
    ensure_allowed_keys(map, &["dir"], layer, path)?;

    if let Some(value) = map.get("dir") {
        expect_optional_string(value, layer, &join_path(path, "dir"))?;
    }
    Ok(())
}

/// Expect a JSON object or return a typed error.
fn expect_object<'a>(
    value: &'a Value,
    layer: &str,
    path: &str,
) -> Result<&'a Map<String, Value>, ConfigError> {
    match value {
        Value::Object(map) => Ok(map),
        _ => Err(invalid_field(layer, path, "expected object")),
    }
}

/// Expect a JSON string or return a typed error.
fn expect_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a JSON string or null.
fn expect_optional_string(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_null() || value.as_str().is_some() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected string"))
    }
}

/// Expect a non-negative JSON integer or return a typed error.
fn expect_u64(value: &Value, layer: &str, path: &str) -> Result<(), ConfigError> {
    if value.is_u64() {
        Ok(())
    } else {
        Err(invalid_field(layer, path, "expected non-negative integer"))
    }
}

/// Expect a string drawn from a fixed set of values.
fn expect_one_of(
    value: &Value,
    allowed: &[&str],
    layer: &str,
    path: &str,
    message: &str,
) -> Result<(), ConfigError> {
    let Some(text) = value.as_str() else {
        return Err(invalid_field(layer, path, "expected string"));
    };
    if allowed.contains(&text) {
        Ok(())
    } else {
        Err(invalid_field(layer, path, message))
    }
}

/// Ensure an object contains only allowed keys.
fn ensure_allowed_keys(
    map: &Map<String, Value>,
    allowed: &[&str],
    layer: &str,
    path: &str,
) -> Result<(), ConfigError> {
    for key in map.keys() {
        if !allowed.contains(&key.as_str()) {
            return Err(invalid_field(layer, &join_path(path, key), "unknown key"));
        }
    }
    Ok(())
}

/// Join nested paths for better error messages.
fn join_path(prefix: &str, key: &str) -> String {
    if prefix.is_empty() {
        key.to_string()
    } else {
        format!("{prefix}.{key}")
    }
}

/// Build a structured invalid-field error.
fn invalid_field(layer: &str, path: &str, message: &str) -> ConfigError {
    let normalized_path = if path.is_empty() { "root" } else { path };
    ConfigError::InvalidField {
        path: format!("{layer}:{normalized_path}"),
        message: message.to_string(),
    }
}
