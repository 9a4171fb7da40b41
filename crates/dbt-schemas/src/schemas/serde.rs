use dbt_common::{ErrorCode, FsError, FsResult};
use serde::{Deserialize, Deserializer, de::DeserializeOwned};
use std::path::Path;

// Type aliases for clarity
pub type YmlValue = serde_yaml::Value;
type MinijinjaValue = minijinja::Value;

/// Deserializes a YAML file into a `T`, using the file's path for error reporting.
pub fn typed_struct_from_yaml_file<T>(path: &Path) -> FsResult<T>
where
    T: DeserializeOwned,
{
    let yaml_str = std::fs::read_to_string(path).map_err(|e| {
        FsError::new(
            ErrorCode::IoError,
            format!("Failed to read {}: {e}", path.display()),
        )
    })?;

    typed_struct_from_yaml_str(&yaml_str, Some(path))
}

/// Deserializes a YAML string into a `T`.
pub fn typed_struct_from_yaml_str<T>(yaml_str: &str, source: Option<&Path>) -> FsResult<T>
where
    T: DeserializeOwned,
{
    serde_yaml::from_str(yaml_str).map_err(|e| yaml_to_fs_error(e, source))
}

/// Converts a Jinja value (e.g. a dict built in a macro) into a `T`.
pub fn minijinja_value_to_typed_struct<T>(value: &MinijinjaValue) -> FsResult<T>
where
    T: DeserializeOwned,
{
    let yml_val = serde_yaml::to_value(value).map_err(|e| {
        FsError::new(
            ErrorCode::SerializationError,
            format!("Failed to convert Jinja value to YAML: {e}"),
        )
    })?;

    serde_yaml::from_value(yml_val).map_err(|e| yaml_to_fs_error(e, None))
}

/// Converts a `serde_yaml::Error` into a `FsError`, attaching the error location
pub fn yaml_to_fs_error(err: serde_yaml::Error, filename: Option<&Path>) -> Box<FsError> {
    let location = match (filename, err.location()) {
        (Some(file), Some(loc)) => format!(" at {}:{}:{}", file.display(), loc.line(), loc.column()),
        (Some(file), None) => format!(" in {}", file.display()),
        (None, Some(loc)) => format!(" at line {} column {}", loc.line(), loc.column()),
        (None, None) => String::new(),
    };
    Box::new(FsError::new(
        ErrorCode::SerializationError,
        format!("YAML error{location}: {err}"),
    ))
}

pub fn bool_or_string_bool<'de, D>(deserializer: D) -> Result<Option<bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = YmlValue::deserialize(deserializer)?;
    Ok(value
        .as_bool()
        .or_else(|| value.as_str().map(|s| s.eq_ignore_ascii_case("true"))))
}
