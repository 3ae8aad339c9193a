//! Document loading: turning (substituted) config text into a [`ConfigMap`].
//!
//! The pipeline treats this step as a collaborator behind the
//! [`DocumentLoader`] trait. [`BuiltinLoader`] handles the recognized formats:
//!
//! | extension        | format | parser       |
//! |------------------|--------|--------------|
//! | `.json`          | JSON   | `serde_json` |
//! | `.yaml`, `.yml`  | YAML   | `yaml-rust2` |
//! | `.toml`          | TOML   | `toml`       |

use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue};
use crate::yaml::parse_yaml;
use std::fmt;
use std::path::Path;

/// A recognized config file format.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum FileFormat {
    Json,
    Yaml,
    Toml,
}

impl FileFormat {
    /// Look up a format by extension, with or without the leading dot.
    pub fn from_extension(extension: &str) -> Option<Self> {
        match extension.trim_start_matches('.').to_ascii_lowercase().as_str() {
            "json" => Some(FileFormat::Json),
            "yaml" | "yml" => Some(FileFormat::Yaml),
            "toml" => Some(FileFormat::Toml),
            _ => None,
        }
    }

    /// Determine the format of `path` from its extension.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::UnsupportedFormat`] for any other extension.
    pub fn from_path(path: &Path) -> ConfigResult<Self> {
        let extension = path
            .extension()
            .map(|e| e.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self::from_extension(&extension).ok_or_else(|| ConfigError::UnsupportedFormat {
            path: path.to_path_buf(),
            extension: if extension.is_empty() {
                extension
            } else {
                format!(".{}", extension)
            },
        })
    }

    /// Canonical extension, including the dot.
    pub fn extension(&self) -> &'static str {
        match self {
            FileFormat::Json => ".json",
            FileFormat::Yaml => ".yaml",
            FileFormat::Toml => ".toml",
        }
    }
}

impl fmt::Display for FileFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            FileFormat::Json => "json",
            FileFormat::Yaml => "yaml",
            FileFormat::Toml => "toml",
        };
        write!(f, "{}", name)
    }
}

/// Turns config text into a mapping of top-level names to values.
pub trait DocumentLoader {
    /// Parse `text`, which was read from `path`, as `format`.
    ///
    /// # Errors
    ///
    /// Implementations report syntax problems, and documents whose root is not
    /// a mapping, as [`ConfigError::DocumentParse`].
    fn load(&self, text: &str, path: &Path, format: FileFormat) -> ConfigResult<ConfigMap>;
}

/// Loader for the JSON, YAML and TOML formats.
#[derive(Debug, Clone, Copy, Default)]
pub struct BuiltinLoader;

impl DocumentLoader for BuiltinLoader {
    fn load(&self, text: &str, path: &Path, format: FileFormat) -> ConfigResult<ConfigMap> {
        let parse_error = |message: String| ConfigError::DocumentParse {
            path: path.to_path_buf(),
            message,
        };

        let root = match format {
            FileFormat::Json => {
                let value: serde_json::Value =
                    serde_json::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                config_value_from_json(value)
            }
            FileFormat::Toml => {
                let table: toml::Table =
                    toml::from_str(text).map_err(|e| parse_error(e.to_string()))?;
                config_value_from_toml(toml::Value::Table(table))
            }
            FileFormat::Yaml => match parse_yaml(text).map_err(parse_error)? {
                Some(value) => value,
                None => return Ok(ConfigMap::new()),
            },
        };

        match root {
            ConfigValue::Map(map) => Ok(map),
            other => Err(parse_error(format!(
                "top level of a config must be a mapping, found {}",
                other.type_name()
            ))),
        }
    }
}

/// Convert a JSON value to a `ConfigValue`.
///
/// Integers that do not fit `i64` become floats.
pub fn config_value_from_json(value: serde_json::Value) -> ConfigValue {
    use serde_json::Value;

    match value {
        Value::Null => ConfigValue::null(),
        Value::Bool(b) => ConfigValue::from(b),
        Value::Number(n) => match n.as_i64() {
            Some(i) => ConfigValue::from(i),
            None => ConfigValue::from(n.as_f64().unwrap_or(f64::NAN)),
        },
        Value::String(s) => ConfigValue::string(s),
        Value::Array(items) => {
            ConfigValue::Array(items.into_iter().map(config_value_from_json).collect())
        }
        Value::Object(entries) => ConfigValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, config_value_from_json(v)))
                .collect(),
        ),
    }
}

/// Convert a TOML value to a `ConfigValue`.
///
/// Date-times have no counterpart and are kept as their string form.
pub fn config_value_from_toml(value: toml::Value) -> ConfigValue {
    use toml::Value;

    match value {
        Value::String(s) => ConfigValue::string(s),
        Value::Integer(i) => ConfigValue::from(i),
        Value::Float(f) => ConfigValue::from(f),
        Value::Boolean(b) => ConfigValue::from(b),
        Value::Datetime(dt) => ConfigValue::string(dt.to_string()),
        Value::Array(items) => {
            ConfigValue::Array(items.into_iter().map(config_value_from_toml).collect())
        }
        Value::Table(entries) => ConfigValue::Map(
            entries
                .into_iter()
                .map(|(k, v)| (k, config_value_from_toml(v)))
                .collect(),
        ),
    }
}
