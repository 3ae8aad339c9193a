//! Writing a config back out as JSON, YAML, TOML or pretty text.

use crate::loader::FileFormat;
use crate::pretty::pretty_text;
use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue, Scalar};
use serde::ser::{Serialize, SerializeMap, SerializeSeq, Serializer};
use std::fmt;
use std::path::Path;
use std::str::FromStr;
use yaml_rust2::{Yaml, YamlEmitter};

/// Output format for [`dump`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DumpFormat {
    /// Python-literal pretty text.
    #[default]
    Text,
    Json,
    Yaml,
    Toml,
}

impl From<FileFormat> for DumpFormat {
    fn from(format: FileFormat) -> Self {
        match format {
            FileFormat::Json => DumpFormat::Json,
            FileFormat::Yaml => DumpFormat::Yaml,
            FileFormat::Toml => DumpFormat::Toml,
        }
    }
}

impl FromStr for DumpFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "py" | "pretty" => Ok(DumpFormat::Text),
            "json" => Ok(DumpFormat::Json),
            "yaml" | "yml" => Ok(DumpFormat::Yaml),
            "toml" => Ok(DumpFormat::Toml),
            other => Err(format!("unknown dump format '{}'", other)),
        }
    }
}

impl fmt::Display for DumpFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            DumpFormat::Text => "text",
            DumpFormat::Json => "json",
            DumpFormat::Yaml => "yaml",
            DumpFormat::Toml => "toml",
        };
        write!(f, "{}", name)
    }
}

// Tuples serialize as plain sequences; formats without a tuple type lose the
// distinction.
impl Serialize for ConfigValue {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            ConfigValue::Scalar(Scalar::Null) => serializer.serialize_none(),
            ConfigValue::Scalar(Scalar::Bool(b)) => serializer.serialize_bool(*b),
            ConfigValue::Scalar(Scalar::Int(i)) => serializer.serialize_i64(*i),
            ConfigValue::Scalar(Scalar::Float(f)) => serializer.serialize_f64(*f),
            ConfigValue::Scalar(Scalar::String(s)) => serializer.serialize_str(s),
            ConfigValue::Array(items) | ConfigValue::Tuple(items) => {
                let mut seq = serializer.serialize_seq(Some(items.len()))?;
                for item in items {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            ConfigValue::Map(map) => map.serialize(serializer),
        }
    }
}

impl Serialize for ConfigMap {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut out = serializer.serialize_map(Some(self.len()))?;
        for (key, value) in self.iter() {
            out.serialize_entry(key, value)?;
        }
        out.end()
    }
}

/// Render `map` in `format`.
///
/// # Errors
///
/// Returns [`ConfigError::DumpUnsupported`] when the format cannot represent
/// the content, such as null values in TOML.
pub fn dump(map: &ConfigMap, format: DumpFormat) -> ConfigResult<String> {
    match format {
        DumpFormat::Text => Ok(pretty_text(map)),
        DumpFormat::Json => {
            let mut out =
                serde_json::to_string_pretty(map).map_err(|e| ConfigError::DumpUnsupported {
                    format: "json",
                    message: e.to_string(),
                })?;
            out.push('\n');
            Ok(out)
        }
        DumpFormat::Toml => {
            // toml drops null table entries without complaint
            if let Some(key) = first_null(map, "") {
                return Err(ConfigError::DumpUnsupported {
                    format: "toml",
                    message: format!("null value at '{}'", key),
                });
            }
            toml::to_string(map).map_err(|e| ConfigError::DumpUnsupported {
                format: "toml",
                message: e.to_string(),
            })
        }
        DumpFormat::Yaml => {
            let yaml = to_yaml(&ConfigValue::Map(map.clone()));
            let mut out = String::new();
            YamlEmitter::new(&mut out)
                .dump(&yaml)
                .map_err(|e| ConfigError::DumpUnsupported {
                    format: "yaml",
                    message: e.to_string(),
                })?;
            // The emitter writes a document start marker and no final newline.
            let body = out.strip_prefix("---\n").unwrap_or(&out);
            Ok(format!("{}\n", body))
        }
    }
}

/// Dotted key of the first null value, depth first in document order.
fn first_null(map: &ConfigMap, prefix: &str) -> Option<String> {
    map.iter()
        .find_map(|(key, value)| null_in_value(value, format!("{}{}", prefix, key)))
}

fn null_in_value(value: &ConfigValue, key: String) -> Option<String> {
    match value {
        ConfigValue::Scalar(Scalar::Null) => Some(key),
        ConfigValue::Scalar(_) => None,
        ConfigValue::Map(child) => first_null(child, &format!("{}.", key)),
        ConfigValue::Array(items) | ConfigValue::Tuple(items) => items
            .iter()
            .enumerate()
            .find_map(|(index, item)| null_in_value(item, format!("{}.{}", key, index))),
    }
}

/// Write `map` to `path`, choosing the format from its extension.
pub fn dump_to_file(map: &ConfigMap, path: &Path) -> ConfigResult<()> {
    let format = FileFormat::from_path(path)?;
    let content = dump(map, format.into())?;
    std::fs::write(path, content).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })
}

fn to_yaml(value: &ConfigValue) -> Yaml {
    match value {
        ConfigValue::Scalar(Scalar::Null) => Yaml::Null,
        ConfigValue::Scalar(Scalar::Bool(b)) => Yaml::Boolean(*b),
        ConfigValue::Scalar(Scalar::Int(i)) => Yaml::Integer(*i),
        ConfigValue::Scalar(Scalar::Float(f)) => Yaml::Real(yaml_float(*f)),
        ConfigValue::Scalar(Scalar::String(s)) => Yaml::String(s.clone()),
        ConfigValue::Array(items) | ConfigValue::Tuple(items) => {
            Yaml::Array(items.iter().map(to_yaml).collect())
        }
        ConfigValue::Map(map) => {
            let mut hash = yaml_rust2::yaml::Hash::new();
            for (key, value) in map.iter() {
                hash.insert(Yaml::String(key.to_string()), to_yaml(value));
            }
            Yaml::Hash(hash)
        }
    }
}

fn yaml_float(f: f64) -> String {
    if f.is_nan() {
        ".nan".to_string()
    } else if f.is_infinite() && f.is_sign_positive() {
        ".inf".to_string()
    } else if f.is_infinite() {
        "-.inf".to_string()
    } else {
        format!("{:?}", f)
    }
}
