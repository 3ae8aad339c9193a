//! Core type definitions for configuration loading and merging.

use indexmap::IndexMap;
use std::path::PathBuf;
use thiserror::Error;

/// Key holding the base file reference(s) of a config.
pub const BASE_KEY: &str = "_base_";

/// Key that, when true inside a mapping, replaces the inherited mapping wholesale.
pub const DELETE_KEY: &str = "_delete_";

/// Key carrying deprecation metadata for a config file.
pub const DEPRECATION_KEY: &str = "_deprecation_";

/// Top-level names reserved for the accessors of [`crate::ConfigDocument`].
pub const RESERVED_KEYS: [&str; 3] = ["filename", "text", "pretty_text"];

/// Result type alias for basis-config operations.
pub type ConfigResult<T> = std::result::Result<T, ConfigError>;

/// An atomic configuration value.
#[derive(Debug, Clone, PartialEq)]
pub enum Scalar {
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
}

/// A configuration value.
///
/// Mirrors the shapes a config document can produce: scalars, ordered
/// sequences, fixed-arity tuples and ordered mappings.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigValue {
    /// Atomic values (string, number, boolean, null).
    Scalar(Scalar),

    /// Ordered sequence. Replaced as a whole on merge unless addressed
    /// through numeric list keys.
    Array(Vec<ConfigValue>),

    /// Fixed-arity sequence. Always replaced as a whole on merge.
    Tuple(Vec<ConfigValue>),

    /// Ordered string-keyed mapping.
    Map(ConfigMap),
}

impl ConfigValue {
    /// Create a null value.
    pub fn null() -> Self {
        ConfigValue::Scalar(Scalar::Null)
    }

    /// Create a string value.
    pub fn string(s: impl Into<String>) -> Self {
        ConfigValue::Scalar(Scalar::String(s.into()))
    }

    /// Check if this is a scalar value.
    pub fn is_scalar(&self) -> bool {
        matches!(self, ConfigValue::Scalar(_))
    }

    /// Check if this is an array value.
    pub fn is_array(&self) -> bool {
        matches!(self, ConfigValue::Array(_))
    }

    /// Check if this is a tuple value.
    pub fn is_tuple(&self) -> bool {
        matches!(self, ConfigValue::Tuple(_))
    }

    /// Check if this is a map value.
    pub fn is_map(&self) -> bool {
        matches!(self, ConfigValue::Map(_))
    }

    pub fn is_null(&self) -> bool {
        matches!(self, ConfigValue::Scalar(Scalar::Null))
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConfigValue::Scalar(Scalar::String(s)) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            ConfigValue::Scalar(Scalar::Int(i)) => Some(*i),
            _ => None,
        }
    }

    /// Get as a float. Integers are widened.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConfigValue::Scalar(Scalar::Float(f)) => Some(*f),
            ConfigValue::Scalar(Scalar::Int(i)) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            ConfigValue::Scalar(Scalar::Bool(b)) => Some(*b),
            _ => None,
        }
    }

    /// Get as array items if this is an array.
    pub fn as_array(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Array(items) => Some(items),
            _ => None,
        }
    }

    /// Get as tuple items if this is a tuple.
    pub fn as_tuple(&self) -> Option<&[ConfigValue]> {
        match self {
            ConfigValue::Tuple(items) => Some(items),
            _ => None,
        }
    }

    /// Get as map entries if this is a map.
    pub fn as_map(&self) -> Option<&ConfigMap> {
        match self {
            ConfigValue::Map(map) => Some(map),
            _ => None,
        }
    }

    /// Name of the value's type as shown in error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            ConfigValue::Scalar(Scalar::Null) => "null",
            ConfigValue::Scalar(Scalar::Bool(_)) => "bool",
            ConfigValue::Scalar(Scalar::Int(_)) => "int",
            ConfigValue::Scalar(Scalar::Float(_)) => "float",
            ConfigValue::Scalar(Scalar::String(_)) => "str",
            ConfigValue::Array(_) => "list",
            ConfigValue::Tuple(_) => "tuple",
            ConfigValue::Map(_) => "dict",
        }
    }

    /// Truthiness: null, false, zero, and empty strings or containers are falsy.
    pub fn is_truthy(&self) -> bool {
        match self {
            ConfigValue::Scalar(Scalar::Null) => false,
            ConfigValue::Scalar(Scalar::Bool(b)) => *b,
            ConfigValue::Scalar(Scalar::Int(i)) => *i != 0,
            ConfigValue::Scalar(Scalar::Float(f)) => *f != 0.0,
            ConfigValue::Scalar(Scalar::String(s)) => !s.is_empty(),
            ConfigValue::Array(items) | ConfigValue::Tuple(items) => !items.is_empty(),
            ConfigValue::Map(map) => !map.is_empty(),
        }
    }
}

impl From<&str> for ConfigValue {
    fn from(s: &str) -> Self {
        ConfigValue::string(s)
    }
}

impl From<String> for ConfigValue {
    fn from(s: String) -> Self {
        ConfigValue::string(s)
    }
}

impl From<i64> for ConfigValue {
    fn from(i: i64) -> Self {
        ConfigValue::Scalar(Scalar::Int(i))
    }
}

impl From<i32> for ConfigValue {
    fn from(i: i32) -> Self {
        ConfigValue::Scalar(Scalar::Int(i64::from(i)))
    }
}

impl From<f64> for ConfigValue {
    fn from(f: f64) -> Self {
        ConfigValue::Scalar(Scalar::Float(f))
    }
}

impl From<bool> for ConfigValue {
    fn from(b: bool) -> Self {
        ConfigValue::Scalar(Scalar::Bool(b))
    }
}

impl From<ConfigMap> for ConfigValue {
    fn from(map: ConfigMap) -> Self {
        ConfigValue::Map(map)
    }
}

impl From<Vec<ConfigValue>> for ConfigValue {
    fn from(items: Vec<ConfigValue>) -> Self {
        ConfigValue::Array(items)
    }
}

/// An ordered mapping with two lookup surfaces.
///
/// [`ConfigMap::item`] fails with [`ConfigError::MissingKey`] and
/// [`ConfigMap::attr`] fails with [`ConfigError::NoSuchAttribute`], so callers
/// can tell key-style access apart from attribute-style access. Every nested
/// mapping of a [`ConfigValue`] is a `ConfigMap`, so both surfaces are
/// available at any depth.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ConfigMap {
    entries: IndexMap<String, ConfigValue>,
}

impl ConfigMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.entries.contains_key(key)
    }

    pub fn get(&self, key: &str) -> Option<&ConfigValue> {
        self.entries.get(key)
    }

    pub fn get_mut(&mut self, key: &str) -> Option<&mut ConfigValue> {
        self.entries.get_mut(key)
    }

    /// Key-style access.
    pub fn item(&self, key: &str) -> ConfigResult<&ConfigValue> {
        self.entries.get(key).ok_or_else(|| ConfigError::MissingKey {
            key: key.to_string(),
        })
    }

    /// Attribute-style access.
    pub fn attr(&self, name: &str) -> ConfigResult<&ConfigValue> {
        self.entries
            .get(name)
            .ok_or_else(|| ConfigError::NoSuchAttribute {
                type_name: "ConfigMap",
                name: name.to_string(),
            })
    }

    /// Look up a dot-separated path through nested mappings.
    pub fn get_path(&self, dotted: &str) -> Option<&ConfigValue> {
        let mut segments = dotted.split('.');
        let mut current = self.entries.get(segments.next()?)?;
        for segment in segments {
            current = current.as_map()?.get(segment)?;
        }
        Some(current)
    }

    /// Insert or replace a value, keeping the position of an existing key.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ConfigValue>) -> Option<ConfigValue> {
        self.entries.insert(key.into(), value.into())
    }

    /// Remove a key, preserving the order of the remaining entries.
    pub fn remove(&mut self, key: &str) -> Option<ConfigValue> {
        self.entries.shift_remove(key)
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn values(&self) -> impl Iterator<Item = &ConfigValue> {
        self.entries.values()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &ConfigValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }
}

impl FromIterator<(String, ConfigValue)> for ConfigMap {
    fn from_iter<I: IntoIterator<Item = (String, ConfigValue)>>(iter: I) -> Self {
        ConfigMap {
            entries: iter.into_iter().collect(),
        }
    }
}

impl IntoIterator for ConfigMap {
    type Item = (String, ConfigValue);
    type IntoIter = indexmap::map::IntoIter<String, ConfigValue>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

impl Extend<(String, ConfigValue)> for ConfigMap {
    fn extend<I: IntoIterator<Item = (String, ConfigValue)>>(&mut self, iter: I) {
        self.entries.extend(iter);
    }
}

/// Errors that can occur while loading, merging or accessing configuration.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// A config or base file does not exist.
    #[error("file \"{}\" does not exist", path.display())]
    FileNotFound { path: PathBuf },

    /// The file extension is not one of the recognized formats.
    #[error("unsupported config format '{extension}' for {}: only json/yaml/yml/toml are supported", path.display())]
    UnsupportedFormat { path: PathBuf, extension: String },

    #[error("failed to read {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// The document loader rejected the (substituted) text.
    #[error("failed to parse {}: {message}", path.display())]
    DocumentParse { path: PathBuf, message: String },

    #[error("invalid `_base_` in {}: expected a path or a list of paths, found {found}", path.display())]
    InvalidBaseReference { path: PathBuf, found: &'static str },

    /// The same top-level key is defined by more than one sibling base.
    #[error("duplicate key is not allowed among bases of {}: {}", path.display(), keys.join(", "))]
    DuplicateBaseKey { path: PathBuf, keys: Vec<String> },

    /// A base file (transitively) references itself.
    #[error("circular base reference: {}", format_chain(chain))]
    CircularBase { chain: Vec<PathBuf> },

    #[error("base nesting too deep (max depth: {max_depth}) at {}", path.display())]
    BaseDepthExceeded { max_depth: usize, path: PathBuf },

    /// A `{{ _base_.path }}` placeholder does not resolve in the combined base.
    #[error("cannot resolve `{{{{ _base_.{path} }}}}`: key '{segment}' not found in base config (placeholder {placeholder})")]
    MissingBaseKey {
        placeholder: String,
        path: String,
        segment: String,
    },

    /// A child mapping tries to inherit from a base value of another type.
    #[error(
        "{key} is a {child_type} in the child config but is of type {base_type} in base config, \
         so it cannot inherit from base. You may set `{}: true` to ignore the base config",
        DELETE_KEY
    )]
    TypeMismatch {
        key: String,
        child_type: &'static str,
        base_type: &'static str,
    },

    #[error("list index {index} is out of range for a list of length {len}")]
    ListIndexOutOfRange { index: usize, len: usize },

    #[error("key '{key}' cannot be merged into a list; only numeric index keys are allowed")]
    InvalidListKey { key: String },

    /// A top-level key collides with a [`crate::ConfigDocument`] accessor.
    #[error("'{key}' is reserved for config file{}", path.as_ref().map(|p| format!(" ({})", p.display())).unwrap_or_default())]
    ReservedKey { key: String, path: Option<PathBuf> },

    #[error("'{type_name}' has no attribute '{name}'")]
    NoSuchAttribute { type_name: &'static str, name: String },

    #[error("key error: '{key}'")]
    MissingKey { key: String },

    #[error("invalid override '{arg}': {message}")]
    InvalidOverride { arg: String, message: String },

    #[error("cannot dump config as {format}: {message}")]
    DumpUnsupported { format: &'static str, message: String },
}

fn format_chain(chain: &[PathBuf]) -> String {
    chain
        .iter()
        .map(|p| p.display().to_string())
        .collect::<Vec<_>>()
        .join(" -> ")
}
