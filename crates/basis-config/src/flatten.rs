//! Leaf keys of a config, as an argument parser would expose them.

use crate::types::{ConfigMap, ConfigValue, Scalar};
use std::fmt;

/// How a leaf value would be accepted on a command line.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgKind {
    Str,
    Int,
    Float,
    /// A boolean switch.
    Flag,
    /// One or more values of the named element type.
    Many(&'static str),
    /// No command-line form (null or empty sequences).
    Unsupported(&'static str),
}

impl ArgKind {
    pub fn of(value: &ConfigValue) -> Self {
        match value {
            ConfigValue::Scalar(Scalar::String(_)) => ArgKind::Str,
            ConfigValue::Scalar(Scalar::Int(_)) => ArgKind::Int,
            ConfigValue::Scalar(Scalar::Float(_)) => ArgKind::Float,
            ConfigValue::Scalar(Scalar::Bool(_)) => ArgKind::Flag,
            ConfigValue::Array(items) | ConfigValue::Tuple(items) => match items.first() {
                Some(first) => ArgKind::Many(first.type_name()),
                None => ArgKind::Unsupported(value.type_name()),
            },
            other => ArgKind::Unsupported(other.type_name()),
        }
    }
}

impl fmt::Display for ArgKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ArgKind::Str => write!(f, "str"),
            ArgKind::Int => write!(f, "int"),
            ArgKind::Float => write!(f, "float"),
            ArgKind::Flag => write!(f, "flag"),
            ArgKind::Many(element) => write!(f, "{}+", element),
            ArgKind::Unsupported(type_name) => write!(f, "unsupported ({})", type_name),
        }
    }
}

/// A leaf of the config tree.
#[derive(Debug, Clone, PartialEq)]
pub struct FlatKey<'a> {
    /// Dotted path from the root.
    pub key: String,
    pub value: &'a ConfigValue,
}

impl FlatKey<'_> {
    pub fn kind(&self) -> ArgKind {
        ArgKind::of(self.value)
    }
}

/// Collect every non-mapping value with its dotted key, depth first in
/// document order.
pub fn flatten(map: &ConfigMap) -> Vec<FlatKey<'_>> {
    let mut out = Vec::new();
    collect(map, "", &mut out);
    out
}

fn collect<'a>(map: &'a ConfigMap, prefix: &str, out: &mut Vec<FlatKey<'a>>) {
    for (key, value) in map.iter() {
        let full = format!("{}{}", prefix, key);
        match value {
            ConfigValue::Map(child) => collect(child, &format!("{}.", full), out),
            _ => out.push(FlatKey { key: full, value }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flatten_nested() {
        let mut backbone = ConfigMap::new();
        backbone.insert("depth", 50);
        backbone.insert("frozen", false);
        let mut model = ConfigMap::new();
        model.insert("backbone", backbone);
        model.insert("scales", ConfigValue::Array(vec![0.5.into(), 1.0.into()]));
        let mut cfg = ConfigMap::new();
        cfg.insert("name", "exp");
        cfg.insert("model", model);
        cfg.insert("resume", ConfigValue::null());

        let flat = flatten(&cfg);
        let listed: Vec<(String, String)> = flat
            .iter()
            .map(|f| (f.key.clone(), f.kind().to_string()))
            .collect();
        assert_eq!(
            listed,
            vec![
                ("name".to_string(), "str".to_string()),
                ("model.backbone.depth".to_string(), "int".to_string()),
                ("model.backbone.frozen".to_string(), "flag".to_string()),
                ("model.scales".to_string(), "float+".to_string()),
                ("resume".to_string(), "unsupported (null)".to_string()),
            ]
        );
    }

    #[test]
    fn test_empty_mapping_has_no_leaves() {
        let mut cfg = ConfigMap::new();
        cfg.insert("empty", ConfigMap::new());
        assert!(flatten(&cfg).is_empty());
    }
}
