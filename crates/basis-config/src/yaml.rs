//! YAML parser that builds `ConfigValue` trees directly from parser events.
//!
//! Differences from a plain `YamlLoader` pass:
//! - only plain (unquoted) scalars are type-inferred, so `"42"` stays a string
//! - a `!tuple` tag on a sequence produces [`ConfigValue::Tuple`]
//! - anchors are remembered and aliases resolve to a copy of the anchored node
//! - mapping keys must be scalars and must be unique

use crate::types::{ConfigMap, ConfigValue, Scalar};
use std::collections::HashMap;
use yaml_rust2::parser::{Event, MarkedEventReceiver, Parser};
use yaml_rust2::scanner::{Marker, TScalarStyle};

/// Tag suffix that turns a sequence into a tuple (`!tuple [1, 2]`).
pub const TUPLE_TAG: &str = "tuple";

/// Parse the first YAML document in `content`.
///
/// Returns `Ok(None)` for an empty document.
///
/// # Errors
///
/// Returns a message describing the syntax or structure problem, prefixed with
/// the line and column where it was detected.
pub fn parse_yaml(content: &str) -> Result<Option<ConfigValue>, String> {
    let mut parser = Parser::new_from_str(content);
    let mut builder = ValueBuilder::default();

    parser
        .load(&mut builder, false) // false = single document only
        .map_err(|e| e.to_string())?;

    builder.result()
}

/// A node being constructed during parsing.
enum BuildNode {
    Sequence {
        anchor_id: usize,
        tuple: bool,
        items: Vec<ConfigValue>,
    },
    Mapping {
        anchor_id: usize,
        entries: ConfigMap,
        pending_key: Option<String>,
    },
}

#[derive(Default)]
struct ValueBuilder {
    /// Stack of nodes being constructed
    stack: Vec<BuildNode>,
    /// The completed root node
    root: Option<ConfigValue>,
    /// Completed nodes by anchor id
    anchors: HashMap<usize, ConfigValue>,
    /// First structural error; later events are ignored once set
    error: Option<String>,
}

impl ValueBuilder {
    fn result(self) -> Result<Option<ConfigValue>, String> {
        match self.error {
            Some(error) => Err(error),
            None => Ok(self.root),
        }
    }

    fn fail(&mut self, marker: &Marker, message: impl Into<String>) {
        if self.error.is_none() {
            self.error = Some(format!(
                "{} at line {} column {}",
                message.into(),
                marker.line(),
                marker.col() + 1
            ));
        }
    }

    fn push_complete(&mut self, node: ConfigValue, anchor_id: usize, marker: &Marker) {
        if anchor_id > 0 {
            self.anchors.insert(anchor_id, node.clone());
        }

        let Some(parent) = self.stack.last_mut() else {
            self.root = Some(node);
            return;
        };

        let error = match parent {
            BuildNode::Sequence { items, .. } => {
                items.push(node);
                None
            }
            BuildNode::Mapping {
                entries,
                pending_key,
                ..
            } => match pending_key.take() {
                Some(key) if entries.contains_key(&key) => {
                    Some(format!("duplicate key '{}'", key))
                }
                Some(key) => {
                    entries.insert(key, node);
                    None
                }
                None => match scalar_key(&node) {
                    Some(key) => {
                        *pending_key = Some(key);
                        None
                    }
                    None => Some(format!(
                        "mapping keys must be scalars, found {}",
                        node.type_name()
                    )),
                },
            },
        };

        if let Some(message) = error {
            self.fail(marker, message);
        }
    }
}

impl MarkedEventReceiver for ValueBuilder {
    fn on_event(&mut self, ev: Event, marker: Marker) {
        if self.error.is_some() {
            return;
        }

        match ev {
            Event::Nothing
            | Event::StreamStart
            | Event::StreamEnd
            | Event::DocumentStart
            | Event::DocumentEnd => {}

            Event::Scalar(value, style, anchor_id, tag) => {
                let node = if tag.is_none() && matches!(style, TScalarStyle::Plain) {
                    infer_plain_scalar(&value)
                } else {
                    ConfigValue::string(value)
                };
                self.push_complete(node, anchor_id, &marker);
            }

            Event::SequenceStart(anchor_id, tag) => {
                let tuple = tag.is_some_and(|t| t.suffix == TUPLE_TAG);
                self.stack.push(BuildNode::Sequence {
                    anchor_id,
                    tuple,
                    items: Vec::new(),
                });
            }

            Event::SequenceEnd => match self.stack.pop() {
                Some(BuildNode::Sequence {
                    anchor_id,
                    tuple,
                    items,
                }) => {
                    let node = if tuple {
                        ConfigValue::Tuple(items)
                    } else {
                        ConfigValue::Array(items)
                    };
                    self.push_complete(node, anchor_id, &marker);
                }
                _ => self.fail(&marker, "unexpected end of sequence"),
            },

            Event::MappingStart(anchor_id, _tag) => {
                self.stack.push(BuildNode::Mapping {
                    anchor_id,
                    entries: ConfigMap::new(),
                    pending_key: None,
                });
            }

            Event::MappingEnd => match self.stack.pop() {
                Some(BuildNode::Mapping {
                    anchor_id, entries, ..
                }) => {
                    self.push_complete(ConfigValue::Map(entries), anchor_id, &marker);
                }
                _ => self.fail(&marker, "unexpected end of mapping"),
            },

            Event::Alias(anchor_id) => match self.anchors.get(&anchor_id).cloned() {
                Some(node) => self.push_complete(node, 0, &marker),
                None => self.fail(&marker, "alias refers to an unknown anchor"),
            },
        }
    }
}

/// The string form of a scalar used as a mapping key.
fn scalar_key(node: &ConfigValue) -> Option<String> {
    match node {
        ConfigValue::Scalar(Scalar::String(s)) => Some(s.clone()),
        ConfigValue::Scalar(Scalar::Int(i)) => Some(i.to_string()),
        ConfigValue::Scalar(Scalar::Float(f)) => Some(f.to_string()),
        ConfigValue::Scalar(Scalar::Bool(b)) => Some(b.to_string()),
        ConfigValue::Scalar(Scalar::Null) => Some("null".to_string()),
        _ => None,
    }
}

/// Infer the type of a plain scalar: integer, float, boolean, null or string.
fn infer_plain_scalar(value: &str) -> ConfigValue {
    match value {
        "true" | "True" | "TRUE" | "yes" | "Yes" | "YES" | "on" | "On" | "ON" => {
            return ConfigValue::from(true);
        }
        "false" | "False" | "FALSE" | "no" | "No" | "NO" | "off" | "Off" | "OFF" => {
            return ConfigValue::from(false);
        }
        "null" | "Null" | "NULL" | "~" | "" => return ConfigValue::null(),
        ".inf" | ".Inf" | ".INF" | "+.inf" | "+.Inf" | "+.INF" => {
            return ConfigValue::from(f64::INFINITY);
        }
        "-.inf" | "-.Inf" | "-.INF" => return ConfigValue::from(f64::NEG_INFINITY),
        ".nan" | ".NaN" | ".NAN" => return ConfigValue::from(f64::NAN),
        _ => {}
    }

    if let Ok(i) = value.parse::<i64>() {
        return ConfigValue::from(i);
    }

    // Rust accepts "inf" and "NaN" as floats, YAML does not.
    let numeric_start = value
        .trim_start_matches(['+', '-'])
        .starts_with(|c: char| c.is_ascii_digit() || c == '.');
    if numeric_start && value.contains(|c: char| c.is_ascii_digit()) {
        if let Ok(f) = value.parse::<f64>() {
            return ConfigValue::from(f);
        }
    }

    ConfigValue::string(value)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse_map(content: &str) -> ConfigMap {
        match parse_yaml(content).unwrap() {
            Some(ConfigValue::Map(map)) => map,
            other => panic!("expected map, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_scalars() {
        let m = parse_map("i: 42\nf: 1.5e-3\nb: true\nn: ~\ns: hello\nq: \"42\"\nsq: 'true'");
        assert_eq!(m.get("i").unwrap().as_i64(), Some(42));
        assert_eq!(m.get("f").unwrap().as_f64(), Some(1.5e-3));
        assert_eq!(m.get("b").unwrap().as_bool(), Some(true));
        assert!(m.get("n").unwrap().is_null());
        assert_eq!(m.get("s").unwrap().as_str(), Some("hello"));
        assert_eq!(m.get("q").unwrap().as_str(), Some("42"));
        assert_eq!(m.get("sq").unwrap().as_str(), Some("true"));
    }

    #[test]
    fn test_inf_words_stay_strings() {
        let m = parse_map("a: inf\nb: NaN\nc: .inf");
        assert_eq!(m.get("a").unwrap().as_str(), Some("inf"));
        assert_eq!(m.get("b").unwrap().as_str(), Some("NaN"));
        assert_eq!(m.get("c").unwrap().as_f64(), Some(f64::INFINITY));
    }

    #[test]
    fn test_parse_nested_structure_keeps_order() {
        let m = parse_map(
            r#"
model:
  type: ResNet
  depth: 50
  stages:
    - 3
    - 4
optimizer:
  lr: 0.1
"#,
        );
        assert_eq!(m.keys().collect::<Vec<_>>(), vec!["model", "optimizer"]);
        let model = m.get("model").unwrap().as_map().unwrap();
        assert_eq!(model.keys().collect::<Vec<_>>(), vec!["type", "depth", "stages"]);
        assert_eq!(
            model.get("stages").unwrap(),
            &ConfigValue::Array(vec![3.into(), 4.into()])
        );
    }

    #[test]
    fn test_tuple_tag() {
        let m = parse_map("size: !tuple [256, 256]\nscale: [1, 2]");
        assert_eq!(
            m.get("size").unwrap(),
            &ConfigValue::Tuple(vec![256.into(), 256.into()])
        );
        assert!(m.get("scale").unwrap().is_array());
    }

    #[test]
    fn test_anchor_and_alias() {
        let m = parse_map("base: &norm\n  type: BN\nhead:\n  norm: *norm");
        assert_eq!(m.get_path("head.norm.type").unwrap().as_str(), Some("BN"));
    }

    #[test]
    fn test_duplicate_key_is_error() {
        let err = parse_yaml("a: 1\na: 2").unwrap_err();
        assert!(err.contains("duplicate key 'a'"), "{err}");
    }

    #[test]
    fn test_integer_keys_become_strings() {
        let m = parse_map("1: one\n2: two");
        assert_eq!(m.get("1").unwrap().as_str(), Some("one"));
    }

    #[test]
    fn test_empty_document() {
        assert!(parse_yaml("").unwrap().is_none());
        assert!(parse_yaml("# only a comment\n").unwrap().is_none());
    }

    #[test]
    fn test_syntax_error() {
        assert!(parse_yaml("a: [1, 2").is_err());
    }
}
