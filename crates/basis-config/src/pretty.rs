//! Deterministic rendering of a config as Python-literal source.
//!
//! ```text
//! model = dict(type='ResNet', depth=50, stages=(3, 4, 6, 3))
//! optimizer = dict(type='SGD', lr=0.1)
//! ```
//!
//! Mappings render as `dict(k=v)`, or `{'k': v}` when some key is not a valid
//! identifier. Containers that fit in [`MAX_WIDTH`] columns stay on one line;
//! longer ones put each item on its own line, indented by [`INDENT`].

use crate::types::{ConfigMap, ConfigValue, Scalar};
use regex::Regex;
use std::sync::LazyLock;

pub const MAX_WIDTH: usize = 79;
pub const INDENT: usize = 4;

static IDENTIFIER_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z_][A-Za-z0-9_]*$").unwrap());

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Render a whole config, one `key = value` statement per top-level entry.
///
/// When a top-level key is not a valid identifier the config is rendered as
/// a single mapping literal instead.
pub fn pretty_text(map: &ConfigMap) -> String {
    if !uses_dict_call(map) {
        let mut out = render(&ConfigValue::Map(map.clone()), 0, 0);
        out.push('\n');
        return out;
    }

    let mut out = String::new();
    for (key, value) in map.iter() {
        let prefix = format!("{} = ", key);
        out.push_str(&prefix);
        out.push_str(&render(value, 0, width(&prefix)));
        out.push('\n');
    }
    out
}

/// Render a single value on as few lines as fit.
pub fn format_value(value: &ConfigValue) -> String {
    render(value, 0, 0)
}

/// Display columns taken by `text`.
fn width(text: &str) -> usize {
    text.chars().count()
}

fn is_identifier(key: &str) -> bool {
    IDENTIFIER_REGEX.is_match(key) && !KEYWORDS.contains(&key)
}

/// Render `value` at nesting `indent`, with `used` columns already taken on
/// the current line.
fn render(value: &ConfigValue, indent: usize, used: usize) -> String {
    let flat = render_flat(value);
    if used + width(&flat) <= MAX_WIDTH || !has_items(value) {
        return flat;
    }

    let (open, close) = delimiters(value);
    let inner = indent + INDENT;
    let pad = " ".repeat(inner);

    let mut out = String::from(open);
    out.push('\n');
    for (prefix, item) in item_prefixes(value) {
        let rendered = render(item, inner, inner + width(&prefix) + 1);
        out.push_str(&format!("{}{}{},\n", pad, prefix, rendered));
    }
    out.push_str(&" ".repeat(indent));
    out.push_str(close);
    out
}

fn render_flat(value: &ConfigValue) -> String {
    match value {
        ConfigValue::Scalar(scalar) => render_scalar(scalar),
        ConfigValue::Tuple(items) if items.len() == 1 => {
            format!("({},)", render_flat(&items[0]))
        }
        _ => {
            let (open, close) = delimiters(value);
            let items: Vec<String> = item_prefixes(value)
                .into_iter()
                .map(|(prefix, item)| format!("{}{}", prefix, render_flat(item)))
                .collect();
            format!("{}{}{}", open, items.join(", "), close)
        }
    }
}

fn render_scalar(scalar: &Scalar) -> String {
    match scalar {
        Scalar::Null => "None".to_string(),
        Scalar::Bool(true) => "True".to_string(),
        Scalar::Bool(false) => "False".to_string(),
        Scalar::Int(i) => i.to_string(),
        Scalar::Float(f) if f.is_nan() => "float('nan')".to_string(),
        Scalar::Float(f) if f.is_infinite() => {
            if *f > 0.0 {
                "float('inf')".to_string()
            } else {
                "float('-inf')".to_string()
            }
        }
        // Debug keeps a decimal point on integral values ("1.0")
        Scalar::Float(f) => format!("{:?}", f),
        Scalar::String(s) => quote(s),
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('\'');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\'' => out.push_str("\\'"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c => out.push(c),
        }
    }
    out.push('\'');
    out
}

fn has_items(value: &ConfigValue) -> bool {
    match value {
        ConfigValue::Scalar(_) => false,
        ConfigValue::Array(items) | ConfigValue::Tuple(items) => !items.is_empty(),
        ConfigValue::Map(map) => !map.is_empty(),
    }
}

fn uses_dict_call(map: &ConfigMap) -> bool {
    map.keys().all(is_identifier)
}

fn delimiters(value: &ConfigValue) -> (&'static str, &'static str) {
    match value {
        ConfigValue::Tuple(_) => ("(", ")"),
        ConfigValue::Map(map) if uses_dict_call(map) => ("dict(", ")"),
        ConfigValue::Map(_) => ("{", "}"),
        _ => ("[", "]"),
    }
}

/// Each item of a container with the text that precedes it (`k=`, `'k': `).
fn item_prefixes(value: &ConfigValue) -> Vec<(String, &ConfigValue)> {
    match value {
        ConfigValue::Scalar(_) => Vec::new(),
        ConfigValue::Array(items) | ConfigValue::Tuple(items) => {
            items.iter().map(|item| (String::new(), item)).collect()
        }
        ConfigValue::Map(map) if uses_dict_call(map) => map
            .iter()
            .map(|(k, v)| (format!("{}=", k), v))
            .collect(),
        ConfigValue::Map(map) => map
            .iter()
            .map(|(k, v)| (format!("{}: ", quote(k)), v))
            .collect(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn map(entries: Vec<(&str, ConfigValue)>) -> ConfigMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_scalars() {
        assert_eq!(format_value(&ConfigValue::null()), "None");
        assert_eq!(format_value(&true.into()), "True");
        assert_eq!(format_value(&3.into()), "3");
        assert_eq!(format_value(&1.0.into()), "1.0");
        assert_eq!(format_value(&0.1.into()), "0.1");
        assert_eq!(format_value(&f64::INFINITY.into()), "float('inf')");
        assert_eq!(format_value(&"it's".into()), r"'it\'s'");
    }

    #[test]
    fn test_containers_flat() {
        assert_eq!(
            format_value(&ConfigValue::Tuple(vec![1.into()])),
            "(1,)"
        );
        assert_eq!(
            format_value(&ConfigValue::Array(vec![1.into(), "a".into()])),
            "[1, 'a']"
        );
        assert_eq!(format_value(&ConfigValue::Array(vec![])), "[]");
        assert_eq!(format_value(&ConfigValue::Map(ConfigMap::new())), "dict()");
    }

    #[test]
    fn test_dict_call_vs_literal() {
        let m = ConfigValue::Map(map(vec![("type", "BN".into()), ("requires_grad", true.into())]));
        assert_eq!(format_value(&m), "dict(type='BN', requires_grad=True)");

        let m = ConfigValue::Map(map(vec![("0", 1.into()), ("a", 2.into())]));
        assert_eq!(format_value(&m), "{'0': 1, 'a': 2}");

        let m = ConfigValue::Map(map(vec![("class", 1.into())]));
        assert_eq!(format_value(&m), "{'class': 1}");
    }

    #[test]
    fn test_pretty_text_short() {
        let cfg = map(vec![
            ("model", ConfigValue::Map(map(vec![("type", "ResNet".into()), ("depth", 50.into())]))),
            ("lr", 0.1.into()),
        ]);
        assert_eq!(
            pretty_text(&cfg),
            "model = dict(type='ResNet', depth=50)\nlr = 0.1\n"
        );
    }

    #[test]
    fn test_pretty_text_wraps_long_lines() {
        let backbone = ConfigValue::Map(map(vec![
            ("type", "ResNet".into()),
            ("depth", 50.into()),
            ("out_indices", ConfigValue::Tuple(vec![0.into(), 1.into(), 2.into(), 3.into()])),
            ("norm_cfg", ConfigValue::Map(map(vec![("type", "BN".into()), ("requires_grad", true.into())]))),
        ]));
        let cfg = map(vec![("model", ConfigValue::Map(map(vec![("backbone", backbone)])))]);

        let expected = "\
model = dict(
    backbone=dict(
        type='ResNet',
        depth=50,
        out_indices=(0, 1, 2, 3),
        norm_cfg=dict(type='BN', requires_grad=True),
    ),
)
";
        assert_eq!(pretty_text(&cfg), expected);
        for line in pretty_text(&cfg).lines() {
            assert!(line.len() <= MAX_WIDTH);
        }
    }

    #[test]
    fn test_pretty_text_non_identifier_top_level_keys() {
        let cfg = map(vec![("my-key", 1.into()), ("class", "x".into())]);
        assert_eq!(pretty_text(&cfg), "{'my-key': 1, 'class': 'x'}\n");

        let (a, b) = ("a".repeat(35), "b".repeat(35));
        let cfg = map(vec![("0", a.as_str().into()), ("b", b.as_str().into())]);
        let expected = format!("{{\n    '0': '{}',\n    'b': '{}',\n}}\n", a, b);
        assert_eq!(pretty_text(&cfg), expected);
    }

    #[test]
    fn test_width_counts_characters() {
        // 71 columns, 131 bytes
        let name = "é".repeat(60);
        let cfg = map(vec![("name", ConfigValue::Array(vec![name.as_str().into()]))]);
        assert_eq!(pretty_text(&cfg), format!("name = ['{}']\n", name));
    }
}
