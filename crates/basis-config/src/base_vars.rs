//! Cross-file `{{ _base_.path }}` variables.
//!
//! A child config may reference values of its (not yet loaded) base configs:
//!
//! ```yaml
//! _base_: ./base.yaml
//! model:
//!   channels: {{ _base_.model.width }}
//! ```
//!
//! Before the document is parsed, each distinct referenced path is replaced by
//! a quoted opaque token (see [`extract_base_vars`]). Once the bases have been
//! loaded, [`substitute_base_vars`] swaps every token back for the value found
//! at that path in the combined base, so the child receives the real value
//! with its original type rather than a string.

use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue, Scalar};
use indexmap::IndexMap;
use regex::{Captures, Regex};
use std::collections::HashMap;
use std::sync::LazyLock;
use uuid::Uuid;

static BASE_VAR_REGEX: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\{\{\s*_base_\.([\w.]+)\s*\}\}").unwrap());

/// Length of the random suffix appended to generated tokens.
const TOKEN_SUFFIX_LEN: usize = 6;

/// Mapping from generated tokens to the dotted base paths they stand for.
#[derive(Debug, Clone, Default)]
pub struct PlaceholderMap {
    /// token -> dotted path, in order of first appearance
    tokens: IndexMap<String, String>,
    /// dotted path -> token
    paths: HashMap<String, String>,
}

impl PlaceholderMap {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// The dotted path a token stands for.
    pub fn path(&self, token: &str) -> Option<&str> {
        self.tokens.get(token).map(String::as_str)
    }

    /// The token generated for a dotted path.
    pub fn token(&self, path: &str) -> Option<&str> {
        self.paths.get(path).map(String::as_str)
    }

    /// Iterate over (token, path) pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.tokens.iter().map(|(t, p)| (t.as_str(), p.as_str()))
    }

    /// Return the token for `path`, generating one on first use.
    ///
    /// Generated tokens never occur in `text` and never repeat.
    fn token_for(&mut self, path: &str, text: &str) -> String {
        if let Some(token) = self.paths.get(path) {
            return token.clone();
        }
        let token = loop {
            let suffix = Uuid::new_v4().simple().to_string();
            let candidate = format!("_{}_{}", path, &suffix[..TOKEN_SUFFIX_LEN]);
            if !text.contains(&candidate) && !self.tokens.contains_key(&candidate) {
                break candidate;
            }
        };
        self.tokens.insert(token.clone(), path.to_string());
        self.paths.insert(path.to_string(), token.clone());
        token
    }
}

/// Replace each `{{ _base_.path }}` placeholder with a quoted token.
///
/// Returns the rewritten text and the token map. Text without base
/// placeholders comes back unchanged with an empty map.
pub fn extract_base_vars(text: &str) -> (String, PlaceholderMap) {
    let mut placeholders = PlaceholderMap::new();
    let rewritten = BASE_VAR_REGEX
        .replace_all(text, |caps: &Captures| {
            let token = placeholders.token_for(&caps[1], text);
            format!("\"{}\"", token)
        })
        .into_owned();
    (rewritten, placeholders)
}

/// Replace every token in `value` with the value it refers to in `base`.
///
/// The input is not modified; mappings, arrays and tuples are rebuilt with the
/// same shape. Only string scalars that exactly equal a token are replaced.
///
/// # Errors
///
/// Returns [`ConfigError::MissingBaseKey`] if a token's path does not resolve
/// inside `base`.
pub fn substitute_base_vars(
    value: &ConfigValue,
    placeholders: &PlaceholderMap,
    base: &ConfigMap,
) -> ConfigResult<ConfigValue> {
    match value {
        ConfigValue::Scalar(Scalar::String(s)) => match placeholders.path(s) {
            Some(path) => lookup_base_path(s, path, base),
            None => Ok(value.clone()),
        },
        ConfigValue::Scalar(_) => Ok(value.clone()),
        ConfigValue::Array(items) => Ok(ConfigValue::Array(
            substitute_items(items, placeholders, base)?,
        )),
        ConfigValue::Tuple(items) => Ok(ConfigValue::Tuple(
            substitute_items(items, placeholders, base)?,
        )),
        ConfigValue::Map(map) => Ok(ConfigValue::Map(substitute_base_vars_in_map(
            map,
            placeholders,
            base,
        )?)),
    }
}

/// Map-level form of [`substitute_base_vars`].
pub fn substitute_base_vars_in_map(
    map: &ConfigMap,
    placeholders: &PlaceholderMap,
    base: &ConfigMap,
) -> ConfigResult<ConfigMap> {
    if placeholders.is_empty() {
        return Ok(map.clone());
    }
    map.iter()
        .map(|(k, v)| Ok((k.to_string(), substitute_base_vars(v, placeholders, base)?)))
        .collect()
}

fn substitute_items(
    items: &[ConfigValue],
    placeholders: &PlaceholderMap,
    base: &ConfigMap,
) -> ConfigResult<Vec<ConfigValue>> {
    items
        .iter()
        .map(|item| substitute_base_vars(item, placeholders, base))
        .collect()
}

fn lookup_base_path(token: &str, path: &str, base: &ConfigMap) -> ConfigResult<ConfigValue> {
    let missing = |segment: &str| ConfigError::MissingBaseKey {
        placeholder: token.to_string(),
        path: path.to_string(),
        segment: segment.to_string(),
    };

    let mut current = base;
    let mut segments = path.split('.').peekable();
    while let Some(segment) = segments.next() {
        let value = current.get(segment).ok_or_else(|| missing(segment))?;
        if segments.peek().is_none() {
            return Ok(value.clone());
        }
        current = match value.as_map() {
            Some(map) => map,
            None => return Err(missing(segments.peek().copied().unwrap_or(segment))),
        };
    }
    Err(missing(path))
}
