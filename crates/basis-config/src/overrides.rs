//! Command-line style overrides: `model.backbone.depth=101`.
//!
//! Keys are dotted paths. They are expanded into nested mappings and merged
//! over the config with list keys enabled, so `layers.0.size=64` changes the
//! first element of the `layers` array.

use crate::merge::merge_maps;
use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue};
use crate::yaml::parse_yaml;

/// Merge dotted-key `options` over `map`.
///
/// # Errors
///
/// Fails if a key is empty or passes through a non-mapping option, or with
/// any merge error (out-of-range list index, type mismatch).
pub fn apply_overrides(map: &ConfigMap, options: &ConfigMap) -> ConfigResult<ConfigMap> {
    let expanded = expand_dotted_keys(options)?;
    merge_maps(&expanded, map, true)
}

/// Turn `{"a.b.c": v}` into `{"a": {"b": {"c": v}}}`.
///
/// Keys sharing a prefix end up in the same nested mapping.
pub fn expand_dotted_keys(options: &ConfigMap) -> ConfigResult<ConfigMap> {
    let mut expanded = ConfigMap::new();
    for (key, value) in options.iter() {
        insert_dotted(&mut expanded, key, key, value.clone())?;
    }
    Ok(expanded)
}

fn insert_dotted(
    map: &mut ConfigMap,
    full_key: &str,
    key: &str,
    value: ConfigValue,
) -> ConfigResult<()> {
    let invalid = |message: &str| ConfigError::InvalidOverride {
        arg: full_key.to_string(),
        message: message.to_string(),
    };

    let (head, rest) = match key.split_once('.') {
        Some((head, rest)) => (head, Some(rest)),
        None => (key, None),
    };
    if head.is_empty() {
        return Err(invalid("empty key segment"));
    }

    let Some(rest) = rest else {
        map.insert(head, value);
        return Ok(());
    };

    if !map.contains_key(head) {
        map.insert(head, ConfigMap::new());
    }
    match map.get_mut(head) {
        Some(ConfigValue::Map(child)) => insert_dotted(child, full_key, rest, value),
        _ => Err(invalid(&format!("'{}' is already set to a non-mapping value", head))),
    }
}

/// Parse a `KEY=VALUE` override.
///
/// The value is read as YAML, so `8`, `0.5`, `true`, `null`, `[1, 2]` and
/// `{a: 1}` get their natural types. `(1, 2)` becomes a tuple. Anything that
/// does not parse is kept as a string.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidOverride`] when there is no `=` or the key
/// is empty.
pub fn parse_override(arg: &str) -> ConfigResult<(String, ConfigValue)> {
    let invalid = |message: &str| ConfigError::InvalidOverride {
        arg: arg.to_string(),
        message: message.to_string(),
    };

    let (key, raw) = arg
        .split_once('=')
        .ok_or_else(|| invalid("expected KEY=VALUE"))?;
    let key = key.trim();
    if key.is_empty() {
        return Err(invalid("empty key"));
    }

    Ok((key.to_string(), parse_override_value(raw.trim())))
}

/// Parse a list of `KEY=VALUE` overrides into a dotted-key option map.
pub fn parse_overrides<S: AsRef<str>>(args: &[S]) -> ConfigResult<ConfigMap> {
    let mut options = ConfigMap::new();
    for arg in args {
        let (key, value) = parse_override(arg.as_ref())?;
        options.insert(key, value);
    }
    Ok(options)
}

fn parse_override_value(raw: &str) -> ConfigValue {
    if let Some(inner) = raw.strip_prefix('(').and_then(|r| r.strip_suffix(')')) {
        if let Ok(Some(ConfigValue::Array(items))) = parse_yaml(&format!("[{}]", inner)) {
            return ConfigValue::Tuple(items);
        }
    }

    // Only flow collections may produce containers; `foo: bar` stays text.
    let flow = raw
        .trim_start_matches("!tuple")
        .trim_start()
        .starts_with(['[', '{']);
    match parse_yaml(raw) {
        Ok(Some(value)) if flow || value.is_scalar() => value,
        _ => ConfigValue::string(raw),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn options(entries: Vec<(&str, ConfigValue)>) -> ConfigMap {
        entries
            .into_iter()
            .map(|(k, v)| (k.to_string(), v))
            .collect()
    }

    #[test]
    fn test_parse_override_types() {
        assert_eq!(parse_override("a=8").unwrap(), ("a".into(), 8.into()));
        assert_eq!(parse_override("a.b = 0.5").unwrap().1, 0.5.into());
        assert_eq!(parse_override("flag=true").unwrap().1, true.into());
        assert_eq!(
            parse_override("ids=[1, 2]").unwrap().1,
            ConfigValue::Array(vec![1.into(), 2.into()])
        );
        assert_eq!(
            parse_override("size=(256,128)").unwrap().1,
            ConfigValue::Tuple(vec![256.into(), 128.into()])
        );
        assert_eq!(parse_override("name=resnet").unwrap().1, "resnet".into());
        assert_eq!(parse_override("name=").unwrap().1, "".into());
        assert_eq!(parse_override("bad=[1,").unwrap().1, "[1,".into());
    }

    #[test]
    fn test_parse_override_block_syntax_stays_text() {
        assert_eq!(parse_override("name=foo: bar").unwrap().1, "foo: bar".into());
        assert_eq!(parse_override("item=- a").unwrap().1, "- a".into());
        assert_eq!(
            parse_override("opt={type: SGD}").unwrap().1,
            ConfigValue::Map([("type".to_string(), "SGD".into())].into_iter().collect())
        );
        assert_eq!(
            parse_override("size=!tuple [1, 2]").unwrap().1,
            ConfigValue::Tuple(vec![1.into(), 2.into()])
        );
    }

    #[test]
    fn test_parse_override_requires_key() {
        assert!(matches!(
            parse_override("novalue"),
            Err(ConfigError::InvalidOverride { .. })
        ));
        assert!(parse_override("=1").is_err());
    }

    #[test]
    fn test_expand_dotted_keys_groups_prefixes() {
        let expanded = expand_dotted_keys(&options(vec![
            ("model.backbone.depth", 101.into()),
            ("model.backbone.frozen", true.into()),
            ("lr", 0.01.into()),
        ]))
        .unwrap();
        assert_eq!(expanded.keys().collect::<Vec<_>>(), vec!["model", "lr"]);
        let backbone = expanded.get_path("model.backbone").unwrap().as_map().unwrap();
        assert_eq!(backbone.len(), 2);
    }

    #[test]
    fn test_expand_rejects_conflicting_prefix() {
        let err = expand_dotted_keys(&options(vec![("a", 1.into()), ("a.b", 2.into())]))
            .unwrap_err();
        assert!(matches!(err, ConfigError::InvalidOverride { ref arg, .. } if arg == "a.b"));
    }

    #[test]
    fn test_apply_overrides_with_list_index() {
        let mut layer0 = ConfigMap::new();
        layer0.insert("size", 8);
        let mut layer1 = ConfigMap::new();
        layer1.insert("size", 16);
        let mut cfg = ConfigMap::new();
        cfg.insert("layers", ConfigValue::Array(vec![layer0.into(), layer1.into()]));
        cfg.insert("lr", 0.1);

        let out = apply_overrides(
            &cfg,
            &options(vec![("layers.1.size", 64.into()), ("lr", 0.01.into())]),
        )
        .unwrap();

        let layers = out.get("layers").unwrap().as_array().unwrap();
        assert_eq!(layers[0].as_map().unwrap().get("size").unwrap().as_i64(), Some(8));
        assert_eq!(layers[1].as_map().unwrap().get("size").unwrap().as_i64(), Some(64));
        assert_eq!(out.get("lr").unwrap().as_f64(), Some(0.01));
        // Original untouched
        assert_eq!(cfg.get("lr").unwrap().as_f64(), Some(0.1));
    }
}
