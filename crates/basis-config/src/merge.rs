//! Deep merge of a child mapping over a base value.
//!
//! Merge semantics:
//! - a child mapping is merged recursively into the base mapping at the same key
//! - a child mapping carrying a truthy `_delete_` replaces the base value
//! - arrays, tuples and scalars from the child replace the base value
//! - with list keys enabled, numeric keys address elements of a base array
//!
//! The base is never modified; every merge builds a new value.

use crate::types::{ConfigError, ConfigMap, ConfigResult, ConfigValue, DELETE_KEY};

/// Merge `a` into a copy of `b` and return the result.
///
/// `b` is usually a mapping. With `allow_list_keys`, `b` may also be an array
/// and keys of `a` made of ASCII digits address its elements.
///
/// # Errors
///
/// - [`ConfigError::ListIndexOutOfRange`] if a list key is not below the
///   array length
/// - [`ConfigError::InvalidListKey`] if a key cannot be applied to a
///   non-mapping `b`
/// - [`ConfigError::TypeMismatch`] if a child mapping would inherit from a
///   base value that is not a mapping (or array, with list keys)
pub fn merge_a_into_b(
    a: &ConfigMap,
    b: &ConfigValue,
    allow_list_keys: bool,
) -> ConfigResult<ConfigValue> {
    let mut merged = b.clone();

    for (key, value) in a.iter() {
        match &mut merged {
            ConfigValue::Array(items) if allow_list_keys && is_list_key(key) => {
                merge_list_element(items, key, value, allow_list_keys)?;
            }
            ConfigValue::Map(map) => merge_entry(map, key, value, allow_list_keys)?,
            _ => {
                return Err(ConfigError::InvalidListKey {
                    key: key.to_string(),
                });
            }
        }
    }

    Ok(merged)
}

/// Merge two mappings; convenience form of [`merge_a_into_b`].
pub fn merge_maps(a: &ConfigMap, b: &ConfigMap, allow_list_keys: bool) -> ConfigResult<ConfigMap> {
    let mut merged = b.clone();
    for (key, value) in a.iter() {
        merge_entry(&mut merged, key, value, allow_list_keys)?;
    }
    Ok(merged)
}

fn is_list_key(key: &str) -> bool {
    !key.is_empty() && key.bytes().all(|b| b.is_ascii_digit())
}

fn merge_list_element(
    items: &mut [ConfigValue],
    key: &str,
    value: &ConfigValue,
    allow_list_keys: bool,
) -> ConfigResult<()> {
    let len = items.len();
    let index = key.parse::<usize>().unwrap_or(usize::MAX);
    let Some(slot) = items.get_mut(index) else {
        return Err(ConfigError::ListIndexOutOfRange { index, len });
    };

    *slot = match value {
        ConfigValue::Map(child) => {
            if !slot.is_map() && !slot.is_array() {
                return Err(ConfigError::TypeMismatch {
                    key: key.to_string(),
                    child_type: value.type_name(),
                    base_type: slot.type_name(),
                });
            }
            merge_a_into_b(child, slot, allow_list_keys)?
        }
        other => other.clone(),
    };
    Ok(())
}

fn merge_entry(
    map: &mut ConfigMap,
    key: &str,
    value: &ConfigValue,
    allow_list_keys: bool,
) -> ConfigResult<()> {
    let ConfigValue::Map(child) = value else {
        map.insert(key, value.clone());
        return Ok(());
    };

    let mut child = child.clone();
    let delete = child
        .remove(DELETE_KEY)
        .is_some_and(|flag| flag.is_truthy());

    let existing = match map.get(key) {
        Some(existing) if !delete && existing.is_truthy() => existing,
        _ => {
            map.insert(key, child);
            return Ok(());
        }
    };

    let compatible = existing.is_map() || (allow_list_keys && existing.is_array());
    if !compatible {
        return Err(ConfigError::TypeMismatch {
            key: key.to_string(),
            child_type: value.type_name(),
            base_type: existing.type_name(),
        });
    }

    let merged = merge_a_into_b(&child, existing, allow_list_keys)?;
    map.insert(key, merged);
    Ok(())
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

    fn mv(entries: Vec<(&str, ConfigValue)>) -> ConfigValue {
        ConfigValue::Map(map(entries))
    }

    #[test]
    fn test_empty_child_is_identity() {
        let b = mv(vec![("a", mv(vec![("x", 1.into())])), ("b", 2.into())]);
        assert_eq!(merge_a_into_b(&ConfigMap::new(), &b, false).unwrap(), b);
    }

    #[test]
    fn test_empty_base_takes_child() {
        let a = map(vec![
            ("a", mv(vec![("x", 1.into())])),
            ("l", ConfigValue::Array(vec![1.into()])),
        ]);
        let out = merge_a_into_b(&a, &mv(vec![]), false).unwrap();
        assert_eq!(out, ConfigValue::Map(a));
    }

    #[test]
    fn test_nested_override() {
        let a = map(vec![("a", mv(vec![("x", 2.into())]))]);
        let b = mv(vec![("a", mv(vec![("x", 1.into()), ("y", 3.into())]))]);
        let out = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(out, mv(vec![("a", mv(vec![("x", 2.into()), ("y", 3.into())]))]));
    }

    #[test]
    fn test_delete_replaces_base_mapping() {
        let a = map(vec![(
            "a",
            mv(vec![("_delete_", true.into()), ("x", 2.into())]),
        )]);
        let b = mv(vec![("a", mv(vec![("x", 1.into()), ("y", 3.into())]))]);
        let out = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(out, mv(vec![("a", mv(vec![("x", 2.into())]))]));
    }

    #[test]
    fn test_false_delete_flag_is_dropped() {
        let a = map(vec![(
            "a",
            mv(vec![("_delete_", false.into()), ("x", 2.into())]),
        )]);
        let b = mv(vec![("a", mv(vec![("y", 3.into())]))]);
        let out = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(out, mv(vec![("a", mv(vec![("y", 3.into()), ("x", 2.into())]))]));
    }

    #[test]
    fn test_base_is_not_mutated() {
        let a = map(vec![("a", mv(vec![("x", 2.into())]))]);
        let b = mv(vec![("a", mv(vec![("x", 1.into())]))]);
        let before = b.clone();
        let _ = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(b, before);
    }

    #[test]
    fn test_type_mismatch_against_list() {
        let a = map(vec![("a", mv(vec![("x", 2.into())]))]);
        let b = mv(vec![("a", ConfigValue::Array(vec![1.into(), 2.into()]))]);
        let err = merge_a_into_b(&a, &b, false).unwrap_err();
        assert!(matches!(
            err,
            ConfigError::TypeMismatch { ref key, child_type: "dict", base_type: "list" } if key == "a"
        ));
    }

    #[test]
    fn test_falsy_base_value_is_replaced() {
        let a = map(vec![("a", mv(vec![("x", 2.into())]))]);
        let b = mv(vec![("a", 0.into())]);
        let out = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(out, mv(vec![("a", mv(vec![("x", 2.into())]))]));
    }

    #[test]
    fn test_sequences_replace() {
        let a = map(vec![
            ("l", ConfigValue::Array(vec![9.into()])),
            ("t", ConfigValue::Tuple(vec![1.into(), 2.into()])),
        ]);
        let b = mv(vec![
            ("l", ConfigValue::Array(vec![1.into(), 2.into(), 3.into()])),
            ("t", ConfigValue::Tuple(vec![5.into()])),
        ]);
        let out = merge_a_into_b(&a, &b, false).unwrap();
        assert_eq!(out, ConfigValue::Map(a));
    }

    #[test]
    fn test_list_keys_merge_into_array() {
        let a = map(vec![("0", mv(vec![("a", 2.into())]))]);
        let b = ConfigValue::Array(vec![mv(vec![("a", 1.into())]), mv(vec![("b", 2.into())])]);
        let out = merge_a_into_b(&a, &b, true).unwrap();
        assert_eq!(
            out,
            ConfigValue::Array(vec![mv(vec![("a", 2.into())]), mv(vec![("b", 2.into())])])
        );
    }

    #[test]
    fn test_list_key_out_of_range() {
        let a = map(vec![("5", mv(vec![("a", 1.into())]))]);
        let b = ConfigValue::Array(vec![1.into(), 2.into()]);
        let err = merge_a_into_b(&a, &b, true).unwrap_err();
        assert!(matches!(err, ConfigError::ListIndexOutOfRange { index: 5, len: 2 }));
    }

    #[test]
    fn test_list_key_index_equal_to_len_is_out_of_range() {
        let a = map(vec![("2", 7.into())]);
        let b = ConfigValue::Array(vec![1.into(), 2.into()]);
        assert!(merge_a_into_b(&a, &b, true).is_err());
    }

    #[test]
    fn test_list_key_scalar_replaces_element() {
        let a = map(vec![("1", 7.into())]);
        let b = ConfigValue::Array(vec![1.into(), 2.into()]);
        assert_eq!(
            merge_a_into_b(&a, &b, true).unwrap(),
            ConfigValue::Array(vec![1.into(), 7.into()])
        );
    }

    #[test]
    fn test_nested_list_keys_through_mapping() {
        let a = map(vec![("layers", mv(vec![("1", mv(vec![("size", 64.into())]))]))]);
        let b = mv(vec![(
            "layers",
            ConfigValue::Array(vec![
                mv(vec![("size", 8.into())]),
                mv(vec![("size", 16.into()), ("act", "relu".into())]),
            ]),
        )]);
        let out = merge_a_into_b(&a, &b, true).unwrap();
        let out = out.as_map().unwrap();
        let layers = out.get("layers").unwrap().as_array().unwrap();
        assert_eq!(layers[1].as_map().unwrap().get("size").unwrap().as_i64(), Some(64));
        assert_eq!(layers[1].as_map().unwrap().get("act").unwrap().as_str(), Some("relu"));
    }

    #[test]
    fn test_non_numeric_key_into_array() {
        let a = map(vec![("x", 1.into())]);
        let b = ConfigValue::Array(vec![1.into()]);
        let err = merge_a_into_b(&a, &b, true).unwrap_err();
        assert!(matches!(err, ConfigError::InvalidListKey { ref key } if key == "x"));
    }

    #[test]
    fn test_merge_maps() {
        let a = map(vec![("lr", 0.01.into())]);
        let b = map(vec![("lr", 0.1.into()), ("epochs", 12.into())]);
        let out = merge_maps(&a, &b, false).unwrap();
        assert_eq!(out.keys().collect::<Vec<_>>(), vec!["lr", "epochs"]);
        assert_eq!(out.get("lr").unwrap().as_f64(), Some(0.01));
    }
}
