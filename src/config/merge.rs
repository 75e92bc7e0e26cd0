// src/config/merge.rs

//! Deep merge of caller-supplied options over the built-in defaults.
//!
//! The merge is leaf-by-leaf: tables recurse, while any other value
//! (including arrays) replaces the corresponding default wholesale. The
//! result is a complete [`Configuration`] no matter how partial the input.
//!
//! Merging happens over `serde_json::Value` trees: the TOML input is
//! converted once, merged over the serialized defaults, and deserialized
//! into the typed tree.

use serde_json::{Map, Value};

use crate::config::model::Configuration;
use crate::errors::Result;

/// Resolve a partial user configuration over the defaults.
///
/// A non-table input is treated as the empty table, so malformed callers
/// get the defaults instead of an error. The function is pure: resolving
/// an already-resolved configuration yields the same value.
pub fn resolve(user: toml::Value) -> Result<Configuration> {
    let user = match serde_json::to_value(user)? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let defaults = match serde_json::to_value(Configuration::default())? {
        Value::Object(map) => map,
        _ => Map::new(),
    };

    let merged = deep_merge(defaults, user);
    Ok(serde_json::from_value(Value::Object(merged))?)
}

/// Resolve a TOML document string over the defaults.
pub fn resolve_str(user: &str) -> Result<Configuration> {
    let value: toml::Value = toml::from_str(user)?;
    resolve(value)
}

/// Merge `over` onto `base`, key by key.
///
/// Tables merge recursively; a non-table value replaces whatever the
/// default held, so user-supplied arrays are never merged element-wise.
fn deep_merge(mut base: Map<String, Value>, over: Map<String, Value>) -> Map<String, Value> {
    for (key, over_value) in over {
        let merged = match (base.remove(&key), over_value) {
            (Some(Value::Object(b)), Value::Object(o)) => Value::Object(deep_merge(b, o)),
            (_, o) => o,
        };
        base.insert(key, merged);
    }
    base
}

#[cfg(test)]
mod tests {
    use super::*;

    fn fragment(doc: &str) -> toml::Value {
        toml::from_str(doc).expect("valid test TOML")
    }

    fn empty() -> toml::Value {
        fragment("")
    }

    #[test]
    fn empty_input_yields_defaults() {
        let resolved = resolve(empty()).unwrap();
        assert_eq!(resolved, Configuration::default());
    }

    #[test]
    fn non_table_input_is_treated_as_empty() {
        let resolved = resolve(toml::Value::Integer(42)).unwrap();
        assert_eq!(resolved, Configuration::default());
    }

    #[test]
    fn leaf_override_keeps_sibling_defaults() {
        let resolved = resolve(fragment("[client]\ndest = \"public\"")).unwrap();
        assert_eq!(resolved.client.dest, "public");
        // Siblings of the overridden leaf keep their defaults.
        assert_eq!(resolved.client.cwd, Configuration::default().client.cwd);
        assert_eq!(resolved.client.scripts, Configuration::default().client.scripts);
    }

    #[test]
    fn arrays_replace_instead_of_merging() {
        let resolved = resolve(fragment("[client.scripts]\nsrc = [\"only.js\"]")).unwrap();
        assert_eq!(resolved.client.scripts.src, vec!["only.js".to_string()]);
    }

    #[test]
    fn explicit_empty_exclude_is_distinguished_from_absent() {
        let absent = resolve(empty()).unwrap();
        assert_eq!(absent.exclude, None);

        let empty_list = resolve(fragment("exclude = []")).unwrap();
        assert_eq!(empty_list.exclude, Some(Vec::new()));
    }

    #[test]
    fn resolve_is_idempotent() {
        let once = resolve(fragment("port = 9001\n[client.styles]\nsrc = [\"main.css\"]")).unwrap();
        let rendered = toml::to_string(&once).expect("serializable configuration");
        let again = resolve(toml::from_str(&rendered).unwrap()).unwrap();
        assert_eq!(once, again);
    }
}
