//! Key-value configuration maps
//!
//! Node environments, resource requests and chart values are all plain JSON
//! object maps. Merging is recursive for nested maps; lists and scalars are
//! replaced whole.

use serde_json::{Map, Value};

/// A configuration map: string keys to scalars, lists, or nested maps
pub type Values = Map<String, Value>;

/// How to resolve a key present on both sides of a merge
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum MergePolicy {
    /// Overlay wins; nested maps are merged key by key
    #[default]
    Override,
    /// Base wins; only keys missing from the base are copied in
    PreserveExisting,
}

/// Merge `overlay` into `base` in place.
///
/// When both sides hold a map for the same key the maps are merged
/// recursively under the same policy. Any other pairing is a leaf conflict:
/// `Override` takes the overlay value (even if the types differ),
/// `PreserveExisting` keeps the base value.
pub fn merge_values(base: &mut Values, overlay: &Values, policy: MergePolicy) {
    for (key, incoming) in overlay {
        match (base.get_mut(key), incoming) {
            (Some(Value::Object(existing)), Value::Object(incoming)) => {
                merge_values(existing, incoming, policy);
            }
            (Some(existing), _) => {
                if policy == MergePolicy::Override {
                    *existing = incoming.clone();
                }
            }
            (None, _) => {
                base.insert(key.clone(), incoming.clone());
            }
        }
    }
}

/// Merge `overlay` onto a copy of `base` and return the result
pub fn merged(base: &Values, overlay: &Values, policy: MergePolicy) -> Values {
    let mut out = base.clone();
    merge_values(&mut out, overlay, policy);
    out
}

/// Convert a JSON value into a map.
///
/// Non-object values produce an empty map; callers build maps with
/// `serde_json::json!({ ... })` so this is total in practice.
pub fn values_from(value: Value) -> Values {
    match value {
        Value::Object(map) => map,
        _ => Values::new(),
    }
}
