//! Recursive merge and default resolution for value trees
//!
//! These operations implement the schema-default semantics: construction
//! data is layered over cloned defaults, merging map values key by key.

use super::tree::Value;
use std::collections::BTreeMap;

/// Merge `source` into `target` in place.
///
/// Keys holding maps on both sides merge recursively. Any other key is
/// overwritten with a clone of the source value, unless the source value
/// is falsy, in which case the target's value is kept. The falsy-keeps-
/// target rule is deliberate: it is the production merge semantics, and
/// callers rely on `0`/`""`/`false` overrides being ignored.
pub fn deep_merge(target: &mut BTreeMap<String, Value>, source: &BTreeMap<String, Value>) {
    for (key, incoming) in source {
        match (target.get_mut(key), incoming) {
            (Some(Value::Map(existing)), Value::Map(overlay)) => deep_merge(existing, overlay),
            _ => {
                if !incoming.is_falsy() {
                    target.insert(key.clone(), incoming.clone());
                }
            }
        }
    }
}

/// Resolve a field's initial value from its schema default and the
/// caller-supplied construction value.
///
/// Absent → clone of the default. A supplied map is merged over a clone
/// of the default when the default is itself a map; any other supplied
/// value is taken as-is. The result never shares storage with the
/// default.
pub fn resolve_value(default: &Value, supplied: Option<Value>) -> Value {
    match supplied {
        None => default.clone(),
        Some(Value::Map(overlay)) => match default.clone() {
            Value::Map(mut base) => {
                deep_merge(&mut base, &overlay);
                Value::Map(base)
            }
            _ => Value::Map(overlay),
        },
        Some(other) => other,
    }
}
