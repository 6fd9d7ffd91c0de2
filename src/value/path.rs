//! Dotted-path access into value trees
//!
//! Nested fields are addressed with `.`-separated paths ("profile.age").
//! Writes create intermediate maps as needed; reads stop at the first
//! missing or non-map segment.

use super::tree::Value;
use std::collections::BTreeMap;

/// Split a dotted path into segments.
///
/// Returns `None` for an empty path or a path with empty segments
/// ("a..b", ".a").
pub fn split_path(path: &str) -> Option<Vec<&str>> {
    if path.is_empty() {
        return None;
    }
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return None;
    }
    Some(segments)
}

/// Assign `value` at `segments` under `root`, mutating in place.
///
/// Any missing or non-map intermediate is replaced with an empty map, so
/// the write always lands.
pub fn set_by_path(root: &mut Value, segments: &[&str], value: Value) {
    let (last, intermediates) = match segments.split_last() {
        Some(parts) => parts,
        None => return,
    };

    let mut current = root;
    for segment in intermediates {
        let entries = ensure_map(current);
        current = entries.entry((*segment).to_string()).or_insert(Value::Null);
    }
    ensure_map(current).insert((*last).to_string(), value);
}

/// Read the value at `segments` under `root`, if every intermediate is a
/// map containing the next segment.
pub fn get_by_path<'a>(root: &'a Value, segments: &[&str]) -> Option<&'a Value> {
    let mut current = root;
    for segment in segments {
        match current {
            Value::Map(entries) => current = entries.get(*segment)?,
            _ => return None,
        }
    }
    Some(current)
}

fn ensure_map(slot: &mut Value) -> &mut BTreeMap<String, Value> {
    if !matches!(slot, Value::Map(_)) {
        *slot = Value::Map(BTreeMap::new());
    }
    match slot {
        Value::Map(entries) => entries,
        _ => unreachable!(),
    }
}
