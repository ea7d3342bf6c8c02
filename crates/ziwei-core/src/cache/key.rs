//! Deterministic cache key construction
//!
//! Two logically identical requests must map to byte-identical keys across
//! process restarts, so interpretation lookups survive redeploys and the
//! persistent tier stays addressable.

use serde_json::Value;

/// Build a cache key of the form `namespace:subject:part1:part2:...`.
///
/// Each param is stringified; object-valued params are serialized with
/// recursively sorted keys, so property insertion order never leaks into the
/// key. Pure function of its inputs.
pub fn build_key(namespace: &str, subject_id: &str, params: &[Value]) -> String {
    let mut parts = Vec::with_capacity(params.len() + 2);
    parts.push(namespace.to_string());
    parts.push(subject_id.to_string());
    parts.extend(params.iter().map(stringify));
    parts.join(":")
}

fn stringify(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        Value::Object(_) | Value::Array(_) => canonicalize(value).to_string(),
        other => other.to_string(),
    }
}

/// Rebuild objects with keys in sorted order. serde_json's default map is
/// already ordered, but a dependency elsewhere in the build can unify the
/// `preserve_order` feature and silently change that, so the sort is explicit.
fn canonicalize(value: &Value) -> Value {
    match value {
        Value::Object(map) => {
            let mut entries: Vec<(&String, &Value)> = map.iter().collect();
            entries.sort_by(|a, b| a.0.cmp(b.0));
            let mut sorted = serde_json::Map::new();
            for (key, val) in entries {
                sorted.insert(key.clone(), canonicalize(val));
            }
            Value::Object(sorted)
        }
        Value::Array(items) => Value::Array(items.iter().map(canonicalize).collect()),
        other => other.clone(),
    }
}
