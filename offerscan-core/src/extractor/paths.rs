// Dotted-path lookups over serde_json values.
//
// Every lookup returns an Option; callers pick an explicit default when a
// whole fallback chain comes up empty.

use serde_json::Value;

/// Follow a dotted key path ("data.offers.offerList") through nested mappings.
/// An empty path resolves to the node itself.
pub fn resolve<'a>(node: &'a Value, path: &str) -> Option<&'a Value> {
    if path.is_empty() {
        return Some(node);
    }
    path.split('.')
        .try_fold(node, |current, key| current.as_object()?.get(key))
}

/// First path resolving to a non-empty sequence
pub fn first_sequence<'a>(node: &'a Value, paths: &[String]) -> Option<&'a Vec<Value>> {
    paths
        .iter()
        .filter_map(|path| resolve(node, path)?.as_array())
        .find(|items| !items.is_empty())
}

/// First path resolving to a non-blank string
pub fn first_string<'a>(node: &'a Value, paths: &[String]) -> Option<&'a str> {
    paths
        .iter()
        .filter_map(|path| resolve(node, path)?.as_str())
        .find(|s| !s.trim().is_empty())
}

/// First path resolving to something usable as an identity key.
/// Integer ids are accepted and stringified.
pub fn first_identifier(node: &Value, paths: &[String]) -> Option<String> {
    paths.iter().find_map(|path| match resolve(node, path)? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) if n.is_i64() || n.is_u64() => Some(n.to_string()),
        _ => None,
    })
}

/// Strings found at `path`: a sequence contributes its non-blank string
/// members, a lone string contributes itself, anything else nothing.
pub fn string_members(node: &Value, path: &str) -> Vec<String> {
    match resolve(node, path) {
        Some(Value::Array(items)) => items
            .iter()
            .filter_map(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string)
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

/// True when `node` is a mapping whose `field` equals `marker`
pub fn has_marker(node: &Value, field: &str, marker: &str) -> bool {
    node.get(field).and_then(Value::as_str) == Some(marker)
}
