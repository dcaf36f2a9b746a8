//! Reference resolution.
//!
//! Substitutes `{ref: "key.prop"}` placeholders with values from the
//! accumulated resource context and merges resolved descriptors over the base
//! context. Resolution itself never fails: a path that does not exist yields
//! an absent value. `unresolved_refs` and `check_reference_order` expose those
//! absences for callers that want to reject them.

use super::types::{BaseContext, Ref, ResourceContext, ResourceDescriptor};
use serde_json::{Map, Value};
use std::collections::HashSet;

/// Look up a dot-path in the context. `None` if any link is missing or not
/// indexable. Numeric segments index into arrays.
pub fn lookup_path<'a>(context: &'a ResourceContext, path: &str) -> Option<&'a Value> {
    let mut segments = path.split('.');
    let head = segments.next()?;
    let mut current = context.get(head)?;
    for seg in segments {
        current = match current {
            Value::Object(map) => map.get(seg)?,
            Value::Array(items) => items.get(seg.parse::<usize>().ok()?)?,
            _ => return None,
        };
    }
    Some(current)
}

/// Deep-substitute every Ref in `value`. Returns `None` when `value` is
/// itself a Ref that resolves to nothing.
///
/// Inside objects, absent values drop the key; inside arrays they become
/// `null` so positions are preserved.
pub fn resolve_value(value: &Value, context: &ResourceContext) -> Option<Value> {
    if let Some(path) = Ref::path_of(value) {
        return lookup_path(context, path).cloned();
    }
    match value {
        Value::Array(items) => Some(Value::Array(
            items
                .iter()
                .map(|item| resolve_value(item, context).unwrap_or(Value::Null))
                .collect(),
        )),
        Value::Object(map) => Some(Value::Object(resolve_object(map, context))),
        other => Some(other.clone()),
    }
}

fn resolve_object(map: &Map<String, Value>, context: &ResourceContext) -> Map<String, Value> {
    let mut out = Map::new();
    for (k, v) in map {
        if let Some(resolved) = resolve_value(v, context) {
            out.insert(k.clone(), resolved);
        }
    }
    out
}

/// Resolve a descriptor and merge it over the base context. Descriptor fields
/// win on key collision. The result still carries `type` and `key`.
pub fn resolve_descriptor(
    descriptor: &ResourceDescriptor,
    context: &ResourceContext,
    base: &BaseContext,
) -> Map<String, Value> {
    let mut merged = base.to_object();
    for (k, v) in resolve_object(&descriptor.to_object(), context) {
        merged.insert(k, v);
    }
    merged
}

/// Every Ref path inside `value` that resolves to nothing, in traversal order.
pub fn unresolved_refs(value: &Value, context: &ResourceContext) -> Vec<String> {
    let mut missing = Vec::new();
    collect_unresolved(value, context, &mut missing);
    missing
}

fn collect_unresolved(value: &Value, context: &ResourceContext, missing: &mut Vec<String>) {
    if let Some(path) = Ref::path_of(value) {
        if lookup_path(context, path).is_none() {
            missing.push(path.to_string());
        }
        return;
    }
    match value {
        Value::Array(items) => {
            for item in items {
                collect_unresolved(item, context, missing);
            }
        }
        Value::Object(map) => {
            for v in map.values() {
                collect_unresolved(v, context, missing);
            }
        }
        _ => {}
    }
}

/// Every Ref path inside `value`, in traversal order.
pub fn ref_paths(value: &Value) -> Vec<String> {
    let mut paths = Vec::new();
    collect_paths(value, &mut paths);
    paths
}

fn collect_paths(value: &Value, paths: &mut Vec<String>) {
    if let Some(path) = Ref::path_of(value) {
        paths.push(path.to_string());
        return;
    }
    match value {
        Value::Array(items) => items.iter().for_each(|i| collect_paths(i, paths)),
        Value::Object(map) => map.values().for_each(|v| collect_paths(v, paths)),
        _ => {}
    }
}

/// Static ordering check: every Ref's first segment must name a descriptor
/// that appears earlier in the list. Returns one message per violation.
pub fn check_reference_order(descriptors: &[ResourceDescriptor]) -> Vec<String> {
    let all_keys: HashSet<&str> = descriptors.iter().map(|d| d.context_key()).collect();
    let mut seen: HashSet<&str> = HashSet::new();
    let mut errors = Vec::new();

    for d in descriptors {
        let key = d.context_key();
        for path in ref_paths(&Value::Object(d.fields.clone())) {
            let head = path.split('.').next().unwrap_or_default();
            if head == key {
                errors.push(format!("resource '{}' references itself via '{}'", key, path));
            } else if seen.contains(head) {
                continue;
            } else if all_keys.contains(head) {
                errors.push(format!(
                    "resource '{}' references '{}' before '{}' is created (forward reference)",
                    key, path, head
                ));
            } else {
                errors.push(format!(
                    "resource '{}' references unknown resource '{}' via '{}'",
                    key, head, path
                ));
            }
        }
        seen.insert(key);
    }

    errors
}
