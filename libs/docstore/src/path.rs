//! Field path patching.
//!
//! A path is a dot-separated list of segments. Object segments name keys
//! and missing intermediate objects are created. Numeric segments index
//! into arrays; an index equal to the length appends.

use serde_json::{Map, Value};

use crate::{Document, StoreError};

/// Set `value` at `path` inside `document`.
pub fn apply_field(document: &mut Document, path: &str, value: Value) -> Result<(), StoreError> {
    let segments: Vec<&str> = path.split('.').collect();
    if segments.iter().any(|s| s.is_empty()) {
        return Err(StoreError::invalid_path(path, "empty segment"));
    }
    set_in_map(document, &segments, value, path)
}

fn set_in_map(
    map: &mut Map<String, Value>,
    segments: &[&str],
    value: Value,
    path: &str,
) -> Result<(), StoreError> {
    let Some((first, rest)) = segments.split_first() else {
        return Err(StoreError::invalid_path(path, "empty path"));
    };

    if rest.is_empty() {
        map.insert((*first).to_string(), value);
        return Ok(());
    }

    let child = map
        .entry((*first).to_string())
        .or_insert_with(|| Value::Object(Map::new()));
    set_in_value(child, rest, value, path)
}

fn set_in_value(
    target: &mut Value,
    segments: &[&str],
    value: Value,
    path: &str,
) -> Result<(), StoreError> {
    match target {
        Value::Object(map) => set_in_map(map, segments, value, path),
        Value::Array(items) => {
            let Some((first, rest)) = segments.split_first() else {
                return Err(StoreError::invalid_path(path, "empty path"));
            };
            let idx: usize = first
                .parse()
                .map_err(|_| StoreError::invalid_path(path, format!("{first:?} is not an array index")))?;

            if idx > items.len() {
                return Err(StoreError::invalid_path(
                    path,
                    format!("index {idx} past end of array of length {}", items.len()),
                ));
            }

            if rest.is_empty() {
                if idx == items.len() {
                    items.push(value);
                } else {
                    items[idx] = value;
                }
                return Ok(());
            }

            if idx == items.len() {
                items.push(Value::Object(Map::new()));
            }
            set_in_value(&mut items[idx], rest, value, path)
        }
        // Scalars in the middle of a path are replaced by an object.
        other => {
            *other = Value::Object(Map::new());
            set_in_value(other, segments, value, path)
        }
    }
}
