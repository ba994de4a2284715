use serde_json::{Map, Value, json};

/// Fields of a flat record whose values differ between two versions of it.
/// A field missing from `previous` counts as `null`.
pub(crate) fn field_changes(
    previous: &Map<String, Value>,
    current: &Map<String, Value>,
) -> Vec<Value> {
    current
        .iter()
        .filter_map(|(field, new)| {
            let old = previous.get(field).unwrap_or(&Value::Null);
            (old != new).then(|| json!({ "field": field, "old": old, "new": new }))
        })
        .collect()
}
