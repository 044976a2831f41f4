use serde_json::{Map, Value};

/// Keywords recognised by the processor (including framing keywords).
pub const KEYWORDS: &[&str] = &[
    "@base",
    "@container",
    "@context",
    "@default",
    "@direction",
    "@embed",
    "@explicit",
    "@graph",
    "@id",
    "@index",
    "@language",
    "@list",
    "@null",
    "@omitDefault",
    "@preserve",
    "@protected",
    "@reverse",
    "@set",
    "@type",
    "@value",
    "@version",
    "@vocab",
];

pub fn is_keyword(value: &str) -> bool {
    KEYWORDS.contains(&value)
}

/// Borrow a value as a slice, treating a non-array as a one-element array.
pub fn as_slice(value: &Value) -> &[Value] {
    match value {
        Value::Array(items) => items,
        other => std::slice::from_ref(other),
    }
}

/// Take ownership of a value as a vector, treating a non-array as a one-element array.
pub fn into_vec(value: Value) -> Vec<Value> {
    match value {
        Value::Array(items) => items,
        other => vec![other],
    }
}

pub fn is_value_object(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("@value"))
}

pub fn is_list_object(value: &Value) -> bool {
    value.as_object().is_some_and(|o| o.contains_key("@list"))
}

/// A node object: an object that is neither a value, list nor set object.
pub fn is_node_object(value: &Value) -> bool {
    value.as_object().is_some_and(|o| {
        !o.contains_key("@value") && !o.contains_key("@list") && !o.contains_key("@set")
    })
}

/// `{"@id": ...}` and nothing else.
pub fn is_node_reference(value: &Value) -> bool {
    value
        .as_object()
        .is_some_and(|o| o.len() == 1 && o.contains_key("@id"))
}

pub fn id_of(value: &Value) -> Option<&str> {
    value.get("@id").and_then(Value::as_str)
}

/// Equality used when merging property values: identical scalars, value objects that agree
/// on `@value`/`@type`/`@language`/`@index`, or node objects with the same `@id`.
pub fn compare_values(v1: &Value, v2: &Value) -> bool {
    if v1 == v2 {
        return true;
    }
    match (v1, v2) {
        (Value::Object(a), Value::Object(b)) => {
            if a.contains_key("@value") && b.contains_key("@value") {
                return a.get("@value") == b.get("@value")
                    && a.get("@type") == b.get("@type")
                    && a.get("@language") == b.get("@language")
                    && a.get("@index") == b.get("@index");
            }
            match (a.get("@id"), b.get("@id")) {
                (Some(id_a), Some(id_b)) => id_a == id_b,
                _ => false,
            }
        }
        _ => false,
    }
}

/// Returns true if `map[key]` holds `value` (or an array containing it).
pub fn has_value(map: &Map<String, Value>, key: &str, value: &Value) -> bool {
    match map.get(key) {
        Some(Value::Array(items)) => items.iter().any(|v| compare_values(v, value)),
        Some(existing) => compare_values(existing, value),
        None => false,
    }
}

/// Add `value` under `key`.
///
/// Arrays are added item by item. With `as_array` the entry is always an array; without
/// it a first value is stored bare and only promoted to an array on the second add. With
/// `allow_duplicate == false` values already present (per [compare_values]) are skipped.
pub fn add_value(
    map: &mut Map<String, Value>,
    key: &str,
    value: Value,
    as_array: bool,
    allow_duplicate: bool,
) {
    if let Value::Array(items) = value {
        if items.is_empty() && as_array && !map.contains_key(key) {
            map.insert(key.to_string(), Value::Array(Vec::new()));
        }
        for item in items {
            add_value(map, key, item, as_array, allow_duplicate);
        }
        return;
    }

    if !allow_duplicate && has_value(map, key, &value) {
        return;
    }

    match map.get_mut(key) {
        None => {
            let entry = if as_array {
                Value::Array(vec![value])
            } else {
                value
            };
            map.insert(key.to_string(), entry);
        }
        Some(Value::Array(items)) => items.push(value),
        Some(existing) => {
            let previous = existing.take();
            *existing = Value::Array(vec![previous, value]);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn add_value_promotes_to_array() {
        let mut map = Map::new();
        add_value(&mut map, "p", json!("a"), false, true);
        assert_eq!(map["p"], json!("a"));
        add_value(&mut map, "p", json!("b"), false, true);
        assert_eq!(map["p"], json!(["a", "b"]));
    }

    #[test]
    fn add_value_skips_duplicates() {
        let mut map = Map::new();
        add_value(&mut map, "p", json!({"@id": "http://x"}), true, false);
        add_value(&mut map, "p", json!({"@id": "http://x"}), true, false);
        add_value(&mut map, "p", json!({"@value": "v"}), true, false);
        assert_eq!(map["p"], json!([{"@id": "http://x"}, {"@value": "v"}]));
    }

    #[test]
    fn add_empty_array_creates_entry() {
        let mut map = Map::new();
        add_value(&mut map, "p", json!([]), true, true);
        assert_eq!(map["p"], json!([]));
    }

    #[test]
    fn value_comparison() {
        assert!(compare_values(
            &json!({"@value": "a", "@language": "en"}),
            &json!({"@language": "en", "@value": "a"})
        ));
        assert!(!compare_values(
            &json!({"@value": "a", "@language": "en"}),
            &json!({"@value": "a"})
        ));
        assert!(compare_values(
            &json!({"@id": "http://x", "http://p": []}),
            &json!({"@id": "http://x"})
        ));
    }
}
