use std::borrow::Cow;

use serde_json::{Map, Value};

use super::context::{ActiveContext, Container};
use super::util::{add_value, as_slice, is_list_object};
use crate::error::{JsonLdError, Result};

/// Compact an expanded element against `active`.
///
/// The result carries no `@context`; callers that want one attach it themselves.
pub fn compact(
    active: &ActiveContext,
    active_property: Option<&str>,
    element: &Value,
    compact_arrays: bool,
) -> Result<Value> {
    Compactor { compact_arrays }.compact_element(active, active_property, element)
}

struct Compactor {
    compact_arrays: bool,
}

impl Compactor {
    fn compact_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Value,
    ) -> Result<Value> {
        match element {
            Value::Array(items) => {
                let mut result = Vec::with_capacity(items.len());
                for item in items {
                    let compacted = self.compact_element(active, active_property, item)?;
                    if !compacted.is_null() {
                        result.push(compacted);
                    }
                }
                let has_container = active_property
                    .and_then(|p| active.term_definition(p))
                    .is_some_and(|def| !def.container.is_empty());
                if self.compact_arrays && result.len() == 1 && !has_container {
                    return Ok(result.remove(0));
                }
                Ok(Value::Array(result))
            }
            Value::Object(map) => self.compact_object(active, active_property, map),
            scalar => Ok(scalar.clone()),
        }
    }

    fn compact_object(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, Value>,
    ) -> Result<Value> {
        let property_scoped = active_property
            .and_then(|p| active.term_definition(p))
            .and_then(|def| def.context.clone());
        let mut active = Cow::Borrowed(active);

        // Type-scoped contexts do not reach nested nodes.
        let is_value = element.contains_key("@value");
        if !is_value && !is_node_reference_map(element) {
            if let Some(previous) = active.previous.as_deref().cloned() {
                active = Cow::Owned(previous);
            }
        }
        if let Some(scoped) = &property_scoped {
            active = Cow::Owned(active.parse(scoped)?);
        }

        if is_value || is_node_reference_map(element) {
            if let Some(scalar) = compact_value(&active, active_property, element) {
                return Ok(scalar);
            }
        }

        if !is_value {
            if let Some(types) = element.get("@type") {
                let mut terms: Vec<String> = as_slice(types)
                    .iter()
                    .filter_map(Value::as_str)
                    .map(|t| active.compact_iri(t, None, true, false))
                    .collect();
                terms.sort();
                for term in terms {
                    let scoped = active
                        .term_definition(&term)
                        .and_then(|def| def.context.clone());
                    if let Some(scoped) = scoped {
                        active = Cow::Owned(active.with_type_scope(&scoped)?);
                    }
                }
            }
        }
        let active: &ActiveContext = &active;

        let inside_reverse = active_property == Some("@reverse");
        let mut result = Map::new();

        for (expanded_property, expanded_value) in element {
            match expanded_property.as_str() {
                "@id" | "@type" => {
                    // @id values are document-relative, @type values vocabulary-relative
                    let vocab = expanded_property == "@type";
                    let mut compacted: Vec<Value> = as_slice(expanded_value)
                        .iter()
                        .map(|v| match v.as_str() {
                            Some(iri) => Value::String(active.compact_iri(iri, None, vocab, false)),
                            None => v.clone(),
                        })
                        .collect();
                    let compacted_value = if compacted.len() == 1 {
                        compacted.remove(0)
                    } else {
                        Value::Array(compacted)
                    };
                    let alias = active.compact_iri(expanded_property, None, true, false);
                    result.insert(alias, compacted_value);
                    continue;
                }
                "@reverse" => {
                    let compacted = self.compact_element(active, Some("@reverse"), expanded_value)?;
                    let Value::Object(mut compacted) = compacted else {
                        continue;
                    };
                    let reverse_terms: Vec<String> = compacted
                        .keys()
                        .filter(|property| active.is_reverse(property))
                        .cloned()
                        .collect();
                    for property in reverse_terms {
                        let Some(mut value) = compacted.remove(&property) else {
                            continue;
                        };
                        let as_array = active.has_container(&property, Container::Set)
                            || !self.compact_arrays;
                        if as_array && !value.is_array() {
                            value = Value::Array(vec![value]);
                        }
                        add_value(&mut result, &property, value, as_array, true);
                    }
                    if !compacted.is_empty() {
                        let alias = active.compact_iri("@reverse", None, true, false);
                        result.insert(alias, Value::Object(compacted));
                    }
                    continue;
                }
                "@index"
                    if active_property
                        .is_some_and(|p| active.has_container(p, Container::Index)) =>
                {
                    continue;
                }
                "@index" | "@value" | "@language" | "@direction" => {
                    let alias = active.compact_iri(expanded_property, None, true, false);
                    result.insert(alias, expanded_value.clone());
                    continue;
                }
                _ => {}
            }

            let items = as_slice(expanded_value);
            if items.is_empty() {
                let item_property =
                    active.compact_iri(expanded_property, Some(expanded_value), true, inside_reverse);
                match result.get_mut(&item_property) {
                    None => {
                        result.insert(item_property, Value::Array(Vec::new()));
                    }
                    Some(existing) if !existing.is_array() => {
                        let single = existing.take();
                        *existing = Value::Array(vec![single]);
                    }
                    Some(_) => {}
                }
            }

            for expanded_item in items {
                let item_property =
                    active.compact_iri(expanded_property, Some(expanded_item), true, inside_reverse);
                let definition = active.term_definition(&item_property);
                let has_container = |c| definition.is_some_and(|def| def.has_container(c));

                let is_list = is_list_object(expanded_item);
                let list_value = if is_list {
                    &expanded_item["@list"]
                } else {
                    expanded_item
                };
                let mut compacted_item =
                    self.compact_element(active, Some(&item_property), list_value)?;

                if is_list {
                    if !compacted_item.is_array() {
                        compacted_item = Value::Array(vec![compacted_item]);
                    }
                    if !has_container(Container::List) {
                        let mut wrapper = Map::new();
                        wrapper.insert(active.compact_iri("@list", None, true, false), compacted_item);
                        if let Some(index) = expanded_item.get("@index") {
                            wrapper.insert(active.compact_iri("@index", None, true, false), index.clone());
                        }
                        compacted_item = Value::Object(wrapper);
                    } else if result.contains_key(&item_property) {
                        return Err(JsonLdError::compaction(format!(
                            "compaction to list of lists: property '{item_property}' has more than one list"
                        )));
                    }
                }

                let map_container = if has_container(Container::Language) {
                    Some("@language")
                } else if has_container(Container::Index) {
                    Some("@index")
                } else {
                    None
                };

                if let Some(container_key) = map_container {
                    // the compacted form may use an alias of @value
                    if container_key == "@language" {
                        if let Some(inner) = expanded_item.get("@value") {
                            compacted_item = inner.clone();
                        }
                    }
                    let Some(map_key) = expanded_item.get(container_key).and_then(Value::as_str)
                    else {
                        add_value(&mut result, &item_property, compacted_item, !self.compact_arrays, true);
                        continue;
                    };
                    let entry = result
                        .entry(item_property.clone())
                        .or_insert_with(|| Value::Object(Map::new()));
                    if let Value::Object(map_object) = entry {
                        add_value(map_object, map_key, compacted_item, false, true);
                    }
                } else {
                    let as_array = !self.compact_arrays
                        || has_container(Container::Set)
                        || has_container(Container::List)
                        || expanded_property == "@list"
                        || expanded_property == "@graph";
                    add_value(&mut result, &item_property, compacted_item, as_array, true);
                }
            }
        }

        Ok(Value::Object(result))
    }
}

fn is_node_reference_map(map: &Map<String, Value>) -> bool {
    map.len() == 1 && map.contains_key("@id")
}

/// Compact a value object or node reference to a scalar when the term's coercion rules
/// make the object form redundant. Returns `None` when the object form must be kept.
fn compact_value(
    active: &ActiveContext,
    active_property: Option<&str>,
    value: &Map<String, Value>,
) -> Option<Value> {
    let term = active_property.unwrap_or_default();
    let type_mapping = active.type_mapping(term);

    if is_node_reference_map(value) {
        let id = value.get("@id")?.as_str()?;
        return match type_mapping {
            Some("@id") => Some(Value::String(active.compact_iri(id, None, false, false))),
            Some("@vocab") => Some(Value::String(active.compact_iri(id, None, true, false))),
            _ => None,
        };
    }

    let preserve_index =
        value.contains_key("@index") && !active.has_container(term, Container::Index);
    let literal = value.get("@value")?;

    if !preserve_index {
        if let (Some(t), Some(mapped)) = (value.get("@type").and_then(Value::as_str), type_mapping) {
            if t == mapped {
                return Some(literal.clone());
            }
        }
        if let Some(language) = value.get("@language").and_then(Value::as_str) {
            let direction = value.get("@direction").and_then(Value::as_str);
            if active.language_for(term) == Some(&language.to_lowercase())
                && active.direction_for(term) == direction
            {
                return Some(literal.clone());
            }
        }
    }

    let key_count = value.len();
    let value_only = key_count == 1
        || (key_count == 2 && value.contains_key("@index") && !preserve_index);
    let has_null_language = active
        .term_definition(term)
        .is_some_and(|def| def.language_mapping == Some(None));
    let has_default_language = active.language.is_some() || active.direction.is_some();
    if value_only && (!has_default_language || !literal.is_string() || has_null_language) {
        return Some(literal.clone());
    }
    None
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn compact_with(context: Value, expanded: Value) -> Result<Value> {
        let active = ActiveContext::default().parse(&context).unwrap();
        compact(&active, None, &expanded, true)
    }

    #[test]
    fn compacts_simple_term() {
        let compacted = compact_with(
            json!({"name": "http://schema.org/name"}),
            json!([{"http://schema.org/name": [{"@value": "Ann"}]}]),
        )
        .unwrap();
        assert_eq!(compacted, json!({"name": "Ann"}));
    }

    #[test]
    fn uses_aliases_and_coercion() {
        let compacted = compact_with(
            json!({
                "id": "@id",
                "type": "@type",
                "schema": "http://schema.org/",
                "knows": {"@id": "schema:knows", "@type": "@id"}
            }),
            json!([{
                "@id": "http://x/ann",
                "@type": ["http://schema.org/Person"],
                "http://schema.org/knows": [{"@id": "http://x/bob"}]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({
                "id": "http://x/ann",
                "type": "schema:Person",
                "knows": "http://x/bob"
            })
        );
    }

    #[test]
    fn typed_and_language_values() {
        let compacted = compact_with(
            json!({
                "date": {"@id": "http://x/date", "@type": "http://x/Date"},
                "label": {"@id": "http://x/label", "@container": "@language"},
                "note": "http://x/note"
            }),
            json!([{
                "http://x/date": [{"@value": "2020", "@type": "http://x/Date"}],
                "http://x/label": [
                    {"@value": "Hello", "@language": "en"},
                    {"@value": "Hallo", "@language": "de"}
                ],
                "http://x/note": [{"@value": "n", "@type": "http://x/Other"}]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({
                "date": "2020",
                "label": {"en": "Hello", "de": "Hallo"},
                "note": {"@value": "n", "@type": "http://x/Other"}
            })
        );
    }

    #[test]
    fn set_and_list_containers_keep_arrays() {
        let compacted = compact_with(
            json!({
                "tags": {"@id": "http://x/tags", "@container": "@set"},
                "items": {"@id": "http://x/items", "@container": "@list"},
                "plain": "http://x/plain"
            }),
            json!([{
                "http://x/tags": [{"@value": "a"}],
                "http://x/items": [{"@list": [{"@value": 1}]}],
                "http://x/plain": [{"@list": [{"@value": 2}]}]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({
                "tags": ["a"],
                "items": [1],
                "plain": {"@list": [2]}
            })
        );
    }

    #[test]
    fn index_container() {
        let compacted = compact_with(
            json!({"post": {"@id": "http://x/post", "@container": "@index"}}),
            json!([{
                "http://x/post": [
                    {"@id": "http://x/p1", "@index": "en", "http://x/t": [{"@value": "T"}]}
                ]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({"post": {"en": {"@id": "http://x/p1", "http://x/t": "T"}}})
        );
    }

    #[test]
    fn list_of_lists_fails() {
        let err = compact_with(
            json!({"items": {"@id": "http://x/items", "@container": "@list"}}),
            json!([{
                "http://x/items": [
                    {"@list": [{"@value": 1}]},
                    {"@list": [{"@value": 2}]}
                ]
            }]),
        )
        .unwrap_err();
        assert_eq!(err.code(), "COMPACT_ERROR");
    }

    #[test]
    fn reverse_terms() {
        let compacted = compact_with(
            json!({"children": {"@reverse": "http://x/parent", "@type": "@id"}}),
            json!([{
                "@id": "http://x/mum",
                "@reverse": {"http://x/parent": [{"@id": "http://x/kid"}]}
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({"@id": "http://x/mum", "children": "http://x/kid"})
        );
    }

    #[test]
    fn compact_arrays_disabled() {
        let active = ActiveContext::default()
            .parse(&json!({"name": "http://schema.org/name"}))
            .unwrap();
        let compacted = compact(
            &active,
            None,
            &json!([{"http://schema.org/name": [{"@value": "Ann"}]}]),
            false,
        )
        .unwrap();
        assert_eq!(compacted, json!([{"name": ["Ann"]}]));
    }

    #[test]
    fn default_language_keeps_plain_strings_as_objects() {
        let compacted = compact_with(
            json!({"@language": "en", "@vocab": "http://x/"}),
            json!([{
                "http://x/a": [{"@value": "hello", "@language": "en"}],
                "http://x/b": [{"@value": "plain"}]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({"a": "hello", "b": {"@value": "plain"}})
        );
    }

    #[test]
    fn language_map_with_value_alias() {
        let compacted = compact_with(
            json!({
                "val": "@value",
                "label": {"@id": "http://x/label", "@container": "@language"}
            }),
            json!([{"http://x/label": [{"@value": "hi", "@language": "en"}]}]),
        )
        .unwrap();
        assert_eq!(compacted, json!({"label": {"en": "hi"}}));
    }

    #[test]
    fn property_scope_inside_type_scope() {
        let compacted = compact_with(
            json!({
                "@vocab": "http://x/",
                "Person": {"@context": {
                    "address": {"@id": "http://x/address", "@context": {"city": "http://schema.org/city"}}
                }}
            }),
            json!([{
                "@type": ["http://x/Person"],
                "http://x/address": [{"http://schema.org/city": [{"@value": "Paris"}]}]
            }]),
        )
        .unwrap();
        assert_eq!(
            compacted,
            json!({"@type": "Person", "address": {"city": "Paris"}})
        );
    }
}
