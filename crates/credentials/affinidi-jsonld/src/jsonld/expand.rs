use std::borrow::Cow;

use serde_json::{Map, Value};

use super::context::{ActiveContext, Container};
use super::iri::{is_absolute_iri, is_absolute_or_blank};
use super::util::{add_value, as_slice, into_vec, is_keyword, is_list_object, is_value_object};
use crate::error::{JsonLdError, Result};
use crate::options::JsonLdOptions;

/// Expand a JSON-LD element.
///
/// Returns `Value::Null` when the element expands to nothing (for example a top-level
/// scalar or a dropped free-floating node).
pub fn expand(
    active: &ActiveContext,
    active_property: Option<&str>,
    element: &Value,
    options: &JsonLdOptions,
) -> Result<Value> {
    Expander {
        keep_free_floating_nodes: options.keep_free_floating_nodes,
        frame_expansion: false,
    }
    .expand_element(active, active_property, element)
}

/// Expand a whole document: the result is always an array, and a lone top-level
/// `{"@graph": ...}` is replaced by its contents.
pub fn expand_document(
    active: &ActiveContext,
    element: &Value,
    options: &JsonLdOptions,
) -> Result<Vec<Value>> {
    let expanded = expand(active, None, element, options)?;
    Ok(unwrap_top_level(expanded))
}

/// Expand a frame. Framing keywords are kept and `{}`/`[]` wildcards are accepted.
pub fn expand_frame(active: &ActiveContext, frame: &Value) -> Result<Vec<Value>> {
    let expanded = Expander {
        keep_free_floating_nodes: true,
        frame_expansion: true,
    }
    .expand_element(active, None, frame)?;
    let frames = unwrap_top_level(expanded);
    tracing::trace!(frames = frames.len(), "expanded frame");
    Ok(frames)
}

fn unwrap_top_level(expanded: Value) -> Vec<Value> {
    match expanded {
        Value::Object(mut map) if map.len() == 1 && map.contains_key("@graph") => {
            map.remove("@graph").map(into_vec).unwrap_or_default()
        }
        Value::Null => Vec::new(),
        other => into_vec(other),
    }
}

fn array_of(value: Value) -> Vec<Value> {
    match value {
        Value::Null => Vec::new(),
        other => into_vec(other),
    }
}

struct Expander {
    keep_free_floating_nodes: bool,
    frame_expansion: bool,
}

impl Expander {
    fn expand_element(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Value,
    ) -> Result<Value> {
        match element {
            Value::Null => Ok(Value::Null),
            Value::Array(items) => self.expand_array(active, active_property, items),
            Value::Object(map) => self.expand_object(active, active_property, map),
            scalar => {
                if matches!(active_property, None | Some("@graph")) {
                    tracing::trace!(value = %scalar, "dropping free-floating scalar");
                    return Ok(Value::Null);
                }
                let scoped = match active_property {
                    Some(property) => active.with_term_scope(property)?,
                    None => Cow::Borrowed(active),
                };
                Ok(expand_value(&scoped, active_property, scalar))
            }
        }
    }

    fn expand_array(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        items: &[Value],
    ) -> Result<Value> {
        let in_list = match active_property {
            Some("@list") => true,
            Some(property) => active.has_container(property, Container::List),
            None => false,
        };

        let mut result = Vec::with_capacity(items.len());
        for item in items {
            let expanded = self.expand_element(active, active_property, item)?;
            if in_list && (expanded.is_array() || is_list_object(&expanded)) {
                return Err(JsonLdError::invalid_input("list of lists detected"));
            }
            match expanded {
                Value::Array(inner) => result.extend(inner),
                Value::Null => {}
                other => result.push(other),
            }
        }
        Ok(Value::Array(result))
    }

    fn expand_object(
        &self,
        active: &ActiveContext,
        active_property: Option<&str>,
        element: &Map<String, Value>,
    ) -> Result<Value> {
        // Looked up before reverting: the term may come from a type-scoped context.
        let property_scoped = active_property
            .and_then(|p| active.term_definition(p))
            .and_then(|def| def.context.clone());
        let mut active = Cow::Borrowed(active);

        // A type-scoped context only applies to the node that carries the type.
        let expands_to = |k: &str, keyword: &str| {
            active.expand_iri(k, true, false).as_deref() == Some(keyword)
        };
        let is_value = element.keys().any(|k| expands_to(k.as_str(), "@value"));
        let is_reference =
            element.len() == 1 && element.keys().all(|k| expands_to(k.as_str(), "@id"));
        if !is_value && !is_reference {
            if let Some(previous) = active.previous.as_deref().cloned() {
                active = Cow::Owned(previous);
            }
        }

        if let Some(scoped) = &property_scoped {
            active = Cow::Owned(active.parse(scoped)?);
        }

        if let Some(local) = element.get("@context") {
            active = Cow::Owned(active.parse(local)?);
        }

        // Terms used as @type values are looked up before any type-scoped context applies.
        let type_scoped: &ActiveContext = &active;
        let mut types: Vec<&str> = element
            .iter()
            .filter(|(k, _)| type_scoped.expand_iri(k, true, false).as_deref() == Some("@type"))
            .flat_map(|(_, v)| as_slice(v).iter().filter_map(Value::as_str))
            .collect();
        types.sort_unstable();
        let mut node_scoped: Option<ActiveContext> = None;
        for t in types {
            if let Some(scoped) = type_scoped
                .term_definition(t)
                .and_then(|def| def.context.as_ref())
            {
                let current = node_scoped.as_ref().unwrap_or(type_scoped);
                node_scoped = Some(current.with_type_scope(scoped)?);
            }
        }
        let active: &ActiveContext = node_scoped.as_ref().unwrap_or(type_scoped);

        let mut result = Map::new();
        for (key, value) in element {
            if key == "@context" {
                continue;
            }
            let Some(expanded_property) = active.expand_iri(key, true, false) else {
                tracing::trace!(key, "dropping key mapped to null");
                continue;
            };
            if !is_keyword(&expanded_property) && !is_absolute_or_blank(&expanded_property) {
                tracing::trace!(key, "dropping key that does not expand to an IRI");
                continue;
            }

            if is_keyword(&expanded_property) {
                self.expand_keyword(
                    active,
                    type_scoped,
                    active_property,
                    &expanded_property,
                    value,
                    &mut result,
                )?;
                continue;
            }

            let definition = active.term_definition(key);
            let has_container = |c| definition.is_some_and(|def| def.has_container(c));

            // Node objects below apply the term's scoped context themselves.
            let mut expanded_value = match value {
                Value::Object(map) if has_container(Container::Language) => {
                    expand_language_map(&*active.with_term_scope(key)?, key, map)?
                }
                Value::Object(map) if has_container(Container::Index) => {
                    self.expand_index_map(active, key, map)?
                }
                _ => self.expand_element(active, Some(key), value)?,
            };
            if expanded_value.is_null() {
                continue;
            }

            if has_container(Container::List) && !is_list_object(&expanded_value) {
                let mut list = Map::new();
                list.insert("@list".to_string(), Value::Array(into_vec(expanded_value)));
                expanded_value = Value::Object(list);
            }

            if active.is_reverse(key) {
                let mut reverse_map = take_reverse_map(&mut result);
                for item in into_vec(expanded_value) {
                    if is_value_object(&item) || is_list_object(&item) {
                        return Err(JsonLdError::invalid_input(format!(
                            "invalid reverse property value for '{key}'"
                        )));
                    }
                    add_value(&mut reverse_map, &expanded_property, item, true, true);
                }
                result.insert("@reverse".to_string(), Value::Object(reverse_map));
            } else {
                add_value(&mut result, &expanded_property, expanded_value, true, true);
            }
        }

        self.finish_object(active_property, result)
    }

    fn expand_keyword(
        &self,
        active: &ActiveContext,
        type_scoped: &ActiveContext,
        active_property: Option<&str>,
        keyword: &str,
        value: &Value,
        result: &mut Map<String, Value>,
    ) -> Result<()> {
        if active_property == Some("@reverse") {
            return Err(JsonLdError::invalid_input(
                "a keyword cannot be used as a reverse property",
            ));
        }
        if result.contains_key(keyword) {
            return Err(JsonLdError::invalid_input(format!(
                "colliding keywords: '{keyword}' appears more than once"
            )));
        }

        let expanded_value = match keyword {
            "@id" => match value {
                Value::String(id) => active
                    .expand_iri(id, false, true)
                    .map(Value::String)
                    .unwrap_or(Value::Null),
                Value::Object(map) if self.frame_expansion && map.is_empty() => value.clone(),
                Value::Array(ids) if self.frame_expansion => Value::Array(
                    ids.iter()
                        .map(|id| match id.as_str() {
                            Some(id) => Ok(Value::String(
                                active.expand_iri(id, false, true).unwrap_or_default(),
                            )),
                            None => Err(JsonLdError::invalid_input("@id values must be strings")),
                        })
                        .collect::<Result<Vec<_>>>()?,
                ),
                other => {
                    return Err(JsonLdError::invalid_input(format!(
                        "@id value must be a string, found {other}"
                    )));
                }
            },
            "@type" => self.expand_type(type_scoped, value)?,
            "@graph" => Value::Array(array_of(self.expand_element(
                active,
                Some("@graph"),
                value,
            )?)),
            "@value" => match value {
                Value::Null => {
                    result.insert("@value".to_string(), Value::Null);
                    return Ok(());
                }
                Value::Object(_) | Value::Array(_) if !self.frame_expansion => {
                    return Err(JsonLdError::invalid_input(format!(
                        "@value must be a scalar, found {value}"
                    )));
                }
                other => other.clone(),
            },
            "@language" => match value {
                Value::String(language) => Value::String(language.to_lowercase()),
                other if self.frame_expansion => other.clone(),
                other => {
                    return Err(JsonLdError::invalid_input(format!(
                        "@language must be a string, found {other}"
                    )));
                }
            },
            "@direction" => match value {
                Value::String(dir) if dir == "ltr" || dir == "rtl" => value.clone(),
                other if self.frame_expansion => other.clone(),
                other => {
                    return Err(JsonLdError::invalid_input(format!(
                        "@direction must be \"ltr\" or \"rtl\", found {other}"
                    )));
                }
            },
            "@index" => match value {
                Value::String(_) => value.clone(),
                other => {
                    return Err(JsonLdError::invalid_input(format!(
                        "@index must be a string, found {other}"
                    )));
                }
            },
            "@list" => {
                if matches!(active_property, None | Some("@graph")) {
                    tracing::trace!("dropping free-floating list");
                    return Ok(());
                }
                let items = array_of(self.expand_element(active, active_property, value)?);
                if items.iter().any(is_list_object) {
                    return Err(JsonLdError::invalid_input("list of lists detected"));
                }
                Value::Array(items)
            }
            "@set" => self.expand_element(active, active_property, value)?,
            "@reverse" => {
                if !value.is_object() {
                    return Err(JsonLdError::invalid_input("@reverse value must be an object"));
                }
                let expanded = self.expand_element(active, Some("@reverse"), value)?;
                let Value::Object(mut expanded) = expanded else {
                    return Ok(());
                };
                if let Some(Value::Object(double_reversed)) = expanded.remove("@reverse") {
                    for (property, items) in double_reversed {
                        add_value(result, &property, items, true, true);
                    }
                }
                if !expanded.is_empty() {
                    let mut reverse_map = take_reverse_map(result);
                    for (property, items) in expanded {
                        for item in into_vec(items) {
                            if is_value_object(&item) || is_list_object(&item) {
                                return Err(JsonLdError::invalid_input(format!(
                                    "invalid reverse property value for '{property}'"
                                )));
                            }
                            add_value(&mut reverse_map, &property, item, true, true);
                        }
                    }
                    result.insert("@reverse".to_string(), Value::Object(reverse_map));
                }
                return Ok(());
            }
            "@default" if self.frame_expansion => match value {
                Value::String(s) if s == "@null" => value.clone(),
                _ => Value::Array(array_of(self.expand_element(
                    active,
                    Some("@default"),
                    value,
                )?)),
            },
            "@embed" | "@explicit" | "@omitDefault" if self.frame_expansion => value.clone(),
            other => {
                tracing::trace!(keyword = other, "dropping keyword not valid in a node object");
                return Ok(());
            }
        };

        if !expanded_value.is_null() {
            result.insert(keyword.to_string(), expanded_value);
        }
        Ok(())
    }

    fn expand_type(&self, type_scoped: &ActiveContext, value: &Value) -> Result<Value> {
        let expand_one = |t: &str| {
            Value::String(type_scoped.expand_iri(t, true, true).unwrap_or_default())
        };
        match value {
            Value::String(t) => Ok(expand_one(t)),
            Value::Array(types) => {
                let mut expanded = Vec::with_capacity(types.len());
                for t in types {
                    match t {
                        Value::String(t) => expanded.push(expand_one(t)),
                        Value::Object(map) if self.frame_expansion && map.is_empty() => {
                            expanded.push(t.clone())
                        }
                        other => {
                            return Err(JsonLdError::invalid_input(format!(
                                "@type values must be strings, found {other}"
                            )));
                        }
                    }
                }
                Ok(Value::Array(expanded))
            }
            Value::Object(map) if self.frame_expansion && map.is_empty() => Ok(value.clone()),
            other => Err(JsonLdError::invalid_input(format!(
                "@type value must be a string or array of strings, found {other}"
            ))),
        }
    }

    fn expand_index_map(
        &self,
        active: &ActiveContext,
        property: &str,
        map: &Map<String, Value>,
    ) -> Result<Value> {
        let mut indexes: Vec<&String> = map.keys().collect();
        indexes.sort();

        let mut result = Vec::new();
        for index in indexes {
            let expanded = self.expand_element(active, Some(property), &map[index.as_str()])?;
            for mut item in into_vec(expanded) {
                if let Value::Object(obj) = &mut item {
                    if !obj.contains_key("@index") {
                        obj.insert("@index".to_string(), Value::String(index.clone()));
                    }
                }
                result.push(item);
            }
        }
        Ok(Value::Array(result))
    }

    fn finish_object(
        &self,
        active_property: Option<&str>,
        mut result: Map<String, Value>,
    ) -> Result<Value> {
        if result.contains_key("@value") {
            if let Some(extra) = result.keys().find(|k| {
                !matches!(
                    k.as_str(),
                    "@value" | "@language" | "@type" | "@index" | "@direction"
                )
            }) {
                return Err(JsonLdError::invalid_input(format!(
                    "value object may not contain '{extra}'"
                )));
            }
            if result.contains_key("@type") && result.contains_key("@language") {
                return Err(JsonLdError::invalid_input(
                    "value object may not contain both @type and @language",
                ));
            }
            let value = &result["@value"];
            if value.is_null() {
                return Ok(Value::Null);
            }
            if !self.frame_expansion {
                if result.contains_key("@language") && !value.is_string() {
                    return Err(JsonLdError::invalid_input(
                        "only strings can be language-tagged",
                    ));
                }
                if let Some(t) = result.get("@type") {
                    if !t.as_str().is_some_and(is_absolute_iri) {
                        return Err(JsonLdError::invalid_input(format!(
                            "value @type must be an absolute IRI, found {t}"
                        )));
                    }
                }
            }
        } else if let Some(t) = result.get_mut("@type") {
            if !t.is_array() {
                let single = t.take();
                *t = Value::Array(vec![single]);
            }
        } else if result.contains_key("@set") || result.contains_key("@list") {
            let allowed = if result.contains_key("@index") { 2 } else { 1 };
            if result.len() > allowed {
                return Err(JsonLdError::invalid_input(
                    "@set and @list objects may only contain @index besides the list",
                ));
            }
            if let Some(set) = result.remove("@set") {
                return Ok(set);
            }
        }

        if result.len() == 1 && result.contains_key("@language") {
            return Ok(Value::Null);
        }

        if matches!(active_property, None | Some("@graph")) && !self.keep_free_floating_nodes {
            let free_floating = result.is_empty()
                || result.contains_key("@value")
                || result.contains_key("@list")
                || (result.len() == 1 && result.contains_key("@id"));
            if free_floating {
                tracing::trace!("dropping free-floating node");
                return Ok(Value::Null);
            }
        }

        Ok(Value::Object(result))
    }
}

/// Expand a scalar into a value object (or node reference) using the coercion rules of
/// `active_property`.
pub fn expand_value(active: &ActiveContext, active_property: Option<&str>, value: &Value) -> Value {
    let term = active_property.unwrap_or_default();
    let mut result = Map::new();
    match (active.type_mapping(term), value) {
        (Some("@id"), Value::String(id)) => {
            let id = active.expand_iri(id, false, true).unwrap_or_default();
            result.insert("@id".to_string(), Value::String(id));
        }
        (Some("@vocab"), Value::String(id)) => {
            let id = active.expand_iri(id, true, true).unwrap_or_default();
            result.insert("@id".to_string(), Value::String(id));
        }
        (type_mapping, _) => {
            result.insert("@value".to_string(), value.clone());
            match type_mapping {
                Some(t) if t != "@id" && t != "@vocab" => {
                    result.insert("@type".to_string(), Value::String(t.to_string()));
                }
                _ if value.is_string() => {
                    if let Some(language) = active.language_for(term) {
                        result.insert("@language".to_string(), Value::String(language.to_string()));
                    }
                    if let Some(direction) = active.direction_for(term) {
                        result.insert("@direction".to_string(), Value::String(direction.to_string()));
                    }
                }
                _ => {}
            }
        }
    }
    Value::Object(result)
}

fn expand_language_map(
    active: &ActiveContext,
    property: &str,
    map: &Map<String, Value>,
) -> Result<Value> {
    let mut languages: Vec<&String> = map.keys().collect();
    languages.sort();

    let direction = active.direction_for(property);
    let mut result = Vec::new();
    for language in languages {
        for item in as_slice(&map[language.as_str()]) {
            let Value::String(text) = item else {
                if item.is_null() {
                    continue;
                }
                return Err(JsonLdError::invalid_input(format!(
                    "language map values must be strings, found {item}"
                )));
            };
            let mut value = Map::new();
            value.insert("@value".to_string(), Value::String(text.clone()));
            if language != "@none" {
                value.insert("@language".to_string(), Value::String(language.to_lowercase()));
            }
            if let Some(direction) = direction {
                value.insert("@direction".to_string(), Value::String(direction.to_string()));
            }
            result.push(Value::Object(value));
        }
    }
    Ok(Value::Array(result))
}

fn take_reverse_map(result: &mut Map<String, Value>) -> Map<String, Value> {
    match result.remove("@reverse") {
        Some(Value::Object(map)) => map,
        _ => Map::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn expand_doc(document: Value) -> Result<Vec<Value>> {
        let options = JsonLdOptions::default();
        let active = ActiveContext::new(options.base_iri());
        expand_document(&active, &document, &options)
    }

    #[test]
    fn expands_simple_term() {
        let expanded = expand_doc(json!({
            "@context": {"name": "http://schema.org/name"},
            "name": "Ann"
        }))
        .unwrap();
        assert_eq!(expanded, vec![json!({"http://schema.org/name": [{"@value": "Ann"}]})]);
    }

    #[test]
    fn coerces_ids_and_types() {
        let expanded = expand_doc(json!({
            "@context": {
                "@vocab": "http://schema.org/",
                "knows": {"@type": "@id"},
                "born": {"@type": "http://www.w3.org/2001/XMLSchema#date"}
            },
            "@id": "http://example.org/ann",
            "@type": "Person",
            "knows": "http://example.org/bob",
            "born": "1990-01-01"
        }))
        .unwrap();
        assert_eq!(
            expanded,
            vec![json!({
                "@id": "http://example.org/ann",
                "@type": ["http://schema.org/Person"],
                "http://schema.org/knows": [{"@id": "http://example.org/bob"}],
                "http://schema.org/born": [{
                    "@value": "1990-01-01",
                    "@type": "http://www.w3.org/2001/XMLSchema#date"
                }]
            })]
        );
    }

    #[test]
    fn language_and_list_containers() {
        let expanded = expand_doc(json!({
            "@context": {
                "label": {"@id": "http://x/label", "@container": "@language"},
                "items": {"@id": "http://x/items", "@container": "@list"}
            },
            "@id": "http://x/n",
            "label": {"en": "Hello", "de": "Hallo"},
            "items": [1, 2]
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://x/label"],
            json!([
                {"@value": "Hallo", "@language": "de"},
                {"@value": "Hello", "@language": "en"}
            ])
        );
        assert_eq!(
            expanded[0]["http://x/items"],
            json!([{"@list": [{"@value": 1}, {"@value": 2}]}])
        );
    }

    #[test]
    fn index_container() {
        let expanded = expand_doc(json!({
            "@context": {"post": {"@id": "http://x/post", "@container": "@index"}},
            "@id": "http://x/blog",
            "post": {"en": {"@id": "http://x/p1"}}
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://x/post"],
            json!([{"@id": "http://x/p1", "@index": "en"}])
        );
    }

    #[test]
    fn drops_free_floating_nodes() {
        let expanded = expand_doc(json!({
            "@context": {"@vocab": "http://x/"},
            "@graph": [
                {"@id": "http://x/only-id"},
                {"@value": "free"},
                {},
                {"@id": "http://x/a", "name": "A"}
            ]
        }))
        .unwrap();
        assert_eq!(expanded, vec![json!({"@id": "http://x/a", "http://x/name": [{"@value": "A"}]})]);
    }

    #[test]
    fn keeps_free_floating_nodes_when_asked() {
        let options = JsonLdOptions::builder()
            .with_keep_free_floating_nodes(true)
            .build();
        let expanded = expand_document(
            &ActiveContext::default(),
            &json!({"@id": "http://x/only-id"}),
            &options,
        )
        .unwrap();
        assert_eq!(expanded, vec![json!({"@id": "http://x/only-id"})]);
    }

    #[test]
    fn reverse_properties() {
        let expanded = expand_doc(json!({
            "@context": {"children": {"@reverse": "http://x/parent"}},
            "@id": "http://x/mum",
            "children": [{"@id": "http://x/kid", "http://x/name": "Kid"}]
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["@reverse"],
            json!({"http://x/parent": [{"@id": "http://x/kid", "http://x/name": [{"@value": "Kid"}]}]})
        );
    }

    #[test]
    fn type_scoped_context_does_not_propagate() {
        let expanded = expand_doc(json!({
            "@context": {
                "@vocab": "http://x/",
                "Person": {"@context": {"name": "http://schema.org/name"}}
            },
            "@type": "Person",
            "name": "outer",
            "friend": {"name": "inner"}
        }))
        .unwrap();
        assert_eq!(expanded[0]["http://schema.org/name"], json!([{"@value": "outer"}]));
        assert_eq!(
            expanded[0]["http://x/friend"][0]["http://x/name"],
            json!([{"@value": "inner"}])
        );
    }

    #[test]
    fn term_scoped_context() {
        let expanded = expand_doc(json!({
            "@context": {
                "@vocab": "http://x/",
                "address": {"@id": "http://x/address", "@context": {"city": "http://schema.org/city"}}
            },
            "address": {"city": "Paris"},
            "city": "London"
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://x/address"][0]["http://schema.org/city"],
            json!([{"@value": "Paris"}])
        );
        assert_eq!(expanded[0]["http://x/city"], json!([{"@value": "London"}]));
    }

    #[test]
    fn term_scoped_context_defined_by_type() {
        let expanded = expand_doc(json!({
            "@context": {
                "@vocab": "http://x/",
                "Person": {"@context": {
                    "address": {"@id": "http://x/address", "@context": {"city": "http://schema.org/city"}}
                }}
            },
            "@type": "Person",
            "address": {"city": "Paris", "street": {"city": "nested"}}
        }))
        .unwrap();
        let address = &expanded[0]["http://x/address"][0];
        assert_eq!(address["http://schema.org/city"], json!([{"@value": "Paris"}]));
        // property-scoped contexts propagate into deeper nodes
        assert_eq!(
            address["http://x/street"][0]["http://schema.org/city"],
            json!([{"@value": "nested"}])
        );
    }

    #[test]
    fn default_language_and_direction() {
        let expanded = expand_doc(json!({
            "@context": {"@language": "en", "@direction": "ltr", "@vocab": "http://x/"},
            "title": "Hello",
            "count": 3
        }))
        .unwrap();
        assert_eq!(
            expanded[0]["http://x/title"],
            json!([{"@value": "Hello", "@language": "en", "@direction": "ltr"}])
        );
        assert_eq!(expanded[0]["http://x/count"], json!([{"@value": 3}]));
    }

    #[test]
    fn invalid_inputs() {
        let cases = [
            json!({"@context": {"l": {"@id": "http://x/l", "@container": "@list"}}, "l": [[1]]}),
            json!({"@id": "http://x/a", "http://x/p": {"@value": "v", "@id": "http://x/b"}}),
            json!({"http://x/p": {"@value": "v", "@type": "http://x/t", "@language": "en"}}),
            json!({"@id": 5}),
            json!({"@type": 5}),
            json!({"http://x/p": {"@value": 5, "@language": "en"}}),
            json!({"http://x/p": {"@value": "v", "@type": "relative"}}),
            json!({"@reverse": "http://x/p"}),
            json!({"@reverse": {"http://x/p": {"@value": "v"}}}),
            json!({"@context": {"id": "@id"}, "@id": "http://x/a", "id": "http://x/b"}),
            json!({"http://x/p": {"@value": "v", "@index": 1}}),
            json!({"http://x/p": {"@set": [1], "http://x/q": 2}}),
        ];
        for case in cases {
            let err = expand_doc(case.clone()).unwrap_err();
            assert_eq!(err.code(), "INVALID_INPUT", "case {case}");
        }
    }

    #[test]
    fn frame_expansion_keeps_wildcards() {
        let active = ActiveContext::default()
            .parse(&json!({"@vocab": "http://x/"}))
            .unwrap();
        let frame = expand_frame(
            &active,
            &json!({"@type": {}, "name": {}, "@explicit": true, "status": {"@default": "n/a"}}),
        )
        .unwrap();
        assert_eq!(
            frame,
            vec![json!({
                "@type": [{}],
                "http://x/name": [{}],
                "@explicit": true,
                "http://x/status": [{"@default": [{"@value": "n/a"}]}]
            })]
        );
    }

    #[test]
    fn empty_array_property_is_kept() {
        let expanded = expand_doc(json!({"@id": "http://x/a", "http://x/p": []})).unwrap();
        assert_eq!(expanded, vec![json!({"@id": "http://x/a", "http://x/p": []})]);
    }
}
