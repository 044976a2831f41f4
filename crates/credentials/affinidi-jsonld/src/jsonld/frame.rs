use std::collections::{BTreeMap, HashSet};

use serde_json::{Map, Value};

use super::context::ActiveContext;
use super::node_map::{NodeMap, create_node_map};
use super::util::{add_value, as_slice, compare_values, is_keyword, is_list_object, is_value_object};
use crate::error::{JsonLdError, Result};
use crate::model::DEFAULT_GRAPH;
use crate::namer::UniqueNamer;
use crate::options::{Embed, JsonLdOptions};

/// Frame an expanded document.
///
/// The input is flattened into a node map and every node of the default graph that
/// matches `expanded_frame` becomes a top-level result, with referenced nodes embedded
/// according to the `@embed` rules. Matches are returned in the order their nodes
/// appear in the input.
pub fn frame(
    expanded_input: &Value,
    expanded_frame: &[Value],
    options: &JsonLdOptions,
    namer: &mut UniqueNamer,
) -> Result<Vec<Value>> {
    let frame = match expanded_frame {
        [] => Map::new(),
        [Value::Object(frame)] => frame.clone(),
        _ => {
            return Err(JsonLdError::invalid_input(
                "a frame must be a single JSON object",
            ));
        }
    };

    let mut node_map = NodeMap::new();
    let first_seen = create_node_map(expanded_input, &mut node_map, DEFAULT_GRAPH, namer)?;
    let graph = node_map.remove(DEFAULT_GRAPH).unwrap_or_default();

    let mut framer = Framer {
        graph: &graph,
        embed: options.embed,
        explicit: options.explicit,
        omit_default: options.omit_default,
        embedded: HashSet::new(),
        path: Vec::new(),
    };
    let subjects: Vec<&str> = first_seen.iter().map(String::as_str).collect();
    let mut output = Vec::new();
    framer.match_frame(&subjects, &frame, &mut output, true)?;

    tracing::debug!(
        nodes = graph.len(),
        matched = output.len(),
        "framed document"
    );
    Ok(output)
}

/// Replace the `{"@preserve": ...}` placeholders left by framing with their values
/// (`"@null"` becomes `null`). Runs on compacted output.
pub fn remove_preserve(active: &ActiveContext, input: Value, compact_arrays: bool) -> Value {
    match input {
        Value::Array(items) => Value::Array(
            items
                .into_iter()
                .map(|item| remove_preserve(active, item, compact_arrays))
                .filter(|item| !item.is_null())
                .collect(),
        ),
        Value::Object(mut map) => {
            if let Some(preserved) = map.remove("@preserve") {
                if preserved.as_str() == Some("@null") {
                    return Value::Null;
                }
                return preserved;
            }
            if map.contains_key("@value") {
                return Value::Object(map);
            }
            if let Some(list) = map.remove("@list") {
                map.insert("@list".to_string(), remove_preserve(active, list, compact_arrays));
                return Value::Object(map);
            }
            let mut output = Map::new();
            for (property, value) in map {
                let mut result = remove_preserve(active, value, compact_arrays);
                let has_container = active
                    .term_definition(&property)
                    .is_some_and(|def| !def.container.is_empty());
                if compact_arrays && !has_container {
                    if let Value::Array(items) = &mut result {
                        if items.len() == 1 {
                            result = items.remove(0);
                        }
                    }
                }
                output.insert(property, result);
            }
            Value::Object(output)
        }
        other => other,
    }
}

struct Framer<'g> {
    graph: &'g BTreeMap<String, Map<String, Value>>,
    embed: Embed,
    explicit: bool,
    omit_default: bool,
    /// Nodes embedded under the current top-level match
    embedded: HashSet<String>,
    /// Nodes being embedded on the current recursion path
    path: Vec<String>,
}

impl Framer<'_> {
    fn match_frame(
        &mut self,
        subjects: &[&str],
        frame: &Map<String, Value>,
        output: &mut Vec<Value>,
        top_level: bool,
    ) -> Result<()> {
        let embed = embed_flag(frame, self.embed)?;
        let explicit = bool_flag(frame, "@explicit", self.explicit);
        let omit_default = bool_flag(frame, "@omitDefault", self.omit_default);

        for id in subjects {
            let Some(node) = self.graph.get(*id) else {
                continue;
            };
            if !filter_node(node, frame) {
                continue;
            }
            if top_level {
                self.embedded.clear();
            }

            let reference_only = match embed {
                Embed::Never => true,
                Embed::Once => self.embedded.contains(*id),
                Embed::Always => self.path.iter().any(|p| p == id),
            };
            if reference_only {
                output.push(reference(id));
                continue;
            }

            self.embedded.insert(id.to_string());
            self.path.push(id.to_string());
            let framed = self.frame_node(node, frame, embed, explicit, omit_default);
            self.path.pop();
            output.push(Value::Object(framed?));
        }
        Ok(())
    }

    fn frame_node(
        &mut self,
        node: &Map<String, Value>,
        frame: &Map<String, Value>,
        embed: Embed,
        explicit: bool,
        omit_default: bool,
    ) -> Result<Map<String, Value>> {
        let mut output = Map::new();
        for (keyword, value) in node.iter().filter(|(k, _)| is_keyword(k)) {
            output.insert(keyword.clone(), value.clone());
        }

        let properties: Vec<&String> = if explicit {
            frame
                .keys()
                .filter(|k| !is_keyword(k) && node.contains_key(*k))
                .collect()
        } else {
            node.keys().filter(|k| !is_keyword(k)).collect()
        };

        for property in properties {
            let values = as_slice(&node[property.as_str()]);
            if values.is_empty() {
                output.insert(property.clone(), Value::Array(Vec::new()));
                continue;
            }
            let subframe = subframe_for(frame, property, embed, explicit);

            for item in values {
                if is_list_object(item) {
                    let mut list = Vec::new();
                    for list_item in as_slice(&item["@list"]) {
                        match list_item.get("@id").and_then(Value::as_str) {
                            Some(id) if !is_value_object(list_item) => {
                                self.match_frame(&[id], &subframe, &mut list, false)?;
                            }
                            _ => list.push(list_item.clone()),
                        }
                    }
                    let mut list_object = Map::new();
                    list_object.insert("@list".to_string(), Value::Array(list));
                    add_value(&mut output, property, Value::Object(list_object), true, true);
                } else if let Some(id) = item.get("@id").and_then(Value::as_str) {
                    let mut embedded = Vec::new();
                    self.match_frame(&[id], &subframe, &mut embedded, false)?;
                    for framed in embedded {
                        add_value(&mut output, property, framed, true, true);
                    }
                } else {
                    add_value(&mut output, property, item.clone(), true, true);
                }
            }
        }

        for (property, pattern) in frame.iter().filter(|(k, _)| !is_keyword(k)) {
            if output.contains_key(property) {
                continue;
            }
            let next = as_slice(pattern)
                .first()
                .and_then(Value::as_object)
                .cloned()
                .unwrap_or_default();
            if bool_flag(&next, "@omitDefault", omit_default) {
                continue;
            }
            let default = match next.get("@default") {
                Some(Value::Array(values)) => Value::Array(values.clone()),
                Some(value) => Value::Array(vec![value.clone()]),
                None => Value::Array(vec![Value::String("@null".to_string())]),
            };
            let mut preserve = Map::new();
            preserve.insert("@preserve".to_string(), default);
            output.insert(property.clone(), Value::Array(vec![Value::Object(preserve)]));
        }

        Ok(output)
    }
}

fn reference(id: &str) -> Value {
    let mut node = Map::new();
    node.insert("@id".to_string(), Value::String(id.to_string()));
    Value::Object(node)
}

/// Frame used for values of `property`: the frame's own pattern when it is a node
/// pattern, otherwise an implicit frame carrying the current flags.
fn subframe_for(
    frame: &Map<String, Value>,
    property: &str,
    embed: Embed,
    explicit: bool,
) -> Map<String, Value> {
    if let Some(Value::Object(pattern)) = frame.get(property).and_then(|p| as_slice(p).first()) {
        if !pattern.contains_key("@value") {
            return pattern.clone();
        }
    }
    let mut implicit = Map::new();
    implicit.insert(
        "@embed".to_string(),
        serde_json::to_value(embed).unwrap_or(Value::Null),
    );
    implicit.insert("@explicit".to_string(), Value::Bool(explicit));
    implicit
}

fn embed_flag(frame: &Map<String, Value>, default: Embed) -> Result<Embed> {
    let value = match frame.get("@embed") {
        None => return Ok(default),
        Some(Value::Array(values)) => match values.first() {
            Some(first) => first,
            None => return Ok(default),
        },
        Some(value) => value,
    };
    match value {
        Value::Bool(true) => Ok(Embed::Once),
        Value::Bool(false) => Ok(Embed::Never),
        Value::String(s) => match s.as_str() {
            "@always" => Ok(Embed::Always),
            "@once" | "@last" => Ok(Embed::Once),
            "@never" => Ok(Embed::Never),
            other => Err(JsonLdError::invalid_input(format!(
                "invalid @embed value '{other}'"
            ))),
        },
        other => Err(JsonLdError::invalid_input(format!(
            "invalid @embed value {other}"
        ))),
    }
}

fn bool_flag(frame: &Map<String, Value>, key: &str, default: bool) -> bool {
    let value = match frame.get(key) {
        Some(Value::Array(values)) => values.first(),
        other => other,
    };
    match value {
        Some(Value::Bool(b)) => *b,
        Some(Value::String(s)) if s == "true" => true,
        Some(Value::String(s)) if s == "false" => false,
        _ => default,
    }
}

/// Returns true if `node` satisfies the `@type`, `@id` and property patterns of `frame`.
fn filter_node(node: &Map<String, Value>, frame: &Map<String, Value>) -> bool {
    let node_types = node.get("@type").map(as_slice).unwrap_or_default();

    if let Some(frame_types) = frame.get("@type") {
        let frame_types = as_slice(frame_types);
        let wildcard = frame_types.len() == 1 && is_empty_object(&frame_types[0]);
        if frame_types.is_empty() {
            if !node_types.is_empty() {
                return false;
            }
        } else if wildcard {
            if node_types.is_empty() {
                return false;
            }
        } else if !frame_types.iter().all(|t| node_types.contains(t)) {
            return false;
        }
    }

    if let Some(frame_ids) = frame.get("@id") {
        let frame_ids = as_slice(frame_ids);
        let wildcard = frame_ids.iter().any(is_empty_object);
        if !wildcard && !frame_ids.is_empty() && !frame_ids.iter().any(|id| Some(id) == node.get("@id")) {
            return false;
        }
    }

    frame
        .iter()
        .filter(|(k, _)| !is_keyword(k))
        .all(|(property, pattern)| property_matches(node.get(property), pattern))
}

fn property_matches(values: Option<&Value>, pattern: &Value) -> bool {
    let values = values.map(as_slice).unwrap_or_default();
    let patterns = as_slice(pattern);

    let Some(first) = patterns.first() else {
        // `[]` matches only when the property is absent
        return values.is_empty();
    };
    let optional = first.get("@default").is_some();
    if optional {
        return true;
    }

    match first {
        Value::Object(p) if is_wildcard(p) => !values.is_empty(),
        Value::Object(p) if p.contains_key("@value") => patterns
            .iter()
            .any(|pattern| values.iter().any(|v| compare_values(v, pattern))),
        Value::Object(p) => match p.get("@id").and_then(Value::as_str) {
            Some(id) => values
                .iter()
                .any(|v| v.get("@id").and_then(Value::as_str) == Some(id)),
            None => values.iter().any(|v| v.get("@id").is_some() || is_list_object(v)),
        },
        other => values.iter().any(|v| compare_values(v, other)),
    }
}

fn is_empty_object(value: &Value) -> bool {
    value.as_object().is_some_and(Map::is_empty)
}

/// `{}` or an object holding only framing flags.
fn is_wildcard(pattern: &Map<String, Value>) -> bool {
    pattern
        .keys()
        .all(|k| matches!(k.as_str(), "@embed" | "@explicit" | "@omitDefault"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn run(input: Value, frame_value: Value, options: &JsonLdOptions) -> Vec<Value> {
        let frames = match frame_value {
            Value::Array(items) => items,
            other => vec![other],
        };
        frame(&input, &frames, options, &mut UniqueNamer::new("_:b")).unwrap()
    }

    fn library() -> Value {
        json!([
            {
                "@id": "http://x/lib",
                "@type": ["http://x/Library"],
                "http://x/contains": [{"@id": "http://x/book"}]
            },
            {
                "@id": "http://x/book",
                "@type": ["http://x/Book"],
                "http://x/title": [{"@value": "Moby"}]
            }
        ])
    }

    #[test]
    fn matches_by_type_and_embeds() {
        let framed = run(
            library(),
            json!({"@type": ["http://x/Library"]}),
            &JsonLdOptions::default(),
        );
        assert_eq!(
            framed,
            vec![json!({
                "@id": "http://x/lib",
                "@type": ["http://x/Library"],
                "http://x/contains": [{
                    "@id": "http://x/book",
                    "@type": ["http://x/Book"],
                    "http://x/title": [{"@value": "Moby"}]
                }]
            })]
        );
    }

    #[test]
    fn embed_never_yields_references() {
        let framed = run(
            library(),
            json!({
                "@type": ["http://x/Library"],
                "http://x/contains": [{"@embed": "@never"}]
            }),
            &JsonLdOptions::default(),
        );
        assert_eq!(framed[0]["http://x/contains"], json!([{"@id": "http://x/book"}]));
    }

    #[test]
    fn explicit_limits_properties() {
        let framed = run(
            library(),
            json!({"@type": ["http://x/Book"], "@explicit": true, "http://x/missing": [{}]}),
            &JsonLdOptions::default(),
        );
        assert!(framed.is_empty());

        let framed = run(
            library(),
            json!({
                "@type": ["http://x/Book"],
                "@explicit": true,
                "http://x/author": [{"@default": [{"@value": "unknown"}]}]
            }),
            &JsonLdOptions::default(),
        );
        assert_eq!(
            framed,
            vec![json!({
                "@id": "http://x/book",
                "@type": ["http://x/Book"],
                "http://x/author": [{"@preserve": [{"@value": "unknown"}]}]
            })]
        );
    }

    #[test]
    fn missing_properties_default_to_null() {
        let framed = run(
            library(),
            json!({"@type": ["http://x/Book"], "http://x/isbn": [{"@omitDefault": false, "@default": "@null"}]}),
            &JsonLdOptions::default(),
        );
        assert_eq!(framed[0]["http://x/isbn"], json!([{"@preserve": ["@null"]}]));

        let options = JsonLdOptions::builder().with_omit_default(true).build();
        let framed = run(
            library(),
            json!({"@type": ["http://x/Book"], "http://x/isbn": [{"@default": "@null"}]}),
            &options,
        );
        assert!(framed[0].get("http://x/isbn").is_none());
    }

    #[test]
    fn embed_once_references_repeats() {
        let input = json!([
            {"@id": "http://x/a", "http://x/knows": [{"@id": "http://x/c"}], "http://x/likes": [{"@id": "http://x/c"}]},
            {"@id": "http://x/c", "http://x/name": [{"@value": "C"}]}
        ]);
        let framed = run(input, json!({"@id": ["http://x/a"]}), &JsonLdOptions::default());
        assert_eq!(
            framed[0]["http://x/knows"],
            json!([{"@id": "http://x/c", "http://x/name": [{"@value": "C"}]}])
        );
        assert_eq!(framed[0]["http://x/likes"], json!([{"@id": "http://x/c"}]));
    }

    #[test]
    fn embed_always_stops_at_cycles() {
        let input = json!([
            {"@id": "http://x/a", "http://x/knows": [{"@id": "http://x/b"}]},
            {"@id": "http://x/b", "http://x/knows": [{"@id": "http://x/a"}]}
        ]);
        let options = JsonLdOptions::builder().with_embed(Embed::Always).build();
        let framed = run(input, json!({"@id": ["http://x/a"]}), &options);
        assert_eq!(
            framed[0]["http://x/knows"],
            json!([{"@id": "http://x/b", "http://x/knows": [{"@id": "http://x/a"}]}])
        );
    }

    #[test]
    fn type_patterns() {
        let input = json!([
            {"@id": "http://x/typed", "@type": ["http://x/T", "http://x/U"]},
            {"@id": "http://x/untyped", "http://x/p": [{"@value": 1}]}
        ]);
        let options = JsonLdOptions::default();
        let ids = |framed: Vec<Value>| -> Vec<Value> {
            framed.iter().map(|n| n["@id"].clone()).collect()
        };
        assert_eq!(ids(run(input.clone(), json!({"@type": [{}]}), &options)), vec![json!("http://x/typed")]);
        assert_eq!(ids(run(input.clone(), json!({"@type": []}), &options)), vec![json!("http://x/untyped")]);
        assert_eq!(
            ids(run(input.clone(), json!({"@type": ["http://x/T", "http://x/U"]}), &options)),
            vec![json!("http://x/typed")]
        );
        assert!(run(input.clone(), json!({"@type": ["http://x/T", "http://x/V"]}), &options).is_empty());
        assert_eq!(
            ids(run(input, json!({"http://x/p": [{"@value": 1}]}), &options)),
            vec![json!("http://x/untyped")]
        );
    }

    #[test]
    fn rejects_multiple_frames() {
        let err = frame(
            &library(),
            &[json!({}), json!({})],
            &JsonLdOptions::default(),
            &mut UniqueNamer::new("_:b"),
        )
        .unwrap_err();
        assert_eq!(err.code(), "INVALID_INPUT");
    }

    #[test]
    fn preserve_placeholders_are_removed() {
        let active = ActiveContext::default();
        let compacted = json!({
            "@id": "http://x/book",
            "http://x/author": {"@preserve": "unknown"},
            "http://x/isbn": {"@preserve": "@null"},
            "http://x/tags": [{"@preserve": "a"}]
        });
        assert_eq!(
            remove_preserve(&active, compacted, true),
            json!({
                "@id": "http://x/book",
                "http://x/author": "unknown",
                "http://x/isbn": null,
                "http://x/tags": "a"
            })
        );
    }

    #[test]
    fn keeps_document_order_unless_explicit() {
        let input = json!([
            {
                "@id": "http://x/z",
                "@type": ["http://x/T"],
                "http://x/zeta": [{"@value": 1}],
                "http://x/alpha": [{"@value": 2}]
            },
            {"@id": "http://x/a", "@type": ["http://x/T"]}
        ]);
        let keys = |node: &Value| -> Vec<String> {
            node.as_object().unwrap().keys().cloned().collect()
        };

        let framed = run(input.clone(), json!({"@type": ["http://x/T"]}), &JsonLdOptions::default());
        let ids: Vec<&Value> = framed.iter().map(|n| &n["@id"]).collect();
        assert_eq!(ids, vec!["http://x/z", "http://x/a"]);
        assert_eq!(keys(&framed[0]), vec!["@id", "@type", "http://x/zeta", "http://x/alpha"]);

        let framed = run(
            input,
            json!({
                "@type": ["http://x/T"],
                "@explicit": true,
                "http://x/alpha": [{}],
                "http://x/zeta": [{}]
            }),
            &JsonLdOptions::default(),
        );
        assert_eq!(framed.len(), 1);
        assert_eq!(keys(&framed[0]), vec!["@id", "@type", "http://x/alpha", "http://x/zeta"]);
    }
}
