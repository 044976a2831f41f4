use std::collections::{BTreeMap, HashMap};

use serde_json::{Map, Value};

use super::iri::is_blank_node_id;
use super::to_rdf::canonical_double;
use super::util::is_node_reference;
use crate::error::Result;
use crate::model::*;
use crate::options::JsonLdOptions;

/// Where a node is referenced from: `graph[node][property][index]`.
#[derive(Clone, Debug)]
struct Usage {
    node: String,
    property: String,
    index: usize,
}

type Graph = BTreeMap<String, Map<String, Value>>;

/// Convert an RDF Dataset to expanded JSON-LD.
///
/// Subjects are grouped per graph and emitted in `@id` order; named graphs become
/// `@graph` entries on their graph node. Well-formed `rdf:first`/`rdf:rest` chains of
/// blank nodes are collapsed into `@list` objects.
pub fn from_rdf(dataset: &Dataset, options: &JsonLdOptions) -> Result<Vec<Value>> {
    let mut graphs: BTreeMap<String, Graph> = BTreeMap::new();
    graphs.entry(DEFAULT_GRAPH.to_string()).or_default();
    // `None` once a node is referenced more than once
    let mut referenced_once: HashMap<String, Option<Usage>> = HashMap::new();
    let mut nil_usages: HashMap<String, Vec<Usage>> = HashMap::new();

    for (graph_name, quads) in &dataset.graphs {
        if graph_name != DEFAULT_GRAPH {
            graphs
                .entry(DEFAULT_GRAPH.to_string())
                .or_default()
                .entry(graph_name.clone())
                .or_insert_with(|| reference(graph_name));
        }
        let graph = graphs.entry(graph_name.clone()).or_default();

        for quad in quads {
            let subject = quad.subject.to_id();
            graph
                .entry(subject.clone())
                .or_insert_with(|| reference(&subject));

            let object_id = quad.object.to_id();
            if let Some(id) = &object_id {
                graph.entry(id.clone()).or_insert_with(|| reference(id));
            }

            let predicate = quad.predicate.iri.as_str();
            let Some(node) = graph.get_mut(&subject) else {
                continue;
            };
            if predicate == rdf::TYPE && !options.use_rdf_type {
                if let Some(id) = &object_id {
                    push_unique(node, "@type", Value::String(id.clone()));
                    continue;
                }
            }

            let value = rdf_to_object(&quad.object, options.use_native_types);
            let index = push_unique(node, predicate, value);

            if let Some(id) = object_id {
                let usage = Usage {
                    node: subject,
                    property: predicate.to_string(),
                    index,
                };
                if id == rdf::NIL {
                    nil_usages.entry(graph_name.clone()).or_default().push(usage);
                } else {
                    referenced_once
                        .entry(id)
                        .and_modify(|u| *u = None)
                        .or_insert(Some(usage));
                }
            }
        }
    }

    for (graph_name, usages) in nil_usages {
        if let Some(graph) = graphs.get_mut(&graph_name) {
            collapse_lists(graph, usages, &referenced_once);
        }
    }

    let default_graph = graphs.remove(DEFAULT_GRAPH).unwrap_or_default();
    let mut result = Vec::new();
    for (id, mut node) in default_graph {
        if let Some(graph) = graphs.remove(&id) {
            let nodes: Vec<Value> = graph
                .into_values()
                .map(Value::Object)
                .filter(|n| !is_node_reference(n))
                .collect();
            node.insert("@graph".to_string(), Value::Array(nodes));
        }
        let node = Value::Object(node);
        if !is_node_reference(&node) {
            result.push(node);
        }
    }

    tracing::debug!(
        quads = dataset.len(),
        nodes = result.len(),
        "converted RDF to JSON-LD"
    );
    Ok(result)
}

fn reference(id: &str) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("@id".to_string(), Value::String(id.to_string()));
    node
}

/// Append `value` to `node[property]` unless already present; returns its index.
fn push_unique(node: &mut Map<String, Value>, property: &str, value: Value) -> usize {
    let entry = node
        .entry(property.to_string())
        .or_insert_with(|| Value::Array(Vec::new()));
    if !entry.is_array() {
        *entry = Value::Array(vec![entry.take()]);
    }
    match entry {
        Value::Array(values) => match values.iter().position(|v| *v == value) {
            Some(index) => index,
            None => {
                values.push(value);
                values.len() - 1
            }
        },
        _ => 0,
    }
}

fn single<'a>(node: &'a Map<String, Value>, property: &str) -> Option<&'a Value> {
    match node.get(property) {
        Some(Value::Array(values)) if values.len() == 1 => values.first(),
        _ => None,
    }
}

/// A blank node that is nothing but one `rdf:first`, one `rdf:rest` and optionally
/// `@type: [rdf:List]`.
fn is_list_node(node: &Map<String, Value>) -> bool {
    let typed_as_list = || {
        node.get("@type").is_some_and(|t| {
            t.as_array()
                .is_some_and(|t| t.len() == 1 && t[0].as_str() == Some(rdf::LIST))
        })
    };
    single(node, rdf::FIRST).is_some()
        && single(node, rdf::REST).is_some()
        && (node.len() == 3 || (node.len() == 4 && typed_as_list()))
}

fn collapse_lists(
    graph: &mut Graph,
    nil_usages: Vec<Usage>,
    referenced_once: &HashMap<String, Option<Usage>>,
) {
    for mut usage in nil_usages {
        let mut list = Vec::new();
        let mut list_nodes = Vec::new();

        loop {
            let Some(node) = graph.get(&usage.node) else {
                break;
            };
            let next = match referenced_once.get(&usage.node) {
                Some(Some(next)) => next,
                _ => break,
            };
            if usage.property != rdf::REST || !is_blank_node_id(&usage.node) || !is_list_node(node)
            {
                break;
            }
            if let Some(first) = single(node, rdf::FIRST) {
                list.push(first.clone());
            }
            list_nodes.push(usage.node.clone());
            usage = next.clone();
        }

        if usage.property == rdf::FIRST {
            // the chain is itself the first item of an enclosing list
            if usage.node == rdf::NIL {
                continue;
            }
            let head_id = graph
                .get(&usage.node)
                .and_then(|n| n.get(rdf::FIRST))
                .and_then(|v| v.get(usage.index))
                .and_then(|v| v.get("@id"))
                .and_then(Value::as_str)
                .map(str::to_string);
            let Some(head_id) = head_id else {
                continue;
            };
            usage = Usage {
                node: head_id,
                property: rdf::REST.to_string(),
                index: 0,
            };
            list.pop();
            list_nodes.pop();
        }

        let Some(head) = graph
            .get_mut(&usage.node)
            .and_then(|n| n.get_mut(&usage.property))
            .and_then(|v| v.get_mut(usage.index))
        else {
            continue;
        };
        list.reverse();
        let mut list_object = Map::new();
        list_object.insert("@list".to_string(), Value::Array(list));
        *head = Value::Object(list_object);

        for id in list_nodes {
            graph.remove(&id);
        }
    }
}

fn rdf_to_object(object: &Object, use_native_types: bool) -> Value {
    let literal = match object {
        Object::Named(n) => return Value::Object(reference(&n.iri)),
        Object::Blank(b) => return Value::Object(reference(&format!("_:{}", b.id))),
        Object::Literal(literal) => literal,
    };

    let mut value = Map::new();
    if let Some(language) = &literal.language {
        value.insert("@value".to_string(), Value::String(literal.value.clone()));
        value.insert("@language".to_string(), Value::String(language.clone()));
        return Value::Object(value);
    }

    let datatype = literal.datatype.iri.as_str();
    let native = if use_native_types {
        native_value(&literal.value, datatype)
    } else {
        None
    };
    match native {
        Some(native) => {
            value.insert("@value".to_string(), native);
        }
        None => {
            value.insert("@value".to_string(), Value::String(literal.value.clone()));
            if datatype != xsd::STRING {
                value.insert("@type".to_string(), Value::String(datatype.to_string()));
            }
        }
    }
    Value::Object(value)
}

/// Native JSON value for a boolean, integer or double literal whose lexical form is
/// already canonical, so converting back yields the same literal.
fn native_value(lexical: &str, datatype: &str) -> Option<Value> {
    match datatype {
        xsd::BOOLEAN => match lexical {
            "true" => Some(Value::Bool(true)),
            "false" => Some(Value::Bool(false)),
            _ => None,
        },
        xsd::INTEGER => {
            let n: i64 = lexical.parse().ok()?;
            (n.to_string() == lexical).then(|| Value::from(n))
        }
        xsd::DOUBLE => {
            let f: f64 = lexical.parse().ok()?;
            if !f.is_finite() || canonical_double(f) != lexical {
                return None;
            }
            serde_json::Number::from_f64(f).map(Value::Number)
        }
        _ => None,
    }
}
