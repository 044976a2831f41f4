use std::collections::BTreeMap;

use serde_json::{Map, Value};

use super::iri::is_blank_node_id;
use super::util::{add_value, as_slice, is_list_object, is_node_reference, is_value_object};
use crate::error::{JsonLdError, Result};
use crate::model::DEFAULT_GRAPH;
use crate::namer::UniqueNamer;

/// Graph name -> node id -> node object. Both levels are ordered by key; the
/// properties of a node object keep the order they were first seen in.
pub type NodeMap = BTreeMap<String, BTreeMap<String, Map<String, Value>>>;

/// What the element being processed hangs off.
enum ActiveSubject {
    /// A property value of the node with this id
    Node(String),
    /// A reverse property value: the element gets a forward reference to this node
    Reverse(Value),
}

/// Collect every node of an expanded document into `node_map`.
///
/// Blank node identifiers are relabelled through `namer`, and nodes without an `@id`
/// are given a fresh label. Property values of the same node are merged, with
/// duplicates removed (lists are always appended).
///
/// Returns the ids of the nodes added to `active_graph`, in the order they were first
/// seen.
pub fn create_node_map(
    element: &Value,
    node_map: &mut NodeMap,
    active_graph: &str,
    namer: &mut UniqueNamer,
) -> Result<Vec<String>> {
    node_map.entry(DEFAULT_GRAPH.to_string()).or_default();
    let mut builder = NodeMapBuilder {
        node_map,
        namer,
        active_graph,
        first_seen: Vec::new(),
    };
    builder.generate(element, active_graph, None, None, None)?;
    Ok(builder.first_seen)
}

/// Flatten an expanded document: one array of top-level nodes ordered by `@id`, with
/// named graphs nested under their graph node.
pub fn flatten(expanded: &Value, namer: &mut UniqueNamer) -> Result<Vec<Value>> {
    let mut node_map = NodeMap::new();
    create_node_map(expanded, &mut node_map, DEFAULT_GRAPH, namer)?;

    let mut default_graph = node_map.remove(DEFAULT_GRAPH).unwrap_or_default();
    for (graph_name, graph) in node_map {
        let entry = default_graph
            .entry(graph_name.clone())
            .or_insert_with(|| node_reference(&graph_name));
        entry.insert("@graph".to_string(), Value::Array(ordered_nodes(graph)));
    }

    let flattened = ordered_nodes(default_graph);
    tracing::debug!(nodes = flattened.len(), "flattened document");
    Ok(flattened)
}

/// Nodes of one graph in `@id` order, skipping nodes that carry nothing but an `@id`.
pub(crate) fn ordered_nodes(graph: BTreeMap<String, Map<String, Value>>) -> Vec<Value> {
    graph
        .into_values()
        .map(Value::Object)
        .filter(|node| !is_node_reference(node))
        .collect()
}

fn node_reference(id: &str) -> Map<String, Value> {
    let mut node = Map::new();
    node.insert("@id".to_string(), Value::String(id.to_string()));
    node
}

struct NodeMapBuilder<'a> {
    node_map: &'a mut NodeMap,
    namer: &'a mut UniqueNamer,
    active_graph: &'a str,
    first_seen: Vec<String>,
}

impl NodeMapBuilder<'_> {
    fn node_mut(&mut self, graph: &str, id: &str) -> &mut Map<String, Value> {
        let nodes = self.node_map.entry(graph.to_string()).or_default();
        if graph == self.active_graph && !nodes.contains_key(id) {
            self.first_seen.push(id.to_string());
        }
        nodes
            .entry(id.to_string())
            .or_insert_with(|| node_reference(id))
    }

    fn relabel(&mut self, id: &str) -> String {
        if is_blank_node_id(id) {
            self.namer.issue(id)
        } else {
            id.to_string()
        }
    }

    fn generate(
        &mut self,
        element: &Value,
        graph: &str,
        subject: Option<&ActiveSubject>,
        property: Option<&str>,
        mut list: Option<&mut Vec<Value>>,
    ) -> Result<()> {
        let node = match element {
            Value::Array(items) => {
                for item in items {
                    self.generate(item, graph, subject, property, list.as_deref_mut())?;
                }
                return Ok(());
            }
            Value::Object(node) => node,
            _ => return Ok(()),
        };

        if is_value_object(element) {
            let mut value = node.clone();
            if let Some(Value::String(t)) = value.get("@type") {
                if is_blank_node_id(t) {
                    let relabelled = self.relabel(t);
                    value.insert("@type".to_string(), Value::String(relabelled));
                }
            }
            match (list, subject, property) {
                (Some(list), _, _) => list.push(Value::Object(value)),
                (None, Some(ActiveSubject::Node(id)), Some(property)) => {
                    add_value(self.node_mut(graph, id), property, Value::Object(value), true, false);
                }
                _ => {}
            }
            return Ok(());
        }

        if is_list_object(element) {
            let mut items = Vec::new();
            if let Some(list_items) = node.get("@list") {
                self.generate(list_items, graph, subject, property, Some(&mut items))?;
            }
            let mut list_object = Map::new();
            list_object.insert("@list".to_string(), Value::Array(items));
            if let Some(index) = node.get("@index") {
                list_object.insert("@index".to_string(), index.clone());
            }
            match (list, subject, property) {
                (Some(list), _, _) => list.push(Value::Object(list_object)),
                (None, Some(ActiveSubject::Node(id)), Some(property)) => {
                    add_value(self.node_mut(graph, id), property, Value::Object(list_object), true, true);
                }
                _ => {}
            }
            return Ok(());
        }

        let id = match node.get("@id").and_then(Value::as_str) {
            Some(id) => self.relabel(id),
            None => self.namer.issue_fresh(),
        };
        self.node_mut(graph, &id);

        let reference = Value::Object(node_reference(&id));
        match (subject, property) {
            (Some(ActiveSubject::Reverse(referenced)), Some(property)) => {
                add_value(self.node_mut(graph, &id), property, referenced.clone(), true, false);
            }
            (Some(ActiveSubject::Node(subject_id)), Some(property)) => match list {
                Some(list) => list.push(reference.clone()),
                None => {
                    add_value(
                        self.node_mut(graph, subject_id),
                        property,
                        reference.clone(),
                        true,
                        false,
                    );
                }
            },
            _ => {}
        }

        if let Some(types) = node.get("@type") {
            let mut relabelled = Vec::new();
            for t in as_slice(types) {
                match t.as_str() {
                    Some(t) => relabelled.push(Value::String(self.relabel(t))),
                    None => relabelled.push(t.clone()),
                }
            }
            add_value(self.node_mut(graph, &id), "@type", Value::Array(relabelled), true, false);
        }

        if let Some(index) = node.get("@index") {
            let target = self.node_mut(graph, &id);
            if target.get("@index").is_some_and(|existing| existing != index) {
                return Err(JsonLdError::invalid_input(format!(
                    "conflicting @index values for node '{id}'"
                )));
            }
            target.insert("@index".to_string(), index.clone());
        }

        if let Some(Value::Object(reverse)) = node.get("@reverse") {
            let referenced = ActiveSubject::Reverse(reference.clone());
            for (reverse_property, values) in reverse {
                let reverse_property = self.relabel(reverse_property);
                self.generate(values, graph, Some(&referenced), Some(&reverse_property), None)?;
            }
        }

        if let Some(nested) = node.get("@graph") {
            self.node_map.entry(id.clone()).or_default();
            self.generate(nested, &id, None, None, None)?;
        }

        // keys are added in document order, values are visited in property order
        let mut properties = Vec::new();
        for property in node.keys().filter(|k| !k.starts_with('@')) {
            let relabelled = self.relabel(property);
            let target = self.node_mut(graph, &id);
            if !target.contains_key(&relabelled) {
                target.insert(relabelled.clone(), Value::Array(Vec::new()));
            }
            properties.push((property, relabelled));
        }
        properties.sort();

        let subject = ActiveSubject::Node(id.clone());
        for (property, relabelled) in properties {
            self.generate(&node[property.as_str()], graph, Some(&subject), Some(&relabelled), None)?;
        }

        Ok(())
    }
}
