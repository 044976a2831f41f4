use serde_json::{Map, Number, Value};

use super::iri::{is_absolute_or_blank, is_blank_node_id};
use super::node_map::NodeMap;
use super::util::{as_slice, is_keyword, is_list_object};
use crate::error::{JsonLdError, Result};
use crate::model::*;
use crate::namer::UniqueNamer;
use crate::options::JsonLdOptions;

/// Convert a node map to an RDF Dataset.
///
/// Graphs, subjects and properties are visited in sorted order so the output is
/// deterministic. Relative IRIs have no RDF meaning and are skipped, as are blank node
/// predicates unless `produce_generalized_rdf` is set. List nodes are labelled through
/// `namer`, which must be the namer that built `node_map`.
pub fn to_rdf(
    node_map: &NodeMap,
    namer: &mut UniqueNamer,
    options: &JsonLdOptions,
) -> Result<Dataset> {
    let mut dataset = Dataset::new();

    for (graph_name, graph) in node_map {
        if !graph_name_is_valid(graph_name) {
            tracing::trace!(graph = %graph_name, "skipping graph with relative name");
            continue;
        }
        let label = GraphLabel::from_name(graph_name);
        let mut emitter = Emitter {
            dataset: &mut dataset,
            namer: &mut *namer,
            graph: label,
        };

        for (id, node) in graph {
            if !is_absolute_or_blank(id) {
                continue;
            }
            let subject = Subject::from_id(id);
            emitter.node(&subject, node, options)?;
        }
    }

    tracing::debug!(quads = dataset.len(), "converted node map to RDF");
    Ok(dataset)
}

fn graph_name_is_valid(name: &str) -> bool {
    name == DEFAULT_GRAPH || is_absolute_or_blank(name)
}

struct Emitter<'a> {
    dataset: &'a mut Dataset,
    namer: &'a mut UniqueNamer,
    graph: GraphLabel,
}

impl Emitter<'_> {
    fn emit(&mut self, subject: Subject, predicate: NamedNode, object: Object) {
        self.dataset
            .add(Quad::new(subject, predicate, object, self.graph.clone()));
    }

    fn node(
        &mut self,
        subject: &Subject,
        node: &Map<String, Value>,
        options: &JsonLdOptions,
    ) -> Result<()> {
        let mut properties: Vec<&String> = node.keys().collect();
        properties.sort();

        for property in properties {
            let items = as_slice(&node[property.as_str()]);
            if property == "@type" {
                let predicate = NamedNode::new(rdf::TYPE);
                for item in items {
                    if let Some(object) = item.as_str().and_then(iri_object) {
                        self.emit(subject.clone(), predicate.clone(), object);
                    }
                }
                continue;
            }
            if is_keyword(property) || !is_absolute_or_blank(property) {
                continue;
            }
            if is_blank_node_id(property) && !options.produce_generalized_rdf {
                tracing::trace!(property = %property, "skipping blank node predicate");
                continue;
            }
            let predicate = NamedNode::new(property.as_str());

            for item in items {
                if is_list_object(item) {
                    let list = as_slice(&item["@list"]);
                    self.list(subject.clone(), predicate.clone(), list)?;
                } else if let Some(object) = object_for(item)? {
                    self.emit(subject.clone(), predicate.clone(), object);
                }
            }
        }
        Ok(())
    }

    /// Emit an `rdf:first`/`rdf:rest` chain for `list`, linked from `subject`.
    fn list(&mut self, subject: Subject, predicate: NamedNode, list: &[Value]) -> Result<()> {
        let mut subject = subject;
        let mut predicate = predicate;
        for item in list {
            let node = self.namer.issue_fresh();
            let node = Subject::from_id(&node);
            self.emit(subject, predicate, node.clone().into());

            if let Some(object) = object_for(item)? {
                self.emit(node.clone(), NamedNode::new(rdf::FIRST), object);
            }
            subject = node;
            predicate = NamedNode::new(rdf::REST);
        }
        self.emit(subject, predicate, Object::Named(NamedNode::new(rdf::NIL)));
        Ok(())
    }
}

fn iri_object(iri: &str) -> Option<Object> {
    if is_absolute_or_blank(iri) {
        Some(Object::from_id(iri))
    } else {
        None
    }
}

/// RDF object for a value object or node reference; `None` when it has no RDF form.
fn object_for(item: &Value) -> Result<Option<Object>> {
    let Value::Object(map) = item else {
        return Ok(None);
    };
    if let Some(value) = map.get("@value") {
        return literal_for(value, map).map(|l| Some(Object::Literal(l)));
    }
    Ok(map.get("@id").and_then(Value::as_str).and_then(iri_object))
}

fn literal_for(value: &Value, object: &Map<String, Value>) -> Result<Literal> {
    let datatype = object.get("@type").and_then(Value::as_str);

    let literal = match value {
        Value::Bool(b) => Literal::typed(
            b.to_string(),
            NamedNode::new(datatype.unwrap_or(xsd::BOOLEAN)),
        ),
        Value::Number(n) if is_integer(n) && datatype != Some(xsd::DOUBLE) => Literal::typed(
            n.to_string(),
            NamedNode::new(datatype.unwrap_or(xsd::INTEGER)),
        ),
        Value::Number(n) => {
            let f = n
                .as_f64()
                .ok_or_else(|| JsonLdError::rdf(format!("number {n} is not representable")))?;
            Literal::typed(
                canonical_double(f),
                NamedNode::new(datatype.unwrap_or(xsd::DOUBLE)),
            )
        }
        Value::String(s) => match object.get("@language").and_then(Value::as_str) {
            Some(language) => Literal::lang(s.as_str(), language),
            None => Literal::typed(s.as_str(), NamedNode::new(datatype.unwrap_or(xsd::STRING))),
        },
        other => {
            return Err(JsonLdError::rdf(format!(
                "invalid @value {other} in expanded input"
            )));
        }
    };
    Ok(literal)
}

fn is_integer(n: &Number) -> bool {
    n.is_i64() || n.is_u64()
}

/// Canonical `xsd:double` lexical form: `d.dddE±n` with trailing zeros removed.
pub(crate) fn canonical_double(value: f64) -> String {
    let formatted = format!("{value:.15E}");
    let Some((mantissa, exponent)) = formatted.split_once('E') else {
        return formatted;
    };
    let mut mantissa = mantissa.trim_end_matches('0').to_string();
    if mantissa.ends_with('.') {
        mantissa.push('0');
    }
    format!("{mantissa}E{exponent}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jsonld::node_map::create_node_map;
    use serde_json::json;

    fn convert(expanded: Value, options: &JsonLdOptions) -> Dataset {
        let mut namer = UniqueNamer::new("_:b");
        let mut node_map = NodeMap::new();
        create_node_map(&expanded, &mut node_map, DEFAULT_GRAPH, &mut namer).unwrap();
        to_rdf(&node_map, &mut namer, options).unwrap()
    }

    fn objects(dataset: &Dataset) -> Vec<Object> {
        dataset.quads().map(|q| q.object.clone()).collect()
    }

    #[test]
    fn simple_node_to_rdf() {
        let expanded = json!([{
            "@id": "http://example.org/s",
            "@type": ["http://example.org/Type"],
            "http://example.org/p": [{"@value": "hello"}]
        }]);

        let ds = convert(expanded, &JsonLdOptions::default());
        assert_eq!(ds.len(), 2);
        let quads: Vec<&Quad> = ds.quads().collect();
        assert_eq!(quads[0].predicate.iri, rdf::TYPE);
        assert_eq!(quads[1].object, Object::Literal(Literal::new("hello")));
    }

    #[test]
    fn blank_node_subject() {
        let expanded = json!([{
            "@type": ["http://example.org/Type"]
        }]);

        let ds = convert(expanded, &JsonLdOptions::default());
        let q = ds.quads().next().unwrap();
        assert_eq!(q.subject, Subject::Blank(BlankNode::new("b0")));
    }

    #[test]
    fn native_literals() {
        let expanded = json!([{
            "@id": "http://example.org/s",
            "http://example.org/a": [{"@value": true}],
            "http://example.org/b": [{"@value": 42}],
            "http://example.org/c": [{"@value": 5.3}],
            "http://example.org/d": [{"@value": 7, "@type": xsd::DOUBLE}],
            "http://example.org/e": [{"@value": "bonjour", "@language": "fr"}],
            "http://example.org/f": [{"@value": "2023-01-01", "@type": xsd::DATE_TIME}]
        }]);

        let ds = convert(expanded, &JsonLdOptions::default());
        assert_eq!(
            objects(&ds),
            vec![
                Object::Literal(Literal::typed("true", NamedNode::new(xsd::BOOLEAN))),
                Object::Literal(Literal::typed("42", NamedNode::new(xsd::INTEGER))),
                Object::Literal(Literal::typed("5.3E0", NamedNode::new(xsd::DOUBLE))),
                Object::Literal(Literal::typed("7.0E0", NamedNode::new(xsd::DOUBLE))),
                Object::Literal(Literal::lang("bonjour", "fr")),
                Object::Literal(Literal::typed("2023-01-01", NamedNode::new(xsd::DATE_TIME))),
            ]
        );
    }

    #[test]
    fn doubles_use_canonical_form() {
        assert_eq!(canonical_double(5.3), "5.3E0");
        assert_eq!(canonical_double(10.0), "1.0E1");
        assert_eq!(canonical_double(-0.00015), "-1.5E-4");
        assert_eq!(canonical_double(1.1e21), "1.1E21");
    }

    #[test]
    fn lists_become_chains() {
        let expanded = json!([{
            "@id": "http://example.org/s",
            "http://example.org/l": [{"@list": [{"@value": 1}, {"@id": "http://example.org/o"}]}],
            "http://example.org/empty": [{"@list": []}]
        }]);

        let ds = convert(expanded, &JsonLdOptions::default());
        let lines: Vec<String> = ds
            .quads()
            .map(|q| format!("{} {} {}", q.subject, q.predicate, q.object))
            .collect();
        assert_eq!(
            lines,
            vec![
                format!("<http://example.org/s> <http://example.org/empty> <{}>", rdf::NIL),
                "<http://example.org/s> <http://example.org/l> _:b0".to_string(),
                format!(
                    "_:b0 <{}> \"1\"^^<{}>",
                    rdf::FIRST,
                    xsd::INTEGER
                ),
                format!("_:b0 <{}> _:b1", rdf::REST),
                format!("_:b1 <{}> <http://example.org/o>", rdf::FIRST),
                format!("_:b1 <{}> <{}>", rdf::REST, rdf::NIL),
            ]
        );
    }

    #[test]
    fn skips_relative_iris_and_blank_predicates() {
        let expanded = json!([{
            "@id": "http://example.org/s",
            "relative": [{"@value": "x"}],
            "_:p": [{"@value": "y"}],
            "http://example.org/link": [{"@id": "relative/target"}]
        }]);

        let ds = convert(expanded.clone(), &JsonLdOptions::default());
        assert!(ds.is_empty());

        let options = JsonLdOptions::builder()
            .with_produce_generalized_rdf(true)
            .build();
        let ds = convert(expanded, &options);
        assert_eq!(ds.len(), 1);
    }

    #[test]
    fn named_graphs() {
        let expanded = json!([{
            "@id": "http://example.org/g",
            "@graph": [{"@id": "http://example.org/s", "http://example.org/p": [{"@id": "http://example.org/o"}]}]
        }]);

        let ds = convert(expanded, &JsonLdOptions::default());
        assert_eq!(ds.graph("http://example.org/g").len(), 1);
        assert!(ds.graph(DEFAULT_GRAPH).is_empty());
    }
}
