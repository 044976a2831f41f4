//! Turtle output for the default graph of a dataset.

use std::collections::BTreeMap;

use crate::error::Result;
use crate::model::{DEFAULT_GRAPH, Dataset, Literal, NamedNode, Object, Subject, rdf, xsd};
use crate::nquads::escape::escape_into;
use crate::registry::RdfSerializer;

pub const MEDIA_TYPE: &str = "text/turtle";

/// Turtle serializer for the format registry.
///
/// Prefixes come from the dataset namespace table (the empty prefix is written as
/// `@prefix :`). Only the default graph is written; quads in named graphs are dropped
/// with a warning.
#[derive(Clone, Copy, Debug, Default)]
pub struct Turtle;

impl RdfSerializer for Turtle {
    fn serialize(&self, dataset: &Dataset) -> Result<String> {
        Ok(serialize(dataset))
    }
}

pub fn serialize(dataset: &Dataset) -> String {
    let named_quads = dataset.len() - dataset.graph(DEFAULT_GRAPH).len();
    if named_quads > 0 {
        tracing::warn!(
            quads = named_quads,
            "Turtle output drops quads in named graphs"
        );
    }

    let writer = TermWriter {
        prefixes: &dataset.namespaces,
    };
    let mut out = String::new();
    for (prefix, iri) in &dataset.namespaces {
        out.push_str(&format!("@prefix {prefix}: <{iri}> .\n"));
    }
    if !dataset.namespaces.is_empty() {
        out.push('\n');
    }

    // subject -> predicate -> objects, keeping first-seen order
    let mut subjects: Vec<(&Subject, Vec<(&NamedNode, Vec<&Object>)>)> = Vec::new();
    for quad in dataset.graph(DEFAULT_GRAPH) {
        let index = match subjects.iter().position(|(s, _)| *s == &quad.subject) {
            Some(index) => index,
            None => {
                subjects.push((&quad.subject, Vec::new()));
                subjects.len() - 1
            }
        };
        let predicates = &mut subjects[index].1;
        match predicates.iter_mut().find(|(p, _)| *p == &quad.predicate) {
            Some((_, objects)) => objects.push(&quad.object),
            None => predicates.push((&quad.predicate, vec![&quad.object])),
        }
    }

    for (subject, predicates) in subjects {
        match subject {
            Subject::Named(n) => out.push_str(&writer.iri(n)),
            Subject::Blank(b) => out.push_str(&b.to_string()),
        }
        for (i, (predicate, objects)) in predicates.iter().enumerate() {
            out.push_str(if i == 0 { " " } else { " ;\n    " });
            if predicate.iri == rdf::TYPE {
                out.push('a');
            } else {
                out.push_str(&writer.iri(predicate));
            }
            for (j, object) in objects.iter().enumerate() {
                out.push_str(if j == 0 { " " } else { ", " });
                out.push_str(&writer.object(object));
            }
        }
        out.push_str(" .\n");
    }
    out
}

struct TermWriter<'a> {
    prefixes: &'a BTreeMap<String, String>,
}

impl TermWriter<'_> {
    /// `prefix:local` when a namespace matches and the local part needs no escaping.
    fn iri(&self, node: &NamedNode) -> String {
        let best = self
            .prefixes
            .iter()
            .filter_map(|(prefix, ns)| {
                let local = node.iri.strip_prefix(ns.as_str())?;
                is_plain_local_name(local).then_some((prefix, local, ns.len()))
            })
            .max_by_key(|(_, _, len)| *len);
        match best {
            Some((prefix, local, _)) => format!("{prefix}:{local}"),
            None => format!("<{}>", node.iri),
        }
    }

    fn object(&self, object: &Object) -> String {
        match object {
            Object::Named(n) => self.iri(n),
            Object::Blank(b) => b.to_string(),
            Object::Literal(l) => self.literal(l),
        }
    }

    fn literal(&self, literal: &Literal) -> String {
        let value = &literal.value;
        match literal.datatype.iri.as_str() {
            xsd::BOOLEAN if value == "true" || value == "false" => return value.clone(),
            xsd::INTEGER if is_integer(value) => return value.clone(),
            _ => {}
        }
        let mut out = String::from("\"");
        escape_into(&mut out, value);
        out.push('"');
        if let Some(language) = &literal.language {
            out.push('@');
            out.push_str(language);
        } else if literal.datatype.iri != xsd::STRING {
            out.push_str("^^");
            out.push_str(&self.iri(&literal.datatype));
        }
        out
    }
}

fn is_plain_local_name(local: &str) -> bool {
    !local.is_empty()
        && !local.starts_with(['-', '.'])
        && !local.ends_with('.')
        && local
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '_' | '-' | '.'))
}

fn is_integer(value: &str) -> bool {
    let digits = value.strip_prefix(['+', '-']).unwrap_or(value);
    !digits.is_empty() && digits.chars().all(|c| c.is_ascii_digit())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    fn sample() -> Dataset {
        let mut dataset: Dataset = [
            Quad::new(
                NamedNode::new("http://schema.org/alice"),
                NamedNode::new(rdf::TYPE),
                NamedNode::new("http://schema.org/Person"),
                GraphLabel::Default,
            ),
            Quad::new(
                NamedNode::new("http://schema.org/alice"),
                NamedNode::new("http://schema.org/name"),
                Literal::new("Alice \"Al\""),
                GraphLabel::Default,
            ),
            Quad::new(
                NamedNode::new("http://schema.org/alice"),
                NamedNode::new("http://schema.org/name"),
                Literal::lang("Alicia", "es"),
                GraphLabel::Default,
            ),
            Quad::new(
                NamedNode::new("http://schema.org/alice"),
                NamedNode::new("http://schema.org/age"),
                Literal::typed("42", NamedNode::new(xsd::INTEGER)),
                GraphLabel::Default,
            ),
            Quad::new(
                BlankNode::new("b0"),
                NamedNode::new("http://example.org/p"),
                Literal::typed("2024-01-01", NamedNode::new(xsd::DATE_TIME)),
                GraphLabel::Default,
            ),
        ]
        .into_iter()
        .collect();
        dataset.set_namespace("schema", "http://schema.org/");
        dataset.set_namespace("xsd", xsd::NS);
        dataset
    }

    #[test]
    fn writes_prefixes_and_groups() {
        assert_eq!(
            serialize(&sample()),
            "@prefix schema: <http://schema.org/> .\n\
             @prefix xsd: <http://www.w3.org/2001/XMLSchema#> .\n\
             \n\
             schema:alice a schema:Person ;\n    \
             schema:name \"Alice \\\"Al\\\"\", \"Alicia\"@es ;\n    \
             schema:age 42 .\n\
             _:b0 <http://example.org/p> \"2024-01-01\"^^xsd:dateTime .\n"
        );
    }

    #[test]
    fn named_graphs_are_dropped() {
        let mut dataset = Dataset::new();
        dataset.add(Quad::new(
            NamedNode::new("http://example.org/s"),
            NamedNode::new("http://example.org/p"),
            Literal::new("v"),
            GraphLabel::Named(NamedNode::new("http://example.org/g")),
        ));
        assert_eq!(serialize(&dataset), "");
    }

    #[test]
    fn local_names_that_need_escaping_stay_full() {
        let writer = TermWriter {
            prefixes: &BTreeMap::from([("ex".to_string(), "http://example.org/".to_string())]),
        };
        assert_eq!(writer.iri(&NamedNode::new("http://example.org/a/b")), "<http://example.org/a/b>");
        assert_eq!(writer.iri(&NamedNode::new("http://example.org/ab")), "ex:ab");
    }
}
