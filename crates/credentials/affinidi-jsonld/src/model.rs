/*!
 * RDF data model used by the RDF conversion, normalization and text formats.
 *
 * Node identifiers follow the JSON-LD convention: an identifier starting with `_:` is a
 * blank node, anything else is an IRI. [`BlankNode::id`] stores the label without the
 * `_:` prefix.
 */

use std::collections::BTreeMap;
use std::fmt;

/// Graph name used for quads outside any named graph.
pub const DEFAULT_GRAPH: &str = "@default";

const BLANK_PREFIX: &str = "_:";

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NamedNode {
    pub iri: String,
}

impl NamedNode {
    pub fn new(iri: impl Into<String>) -> Self {
        NamedNode { iri: iri.into() }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct BlankNode {
    pub id: String,
}

impl BlankNode {
    pub fn new(id: impl Into<String>) -> Self {
        BlankNode { id: id.into() }
    }

    /// `_:label` form, as used for JSON-LD node identifiers
    pub fn to_id(&self) -> String {
        format!("{BLANK_PREFIX}{}", self.id)
    }
}

/// Literal value. A language tag implies the `rdf:langString` datatype.
#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Literal {
    pub value: String,
    pub datatype: NamedNode,
    pub language: Option<String>,
}

impl Literal {
    /// `xsd:string` literal
    pub fn new(value: impl Into<String>) -> Self {
        Literal::typed(value, NamedNode::new(xsd::STRING))
    }

    pub fn typed(value: impl Into<String>, datatype: NamedNode) -> Self {
        Literal {
            value: value.into(),
            datatype,
            language: None,
        }
    }

    pub fn lang(value: impl Into<String>, language: impl Into<String>) -> Self {
        Literal {
            language: Some(language.into()),
            ..Literal::typed(value, NamedNode::new(rdf::LANG_STRING))
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Subject {
    Named(NamedNode),
    Blank(BlankNode),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Object {
    Named(NamedNode),
    Blank(BlankNode),
    Literal(Literal),
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GraphLabel {
    Default,
    Named(NamedNode),
    Blank(BlankNode),
}

/// Split a JSON-LD node identifier into a blank node or an IRI.
fn parse_id(id: &str) -> Result<BlankNode, NamedNode> {
    match id.strip_prefix(BLANK_PREFIX) {
        Some(label) => Ok(BlankNode::new(label)),
        None => Err(NamedNode::new(id)),
    }
}

impl Subject {
    pub fn from_id(id: &str) -> Self {
        parse_id(id).map_or_else(Subject::Named, Subject::Blank)
    }

    pub fn to_id(&self) -> String {
        match self {
            Subject::Named(n) => n.iri.clone(),
            Subject::Blank(b) => b.to_id(),
        }
    }

    pub fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            Subject::Blank(b) => Some(b),
            Subject::Named(_) => None,
        }
    }
}

impl Object {
    pub fn from_id(id: &str) -> Self {
        parse_id(id).map_or_else(Object::Named, Object::Blank)
    }

    /// Node identifier, `None` for literals
    pub fn to_id(&self) -> Option<String> {
        match self {
            Object::Named(n) => Some(n.iri.clone()),
            Object::Blank(b) => Some(b.to_id()),
            Object::Literal(_) => None,
        }
    }

    pub fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            Object::Blank(b) => Some(b),
            _ => None,
        }
    }
}

impl GraphLabel {
    /// Node map graph name: [`DEFAULT_GRAPH`], an IRI or `_:label`.
    pub fn name(&self) -> String {
        match self {
            GraphLabel::Default => DEFAULT_GRAPH.to_string(),
            GraphLabel::Named(n) => n.iri.clone(),
            GraphLabel::Blank(b) => b.to_id(),
        }
    }

    pub fn from_name(name: &str) -> Self {
        if name == DEFAULT_GRAPH {
            return GraphLabel::Default;
        }
        parse_id(name).map_or_else(GraphLabel::Named, GraphLabel::Blank)
    }

    pub fn as_blank(&self) -> Option<&BlankNode> {
        match self {
            GraphLabel::Blank(b) => Some(b),
            _ => None,
        }
    }
}

impl From<Subject> for Object {
    fn from(subject: Subject) -> Self {
        match subject {
            Subject::Named(n) => Object::Named(n),
            Subject::Blank(b) => Object::Blank(b),
        }
    }
}

macro_rules! into_term {
    ($from:ident => $($to:ident::$variant:ident),+) => {
        $(impl From<$from> for $to {
            fn from(value: $from) -> Self {
                $to::$variant(value)
            }
        })+
    };
}

into_term!(NamedNode => Subject::Named, Object::Named, GraphLabel::Named);
into_term!(BlankNode => Subject::Blank, Object::Blank, GraphLabel::Blank);
into_term!(Literal => Object::Literal);

impl fmt::Display for NamedNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{}>", self.iri)
    }
}

impl fmt::Display for BlankNode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{BLANK_PREFIX}{}", self.id)
    }
}

/// Unescaped; use [`crate::nquads`] for serialization.
impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "\"{}\"", self.value)?;
        match &self.language {
            Some(language) => write!(f, "@{language}"),
            None if self.datatype.iri == xsd::STRING => Ok(()),
            None => write!(f, "^^{}", self.datatype),
        }
    }
}

impl fmt::Display for Subject {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Subject::Named(n) => n.fmt(f),
            Subject::Blank(b) => b.fmt(f),
        }
    }
}

impl fmt::Display for Object {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Object::Named(n) => n.fmt(f),
            Object::Blank(b) => b.fmt(f),
            Object::Literal(l) => l.fmt(f),
        }
    }
}

/// The default graph displays as nothing.
impl fmt::Display for GraphLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            GraphLabel::Default => Ok(()),
            GraphLabel::Named(n) => n.fmt(f),
            GraphLabel::Blank(b) => b.fmt(f),
        }
    }
}

#[derive(Clone, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Quad {
    pub subject: Subject,
    pub predicate: NamedNode,
    pub object: Object,
    pub graph: GraphLabel,
}

impl Quad {
    pub fn new(
        subject: impl Into<Subject>,
        predicate: NamedNode,
        object: impl Into<Object>,
        graph: GraphLabel,
    ) -> Self {
        Quad {
            subject: subject.into(),
            predicate,
            object: object.into(),
            graph,
        }
    }

    /// Blank nodes in subject, object and graph position, in that order.
    pub fn blank_nodes(&self) -> impl Iterator<Item = &BlankNode> {
        [
            self.subject.as_blank(),
            self.object.as_blank(),
            self.graph.as_blank(),
        ]
        .into_iter()
        .flatten()
    }

    /// Copy of the quad with every blank node replaced by `f(blank)`.
    pub fn map_blank_nodes(&self, f: impl Fn(&BlankNode) -> BlankNode) -> Quad {
        Quad {
            subject: match &self.subject {
                Subject::Blank(b) => Subject::Blank(f(b)),
                named => named.clone(),
            },
            predicate: self.predicate.clone(),
            object: match &self.object {
                Object::Blank(b) => Object::Blank(f(b)),
                other => other.clone(),
            },
            graph: match &self.graph {
                GraphLabel::Blank(b) => GraphLabel::Blank(f(b)),
                other => other.clone(),
            },
        }
    }
}

/// Quads grouped by graph name, plus the prefix table used by serializers.
///
/// Graphs are kept in name order and quads in insertion order within a graph.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Dataset {
    pub graphs: BTreeMap<String, Vec<Quad>>,
    /// prefix -> namespace IRI; the empty prefix is the default vocabulary
    pub namespaces: BTreeMap<String, String>,
}

impl Dataset {
    pub fn new() -> Self {
        Dataset::default()
    }

    pub fn add(&mut self, quad: Quad) {
        self.graphs.entry(quad.graph.name()).or_default().push(quad);
    }

    pub fn quads(&self) -> impl Iterator<Item = &Quad> {
        self.graphs.values().flatten()
    }

    /// Quads of one graph; empty when the graph does not exist.
    pub fn graph(&self, name: &str) -> &[Quad] {
        self.graphs.get(name).map(Vec::as_slice).unwrap_or_default()
    }

    pub fn len(&self) -> usize {
        self.graphs.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.graphs.values().all(Vec::is_empty)
    }

    pub fn set_namespace(&mut self, prefix: impl Into<String>, iri: impl Into<String>) {
        self.namespaces.insert(prefix.into(), iri.into());
    }
}

impl FromIterator<Quad> for Dataset {
    fn from_iter<I: IntoIterator<Item = Quad>>(iter: I) -> Self {
        let mut dataset = Dataset::new();
        dataset.extend(iter);
        dataset
    }
}

impl Extend<Quad> for Dataset {
    fn extend<I: IntoIterator<Item = Quad>>(&mut self, iter: I) {
        for quad in iter {
            self.add(quad);
        }
    }
}

macro_rules! vocabulary {
    ($(#[$meta:meta])* $module:ident = $ns:literal { $($name:ident: $local:literal),* $(,)? }) => {
        $(#[$meta])*
        pub mod $module {
            pub const NS: &str = $ns;
            $(pub const $name: &str = concat!($ns, $local);)*
        }
    };
}

vocabulary! {
    /// XML Schema datatypes
    xsd = "http://www.w3.org/2001/XMLSchema#" {
        STRING: "string",
        BOOLEAN: "boolean",
        INTEGER: "integer",
        DOUBLE: "double",
        DATE_TIME: "dateTime",
    }
}

vocabulary! {
    /// RDF vocabulary
    rdf = "http://www.w3.org/1999/02/22-rdf-syntax-ns#" {
        TYPE: "type",
        FIRST: "first",
        REST: "rest",
        NIL: "nil",
        LIST: "List",
        LANG_STRING: "langString",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_forms() {
        assert_eq!(NamedNode::new("http://example.org/a").to_string(), "<http://example.org/a>");
        assert_eq!(BlankNode::new("x").to_string(), "_:x");
        assert_eq!(Literal::new("plain").to_string(), "\"plain\"");
        assert_eq!(Literal::lang("hola", "es").to_string(), "\"hola\"@es");
        assert_eq!(
            Literal::typed("1", NamedNode::new(xsd::INTEGER)).to_string(),
            format!("\"1\"^^<{}>", xsd::INTEGER)
        );
        assert_eq!(GraphLabel::Default.to_string(), "");
    }

    #[test]
    fn vocabulary_constants() {
        assert_eq!(xsd::DATE_TIME, "http://www.w3.org/2001/XMLSchema#dateTime");
        assert_eq!(rdf::TYPE, "http://www.w3.org/1999/02/22-rdf-syntax-ns#type");
        assert!(rdf::LANG_STRING.starts_with(rdf::NS));
    }

    #[test]
    fn node_identifiers() {
        assert_eq!(Subject::from_id("_:n1"), Subject::Blank(BlankNode::new("n1")));
        assert_eq!(Subject::from_id("_:n1").to_id(), "_:n1");
        assert_eq!(
            Object::from_id("urn:x"),
            Object::Named(NamedNode::new("urn:x"))
        );
        assert_eq!(Object::from(Literal::new("v")).to_id(), None);

        assert_eq!(GraphLabel::from_name(DEFAULT_GRAPH), GraphLabel::Default);
        assert_eq!(GraphLabel::from_name("_:g").name(), "_:g");
        assert_eq!(
            GraphLabel::from_name("http://example.org/g"),
            GraphLabel::Named(NamedNode::new("http://example.org/g"))
        );
    }

    #[test]
    fn blank_nodes_of_a_quad() {
        let quad = Quad::new(
            BlankNode::new("s"),
            NamedNode::new("http://example.org/p"),
            BlankNode::new("o"),
            GraphLabel::Blank(BlankNode::new("g")),
        );
        let labels: Vec<&str> = quad.blank_nodes().map(|b| b.id.as_str()).collect();
        assert_eq!(labels, vec!["s", "o", "g"]);

        let renamed = quad.map_blank_nodes(|b| BlankNode::new(b.id.to_uppercase()));
        assert_eq!(
            renamed,
            Quad::new(
                BlankNode::new("S"),
                NamedNode::new("http://example.org/p"),
                BlankNode::new("O"),
                GraphLabel::Blank(BlankNode::new("G")),
            )
        );
    }

    #[test]
    fn dataset_groups_by_graph() {
        let quad = |graph: GraphLabel| {
            Quad::new(
                NamedNode::new("http://example.org/s"),
                NamedNode::new("http://example.org/p"),
                Literal::new("v"),
                graph,
            )
        };
        let mut dataset: Dataset = [
            quad(GraphLabel::Named(NamedNode::new("http://example.org/g"))),
            quad(GraphLabel::Default),
        ]
        .into_iter()
        .collect();
        dataset.extend([quad(GraphLabel::Default)]);

        assert_eq!(dataset.len(), 3);
        assert_eq!(dataset.graph(DEFAULT_GRAPH).len(), 2);
        assert_eq!(dataset.graph("http://example.org/g").len(), 1);
        assert!(dataset.graph("http://example.org/none").is_empty());
        assert!(!dataset.is_empty());
        assert!(Dataset::new().is_empty());
    }
}
