use sha2::{Digest, Sha256};

use crate::model::Quad;

/// Where a related blank node sits in a quad.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Position {
    Subject,
    Object,
    Graph,
}

impl Position {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Subject => "s",
            Self::Object => "o",
            Self::Graph => "g",
        }
    }
}

/// Blank nodes of `quad` other than `target`, with their positions.
pub fn related_blank_nodes<'q>(quad: &'q Quad, target: &str) -> Vec<(&'q str, Position)> {
    [
        (quad.subject.as_blank(), Position::Subject),
        (quad.object.as_blank(), Position::Object),
        (quad.graph.as_blank(), Position::Graph),
    ]
    .into_iter()
    .filter_map(|(blank, position)| blank.map(|b| (b.id.as_str(), position)))
    .filter(|(id, _)| *id != target)
    .collect()
}

/// Hash of one related blank node: position, predicate (except for the graph
/// position) and the node's identifier, which is its issued label if it has one and
/// its first-degree hash otherwise.
pub fn hash_related(position: Position, predicate: &str, identifier: &str) -> String {
    let mut input = String::from(position.as_str());
    if position != Position::Graph {
        input.push('<');
        input.push_str(predicate);
        input.push('>');
    }
    input.push_str(identifier);
    format!("{:x}", Sha256::digest(input.as_bytes()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn finds_related_nodes() {
        let quad = Quad::new(
            BlankNode::new("a"),
            NamedNode::new("http://example.org/p"),
            BlankNode::new("b"),
            GraphLabel::Blank(BlankNode::new("g")),
        );
        assert_eq!(
            related_blank_nodes(&quad, "a"),
            vec![("b", Position::Object), ("g", Position::Graph)]
        );
        assert_eq!(
            related_blank_nodes(&quad, "g"),
            vec![("a", Position::Subject), ("b", Position::Object)]
        );
    }

    #[test]
    fn graph_position_ignores_predicate() {
        assert_eq!(
            hash_related(Position::Graph, "http://example.org/p", "_:c14n0"),
            hash_related(Position::Graph, "http://example.org/q", "_:c14n0")
        );
        assert_ne!(
            hash_related(Position::Subject, "http://example.org/p", "_:c14n0"),
            hash_related(Position::Object, "http://example.org/p", "_:c14n0")
        );
    }
}
