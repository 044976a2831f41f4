use std::borrow::Cow;

use sha2::{Digest, Sha256};

use crate::model::Quad;
use crate::nquads::serialize_quad_with;

/// First-degree hash of a blank node: its quads serialized with the node itself as
/// `_:a` and every other blank node as `_:z`, sorted, then SHA-256 hashed.
pub fn hash_first_degree(blank_node_id: &str, quads: &[&Quad]) -> String {
    let mut lines: Vec<String> = quads
        .iter()
        .map(|quad| {
            serialize_quad_with(quad, |b| {
                Cow::Borrowed(if b.id == blank_node_id { "a" } else { "z" })
            })
        })
        .collect();
    lines.sort();

    let mut hasher = Sha256::new();
    for line in &lines {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    format!("{:x}", hasher.finalize())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    #[test]
    fn hash_is_stable_hex() {
        let quad = Quad::new(
            BlankNode::new("b0"),
            NamedNode::new("http://example.org/p"),
            NamedNode::new("http://example.org/o"),
            GraphLabel::Default,
        );
        let hash = hash_first_degree("b0", &[&quad]);
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit() && !c.is_ascii_uppercase()));
        assert_eq!(hash, hash_first_degree("b0", &[&quad]));
    }

    #[test]
    fn independent_of_labels() {
        let quad = |s: &str, o: &str| {
            Quad::new(
                BlankNode::new(s),
                NamedNode::new("http://example.org/p"),
                BlankNode::new(o),
                GraphLabel::Default,
            )
        };
        let first = quad("x", "y");
        let second = quad("m", "n");
        assert_eq!(
            hash_first_degree("x", &[&first]),
            hash_first_degree("m", &[&second])
        );
        assert_ne!(
            hash_first_degree("x", &[&first]),
            hash_first_degree("y", &[&first])
        );
    }
}
