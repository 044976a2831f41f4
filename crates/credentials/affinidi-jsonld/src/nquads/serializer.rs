use std::borrow::Cow;

use super::escape::escape_into;
use crate::model::{BlankNode, GraphLabel, NamedNode, Object, Quad, Subject, xsd};

/// Serialize a single quad to an N-Quads line (without trailing newline).
pub fn serialize_quad(quad: &Quad) -> String {
    serialize_quad_with(quad, |b| Cow::Borrowed(b.id.as_str()))
}

/// Serialize a quad, writing each blank node with the label returned by `label`.
pub fn serialize_quad_with<'q, F>(quad: &'q Quad, label: F) -> String
where
    F: Fn(&'q BlankNode) -> Cow<'q, str>,
{
    let mut out = String::with_capacity(128);
    match &quad.subject {
        Subject::Named(n) => write_iri(&mut out, n),
        Subject::Blank(b) => write_blank(&mut out, &label(b)),
    }
    out.push(' ');
    write_iri(&mut out, &quad.predicate);
    out.push(' ');
    match &quad.object {
        Object::Named(n) => write_iri(&mut out, n),
        Object::Blank(b) => write_blank(&mut out, &label(b)),
        Object::Literal(literal) => {
            out.push('"');
            escape_into(&mut out, &literal.value);
            out.push('"');
            if let Some(language) = &literal.language {
                out.push('@');
                out.push_str(language);
            } else if literal.datatype.iri != xsd::STRING {
                out.push_str("^^");
                write_iri(&mut out, &literal.datatype);
            }
        }
    }
    match &quad.graph {
        GraphLabel::Named(n) => {
            out.push(' ');
            write_iri(&mut out, n);
        }
        GraphLabel::Blank(b) => {
            out.push(' ');
            write_blank(&mut out, &label(b));
        }
        GraphLabel::Default => {}
    }
    out.push_str(" .");
    out
}

/// Serialize quads to N-Quads text, one newline-terminated line per quad.
pub fn serialize_quads<'a>(quads: impl IntoIterator<Item = &'a Quad>) -> String {
    let mut out = String::new();
    for quad in quads {
        out.push_str(&serialize_quad(quad));
        out.push('\n');
    }
    out
}

fn write_iri(out: &mut String, node: &NamedNode) {
    out.push('<');
    out.push_str(&node.iri);
    out.push('>');
}

fn write_blank(out: &mut String, label: &str) {
    out.push_str("_:");
    out.push_str(label);
}
