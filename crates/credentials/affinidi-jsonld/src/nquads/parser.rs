use super::escape::unescape;
use crate::error::{JsonLdError, Result};
use crate::model::*;

/// Parse an N-Quads document into a Dataset.
///
/// Blank lines and `#` comment lines are skipped. Errors carry the 1-based line number.
pub fn parse(input: &str) -> Result<Dataset> {
    let mut dataset = Dataset::new();
    for (index, line) in input.lines().enumerate() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let quad = LineScanner::new(line)
            .quad()
            .map_err(|msg| JsonLdError::syntax(format!("line {}: {msg}", index + 1)))?;
        dataset.add(quad);
    }
    tracing::debug!(quads = dataset.len(), "parsed N-Quads");
    Ok(dataset)
}

/// A term in any position, before it is checked against what the position allows.
enum Term {
    Iri(NamedNode),
    Blank(BlankNode),
    Literal(Literal),
}

type ScanResult<T> = std::result::Result<T, String>;

struct LineScanner<'a> {
    rest: &'a str,
}

impl<'a> LineScanner<'a> {
    fn new(line: &'a str) -> Self {
        Self { rest: line }
    }

    fn quad(mut self) -> ScanResult<Quad> {
        let subject = match self.term()? {
            Term::Iri(n) => Subject::Named(n),
            Term::Blank(b) => Subject::Blank(b),
            Term::Literal(_) => return Err("literal in subject position".to_string()),
        };
        let predicate = match self.term()? {
            Term::Iri(n) => n,
            _ => return Err("predicate must be an IRI".to_string()),
        };
        let object = match self.term()? {
            Term::Iri(n) => Object::Named(n),
            Term::Blank(b) => Object::Blank(b),
            Term::Literal(l) => Object::Literal(l),
        };
        self.skip_whitespace();
        let graph = if self.rest.starts_with('.') {
            GraphLabel::Default
        } else {
            match self.term()? {
                Term::Iri(n) => GraphLabel::Named(n),
                Term::Blank(b) => GraphLabel::Blank(b),
                Term::Literal(_) => return Err("literal in graph position".to_string()),
            }
        };

        self.skip_whitespace();
        self.rest = self
            .rest
            .strip_prefix('.')
            .ok_or_else(|| "expected '.' at end of statement".to_string())?;
        self.skip_whitespace();
        if !self.rest.is_empty() && !self.rest.starts_with('#') {
            return Err(format!("unexpected content after '.': '{}'", self.rest));
        }

        Ok(Quad {
            subject,
            predicate,
            object,
            graph,
        })
    }

    fn skip_whitespace(&mut self) {
        self.rest = self.rest.trim_start_matches([' ', '\t']);
    }

    fn term(&mut self) -> ScanResult<Term> {
        self.skip_whitespace();
        match self.rest.chars().next() {
            Some('<') => self.iri().map(Term::Iri),
            Some('_') => self.blank().map(Term::Blank),
            Some('"') => self.literal().map(Term::Literal),
            Some(other) => Err(format!("unexpected character '{other}'")),
            None => Err("unexpected end of line".to_string()),
        }
    }

    fn iri(&mut self) -> ScanResult<NamedNode> {
        let body = &self.rest[1..];
        let end = body.find('>').ok_or_else(|| "unterminated IRI".to_string())?;
        let iri = &body[..end];
        if iri.contains([' ', '<', '"']) {
            return Err(format!("invalid character in IRI '{iri}'"));
        }
        self.rest = &body[end + 1..];
        let iri = if iri.contains('\\') {
            unescape(iri).map_err(|e| e.to_string())?
        } else {
            iri.to_string()
        };
        Ok(NamedNode::new(iri))
    }

    fn blank(&mut self) -> ScanResult<BlankNode> {
        let body = self
            .rest
            .strip_prefix("_:")
            .ok_or_else(|| "expected '_:' blank node prefix".to_string())?;
        let end = body
            .find(|c: char| c.is_whitespace() || c == '<' || c == '"')
            .unwrap_or(body.len());
        let mut label = &body[..end];
        // a label cannot end with '.', which then terminates the statement
        while let Some(stripped) = label.strip_suffix('.') {
            label = stripped;
        }
        if label.is_empty() {
            return Err("empty blank node label".to_string());
        }
        self.rest = &body[label.len()..];
        Ok(BlankNode::new(label))
    }

    fn literal(&mut self) -> ScanResult<Literal> {
        let body = &self.rest[1..];
        let mut escaped = false;
        let mut end = None;
        for (i, c) in body.char_indices() {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => {
                    end = Some(i);
                    break;
                }
                _ => {}
            }
        }
        let end = end.ok_or_else(|| "unterminated string literal".to_string())?;
        let value = unescape(&body[..end]).map_err(|e| e.to_string())?;
        self.rest = &body[end + 1..];

        if let Some(tagged) = self.rest.strip_prefix('@') {
            let end = tagged
                .find(|c: char| !(c.is_ascii_alphanumeric() || c == '-'))
                .unwrap_or(tagged.len());
            if end == 0 {
                return Err("empty language tag".to_string());
            }
            let language = &tagged[..end];
            self.rest = &tagged[end..];
            return Ok(Literal::lang(value, language));
        }
        if let Some(typed) = self.rest.strip_prefix("^^") {
            self.rest = typed;
            if !self.rest.starts_with('<') {
                return Err("expected datatype IRI after '^^'".to_string());
            }
            let datatype = self.iri()?;
            return Ok(Literal::typed(value, datatype));
        }
        Ok(Literal::new(value))
    }
}
