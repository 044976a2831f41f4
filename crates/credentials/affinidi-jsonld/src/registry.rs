/*!
 * Pluggable RDF text formats.
 *
 * [`RdfParser`] turns text into a [`Dataset`], [`RdfSerializer`] goes the other way.
 * A [`FormatRegistry`] maps MIME types to implementations; it is an ordinary value
 * owned by whoever processes documents, so registering a format never affects
 * another registry.
 *
 * The default registry knows:
 * - `application/n-quads` and `application/nquads`: parser and serializer
 * - `text/turtle`: serializer only
 */

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use crate::error::{JsonLdError, Result};
use crate::model::Dataset;
use crate::nquads::{self, NQuads};
use crate::turtle::{self, Turtle};

/// Reads an RDF text format into a dataset.
pub trait RdfParser: Send + Sync {
    fn parse(&self, input: &str) -> Result<Dataset>;
}

/// Writes a dataset in an RDF text format.
pub trait RdfSerializer: Send + Sync {
    fn serialize(&self, dataset: &Dataset) -> Result<String>;
}

/// MIME type -> parser/serializer lookup.
#[derive(Clone)]
pub struct FormatRegistry {
    parsers: HashMap<String, Arc<dyn RdfParser>>,
    serializers: HashMap<String, Arc<dyn RdfSerializer>>,
}

impl Default for FormatRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register_parser(nquads::MEDIA_TYPE, NQuads);
        registry.register_parser(nquads::MEDIA_TYPE_ALIAS, NQuads);
        registry.register_serializer(nquads::MEDIA_TYPE, NQuads);
        registry.register_serializer(nquads::MEDIA_TYPE_ALIAS, NQuads);
        registry.register_serializer(turtle::MEDIA_TYPE, Turtle);
        registry
    }
}

impl fmt::Debug for FormatRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("FormatRegistry")
            .field("parsers", &self.parser_formats())
            .field("serializers", &self.serializer_formats())
            .finish()
    }
}

impl FormatRegistry {
    /// A registry with no formats at all
    pub fn empty() -> Self {
        Self {
            parsers: HashMap::new(),
            serializers: HashMap::new(),
        }
    }

    /// Register `parser` for `format`, replacing any previous parser.
    pub fn register_parser(&mut self, format: impl Into<String>, parser: impl RdfParser + 'static) {
        let format = format.into();
        tracing::debug!(format = %format, "registered RDF parser");
        self.parsers.insert(format, Arc::new(parser));
    }

    /// Remove the parser for `format`, returning it if there was one.
    pub fn unregister_parser(&mut self, format: &str) -> Option<Arc<dyn RdfParser>> {
        self.parsers.remove(format)
    }

    /// Register `serializer` for `format`, replacing any previous serializer.
    pub fn register_serializer(
        &mut self,
        format: impl Into<String>,
        serializer: impl RdfSerializer + 'static,
    ) {
        let format = format.into();
        tracing::debug!(format = %format, "registered RDF serializer");
        self.serializers.insert(format, Arc::new(serializer));
    }

    pub fn unregister_serializer(&mut self, format: &str) -> Option<Arc<dyn RdfSerializer>> {
        self.serializers.remove(format)
    }

    pub fn parser(&self, format: &str) -> Result<&dyn RdfParser> {
        self.parsers
            .get(format)
            .map(|p| p.as_ref())
            .ok_or_else(|| JsonLdError::UnknownFormat(format.to_string()))
    }

    pub fn serializer(&self, format: &str) -> Result<&dyn RdfSerializer> {
        self.serializers
            .get(format)
            .map(|s| s.as_ref())
            .ok_or_else(|| JsonLdError::UnknownFormat(format.to_string()))
    }

    /// Parse `input` with the parser registered for `format`.
    pub fn parse(&self, format: &str, input: &str) -> Result<Dataset> {
        self.parser(format)?.parse(input)
    }

    /// Serialize `dataset` with the serializer registered for `format`.
    pub fn serialize(&self, format: &str, dataset: &Dataset) -> Result<String> {
        self.serializer(format)?.serialize(dataset)
    }

    /// Registered parser formats, sorted
    pub fn parser_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.parsers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }

    /// Registered serializer formats, sorted
    pub fn serializer_formats(&self) -> Vec<&str> {
        let mut formats: Vec<&str> = self.serializers.keys().map(String::as_str).collect();
        formats.sort_unstable();
        formats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::*;

    struct LineCount;

    impl RdfSerializer for LineCount {
        fn serialize(&self, dataset: &Dataset) -> Result<String> {
            Ok(dataset.len().to_string())
        }
    }

    fn dataset() -> Dataset {
        [Quad::new(
            NamedNode::new("http://example.org/s"),
            NamedNode::new("http://example.org/p"),
            Literal::new("v"),
            GraphLabel::Default,
        )]
        .into_iter()
        .collect()
    }

    #[test]
    fn default_formats() {
        let registry = FormatRegistry::default();
        assert_eq!(
            registry.parser_formats(),
            vec!["application/n-quads", "application/nquads"]
        );
        assert_eq!(
            registry.serializer_formats(),
            vec!["application/n-quads", "application/nquads", "text/turtle"]
        );
        assert_eq!(
            registry.serialize("application/nquads", &dataset()).unwrap(),
            "<http://example.org/s> <http://example.org/p> \"v\" .\n"
        );
    }

    #[test]
    fn unknown_format() {
        let registry = FormatRegistry::default();
        let err = registry.parse("text/turtle", "").unwrap_err();
        assert_eq!(err.code(), "UNKNOWN_FORMAT");
        assert!(matches!(
            registry.serializer("application/rdf+xml"),
            Err(JsonLdError::UnknownFormat(f)) if f == "application/rdf+xml"
        ));
    }

    #[test]
    fn register_and_unregister() {
        let mut registry = FormatRegistry::default();
        registry.register_serializer("text/x-count", LineCount);
        assert_eq!(registry.serialize("text/x-count", &dataset()).unwrap(), "1");

        assert!(registry.unregister_serializer("text/x-count").is_some());
        assert!(registry.unregister_serializer("text/x-count").is_none());
        assert!(registry.serialize("text/x-count", &dataset()).is_err());

        // registries are independent values
        let other = FormatRegistry::default();
        let mut custom = other.clone();
        custom.unregister_parser(nquads::MEDIA_TYPE);
        assert!(other.parser(nquads::MEDIA_TYPE).is_ok());
        assert!(custom.parser(nquads::MEDIA_TYPE).is_err());
    }
}
