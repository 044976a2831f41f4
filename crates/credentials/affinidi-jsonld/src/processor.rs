/*!
 * The JSON-LD processor.
 *
 * [`JsonLdProcessor`] sequences the algorithms in [`crate::jsonld`] into the public
 * operations (expand, compact, flatten, frame, RDF conversion and normalization).
 *
 * Every operation works on a copy of its input, resolves remote contexts through the
 * injected [`ContextLoader`] (memoized for the duration of that call only) and owns a
 * fresh [`UniqueNamer`]. Failures are wrapped in the operation's own error with the
 * original failure kept as the `source`.
 *
 * ```
 * use affinidi_jsonld::{JsonLdOptions, JsonLdProcessor};
 * use serde_json::json;
 *
 * let processor = JsonLdProcessor::new(JsonLdOptions::default());
 * let doc = json!({"@context": {"name": "http://schema.org/name"}, "name": "Ann"});
 *
 * let expanded = processor.expand(&doc).unwrap();
 * assert_eq!(expanded, vec![json!({"http://schema.org/name": [{"@value": "Ann"}]})]);
 * ```
 */

use std::fmt;
use std::sync::Arc;

use serde_json::{Map, Value};

use crate::error::{JsonLdError, Result};
use crate::jsonld::compact::compact;
use crate::jsonld::context::ActiveContext;
use crate::jsonld::expand::{expand_document, expand_frame};
use crate::jsonld::frame::{frame, remove_preserve};
use crate::jsonld::from_rdf::from_rdf;
use crate::jsonld::iri::is_absolute_iri;
use crate::jsonld::node_map::{NodeMap, create_node_map, flatten};
use crate::jsonld::to_rdf::to_rdf;
use crate::jsonld::util::{as_slice, is_keyword};
use crate::loader::{ContextLoader, ContextResolver, StaticContextLoader};
use crate::model::{DEFAULT_GRAPH, Dataset, Quad};
use crate::namer::UniqueNamer;
use crate::normalize::normalize;
use crate::nquads;
use crate::options::{JsonLdOptions, OutputForm};
use crate::registry::FormatRegistry;

/// Prefix for blank node labels issued while processing a document
const BLANK_PREFIX: &str = "_:b";

/// Runs JSON-LD operations with a fixed set of options and collaborators.
#[derive(Clone)]
pub struct JsonLdProcessor {
    options: JsonLdOptions,
    loader: Arc<dyn ContextLoader>,
    registry: Arc<FormatRegistry>,
}

impl fmt::Debug for JsonLdProcessor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("JsonLdProcessor")
            .field("options", &self.options)
            .field("registry", &self.registry)
            .finish_non_exhaustive()
    }
}

impl Default for JsonLdProcessor {
    fn default() -> Self {
        Self::new(JsonLdOptions::default())
    }
}

impl JsonLdProcessor {
    /// A processor with the default format registry and a loader that knows no remote
    /// contexts.
    pub fn new(options: JsonLdOptions) -> Self {
        Self {
            options,
            loader: Arc::new(StaticContextLoader::default()),
            registry: Arc::new(FormatRegistry::default()),
        }
    }

    pub fn with_loader(mut self, loader: Arc<dyn ContextLoader>) -> Self {
        self.loader = loader;
        self
    }

    pub fn with_registry(mut self, registry: impl Into<Arc<FormatRegistry>>) -> Self {
        self.registry = registry.into();
        self
    }

    pub fn options(&self) -> &JsonLdOptions {
        &self.options
    }

    pub fn registry(&self) -> &FormatRegistry {
        &self.registry
    }

    /// Expand `input`. The result is always an array of node objects.
    pub fn expand(&self, input: &Value) -> Result<Vec<Value>> {
        let mut resolver = ContextResolver::new(self.loader.as_ref());
        self.expand_with(&mut resolver, input)
            .map_err(|e| e.wrap_expansion("failed to expand document"))
    }

    /// Compact `input` against `context`.
    ///
    /// `context` is either a context value or a document carrying one under
    /// `@context`. The output starts with that context unless it is empty.
    pub fn compact(&self, input: &Value, context: &Value) -> Result<Value> {
        self.compact_inner(input, context)
            .map_err(|e| e.wrap_compaction("failed to compact document"))
    }

    fn compact_inner(&self, input: &Value, context: &Value) -> Result<Value> {
        let mut resolver = ContextResolver::new(self.loader.as_ref());
        let expanded = if self.options.skip_expansion {
            input.clone()
        } else {
            Value::Array(self.expand_with(&mut resolver, input)?)
        };

        let context = local_context(context);
        let active = self.active_context(&mut resolver, &context)?;
        self.compact_document(&active, &expanded, &context, self.options.graph)
    }

    /// Flatten `input`, compacting the result against `context` when one is given.
    ///
    /// Without a context the result is the flat node array; with one it is an object
    /// whose `@graph` holds the compacted nodes.
    pub fn flatten(&self, input: &Value, context: Option<&Value>) -> Result<Value> {
        self.flatten_inner(input, context)
            .map_err(|e| e.wrap_flatten("failed to flatten document"))
    }

    fn flatten_inner(&self, input: &Value, context: Option<&Value>) -> Result<Value> {
        let mut resolver = ContextResolver::new(self.loader.as_ref());
        let expanded = Value::Array(self.expand_with(&mut resolver, input)?);
        let mut namer = UniqueNamer::new(BLANK_PREFIX);
        let flattened = Value::Array(flatten(&expanded, &mut namer)?);

        let Some(context) = context else {
            return Ok(flattened);
        };
        let context = local_context(context);
        let active = self.active_context(&mut resolver, &context)?;
        self.compact_document(&active, &flattened, &context, true)
    }

    /// Flatten `input` and compact the nodes against the document's own top-level
    /// context. The result always carries its nodes under `@graph`.
    pub fn simplify(&self, input: &Value) -> Result<Value> {
        let context = document_context(input);
        self.flatten_inner(input, Some(&context))
            .map_err(|e| e.wrap_flatten("failed to simplify document"))
    }

    /// Frame `input` with `frame`, compacting the output against the frame's
    /// `@context`.
    pub fn frame(&self, input: &Value, frame: &Value) -> Result<Value> {
        self.frame_inner(input, frame)
            .map_err(|e| e.wrap_frame("failed to frame document"))
    }

    fn frame_inner(&self, input: &Value, frame_document: &Value) -> Result<Value> {
        if !frame_document.is_object() {
            return Err(JsonLdError::invalid_input("a frame must be a JSON object"));
        }
        let base = self.options.base_iri();
        let mut resolver = ContextResolver::new(self.loader.as_ref());
        let expanded = Value::Array(self.expand_with(&mut resolver, input)?);

        let context = frame_document.get("@context").cloned().unwrap_or(Value::Null);
        let active = self.active_context(&mut resolver, &context)?;

        let mut resolved_frame = frame_document.clone();
        resolver.resolve_value(&mut resolved_frame, base)?;
        let expanded_frame = expand_frame(&ActiveContext::new(base), &resolved_frame)?;

        let mut namer = UniqueNamer::new(BLANK_PREFIX);
        let framed = frame(&expanded, &expanded_frame, &self.options, &mut namer)?;

        let compacted = compact(
            &active,
            None,
            &Value::Array(framed),
            self.options.compact_arrays,
        )?;
        let nodes = match compacted {
            Value::Array(items) => items,
            Value::Null => Vec::new(),
            other => vec![other],
        };
        let graph = remove_preserve(&active, Value::Array(nodes), self.options.compact_arrays);

        let mut body = Map::new();
        body.insert(active.compact_iri("@graph", None, true, false), graph);
        Ok(Value::Object(with_context(&context, body)))
    }

    /// Convert `input` to an RDF dataset.
    ///
    /// With `use_namespaces` the prefixes defined in the input's top-level `@context`
    /// are copied into the dataset namespace table.
    pub fn to_rdf(&self, input: &Value) -> Result<Dataset> {
        self.to_rdf_inner(input)
            .map_err(|e| e.wrap_rdf("failed to convert document to RDF"))
    }

    fn to_rdf_inner(&self, input: &Value) -> Result<Dataset> {
        let mut resolver = ContextResolver::new(self.loader.as_ref());
        let mut document = input.clone();
        resolver.resolve_value(&mut document, self.options.base_iri())?;

        let active = ActiveContext::new(self.options.base_iri());
        let expanded = Value::Array(expand_document(&active, &document, &self.options)?);

        let mut namer = UniqueNamer::new(BLANK_PREFIX);
        let mut node_map = NodeMap::new();
        create_node_map(&expanded, &mut node_map, DEFAULT_GRAPH, &mut namer)?;
        let mut dataset = to_rdf(&node_map, &mut namer, &self.options)?;

        if self.options.use_namespaces {
            if let Some(context) = document.get("@context") {
                copy_namespaces(context, &mut dataset);
            }
        }
        Ok(dataset)
    }

    /// Convert `input` to RDF text in `options.format` (N-Quads when unset).
    pub fn to_rdf_string(&self, input: &Value) -> Result<String> {
        let dataset = self.to_rdf(input)?;
        self.registry
            .serialize(self.format(), &dataset)
            .map_err(|e| e.wrap_rdf("failed to serialize RDF dataset"))
    }

    /// Parse RDF text in `options.format` (N-Quads when unset) and convert it to
    /// JSON-LD.
    pub fn from_rdf(&self, input: &str) -> Result<Value> {
        let dataset = self
            .registry
            .parse(self.format(), input)
            .map_err(|e| e.wrap_rdf("failed to parse RDF input"))?;
        self.from_rdf_dataset(&dataset)
    }

    /// Convert a dataset to JSON-LD in `options.output_form` (expanded when unset).
    ///
    /// The compacted and flattened forms use the dataset namespace table as their
    /// context, with the empty prefix becoming `@vocab`.
    pub fn from_rdf_dataset(&self, dataset: &Dataset) -> Result<Value> {
        let expanded = from_rdf(dataset, &self.options)
            .map_err(|e| e.wrap_rdf("failed to convert dataset to JSON-LD"))?;

        let context = namespace_context(dataset);
        match self.options.output_form {
            None | Some(OutputForm::Expanded) => Ok(Value::Array(expanded)),
            Some(OutputForm::Compacted) => {
                let compacted = ActiveContext::new(self.options.base_iri())
                    .parse(&context)
                    .and_then(|active| {
                        self.compact_document(
                            &active,
                            &Value::Array(expanded),
                            &context,
                            self.options.graph,
                        )
                    });
                compacted.map_err(|e| e.wrap_compaction("failed to compact converted dataset"))
            }
            Some(OutputForm::Flattened) => self
                .flatten_expanded(Value::Array(expanded), &context)
                .map_err(|e| e.wrap_flatten("failed to flatten converted dataset")),
        }
    }

    fn flatten_expanded(&self, expanded: Value, context: &Value) -> Result<Value> {
        let mut namer = UniqueNamer::new(BLANK_PREFIX);
        let flattened = Value::Array(flatten(&expanded, &mut namer)?);
        let active = ActiveContext::new(self.options.base_iri()).parse(context)?;
        self.compact_document(&active, &flattened, context, true)
    }

    /// Normalize `input`: canonical blank node labels and sorted quads.
    pub fn normalize(&self, input: &Value) -> Result<Vec<Quad>> {
        let dataset = self
            .to_rdf(input)
            .map_err(|e| e.wrap_normalize("failed to convert document to RDF"))?;
        normalize(&dataset, self.options.max_permutations)
            .map_err(|e| e.wrap_normalize("failed to normalize dataset"))
    }

    /// Normalize `input` and serialize it.
    ///
    /// Without `options.format` the result is canonical N-Quads, one quad per line in
    /// canonical order. With a format the registry serializer for it is used.
    pub fn normalize_to_string(&self, input: &Value) -> Result<String> {
        let quads = self.normalize(input)?;
        match &self.options.format {
            None => Ok(nquads::serialize_quads(&quads)),
            Some(format) => {
                let dataset: Dataset = quads.into_iter().collect();
                self.registry
                    .serialize(format, &dataset)
                    .map_err(|e| e.wrap_normalize("failed to serialize normalized dataset"))
            }
        }
    }

    fn format(&self) -> &str {
        self.options.format.as_deref().unwrap_or(nquads::MEDIA_TYPE)
    }

    fn expand_with(&self, resolver: &mut ContextResolver<'_>, input: &Value) -> Result<Vec<Value>> {
        let base = self.options.base_iri();
        let mut document = input.clone();
        resolver.resolve_value(&mut document, base)?;
        let expanded = expand_document(&ActiveContext::new(base), &document, &self.options)?;
        tracing::debug!(nodes = expanded.len(), "expanded document");
        Ok(expanded)
    }

    fn active_context(
        &self,
        resolver: &mut ContextResolver<'_>,
        context: &Value,
    ) -> Result<ActiveContext> {
        let base = self.options.base_iri();
        let mut resolved = context.clone();
        resolver.resolve_context(&mut resolved, base)?;
        ActiveContext::new(base).parse(&resolved)
    }

    /// Compact `expanded` and put the result in its top-level shape: an empty result is
    /// `{}`, several nodes go under `@graph` (as does a single node when `force_graph`),
    /// and `context` is written first.
    fn compact_document(
        &self,
        active: &ActiveContext,
        expanded: &Value,
        context: &Value,
        force_graph: bool,
    ) -> Result<Value> {
        let compacted = compact(active, None, expanded, self.options.compact_arrays)?;
        let graph_key = active.compact_iri("@graph", None, true, false);

        let body = match compacted {
            Value::Null => graph_body(force_graph, graph_key, Vec::new()),
            Value::Array(items) => graph_body(force_graph, graph_key, items),
            Value::Object(map) if force_graph => {
                let mut body = Map::new();
                body.insert(graph_key, Value::Array(vec![Value::Object(map)]));
                body
            }
            Value::Object(map) => map,
            other => {
                return Err(JsonLdError::compaction(format!(
                    "top-level compaction produced {other}"
                )));
            }
        };
        Ok(Value::Object(with_context(context, body)))
    }
}

fn graph_body(force_graph: bool, graph_key: String, items: Vec<Value>) -> Map<String, Value> {
    let mut body = Map::new();
    if force_graph || !items.is_empty() {
        body.insert(graph_key, Value::Array(items));
    }
    body
}

/// The context value of a `{"@context": ...}` wrapper, or the value itself.
fn local_context(context: &Value) -> Value {
    match context {
        Value::Object(map) => map.get("@context").unwrap_or(context).clone(),
        other => other.clone(),
    }
}

/// The `@context` of the top-level object(s) of `input`, merged into one value.
fn document_context(input: &Value) -> Value {
    let mut contexts: Vec<Value> = as_slice(input)
        .iter()
        .filter_map(|item| item.get("@context"))
        .flat_map(|context| as_slice(context).iter().cloned())
        .collect();
    match contexts.len() {
        0 => Value::Null,
        1 => contexts.remove(0),
        _ => Value::Array(contexts),
    }
}

fn with_context(context: &Value, body: Map<String, Value>) -> Map<String, Value> {
    let mut output = Map::new();
    let empty = match context {
        Value::Null => true,
        Value::Object(map) => map.is_empty(),
        Value::Array(items) => items.is_empty(),
        _ => false,
    };
    if !empty {
        output.insert("@context".to_string(), context.clone());
    }
    output.extend(body);
    output
}

/// Prefix definitions (terms mapped to an IRI ending in `/` or `#`) and `@vocab`.
fn copy_namespaces(context: &Value, dataset: &mut Dataset) {
    for local in as_slice(context) {
        let Some(map) = local.as_object() else {
            continue;
        };
        for (key, definition) in map {
            let iri = match definition {
                Value::String(iri) => iri.as_str(),
                Value::Object(def) => match def.get("@id").and_then(Value::as_str) {
                    Some(iri) => iri,
                    None => continue,
                },
                _ => continue,
            };
            if !is_absolute_iri(iri) {
                continue;
            }
            if key == "@vocab" {
                dataset.set_namespace("", iri);
            } else if !is_keyword(key) && !key.contains(':') && iri.ends_with(['/', '#']) {
                dataset.set_namespace(key.as_str(), iri);
            }
        }
    }
}

fn namespace_context(dataset: &Dataset) -> Value {
    let context: Map<String, Value> = dataset
        .namespaces
        .iter()
        .map(|(prefix, iri)| {
            let key = if prefix.is_empty() { "@vocab" } else { prefix.as_str() };
            (key.to_string(), Value::String(iri.clone()))
        })
        .collect();
    Value::Object(context)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn simplify_without_context_still_uses_graph() {
        let processor = JsonLdProcessor::default();
        let bare = processor
            .simplify(&json!({"@id": "http://example.org/a", "http://example.org/p": "v"}))
            .unwrap();
        assert_eq!(
            bare,
            json!({"@graph": [{"@id": "http://example.org/a", "http://example.org/p": "v"}]})
        );
    }

    #[test]
    fn compact_writes_context_first() {
        let processor = JsonLdProcessor::default();
        let context = json!({"name": "http://schema.org/name"});
        let doc = json!({"http://schema.org/name": "Ann"});

        let compacted = processor.compact(&doc, &context).unwrap();
        let keys: Vec<&String> = compacted.as_object().unwrap().keys().collect();
        assert_eq!(keys, vec!["@context", "name"]);
    }

    #[test]
    fn compact_accepts_wrapped_context() {
        let processor = JsonLdProcessor::default();
        let context = json!({"@context": {"name": "http://schema.org/name"}});
        let compacted = processor
            .compact(&json!({"http://schema.org/name": "Ann"}), &context)
            .unwrap();
        assert_eq!(
            compacted,
            json!({"@context": {"name": "http://schema.org/name"}, "name": "Ann"})
        );
    }

    #[test]
    fn compact_with_empty_context_omits_it() {
        let processor = JsonLdProcessor::default();
        let compacted = processor
            .compact(&json!({"http://schema.org/name": "Ann"}), &json!({}))
            .unwrap();
        assert_eq!(compacted, json!({"http://schema.org/name": "Ann"}));
    }

    #[test]
    fn graph_option_forces_graph() {
        let processor = JsonLdProcessor::new(JsonLdOptions::builder().with_graph(true).build());
        let compacted = processor
            .compact(&json!({"http://schema.org/name": "Ann"}), &json!({}))
            .unwrap();
        assert_eq!(compacted, json!({"@graph": [{"http://schema.org/name": "Ann"}]}));
    }

    #[test]
    fn graph_alias_is_used() {
        let processor = JsonLdProcessor::default();
        let doc = json!([
            {"@id": "http://example.org/a", "http://schema.org/name": "A"},
            {"@id": "http://example.org/b", "http://schema.org/name": "B"}
        ]);
        let compacted = processor.compact(&doc, &json!({"data": "@graph"})).unwrap();
        assert_eq!(compacted["data"].as_array().unwrap().len(), 2);
    }

    #[test]
    fn namespaces_from_context() {
        let processor =
            JsonLdProcessor::new(JsonLdOptions::builder().with_use_namespaces(true).build());
        let doc = json!({
            "@context": {
                "@vocab": "http://example.org/vocab#",
                "schema": "http://schema.org/",
                "name": "http://schema.org/name",
                "ex": {"@id": "http://example.org/"}
            },
            "@id": "http://example.org/alice",
            "name": "Alice"
        });

        let dataset = processor.to_rdf(&doc).unwrap();
        assert_eq!(dataset.len(), 1);
        assert_eq!(
            dataset.namespaces.keys().map(String::as_str).collect::<Vec<_>>(),
            vec!["", "ex", "schema"]
        );
        assert_eq!(
            namespace_context(&dataset),
            json!({
                "@vocab": "http://example.org/vocab#",
                "ex": "http://example.org/",
                "schema": "http://schema.org/"
            })
        );
    }

    #[test]
    fn input_is_not_mutated() {
        let loader = StaticContextLoader::new().with_context(
            "http://example.org/ctx",
            json!({"@context": {"name": "http://schema.org/name"}}),
        );
        let processor = JsonLdProcessor::default().with_loader(Arc::new(loader));
        let doc = json!({"@context": "http://example.org/ctx", "name": "Ann"});
        let before = doc.clone();

        processor.expand(&doc).unwrap();
        processor.normalize(&doc).unwrap();
        assert_eq!(doc, before);
    }

    #[test]
    fn frame_requires_object() {
        let processor = JsonLdProcessor::default();
        let err = processor.frame(&json!({}), &json!([])).unwrap_err();
        assert_eq!(err.code(), "FRAME_ERROR");
        assert_eq!(err.root_cause().code(), "INVALID_INPUT");
    }
}
