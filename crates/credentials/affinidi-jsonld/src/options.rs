/*!
 * JSON-LD processing options
 */

use serde::{Deserialize, Serialize};

/// Upper bound on permutations explored while normalizing symmetric blank-node groups.
pub const DEFAULT_MAX_PERMUTATIONS: usize = 10_000;

/// How matched nodes are embedded when framing.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Embed {
    /// Always embed, except when that would recurse into a node already on the current path
    #[serde(rename = "@always")]
    Always,
    /// Embed the first occurrence only, later occurrences become references
    #[default]
    #[serde(rename = "@once")]
    Once,
    /// Never embed, always emit a node reference
    #[serde(rename = "@never")]
    Never,
}

/// Form of the document produced by `from_rdf`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OutputForm {
    Expanded,
    Compacted,
    Flattened,
}

/// Options shared by all JSON-LD operations.
///
/// Unset fields take the defaults documented on [JsonLdOptionsBuilder], so the struct can
/// be deserialized from a partial JSON configuration.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct JsonLdOptions {
    pub base: String,
    pub compact_arrays: bool,
    pub graph: bool,
    pub skip_expansion: bool,
    pub keep_free_floating_nodes: bool,
    pub embed: Embed,
    pub explicit: bool,
    pub omit_default: bool,
    pub use_rdf_type: bool,
    pub use_native_types: bool,
    pub produce_generalized_rdf: bool,
    pub use_namespaces: bool,
    pub format: Option<String>,
    pub output_form: Option<OutputForm>,
    pub max_permutations: usize,
}

impl Default for JsonLdOptions {
    fn default() -> Self {
        JsonLdOptionsBuilder::default().build()
    }
}

impl JsonLdOptions {
    /// Returns a builder for `JsonLdOptions`
    /// Example:
    /// ```
    /// use affinidi_jsonld::options::JsonLdOptions;
    ///
    /// let options = JsonLdOptions::builder().with_base("http://example.org/").build();
    /// assert_eq!(options.base, "http://example.org/");
    /// ```
    pub fn builder() -> JsonLdOptionsBuilder {
        JsonLdOptionsBuilder::default()
    }

    /// The base IRI, or `None` when it is empty
    pub fn base_iri(&self) -> Option<&str> {
        if self.base.is_empty() {
            None
        } else {
            Some(&self.base)
        }
    }
}

/// Builder for `JsonLdOptions`.
/// Example:
/// ```
/// use affinidi_jsonld::options::{Embed, JsonLdOptions};
///
/// let options = JsonLdOptions::builder()
///     .with_embed(Embed::Never)
///     .with_explicit(true)
///     .build();
/// assert!(options.compact_arrays);
/// ```
pub struct JsonLdOptionsBuilder {
    /// Base IRI used to resolve relative IRIs
    /// Default: "" (no base)
    base: String,

    /// Replace single-element arrays with their element when compacting
    /// Default: true
    compact_arrays: bool,

    /// Always emit a top-level `@graph` when compacting
    /// Default: false
    graph: bool,

    /// Treat compaction input as already expanded
    /// Default: false
    skip_expansion: bool,

    /// Keep top-level nodes that carry nothing but an `@id`
    /// Default: false
    keep_free_floating_nodes: bool,

    /// Default `@embed` flag for framing
    /// Default: `@once`
    embed: Embed,

    /// Default `@explicit` flag for framing
    /// Default: false
    explicit: bool,

    /// Default `@omitDefault` flag for framing
    /// Default: false
    omit_default: bool,

    /// Keep `rdf:type` as a regular property in `from_rdf`
    /// Default: false
    use_rdf_type: bool,

    /// Convert xsd:boolean, xsd:integer and xsd:double literals to native JSON values
    /// Default: true
    use_native_types: bool,

    /// Emit triples whose predicate is a blank node
    /// Default: false
    produce_generalized_rdf: bool,

    /// Copy prefix definitions from the input `@context` into the RDF dataset
    /// Default: false
    use_namespaces: bool,

    /// Serialization format (MIME type) for RDF text input/output
    /// Default: None
    format: Option<String>,

    /// Shape of the `from_rdf` result
    /// Default: None (expanded)
    output_form: Option<OutputForm>,

    /// Permutation budget for normalization
    /// Default: 10,000
    max_permutations: usize,
}

impl Default for JsonLdOptionsBuilder {
    fn default() -> Self {
        JsonLdOptionsBuilder {
            base: String::new(),
            compact_arrays: true,
            graph: false,
            skip_expansion: false,
            keep_free_floating_nodes: false,
            embed: Embed::Once,
            explicit: false,
            omit_default: false,
            use_rdf_type: false,
            use_native_types: true,
            produce_generalized_rdf: false,
            use_namespaces: false,
            format: None,
            output_form: None,
            max_permutations: DEFAULT_MAX_PERMUTATIONS,
        }
    }
}

impl JsonLdOptionsBuilder {
    /// Default starting constructor for `JsonLdOptionsBuilder`
    pub fn new() -> JsonLdOptionsBuilder {
        JsonLdOptionsBuilder::default()
    }

    /// Build the `JsonLdOptions` from the builder
    pub fn build(self) -> JsonLdOptions {
        JsonLdOptions {
            base: self.base,
            compact_arrays: self.compact_arrays,
            graph: self.graph,
            skip_expansion: self.skip_expansion,
            keep_free_floating_nodes: self.keep_free_floating_nodes,
            embed: self.embed,
            explicit: self.explicit,
            omit_default: self.omit_default,
            use_rdf_type: self.use_rdf_type,
            use_native_types: self.use_native_types,
            produce_generalized_rdf: self.produce_generalized_rdf,
            use_namespaces: self.use_namespaces,
            format: self.format,
            output_form: self.output_form,
            max_permutations: self.max_permutations,
        }
    }

    pub fn with_base(mut self, base: impl Into<String>) -> Self {
        self.base = base.into();
        self
    }

    pub fn with_compact_arrays(mut self, compact_arrays: bool) -> Self {
        self.compact_arrays = compact_arrays;
        self
    }

    pub fn with_graph(mut self, graph: bool) -> Self {
        self.graph = graph;
        self
    }

    pub fn with_skip_expansion(mut self, skip_expansion: bool) -> Self {
        self.skip_expansion = skip_expansion;
        self
    }

    pub fn with_keep_free_floating_nodes(mut self, keep: bool) -> Self {
        self.keep_free_floating_nodes = keep;
        self
    }

    pub fn with_embed(mut self, embed: Embed) -> Self {
        self.embed = embed;
        self
    }

    pub fn with_explicit(mut self, explicit: bool) -> Self {
        self.explicit = explicit;
        self
    }

    pub fn with_omit_default(mut self, omit_default: bool) -> Self {
        self.omit_default = omit_default;
        self
    }

    pub fn with_use_rdf_type(mut self, use_rdf_type: bool) -> Self {
        self.use_rdf_type = use_rdf_type;
        self
    }

    pub fn with_use_native_types(mut self, use_native_types: bool) -> Self {
        self.use_native_types = use_native_types;
        self
    }

    pub fn with_produce_generalized_rdf(mut self, produce: bool) -> Self {
        self.produce_generalized_rdf = produce;
        self
    }

    pub fn with_use_namespaces(mut self, use_namespaces: bool) -> Self {
        self.use_namespaces = use_namespaces;
        self
    }

    /// Set the RDF text format, e.g. `application/n-quads`
    pub fn with_format(mut self, format: impl Into<String>) -> Self {
        self.format = Some(format.into());
        self
    }

    pub fn with_output_form(mut self, output_form: OutputForm) -> Self {
        self.output_form = Some(output_form);
        self
    }

    pub fn with_max_permutations(mut self, max_permutations: usize) -> Self {
        self.max_permutations = max_permutations;
        self
    }
}
