/*!
 * JSON-LD processing for Rust.
 *
 * - [`JsonLdProcessor`]: expand, compact, flatten, frame, convert to and from RDF,
 *   and normalize JSON-LD documents
 * - [`normalize`]: RDF dataset canonicalization (RDFC-1.0)
 * - [`nquads`] and [`turtle`]: RDF text formats, pluggable through a [`FormatRegistry`]
 * - [`ContextLoader`]: how remote `@context` documents are obtained
 */

pub mod error;
pub mod jsonld;
pub mod loader;
pub mod model;
pub mod namer;
pub mod normalize;
pub mod nquads;
pub mod options;
pub mod processor;
pub mod registry;
pub mod turtle;

pub use error::{ContextErrorCode, JsonLdError, Result};
pub use loader::{ContextLoader, StaticContextLoader};
pub use model::{
    BlankNode, Dataset, GraphLabel, Literal, NamedNode, Object, Quad, Subject, rdf, xsd,
};
pub use namer::UniqueNamer;
pub use options::{Embed, JsonLdOptions, JsonLdOptionsBuilder, OutputForm};
pub use processor::JsonLdProcessor;
pub use registry::{FormatRegistry, RdfParser, RdfSerializer};
