/*!
 * JSON-LD algorithms.
 *
 * Each submodule implements one step on [`serde_json::Value`] trees: context
 * processing, expansion, node map generation and flattening, compaction, framing,
 * and conversion to and from RDF. They expect string `@context` references to be
 * resolved already; [`crate::JsonLdProcessor`] does that and chains the steps.
 */

pub mod compact;
pub mod context;
pub mod expand;
pub mod frame;
pub mod from_rdf;
pub mod inverse;
pub mod iri;
pub mod node_map;
pub mod to_rdf;
pub mod util;
