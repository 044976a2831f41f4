//! N-Quads reading and writing.

pub mod escape;
pub mod parser;
pub mod serializer;

pub use parser::parse;
pub use serializer::{serialize_quad, serialize_quad_with, serialize_quads};

use crate::error::Result;
use crate::model::Dataset;
use crate::registry::{RdfParser, RdfSerializer};

/// MIME type the N-Quads codec is registered under.
pub const MEDIA_TYPE: &str = "application/n-quads";
/// Legacy alias still found in older callers.
pub const MEDIA_TYPE_ALIAS: &str = "application/nquads";

/// N-Quads codec for the format registry.
#[derive(Clone, Copy, Debug, Default)]
pub struct NQuads;

impl RdfParser for NQuads {
    fn parse(&self, input: &str) -> Result<Dataset> {
        parse(input)
    }
}

impl RdfSerializer for NQuads {
    fn serialize(&self, dataset: &Dataset) -> Result<String> {
        Ok(serialize_quads(dataset.quads()))
    }
}
