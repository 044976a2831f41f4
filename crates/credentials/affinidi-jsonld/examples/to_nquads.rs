use affinidi_jsonld::{JsonLdOptions, JsonLdProcessor, StaticContextLoader};
use clap::Parser;
use std::{fs, sync::Arc};
use tracing_subscriber::EnvFilter;

/// Converts a JSON-LD document to RDF
#[derive(Parser)]
#[command(name = "to_nquads")]
#[command(bin_name = "to_nquads")]
struct Cli {
    /// JSON-LD document to convert
    #[arg(short, long)]
    file_name: String,

    /// Remote contexts available to the document, as URL=FILE
    #[arg(short, long)]
    context: Vec<String>,

    /// Output MIME type (defaults to canonical N-Quads)
    #[arg(long)]
    format: Option<String>,

    /// Skip normalization and print the dataset as converted
    #[arg(long, default_value_t = false)]
    raw: bool,

    /// Base IRI of the document
    #[arg(short, long, default_value = "")]
    base: String,
}

fn load_json(file: &str) -> serde_json::Value {
    let input =
        fs::read_to_string(file).unwrap_or_else(|_| panic!("Failed to read file: {file}"));
    serde_json::from_str(&input).unwrap_or_else(|e| panic!("Couldn't parse {file}: {e}"))
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .init();

    let args = Cli::parse();

    let mut loader = StaticContextLoader::new();
    for mapping in &args.context {
        let (url, file) = mapping
            .split_once('=')
            .unwrap_or_else(|| panic!("Expected URL=FILE, got: {mapping}"));
        loader.insert(url, load_json(file));
    }

    let mut options = JsonLdOptions::builder().with_base(args.base);
    if let Some(format) = args.format {
        options = options.with_format(format);
    }
    let processor = JsonLdProcessor::new(options.build()).with_loader(Arc::new(loader));

    let document = load_json(&args.file_name);
    let output = if args.raw {
        processor.to_rdf_string(&document)
    } else {
        processor.normalize_to_string(&document)
    };

    match output {
        Ok(text) => print!("{text}"),
        Err(e) => {
            eprintln!("Conversion failed ({}): {e}", e.code());
            std::process::exit(1);
        }
    }
}
