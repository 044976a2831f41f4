//! RDF dataset normalization (RDFC-1.0 canonical blank node labelling).

pub mod hash_first_degree;
pub mod hash_ndegree;
pub mod hash_related;

use std::collections::{BTreeMap, HashMap};

use crate::error::Result;
use crate::model::{BlankNode, Dataset, Quad};
use crate::namer::UniqueNamer;
use crate::nquads::serialize_quad;
use crate::options::DEFAULT_MAX_PERMUTATIONS;

use hash_first_degree::hash_first_degree;

/// Relabel the blank nodes of `dataset` canonically (`c14n0`, `c14n1`, ...) and return
/// its quads ordered by their N-Quads serialization.
///
/// The result depends only on the graph structure: two datasets that differ only in
/// blank node labels or quad order normalize to the same quads. Groups of blank nodes
/// that cannot be told apart by their neighbourhood are resolved by trying
/// permutations; more than `max_permutations` of them fails with a normalize error.
pub fn normalize(dataset: &Dataset, max_permutations: usize) -> Result<Vec<Quad>> {
    let mut canonicalizer = Canonicalizer::new(dataset, max_permutations);
    canonicalizer.issue_canonical_labels()?;

    let mut lines: Vec<(String, Quad)> = dataset
        .quads()
        .map(|quad| {
            let quad = canonicalizer.relabel(quad);
            (serialize_quad(&quad), quad)
        })
        .collect();
    lines.sort_by(|a, b| a.0.cmp(&b.0));
    lines.dedup_by(|a, b| a.0 == b.0);

    tracing::debug!(
        quads = lines.len(),
        blank_nodes = canonicalizer.canonical.issued_order().len(),
        permutations = canonicalizer.permutations,
        "normalized dataset"
    );
    Ok(lines.into_iter().map(|(_, quad)| quad).collect())
}

/// Canonical N-Quads text of `dataset`, using the default permutation limit.
pub fn canonicalize(dataset: &Dataset) -> Result<String> {
    canonicalize_with_limit(dataset, DEFAULT_MAX_PERMUTATIONS)
}

/// Canonical N-Quads text of `dataset`.
pub fn canonicalize_with_limit(dataset: &Dataset, max_permutations: usize) -> Result<String> {
    let quads = normalize(dataset, max_permutations)?;
    Ok(crate::nquads::serialize_quads(&quads))
}

/// Working state of one normalization run.
pub(crate) struct Canonicalizer<'d> {
    /// Blank node id -> quads mentioning it
    quads_by_blank: HashMap<&'d str, Vec<&'d Quad>>,
    /// Blank node ids in order of first appearance
    blank_nodes: Vec<&'d str>,
    first_degree: HashMap<&'d str, String>,
    canonical: UniqueNamer,
    max_permutations: usize,
    permutations: usize,
}

impl<'d> Canonicalizer<'d> {
    fn new(dataset: &'d Dataset, max_permutations: usize) -> Self {
        let mut quads_by_blank: HashMap<&'d str, Vec<&'d Quad>> = HashMap::new();
        let mut blank_nodes = Vec::new();
        for quad in dataset.quads() {
            for id in quad.blank_nodes().map(|b| b.id.as_str()) {
                let quads = quads_by_blank.entry(id).or_insert_with(|| {
                    blank_nodes.push(id);
                    Vec::new()
                });
                if !quads.iter().any(|q| std::ptr::eq(*q, quad)) {
                    quads.push(quad);
                }
            }
        }

        Self {
            quads_by_blank,
            blank_nodes,
            first_degree: HashMap::new(),
            canonical: UniqueNamer::new("_:c14n"),
            max_permutations,
            permutations: 0,
        }
    }

    fn quads_for(&self, id: &str) -> Vec<&'d Quad> {
        self.quads_by_blank.get(id).cloned().unwrap_or_default()
    }

    fn first_degree_hash(&self, id: &str) -> String {
        match self.first_degree.get(id) {
            Some(hash) => hash.clone(),
            None => hash_first_degree(id, &self.quads_for(id)),
        }
    }

    fn issue_canonical_labels(&mut self) -> Result<()> {
        let mut by_hash: BTreeMap<String, Vec<&'d str>> = BTreeMap::new();
        for id in self.blank_nodes.clone() {
            let hash = hash_first_degree(id, &self.quads_for(id));
            self.first_degree.insert(id, hash.clone());
            by_hash.entry(hash).or_default().push(id);
        }

        for (hash, ids) in &by_hash {
            if let [id] = ids.as_slice() {
                let label = self.canonical.issue(id);
                tracing::debug!(hash = %hash, blank_node = %id, label = %label, "unique first-degree hash");
            }
        }

        for ids in by_hash.values().filter(|ids| ids.len() > 1) {
            let mut results = Vec::new();
            for id in ids {
                if self.canonical.is_issued(id) {
                    continue;
                }
                let mut temporary = UniqueNamer::new("_:b");
                temporary.issue(id);
                results.push(self.hash_ndegree(*id, temporary)?);
            }
            results.sort_by(|a, b| a.0.cmp(&b.0));
            for (_, issuer) in results {
                for existing in issuer.issued_order() {
                    self.canonical.issue(existing);
                }
            }
        }
        Ok(())
    }

    fn relabel(&self, quad: &Quad) -> Quad {
        quad.map_blank_nodes(|b| {
            let label = self.canonical.get(&b.id).unwrap_or(b.id.as_str());
            BlankNode::new(label.strip_prefix("_:").unwrap_or(label))
        })
    }
}
