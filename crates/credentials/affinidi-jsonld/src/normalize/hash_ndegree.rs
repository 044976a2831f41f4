use std::collections::BTreeMap;

use sha2::{Digest, Sha256};

use super::Canonicalizer;
use super::hash_related::{hash_related, related_blank_nodes};
use crate::error::{JsonLdError, Result};
use crate::namer::UniqueNamer;

impl<'d> Canonicalizer<'d> {
    /// Hash N-Degree Quads: a hash for `id` that folds in the labels and hashes of the
    /// blank nodes reachable from it, choosing for every group of equally-hashed
    /// neighbors the permutation with the lexicographically smallest path.
    ///
    /// Returns the hash and `issuer` extended with the temporary labels of that path.
    pub(super) fn hash_ndegree(
        &mut self,
        id: &'d str,
        issuer: UniqueNamer,
    ) -> Result<(String, UniqueNamer)> {
        let mut issuer = issuer;
        let quads = self.quads_for(id);

        let mut hash_to_related: BTreeMap<String, Vec<&'d str>> = BTreeMap::new();
        for quad in quads {
            for (related, position) in related_blank_nodes(quad, id) {
                let identifier = match self.canonical.get(related).or(issuer.get(related)) {
                    Some(label) => label.to_string(),
                    None => self.first_degree_hash(related),
                };
                let hash = hash_related(position, &quad.predicate.iri, &identifier);
                hash_to_related.entry(hash).or_default().push(related);
            }
        }

        let mut hasher = Sha256::new();
        for (hash, mut related) in hash_to_related {
            hasher.update(hash.as_bytes());
            related.sort_unstable();

            let mut chosen_path = String::new();
            let mut chosen_issuer: Option<UniqueNamer> = None;
            loop {
                self.count_permutation()?;
                if let Some((path, path_issuer)) =
                    self.permutation_path(&related, &issuer, &chosen_path)?
                {
                    if chosen_path.is_empty() || path < chosen_path {
                        chosen_path = path;
                        chosen_issuer = Some(path_issuer);
                    }
                }
                if !next_permutation(&mut related) {
                    break;
                }
            }

            hasher.update(chosen_path.as_bytes());
            if let Some(chosen) = chosen_issuer {
                issuer = chosen;
            }
        }

        Ok((format!("{:x}", hasher.finalize()), issuer))
    }

    /// Path for one permutation of related nodes, or `None` once it is known to be
    /// larger than `chosen_path`.
    fn permutation_path(
        &mut self,
        permutation: &[&'d str],
        issuer: &UniqueNamer,
        chosen_path: &str,
    ) -> Result<Option<(String, UniqueNamer)>> {
        let mut issuer = issuer.clone();
        let mut path = String::new();
        let mut recursion = Vec::new();

        for related in permutation {
            match self.canonical.get(related) {
                Some(label) => path.push_str(label),
                None => {
                    if !issuer.is_issued(related) {
                        recursion.push(*related);
                    }
                    path.push_str(&issuer.issue(related));
                }
            }
            if !chosen_path.is_empty() && path.as_str() > chosen_path {
                return Ok(None);
            }
        }

        for related in recursion {
            let label = issuer.get(related).unwrap_or_default().to_string();
            let (hash, result_issuer) = self.hash_ndegree(related, issuer)?;
            issuer = result_issuer;
            path.push_str(&label);
            path.push('<');
            path.push_str(&hash);
            path.push('>');
            if !chosen_path.is_empty() && path.as_str() > chosen_path {
                return Ok(None);
            }
        }

        Ok(Some((path, issuer)))
    }

    fn count_permutation(&mut self) -> Result<()> {
        self.permutations += 1;
        if self.permutations > self.max_permutations {
            return Err(JsonLdError::normalize(format!(
                "exceeded the maximum of {} permutations",
                self.max_permutations
            )));
        }
        Ok(())
    }
}

/// Advance `items` to the next lexicographic permutation in place. Returns false once
/// the last permutation has been reached.
fn next_permutation<T: Ord>(items: &mut [T]) -> bool {
    let n = items.len();
    if n < 2 {
        return false;
    }
    let Some(i) = (0..n - 1).rev().find(|&i| items[i] < items[i + 1]) else {
        return false;
    };
    let Some(j) = (i + 1..n).rev().find(|&j| items[i] < items[j]) else {
        return false;
    };
    items.swap(i, j);
    items[i + 1..].reverse();
    true
}
