use std::collections::HashMap;

/// Issues sequential blank node labels (`_:b0`, `_:b1`, ... or `c14n0`, `c14n1`, ...).
///
/// The mapping from original to issued label is a bijection: an original label always
/// gets the label it was first given, and every issued label belongs to exactly one
/// original. A namer lives for a single top-level operation and is passed down by
/// `&mut` to every step that needs labels.
#[derive(Clone, Debug)]
pub struct UniqueNamer {
    prefix: String,
    counter: u64,
    issued: HashMap<String, String>,
    order: Vec<String>,
}

impl UniqueNamer {
    pub fn new(prefix: &str) -> Self {
        Self {
            prefix: prefix.to_string(),
            counter: 0,
            issued: HashMap::new(),
            order: Vec::new(),
        }
    }

    /// Issue a label for the given existing identifier.
    /// If already issued, returns the previously issued label.
    pub fn issue(&mut self, existing: &str) -> String {
        if let Some(issued) = self.issued.get(existing) {
            return issued.clone();
        }
        let issued = self.next_label();
        self.issued.insert(existing.to_string(), issued.clone());
        self.order.push(existing.to_string());
        issued
    }

    /// Issue a label that is not tied to any existing identifier.
    pub fn issue_fresh(&mut self) -> String {
        self.next_label()
    }

    fn next_label(&mut self) -> String {
        let label = format!("{}{}", self.prefix, self.counter);
        self.counter += 1;
        label
    }

    /// Check if a label has already been issued for the given existing identifier.
    pub fn is_issued(&self, existing: &str) -> bool {
        self.issued.contains_key(existing)
    }

    /// Get the label issued for the given existing identifier, if any.
    pub fn get(&self, existing: &str) -> Option<&str> {
        self.issued.get(existing).map(|s| s.as_str())
    }

    /// Existing identifiers in order of issuance.
    pub fn issued_order(&self) -> &[String] {
        &self.order
    }
}
