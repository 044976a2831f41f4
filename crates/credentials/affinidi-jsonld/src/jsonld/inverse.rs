//! Inverse context and IRI compaction.

use std::collections::HashMap;

use serde_json::Value;

use super::context::ActiveContext;
use super::iri::relativize;

/// Terms selectable for one (IRI, container) pair, by type and by language.
#[derive(Debug, Default)]
pub(crate) struct TypeLanguageMap {
    language: HashMap<String, String>,
    types: HashMap<String, String>,
}

/// IRI -> container key -> type/language map -> value -> term.
#[derive(Debug, Default)]
pub(crate) struct InverseContext {
    entries: HashMap<String, HashMap<String, TypeLanguageMap>>,
}

impl InverseContext {
    pub(crate) fn build(context: &ActiveContext) -> Self {
        let default_language = language_key(context.language.as_deref(), context.direction.as_deref());

        let mut terms: Vec<&String> = context.terms.keys().collect();
        terms.sort_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)));

        let mut inverse = InverseContext::default();
        for term in terms {
            let Some(definition) = context.term_definition(term) else {
                continue;
            };
            let maps = inverse
                .entries
                .entry(definition.iri.clone())
                .or_default()
                .entry(definition.container_key())
                .or_default();

            if definition.reverse {
                maps.types
                    .entry("@reverse".to_string())
                    .or_insert_with(|| term.clone());
            } else if let Some(type_mapping) = &definition.type_mapping {
                maps.types
                    .entry(type_mapping.clone())
                    .or_insert_with(|| term.clone());
            } else if definition.language_mapping.is_some() || definition.direction_mapping.is_some()
            {
                let key = match (&definition.language_mapping, &definition.direction_mapping) {
                    (Some(None), Some(None)) | (Some(None), None) => "@null".to_string(),
                    (None, Some(None)) => "@none".to_string(),
                    (language, direction) => language_key(
                        language.as_ref().and_then(|l| l.as_deref()),
                        direction.as_ref().and_then(|d| d.as_deref()),
                    ),
                };
                maps.language.entry(key).or_insert_with(|| term.clone());
            } else {
                maps.language
                    .entry(default_language.clone())
                    .or_insert_with(|| term.clone());
                maps.language
                    .entry("@none".to_string())
                    .or_insert_with(|| term.clone());
                maps.types
                    .entry("@none".to_string())
                    .or_insert_with(|| term.clone());
            }
        }

        tracing::trace!(iris = inverse.entries.len(), "built inverse context");
        inverse
    }

    fn select_term(
        &self,
        iri: &str,
        containers: &[&str],
        type_or_language: TypeOrLanguage,
        preferred: &[String],
    ) -> Option<&str> {
        let container_map = self.entries.get(iri)?;
        for container in containers {
            let Some(maps) = container_map.get(*container) else {
                continue;
            };
            let values = match type_or_language {
                TypeOrLanguage::Language => &maps.language,
                TypeOrLanguage::Type => &maps.types,
            };
            for preference in preferred {
                if let Some(term) = values.get(preference) {
                    return Some(term);
                }
            }
        }
        None
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum TypeOrLanguage {
    Type,
    Language,
}

/// Language/direction key: `en`, `en_rtl`, `_rtl`, or `@none` when neither is set.
fn language_key(language: Option<&str>, direction: Option<&str>) -> String {
    match (language, direction) {
        (Some(l), Some(d)) => format!("{}_{d}", l.to_lowercase()),
        (Some(l), None) => l.to_lowercase(),
        (None, Some(d)) => format!("_{d}"),
        (None, None) => "@none".to_string(),
    }
}

fn value_language_key(value: &serde_json::Map<String, Value>) -> Option<String> {
    let language = value.get("@language").and_then(Value::as_str);
    let direction = value.get("@direction").and_then(Value::as_str);
    if language.is_none() && direction.is_none() {
        return None;
    }
    Some(language_key(language, direction))
}

impl ActiveContext {
    /// Compact an absolute IRI (or keyword) to a term, compact IRI or relative IRI.
    ///
    /// `value` is the expanded value the IRI is a property of; it steers term selection
    /// towards a term whose type, language and container fit.
    pub fn compact_iri(&self, iri: &str, value: Option<&Value>, vocab: bool, reverse: bool) -> String {
        if vocab {
            if let Some(term) = self.select_term_for(iri, value, reverse) {
                return term;
            }
        }

        if vocab {
            if let Some(vocab_iri) = &self.vocab {
                if let Some(suffix) = iri.strip_prefix(vocab_iri.as_str()) {
                    if !suffix.is_empty() && !self.terms.contains_key(suffix) {
                        return suffix.to_string();
                    }
                }
            }
        }

        let mut best: Option<String> = None;
        for (term, definition) in &self.terms {
            let Some(definition) = definition else {
                continue;
            };
            if term.contains(':') || definition.iri == iri || !iri.starts_with(&definition.iri) {
                continue;
            }
            let candidate = format!("{term}:{}", &iri[definition.iri.len()..]);
            let shorter = match &best {
                None => true,
                Some(current) => {
                    candidate.len() < current.len()
                        || (candidate.len() == current.len() && candidate < *current)
                }
            };
            let usable = match self.terms.get(&candidate) {
                None => true,
                Some(existing) => {
                    value.is_none() && existing.as_ref().is_some_and(|def| def.iri == iri)
                }
            };
            if shorter && usable {
                best = Some(candidate);
            }
        }
        if let Some(best) = best {
            return best;
        }

        if !vocab {
            return relativize(self.base.as_deref(), iri);
        }
        iri.to_string()
    }

    fn select_term_for(&self, iri: &str, value: Option<&Value>, reverse: bool) -> Option<String> {
        let inverse = self.inverse();
        if !inverse.entries.contains_key(iri) {
            return None;
        }

        let default_language = language_key(self.language.as_deref(), self.direction.as_deref());
        let object = value.and_then(Value::as_object);
        let mut containers: Vec<&str> = Vec::new();
        let mut type_or_language = TypeOrLanguage::Language;
        let mut preferred_value = "@null".to_string();

        let has_index = object.is_some_and(|o| o.contains_key("@index"));
        if has_index {
            containers.push("@index");
            containers.push("@index@set");
        }

        if reverse {
            type_or_language = TypeOrLanguage::Type;
            preferred_value = "@reverse".to_string();
            containers.push("@set");
        } else if let Some(list) = object.and_then(|o| o.get("@list")) {
            if !has_index {
                containers.push("@list");
            }
            let items = list.as_array().map(Vec::as_slice).unwrap_or_default();
            let mut common_language: Option<String> = if items.is_empty() {
                Some(default_language.clone())
            } else {
                None
            };
            let mut common_type: Option<String> = None;
            for item in items {
                let mut item_language = "@none".to_string();
                let mut item_type = "@none".to_string();
                match item.as_object() {
                    Some(item) if item.contains_key("@value") => {
                        if let Some(key) = value_language_key(item) {
                            item_language = key;
                        } else if let Some(t) = item.get("@type").and_then(Value::as_str) {
                            item_type = t.to_string();
                        } else {
                            item_language = "@null".to_string();
                        }
                    }
                    _ => item_type = "@id".to_string(),
                }
                match &common_language {
                    None => common_language = Some(item_language),
                    Some(current) if *current != item_language && item.get("@value").is_some() => {
                        common_language = Some("@none".to_string());
                    }
                    _ => {}
                }
                match &common_type {
                    None => common_type = Some(item_type),
                    Some(current) if *current != item_type => {
                        common_type = Some("@none".to_string());
                    }
                    _ => {}
                }
                if common_language.as_deref() == Some("@none") && common_type.as_deref() == Some("@none") {
                    break;
                }
            }
            let common_language = common_language.unwrap_or_else(|| "@none".to_string());
            let common_type = common_type.unwrap_or_else(|| "@none".to_string());
            if common_type != "@none" {
                type_or_language = TypeOrLanguage::Type;
                preferred_value = common_type;
            } else {
                preferred_value = common_language;
            }
        } else {
            match object {
                Some(o) if o.contains_key("@value") => {
                    if let Some(key) = value_language_key(o).filter(|_| !has_index) {
                        preferred_value = key;
                        containers.push("@language");
                        containers.push("@language@set");
                    } else if let Some(t) = o.get("@type").and_then(Value::as_str) {
                        type_or_language = TypeOrLanguage::Type;
                        preferred_value = t.to_string();
                    }
                }
                _ => {
                    type_or_language = TypeOrLanguage::Type;
                    preferred_value = "@id".to_string();
                }
            }
            containers.push("@set");
        }
        containers.push("@none");

        let mut preferred: Vec<String> = Vec::new();
        if preferred_value == "@reverse" {
            preferred.push("@reverse".to_string());
        }
        let node_id = object.and_then(|o| o.get("@id")).and_then(Value::as_str);
        match node_id {
            Some(id) if preferred_value == "@id" || preferred_value == "@reverse" => {
                let compacted = self.compact_iri(id, None, true, false);
                let round_trips = self
                    .term_definition(&compacted)
                    .is_some_and(|def| def.iri == id);
                if round_trips {
                    preferred.extend(["@vocab", "@id", "@none"].map(String::from));
                } else {
                    preferred.extend(["@id", "@vocab", "@none"].map(String::from));
                }
            }
            _ => {
                preferred.push(preferred_value);
                preferred.push("@none".to_string());
            }
        }

        inverse
            .select_term(iri, &containers, type_or_language, &preferred)
            .map(str::to_string)
    }
}
