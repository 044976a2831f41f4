use std::borrow::Cow;
use std::collections::HashMap;
use std::sync::OnceLock;

use serde_json::{Map, Value};

use super::inverse::InverseContext;
use super::iri::{is_absolute_iri, is_absolute_or_blank, resolve, split_compact_iri};
use super::util::{as_slice, is_keyword};
use crate::error::{ContextErrorCode, JsonLdError, Result};

/// Container mappings a term definition may carry.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Container {
    Index,
    Language,
    List,
    Set,
}

impl Container {
    pub fn as_str(&self) -> &'static str {
        match self {
            Container::Index => "@index",
            Container::Language => "@language",
            Container::List => "@list",
            Container::Set => "@set",
        }
    }

    fn parse(value: &str) -> Option<Self> {
        match value {
            "@index" => Some(Container::Index),
            "@language" => Some(Container::Language),
            "@list" => Some(Container::List),
            "@set" => Some(Container::Set),
            _ => None,
        }
    }
}

/// A single term definition within an active context.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct TermDefinition {
    /// Expanded IRI, blank node identifier or keyword the term maps to
    pub iri: String,
    pub reverse: bool,
    /// `@id`, `@vocab` or an absolute datatype IRI
    pub type_mapping: Option<String>,
    /// `Some(None)` is an explicit `"@language": null`
    pub language_mapping: Option<Option<String>>,
    /// `Some(None)` is an explicit `"@direction": null`
    pub direction_mapping: Option<Option<String>>,
    /// Sorted, without duplicates
    pub container: Vec<Container>,
    /// Scoped context applied to values of this term (or to nodes typed with it)
    pub context: Option<Value>,
}

impl TermDefinition {
    pub fn has_container(&self, container: Container) -> bool {
        self.container.contains(&container)
    }

    /// Key used to index the term in the inverse context, e.g. `@index@set` or `@none`.
    pub(crate) fn container_key(&self) -> String {
        if self.container.is_empty() {
            "@none".to_string()
        } else {
            self.container.iter().map(Container::as_str).collect()
        }
    }
}

/// The result of processing one or more local contexts.
///
/// An active context is never mutated once handed out: [ActiveContext::parse] returns a
/// new context layered over `self`. The inverse context used for compaction is derived
/// on first use and cached.
#[derive(Debug, Default)]
pub struct ActiveContext {
    pub base: Option<String>,
    pub vocab: Option<String>,
    pub language: Option<String>,
    pub direction: Option<String>,
    /// `None` marks a term that was explicitly set to `null`
    pub terms: HashMap<String, Option<TermDefinition>>,
    /// Context in effect before a type-scoped context was applied
    pub(crate) previous: Option<Box<ActiveContext>>,
    inverse: OnceLock<InverseContext>,
}

impl Clone for ActiveContext {
    fn clone(&self) -> Self {
        Self {
            base: self.base.clone(),
            vocab: self.vocab.clone(),
            language: self.language.clone(),
            direction: self.direction.clone(),
            terms: self.terms.clone(),
            previous: self.previous.clone(),
            inverse: OnceLock::new(),
        }
    }
}

impl ActiveContext {
    pub fn new(base: Option<&str>) -> Self {
        Self {
            base: base.map(str::to_string),
            ..Default::default()
        }
    }

    /// Process a local context and return the resulting active context.
    ///
    /// `local` may be `null`, an object, or an array of those. String references must
    /// have been resolved by a context loader beforehand.
    pub fn parse(&self, local: &Value) -> Result<ActiveContext> {
        let mut result = self.clone();

        for context in as_slice(local) {
            match context {
                Value::Null => {
                    result = ActiveContext::new(result.base.as_deref());
                }
                Value::String(url) => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidRemoteContext,
                        format!("remote context '{url}' has not been loaded"),
                    ));
                }
                Value::Object(map) => {
                    if let Some(inner) = map.get("@context") {
                        result = result.parse(inner)?;
                        continue;
                    }
                    result.apply_local(map)?;
                }
                other => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidLocalContext,
                        format!("context must be an object, array or null, found {other}"),
                    ));
                }
            }
        }

        Ok(result)
    }

    fn apply_local(&mut self, local: &Map<String, Value>) -> Result<()> {
        if let Some(base) = local.get("@base") {
            self.base = match base {
                Value::Null => None,
                Value::String(iri) if is_absolute_iri(iri) => Some(iri.clone()),
                Value::String(iri) if self.base.is_some() => {
                    Some(resolve(self.base.as_deref(), iri))
                }
                other => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidBaseIri,
                        format!("@base must be an IRI or null, found {other}"),
                    ));
                }
            };
        }

        if let Some(vocab) = local.get("@vocab") {
            self.vocab = match vocab {
                Value::Null => None,
                Value::String(iri) if is_absolute_or_blank(iri) => Some(iri.clone()),
                other => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidVocabMapping,
                        format!("@vocab must be an absolute IRI or blank node, found {other}"),
                    ));
                }
            };
        }

        if let Some(language) = local.get("@language") {
            self.language = match language {
                Value::Null => None,
                Value::String(lang) => Some(lang.to_lowercase()),
                other => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidDefaultLanguage,
                        format!("@language must be a string or null, found {other}"),
                    ));
                }
            };
        }

        if let Some(direction) = local.get("@direction") {
            self.direction = parse_direction(direction)?;
        }

        let mut defined = HashMap::new();
        for key in local.keys() {
            if matches!(
                key.as_str(),
                "@base"
                    | "@vocab"
                    | "@language"
                    | "@direction"
                    | "@version"
                    | "@protected"
                    | "@propagate"
            ) {
                continue;
            }
            self.create_term_definition(local, key, &mut defined)?;
        }
        Ok(())
    }

    fn create_term_definition(
        &mut self,
        local: &Map<String, Value>,
        term: &str,
        defined: &mut HashMap<String, bool>,
    ) -> Result<()> {
        match defined.get(term) {
            Some(true) => return Ok(()),
            Some(false) => {
                return Err(JsonLdError::context(
                    ContextErrorCode::CyclicIriMapping,
                    format!("term '{term}' is defined in terms of itself"),
                ));
            }
            None => {}
        }
        defined.insert(term.to_string(), false);

        let value = local.get(term).unwrap_or(&Value::Null);

        if is_keyword(term) {
            if term == "@type" && is_set_only_definition(value) {
                defined.insert(term.to_string(), true);
                return Ok(());
            }
            return Err(JsonLdError::context(
                ContextErrorCode::KeywordRedefinition,
                format!("keyword '{term}' cannot be redefined"),
            ));
        }
        if term.starts_with('@') {
            tracing::trace!(term, "ignoring keyword-like term");
            defined.insert(term.to_string(), true);
            return Ok(());
        }

        self.terms.remove(term);

        let definition = match value {
            Value::Null => None,
            Value::String(iri) => {
                let mut map = Map::new();
                map.insert("@id".to_string(), Value::String(iri.clone()));
                Some(map)
            }
            Value::Object(map) if map.get("@id") == Some(&Value::Null) => None,
            Value::Object(map) => Some(map.clone()),
            other => {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidTermDefinition,
                    format!("definition of '{term}' must be a string, object or null, found {other}"),
                ));
            }
        };
        let Some(value) = definition else {
            self.terms.insert(term.to_string(), None);
            defined.insert(term.to_string(), true);
            return Ok(());
        };

        let mut definition = TermDefinition::default();

        if let Some(type_value) = value.get("@type") {
            let Some(type_str) = type_value.as_str() else {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidTypeMapping,
                    format!("@type of '{term}' must be a string"),
                ));
            };
            match self.expand_iri_local(type_str, false, true, local, defined)? {
                Some(t) if t == "@id" || t == "@vocab" || is_absolute_iri(&t) => {
                    definition.type_mapping = Some(t);
                }
                _ => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidTypeMapping,
                        format!("invalid @type '{type_str}' for term '{term}'"),
                    ));
                }
            }
        }

        if let Some(reverse) = value.get("@reverse") {
            if value.contains_key("@id") {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidReverseProperty,
                    format!("term '{term}' has both @id and @reverse"),
                ));
            }
            let Some(reverse) = reverse.as_str() else {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidIriMapping,
                    format!("@reverse of '{term}' must be a string"),
                ));
            };
            match self.expand_iri_local(reverse, false, true, local, defined)? {
                Some(iri) if is_absolute_or_blank(&iri) => definition.iri = iri,
                _ => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidIriMapping,
                        format!("@reverse of '{term}' does not expand to an IRI"),
                    ));
                }
            }
            definition.reverse = true;
        } else if let Some(id) = value.get("@id").filter(|id| id.as_str() != Some(term)) {
            let Some(id) = id.as_str() else {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidIriMapping,
                    format!("@id of '{term}' must be a string"),
                ));
            };
            match self.expand_iri_local(id, false, true, local, defined)? {
                Some(iri) if iri == "@context" => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidKeywordAlias,
                        format!("'{term}' cannot alias @context"),
                    ));
                }
                Some(iri) if is_keyword(&iri) || is_absolute_or_blank(&iri) => {
                    definition.iri = iri;
                }
                _ => {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidIriMapping,
                        format!("@id of '{term}' does not expand to an IRI or keyword"),
                    ));
                }
            }
        } else if let Some((prefix, suffix)) = split_compact_iri(term) {
            if local.contains_key(prefix) {
                self.create_term_definition(local, prefix, defined)?;
            }
            definition.iri = match self.term_definition(prefix) {
                Some(prefix_def) => format!("{}{suffix}", prefix_def.iri),
                None => term.to_string(),
            };
        } else if term.contains(':') {
            definition.iri = term.to_string();
        } else if let Some(vocab) = &self.vocab {
            definition.iri = format!("{vocab}{term}");
        } else {
            return Err(JsonLdError::context(
                ContextErrorCode::InvalidIriMapping,
                format!("term '{term}' has no IRI mapping and no @vocab is set"),
            ));
        }

        if let Some(container) = value.get("@container") {
            for entry in as_slice(container) {
                let Some(name) = entry.as_str() else {
                    return Err(JsonLdError::context(
                        ContextErrorCode::InvalidTermDefinition,
                        format!("@container of '{term}' must be a string or array of strings"),
                    ));
                };
                match Container::parse(name) {
                    Some(c) => definition.container.push(c),
                    None => tracing::trace!(term, container = name, "dropping unsupported container"),
                }
            }
            definition.container.sort();
            definition.container.dedup();
            if definition.reverse
                && definition
                    .container
                    .iter()
                    .any(|c| !matches!(c, Container::Set | Container::Index))
            {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidReverseProperty,
                    format!("reverse term '{term}' only allows @set or @index containers"),
                ));
            }
        }

        if let Some(scoped) = value.get("@context") {
            definition.context = Some(scoped.clone());
        }

        if definition.type_mapping.is_none() {
            if let Some(language) = value.get("@language") {
                definition.language_mapping = match language {
                    Value::Null => Some(None),
                    Value::String(lang) => Some(Some(lang.to_lowercase())),
                    other => {
                        return Err(JsonLdError::context(
                            ContextErrorCode::InvalidLanguageMapping,
                            format!("@language of '{term}' must be a string or null, found {other}"),
                        ));
                    }
                };
            }
            if let Some(direction) = value.get("@direction") {
                definition.direction_mapping = Some(parse_direction(direction)?);
            }
        }

        self.terms.insert(term.to_string(), Some(definition));
        defined.insert(term.to_string(), true);
        Ok(())
    }

    /// IRI expansion while a local context is being processed: terms of `local` that are
    /// referenced before their own definition are defined on demand.
    fn expand_iri_local(
        &mut self,
        value: &str,
        document_relative: bool,
        vocab: bool,
        local: &Map<String, Value>,
        defined: &mut HashMap<String, bool>,
    ) -> Result<Option<String>> {
        if is_keyword(value) {
            return Ok(Some(value.to_string()));
        }
        if local.contains_key(value) && defined.get(value) != Some(&true) {
            self.create_term_definition(local, value, defined)?;
        }
        if let Some((prefix, _)) = split_compact_iri(value) {
            if local.contains_key(prefix) && defined.get(prefix) != Some(&true) {
                self.create_term_definition(local, prefix, defined)?;
            }
        }
        Ok(self.expand_iri(value, vocab, document_relative))
    }

    /// Expand a term, compact IRI or relative IRI to an absolute IRI or keyword.
    ///
    /// Returns `None` when `value` is a term explicitly mapped to `null`.
    pub fn expand_iri(&self, value: &str, vocab: bool, document_relative: bool) -> Option<String> {
        if is_keyword(value) {
            return Some(value.to_string());
        }
        if vocab {
            if let Some(entry) = self.terms.get(value) {
                return entry.as_ref().map(|def| def.iri.clone());
            }
        }
        if let Some((prefix, suffix)) = split_compact_iri(value) {
            if let Some(prefix_def) = self.term_definition(prefix) {
                return Some(format!("{}{suffix}", prefix_def.iri));
            }
            return Some(value.to_string());
        }
        if value.contains(':') {
            return Some(value.to_string());
        }
        if vocab {
            if let Some(vocab_iri) = &self.vocab {
                return Some(format!("{vocab_iri}{value}"));
            }
        }
        if document_relative {
            return Some(resolve(self.base.as_deref(), value));
        }
        Some(value.to_string())
    }

    /// The definition of `term`, if it is defined and not nulled.
    pub fn term_definition(&self, term: &str) -> Option<&TermDefinition> {
        self.terms.get(term).and_then(Option::as_ref)
    }

    pub fn has_container(&self, term: &str, container: Container) -> bool {
        self.term_definition(term)
            .is_some_and(|def| def.has_container(container))
    }

    pub fn type_mapping(&self, term: &str) -> Option<&str> {
        self.term_definition(term)
            .and_then(|def| def.type_mapping.as_deref())
    }

    pub fn is_reverse(&self, term: &str) -> bool {
        self.term_definition(term).is_some_and(|def| def.reverse)
    }

    /// Language for values of `term`: the term's own mapping, else the default language.
    pub fn language_for(&self, term: &str) -> Option<&str> {
        match self
            .term_definition(term)
            .and_then(|def| def.language_mapping.as_ref())
        {
            Some(mapping) => mapping.as_deref(),
            None => self.language.as_deref(),
        }
    }

    /// Base direction for values of `term`: the term's own mapping, else the default.
    pub fn direction_for(&self, term: &str) -> Option<&str> {
        match self
            .term_definition(term)
            .and_then(|def| def.direction_mapping.as_ref())
        {
            Some(mapping) => mapping.as_deref(),
            None => self.direction.as_deref(),
        }
    }

    /// Apply the scoped context attached to `term`, if any.
    pub fn with_term_scope(&self, term: &str) -> Result<Cow<'_, ActiveContext>> {
        match self.term_definition(term).and_then(|def| def.context.as_ref()) {
            Some(scoped) => Ok(Cow::Owned(self.parse(scoped)?)),
            None => Ok(Cow::Borrowed(self)),
        }
    }

    /// Apply a type-scoped context. It does not propagate into nested node objects: the
    /// context in effect before it is remembered and restored by the expander.
    pub fn with_type_scope(&self, scoped: &Value) -> Result<ActiveContext> {
        let mut result = self.parse(scoped)?;
        if result.previous.is_none() {
            result.previous = Some(Box::new(self.clone()));
        }
        Ok(result)
    }

    /// Inverse context, built on first use.
    pub(crate) fn inverse(&self) -> &InverseContext {
        self.inverse.get_or_init(|| InverseContext::build(self))
    }
}

fn parse_direction(value: &Value) -> Result<Option<String>> {
    match value {
        Value::Null => Ok(None),
        Value::String(dir) if dir == "ltr" || dir == "rtl" => Ok(Some(dir.clone())),
        other => Err(JsonLdError::context(
            ContextErrorCode::InvalidBaseDirection,
            format!("@direction must be \"ltr\", \"rtl\" or null, found {other}"),
        )),
    }
}

/// `{"@container": "@set"}` (optionally with `@protected`), the only allowed `@type` redefinition.
fn is_set_only_definition(value: &Value) -> bool {
    let Some(map) = value.as_object() else {
        return false;
    };
    map.get("@container").and_then(Value::as_str) == Some("@set")
        && map.keys().all(|k| k == "@container" || k == "@protected")
}
