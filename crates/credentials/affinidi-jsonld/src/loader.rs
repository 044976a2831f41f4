/*!
 * Remote context loading.
 *
 * The processor never fetches anything itself. Every string reference found in a
 * `@context` is handed to a [`ContextLoader`], which returns the remote document.
 * Documents must be JSON objects carrying a `@context` entry.
 *
 * Loaded contexts are resolved recursively (a remote context may reference further
 * remote contexts, relative to its own URL) and cached for the lifetime of a single
 * operation. A context that references itself, directly or through others, fails with
 * `RECURSIVE_CONTEXT_INCLUSION`.
 */

use std::collections::HashMap;

use serde_json::{Map, Value};

use crate::error::{ContextErrorCode, JsonLdError, Result};
use crate::jsonld::iri::resolve;

/// Supplies remote context documents by URL.
pub trait ContextLoader: Send + Sync {
    /// Return the document found at `url`. The URL is already absolute.
    fn load_context(&self, url: &str) -> Result<Value>;
}

/// A loader backed by an in-memory table of documents.
///
/// Unknown URLs fail with `LOADING_REMOTE_CONTEXT_FAILED`. [`Default`] gives an empty
/// table, so every remote reference fails.
#[derive(Clone, Debug, Default)]
pub struct StaticContextLoader {
    documents: HashMap<String, Value>,
}

impl StaticContextLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `document` under `url` (builder style)
    pub fn with_context(mut self, url: impl Into<String>, document: Value) -> Self {
        self.insert(url, document);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, document: Value) {
        self.documents.insert(url.into(), document);
    }

    pub fn len(&self) -> usize {
        self.documents.len()
    }

    pub fn is_empty(&self) -> bool {
        self.documents.is_empty()
    }
}

impl ContextLoader for StaticContextLoader {
    fn load_context(&self, url: &str) -> Result<Value> {
        self.documents.get(url).cloned().ok_or_else(|| {
            JsonLdError::context(
                ContextErrorCode::LoadingRemoteContextFailed,
                format!("no document registered for '{url}'"),
            )
        })
    }
}

/// Replaces string context references with the contexts they point to.
pub(crate) struct ContextResolver<'a> {
    loader: &'a dyn ContextLoader,
    cache: HashMap<String, Value>,
    stack: Vec<String>,
}

impl<'a> ContextResolver<'a> {
    pub(crate) fn new(loader: &'a dyn ContextLoader) -> Self {
        Self {
            loader,
            cache: HashMap::new(),
            stack: Vec::new(),
        }
    }

    /// Resolve every `@context` found anywhere in `value`, in place.
    pub(crate) fn resolve_value(&mut self, value: &mut Value, base: Option<&str>) -> Result<()> {
        match value {
            Value::Array(items) => {
                for item in items {
                    self.resolve_value(item, base)?;
                }
            }
            Value::Object(map) => {
                if let Some(context) = map.get_mut("@context") {
                    self.resolve_context(context, base)?;
                }
                for (key, item) in map.iter_mut() {
                    if key != "@context" {
                        self.resolve_value(item, base)?;
                    }
                }
            }
            _ => {}
        }
        Ok(())
    }

    /// Resolve a single `@context` value in place.
    pub(crate) fn resolve_context(&mut self, context: &mut Value, base: Option<&str>) -> Result<()> {
        match context {
            Value::String(url) => {
                let url = url.clone();
                *context = self.load(&url, base)?;
            }
            Value::Array(items) => {
                let mut resolved = Vec::with_capacity(items.len());
                for mut item in std::mem::take(items) {
                    match item {
                        Value::String(url) => match self.load(&url, base)? {
                            Value::Array(loaded) => resolved.extend(loaded),
                            loaded => resolved.push(loaded),
                        },
                        _ => {
                            self.resolve_context(&mut item, base)?;
                            resolved.push(item);
                        }
                    }
                }
                *items = resolved;
            }
            Value::Object(map) => self.resolve_scoped(map, base)?,
            _ => {}
        }
        Ok(())
    }

    /// Term definitions may carry their own `@context`.
    fn resolve_scoped(&mut self, map: &mut Map<String, Value>, base: Option<&str>) -> Result<()> {
        for (key, definition) in map.iter_mut() {
            if key.starts_with('@') {
                continue;
            }
            if let Some(scoped) = definition
                .as_object_mut()
                .and_then(|d| d.get_mut("@context"))
            {
                self.resolve_context(scoped, base)?;
            }
        }
        Ok(())
    }

    fn load(&mut self, url: &str, base: Option<&str>) -> Result<Value> {
        let url = resolve(base, url);
        if self.stack.contains(&url) {
            return Err(JsonLdError::context(
                ContextErrorCode::RecursiveContextInclusion,
                format!("context '{url}' includes itself"),
            ));
        }
        if let Some(cached) = self.cache.get(&url) {
            return Ok(cached.clone());
        }

        tracing::debug!(url = %url, "loading remote context");
        let document = self.loader.load_context(&url).map_err(|e| match e {
            JsonLdError::Context {
                code: ContextErrorCode::LoadingRemoteContextFailed,
                ..
            } => e,
            other => JsonLdError::context(
                ContextErrorCode::LoadingRemoteContextFailed,
                format!("loading '{url}': {other}"),
            ),
        })?;

        let mut context = match document {
            Value::Object(mut map) => map.remove("@context").ok_or_else(|| {
                JsonLdError::context(
                    ContextErrorCode::InvalidRemoteContext,
                    format!("'{url}' has no @context entry"),
                )
            })?,
            _ => {
                return Err(JsonLdError::context(
                    ContextErrorCode::InvalidRemoteContext,
                    format!("'{url}' is not a JSON object"),
                ));
            }
        };

        self.stack.push(url.clone());
        let resolved = self.resolve_context(&mut context, Some(&url));
        self.stack.pop();
        resolved?;

        self.cache.insert(url, context.clone());
        Ok(context)
    }
}
